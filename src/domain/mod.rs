// Domain layer: report model and ports (interfaces) for every upstream.

pub mod model;
pub mod ports;
