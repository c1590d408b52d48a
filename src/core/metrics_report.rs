use crate::core::metrics_collector::{days_ago, now, BusinessMetricsCollector};
use crate::utils::monitor::ProcessMonitor;
use chrono::{Duration, NaiveTime, Utc};
use serde_json::{json, Map, Value};
use std::str::FromStr;
use std::sync::Arc;

pub const POPULAR_DESTINATION_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsCategory {
    UserEngagement,
    AiUsage,
    TravelPlans,
    Performance,
    System,
}

impl MetricsCategory {
    pub const ALL: [MetricsCategory; 5] = [
        MetricsCategory::UserEngagement,
        MetricsCategory::AiUsage,
        MetricsCategory::TravelPlans,
        MetricsCategory::Performance,
        MetricsCategory::System,
    ];

    /// Key of the section in the report.
    pub fn key(&self) -> &'static str {
        match self {
            MetricsCategory::UserEngagement => "userEngagement",
            MetricsCategory::AiUsage => "aiUsage",
            MetricsCategory::TravelPlans => "travelPlans",
            MetricsCategory::Performance => "performance",
            MetricsCategory::System => "system",
        }
    }

    /// Selector accepted by the metrics endpoint.
    pub fn selector(&self) -> &'static str {
        match self {
            MetricsCategory::UserEngagement => "user-engagement",
            MetricsCategory::AiUsage => "ai-usage",
            MetricsCategory::TravelPlans => "travel-plans",
            MetricsCategory::Performance => "performance",
            MetricsCategory::System => "system",
        }
    }
}

impl FromStr for MetricsCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        MetricsCategory::ALL
            .into_iter()
            .find(|c| c.selector() == wanted)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Assembles collector figures into the nested business-metrics report.
pub struct MetricsReport {
    collector: Arc<BusinessMetricsCollector>,
    monitor: ProcessMonitor,
}

impl MetricsReport {
    pub fn new(collector: Arc<BusinessMetricsCollector>) -> Self {
        Self {
            collector,
            monitor: ProcessMonitor::new(),
        }
    }

    pub fn collector(&self) -> &BusinessMetricsCollector {
        &self.collector
    }

    pub async fn full(&self) -> Value {
        tracing::debug!("Collecting business metrics");

        let mut report = Map::new();
        for category in MetricsCategory::ALL {
            report.insert(category.key().to_string(), self.section(category).await);
        }
        report.insert("timestamp".to_string(), json!(Utc::now().timestamp()));
        Value::Object(report)
    }

    /// Single-section report; unknown selectors produce an `error` entry instead.
    pub async fn category(&self, selector: &str) -> Value {
        tracing::debug!("Collecting business metrics for category: {}", selector);

        match selector.parse::<MetricsCategory>() {
            Ok(category) => {
                let mut report = Map::new();
                report.insert(category.key().to_string(), self.section(category).await);
                Value::Object(report)
            }
            Err(message) => json!({ "error": message }),
        }
    }

    pub async fn section(&self, category: MetricsCategory) -> Value {
        match category {
            MetricsCategory::UserEngagement => self.user_engagement().await,
            MetricsCategory::AiUsage => self.ai_usage().await,
            MetricsCategory::TravelPlans => self.travel_plans().await,
            MetricsCategory::Performance => self.performance(),
            MetricsCategory::System => self.system().await,
        }
    }

    async fn user_engagement(&self) -> Value {
        let c = &self.collector;
        let total_users = c.total_users().await;
        let monthly_active = c.active_users_since(days_ago(30)).await;
        let weekly_active = c.active_users_since(days_ago(7)).await;
        let daily_active = c.active_users_since(days_ago(1)).await;
        let total_plans = c.total_plans().await;
        let shared_plans = c.shared_plans_count().await;

        json!({
            "totalUsers": total_users,
            "activeUsers": monthly_active,
            "retentionRate": round2(percent(monthly_active, total_users)),
            "dailyActiveUsers": daily_active,
            "weeklyActiveUsers": weekly_active,
            "monthlyActiveUsers": monthly_active,
            "engagementScore": round2(engagement_score(total_users, monthly_active, total_plans, shared_plans)),
        })
    }

    async fn ai_usage(&self) -> Value {
        let c = &self.collector;
        let total_plans = c.total_plans().await;
        let ai_plans = c.ai_generated_plans_count().await;

        json!({
            "totalAIGeneratedPlans": ai_plans,
            "totalManualPlans": (total_plans - ai_plans).max(0),
            "aiAdoptionRate": round2(percent(ai_plans, total_plans)),
            "averageAIResponseTime": round2(c.average_ai_response_time()),
            "aiSuccessRate": round2(c.ai_success_rate()),
            "aiRequestCount": c.ai_request_count(),
            "aiFailureCount": c.ai_failure_count(),
            "dailyAIRequests": c.daily_ai_requests().await,
            "weeklyAIRequests": c.weekly_ai_requests().await,
            "monthlyAIRequests": c.monthly_ai_requests().await,
        })
    }

    async fn travel_plans(&self) -> Value {
        let c = &self.collector;
        let today = now().date().and_time(NaiveTime::MIN);
        let yesterday = today - Duration::days(1);

        json!({
            "totalTravelPlans": c.total_plans().await,
            "plansCreatedToday": c.plans_created_since(today).await,
            "plansCreatedYesterday": c.plans_created_between(yesterday, today).await,
            "plansCreatedThisWeek": c.plans_created_since(days_ago(7)).await,
            "plansCreatedThisMonth": c.plans_created_since(days_ago(30)).await,
            "averagePlanRating": round2(c.average_plan_rating().await),
            "publicPlansCount": c.public_plans_count().await,
            "sharedPlansCount": c.shared_plans_count().await,
            "popularDestinations": c.popular_destinations(POPULAR_DESTINATION_LIMIT).await,
        })
    }

    fn performance(&self) -> Value {
        let c = &self.collector;
        json!({
            "averageResponseTime": round2(c.average_response_time()),
            "p95ResponseTime": c.p95_response_time(),
            "p99ResponseTime": c.p99_response_time(),
            "errorRate": round2(c.error_rate()),
            "successRate": round2(c.api_success_rate()),
            "requestsPerMinute": round2(c.requests_per_minute()),
            "requestsPerHour": round2(c.requests_per_hour()),
            "externalServices": c.external_services(),
        })
    }

    async fn system(&self) -> Value {
        let c = &self.collector;
        let mut system = Map::new();

        system.insert(
            "database".to_string(),
            json!({
                "activeConnections": c.active_connection_count().await,
                "idleConnections": c.idle_connection_count().await,
                "averageQueryTime": round2(c.average_query_time()),
                "queryCount": c.query_count(),
                "slowQueries": c.slow_query_count(),
            }),
        );
        system.insert(
            "cache".to_string(),
            json!({
                "hitRate": round2(c.cache_hit_rate()),
                "missRate": round2(c.cache_miss_rate()),
                "evictionCount": c.cache_eviction_count(),
                "size": c.cache_size(),
            }),
        );

        match self.monitor.stats() {
            Some(stats) => {
                system.insert("process".to_string(), json!(stats));
            }
            None => {
                system.insert(
                    "process".to_string(),
                    json!({ "error": "Process statistics unavailable" }),
                );
            }
        }
        system.insert("uptimeSeconds".to_string(), json!(c.uptime_seconds()));

        Value::Object(system)
    }
}

fn percent(part: i64, total: i64) -> f64 {
    if total <= 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Score in 0..=100: active-user ratio (30), plans per active user (40, capped),
/// share ratio (30).
pub fn engagement_score(total_users: i64, active_users: i64, total_plans: i64, shared_plans: i64) -> f64 {
    if total_users <= 0 {
        return 0.0;
    }

    let base = active_users as f64 / total_users as f64 * 30.0;
    let planning = if active_users > 0 {
        (total_plans as f64 / active_users as f64 * 10.0).min(40.0)
    } else {
        0.0
    };
    let social = if total_plans > 0 {
        shared_plans as f64 / total_plans as f64 * 30.0
    } else {
        0.0
    };

    (base + planning + social).min(100.0)
}
