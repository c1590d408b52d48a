//! In-process counters plus best-effort SQL aggregates for business metrics.
//!
//! Every `record_*` call is an atomic update and cannot fail. Every
//! SQL read logs and returns zero (or an empty list) when the store errors, so
//! a broken metrics database never reaches the caller.

use crate::domain::model::{DestinationStat, SqlParam};
use crate::domain::ports::MetricsStore;
use crate::utils::error::Result;
use chrono::{Duration, NaiveDateTime, Utc};
use dashmap::DashMap;
use prometheus::core::Collector;
use prometheus::{Histogram, HistogramOpts};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_SLOW_QUERY_THRESHOLD_MS: u64 = 1000;

/// Upper bounds (inclusive, ms) of the latency histogram buckets. Samples
/// above the last bound only count towards the `+Inf` total.
pub const LATENCY_BUCKETS_MS: [u64; 12] = [5, 10, 25, 50, 100, 250, 500, 1000, 2500, 5000, 10_000, 30_000];

const SQL_TOTAL_USERS: &str = "SELECT COUNT(*) FROM users";

const SQL_TOTAL_PLANS: &str = "SELECT COUNT(*) FROM travel_plans";

const SQL_ACTIVE_USERS_SINCE: &str =
    "SELECT COUNT(DISTINCT tp.user_id) FROM travel_plans tp WHERE tp.created_at >= ?1";

const SQL_AI_GENERATED_PLANS: &str = "SELECT COUNT(*) FROM travel_plans WHERE ai_generated = 1";

const SQL_AI_PLANS_SINCE: &str =
    "SELECT COUNT(*) FROM travel_plans WHERE ai_generated = 1 AND created_at >= ?1";

const SQL_PLANS_SINCE: &str = "SELECT COUNT(*) FROM travel_plans WHERE created_at >= ?1";

const SQL_PLANS_BETWEEN: &str =
    "SELECT COUNT(*) FROM travel_plans WHERE created_at >= ?1 AND created_at < ?2";

const SQL_AVERAGE_PLAN_RATING: &str = "SELECT AVG(r.rating) FROM reviews r \
     INNER JOIN travel_plans tp ON r.travel_plan_id = tp.id";

const SQL_PUBLIC_PLANS: &str = "SELECT COUNT(*) FROM travel_plans WHERE is_public = 1";

const SQL_POPULAR_DESTINATIONS: &str = "SELECT tp.destination, \
     COUNT(DISTINCT tp.id) AS plan_count, \
     AVG(r.rating) AS avg_rating \
     FROM travel_plans tp \
     LEFT JOIN reviews r ON tp.id = r.travel_plan_id \
     WHERE tp.destination IS NOT NULL \
     GROUP BY tp.destination \
     ORDER BY plan_count DESC, avg_rating DESC \
     LIMIT ?1";

const SQL_ACTIVE_CONNECTIONS: &str = "SELECT COUNT(*) FROM pg_stat_activity \
     WHERE state = 'active' AND datname = current_database()";

const SQL_IDLE_CONNECTIONS: &str = "SELECT COUNT(*) FROM pg_stat_activity \
     WHERE state = 'idle' AND datname = current_database()";

/// Request latency histogram in milliseconds. Not registered with any registry;
/// only read back here for percentiles.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram,
}

impl LatencyHistogram {
    pub fn new() -> Result<Self> {
        let histogram = Histogram::with_opts(
            HistogramOpts::new("api_request_duration_ms", "API request latency in milliseconds")
                .buckets(LATENCY_BUCKETS_MS.iter().map(|b| *b as f64).collect()),
        )?;
        Ok(Self { histogram })
    }

    pub fn record(&self, millis: u64) {
        self.histogram.observe(millis as f64);
    }

    pub fn count(&self) -> u64 {
        self.histogram.get_sample_count()
    }

    /// Upper bound of the bucket holding the `percentile`-th sample, 0.0 when empty.
    /// Samples past the last bucket report the last bound.
    pub fn percentile(&self, percentile: f64) -> f64 {
        let total = self.count();
        if total == 0 {
            return 0.0;
        }

        let rank = ((percentile.clamp(0.0, 100.0) / 100.0) * total as f64)
            .ceil()
            .max(1.0) as u64;

        let families = self.histogram.collect();
        let buckets = families
            .first()
            .and_then(|family| family.get_metric().first())
            .map(|metric| metric.get_histogram().get_bucket().to_vec())
            .unwrap_or_default();

        buckets
            .iter()
            .find(|bucket| bucket.get_cumulative_count() >= rank)
            .or(buckets.last())
            .map(|bucket| bucket.get_upper_bound())
            .unwrap_or(0.0)
    }
}

/// Counters for one external service, created on first use.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    request_count: AtomicU64,
    error_count: AtomicU64,
    response_time_sum_ms: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetricsSnapshot {
    pub request_count: u64,
    pub error_count: u64,
    pub average_response_time: f64,
    pub success_rate: f64,
}

impl ServiceMetrics {
    pub fn record_request(&self, response_time_ms: u64, success: bool) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.response_time_sum_ms
            .fetch_add(response_time_ms, Ordering::Relaxed);
        if !success {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn average_response_time(&self) -> f64 {
        average(
            self.response_time_sum_ms.load(Ordering::Relaxed),
            self.request_count(),
        )
    }

    pub fn success_rate(&self) -> f64 {
        success_rate(self.request_count(), self.error_count())
    }

    pub fn snapshot(&self) -> ServiceMetricsSnapshot {
        ServiceMetricsSnapshot {
            request_count: self.request_count(),
            error_count: self.error_count(),
            average_response_time: self.average_response_time(),
            success_rate: self.success_rate(),
        }
    }
}

/// (total − failures) / total × 100; exactly 100.0 when nothing was recorded.
pub fn success_rate(total: u64, failures: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    total.saturating_sub(failures) as f64 / total as f64 * 100.0
}

fn ratio_percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn average(sum: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

pub struct BusinessMetricsCollector {
    store: Arc<dyn MetricsStore>,
    started_at: Instant,
    slow_query_threshold_ms: u64,

    // AI 呼叫
    ai_request_count: AtomicU64,
    ai_failure_count: AtomicU64,
    ai_response_time_sum_ms: AtomicU64,

    // API 請求
    api_request_count: AtomicU64,
    api_error_count: AtomicU64,
    api_response_time_sum_ms: AtomicU64,
    api_latency: LatencyHistogram,

    external_services: DashMap<String, Arc<ServiceMetrics>>,

    // 快取
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_evictions: AtomicU64,
    cache_size: AtomicU64,

    // 資料庫
    query_count: AtomicU64,
    query_time_sum_ms: AtomicU64,
    slow_query_count: AtomicU64,
}

impl BusinessMetricsCollector {
    pub fn new(store: Arc<dyn MetricsStore>) -> Result<Self> {
        Ok(Self {
            store,
            started_at: Instant::now(),
            slow_query_threshold_ms: DEFAULT_SLOW_QUERY_THRESHOLD_MS,
            ai_request_count: AtomicU64::new(0),
            ai_failure_count: AtomicU64::new(0),
            ai_response_time_sum_ms: AtomicU64::new(0),
            api_request_count: AtomicU64::new(0),
            api_error_count: AtomicU64::new(0),
            api_response_time_sum_ms: AtomicU64::new(0),
            api_latency: LatencyHistogram::new()?,
            external_services: DashMap::new(),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            cache_evictions: AtomicU64::new(0),
            cache_size: AtomicU64::new(0),
            query_count: AtomicU64::new(0),
            query_time_sum_ms: AtomicU64::new(0),
            slow_query_count: AtomicU64::new(0),
        })
    }

    pub fn with_slow_query_threshold(mut self, threshold_ms: u64) -> Self {
        self.slow_query_threshold_ms = threshold_ms;
        self
    }

    // ---- recording ----

    pub fn record_ai_request(&self, response_time_ms: u64, success: bool) {
        self.ai_request_count.fetch_add(1, Ordering::Relaxed);
        self.ai_response_time_sum_ms
            .fetch_add(response_time_ms, Ordering::Relaxed);
        if !success {
            self.ai_failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_api_request(&self, response_time_ms: u64, success: bool) {
        self.api_request_count.fetch_add(1, Ordering::Relaxed);
        self.api_response_time_sum_ms
            .fetch_add(response_time_ms, Ordering::Relaxed);
        self.api_latency.record(response_time_ms);
        if !success {
            self.api_error_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_external_service_call(&self, service: &str, response_time_ms: u64, success: bool) {
        self.service_metrics(service)
            .record_request(response_time_ms, success);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_eviction(&self) {
        self.cache_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_cache_size(&self, entries: u64) {
        self.cache_size.store(entries, Ordering::Relaxed);
    }

    pub fn record_database_query(&self, execution_time_ms: u64) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.query_time_sum_ms
            .fetch_add(execution_time_ms, Ordering::Relaxed);
        if execution_time_ms > self.slow_query_threshold_ms {
            self.slow_query_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn service_metrics(&self, service: &str) -> Arc<ServiceMetrics> {
        if let Some(existing) = self.external_services.get(service) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.external_services
                .entry(service.to_string())
                .or_default()
                .value(),
        )
    }

    // ---- counter reads ----

    pub fn ai_request_count(&self) -> u64 {
        self.ai_request_count.load(Ordering::Relaxed)
    }

    pub fn ai_failure_count(&self) -> u64 {
        self.ai_failure_count.load(Ordering::Relaxed)
    }

    pub fn average_ai_response_time(&self) -> f64 {
        average(
            self.ai_response_time_sum_ms.load(Ordering::Relaxed),
            self.ai_request_count(),
        )
    }

    pub fn ai_success_rate(&self) -> f64 {
        success_rate(self.ai_request_count(), self.ai_failure_count())
    }

    pub fn api_request_count(&self) -> u64 {
        self.api_request_count.load(Ordering::Relaxed)
    }

    pub fn api_error_count(&self) -> u64 {
        self.api_error_count.load(Ordering::Relaxed)
    }

    pub fn average_response_time(&self) -> f64 {
        average(
            self.api_response_time_sum_ms.load(Ordering::Relaxed),
            self.api_request_count(),
        )
    }

    pub fn p95_response_time(&self) -> f64 {
        self.api_latency.percentile(95.0)
    }

    pub fn p99_response_time(&self) -> f64 {
        self.api_latency.percentile(99.0)
    }

    pub fn error_rate(&self) -> f64 {
        ratio_percent(self.api_error_count(), self.api_request_count())
    }

    pub fn api_success_rate(&self) -> f64 {
        success_rate(self.api_request_count(), self.api_error_count())
    }

    /// Averaged over collector uptime; the first minute reports the raw count.
    pub fn requests_per_minute(&self) -> f64 {
        let minutes = (self.started_at.elapsed().as_secs_f64() / 60.0).max(1.0);
        self.api_request_count() as f64 / minutes
    }

    pub fn requests_per_hour(&self) -> f64 {
        self.requests_per_minute() * 60.0
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn external_service(&self, service: &str) -> Option<ServiceMetricsSnapshot> {
        self.external_services
            .get(service)
            .map(|entry| entry.value().snapshot())
    }

    pub fn external_services(&self) -> BTreeMap<String, ServiceMetricsSnapshot> {
        self.external_services
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        ratio_percent(hits, hits.saturating_add(misses))
    }

    pub fn cache_miss_rate(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        ratio_percent(misses, hits.saturating_add(misses))
    }

    pub fn cache_eviction_count(&self) -> u64 {
        self.cache_evictions.load(Ordering::Relaxed)
    }

    pub fn cache_size(&self) -> u64 {
        self.cache_size.load(Ordering::Relaxed)
    }

    pub fn query_count(&self) -> u64 {
        self.query_count.load(Ordering::Relaxed)
    }

    pub fn average_query_time(&self) -> f64 {
        average(
            self.query_time_sum_ms.load(Ordering::Relaxed),
            self.query_count(),
        )
    }

    pub fn slow_query_count(&self) -> u64 {
        self.slow_query_count.load(Ordering::Relaxed)
    }

    // ---- SQL reads ----

    async fn count(&self, label: &str, sql: &str, params: Vec<SqlParam>) -> i64 {
        match self.store.query_scalar(sql, params).await {
            Ok(value) => value.and_then(|v| v.as_i64()).unwrap_or(0),
            Err(e) => {
                tracing::error!("Error getting {}: {}", label, e);
                0
            }
        }
    }

    pub async fn total_users(&self) -> i64 {
        self.count("total users", SQL_TOTAL_USERS, vec![]).await
    }

    pub async fn total_plans(&self) -> i64 {
        self.count("total plans", SQL_TOTAL_PLANS, vec![]).await
    }

    /// Users who created at least one plan since `since`.
    pub async fn active_users_since(&self, since: NaiveDateTime) -> i64 {
        self.count(
            "active users count",
            SQL_ACTIVE_USERS_SINCE,
            vec![SqlParam::Timestamp(since)],
        )
        .await
    }

    pub async fn ai_generated_plans_count(&self) -> i64 {
        self.count("AI generated plans count", SQL_AI_GENERATED_PLANS, vec![])
            .await
    }

    pub async fn ai_requests_since(&self, since: NaiveDateTime) -> i64 {
        self.count(
            "AI requests",
            SQL_AI_PLANS_SINCE,
            vec![SqlParam::Timestamp(since)],
        )
        .await
    }

    pub async fn daily_ai_requests(&self) -> i64 {
        self.ai_requests_since(days_ago(1)).await
    }

    pub async fn weekly_ai_requests(&self) -> i64 {
        self.ai_requests_since(days_ago(7)).await
    }

    pub async fn monthly_ai_requests(&self) -> i64 {
        self.ai_requests_since(days_ago(30)).await
    }

    pub async fn plans_created_since(&self, since: NaiveDateTime) -> i64 {
        self.count(
            "plans created",
            SQL_PLANS_SINCE,
            vec![SqlParam::Timestamp(since)],
        )
        .await
    }

    pub async fn plans_created_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        self.count(
            "plans created in window",
            SQL_PLANS_BETWEEN,
            vec![SqlParam::Timestamp(start), SqlParam::Timestamp(end)],
        )
        .await
    }

    pub async fn average_plan_rating(&self) -> f64 {
        match self.store.query_scalar(SQL_AVERAGE_PLAN_RATING, vec![]).await {
            Ok(value) => value.and_then(|v| v.as_f64()).unwrap_or(0.0),
            Err(e) => {
                tracing::error!("Error getting average plan rating: {}", e);
                0.0
            }
        }
    }

    pub async fn public_plans_count(&self) -> i64 {
        self.count("public plans count", SQL_PUBLIC_PLANS, vec![])
            .await
    }

    // TODO: count from a dedicated sharing table once plan sharing is tracked separately
    pub async fn shared_plans_count(&self) -> i64 {
        self.public_plans_count().await
    }

    pub async fn popular_destinations(&self, limit: i64) -> Vec<DestinationStat> {
        let rows = match self
            .store
            .query_rows(SQL_POPULAR_DESTINATIONS, vec![SqlParam::Integer(limit)])
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Error getting popular destinations: {}", e);
                return Vec::new();
            }
        };

        rows.into_iter()
            .filter_map(|row| {
                let destination = row.first()?.as_text()?.to_string();
                Some(DestinationStat {
                    destination,
                    plan_count: row.get(1).and_then(|v| v.as_i64()).unwrap_or(0),
                    average_rating: row.get(2).and_then(|v| v.as_f64()),
                })
            })
            .collect()
    }

    // 連線數查詢需要 pg_stat_activity 權限，失敗時只記 debug
    async fn connection_count(&self, label: &str, sql: &str) -> i64 {
        match self.store.query_scalar(sql, vec![]).await {
            Ok(value) => value.and_then(|v| v.as_i64()).unwrap_or(0),
            Err(e) => {
                tracing::debug!(
                    "Error getting {} (may not have permissions): {}",
                    label,
                    e
                );
                0
            }
        }
    }

    pub async fn active_connection_count(&self) -> i64 {
        self.connection_count("active connection count", SQL_ACTIVE_CONNECTIONS)
            .await
    }

    pub async fn idle_connection_count(&self) -> i64 {
        self.connection_count("idle connection count", SQL_IDLE_CONNECTIONS)
            .await
    }
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn days_ago(days: i64) -> NaiveDateTime {
    now() - Duration::days(days)
}
