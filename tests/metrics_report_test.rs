use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use ops_probe::adapters::LibsqlMetricsStore;
use ops_probe::core::metrics_collector::{days_ago, now};
use ops_probe::core::{BusinessMetricsCollector, MetricsReport};
use ops_probe::domain::model::{SqlParam, SqlValue};
use ops_probe::domain::ports::MetricsStore;
use ops_probe::OpsError;
use serde_json::json;
use std::sync::Arc;

const SCHEMA: &[&str] = &[
    "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL)",
    "CREATE TABLE travel_plans (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        destination TEXT,
        ai_generated INTEGER NOT NULL DEFAULT 0,
        is_public INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE reviews (id INTEGER PRIMARY KEY, travel_plan_id INTEGER NOT NULL, rating INTEGER NOT NULL)",
];

/// 4 users, 4 plans (2 AI, 2 public), 3 reviews.
async fn seeded_store() -> Result<LibsqlMetricsStore> {
    let store = LibsqlMetricsStore::open(":memory:").await?;
    for statement in SCHEMA {
        store.execute(statement, vec![]).await?;
    }

    for id in 1..=4 {
        store
            .execute(
                "INSERT INTO users (id, email) VALUES (?1, ?2)",
                vec![
                    SqlParam::Integer(id),
                    SqlParam::Text(format!("traveler{}@example.com", id)),
                ],
            )
            .await?;
    }

    let plans = [
        (1, 1, "Seoul", 1, 1, now()),
        (2, 2, "Seoul", 1, 0, days_ago(1) - Duration::minutes(5)),
        (3, 2, "Busan", 0, 1, days_ago(3)),
        (4, 3, "Jeju", 0, 0, days_ago(60)),
    ];
    for (id, user_id, destination, ai_generated, is_public, created_at) in plans {
        store
            .execute(
                "INSERT INTO travel_plans (id, user_id, destination, ai_generated, is_public, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                vec![
                    SqlParam::Integer(id),
                    SqlParam::Integer(user_id),
                    SqlParam::Text(destination.to_string()),
                    SqlParam::Integer(ai_generated),
                    SqlParam::Integer(is_public),
                    SqlParam::Timestamp(created_at),
                ],
            )
            .await?;
    }

    for (id, plan_id, rating) in [(1, 1, 5), (2, 1, 4), (3, 3, 3)] {
        store
            .execute(
                "INSERT INTO reviews (id, travel_plan_id, rating) VALUES (?1, ?2, ?3)",
                vec![
                    SqlParam::Integer(id),
                    SqlParam::Integer(plan_id),
                    SqlParam::Integer(rating),
                ],
            )
            .await?;
    }

    Ok(store)
}

async fn seeded_report() -> Result<MetricsReport> {
    let store = seeded_store().await?;
    let collector = Arc::new(BusinessMetricsCollector::new(Arc::new(store))?);
    Ok(MetricsReport::new(collector))
}

#[tokio::test]
async fn test_full_report_has_every_section() -> Result<()> {
    let report = seeded_report().await?;

    let body = report.full().await;

    for key in [
        "userEngagement",
        "aiUsage",
        "travelPlans",
        "performance",
        "system",
        "timestamp",
    ] {
        assert!(body.get(key).is_some(), "missing section {}", key);
    }
    Ok(())
}

#[tokio::test]
async fn test_user_engagement_figures() -> Result<()> {
    let report = seeded_report().await?;

    let body = report.category("user-engagement").await;
    let section = &body["userEngagement"];

    assert_eq!(section["totalUsers"], json!(4));
    assert_eq!(section["activeUsers"], json!(2));
    assert_eq!(section["monthlyActiveUsers"], json!(2));
    assert_eq!(section["weeklyActiveUsers"], json!(2));
    assert_eq!(section["dailyActiveUsers"], json!(1));
    assert_eq!(section["retentionRate"], json!(50.0));
    assert_eq!(section["engagementScore"], json!(50.0));
    Ok(())
}

#[tokio::test]
async fn test_ai_usage_figures() -> Result<()> {
    let report = seeded_report().await?;
    report.collector().record_ai_request(1200, true);
    report.collector().record_ai_request(800, false);

    let body = report.category("ai-usage").await;
    let section = &body["aiUsage"];

    assert_eq!(section["totalAIGeneratedPlans"], json!(2));
    assert_eq!(section["totalManualPlans"], json!(2));
    assert_eq!(section["aiAdoptionRate"], json!(50.0));
    assert_eq!(section["aiRequestCount"], json!(2));
    assert_eq!(section["aiFailureCount"], json!(1));
    assert_eq!(section["aiSuccessRate"], json!(50.0));
    assert_eq!(section["averageAIResponseTime"], json!(1000.0));
    assert_eq!(section["dailyAIRequests"], json!(1));
    assert_eq!(section["monthlyAIRequests"], json!(2));
    Ok(())
}

#[tokio::test]
async fn test_travel_plan_figures() -> Result<()> {
    let report = seeded_report().await?;

    let body = report.category("travel-plans").await;
    let section = &body["travelPlans"];

    assert_eq!(section["totalTravelPlans"], json!(4));
    assert_eq!(section["plansCreatedToday"], json!(1));
    assert_eq!(section["plansCreatedThisWeek"], json!(3));
    assert_eq!(section["plansCreatedThisMonth"], json!(3));
    assert_eq!(section["averagePlanRating"], json!(4.0));
    assert_eq!(section["publicPlansCount"], json!(2));
    assert_eq!(section["sharedPlansCount"], json!(2));
    assert_eq!(
        section["popularDestinations"],
        json!([
            { "destination": "Seoul", "planCount": 2, "averageRating": 4.5 },
            { "destination": "Busan", "planCount": 1, "averageRating": 3.0 },
            { "destination": "Jeju", "planCount": 1, "averageRating": null },
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_plans_created_between_window() -> Result<()> {
    let store = seeded_store().await?;
    let collector = BusinessMetricsCollector::new(Arc::new(store))?;

    let start = days_ago(5);
    assert_eq!(
        collector
            .plans_created_between(start, start + Duration::days(3))
            .await,
        1
    );
    Ok(())
}

#[tokio::test]
async fn test_performance_section_includes_external_services() -> Result<()> {
    let report = seeded_report().await?;
    let collector = report.collector();
    collector.record_api_request(40, true);
    collector.record_api_request(60, false);
    collector.record_external_service_call("openai", 900, true);

    let body = report.category("Performance").await;
    let section = &body["performance"];

    assert_eq!(section["averageResponseTime"], json!(50.0));
    assert_eq!(section["errorRate"], json!(50.0));
    assert_eq!(section["successRate"], json!(50.0));
    assert_eq!(section["externalServices"]["openai"]["requestCount"], json!(1));
    Ok(())
}

#[tokio::test]
async fn test_system_section_on_sqlite() -> Result<()> {
    let report = seeded_report().await?;
    let collector = report.collector();
    collector.record_cache_hit();
    collector.record_cache_hit();
    collector.record_cache_hit();
    collector.record_cache_miss();
    collector.record_cache_eviction();
    collector.set_cache_size(42);
    collector.record_database_query(20);
    collector.record_database_query(2500);

    let body = report.category("system").await;
    let section = &body["system"];

    // pg_stat_activity 不存在於 SQLite，連線數降為 0
    assert_eq!(section["database"]["activeConnections"], json!(0));
    assert_eq!(section["database"]["idleConnections"], json!(0));
    assert_eq!(section["database"]["queryCount"], json!(2));
    assert_eq!(section["database"]["slowQueries"], json!(1));
    assert_eq!(section["database"]["averageQueryTime"], json!(1260.0));
    assert_eq!(section["cache"]["hitRate"], json!(75.0));
    assert_eq!(section["cache"]["missRate"], json!(25.0));
    assert_eq!(section["cache"]["evictionCount"], json!(1));
    assert_eq!(section["cache"]["size"], json!(42));
    assert!(section.get("process").is_some());
    assert!(section["uptimeSeconds"].is_u64());
    Ok(())
}

#[tokio::test]
async fn test_unknown_category() -> Result<()> {
    let report = seeded_report().await?;

    let body = report.category("revenue").await;

    assert_eq!(body, json!({ "error": "Unknown category: revenue" }));
    Ok(())
}

// ---- collector ----

struct BrokenStore;

#[async_trait]
impl MetricsStore for BrokenStore {
    async fn query_scalar(
        &self,
        _sql: &str,
        _params: Vec<SqlParam>,
    ) -> ops_probe::Result<Option<SqlValue>> {
        Err(OpsError::UpstreamError {
            message: "database is unreachable".to_string(),
        })
    }

    async fn query_rows(
        &self,
        _sql: &str,
        _params: Vec<SqlParam>,
    ) -> ops_probe::Result<Vec<Vec<SqlValue>>> {
        Err(OpsError::UpstreamError {
            message: "database is unreachable".to_string(),
        })
    }
}

#[tokio::test]
async fn test_broken_store_degrades_to_zero() {
    let collector = BusinessMetricsCollector::new(Arc::new(BrokenStore)).unwrap();

    assert_eq!(collector.total_users().await, 0);
    assert_eq!(collector.total_plans().await, 0);
    assert_eq!(collector.average_plan_rating().await, 0.0);
    assert!(collector.popular_destinations(5).await.is_empty());

    let report = MetricsReport::new(Arc::new(collector));
    let body = report.category("user-engagement").await;
    assert_eq!(body["userEngagement"]["retentionRate"], json!(0.0));
    assert_eq!(body["userEngagement"]["engagementScore"], json!(0.0));
}

#[tokio::test]
async fn test_fresh_collector_defaults() {
    let collector = BusinessMetricsCollector::new(Arc::new(BrokenStore)).unwrap();

    assert_eq!(collector.ai_success_rate(), 100.0);
    assert_eq!(collector.api_success_rate(), 100.0);
    assert_eq!(collector.error_rate(), 0.0);
    assert_eq!(collector.average_ai_response_time(), 0.0);
    assert_eq!(collector.cache_hit_rate(), 0.0);
    assert_eq!(collector.cache_miss_rate(), 0.0);
    assert!(collector.external_service("openai").is_none());
}

#[tokio::test]
async fn test_ai_request_round_trip() {
    let collector = BusinessMetricsCollector::new(Arc::new(BrokenStore)).unwrap();

    collector.record_ai_request(1000, true);
    collector.record_ai_request(3000, false);

    assert_eq!(collector.ai_request_count(), 2);
    assert_eq!(collector.ai_failure_count(), 1);
    assert_eq!(collector.average_ai_response_time(), 2000.0);
    assert_eq!(collector.ai_success_rate(), 50.0);
}

#[tokio::test]
async fn test_slow_query_threshold_is_configurable() {
    let collector =
        BusinessMetricsCollector::new(Arc::new(BrokenStore))
            .unwrap()
            .with_slow_query_threshold(100);

    collector.record_database_query(99);
    collector.record_database_query(150);

    assert_eq!(collector.query_count(), 2);
    assert_eq!(collector.slow_query_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_recording_loses_nothing() {
    let collector = Arc::new(BusinessMetricsCollector::new(Arc::new(BrokenStore)).unwrap());

    let handles = (0..8)
        .map(|worker| {
            let collector = Arc::clone(&collector);
            tokio::spawn(async move {
                for i in 0..250 {
                    collector.record_api_request(10, (i + worker) % 5 != 0);
                    collector.record_ai_request(100, true);
                    collector.record_external_service_call("maps", 20, true);
                    collector.record_cache_hit();
                }
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(collector.api_request_count(), 2000);
    assert_eq!(collector.api_error_count(), 400);
    assert_eq!(collector.ai_request_count(), 2000);
    assert_eq!(
        collector.external_service("maps").unwrap().request_count,
        2000
    );
    assert_eq!(collector.cache_hit_rate(), 100.0);
}
