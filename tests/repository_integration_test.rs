// ==========================================
// 仓储层集成测试 (临时 SQLite 库)
// ==========================================
// 测试目标: 各表的写入/过滤读取/状态流转/汇总
// ==========================================


use chrono::Duration;
use demand_planning_dss::domain::types::{
    ExceptionSeverity, ExceptionStatus, ScenarioStatus,
};
use demand_planning_dss::repository::RepositoryError;
use test_helpers::{make_date, setup_test_db, ExceptionBuilder, ObservationBuilder, SnapshotBuilder};

// ==========================================
// 需求观测仓储
// ==========================================

#[test]
fn test_forecast_repo_roundtrip_and_range_filter() {
    let db = setup_test_db();
    let start = make_date(2026, 3, 1);

    let observations: Vec<_> = (0..10)
        .map(|d| {
            ObservationBuilder::new("P001", start + Duration::days(d))
                .forecast(10.0 + d as f64)
                .build()
        })
        .collect();
    assert_eq!(db.forecast_repo.batch_insert(observations).unwrap(), 10);

    // 范围过滤 (含端点)
    let series = db
        .forecast_repo
        .find_series("P001", "WH01", make_date(2026, 3, 3), make_date(2026, 3, 5))
        .unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series[0].obs_date, make_date(2026, 3, 3));
    assert_eq!(series[0].forecast, Some(12.0));

    // 其它产品不可见
    let other = db
        .forecast_repo
        .find_series("P999", "WH01", start, start + Duration::days(30))
        .unwrap();
    assert!(other.is_empty());
}

#[test]
fn test_forecast_repo_upsert_replaces_same_key() {
    let db = setup_test_db();
    let date = make_date(2026, 3, 1);

    db.forecast_repo
        .batch_insert(vec![ObservationBuilder::new("P001", date).forecast(10.0).build()])
        .unwrap();
    db.forecast_repo
        .batch_insert(vec![ObservationBuilder::new("P001", date).forecast(25.0).build()])
        .unwrap();

    let series = db
        .forecast_repo
        .find_series("P001", "WH01", date, date)
        .unwrap();

    // 同键覆盖,不产生重复行
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].forecast, Some(25.0));
}

#[test]
fn test_forecast_repo_latest_forecast() {
    let db = setup_test_db();

    db.forecast_repo
        .batch_insert(vec![
            ObservationBuilder::new("P001", make_date(2026, 3, 1)).forecast(10.0).build(),
            ObservationBuilder::new("P001", make_date(2026, 3, 9)).forecast(30.0).build(),
            // 最近一行无预测值,不应命中
            ObservationBuilder::new("P001", make_date(2026, 3, 10)).actual(99.0).build(),
        ])
        .unwrap();

    let latest = db
        .forecast_repo
        .find_latest_forecast("P001", "WH01")
        .unwrap()
        .unwrap();
    assert_eq!(latest.obs_date, make_date(2026, 3, 9));

    assert!(db
        .forecast_repo
        .find_latest_forecast("P404", "WH01")
        .unwrap()
        .is_none());
}

// ==========================================
// 库存快照仓储
// ==========================================

#[test]
fn test_inventory_repo_upsert_and_find() {
    let db = setup_test_db();

    db.inventory_repo
        .upsert(&SnapshotBuilder::new("P001", "WH01").current_stock(500.0).build())
        .unwrap();
    db.inventory_repo
        .upsert(&SnapshotBuilder::new("P001", "WH02").current_stock(800.0).build())
        .unwrap();

    let found = db
        .inventory_repo
        .find_by_key("P001", "WH01")
        .unwrap()
        .unwrap();
    assert_eq!(found.current_stock, 500.0);

    // 缺失快照 → None (调用方跳过,不报错)
    assert!(db.inventory_repo.find_by_key("P001", "WH99").unwrap().is_none());

    // 单产品全部节点
    let nodes = db.inventory_repo.find_by_product("P001").unwrap();
    assert_eq!(nodes.len(), 2);
}

#[test]
fn test_inventory_repo_update_safety_stock() {
    let db = setup_test_db();
    db.inventory_repo
        .upsert(&SnapshotBuilder::new("P001", "WH01").safety_stock(100.0).build())
        .unwrap();

    db.inventory_repo
        .update_safety_stock("P001", "WH01", 180.0)
        .unwrap();
    let found = db
        .inventory_repo
        .find_by_key("P001", "WH01")
        .unwrap()
        .unwrap();
    assert_eq!(found.safety_stock, 180.0);

    // 不存在的快照 → NotFound
    let err = db
        .inventory_repo
        .update_safety_stock("P404", "WH01", 50.0)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

// ==========================================
// 情景仓储: 定义/状态流转/结果覆盖
// ==========================================

#[test]
fn test_scenario_status_guard_rejects_double_running() {
    use demand_planning_dss::api::scenario_api::CreateScenarioRequest;
    use demand_planning_dss::api::ScenarioApi;
    use demand_planning_dss::domain::scenario::{ScenarioParameters, ScenarioScope};
    use demand_planning_dss::service::ScenarioRunner;
    use std::sync::Arc;

    let db = setup_test_db();
    let runner = Arc::new(ScenarioRunner::new(
        db.scenario_repo.clone(),
        db.forecast_repo.clone(),
        db.inventory_repo.clone(),
    ));
    let api = ScenarioApi::new(db.scenario_repo.clone(), runner);

    let definition = api
        .create_scenario(CreateScenarioRequest {
            scenario_name: "并发守卫".to_string(),
            scenario_type: "SEASONAL_IMPACT".to_string(),
            parameters: ScenarioParameters::default(),
            scope: ScenarioScope {
                product_ids: vec![],
                warehouse_ids: vec![],
                customer_ids: vec![],
                time_horizon_days: 30,
            },
            description: None,
        })
        .unwrap();

    // Draft → Running
    db.scenario_repo
        .transition_status(
            &definition.scenario_id,
            &[ScenarioStatus::Draft],
            ScenarioStatus::Running,
            None,
        )
        .unwrap();

    // 已在 Running → 再次进入被拒绝 (单情景至多一个活跃执行)
    let err = db
        .scenario_repo
        .transition_status(
            &definition.scenario_id,
            &[
                ScenarioStatus::Draft,
                ScenarioStatus::Completed,
                ScenarioStatus::Failed,
            ],
            ScenarioStatus::Running,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidStateTransition { .. }));

    // Running → Failed 记录错误
    db.scenario_repo
        .transition_status(
            &definition.scenario_id,
            &[ScenarioStatus::Running],
            ScenarioStatus::Failed,
            Some("数据拉取失败"),
        )
        .unwrap();
    let reloaded = db
        .scenario_repo
        .find_by_id(&definition.scenario_id)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, ScenarioStatus::Failed);
    assert_eq!(reloaded.error_message.as_deref(), Some("数据拉取失败"));
}

#[test]
fn test_scenario_result_overwrite_on_rerun() {
    use demand_planning_dss::domain::scenario::{
        ScenarioImpactSummary, ScenarioResult,
    };
    use chrono::Utc;

    let db = setup_test_db();
    let now = Utc::now().naive_utc();

    let make_result = |result_id: &str, impact: f64| ScenarioResult {
        result_id: result_id.to_string(),
        scenario_id: "S001".to_string(),
        baseline_value: 1000.0,
        adjusted_value: 1000.0 + impact,
        impact,
        impact_percentage: impact / 10.0,
        impact_summary: ScenarioImpactSummary::default(),
        detailed_changes: vec![],
        created_at: now,
    };

    db.scenario_repo.upsert_result(&make_result("R1", 150.0)).unwrap();
    db.scenario_repo.upsert_result(&make_result("R2", 200.0)).unwrap();

    // 重新执行覆盖旧结果,一个情景至多一份
    let result = db.scenario_repo.find_result("S001").unwrap().unwrap();
    assert_eq!(result.result_id, "R2");
    assert_eq!(result.impact, 200.0);
}

// ==========================================
// 异常仓储: 状态流转/汇总
// ==========================================

#[test]
fn test_exception_repo_transitions_and_resolution_stamp() {
    let db = setup_test_db();

    db.exception_repo
        .batch_insert(vec![ExceptionBuilder::new("EX001", "stockout_risk")
            .values(2.0, 10.0)
            .build()])
        .unwrap();

    // Active → Acknowledged → InProgress → Resolved
    db.exception_repo
        .transition_status("EX001", ExceptionStatus::Active, ExceptionStatus::Acknowledged, None)
        .unwrap();
    db.exception_repo
        .transition_status(
            "EX001",
            ExceptionStatus::Acknowledged,
            ExceptionStatus::InProgress,
            None,
        )
        .unwrap();
    db.exception_repo
        .transition_status(
            "EX001",
            ExceptionStatus::InProgress,
            ExceptionStatus::Resolved,
            Some("已紧急补货"),
        )
        .unwrap();

    let record = db.exception_repo.find_by_id("EX001").unwrap().unwrap();
    assert_eq!(record.status, ExceptionStatus::Resolved);
    // 解决时间戳与备注已写入
    assert!(record.resolved_at.is_some());
    assert_eq!(record.resolution_notes.as_deref(), Some("已紧急补货"));

    // 条件更新兜底: 已解决后旧状态不再命中
    let err = db
        .exception_repo
        .transition_status("EX001", ExceptionStatus::Active, ExceptionStatus::InProgress, None)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidStateTransition { .. }));
}

#[test]
fn test_exception_repo_severity_ordering_and_summary() {
    let db = setup_test_db();

    db.exception_repo
        .batch_insert(vec![
            ExceptionBuilder::new("EX-L", "stockout_risk")
                .severity(ExceptionSeverity::Low)
                .values(8.0, 10.0)
                .build(),
            ExceptionBuilder::new("EX-C", "stockout_risk")
                .severity(ExceptionSeverity::Critical)
                .values(1.0, 10.0)
                .build(),
            ExceptionBuilder::new("EX-H", "excess_inventory")
                .severity(ExceptionSeverity::High)
                .values(900.0, 400.0)
                .build(),
        ])
        .unwrap();

    // 严重度降序
    let active = db
        .exception_repo
        .list_by_status(ExceptionStatus::Active)
        .unwrap();
    let ids: Vec<_> = active.iter().map(|r| r.exception_id.as_str()).collect();
    assert_eq!(ids, vec!["EX-C", "EX-H", "EX-L"]);

    // 解决一条后汇总只剩未解决
    db.exception_repo
        .transition_status("EX-L", ExceptionStatus::Active, ExceptionStatus::InProgress, None)
        .unwrap();
    db.exception_repo
        .transition_status("EX-L", ExceptionStatus::InProgress, ExceptionStatus::Resolved, None)
        .unwrap();

    let summary = db.exception_repo.summarize_active().unwrap();
    assert_eq!(summary.total_count, 2);
    assert_eq!(summary.critical_count, 1);
    assert_eq!(summary.high_count, 1);
    assert_eq!(summary.low_count, 0);
}
