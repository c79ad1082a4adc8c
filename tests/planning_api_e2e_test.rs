// ==========================================
// 计划 API 端到端测试 (投影/安全库存/多节点分布)
// ==========================================
// 测试目标: 取数→引擎→返回 的编排与缺数退化行为
// ==========================================


use chrono::Duration;
use std::collections::HashMap;

use demand_planning_dss::api::{
    ApiError, DistributionApi, ProjectionApi, SafetyStockApi,
};
use demand_planning_dss::domain::types::InventoryStatus;
use test_helpers::{make_date, setup_test_db, ObservationBuilder, SnapshotBuilder, TestDb};

fn make_projection_api(db: &TestDb) -> ProjectionApi {
    ProjectionApi::new(
        db.inventory_repo.clone(),
        db.forecast_repo.clone(),
        db.config.clone(),
    )
}

// ==========================================
// 库存投影 API
// ==========================================

#[test]
fn test_projection_api_happy_path() {
    let db = setup_test_db();
    let api = make_projection_api(&db);
    let start = make_date(2026, 3, 1);

    db.inventory_repo
        .upsert(
            &SnapshotBuilder::new("P001", "WH01")
                .current_stock(5000.0)
                .reorder_point(0.0)
                .safety_stock(200.0)
                .build(),
        )
        .unwrap();
    db.forecast_repo
        .batch_insert(vec![ObservationBuilder::new("P001", start)
            .forecast(10.0)
            .build()])
        .unwrap();

    let projection = api.project_inventory("P001", "WH01", start).unwrap();

    // 默认配置 90 天
    assert_eq!(projection.points.len(), 90);
    assert_eq!(projection.starting_stock, 5000.0);
    // 3月因子 1.00 → 第0天投影 4990
    assert!((projection.points[0].projected_inventory - 4990.0).abs() < 1e-9);
}

#[test]
fn test_projection_api_missing_snapshot_is_not_found() {
    let db = setup_test_db();
    let api = make_projection_api(&db);

    let err = api
        .project_inventory("P404", "WH01", make_date(2026, 3, 1))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_projection_batch_skips_missing_pairs() {
    let db = setup_test_db();
    let api = make_projection_api(&db);
    let start = make_date(2026, 3, 1);

    db.inventory_repo
        .upsert(&SnapshotBuilder::new("P001", "WH01").build())
        .unwrap();

    let pairs = vec![
        ("P001".to_string(), "WH01".to_string()),
        ("P404".to_string(), "WH01".to_string()), // 无快照
    ];
    let response = api.project_batch(&pairs, start).unwrap();

    // 缺失快照的对被跳过并上报,不阻断整批
    assert_eq!(response.projections.len(), 1);
    assert_eq!(response.skipped.len(), 1);
    assert_eq!(response.skipped[0].product_id, "P404");
}

#[test]
fn test_projection_api_no_forecast_is_flat_optimal() {
    let db = setup_test_db();
    let api = make_projection_api(&db);

    db.inventory_repo
        .upsert(
            &SnapshotBuilder::new("P001", "WH01")
                .current_stock(800.0)
                .reorder_point(100.0)
                .safety_stock(50.0)
                .build(),
        )
        .unwrap();

    let projection = api
        .project_inventory("P001", "WH01", make_date(2026, 3, 1))
        .unwrap();

    // 无预测 → 需求0 的水平线
    assert!(projection
        .points
        .iter()
        .all(|p| p.projected_inventory == 800.0 && p.status == InventoryStatus::Optimal));
}

// ==========================================
// 安全库存 API
// ==========================================

#[test]
fn test_safety_stock_recommend_and_save() {
    let db = setup_test_db();
    let api = SafetyStockApi::new(
        db.forecast_repo.clone(),
        db.inventory_repo.clone(),
        db.config.clone(),
    );
    let as_of = make_date(2026, 8, 1);

    db.inventory_repo
        .upsert(
            &SnapshotBuilder::new("P001", "WH01")
                .safety_stock(100.0)
                .unit_cost(2.0)
                .lead_time_days(9)
                .build(),
        )
        .unwrap();

    // 常量需求 50/天 × 30 天 → 波动性0 → static,下限 3×50 = 150
    let history: Vec<_> = (0..30)
        .map(|d| {
            ObservationBuilder::new("P001", as_of - Duration::days(30 - d))
                .forecast(50.0)
                .build()
        })
        .collect();
    db.forecast_repo.batch_insert(history).unwrap();

    let recommendation = api.recommend("P001", "WH01", "WH01", as_of).unwrap();

    assert_eq!(recommendation.current_safety_stock, 100.0);
    assert!((recommendation.recommended_safety_stock - 150.0).abs() < 1e-9);
    // 成本影响 = (150 − 100) × 2 = 100
    assert!((recommendation.cost_impact - 100.0).abs() < 1e-9);
    assert_eq!(recommendation.seasonal_factors.len(), 12);

    // 显式保存 → 写回快照
    api.save(&recommendation).unwrap();
    let snapshot = db
        .inventory_repo
        .find_by_key("P001", "WH01")
        .unwrap()
        .unwrap();
    assert!((snapshot.safety_stock - 150.0).abs() < 1e-9);
}

#[test]
fn test_safety_stock_missing_snapshot() {
    let db = setup_test_db();
    let api = SafetyStockApi::new(
        db.forecast_repo.clone(),
        db.inventory_repo.clone(),
        db.config.clone(),
    );

    let err = api
        .recommend("P404", "WH01", "WH01", make_date(2026, 8, 1))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// ==========================================
// 多节点分布 API
// ==========================================

#[test]
fn test_distribution_api_plan_with_transfer() {
    let db = setup_test_db();
    let api = DistributionApi::new(
        db.inventory_repo.clone(),
        db.forecast_repo.clone(),
        db.config.clone(),
    );
    let as_of = make_date(2026, 3, 31);

    // 两个节点: WH01 欠储,WH02 盈余
    db.inventory_repo
        .upsert(
            &SnapshotBuilder::new("P001", "WH01")
                .current_stock(100.0)
                .lead_time_days(7)
                .build(),
        )
        .unwrap();
    db.inventory_repo
        .upsert(
            &SnapshotBuilder::new("P001", "WH02")
                .current_stock(2000.0)
                .lead_time_days(7)
                .build(),
        )
        .unwrap();

    // 节点需求区: WH01 日均20, WH02 日均10
    let mut observations = Vec::new();
    for d in 0..30 {
        observations.push(
            ObservationBuilder::new("P001", as_of - Duration::days(d))
                .location("WH01")
                .forecast(20.0)
                .build(),
        );
        observations.push(
            ObservationBuilder::new("P001", as_of - Duration::days(d))
                .location("WH02")
                .forecast(10.0)
                .build(),
        );
    }
    db.forecast_repo.batch_insert(observations).unwrap();

    // 显式库容放开钳制
    let mut capacity = HashMap::new();
    capacity.insert("WH01".to_string(), 800.0);
    capacity.insert("WH02".to_string(), 4000.0);

    let plan = api
        .plan_for_product_with_capacity("P001", as_of, &capacity)
        .unwrap();

    assert_eq!(plan.nodes.len(), 2);
    // WH01: 推荐 min(20×30, 800×0.8) = 600;欠储 (100 < 300)
    let wh01 = plan.nodes.iter().find(|n| n.warehouse_id == "WH01").unwrap();
    assert!((wh01.recommended_stock - 600.0).abs() < 1e-9);
    assert!((wh01.reorder_point - 240.0).abs() < 1e-9);

    // 调拨: WH02 → WH01, min(500, 400) = 400
    assert_eq!(plan.transfers.len(), 1);
    assert_eq!(plan.transfers[0].from_warehouse, "WH02");
    assert!((plan.transfers[0].quantity - 400.0).abs() < 1e-9);
}

#[test]
fn test_distribution_api_unknown_product() {
    let db = setup_test_db();
    let api = DistributionApi::new(
        db.inventory_repo.clone(),
        db.forecast_repo.clone(),
        db.config.clone(),
    );

    let err = api
        .plan_for_product("P404", make_date(2026, 3, 1))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
