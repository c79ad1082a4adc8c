// ==========================================
// ExceptionClassifier 引擎集成测试
// ==========================================
// 测试目标: 财务影响数值 / 供应天数哨兵 / 动作规则表 / 严重度透传
// ==========================================


use demand_planning_dss::domain::types::{
    ExceptionSeverity, RecommendedActionType,
};
use demand_planning_dss::engine::exception::{
    ExceptionClassifier, ExceptionContext, DAYS_OF_SUPPLY_SENTINEL,
};
use test_helpers::ExceptionBuilder;

// ==========================================
// 财务影响
// ==========================================

#[test]
fn test_stockout_risk_financial_impact_868() {
    let classifier = ExceptionClassifier::new();
    let record = ExceptionBuilder::new("EX001", "stockout_risk")
        .values(2.0, 10.0)
        .build();

    let classified = classifier.classify(&record, &ExceptionContext::default());

    // |2−10| × 15.50 × 7 = 868
    assert!((classified.record.estimated_financial_impact - 868.0).abs() < 1e-9);
}

#[test]
fn test_excess_inventory_financial_impact() {
    let classifier = ExceptionClassifier::new();
    let record = ExceptionBuilder::new("EX002", "excess_inventory")
        .values(900.0, 400.0)
        .build();

    let classified = classifier.classify(&record, &ExceptionContext::default());

    // |900−400| × 15.50 × 0.02 = 155
    assert!((classified.record.estimated_financial_impact - 155.0).abs() < 1e-9);
}

#[test]
fn test_unknown_type_flat_impact() {
    let classifier = ExceptionClassifier::new();
    let record = ExceptionBuilder::new("EX003", "forecast_drift")
        .values(50.0, 10.0)
        .build();

    let classified = classifier.classify(&record, &ExceptionContext::default());
    assert_eq!(classified.record.estimated_financial_impact, 100.0);
}

// ==========================================
// 供应天数哨兵
// ==========================================

#[test]
fn test_days_of_supply_sentinel_is_exactly_999() {
    let classifier = ExceptionClassifier::new();
    let record = ExceptionBuilder::new("EX004", "stockout_risk")
        .values(8.0, 10.0)
        .build();

    // 周需求缺失 → 999,不是 Infinity/NaN
    let classified = classifier.classify(
        &record,
        &ExceptionContext {
            weekly_demand: None,
            starting_balance: 100.0,
            safety_stock_requirement: 0.0,
        },
    );

    assert_eq!(classified.record.days_of_supply, DAYS_OF_SUPPLY_SENTINEL);
    assert_eq!(classified.record.days_of_supply, 999.0);
    assert!(classified.record.days_of_supply.is_finite());
}

// ==========================================
// 动作规则表 (首条命中)
// ==========================================

#[test]
fn test_action_rule_table() {
    let classifier = ExceptionClassifier::new();
    let context = ExceptionContext {
        weekly_demand: Some(50.0),
        starting_balance: 100.0,
        safety_stock_requirement: 120.0,
    };

    // ≤1.5 → 紧急补货
    let urgent = classifier.classify(
        &ExceptionBuilder::new("EX1", "stockout_risk").values(1.2, 10.0).build(),
        &context,
    );
    assert_eq!(
        urgent.recommended_action.action_type,
        RecommendedActionType::UrgentReorder
    );
    // qty = max(4×50, 2×120) = 240
    assert_eq!(urgent.recommended_action.quantity, Some(240.0));

    // ≤4 → 标准补货
    let standard = classifier.classify(
        &ExceptionBuilder::new("EX2", "stockout_risk").values(3.5, 10.0).build(),
        &context,
    );
    assert_eq!(
        standard.recommended_action.action_type,
        RecommendedActionType::Reorder
    );
    assert_eq!(standard.recommended_action.quantity, Some(300.0));

    // excess_inventory (且 >4) → 调拨或促销
    let transfer = classifier.classify(
        &ExceptionBuilder::new("EX3", "excess_inventory").values(900.0, 400.0).build(),
        &context,
    );
    assert_eq!(
        transfer.recommended_action.action_type,
        RecommendedActionType::TransferOrPromote
    );
    assert_eq!(transfer.recommended_action.quantity, Some(500.0));

    // 其余 → 监控,无数量
    let monitor = classifier.classify(
        &ExceptionBuilder::new("EX4", "stockout_risk").values(9.0, 10.0).build(),
        &context,
    );
    assert_eq!(
        monitor.recommended_action.action_type,
        RecommendedActionType::Monitor
    );
    assert_eq!(monitor.recommended_action.quantity, None);
}

// ==========================================
// 严重度透传
// ==========================================

#[test]
fn test_severity_passes_through_unchanged() {
    let classifier = ExceptionClassifier::new();

    for severity in [
        ExceptionSeverity::Critical,
        ExceptionSeverity::High,
        ExceptionSeverity::Medium,
        ExceptionSeverity::Low,
    ] {
        let record = ExceptionBuilder::new("EX", "stockout_risk")
            .severity(severity)
            .values(2.0, 10.0)
            .build();

        let classified = classifier.classify(&record, &ExceptionContext::default());
        // 严重度不重算
        assert_eq!(classified.record.severity, severity);
    }
}

// ==========================================
// 配置覆写入口
// ==========================================

#[test]
fn test_unit_cost_override_scales_impact() {
    let classifier = ExceptionClassifier::with_unit_cost_estimate(31.0);
    let record = ExceptionBuilder::new("EX005", "stockout_risk")
        .values(2.0, 10.0)
        .build();

    let classified = classifier.classify(&record, &ExceptionContext::default());

    // |2−10| × 31 × 7 = 1736
    assert!((classified.record.estimated_financial_impact - 1736.0).abs() < 1e-9);
}
