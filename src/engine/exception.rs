// ==========================================
// 供应链需求计划系统 - 异常分类引擎
// ==========================================
// 依据: Planning_Engine_Specs.md - 7. Exception Engine
// ==========================================
// 职责: 告警行的财务量化 + 供应天数 + 建议动作
// 输入: 上游告警记录 + 需求/库存上下文
// 输出: ClassifiedException (严重度透传,不重算)
// ==========================================

use crate::domain::exception::{ClassifiedException, ExceptionRecord, RecommendedAction};
use crate::domain::types::{ExceptionType, RecommendedActionType};

/// 供应天数哨兵值 (周需求为零/缺失时)
pub const DAYS_OF_SUPPLY_SENTINEL: f64 = 999.0;

/// 未识别异常类型的保底财务影响
const FALLBACK_FINANCIAL_IMPACT: f64 = 100.0;

// ==========================================
// ExceptionContext - 分类上下文
// ==========================================
// 告警行之外的需求/库存侧输入
#[derive(Debug, Clone, Default)]
pub struct ExceptionContext {
    pub weekly_demand: Option<f64>,       // 周需求 (缺失按 0)
    pub starting_balance: f64,            // 期初余额
    pub safety_stock_requirement: f64,    // 安全库存需求量
}

// ==========================================
// ExceptionClassifier - 异常分类引擎
// ==========================================
// 红线: 无状态引擎,纯函数;严重度由上游给定只透传
pub struct ExceptionClassifier {
    unit_cost_estimate: f64,
}

impl ExceptionClassifier {
    /// 创建新的异常分类引擎 (统一单位成本估计 15.50)
    pub fn new() -> Self {
        Self {
            unit_cost_estimate: 15.50,
        }
    }

    /// 指定单位成本估计 (配置覆盖入口)
    pub fn with_unit_cost_estimate(unit_cost_estimate: f64) -> Self {
        Self { unit_cost_estimate }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 分类并增补告警记录
    ///
    /// # 计算
    /// - 财务影响: 按异常类型估算 (见 estimate_financial_impact)
    /// - 供应天数: round1(期初余额 / 日需求),周需求为零 → 哨兵 999
    /// - 偏差百分比: |当前−阈值|/阈值×100,阈值为零 → 哨兵 0
    /// - 建议动作: 固定阈值规则,首条命中
    pub fn classify(
        &self,
        record: &ExceptionRecord,
        context: &ExceptionContext,
    ) -> ClassifiedException {
        let mut enriched = record.clone();

        enriched.estimated_financial_impact = self.estimate_financial_impact(
            &record.exception_type,
            record.current_value,
            record.threshold_value,
        );
        enriched.days_of_supply =
            self.days_of_supply(context.starting_balance, context.weekly_demand);
        enriched.variance_percentage =
            self.variance_percentage(record.current_value, record.threshold_value);

        let recommended_action = self.recommend_action(record, context);

        ClassifiedException {
            record: enriched,
            recommended_action,
        }
    }

    // ==========================================
    // 财务影响估算 (依据 Planning_Engine_Specs 7.2)
    // ==========================================

    /// 按异常类型估算财务影响
    ///
    /// - stockout_risk:    |当前−阈值| × 单位成本估计 × 7
    /// - excess_inventory: |当前−阈值| × 单位成本估计 × 0.02
    /// - 未识别类型:       保底 100
    pub fn estimate_financial_impact(
        &self,
        exception_type: &str,
        current_value: f64,
        threshold_value: f64,
    ) -> f64 {
        let gap = (current_value - threshold_value).abs();

        match ExceptionType::from_str(exception_type) {
            Some(ExceptionType::StockoutRisk) => gap * self.unit_cost_estimate * 7.0,
            Some(ExceptionType::ExcessInventory) => gap * self.unit_cost_estimate * 0.02,
            None => FALLBACK_FINANCIAL_IMPACT,
        }
    }

    /// 供应天数: round1(期初余额 / (周需求/7))
    ///
    /// 边界处理: 周需求为零/缺失 → 哨兵 999 (不产生 Infinity/NaN)
    pub fn days_of_supply(&self, starting_balance: f64, weekly_demand: Option<f64>) -> f64 {
        let weekly = weekly_demand.unwrap_or(0.0);
        if weekly <= 0.0 {
            return DAYS_OF_SUPPLY_SENTINEL;
        }
        let days = starting_balance / (weekly / 7.0);
        (days * 10.0).round() / 10.0
    }

    /// 偏差百分比
    ///
    /// 边界处理: 阈值为零 → 哨兵 0
    fn variance_percentage(&self, current_value: f64, threshold_value: f64) -> f64 {
        if threshold_value == 0.0 {
            return 0.0;
        }
        (current_value - threshold_value).abs() / threshold_value.abs() * 100.0
    }

    // ==========================================
    // 建议动作 (依据 Planning_Engine_Specs 7.4)
    // ==========================================

    /// 固定阈值规则产出建议动作 (首条命中)
    ///
    /// 1. 当前值 ≤ 1.5 → 紧急补货, qty = max(4×周需求, 2×安全库存需求), 24小时
    /// 2. 当前值 ≤ 4   → 标准补货, qty = 6×周需求, 3天
    /// 3. excess_inventory 类型 → 调拨或促销, qty = |当前−阈值|, 1周
    /// 4. 其他 → 持续监控, 每周复查, 无数量
    pub fn recommend_action(
        &self,
        record: &ExceptionRecord,
        context: &ExceptionContext,
    ) -> RecommendedAction {
        let weekly = context.weekly_demand.unwrap_or(0.0);

        if record.current_value <= 1.5 {
            return RecommendedAction {
                action_type: RecommendedActionType::UrgentReorder,
                quantity: Some((4.0 * weekly).max(2.0 * context.safety_stock_requirement)),
                timeline: "24小时内".to_string(),
                reason: format!("当前值{:.2}不高于1.5,供应告急", record.current_value),
            };
        }

        if record.current_value <= 4.0 {
            return RecommendedAction {
                action_type: RecommendedActionType::Reorder,
                quantity: Some(6.0 * weekly),
                timeline: "3天内".to_string(),
                reason: format!("当前值{:.2}不高于4,按标准周期补货", record.current_value),
            };
        }

        if ExceptionType::from_str(&record.exception_type) == Some(ExceptionType::ExcessInventory) {
            return RecommendedAction {
                action_type: RecommendedActionType::TransferOrPromote,
                quantity: Some((record.current_value - record.threshold_value).abs()),
                timeline: "1周内".to_string(),
                reason: "库存积压,优先调拨或促销消化".to_string(),
            };
        }

        RecommendedAction {
            action_type: RecommendedActionType::Monitor,
            quantity: None,
            timeline: "每周复查".to_string(),
            reason: "未触发补货/调拨阈值,持续监控".to_string(),
        }
    }
}

impl Default for ExceptionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ExceptionSeverity, ExceptionStatus};
    use chrono::Utc;

    fn make_record(exception_type: &str, current: f64, threshold: f64) -> ExceptionRecord {
        ExceptionRecord {
            exception_id: "EX001".to_string(),
            exception_type: exception_type.to_string(),
            severity: ExceptionSeverity::High,
            product_id: "P001".to_string(),
            location: "WH01".to_string(),
            current_value: current,
            threshold_value: threshold,
            variance_percentage: 0.0,
            days_of_supply: 0.0,
            estimated_financial_impact: 0.0,
            status: ExceptionStatus::Active,
            resolved_at: None,
            resolution_notes: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_stockout_risk_financial_impact() {
        let classifier = ExceptionClassifier::new();

        // |2−10| × 15.50 × 7 = 868
        let impact = classifier.estimate_financial_impact("stockout_risk", 2.0, 10.0);
        assert!((impact - 868.0).abs() < 1e-9);
    }

    #[test]
    fn test_excess_inventory_financial_impact() {
        let classifier = ExceptionClassifier::new();

        // |500−100| × 15.50 × 0.02 = 124
        let impact = classifier.estimate_financial_impact("excess_inventory", 500.0, 100.0);
        assert!((impact - 124.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrecognized_type_fallback_impact() {
        let classifier = ExceptionClassifier::new();
        assert_eq!(
            classifier.estimate_financial_impact("quality_hold", 5.0, 1.0),
            100.0
        );
    }

    #[test]
    fn test_days_of_supply_sentinel() {
        let classifier = ExceptionClassifier::new();

        // 周需求为零/缺失 → 恰为 999,不是 Infinity/NaN
        assert_eq!(classifier.days_of_supply(100.0, Some(0.0)), 999.0);
        assert_eq!(classifier.days_of_supply(100.0, None), 999.0);
    }

    #[test]
    fn test_days_of_supply_rounded_to_one_decimal() {
        let classifier = ExceptionClassifier::new();

        // 100 / (70/7) = 10.0
        assert_eq!(classifier.days_of_supply(100.0, Some(70.0)), 10.0);
        // 100 / (21/7) = 33.333… → 33.3
        assert_eq!(classifier.days_of_supply(100.0, Some(21.0)), 33.3);
    }

    #[test]
    fn test_urgent_reorder_rule() {
        let classifier = ExceptionClassifier::new();
        let record = make_record("stockout_risk", 1.5, 10.0);
        let context = ExceptionContext {
            weekly_demand: Some(50.0),
            starting_balance: 20.0,
            safety_stock_requirement: 120.0,
        };

        let action = classifier.recommend_action(&record, &context);

        assert_eq!(action.action_type, RecommendedActionType::UrgentReorder);
        // max(4×50, 2×120) = max(200, 240) = 240
        assert_eq!(action.quantity, Some(240.0));
        assert_eq!(action.timeline, "24小时内");
    }

    #[test]
    fn test_standard_reorder_rule() {
        let classifier = ExceptionClassifier::new();
        let record = make_record("stockout_risk", 4.0, 10.0);
        let context = ExceptionContext {
            weekly_demand: Some(50.0),
            starting_balance: 200.0,
            safety_stock_requirement: 120.0,
        };

        let action = classifier.recommend_action(&record, &context);

        assert_eq!(action.action_type, RecommendedActionType::Reorder);
        assert_eq!(action.quantity, Some(300.0));
        assert_eq!(action.timeline, "3天内");
    }

    #[test]
    fn test_transfer_rule_for_excess_inventory() {
        let classifier = ExceptionClassifier::new();
        let record = make_record("excess_inventory", 500.0, 100.0);
        let context = ExceptionContext::default();

        let action = classifier.recommend_action(&record, &context);

        assert_eq!(action.action_type, RecommendedActionType::TransferOrPromote);
        assert_eq!(action.quantity, Some(400.0));
        assert_eq!(action.timeline, "1周内");
    }

    #[test]
    fn test_monitor_rule_fallback() {
        let classifier = ExceptionClassifier::new();
        let record = make_record("stockout_risk", 8.0, 10.0);
        let context = ExceptionContext::default();

        let action = classifier.recommend_action(&record, &context);

        assert_eq!(action.action_type, RecommendedActionType::Monitor);
        assert_eq!(action.quantity, None);
        assert_eq!(action.timeline, "每周复查");
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        let classifier = ExceptionClassifier::new();

        // excess_inventory 但当前值 ≤ 1.5 → 紧急补货规则先命中
        let record = make_record("excess_inventory", 1.0, 10.0);
        let context = ExceptionContext {
            weekly_demand: Some(10.0),
            starting_balance: 5.0,
            safety_stock_requirement: 30.0,
        };

        let action = classifier.recommend_action(&record, &context);
        assert_eq!(action.action_type, RecommendedActionType::UrgentReorder);
    }

    #[test]
    fn test_classify_enriches_record_and_passes_severity_through() {
        let classifier = ExceptionClassifier::new();
        let record = make_record("stockout_risk", 2.0, 10.0);
        let context = ExceptionContext {
            weekly_demand: Some(70.0),
            starting_balance: 100.0,
            safety_stock_requirement: 50.0,
        };

        let classified = classifier.classify(&record, &context);

        // 严重度透传
        assert_eq!(classified.record.severity, ExceptionSeverity::High);
        assert!((classified.record.estimated_financial_impact - 868.0).abs() < 1e-9);
        assert_eq!(classified.record.days_of_supply, 10.0);
        // |2−10|/10 × 100 = 80%
        assert!((classified.record.variance_percentage - 80.0).abs() < 1e-9);
        assert_eq!(
            classified.recommended_action.action_type,
            RecommendedActionType::Reorder
        );
    }
}
