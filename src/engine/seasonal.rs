// ==========================================
// 供应链需求计划系统 - 季节调整引擎
// ==========================================
// 依据: Planning_Engine_Specs.md - 2. Seasonal Adjustment
// 红线: 月度因子表为业务常量,数值必须逐项一致
// ==========================================

use chrono::{Datelike, NaiveDate};

/// 月度季节因子表 (月份 → 因子)
///
/// 对日需求估计做乘法调整;11/12月为需求高峰
pub const SEASONAL_FACTORS: [(u32, f64); 12] = [
    (1, 0.90),
    (2, 0.95),
    (3, 1.00),
    (4, 1.05),
    (5, 1.10),
    (6, 1.15),
    (7, 1.20),
    (8, 1.15),
    (9, 1.05),
    (10, 1.10),
    (11, 1.25),
    (12, 1.30),
];

// ==========================================
// SeasonalAdjustment - 季节调整引擎
// ==========================================
pub struct SeasonalAdjustment;

impl SeasonalAdjustment {
    /// 创建新的季节调整引擎
    pub fn new() -> Self {
        Self
    }

    /// 按月份查因子
    ///
    /// 边界处理: 非法月份 → 1.0 (不调整)
    pub fn factor_for_month(&self, month: u32) -> f64 {
        SEASONAL_FACTORS
            .iter()
            .find(|(m, _)| *m == month)
            .map(|(_, f)| *f)
            .unwrap_or(1.0)
    }

    /// 按日期查因子 (取日历月)
    pub fn factor_for_date(&self, date: NaiveDate) -> f64 {
        self.factor_for_month(date.month())
    }

    /// 对日需求估计做季节调整
    pub fn adjust_daily_demand(&self, demand: f64, date: NaiveDate) -> f64 {
        demand * self.factor_for_date(date)
    }
}

impl Default for SeasonalAdjustment {
    fn default() -> Self {
        Self::new()
    }
}
