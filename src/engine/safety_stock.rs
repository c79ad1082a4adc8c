// ==========================================
// 供应链需求计划系统 - 安全库存引擎
// ==========================================
// 依据: Planning_Engine_Specs.md - 4. Safety Stock Engine
// ==========================================
// 职责: 按需求历史与提前期产出安全库存建议
// 方法: static / seasonal / trend_based,由数据质量启发式选择
// 红线: 无状态引擎,纯函数;ID/时间戳由调用方补齐
// ==========================================

use crate::domain::demand::DemandObservation;
use crate::domain::inventory::InventorySnapshot;
use crate::domain::safety_stock::SeasonalFactor;
use crate::domain::types::SafetyStockMethod;
use crate::engine::stats::TimeSeriesStatistics;
use chrono::{Datelike, Duration, NaiveDate};
use tracing::instrument;

// ==========================================
// SafetyStockParams - 计算参数
// ==========================================
#[derive(Debug, Clone)]
pub struct SafetyStockParams {
    pub z_score: f64,             // 服务水平 Z 值 (默认 1.65, 单侧 95%)
    pub floor_multiplier: f64,    // 下限乘数 (默认 3.0 × 日均需求)
    pub history_window_days: i64, // 历史窗口 (默认 365 天)
}

impl Default for SafetyStockParams {
    fn default() -> Self {
        Self {
            z_score: 1.65,
            floor_multiplier: 3.0,
            history_window_days: 365,
        }
    }
}

// ==========================================
// SafetyStockCalculation - 引擎输出
// ==========================================
// 纯计算结果;落库前由 API 层补 ID 与时间戳
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyStockCalculation {
    pub recommended_safety_stock: f64,
    pub calculation_method: SafetyStockMethod,
    pub demand_variability: f64,
    pub avg_daily_demand: f64,
    pub seasonal_factors: Vec<SeasonalFactor>,
    pub confidence_interval: f64,
    pub cost_impact: f64,
}

// ==========================================
// SafetyStockCalculator - 安全库存引擎
// ==========================================
pub struct SafetyStockCalculator {
    stats: TimeSeriesStatistics,
}

impl SafetyStockCalculator {
    /// 创建新的安全库存引擎
    pub fn new() -> Self {
        Self {
            stats: TimeSeriesStatistics::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算安全库存建议
    ///
    /// # 参数
    /// - `history`: 需求观测历史 (引擎只取 as_of 前 history_window_days 内的非空预测值)
    /// - `snapshot`: 库存快照 (提供当前安全库存/单位成本/提前期)
    /// - `as_of`: 计算基准日 (决定当月季节因子与历史窗口)
    ///
    /// # 方法选择 (首条命中)
    /// 1. 历史点数 ≥12 且 波动性 > 0.3 → seasonal
    /// 2. 历史点数 ≥6  且 波动性 > 0.2 → trend_based
    /// 3. 其他 → static
    ///
    /// # 下限
    /// 建议值不低于 floor_multiplier × 日均需求
    #[instrument(skip(self, history, snapshot), fields(
        product_id = %snapshot.product_id,
        history_rows = history.len()
    ))]
    pub fn calculate(
        &self,
        history: &[DemandObservation],
        snapshot: &InventorySnapshot,
        as_of: NaiveDate,
        params: &SafetyStockParams,
    ) -> SafetyStockCalculation {
        // 1. 截取窗口内非空预测值 (按日期升序)
        let series = self.trailing_series(history, as_of, params.history_window_days);
        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();

        // 2. 基础统计量
        let avg_demand = self.stats.mean(&values);
        let variability = self.stats.coefficient_of_variation(&values);

        // 3. 月度季节因子
        let seasonal_factors = self.seasonal_factors(&series, avg_demand);

        // 4. 三个候选值
        let static_value =
            params.z_score * (snapshot.lead_time_days as f64).sqrt() * avg_demand * variability;
        let current_month_factor = seasonal_factors
            .iter()
            .find(|f| f.month == as_of.month())
            .map(|f| f.factor)
            .unwrap_or(1.0);
        let seasonal_value = static_value * current_month_factor;
        let trend_value = static_value * self.trend_multiplier(&values);

        // 5. 方法选择
        let method = self.select_method(values.len(), variability);
        let candidate = match method {
            SafetyStockMethod::Static => static_value,
            SafetyStockMethod::Seasonal => seasonal_value,
            SafetyStockMethod::TrendBased => trend_value,
        };

        // 6. 下限保护
        let recommended = candidate.max(params.floor_multiplier * avg_demand);

        SafetyStockCalculation {
            recommended_safety_stock: recommended,
            calculation_method: method,
            demand_variability: variability,
            avg_daily_demand: avg_demand,
            seasonal_factors,
            confidence_interval: 0.95,
            cost_impact: (recommended - snapshot.safety_stock) * snapshot.unit_cost,
        }
    }

    // ==========================================
    // 方法选择 (依据 Planning_Engine_Specs 4.3)
    // ==========================================

    /// 按历史点数与波动性选择计算方法 (互斥,首条命中)
    pub fn select_method(&self, history_points: usize, variability: f64) -> SafetyStockMethod {
        if history_points >= 12 && variability > 0.3 {
            SafetyStockMethod::Seasonal
        } else if history_points >= 6 && variability > 0.2 {
            SafetyStockMethod::TrendBased
        } else {
            SafetyStockMethod::Static
        }
    }

    // ==========================================
    // 指标计算
    // ==========================================

    /// 截取窗口内的非空预测序列
    fn trailing_series(
        &self,
        history: &[DemandObservation],
        as_of: NaiveDate,
        window_days: i64,
    ) -> Vec<(NaiveDate, f64)> {
        let window_start = as_of - Duration::days(window_days);
        let mut series: Vec<(NaiveDate, f64)> = history
            .iter()
            .filter(|obs| obs.obs_date > window_start && obs.obs_date <= as_of)
            .filter_map(|obs| obs.forecast.map(|v| (obs.obs_date, v)))
            .collect();
        series.sort_by_key(|(date, _)| *date);
        series
    }

    /// 12 个月度季节因子: factor = 月均 / 全局均值
    ///
    /// 边界处理:
    /// - 全局均值为 0 → 因子 1.0
    /// - 无观测的月份 → 因子 1.0, 方差 0
    fn seasonal_factors(
        &self,
        series: &[(NaiveDate, f64)],
        overall_mean: f64,
    ) -> Vec<SeasonalFactor> {
        (1..=12)
            .map(|month| {
                let month_values: Vec<f64> = series
                    .iter()
                    .filter(|(date, _)| date.month() == month)
                    .map(|(_, v)| *v)
                    .collect();

                if month_values.is_empty() || overall_mean == 0.0 {
                    return SeasonalFactor {
                        month,
                        factor: 1.0,
                        variance: 0.0,
                    };
                }

                SeasonalFactor {
                    month,
                    factor: self.stats.mean(&month_values) / overall_mean,
                    variance: self.stats.variance(&month_values),
                }
            })
            .collect()
    }

    /// 趋势乘数: 近3期均值 > 前3期均值 → 1.2,否则 0.9
    ///
    /// 序列不足 6 点时返回 0.9 (趋势法只在 ≥6 点时被选中)
    fn trend_multiplier(&self, values: &[f64]) -> f64 {
        if values.len() < 6 {
            return 0.9;
        }
        let recent = &values[values.len() - 3..];
        let prior = &values[values.len() - 6..values.len() - 3];
        if self.stats.mean(recent) > self.stats.mean(prior) {
            1.2
        } else {
            0.9
        }
    }
}

impl Default for SafetyStockCalculator {
    fn default() -> Self {
        Self::new()
    }
}
