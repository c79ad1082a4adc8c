// ==========================================
// 供应链需求计划系统 - 情景影响引擎
// ==========================================
// 依据: Planning_Engine_Specs.md - 6. Scenario Impact Engine
// ==========================================
// 职责: 对基线施加命名变换并派生二级影响
// 输入: 基线值 + 情景类型 + 参数包
// 输出: ScenarioImpactOutcome (service 类型委托服务水平模型)
// 红线: 无状态引擎,纯函数
// ==========================================

use crate::domain::scenario::ScenarioParameters;
use crate::domain::types::ScenarioType;
use crate::engine::stats::TimeSeriesStatistics;

// ===== 默认参数 (业务常量) =====
const DEFAULT_SEASONAL_MULTIPLIER: f64 = 1.2; // 季节冲击默认乘数
const DEFAULT_PROMOTIONAL_LIFT: f64 = 0.3;    // 促销默认提升
const DEFAULT_SUPPLY_REDUCTION: f64 = 0.2;    // 供应中断默认削减
const INVENTORY_BUFFER_RATIO: f64 = 1.2;      // 库存影响缓冲系数 (固定 20% 缓冲假设)

// ==========================================
// ScenarioImpactOutcome - 影响计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioImpactOutcome {
    pub baseline: f64,            // 基线值
    pub adjusted: f64,            // 调整后值
    pub impact: f64,              // 影响量 = 调整后 − 基线
    pub impact_percentage: f64,   // 影响百分比 (基线为0 → 哨兵0)
    pub inventory_impact: f64,    // 库存影响 = 影响量 × 1.2
    pub service_level_impact: f64, // 服务水平影响 (阶跃: impact≥0 → +2, 否则 −5)
}

// ==========================================
// ScenarioImpactCalculator - 情景影响引擎
// ==========================================
pub struct ScenarioImpactCalculator {
    stats: TimeSeriesStatistics,
}

impl ScenarioImpactCalculator {
    /// 创建新的情景影响引擎
    pub fn new() -> Self {
        Self {
            stats: TimeSeriesStatistics::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算情景影响
    ///
    /// # 变换规则 (按类型互斥)
    /// - forecast_adjustment: 给定百分比 → 基线×(1+pct/100);否则 基线+绝对值
    /// - seasonal_impact:     基线 × 乘数 (默认 1.2)
    /// - promotional_impact:  基线 × (1+提升) (默认 0.3)
    /// - supply_disruption:   基线 × (1−削减) (默认 0.2)
    /// - service:             不在此处计算 → None (委托服务水平模型)
    pub fn calculate(
        &self,
        scenario_type: ScenarioType,
        parameters: &ScenarioParameters,
        baseline: f64,
    ) -> Option<ScenarioImpactOutcome> {
        let adjusted = match scenario_type {
            ScenarioType::ForecastAdjustment => match parameters.percentage {
                Some(pct) => baseline * (1.0 + pct / 100.0),
                None => baseline + parameters.absolute.unwrap_or(0.0),
            },
            ScenarioType::SeasonalImpact => {
                baseline * parameters.multiplier.unwrap_or(DEFAULT_SEASONAL_MULTIPLIER)
            }
            ScenarioType::PromotionalImpact => {
                baseline * (1.0 + parameters.lift.unwrap_or(DEFAULT_PROMOTIONAL_LIFT))
            }
            ScenarioType::SupplyDisruption => {
                baseline * (1.0 - parameters.reduction.unwrap_or(DEFAULT_SUPPLY_REDUCTION))
            }
            ScenarioType::Service => return None,
        };

        Some(self.derive_impacts(baseline, adjusted))
    }

    /// 从基线/调整后值派生二级影响
    fn derive_impacts(&self, baseline: f64, adjusted: f64) -> ScenarioImpactOutcome {
        let impact = adjusted - baseline;

        // 基线为 0 → 百分比取哨兵 0,不传播 NaN/Infinity
        let impact_percentage = if baseline == 0.0 {
            0.0
        } else {
            impact / baseline * 100.0
        };

        // 阶跃函数,非连续模型
        let service_level_impact = if impact >= 0.0 { 2.0 } else { -5.0 };

        ScenarioImpactOutcome {
            baseline,
            adjusted,
            impact,
            impact_percentage,
            inventory_impact: impact * INVENTORY_BUFFER_RATIO,
            service_level_impact,
        }
    }

    // ==========================================
    // 基线聚合
    // ==========================================

    /// 多行命中时按算术平均聚合基线
    ///
    /// 边界处理: 无命中行 → 0
    pub fn baseline_from_rows(&self, values: &[f64]) -> f64 {
        self.stats.mean(values)
    }
}

impl Default for ScenarioImpactCalculator {
    fn default() -> Self {
        Self::new()
    }
}
