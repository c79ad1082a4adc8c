// ==========================================
// 供应链需求计划系统 - 服务水平情景模型
// ==========================================
// 依据: Planning_Engine_Specs.md - 6.6 Service Level Model
// ==========================================
// 职责: 服务水平目标情景的安全库存放大与成本影响
// 红线: 线性近似,不是真实缺货概率模型
// ==========================================

use crate::domain::inventory::InventorySnapshot;
use tracing::instrument;

/// 默认持有成本率 (年化)
const DEFAULT_HOLDING_COST_RATE: f64 = 0.25;

// ==========================================
// ProductServiceImpact - 单产品影响
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ProductServiceImpact {
    pub product_id: String,
    pub warehouse_id: String,
    pub current_safety_stock: f64,
    pub new_safety_stock: f64,     // round(当前 × 乘数)
    pub inventory_impact: f64,     // (新−旧) × 单位成本
    pub cost_impact: f64,          // 库存影响 × 持有成本率
    pub stockout_risk_change: f64, // 缺口 × 100 (线性近似)
}

// ==========================================
// ServiceLevelOutcome - 模型输出
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceLevelOutcome {
    pub service_level_gap: f64,            // 目标 − 当前
    pub safety_stock_multiplier: f64,      // clamp(1 + 2.5×缺口, 1.0, 2.0)
    pub per_product: Vec<ProductServiceImpact>,
    pub total_inventory_impact: f64,       // 库存增加合计
    pub total_cost_impact: f64,            // 成本影响合计
    pub mean_stockout_risk_reduction: f64, // 缺货风险降低均值
    pub service_achievement_rate: f64,     // clamp(1 − 0.1×缺口, 0, 1)
}

// ==========================================
// ServiceLevelModel - 服务水平情景模型
// ==========================================
pub struct ServiceLevelModel;

impl ServiceLevelModel {
    /// 创建新的服务水平模型
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 评估服务水平目标情景
    ///
    /// # 参数
    /// - `target_service_level` / `current_service_level`: 0-1 区间
    /// - `holding_cost_rate`: 持有成本率,None 取默认 0.25
    /// - `snapshots`: 受影响产品的库存快照
    ///
    /// # 规则
    /// - 缺口 ≤ 0 → 乘数 1.0 (无变化)
    /// - 乘数 = clamp(1 + 2.5×缺口, 1.0, 2.0)
    #[instrument(skip(self, snapshots), fields(affected = snapshots.len()))]
    pub fn evaluate(
        &self,
        target_service_level: f64,
        current_service_level: f64,
        holding_cost_rate: Option<f64>,
        snapshots: &[InventorySnapshot],
    ) -> ServiceLevelOutcome {
        let gap = target_service_level - current_service_level;
        let multiplier = self.safety_stock_multiplier(gap);
        let holding_rate = holding_cost_rate.unwrap_or(DEFAULT_HOLDING_COST_RATE);

        // 逐产品影响
        let per_product: Vec<ProductServiceImpact> = snapshots
            .iter()
            .map(|snapshot| {
                let new_safety_stock = (snapshot.safety_stock * multiplier).round();
                let inventory_impact =
                    (new_safety_stock - snapshot.safety_stock) * snapshot.unit_cost;

                ProductServiceImpact {
                    product_id: snapshot.product_id.clone(),
                    warehouse_id: snapshot.warehouse_id.clone(),
                    current_safety_stock: snapshot.safety_stock,
                    new_safety_stock,
                    inventory_impact,
                    cost_impact: inventory_impact * holding_rate,
                    stockout_risk_change: gap * 100.0,
                }
            })
            .collect();

        // 汇总聚合
        let total_inventory_impact = per_product.iter().map(|p| p.inventory_impact).sum();
        let total_cost_impact = per_product.iter().map(|p| p.cost_impact).sum();
        let mean_stockout_risk_reduction = if per_product.is_empty() {
            0.0
        } else {
            per_product
                .iter()
                .map(|p| p.stockout_risk_change)
                .sum::<f64>()
                / per_product.len() as f64
        };

        ServiceLevelOutcome {
            service_level_gap: gap,
            safety_stock_multiplier: multiplier,
            per_product,
            total_inventory_impact,
            total_cost_impact,
            mean_stockout_risk_reduction,
            service_achievement_rate: (1.0 - 0.1 * gap).clamp(0.0, 1.0),
        }
    }

    /// 安全库存放大乘数: clamp(1 + 2.5×缺口, 1.0, 2.0)
    pub fn safety_stock_multiplier(&self, service_level_gap: f64) -> f64 {
        (1.0 + 2.5 * service_level_gap).clamp(1.0, 2.0)
    }
}

impl Default for ServiceLevelModel {
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
    use chrono::Utc;

    fn make_snapshot(product: &str, safety: f64, unit_cost: f64) -> InventorySnapshot {
        InventorySnapshot {
            product_id: product.to_string(),
            warehouse_id: "WH01".to_string(),
            current_stock: 500.0,
            reorder_point: 100.0,
            safety_stock: safety,
            unit_cost,
            lead_time_days: 7,
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_multiplier_clamps_at_two() {
        let model = ServiceLevelModel::new();

        // 缺口 1.0 (目标100%, 当前0%) → 1+2.5 = 3.5 钳制到 2.0
        assert_eq!(model.safety_stock_multiplier(1.0), 2.0);
    }

    #[test]
    fn test_multiplier_no_change_on_negative_gap() {
        let model = ServiceLevelModel::new();

        // 已达标 → 乘数 1.0
        assert_eq!(model.safety_stock_multiplier(-0.05), 1.0);
        assert_eq!(model.safety_stock_multiplier(0.0), 1.0);
    }

    #[test]
    fn test_multiplier_linear_region() {
        let model = ServiceLevelModel::new();

        // 缺口 0.2 → 1 + 0.5 = 1.5
        assert!((model.safety_stock_multiplier(0.2) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_per_product_impacts() {
        let model = ServiceLevelModel::new();
        let snapshots = vec![make_snapshot("P001", 100.0, 10.0)];

        // 缺口 0.2 → 乘数 1.5
        let outcome = model.evaluate(0.95, 0.75, Some(0.25), &snapshots);

        let p = &outcome.per_product[0];
        assert_eq!(p.new_safety_stock, 150.0);
        // 库存影响 = 50 × 10 = 500; 成本影响 = 500 × 0.25 = 125
        assert!((p.inventory_impact - 500.0).abs() < 1e-9);
        assert!((p.cost_impact - 125.0).abs() < 1e-9);
        // 缺货风险变化 = 0.2 × 100 = 20
        assert!((p.stockout_risk_change - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_aggregates() {
        let model = ServiceLevelModel::new();
        let snapshots = vec![
            make_snapshot("P001", 100.0, 10.0),
            make_snapshot("P002", 200.0, 5.0),
        ];

        let outcome = model.evaluate(0.95, 0.75, None, &snapshots);

        // P001: (150−100)×10=500; P002: (300−200)×5=500 → 合计 1000
        assert!((outcome.total_inventory_impact - 1000.0).abs() < 1e-9);
        // 默认持有成本率 0.25 → 合计 250
        assert!((outcome.total_cost_impact - 250.0).abs() < 1e-9);
        assert!((outcome.mean_stockout_risk_reduction - 20.0).abs() < 1e-9);
        // 达成率 = clamp(1 − 0.1×0.2, 0, 1) = 0.98
        assert!((outcome.service_achievement_rate - 0.98).abs() < 1e-9);
    }

    #[test]
    fn test_new_safety_stock_is_rounded() {
        let model = ServiceLevelModel::new();
        let snapshots = vec![make_snapshot("P001", 33.0, 1.0)];

        // 缺口 0.1 → 乘数 1.25 → 33×1.25 = 41.25 → round 41
        let outcome = model.evaluate(0.9, 0.8, None, &snapshots);
        assert_eq!(outcome.per_product[0].new_safety_stock, 41.0);
    }
}
