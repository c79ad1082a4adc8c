// ==========================================
// 供应链需求计划系统 - 多节点分布引擎
// ==========================================
// 依据: Planning_Engine_Specs.md - 5. Distribution Engine
// ==========================================
// 职责: 单产品多库存节点的推荐库存/再订货点与调拨建议
// 红线: 贪心单遍启发式,不做全局优化,不迭代收敛
// ==========================================

use crate::domain::distribution::{DistributionPlan, NodePlan, TransferRecommendation};
use crate::domain::inventory::InventorySnapshot;
use crate::domain::types::TransferUrgency;
use std::collections::HashMap;
use tracing::instrument;

// ==========================================
// DistributionParams - 计算参数
// ==========================================
#[derive(Debug, Clone)]
pub struct DistributionParams {
    pub capacity_multiplier: f64,   // 库容启发式乘数 (无显式库容时, 默认 2.0)
    pub coverage_days: f64,         // 推荐库存覆盖天数 (默认 30)
    pub capacity_cap_ratio: f64,    // 库容上限占比 (默认 0.8)
    pub lead_time_buffer_days: f64, // 再订货点提前期缓冲 (默认 5)
    pub transfer_source_ratio: f64, // 单次调拨占源库存上限 (默认 0.2)
}

impl Default for DistributionParams {
    fn default() -> Self {
        Self {
            capacity_multiplier: 2.0,
            coverage_days: 30.0,
            capacity_cap_ratio: 0.8,
            lead_time_buffer_days: 5.0,
            transfer_source_ratio: 0.2,
        }
    }
}

// ==========================================
// MultiNodeDistributionPlanner - 多节点分布引擎
// ==========================================
pub struct MultiNodeDistributionPlanner;

impl MultiNodeDistributionPlanner {
    /// 创建新的分布引擎
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 生成单产品的多节点分布计划
    ///
    /// # 参数
    /// - `nodes`: 同一产品的所有库存快照 (每行一个节点)
    /// - `node_demand`: 仓库ID → 该节点需求区日均需求
    /// - `node_capacity`: 仓库ID → 显式库容;缺失时取启发式 (乘数×当前库存)
    ///
    /// # 规则
    /// - 推荐库存 = min(日均 × 覆盖天数, 库容 × 上限占比)
    /// - 再订货点 = 日均 × (提前期 + 缓冲天数)
    /// - 欠储节点 (当前 < 推荐×50%) 按输入顺序搜索首个
    ///   盈余节点 (当前 > 自身推荐×120%) 作为调出源
    /// - 调拨量 = min(缺口, 源库存×20%);每个欠储节点至多一条建议
    #[instrument(skip_all, fields(product_id = product_id, node_count = nodes.len()))]
    pub fn plan(
        &self,
        product_id: &str,
        nodes: &[InventorySnapshot],
        node_demand: &HashMap<String, f64>,
        node_capacity: &HashMap<String, f64>,
        params: &DistributionParams,
    ) -> DistributionPlan {
        // 1. 逐节点计算推荐库存与再订货点
        let node_plans: Vec<NodePlan> = nodes
            .iter()
            .map(|snapshot| self.plan_node(snapshot, node_demand, node_capacity, params))
            .collect();

        // 2. 贪心单遍调拨搜索
        let transfers = self.propose_transfers(product_id, &node_plans, params);

        DistributionPlan {
            product_id: product_id.to_string(),
            nodes: node_plans,
            transfers,
        }
    }

    /// 单节点计划
    fn plan_node(
        &self,
        snapshot: &InventorySnapshot,
        node_demand: &HashMap<String, f64>,
        node_capacity: &HashMap<String, f64>,
        params: &DistributionParams,
    ) -> NodePlan {
        let avg_daily_demand = node_demand
            .get(&snapshot.warehouse_id)
            .copied()
            .unwrap_or(0.0);
        let capacity = node_capacity
            .get(&snapshot.warehouse_id)
            .copied()
            .unwrap_or_else(|| snapshot.estimated_capacity(params.capacity_multiplier));

        NodePlan {
            warehouse_id: snapshot.warehouse_id.clone(),
            current_stock: snapshot.current_stock,
            capacity,
            avg_daily_demand,
            recommended_stock: (avg_daily_demand * params.coverage_days)
                .min(capacity * params.capacity_cap_ratio),
            reorder_point: avg_daily_demand
                * (snapshot.lead_time_days as f64 + params.lead_time_buffer_days),
        }
    }

    // ==========================================
    // 调拨建议 (依据 Planning_Engine_Specs 5.2)
    // ==========================================

    /// 为每个欠储节点搜索至多一个调出源
    fn propose_transfers(
        &self,
        product_id: &str,
        node_plans: &[NodePlan],
        params: &DistributionParams,
    ) -> Vec<TransferRecommendation> {
        let mut transfers = Vec::new();

        for node in node_plans.iter().filter(|n| n.is_understocked()) {
            // 按输入顺序取首个盈余源 (确定性)
            let source = node_plans
                .iter()
                .find(|peer| peer.warehouse_id != node.warehouse_id && peer.is_surplus_source());

            let source = match source {
                Some(s) => s,
                None => continue,
            };

            let deficit = node.recommended_stock - node.current_stock;
            let quantity = deficit.min(source.current_stock * params.transfer_source_ratio);
            if quantity <= 0.0 {
                continue;
            }

            // 同时低于再订货点 → 危急
            let urgency = if node.current_stock < node.reorder_point {
                TransferUrgency::Critical
            } else {
                TransferUrgency::High
            };

            transfers.push(TransferRecommendation {
                product_id: product_id.to_string(),
                from_warehouse: source.warehouse_id.clone(),
                to_warehouse: node.warehouse_id.clone(),
                quantity,
                urgency,
                reason: format!(
                    "节点{}库存{:.1}低于推荐{:.1}的50%,源节点{}盈余",
                    node.warehouse_id,
                    node.current_stock,
                    node.recommended_stock,
                    source.warehouse_id
                ),
            });
        }

        transfers
    }
}

impl Default for MultiNodeDistributionPlanner {
    fn default() -> Self {
        Self::new()
    }
}
