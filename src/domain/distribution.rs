// ==========================================
// 供应链需求计划系统 - 多节点分布领域模型
// ==========================================
// 依据: Planning_Engine_Specs.md - 5. Distribution Engine
// ==========================================

use crate::domain::types::TransferUrgency;
use serde::{Deserialize, Serialize};

// ==========================================
// NodePlan - 单节点计划
// ==========================================
// 每个库存节点 (产品×仓库) 一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePlan {
    pub warehouse_id: String,     // 仓库ID
    pub current_stock: f64,       // 当前库存
    pub capacity: f64,            // 估算库容
    pub avg_daily_demand: f64,    // 日均需求 (该节点需求区)
    pub recommended_stock: f64,   // 推荐库存 = min(日均×30, 库容×0.8)
    pub reorder_point: f64,       // 再订货点 = 日均 × (提前期+5)
}

impl NodePlan {
    /// 是否欠储 (低于推荐库存的50%,触发调拨搜索)
    pub fn is_understocked(&self) -> bool {
        self.current_stock < self.recommended_stock * 0.5
    }

    /// 是否可作为调出源 (高于自身推荐库存的120%)
    pub fn is_surplus_source(&self) -> bool {
        self.current_stock > self.recommended_stock * 1.2
    }
}

// ==========================================
// TransferRecommendation - 调拨建议
// ==========================================
// 贪心单遍启发式产出,每个欠储节点至多一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecommendation {
    pub product_id: String,         // 产品ID
    pub from_warehouse: String,     // 调出仓
    pub to_warehouse: String,       // 调入仓
    pub quantity: f64,              // 调拨量 = min(缺口, 源库存×20%)
    pub urgency: TransferUrgency,   // 紧迫度
    pub reason: String,             // 触发原因
}

// ==========================================
// DistributionPlan - 单产品分布计划
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionPlan {
    pub product_id: String,
    pub nodes: Vec<NodePlan>,
    pub transfers: Vec<TransferRecommendation>,
}
