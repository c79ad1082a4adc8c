// ==========================================
// 供应链需求计划系统 - 库存领域模型
// ==========================================
// 依据: Planning_Engine_Specs.md - 2. 库存快照 / 3. Projection Engine
// ==========================================

use crate::domain::types::InventoryStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// InventorySnapshot - 库存快照
// ==========================================
// 用途: 单产品在单库存点的当前状态
// 红线: 只由外部补货/事务流程写入,投影引擎只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub product_id: String,       // 产品ID
    pub warehouse_id: String,     // 仓库ID
    pub current_stock: f64,       // 当前库存
    pub reorder_point: f64,       // 再订货点
    pub safety_stock: f64,        // 安全库存
    pub unit_cost: f64,           // 单位成本
    pub lead_time_days: i32,      // 补货提前期 (天)
    pub updated_at: NaiveDateTime, // 更新时间
}

impl InventorySnapshot {
    /// 估算最大库容
    ///
    /// 未配置显式库容时的启发式: multiplier × 当前库存
    pub fn estimated_capacity(&self, multiplier: f64) -> f64 {
        self.current_stock * multiplier
    }
}

// ==========================================
// InventoryProjectionPoint - 库存投影点
// ==========================================
// 派生数据,每次请求重算,不落库
// 不变量: projected_inventory = current_stock − cumulative_demand (+ 模拟补货)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryProjectionPoint {
    pub point_date: NaiveDate,        // 投影日期
    pub projected_inventory: f64,     // 投影库存
    pub forecast_demand: f64,         // 当日预测需求 (季节调整后)
    pub cumulative_demand: f64,       // 累计需求
    pub reorder_point: f64,           // 再订货点
    pub safety_stock: f64,            // 安全库存
    pub status: InventoryStatus,      // 当日状态
    pub replenishment_qty: Option<f64>, // 模拟补货量 (可解释性)
}

// ==========================================
// InventoryProjection - 单产品/仓库的投影序列
// ==========================================
// 有序,逐日一条,从第0天重算,无持久化游标
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryProjection {
    pub product_id: String,
    pub warehouse_id: String,
    pub starting_stock: f64,
    pub points: Vec<InventoryProjectionPoint>,
}

impl InventoryProjection {
    /// 首个缺货日 (无缺货返回 None)
    pub fn first_stockout_date(&self) -> Option<NaiveDate> {
        self.points
            .iter()
            .find(|p| p.status == InventoryStatus::Stockout)
            .map(|p| p.point_date)
    }

    /// 投影期内最差状态
    pub fn worst_status(&self) -> Option<InventoryStatus> {
        self.points.iter().map(|p| p.status).min()
    }
}
