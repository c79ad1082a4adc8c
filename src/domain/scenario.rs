// ==========================================
// 供应链需求计划系统 - 情景领域模型
// ==========================================
// 依据: Planning_Engine_Specs.md - 6. Scenario Impact Engine
// 生命周期: Draft → Running → Completed | Failed
// ==========================================

use crate::domain::types::{ScenarioStatus, ScenarioType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ScenarioScope - 情景作用范围
// ==========================================
// 空列表表示不按该维度过滤
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioScope {
    pub product_ids: Vec<String>,   // 产品范围
    pub warehouse_ids: Vec<String>, // 仓库范围
    pub customer_ids: Vec<String>,  // 客户范围
    pub time_horizon_days: i32,     // 时间范围 (天)
}

impl ScenarioScope {
    /// 判断产品是否在范围内 (空列表视为全选)
    pub fn contains_product(&self, product_id: &str) -> bool {
        self.product_ids.is_empty() || self.product_ids.iter().any(|p| p == product_id)
    }
}

// ==========================================
// ScenarioParameters - 情景参数包
// ==========================================
// 按情景类型取用对应字段,未给定时引擎取文档化默认值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    // forecast_adjustment: 二选一,百分比优先
    pub percentage: Option<f64>,            // 百分比调整 (如 15 表示 +15%)
    pub absolute: Option<f64>,              // 绝对值调整

    // seasonal_impact
    pub multiplier: Option<f64>,            // 季节乘数 (默认 1.2)

    // promotional_impact
    pub lift: Option<f64>,                  // 促销提升 (默认 0.3)

    // supply_disruption
    pub reduction: Option<f64>,             // 供应削减 (默认 0.2)

    // service
    pub target_service_level: Option<f64>,  // 目标服务水平 (0-1)
    pub current_service_level: Option<f64>, // 当前服务水平 (0-1)
    pub holding_cost_rate: Option<f64>,     // 持有成本率 (默认 0.25)
}

// ==========================================
// ScenarioDefinition - 情景定义
// ==========================================
// 用户动作创建;状态沿生命周期流转;终态 Completed / Failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub scenario_id: String,            // 情景ID
    pub scenario_name: String,          // 情景名称
    pub scenario_type: ScenarioType,    // 情景类型
    pub parameters: ScenarioParameters, // 方法专属参数
    pub scope: ScenarioScope,           // 作用范围
    pub description: Option<String>,    // 描述
    pub status: ScenarioStatus,         // 状态
    pub error_message: Option<String>,  // 失败原因 (仅 Failed 态)
    pub created_at: NaiveDateTime,      // 创建时间
    pub updated_at: NaiveDateTime,      // 更新时间
}

// ==========================================
// ScenarioImpactSummary - 影响摘要
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioImpactSummary {
    pub order_count_change: f64,    // 订单量变化
    pub value_change: f64,          // 价值变化
    pub lead_time_change: f64,      // 提前期变化
    pub service_level_impact: f64,  // 服务水平影响 (阶跃: +2 / −5)
    pub stockout_risk_change: f64,  // 缺货风险变化
}

// ==========================================
// DetailedChange - 明细变化
// ==========================================
// 每受影响产品一条,记录指标的前后值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedChange {
    pub product_id: String,           // 产品ID
    pub warehouse_id: Option<String>, // 仓库ID (产品级变化为 None)
    pub metric: String,               // 指标名 (如 forecast / safety_stock)
    pub before: f64,                  // 变化前
    pub after: f64,                   // 变化后
    pub delta: f64,                   // 变化量
}

// ==========================================
// ScenarioResult - 情景结果
// ==========================================
// 归属于唯一的 ScenarioDefinition;执行时一次性创建,之后不可变
// 重新执行生成新结果并覆盖旧结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub result_id: String,                    // 结果ID
    pub scenario_id: String,                  // 关联情景
    pub baseline_value: f64,                  // 基线值
    pub adjusted_value: f64,                  // 调整后值
    pub impact: f64,                          // 影响量 = 调整后 − 基线
    pub impact_percentage: f64,               // 影响百分比
    pub impact_summary: ScenarioImpactSummary, // 影响摘要
    pub detailed_changes: Vec<DetailedChange>, // 明细变化
    pub created_at: NaiveDateTime,            // 执行时间
}
