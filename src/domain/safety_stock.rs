// ==========================================
// 供应链需求计划系统 - 安全库存领域模型
// ==========================================
// 依据: Planning_Engine_Specs.md - 4. Safety Stock Engine
// ==========================================

use crate::domain::types::SafetyStockMethod;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SeasonalFactor - 月度季节因子
// ==========================================
// factor = 月均需求 / 全年均需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalFactor {
    pub month: u32,    // 月份 (1-12)
    pub factor: f64,   // 季节因子
    pub variance: f64, // 月内方差
}

// ==========================================
// SafetyStockRecommendation - 安全库存建议
// ==========================================
// 派生数据,每次请求重算;仅在调用方显式保存时落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyStockRecommendation {
    pub recommendation_id: String,            // 建议ID
    pub product_id: String,                   // 产品ID
    pub location_id: String,                  // 地点ID
    pub warehouse_id: String,                 // 仓库ID

    // ===== 建议值 =====
    pub current_safety_stock: f64,            // 当前安全库存
    pub recommended_safety_stock: f64,        // 建议安全库存
    pub calculation_method: SafetyStockMethod, // 计算方法

    // ===== 计算依据 (可解释性) =====
    pub demand_variability: f64,              // 需求波动性 (变异系数)
    pub seasonal_factors: Vec<SeasonalFactor>, // 12个月度季节因子
    pub confidence_interval: f64,             // 置信水平 (如 0.95)
    pub cost_impact: f64,                     // 成本影响 = (建议−当前) × 单位成本

    // ===== 元数据 =====
    pub created_at: NaiveDateTime,            // 计算时间
}

impl SafetyStockRecommendation {
    /// 建议变化量 (正值为加库存,负值为降库存)
    pub fn delta(&self) -> f64 {
        self.recommended_safety_stock - self.current_safety_stock
    }
}
