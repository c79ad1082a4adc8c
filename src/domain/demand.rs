// ==========================================
// 供应链需求计划系统 - 需求观测领域模型
// ==========================================
// 依据: Planning_Engine_Specs.md - 1. 需求时间序列
// 红线: 观测值一经落库不可变,本核心只读
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// DemandObservation - 需求观测
// ==========================================
// 用途: 统计/投影引擎的只读输入,由上游计划流程产生
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandObservation {
    pub obs_date: NaiveDate,              // 观测日期
    pub product_id: String,               // 产品ID
    pub location_id: String,              // 地点ID
    pub customer_id: Option<String>,      // 客户ID (可选维度)

    // ===== 数值通道 (均可缺失) =====
    pub forecast: Option<f64>,            // 统计预测
    pub actual: Option<f64>,              // 实际销量
    pub sales_plan: Option<f64>,          // 销售计划
    pub demand_planner: Option<f64>,      // 计划员修正
    pub commercial_input: Option<f64>,    // 商务输入
}

impl DemandObservation {
    /// 预测需求值 (缺失按 0 处理)
    ///
    /// 策略: 缺失值不阻断看板计算,代价是"真零需求"与"无数据"不可区分
    pub fn forecast_or_zero(&self) -> f64 {
        self.forecast.unwrap_or(0.0)
    }

    /// 实际销量 (缺失按 0 处理)
    pub fn actual_or_zero(&self) -> f64 {
        self.actual.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_forecast_or_zero() {
        let obs = DemandObservation {
            obs_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            product_id: "P001".to_string(),
            location_id: "LOC01".to_string(),
            customer_id: None,
            forecast: None,
            actual: Some(12.5),
            sales_plan: None,
            demand_planner: None,
            commercial_input: None,
        };

        // 缺失预测按 0 处理,不报错
        assert_eq!(obs.forecast_or_zero(), 0.0);
        assert_eq!(obs.actual_or_zero(), 12.5);
    }
}
