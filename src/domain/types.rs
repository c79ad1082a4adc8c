// ==========================================
// 供应链需求计划系统 - 领域类型定义
// ==========================================
// 依据: Planning_Engine_Specs.md - 0.2 状态与等级体系
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 库存状态 (Inventory Status)
// ==========================================
// 顺序: Stockout < Critical < Warning < Optimal
// 分类规则见 InventoryProjector (纯阶跃函数,边界值落在低档)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryStatus {
    Stockout, // 缺货
    Critical, // 危险
    Warning,  // 警戒
    Optimal,  // 正常
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryStatus::Stockout => write!(f, "STOCKOUT"),
            InventoryStatus::Critical => write!(f, "CRITICAL"),
            InventoryStatus::Warning => write!(f, "WARNING"),
            InventoryStatus::Optimal => write!(f, "OPTIMAL"),
        }
    }
}

// ==========================================
// 安全库存计算方法 (Safety Stock Method)
// ==========================================
// 依据: Planning_Engine_Specs.md - 4. Safety Stock Engine
// 三种方法互斥,由数据质量/波动性启发式选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyStockMethod {
    Static,     // 静态公式
    Seasonal,   // 季节修正
    TrendBased, // 趋势修正
}

impl fmt::Display for SafetyStockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyStockMethod::Static => write!(f, "STATIC"),
            SafetyStockMethod::Seasonal => write!(f, "SEASONAL"),
            SafetyStockMethod::TrendBased => write!(f, "TREND_BASED"),
        }
    }
}

impl SafetyStockMethod {
    /// 从字符串解析计算方法
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SEASONAL" => SafetyStockMethod::Seasonal,
            "TREND_BASED" => SafetyStockMethod::TrendBased,
            _ => SafetyStockMethod::Static, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SafetyStockMethod::Static => "STATIC",
            SafetyStockMethod::Seasonal => "SEASONAL",
            SafetyStockMethod::TrendBased => "TREND_BASED",
        }
    }
}

// ==========================================
// 情景类型 (Scenario Type)
// ==========================================
// 依据: Planning_Engine_Specs.md - 6. Scenario Impact Engine
// 各类型互斥,决定基线的变换方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioType {
    ForecastAdjustment, // 预测调整 (百分比/绝对值)
    SeasonalImpact,     // 季节冲击
    PromotionalImpact,  // 促销提升
    SupplyDisruption,   // 供应中断
    Service,            // 服务水平目标 (委托服务水平模型)
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioType::ForecastAdjustment => write!(f, "FORECAST_ADJUSTMENT"),
            ScenarioType::SeasonalImpact => write!(f, "SEASONAL_IMPACT"),
            ScenarioType::PromotionalImpact => write!(f, "PROMOTIONAL_IMPACT"),
            ScenarioType::SupplyDisruption => write!(f, "SUPPLY_DISRUPTION"),
            ScenarioType::Service => write!(f, "SERVICE"),
        }
    }
}

impl ScenarioType {
    /// 从字符串解析情景类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FORECAST_ADJUSTMENT" => Some(ScenarioType::ForecastAdjustment),
            "SEASONAL_IMPACT" => Some(ScenarioType::SeasonalImpact),
            "PROMOTIONAL_IMPACT" => Some(ScenarioType::PromotionalImpact),
            "SUPPLY_DISRUPTION" => Some(ScenarioType::SupplyDisruption),
            "SERVICE" => Some(ScenarioType::Service),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScenarioType::ForecastAdjustment => "FORECAST_ADJUSTMENT",
            ScenarioType::SeasonalImpact => "SEASONAL_IMPACT",
            ScenarioType::PromotionalImpact => "PROMOTIONAL_IMPACT",
            ScenarioType::SupplyDisruption => "SUPPLY_DISRUPTION",
            ScenarioType::Service => "SERVICE",
        }
    }
}

// ==========================================
// 情景状态 (Scenario Status)
// ==========================================
// 生命周期: Draft → Running → Completed | Failed
// 重新执行回到 Running,覆盖旧结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioStatus {
    Draft,     // 草稿 (可编辑)
    Running,   // 执行中
    Completed, // 已完成 (结果已挂接)
    Failed,    // 失败 (错误已记录,无部分结果)
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioStatus::Draft => write!(f, "DRAFT"),
            ScenarioStatus::Running => write!(f, "RUNNING"),
            ScenarioStatus::Completed => write!(f, "COMPLETED"),
            ScenarioStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl ScenarioStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "RUNNING" => ScenarioStatus::Running,
            "COMPLETED" => ScenarioStatus::Completed,
            "FAILED" => ScenarioStatus::Failed,
            _ => ScenarioStatus::Draft, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScenarioStatus::Draft => "DRAFT",
            ScenarioStatus::Running => "RUNNING",
            ScenarioStatus::Completed => "COMPLETED",
            ScenarioStatus::Failed => "FAILED",
        }
    }

    /// 判断状态转换是否合法
    ///
    /// # 规则
    /// - Draft → Running
    /// - Running → Completed / Failed
    /// - Completed / Failed → Running (重新执行,覆盖旧结果)
    pub fn can_transition_to(&self, target: ScenarioStatus) -> bool {
        matches!(
            (self, target),
            (ScenarioStatus::Draft, ScenarioStatus::Running)
                | (ScenarioStatus::Running, ScenarioStatus::Completed)
                | (ScenarioStatus::Running, ScenarioStatus::Failed)
                | (ScenarioStatus::Completed, ScenarioStatus::Running)
                | (ScenarioStatus::Failed, ScenarioStatus::Running)
        )
    }
}

// ==========================================
// 异常严重度 (Exception Severity)
// ==========================================
// 顺序: Low < Medium < High < Critical
// 严重度由上游告警进程给定,本核心只透传,不重算
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionSeverity {
    Low,      // 低
    Medium,   // 中
    High,     // 高
    Critical, // 危急
}

impl fmt::Display for ExceptionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExceptionSeverity::Low => write!(f, "LOW"),
            ExceptionSeverity::Medium => write!(f, "MEDIUM"),
            ExceptionSeverity::High => write!(f, "HIGH"),
            ExceptionSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl ExceptionSeverity {
    /// 从字符串解析严重度
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "CRITICAL" => ExceptionSeverity::Critical,
            "HIGH" => ExceptionSeverity::High,
            "MEDIUM" => ExceptionSeverity::Medium,
            _ => ExceptionSeverity::Low, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ExceptionSeverity::Critical => "CRITICAL",
            ExceptionSeverity::High => "HIGH",
            ExceptionSeverity::Medium => "MEDIUM",
            ExceptionSeverity::Low => "LOW",
        }
    }
}

// ==========================================
// 异常类型 (Exception Type)
// ==========================================
// 上游告警进程产生,本核心按类型估算财务影响
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionType {
    StockoutRisk,    // 缺货风险
    ExcessInventory, // 库存积压
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExceptionType::StockoutRisk => write!(f, "STOCKOUT_RISK"),
            ExceptionType::ExcessInventory => write!(f, "EXCESS_INVENTORY"),
        }
    }
}

impl ExceptionType {
    /// 从字符串解析异常类型
    ///
    /// 边界处理: 未识别的类型返回 None (财务影响取保底常量)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stockout_risk" => Some(ExceptionType::StockoutRisk),
            "excess_inventory" => Some(ExceptionType::ExcessInventory),
            _ => None,
        }
    }
}

// ==========================================
// 异常处理状态 (Exception Status)
// ==========================================
// 生命周期: Active → Acknowledged | InProgress → Resolved
// Resolved 为终态,不可逆
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionStatus {
    Active,       // 活跃
    Acknowledged, // 已确认
    InProgress,   // 处理中
    Resolved,     // 已解决 (终态)
}

impl fmt::Display for ExceptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExceptionStatus::Active => write!(f, "ACTIVE"),
            ExceptionStatus::Acknowledged => write!(f, "ACKNOWLEDGED"),
            ExceptionStatus::InProgress => write!(f, "IN_PROGRESS"),
            ExceptionStatus::Resolved => write!(f, "RESOLVED"),
        }
    }
}

impl ExceptionStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ACKNOWLEDGED" => ExceptionStatus::Acknowledged,
            "IN_PROGRESS" => ExceptionStatus::InProgress,
            "RESOLVED" => ExceptionStatus::Resolved,
            _ => ExceptionStatus::Active, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ExceptionStatus::Active => "ACTIVE",
            ExceptionStatus::Acknowledged => "ACKNOWLEDGED",
            ExceptionStatus::InProgress => "IN_PROGRESS",
            ExceptionStatus::Resolved => "RESOLVED",
        }
    }

    /// 判断状态转换是否合法
    ///
    /// # 规则
    /// - Active → Acknowledged / InProgress
    /// - Acknowledged → InProgress / Resolved
    /// - InProgress → Resolved
    /// - Resolved 不可转出
    pub fn can_transition_to(&self, target: ExceptionStatus) -> bool {
        matches!(
            (self, target),
            (ExceptionStatus::Active, ExceptionStatus::Acknowledged)
                | (ExceptionStatus::Active, ExceptionStatus::InProgress)
                | (ExceptionStatus::Acknowledged, ExceptionStatus::InProgress)
                | (ExceptionStatus::Acknowledged, ExceptionStatus::Resolved)
                | (ExceptionStatus::InProgress, ExceptionStatus::Resolved)
        )
    }
}

// ==========================================
// 调拨紧迫度 (Transfer Urgency)
// ==========================================
// 依据: Planning_Engine_Specs.md - 5. Distribution Engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferUrgency {
    High,     // 高 (低于推荐库存的50%)
    Critical, // 危急 (同时低于再订货点)
}

impl fmt::Display for TransferUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferUrgency::High => write!(f, "HIGH"),
            TransferUrgency::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ==========================================
// 建议动作类型 (Recommended Action Type)
// ==========================================
// 依据: Planning_Engine_Specs.md - 7. Exception Engine
// 固定阈值规则,首条命中即返回
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedActionType {
    UrgentReorder,     // 紧急补货 (24小时)
    Reorder,           // 标准补货 (3天)
    TransferOrPromote, // 调拨或促销 (1周)
    Monitor,           // 持续监控 (每周复查)
}

impl fmt::Display for RecommendedActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendedActionType::UrgentReorder => write!(f, "URGENT_REORDER"),
            RecommendedActionType::Reorder => write!(f, "REORDER"),
            RecommendedActionType::TransferOrPromote => write!(f, "TRANSFER_OR_PROMOTE"),
            RecommendedActionType::Monitor => write!(f, "MONITOR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_status_ordering() {
        // 分类顺序: 缺货最低,正常最高
        assert!(InventoryStatus::Stockout < InventoryStatus::Critical);
        assert!(InventoryStatus::Critical < InventoryStatus::Warning);
        assert!(InventoryStatus::Warning < InventoryStatus::Optimal);
    }

    #[test]
    fn test_exception_severity_ordering() {
        assert!(ExceptionSeverity::Low < ExceptionSeverity::Medium);
        assert!(ExceptionSeverity::Medium < ExceptionSeverity::High);
        assert!(ExceptionSeverity::High < ExceptionSeverity::Critical);
    }

    #[test]
    fn test_scenario_status_transitions() {
        assert!(ScenarioStatus::Draft.can_transition_to(ScenarioStatus::Running));
        assert!(ScenarioStatus::Running.can_transition_to(ScenarioStatus::Completed));
        assert!(ScenarioStatus::Running.can_transition_to(ScenarioStatus::Failed));
        // 重新执行
        assert!(ScenarioStatus::Completed.can_transition_to(ScenarioStatus::Running));
        assert!(ScenarioStatus::Failed.can_transition_to(ScenarioStatus::Running));
        // 非法转换
        assert!(!ScenarioStatus::Draft.can_transition_to(ScenarioStatus::Completed));
        assert!(!ScenarioStatus::Completed.can_transition_to(ScenarioStatus::Draft));
    }

    #[test]
    fn test_exception_status_resolved_is_terminal() {
        assert!(!ExceptionStatus::Resolved.can_transition_to(ExceptionStatus::Active));
        assert!(!ExceptionStatus::Resolved.can_transition_to(ExceptionStatus::Acknowledged));
        assert!(!ExceptionStatus::Resolved.can_transition_to(ExceptionStatus::InProgress));
    }

    #[test]
    fn test_exception_type_from_str() {
        assert_eq!(
            ExceptionType::from_str("stockout_risk"),
            Some(ExceptionType::StockoutRisk)
        );
        assert_eq!(
            ExceptionType::from_str("EXCESS_INVENTORY"),
            Some(ExceptionType::ExcessInventory)
        );
        assert_eq!(ExceptionType::from_str("quality_hold"), None);
    }

    #[test]
    fn test_scenario_type_roundtrip() {
        for t in [
            ScenarioType::ForecastAdjustment,
            ScenarioType::SeasonalImpact,
            ScenarioType::PromotionalImpact,
            ScenarioType::SupplyDisruption,
            ScenarioType::Service,
        ] {
            assert_eq!(ScenarioType::from_str(t.to_db_str()), Some(t));
        }
    }
}
