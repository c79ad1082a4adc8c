// ==========================================
// 供应链需求计划系统 - 领域层
// ==========================================
// 职责: 实体与类型定义,不含业务规则
// ==========================================

pub mod demand;
pub mod distribution;
pub mod exception;
pub mod inventory;
pub mod safety_stock;
pub mod scenario;
pub mod types;

// 重导出核心实体
pub use demand::DemandObservation;
pub use distribution::{DistributionPlan, NodePlan, TransferRecommendation};
pub use exception::{
    ClassifiedException, ExceptionRecord, ExceptionSummary, RecommendedAction,
};
pub use inventory::{InventoryProjection, InventoryProjectionPoint, InventorySnapshot};
pub use safety_stock::{SafetyStockRecommendation, SeasonalFactor};
pub use scenario::{
    DetailedChange, ScenarioDefinition, ScenarioImpactSummary, ScenarioParameters,
    ScenarioResult, ScenarioScope,
};
