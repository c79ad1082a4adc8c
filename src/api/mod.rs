// ==========================================
// 供应链需求计划系统 - API 层
// ==========================================
// 职责: 请求范围编排 (取数 → 引擎 → 返回派生记录)
// ==========================================

pub mod distribution_api;
pub mod error;
pub mod exception_api;
pub mod projection_api;
pub mod safety_stock_api;
pub mod scenario_api;

// 重导出
pub use distribution_api::DistributionApi;
pub use error::{ApiError, ApiResult};
pub use exception_api::ExceptionApi;
pub use projection_api::{ProjectionApi, ProjectionBatchResponse, SkippedPair};
pub use safety_stock_api::SafetyStockApi;
pub use scenario_api::{CreateScenarioRequest, ScenarioApi};
