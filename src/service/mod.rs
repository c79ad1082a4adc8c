// ==========================================
// 供应链需求计划系统 - 服务层
// ==========================================
// 职责: 跨仓储/引擎的生命周期编排
// ==========================================

pub mod scenario_runner;

pub use scenario_runner::ScenarioRunner;
