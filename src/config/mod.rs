// ==========================================
// 供应链需求计划系统 - 配置层
// ==========================================
// 职责: 业务常量配置 (config_kv 表)
// ==========================================

pub mod planning_config;

pub use planning_config::PlanningConfigManager;
