// ==========================================
// 供应链需求计划系统 - 异常领域模型
// ==========================================
// 依据: Planning_Engine_Specs.md - 7. Exception Engine
// 告警行由上游进程产生;本核心只做分类/增补与状态流转
// ==========================================

use crate::domain::types::{ExceptionSeverity, ExceptionStatus, RecommendedActionType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ExceptionRecord - 异常记录
// ==========================================
// exception_type 为上游自由文本,识别范围见 ExceptionType
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionRecord {
    pub exception_id: String,             // 异常ID
    pub exception_type: String,           // 异常类型 (上游给定)
    pub severity: ExceptionSeverity,      // 严重度 (上游给定,透传)
    pub product_id: String,               // 产品ID
    pub location: String,                 // 地点
    pub current_value: f64,               // 当前值
    pub threshold_value: f64,             // 阈值
    pub variance_percentage: f64,         // 偏差百分比
    pub days_of_supply: f64,              // 供应天数 (分类时计算)
    pub estimated_financial_impact: f64,  // 估算财务影响 (分类时计算)
    pub status: ExceptionStatus,          // 处理状态
    pub resolved_at: Option<NaiveDateTime>, // 解决时间戳 (仅 Resolved)
    pub resolution_notes: Option<String>, // 解决备注
    pub created_at: NaiveDateTime,        // 创建时间
}

// ==========================================
// RecommendedAction - 建议动作
// ==========================================
// 固定阈值规则产出,必须带 reason (可解释性)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub action_type: RecommendedActionType, // 动作类型
    pub quantity: Option<f64>,              // 建议数量 (监控类无数量)
    pub timeline: String,                   // 时限
    pub reason: String,                     // 规则命中原因
}

// ==========================================
// ClassifiedException - 分类增补后的异常
// ==========================================
// 派生数据: 原记录 + 财务量化 + 建议动作
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedException {
    pub record: ExceptionRecord,
    pub recommended_action: RecommendedAction,
}

// ==========================================
// ExceptionSummary - 异常面板汇总
// ==========================================
// 按严重度计数 + 财务影响合计 (看板 5 分钟轮询的数据源)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionSummary {
    pub total_count: i64,            // 总数
    pub critical_count: i64,         // 危急
    pub high_count: i64,             // 高
    pub medium_count: i64,           // 中
    pub low_count: i64,              // 低
    pub total_financial_impact: f64, // 财务影响合计
}
