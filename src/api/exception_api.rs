// ==========================================
// 供应链需求计划系统 - 异常面板 API
// ==========================================
// 职责: 告警行分类增补、处理状态流转、面板汇总
// 说明: 严重度由上游给定透传;本层只做财务量化与动作建议
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::planning_config::PlanningConfigManager;
use crate::domain::exception::{ClassifiedException, ExceptionRecord, ExceptionSummary};
use crate::domain::types::ExceptionStatus;
use crate::engine::exception::{ExceptionClassifier, ExceptionContext};
use crate::repository::exception_repo::ExceptionRepository;
use crate::repository::forecast_repo::ForecastRepository;
use crate::repository::inventory_repo::InventoryRepository;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::warn;

// ==========================================
// ExceptionApi - 异常面板 API
// ==========================================
pub struct ExceptionApi {
    exception_repo: Arc<ExceptionRepository>,
    forecast_repo: Arc<ForecastRepository>,
    inventory_repo: Arc<InventoryRepository>,
    config: Arc<PlanningConfigManager>,
}

impl ExceptionApi {
    /// 创建新的 ExceptionApi 实例
    pub fn new(
        exception_repo: Arc<ExceptionRepository>,
        forecast_repo: Arc<ForecastRepository>,
        inventory_repo: Arc<InventoryRepository>,
        config: Arc<PlanningConfigManager>,
    ) -> Self {
        Self {
            exception_repo,
            forecast_repo,
            inventory_repo,
            config,
        }
    }

    // ==========================================
    // 分类增补
    // ==========================================

    /// 活跃异常的分类增补列表 (严重度降序)
    ///
    /// # 参数
    /// - as_of: 周需求统计基准日
    /// - persist: 是否把增补字段回写告警行
    pub fn list_active_classified(
        &self,
        as_of: NaiveDate,
        persist: bool,
    ) -> ApiResult<Vec<ClassifiedException>> {
        let classifier =
            ExceptionClassifier::with_unit_cost_estimate(self.config.unit_cost_estimate()?);
        let records = self.exception_repo.list_by_status(ExceptionStatus::Active)?;

        let mut classified = Vec::with_capacity(records.len());
        for record in &records {
            let context = self.build_context(record, as_of)?;
            let item = classifier.classify(record, &context);

            if persist {
                self.exception_repo.update_classification(&item.record)?;
            }
            classified.push(item);
        }

        Ok(classified)
    }

    /// 组装分类上下文 (缺数据按 0 处理,不阻断面板)
    fn build_context(
        &self,
        record: &ExceptionRecord,
        as_of: NaiveDate,
    ) -> ApiResult<ExceptionContext> {
        // 周需求 = 最近 7 天预测值合计 (缺失通道按 0)
        let series = self.forecast_repo.find_series(
            &record.product_id,
            &record.location,
            as_of - Duration::days(6),
            as_of,
        )?;
        let weekly_demand: f64 = series.iter().map(|obs| obs.forecast_or_zero()).sum();

        // 库存上下文 (快照缺失时按 0,异常面板不因此出错)
        let snapshot = self
            .inventory_repo
            .find_by_key(&record.product_id, &record.location)?;
        let (starting_balance, safety_stock_requirement) = match snapshot {
            Some(s) => (s.current_stock, s.safety_stock),
            None => {
                warn!(
                    product_id = %record.product_id,
                    location = %record.location,
                    "异常分类缺少库存快照,上下文按0处理"
                );
                (0.0, 0.0)
            }
        };

        Ok(ExceptionContext {
            weekly_demand: if series.is_empty() {
                None
            } else {
                Some(weekly_demand)
            },
            starting_balance,
            safety_stock_requirement,
        })
    }

    // ==========================================
    // 状态流转
    // ==========================================

    /// 确认异常 (Active → Acknowledged)
    pub fn acknowledge(&self, exception_id: &str) -> ApiResult<()> {
        self.transition(exception_id, ExceptionStatus::Acknowledged, None)
    }

    /// 开始处理 (Active/Acknowledged → InProgress)
    pub fn start_progress(&self, exception_id: &str) -> ApiResult<()> {
        self.transition(exception_id, ExceptionStatus::InProgress, None)
    }

    /// 解决异常 (→ Resolved,写入时间戳与可选备注)
    pub fn resolve(&self, exception_id: &str, notes: Option<&str>) -> ApiResult<()> {
        self.transition(exception_id, ExceptionStatus::Resolved, notes)
    }

    /// 通用状态流转 (合法性按领域规则校验)
    fn transition(
        &self,
        exception_id: &str,
        target: ExceptionStatus,
        notes: Option<&str>,
    ) -> ApiResult<()> {
        let record = self
            .exception_repo
            .find_by_id(exception_id)?
            .ok_or_else(|| ApiError::NotFound(format!("异常不存在: {}", exception_id)))?;

        if !record.status.can_transition_to(target) {
            return Err(ApiError::InvalidStateTransition {
                from: record.status.to_db_str().to_string(),
                to: target.to_db_str().to_string(),
            });
        }

        self.exception_repo
            .transition_status(exception_id, record.status, target, notes)
            .map_err(ApiError::from)
    }

    // ==========================================
    // 面板汇总
    // ==========================================

    /// 活跃异常汇总 (按严重度计数 + 财务影响合计)
    pub fn summary(&self) -> ApiResult<ExceptionSummary> {
        self.exception_repo
            .summarize_active()
            .map_err(ApiError::from)
    }
}
