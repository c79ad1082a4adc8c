// ==========================================
// 供应链需求计划系统 - 库存投影 API
// ==========================================
// 职责: 取数 → 投影引擎 → 返回派生序列
// 架构: API 层 → Repository 层 + Engine 层
// 说明: 批量口径下缺失快照的产品/仓库对跳过并上报,不视为致命
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::planning_config::PlanningConfigManager;
use crate::domain::inventory::InventoryProjection;
use crate::engine::projection::InventoryProjector;
use crate::repository::forecast_repo::ForecastRepository;
use crate::repository::inventory_repo::InventoryRepository;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// 最近匹配取数时向过去回看的天数
const LOOKBACK_DAYS: i64 = 30;

// ==========================================
// 响应 DTO
// ==========================================

/// 批量投影中被跳过的产品/仓库对
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedPair {
    pub product_id: String,
    pub warehouse_id: String,
    pub reason: String,
}

/// 批量投影响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionBatchResponse {
    pub projections: Vec<InventoryProjection>,
    pub skipped: Vec<SkippedPair>,
}

// ==========================================
// ProjectionApi - 库存投影 API
// ==========================================
pub struct ProjectionApi {
    inventory_repo: Arc<InventoryRepository>,
    forecast_repo: Arc<ForecastRepository>,
    config: Arc<PlanningConfigManager>,
    projector: InventoryProjector,
}

impl ProjectionApi {
    /// 创建新的 ProjectionApi 实例
    pub fn new(
        inventory_repo: Arc<InventoryRepository>,
        forecast_repo: Arc<ForecastRepository>,
        config: Arc<PlanningConfigManager>,
    ) -> Self {
        Self {
            inventory_repo,
            forecast_repo,
            config,
            projector: InventoryProjector::new(),
        }
    }

    // ==========================================
    // 单对投影
    // ==========================================

    /// 单产品/仓库的库存投影
    ///
    /// # 参数
    /// - start_date: 投影起始日 (第0天)
    ///
    /// # 返回
    /// - Err(NotFound): 库存快照不存在
    pub fn project_inventory(
        &self,
        product_id: &str,
        warehouse_id: &str,
        start_date: NaiveDate,
    ) -> ApiResult<InventoryProjection> {
        if product_id.trim().is_empty() || warehouse_id.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "产品ID和仓库ID不能为空".to_string(),
            ));
        }

        let snapshot = self
            .inventory_repo
            .find_by_key(product_id, warehouse_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "库存快照不存在: {}/{}",
                    product_id, warehouse_id
                ))
            })?;

        let params = self.config.projection_params(start_date)?;

        // 取数窗口: 向前回看覆盖最近匹配,向后覆盖投影期
        let forecast = self.forecast_repo.find_series(
            product_id,
            warehouse_id,
            start_date - Duration::days(LOOKBACK_DAYS),
            start_date + Duration::days(params.horizon_days as i64),
        )?;

        Ok(self.projector.project(&snapshot, &forecast, &params))
    }

    // ==========================================
    // 批量投影 (看板路径)
    // ==========================================

    /// 批量投影: 缺失快照的对跳过并上报
    pub fn project_batch(
        &self,
        pairs: &[(String, String)],
        start_date: NaiveDate,
    ) -> ApiResult<ProjectionBatchResponse> {
        let mut projections = Vec::new();
        let mut skipped = Vec::new();

        for (product_id, warehouse_id) in pairs {
            match self.project_inventory(product_id, warehouse_id, start_date) {
                Ok(projection) => projections.push(projection),
                Err(ApiError::NotFound(reason)) => {
                    // 缺失快照不阻断整批
                    warn!(
                        product_id = %product_id,
                        warehouse_id = %warehouse_id,
                        "跳过缺失快照的投影对"
                    );
                    skipped.push(SkippedPair {
                        product_id: product_id.clone(),
                        warehouse_id: warehouse_id.clone(),
                        reason,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(ProjectionBatchResponse {
            projections,
            skipped,
        })
    }
}
