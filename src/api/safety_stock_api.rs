// ==========================================
// 供应链需求计划系统 - 安全库存 API
// ==========================================
// 职责: 取数 → 安全库存引擎 → 建议封装;显式保存入口
// 说明: 建议为派生数据,每次请求重算;仅在调用方显式保存时落库
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::planning_config::PlanningConfigManager;
use crate::domain::safety_stock::SafetyStockRecommendation;
use crate::engine::safety_stock::SafetyStockCalculator;
use crate::repository::forecast_repo::ForecastRepository;
use crate::repository::inventory_repo::InventoryRepository;
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// SafetyStockApi - 安全库存 API
// ==========================================
pub struct SafetyStockApi {
    forecast_repo: Arc<ForecastRepository>,
    inventory_repo: Arc<InventoryRepository>,
    config: Arc<PlanningConfigManager>,
    calculator: SafetyStockCalculator,
}

impl SafetyStockApi {
    /// 创建新的 SafetyStockApi 实例
    pub fn new(
        forecast_repo: Arc<ForecastRepository>,
        inventory_repo: Arc<InventoryRepository>,
        config: Arc<PlanningConfigManager>,
    ) -> Self {
        Self {
            forecast_repo,
            inventory_repo,
            config,
            calculator: SafetyStockCalculator::new(),
        }
    }

    // ==========================================
    // 建议计算
    // ==========================================

    /// 计算安全库存建议
    ///
    /// # 参数
    /// - location_id: 需求观测的地点维度
    /// - warehouse_id: 库存快照所在仓库
    /// - as_of: 计算基准日
    ///
    /// # 返回
    /// - Err(NotFound): 库存快照不存在
    pub fn recommend(
        &self,
        product_id: &str,
        location_id: &str,
        warehouse_id: &str,
        as_of: NaiveDate,
    ) -> ApiResult<SafetyStockRecommendation> {
        if product_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品ID不能为空".to_string()));
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

        let params = self.config.safety_stock_params()?;
        let history = self.forecast_repo.find_series(
            product_id,
            location_id,
            as_of - Duration::days(params.history_window_days),
            as_of,
        )?;

        let calculation = self
            .calculator
            .calculate(&history, &snapshot, as_of, &params);

        // 引擎输出补齐 ID 与时间戳后封装为建议
        Ok(SafetyStockRecommendation {
            recommendation_id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            location_id: location_id.to_string(),
            warehouse_id: warehouse_id.to_string(),
            current_safety_stock: snapshot.safety_stock,
            recommended_safety_stock: calculation.recommended_safety_stock,
            calculation_method: calculation.calculation_method,
            demand_variability: calculation.demand_variability,
            seasonal_factors: calculation.seasonal_factors,
            confidence_interval: calculation.confidence_interval,
            cost_impact: calculation.cost_impact,
            created_at: Utc::now().naive_utc(),
        })
    }

    // ==========================================
    // 显式保存
    // ==========================================

    /// 采纳建议: 将建议值写回库存快照
    pub fn save(&self, recommendation: &SafetyStockRecommendation) -> ApiResult<()> {
        if recommendation.recommended_safety_stock < 0.0 {
            return Err(ApiError::InvalidInput(
                "安全库存建议值不能为负".to_string(),
            ));
        }

        self.inventory_repo
            .update_safety_stock(
                &recommendation.product_id,
                &recommendation.warehouse_id,
                recommendation.recommended_safety_stock,
            )
            .map_err(ApiError::from)
    }
}
