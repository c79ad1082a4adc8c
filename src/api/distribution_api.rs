// ==========================================
// 供应链需求计划系统 - 多节点分布 API
// ==========================================
// 职责: 取数 → 分布引擎 → 节点计划与调拨建议
// 说明: 节点需求区按仓库ID对齐地点维度取观测
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::planning_config::PlanningConfigManager;
use crate::domain::distribution::DistributionPlan;
use crate::engine::distribution::{DistributionParams, MultiNodeDistributionPlanner};
use crate::engine::stats::TimeSeriesStatistics;
use crate::repository::forecast_repo::ForecastRepository;
use crate::repository::inventory_repo::InventoryRepository;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;

/// 节点日均需求的统计窗口 (天)
const DEMAND_WINDOW_DAYS: i64 = 30;

// ==========================================
// DistributionApi - 多节点分布 API
// ==========================================
pub struct DistributionApi {
    inventory_repo: Arc<InventoryRepository>,
    forecast_repo: Arc<ForecastRepository>,
    config: Arc<PlanningConfigManager>,
    planner: MultiNodeDistributionPlanner,
    stats: TimeSeriesStatistics,
}

impl DistributionApi {
    /// 创建新的 DistributionApi 实例
    pub fn new(
        inventory_repo: Arc<InventoryRepository>,
        forecast_repo: Arc<ForecastRepository>,
        config: Arc<PlanningConfigManager>,
    ) -> Self {
        Self {
            inventory_repo,
            forecast_repo,
            config,
            planner: MultiNodeDistributionPlanner::new(),
            stats: TimeSeriesStatistics::new(),
        }
    }

    // ==========================================
    // 分布计划
    // ==========================================

    /// 单产品分布计划 (库容走启发式)
    pub fn plan_for_product(
        &self,
        product_id: &str,
        as_of: NaiveDate,
    ) -> ApiResult<DistributionPlan> {
        self.plan_for_product_with_capacity(product_id, as_of, &HashMap::new())
    }

    /// 单产品分布计划,支持按仓库显式库容
    ///
    /// # 返回
    /// - Err(NotFound): 该产品无任何库存节点
    pub fn plan_for_product_with_capacity(
        &self,
        product_id: &str,
        as_of: NaiveDate,
        node_capacity: &HashMap<String, f64>,
    ) -> ApiResult<DistributionPlan> {
        if product_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品ID不能为空".to_string()));
        }

        let nodes = self.inventory_repo.find_by_product(product_id)?;
        if nodes.is_empty() {
            return Err(ApiError::NotFound(format!(
                "产品{}无库存节点",
                product_id
            )));
        }

        // 逐节点计算需求区日均需求 (非空预测的均值)
        let mut node_demand = HashMap::new();
        for node in &nodes {
            let series = self.forecast_repo.find_series(
                product_id,
                &node.warehouse_id,
                as_of - Duration::days(DEMAND_WINDOW_DAYS),
                as_of,
            )?;
            let values: Vec<f64> = series.iter().filter_map(|obs| obs.forecast).collect();
            node_demand.insert(node.warehouse_id.clone(), self.stats.mean(&values));
        }

        let mut params = DistributionParams::default();
        params.capacity_multiplier = self.config.capacity_multiplier()?;

        Ok(self
            .planner
            .plan(product_id, &nodes, &node_demand, node_capacity, &params))
    }
}
