// ==========================================
// 供应链需求计划系统 - 情景执行服务
// ==========================================
// 职责: 情景生命周期驱动 (submit → running → completed | failed)
// 红线: 单情景至多一个活跃执行;失败不落部分结果
// 说明: 活跃执行守卫通过仓储层条件更新原子实现
//       (状态不在允许集合 → InvalidStateTransition)
// ==========================================

use crate::domain::scenario::{
    DetailedChange, ScenarioDefinition, ScenarioImpactSummary, ScenarioResult,
};
use crate::domain::types::{ScenarioStatus, ScenarioType};
use crate::engine::scenario_impact::ScenarioImpactCalculator;
use crate::engine::service_level::ServiceLevelModel;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::forecast_repo::ForecastRepository;
use crate::repository::inventory_repo::InventoryRepository;
use crate::repository::scenario_repo::ScenarioRepository;
use chrono::{Duration, NaiveDate, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

// 服务水平参数缺省 (参数包未给定时)
const DEFAULT_TARGET_SERVICE_LEVEL: f64 = 0.95;
const DEFAULT_CURRENT_SERVICE_LEVEL: f64 = 0.90;

// ==========================================
// ScenarioRunner - 情景执行服务
// ==========================================
pub struct ScenarioRunner {
    scenario_repo: Arc<ScenarioRepository>,
    forecast_repo: Arc<ForecastRepository>,
    inventory_repo: Arc<InventoryRepository>,
    impact_engine: ScenarioImpactCalculator,
    service_model: ServiceLevelModel,
}

impl ScenarioRunner {
    /// 创建新的情景执行服务
    pub fn new(
        scenario_repo: Arc<ScenarioRepository>,
        forecast_repo: Arc<ForecastRepository>,
        inventory_repo: Arc<InventoryRepository>,
    ) -> Self {
        Self {
            scenario_repo,
            forecast_repo,
            inventory_repo,
            impact_engine: ScenarioImpactCalculator::new(),
            service_model: ServiceLevelModel::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 执行情景
    ///
    /// # 生命周期
    /// 1. Draft/Completed/Failed → Running (条件更新;已在 Running → 拒绝)
    /// 2. 计算影响并写入结果 → Completed (重新执行覆盖旧结果)
    /// 3. 计算失败 → Failed,错误入库,本次不落任何结果
    ///
    /// # 参数
    /// - as_of: 基线取数基准日 (窗口 [as_of, as_of + time_horizon])
    #[instrument(skip(self), fields(scenario_id = scenario_id))]
    pub async fn execute(
        &self,
        scenario_id: &str,
        as_of: NaiveDate,
    ) -> RepositoryResult<ScenarioResult> {
        // 1. 取定义并进入 Running (原子守卫)
        let definition = self
            .scenario_repo
            .find_by_id(scenario_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ScenarioDefinition".to_string(),
                id: scenario_id.to_string(),
            })?;

        self.scenario_repo.transition_status(
            scenario_id,
            &[
                ScenarioStatus::Draft,
                ScenarioStatus::Completed,
                ScenarioStatus::Failed,
            ],
            ScenarioStatus::Running,
            None,
        )?;
        info!(scenario_type = %definition.scenario_type, "情景进入执行");

        // 2. 计算 (失败转 Failed 并记录错误)
        match self.compute(&definition, as_of) {
            Ok(result) => {
                self.scenario_repo.upsert_result(&result)?;
                self.scenario_repo.transition_status(
                    scenario_id,
                    &[ScenarioStatus::Running],
                    ScenarioStatus::Completed,
                    None,
                )?;
                info!(impact = result.impact, "情景执行完成");
                Ok(result)
            }
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "情景执行失败");
                // 失败态记录错误;本次不写结果
                self.scenario_repo.transition_status(
                    scenario_id,
                    &[ScenarioStatus::Running],
                    ScenarioStatus::Failed,
                    Some(&message),
                )?;
                Err(e)
            }
        }
    }

    /// 并发执行多个情景 (逐个收集结果,失败不影响其它情景)
    pub async fn execute_many(
        &self,
        scenario_ids: &[String],
        as_of: NaiveDate,
    ) -> Vec<RepositoryResult<ScenarioResult>> {
        let futures: Vec<_> = scenario_ids
            .iter()
            .map(|id| self.execute(id, as_of))
            .collect();
        join_all(futures).await
    }

    // ==========================================
    // 影响计算
    // ==========================================

    /// 单情景影响计算 (同步纯算术,失败向上传播)
    fn compute(
        &self,
        definition: &ScenarioDefinition,
        as_of: NaiveDate,
    ) -> RepositoryResult<ScenarioResult> {
        match definition.scenario_type {
            ScenarioType::Service => self.compute_service_level(definition),
            _ => self.compute_direct(definition, as_of),
        }
    }

    /// 直接变换类情景 (forecast_adjustment / seasonal / promotional / disruption)
    fn compute_direct(
        &self,
        definition: &ScenarioDefinition,
        as_of: NaiveDate,
    ) -> RepositoryResult<ScenarioResult> {
        let horizon = definition.scope.time_horizon_days.max(1);
        let date_to = as_of + Duration::days(horizon as i64);

        // 基线: 范围内命中行的算术平均
        let values = self
            .forecast_repo
            .find_forecast_values(&definition.scope.product_ids, as_of, date_to)?;
        let baseline = self.impact_engine.baseline_from_rows(&values);

        let outcome = self
            .impact_engine
            .calculate(definition.scenario_type, &definition.parameters, baseline)
            .ok_or_else(|| {
                RepositoryError::InternalError("service 情景不应走直接变换路径".to_string())
            })?;

        // 明细: 范围内逐产品的前后值
        let mut detailed_changes = Vec::new();
        for product_id in &definition.scope.product_ids {
            let product_values = self.forecast_repo.find_forecast_values(
                &[product_id.clone()],
                as_of,
                date_to,
            )?;
            let product_baseline = self.impact_engine.baseline_from_rows(&product_values);
            if let Some(product_outcome) = self.impact_engine.calculate(
                definition.scenario_type,
                &definition.parameters,
                product_baseline,
            ) {
                detailed_changes.push(DetailedChange {
                    product_id: product_id.clone(),
                    warehouse_id: None,
                    metric: "forecast".to_string(),
                    before: product_outcome.baseline,
                    after: product_outcome.adjusted,
                    delta: product_outcome.impact,
                });
            }
        }

        let impact_summary = ScenarioImpactSummary {
            order_count_change: outcome.impact,
            value_change: outcome.inventory_impact,
            lead_time_change: 0.0,
            service_level_impact: outcome.service_level_impact,
            stockout_risk_change: 0.0,
        };

        Ok(ScenarioResult {
            result_id: Uuid::new_v4().to_string(),
            scenario_id: definition.scenario_id.clone(),
            baseline_value: outcome.baseline,
            adjusted_value: outcome.adjusted,
            impact: outcome.impact,
            impact_percentage: outcome.impact_percentage,
            impact_summary,
            detailed_changes,
            created_at: Utc::now().naive_utc(),
        })
    }

    /// 服务水平目标情景 (委托服务水平模型)
    fn compute_service_level(
        &self,
        definition: &ScenarioDefinition,
    ) -> RepositoryResult<ScenarioResult> {
        let target = definition
            .parameters
            .target_service_level
            .unwrap_or(DEFAULT_TARGET_SERVICE_LEVEL);
        let current = definition
            .parameters
            .current_service_level
            .unwrap_or(DEFAULT_CURRENT_SERVICE_LEVEL);

        // 受影响产品的库存快照
        let snapshots = self
            .inventory_repo
            .find_by_products(&definition.scope.product_ids)?;

        let outcome = self.service_model.evaluate(
            target,
            current,
            definition.parameters.holding_cost_rate,
            &snapshots,
        );

        // 基线/调整后取安全库存总量口径
        let baseline: f64 = outcome
            .per_product
            .iter()
            .map(|p| p.current_safety_stock)
            .sum();
        let adjusted: f64 = outcome.per_product.iter().map(|p| p.new_safety_stock).sum();
        let impact = adjusted - baseline;
        let impact_percentage = if baseline == 0.0 {
            0.0
        } else {
            impact / baseline * 100.0
        };

        let detailed_changes: Vec<DetailedChange> = outcome
            .per_product
            .iter()
            .map(|p| DetailedChange {
                product_id: p.product_id.clone(),
                warehouse_id: Some(p.warehouse_id.clone()),
                metric: "safety_stock".to_string(),
                before: p.current_safety_stock,
                after: p.new_safety_stock,
                delta: p.new_safety_stock - p.current_safety_stock,
            })
            .collect();

        let impact_summary = ScenarioImpactSummary {
            order_count_change: 0.0,
            value_change: outcome.total_inventory_impact,
            lead_time_change: 0.0,
            service_level_impact: outcome.service_level_gap * 100.0,
            stockout_risk_change: outcome.mean_stockout_risk_reduction,
        };

        Ok(ScenarioResult {
            result_id: Uuid::new_v4().to_string(),
            scenario_id: definition.scenario_id.clone(),
            baseline_value: baseline,
            adjusted_value: adjusted,
            impact,
            impact_percentage,
            impact_summary,
            detailed_changes,
            created_at: Utc::now().naive_utc(),
        })
    }
}
