// ==========================================
// 供应链需求计划系统 - 情景 API
// ==========================================
// 职责: 情景定义 CRUD + 执行入口 (委托 ScenarioRunner)
// 生命周期: Draft → Running → Completed | Failed
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::scenario::{
    ScenarioDefinition, ScenarioParameters, ScenarioResult, ScenarioScope,
};
use crate::domain::types::{ScenarioStatus, ScenarioType};
use crate::repository::scenario_repo::ScenarioRepository;
use crate::service::scenario_runner::ScenarioRunner;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// 请求 DTO
// ==========================================

/// 创建情景请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScenarioRequest {
    pub scenario_name: String,
    pub scenario_type: String, // FORECAST_ADJUSTMENT / SEASONAL_IMPACT / ...
    pub parameters: ScenarioParameters,
    pub scope: ScenarioScope,
    pub description: Option<String>,
}

// ==========================================
// ScenarioApi - 情景 API
// ==========================================
pub struct ScenarioApi {
    scenario_repo: Arc<ScenarioRepository>,
    runner: Arc<ScenarioRunner>,
}

impl ScenarioApi {
    /// 创建新的 ScenarioApi 实例
    pub fn new(scenario_repo: Arc<ScenarioRepository>, runner: Arc<ScenarioRunner>) -> Self {
        Self {
            scenario_repo,
            runner,
        }
    }

    // ==========================================
    // 定义管理
    // ==========================================

    /// 创建情景 (Draft 态)
    pub fn create_scenario(
        &self,
        request: CreateScenarioRequest,
    ) -> ApiResult<ScenarioDefinition> {
        if request.scenario_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("情景名称不能为空".to_string()));
        }

        let scenario_type = ScenarioType::from_str(&request.scenario_type).ok_or_else(|| {
            ApiError::InvalidInput(format!("未知情景类型: {}", request.scenario_type))
        })?;

        if request.scope.time_horizon_days <= 0 {
            return Err(ApiError::InvalidInput(
                "时间范围必须为正天数".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        let definition = ScenarioDefinition {
            scenario_id: Uuid::new_v4().to_string(),
            scenario_name: request.scenario_name.trim().to_string(),
            scenario_type,
            parameters: request.parameters,
            scope: request.scope,
            description: request.description,
            status: ScenarioStatus::Draft,
            error_message: None,
            created_at: now,
            updated_at: now,
        };

        self.scenario_repo.insert_definition(&definition)?;
        Ok(definition)
    }

    /// 编辑草稿态情景
    pub fn update_draft(&self, definition: &ScenarioDefinition) -> ApiResult<()> {
        self.scenario_repo
            .update_draft(definition)
            .map_err(ApiError::from)
    }

    /// 按ID查询情景
    pub fn get_scenario(&self, scenario_id: &str) -> ApiResult<ScenarioDefinition> {
        self.scenario_repo
            .find_by_id(scenario_id)?
            .ok_or_else(|| ApiError::NotFound(format!("情景不存在: {}", scenario_id)))
    }

    /// 按状态过滤情景列表 (None → 全部)
    pub fn list_scenarios(
        &self,
        status: Option<ScenarioStatus>,
    ) -> ApiResult<Vec<ScenarioDefinition>> {
        let definitions = match status {
            Some(s) => self.scenario_repo.list_by_status(s)?,
            None => self.scenario_repo.list_all()?,
        };
        Ok(definitions)
    }

    /// 删除情景及其结果
    pub fn delete_scenario(&self, scenario_id: &str) -> ApiResult<()> {
        let count = self.scenario_repo.delete(scenario_id)?;
        if count == 0 {
            return Err(ApiError::NotFound(format!("情景不存在: {}", scenario_id)));
        }
        Ok(())
    }

    // ==========================================
    // 执行与结果
    // ==========================================

    /// 执行情景 (委托 ScenarioRunner)
    ///
    /// # 说明
    /// - 已在 Running 的情景会被拒绝 (InvalidStateTransition)
    /// - 重新执行覆盖旧结果
    pub async fn execute_scenario(
        &self,
        scenario_id: &str,
        as_of: NaiveDate,
    ) -> ApiResult<ScenarioResult> {
        self.runner
            .execute(scenario_id, as_of)
            .await
            .map_err(ApiError::from)
    }

    /// 查询情景结果
    ///
    /// # 返回
    /// - Err(NotFound): 尚无结果 (未执行或执行失败)
    pub fn get_result(&self, scenario_id: &str) -> ApiResult<ScenarioResult> {
        self.scenario_repo
            .find_result(scenario_id)?
            .ok_or_else(|| ApiError::NotFound(format!("情景结果不存在: {}", scenario_id)))
    }
}
