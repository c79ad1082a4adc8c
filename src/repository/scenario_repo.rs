// ==========================================
// 供应链需求计划系统 - 情景数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// 表: scenario_definition / scenario_result
// 说明: 状态转换通过"条件更新"原子完成,调用方据此实现
//       单情景至多一个活跃执行的约束
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::scenario::{
    DetailedChange, ScenarioDefinition, ScenarioImpactSummary, ScenarioParameters,
    ScenarioResult, ScenarioScope,
};
use crate::domain::types::{ScenarioStatus, ScenarioType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ScenarioRepository - 情景仓储
// ==========================================
pub struct ScenarioRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScenarioRepository {
    /// 创建新的 ScenarioRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_tables()?;
        Ok(repo)
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_tables()?;
        Ok(repo)
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 建表（幂等）
    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS scenario_definition (
              scenario_id TEXT PRIMARY KEY,
              scenario_name TEXT NOT NULL,
              scenario_type TEXT NOT NULL,
              parameters_json TEXT NOT NULL,
              scope_json TEXT NOT NULL,
              description TEXT,
              status TEXT NOT NULL DEFAULT 'DRAFT',
              error_message TEXT,
              created_at TEXT NOT NULL DEFAULT (datetime('now')),
              updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_scenario_definition_status
              ON scenario_definition(status);

            CREATE TABLE IF NOT EXISTS scenario_result (
              result_id TEXT PRIMARY KEY,
              scenario_id TEXT NOT NULL UNIQUE,
              baseline_value REAL NOT NULL,
              adjusted_value REAL NOT NULL,
              impact REAL NOT NULL,
              impact_percentage REAL NOT NULL,
              impact_summary_json TEXT NOT NULL,
              detailed_changes_json TEXT NOT NULL,
              created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 情景定义 CRUD
    // ==========================================

    /// 写入情景定义
    pub fn insert_definition(&self, definition: &ScenarioDefinition) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO scenario_definition (
                scenario_id, scenario_name, scenario_type, parameters_json,
                scope_json, description, status, error_message, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                definition.scenario_id,
                definition.scenario_name,
                definition.scenario_type.to_db_str(),
                serde_json::to_string(&definition.parameters)?,
                serde_json::to_string(&definition.scope)?,
                definition.description,
                definition.status.to_db_str(),
                definition.error_message,
                definition
                    .created_at
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                definition
                    .updated_at
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ],
        )?;
        Ok(())
    }

    /// 更新草稿态情景的名称/参数/范围/描述
    ///
    /// # 说明
    /// - 只允许在 DRAFT 态编辑;其它状态返回 InvalidStateTransition
    pub fn update_draft(&self, definition: &ScenarioDefinition) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE scenario_definition
            SET scenario_name = ?2, scenario_type = ?3, parameters_json = ?4,
                scope_json = ?5, description = ?6, updated_at = datetime('now')
            WHERE scenario_id = ?1 AND status = 'DRAFT'
            "#,
            params![
                definition.scenario_id,
                definition.scenario_name,
                definition.scenario_type.to_db_str(),
                serde_json::to_string(&definition.parameters)?,
                serde_json::to_string(&definition.scope)?,
                definition.description,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::InvalidStateTransition {
                from: "非DRAFT".to_string(),
                to: "DRAFT编辑".to_string(),
            });
        }
        Ok(())
    }

    /// 按ID查询情景定义
    pub fn find_by_id(&self, scenario_id: &str) -> RepositoryResult<Option<ScenarioDefinition>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT scenario_id, scenario_name, scenario_type, parameters_json,
                   scope_json, description, status, error_message, created_at, updated_at
            FROM scenario_definition
            WHERE scenario_id = ?1
            "#,
        )?;

        let result = stmt.query_row(params![scenario_id], map_definition_row);

        match result {
            Ok(definition) => Ok(Some(definition)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按状态查询情景列表
    pub fn list_by_status(
        &self,
        status: ScenarioStatus,
    ) -> RepositoryResult<Vec<ScenarioDefinition>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT scenario_id, scenario_name, scenario_type, parameters_json,
                   scope_json, description, status, error_message, created_at, updated_at
            FROM scenario_definition
            WHERE status = ?1
            ORDER BY created_at DESC
            "#,
        )?;

        let definitions = stmt
            .query_map(params![status.to_db_str()], map_definition_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(definitions)
    }

    /// 查询全部情景
    pub fn list_all(&self) -> RepositoryResult<Vec<ScenarioDefinition>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT scenario_id, scenario_name, scenario_type, parameters_json,
                   scope_json, description, status, error_message, created_at, updated_at
            FROM scenario_definition
            ORDER BY created_at DESC
            "#,
        )?;

        let definitions = stmt
            .query_map([], map_definition_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(definitions)
    }

    /// 删除情景定义及其结果
    pub fn delete(&self, scenario_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM scenario_result WHERE scenario_id = ?1",
            params![scenario_id],
        )?;
        let count = tx.execute(
            "DELETE FROM scenario_definition WHERE scenario_id = ?1",
            params![scenario_id],
        )?;
        tx.commit()?;
        Ok(count)
    }

    // ==========================================
    // 状态流转 (条件更新,原子)
    // ==========================================

    /// 条件状态转换: 仅当当前状态在 expected 集合内时更新
    ///
    /// # 参数
    /// - expected: 允许的当前状态集合
    /// - target: 目标状态
    /// - error_message: 目标为 FAILED 时记录的错误;其它目标清空
    ///
    /// # 返回
    /// - Err(InvalidStateTransition): 当前状态不在允许集合内
    ///   (该条件更新同时承担"单情景至多一个活跃执行"的并发守卫)
    pub fn transition_status(
        &self,
        scenario_id: &str,
        expected: &[ScenarioStatus],
        target: ScenarioStatus,
        error_message: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let placeholders: Vec<String> =
            (0..expected.len()).map(|i| format!("?{}", i + 3)).collect();
        let sql = format!(
            "UPDATE scenario_definition \
             SET status = ?1, error_message = ?2, updated_at = datetime('now') \
             WHERE scenario_id = ?{} AND status IN ({})",
            expected.len() + 3,
            placeholders.join(", ")
        );

        let mut bound: Vec<Box<dyn rusqlite::types::ToSql>> = vec![
            Box::new(target.to_db_str().to_string()),
            Box::new(error_message.map(|s| s.to_string())),
        ];
        for status in expected {
            bound.push(Box::new(status.to_db_str().to_string()));
        }
        bound.push(Box::new(scenario_id.to_string()));
        let bound_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let affected = conn.execute(&sql, bound_refs.as_slice())?;

        if affected == 0 {
            // 区分"不存在"与"状态不允许"
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM scenario_definition WHERE scenario_id = ?1",
                    params![scenario_id],
                    |_| Ok(true),
                )
                .unwrap_or(false);

            if !exists {
                return Err(RepositoryError::NotFound {
                    entity: "ScenarioDefinition".to_string(),
                    id: scenario_id.to_string(),
                });
            }
            return Err(RepositoryError::InvalidStateTransition {
                from: "当前状态".to_string(),
                to: target.to_db_str().to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 情景结果
    // ==========================================

    /// 写入情景结果（重新执行覆盖旧结果）
    ///
    /// # 说明
    /// - scenario_id 唯一约束保证一个情景至多一份结果
    pub fn upsert_result(&self, result: &ScenarioResult) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        // 先清旧结果再写入,保证 result_id 随执行更新
        tx.execute(
            "DELETE FROM scenario_result WHERE scenario_id = ?1",
            params![result.scenario_id],
        )?;
        tx.execute(
            r#"
            INSERT INTO scenario_result (
                result_id, scenario_id, baseline_value, adjusted_value,
                impact, impact_percentage, impact_summary_json,
                detailed_changes_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                result.result_id,
                result.scenario_id,
                result.baseline_value,
                result.adjusted_value,
                result.impact,
                result.impact_percentage,
                serde_json::to_string(&result.impact_summary)?,
                serde_json::to_string(&result.detailed_changes)?,
                result.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// 查询情景结果
    pub fn find_result(&self, scenario_id: &str) -> RepositoryResult<Option<ScenarioResult>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT result_id, scenario_id, baseline_value, adjusted_value,
                   impact, impact_percentage, impact_summary_json,
                   detailed_changes_json, created_at
            FROM scenario_result
            WHERE scenario_id = ?1
            "#,
        )?;

        let result = stmt.query_row(params![scenario_id], map_result_row);

        match result {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 删除情景结果（执行失败时确保无部分结果残留）
    pub fn delete_result(&self, scenario_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count = conn.execute(
            "DELETE FROM scenario_result WHERE scenario_id = ?1",
            params![scenario_id],
        )?;
        Ok(count)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 行映射: scenario_definition → ScenarioDefinition
fn map_definition_row(row: &Row<'_>) -> SqliteResult<ScenarioDefinition> {
    let scenario_type_raw: String = row.get(2)?;
    let parameters_json: String = row.get(3)?;
    let scope_json: String = row.get(4)?;
    let status_raw: String = row.get(6)?;

    let parameters: ScenarioParameters =
        serde_json::from_str(&parameters_json).unwrap_or_default();
    let scope: ScenarioScope = serde_json::from_str(&scope_json).unwrap_or_default();

    Ok(ScenarioDefinition {
        scenario_id: row.get(0)?,
        scenario_name: row.get(1)?,
        scenario_type: ScenarioType::from_str(&scenario_type_raw)
            .unwrap_or(ScenarioType::ForecastAdjustment),
        parameters,
        scope,
        description: row.get(5)?,
        status: ScenarioStatus::from_str(&status_raw),
        error_message: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

/// 行映射: scenario_result → ScenarioResult
fn map_result_row(row: &Row<'_>) -> SqliteResult<ScenarioResult> {
    let summary_json: String = row.get(6)?;
    let changes_json: String = row.get(7)?;

    let impact_summary: ScenarioImpactSummary =
        serde_json::from_str(&summary_json).unwrap_or_default();
    let detailed_changes: Vec<DetailedChange> =
        serde_json::from_str(&changes_json).unwrap_or_default();

    Ok(ScenarioResult {
        result_id: row.get(0)?,
        scenario_id: row.get(1)?,
        baseline_value: row.get(2)?,
        adjusted_value: row.get(3)?,
        impact: row.get(4)?,
        impact_percentage: row.get(5)?,
        impact_summary,
        detailed_changes,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

/// 解析时间戳字符串（容错默认值）
fn parse_datetime(s: &str) -> chrono::NaiveDateTime {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| chrono::NaiveDateTime::default())
}
