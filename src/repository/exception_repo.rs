// ==========================================
// 供应链需求计划系统 - 异常记录数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// 表: exception_record (告警行由上游进程写入)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::exception::{ExceptionRecord, ExceptionSummary};
use crate::domain::types::{ExceptionSeverity, ExceptionStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ExceptionRepository - 异常记录仓储
// ==========================================
pub struct ExceptionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ExceptionRepository {
    /// 创建新的 ExceptionRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 建表（幂等）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS exception_record (
              exception_id TEXT PRIMARY KEY,
              exception_type TEXT NOT NULL,
              severity TEXT NOT NULL,
              product_id TEXT NOT NULL,
              location TEXT NOT NULL,
              current_value REAL NOT NULL DEFAULT 0,
              threshold_value REAL NOT NULL DEFAULT 0,
              variance_percentage REAL NOT NULL DEFAULT 0,
              days_of_supply REAL NOT NULL DEFAULT 0,
              estimated_financial_impact REAL NOT NULL DEFAULT 0,
              status TEXT NOT NULL DEFAULT 'ACTIVE',
              resolved_at TEXT,
              resolution_notes TEXT,
              created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_exception_record_status
              ON exception_record(status);

            CREATE INDEX IF NOT EXISTS idx_exception_record_product
              ON exception_record(product_id);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 批量写入告警行（INSERT OR REPLACE,上游同步路径）
    pub fn batch_insert(&self, records: Vec<ExceptionRecord>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for record in records {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO exception_record (
                    exception_id, exception_type, severity, product_id, location,
                    current_value, threshold_value, variance_percentage,
                    days_of_supply, estimated_financial_impact, status,
                    resolved_at, resolution_notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
                params![
                    record.exception_id,
                    record.exception_type,
                    record.severity.to_db_str(),
                    record.product_id,
                    record.location,
                    record.current_value,
                    record.threshold_value,
                    record.variance_percentage,
                    record.days_of_supply,
                    record.estimated_financial_impact,
                    record.status.to_db_str(),
                    record
                        .resolved_at
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
                    record.resolution_notes,
                    record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 回写分类增补字段（偏差/供应天数/财务影响）
    pub fn update_classification(&self, record: &ExceptionRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE exception_record
            SET variance_percentage = ?2, days_of_supply = ?3,
                estimated_financial_impact = ?4
            WHERE exception_id = ?1
            "#,
            params![
                record.exception_id,
                record.variance_percentage,
                record.days_of_supply,
                record.estimated_financial_impact,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ExceptionRecord".to_string(),
                id: record.exception_id.clone(),
            });
        }
        Ok(())
    }

    /// 状态流转（RESOLVED 同时写入解决时间戳与备注）
    ///
    /// # 说明
    /// - 转换合法性由调用方用 ExceptionStatus::can_transition_to 校验后传入;
    ///   这里再做一次条件更新兜底,避免并发下越过终态
    pub fn transition_status(
        &self,
        exception_id: &str,
        from: ExceptionStatus,
        to: ExceptionStatus,
        resolution_notes: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = if to == ExceptionStatus::Resolved {
            conn.execute(
                r#"
                UPDATE exception_record
                SET status = ?3, resolved_at = datetime('now'), resolution_notes = ?4
                WHERE exception_id = ?1 AND status = ?2
                "#,
                params![
                    exception_id,
                    from.to_db_str(),
                    to.to_db_str(),
                    resolution_notes,
                ],
            )?
        } else {
            conn.execute(
                r#"
                UPDATE exception_record
                SET status = ?3
                WHERE exception_id = ?1 AND status = ?2
                "#,
                params![exception_id, from.to_db_str(), to.to_db_str()],
            )?
        };

        if affected == 0 {
            return Err(RepositoryError::InvalidStateTransition {
                from: from.to_db_str().to_string(),
                to: to.to_db_str().to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 读取
    // ==========================================

    /// 按ID查询
    pub fn find_by_id(&self, exception_id: &str) -> RepositoryResult<Option<ExceptionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT exception_id, exception_type, severity, product_id, location,
                   current_value, threshold_value, variance_percentage,
                   days_of_supply, estimated_financial_impact, status,
                   resolved_at, resolution_notes, created_at
            FROM exception_record
            WHERE exception_id = ?1
            "#,
        )?;

        let result = stmt.query_row(params![exception_id], map_exception_row);

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按状态查询（严重度降序,同级按财务影响降序）
    pub fn list_by_status(
        &self,
        status: ExceptionStatus,
    ) -> RepositoryResult<Vec<ExceptionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT exception_id, exception_type, severity, product_id, location,
                   current_value, threshold_value, variance_percentage,
                   days_of_supply, estimated_financial_impact, status,
                   resolved_at, resolution_notes, created_at
            FROM exception_record
            WHERE status = ?1
            ORDER BY
                CASE severity
                    WHEN 'CRITICAL' THEN 0
                    WHEN 'HIGH' THEN 1
                    WHEN 'MEDIUM' THEN 2
                    WHEN 'LOW' THEN 3
                    ELSE 4
                END ASC,
                estimated_financial_impact DESC,
                exception_id ASC
            "#,
        )?;

        let records = stmt
            .query_map(params![status.to_db_str()], map_exception_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(records)
    }

    /// 活跃异常汇总（看板轮询数据源）
    pub fn summarize_active(&self) -> RepositoryResult<ExceptionSummary> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT severity, COUNT(*), SUM(estimated_financial_impact)
            FROM exception_record
            WHERE status != 'RESOLVED'
            GROUP BY severity
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut summary = ExceptionSummary::default();
        for (severity_raw, count, impact) in rows {
            summary.total_count += count;
            summary.total_financial_impact += impact.unwrap_or(0.0);
            match ExceptionSeverity::from_str(&severity_raw) {
                ExceptionSeverity::Critical => summary.critical_count += count,
                ExceptionSeverity::High => summary.high_count += count,
                ExceptionSeverity::Medium => summary.medium_count += count,
                ExceptionSeverity::Low => summary.low_count += count,
            }
        }

        Ok(summary)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 行映射: exception_record → ExceptionRecord
fn map_exception_row(row: &Row<'_>) -> SqliteResult<ExceptionRecord> {
    let severity_raw: String = row.get(2)?;
    let status_raw: String = row.get(10)?;
    let resolved_at_raw: Option<String> = row.get(11)?;

    Ok(ExceptionRecord {
        exception_id: row.get(0)?,
        exception_type: row.get(1)?,
        severity: ExceptionSeverity::from_str(&severity_raw),
        product_id: row.get(3)?,
        location: row.get(4)?,
        current_value: row.get(5)?,
        threshold_value: row.get(6)?,
        variance_percentage: row.get(7)?,
        days_of_supply: row.get(8)?,
        estimated_financial_impact: row.get(9)?,
        status: ExceptionStatus::from_str(&status_raw),
        resolved_at: resolved_at_raw.and_then(|s| {
            chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok()
        }),
        resolution_notes: row.get(12)?,
        created_at: chrono::NaiveDateTime::parse_from_str(
            &row.get::<_, String>(13)?,
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap_or_else(|_| chrono::NaiveDateTime::default()),
    })
}
