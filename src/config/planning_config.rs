// ==========================================
// 供应链需求计划系统 - 计划参数配置管理器
// ==========================================
// 职责: 业务常量的加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 各常量为启发式而非推导模型;默认值保证空表上的数值一致性,
//       同时允许按库覆写
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::projection::ProjectionParams;
use crate::engine::safety_stock::SafetyStockParams;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde_json::json;
use std::sync::{Arc, Mutex};

// ===== 配置键 =====
const KEY_Z_SCORE: &str = "planning/z_score";
const KEY_UNIT_COST_ESTIMATE: &str = "planning/unit_cost_estimate";
const KEY_HOLDING_COST_RATE: &str = "planning/holding_cost_rate";
const KEY_PROJECTION_HORIZON_DAYS: &str = "planning/projection_horizon_days";
const KEY_CAPACITY_MULTIPLIER: &str = "planning/capacity_multiplier";
const KEY_SAFETY_STOCK_FLOOR: &str = "planning/safety_stock_floor_multiplier";
const KEY_HISTORY_WINDOW_DAYS: &str = "planning/history_window_days";

// ==========================================
// PlanningConfigManager - 配置管理器
// ==========================================
pub struct PlanningConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl PlanningConfigManager {
    /// 创建新的 PlanningConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_table()?;
        Ok(manager)
    }

    /// 从已有连接创建配置管理器
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        let manager = Self { conn };
        manager.ensure_table()?;
        Ok(manager)
    }

    /// 建表（幂等）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
              scope_id TEXT NOT NULL DEFAULT 'global',
              key TEXT NOT NULL,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now')),
              PRIMARY KEY (scope_id, key)
            );
            "#,
        )?;
        Ok(())
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 基础读写 (scope_id='global')
    // ==========================================

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入配置值（upsert）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取浮点配置,缺失或解析失败取默认值
    fn get_f64_or(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        Ok(self
            .get_config_value(key)?
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(default))
    }

    /// 读取整数配置,缺失或解析失败取默认值
    fn get_i64_or(&self, key: &str, default: i64) -> RepositoryResult<i64> {
        Ok(self
            .get_config_value(key)?
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(default))
    }

    // ==========================================
    // 业务常量 (带文档化默认值)
    // ==========================================

    /// 服务水平 Z 值 (默认 1.65, 单侧 95%)
    pub fn z_score(&self) -> RepositoryResult<f64> {
        self.get_f64_or(KEY_Z_SCORE, 1.65)
    }

    /// 异常财务估算的统一单位成本 (默认 15.50)
    pub fn unit_cost_estimate(&self) -> RepositoryResult<f64> {
        self.get_f64_or(KEY_UNIT_COST_ESTIMATE, 15.50)
    }

    /// 持有成本率 (默认 0.25)
    pub fn holding_cost_rate(&self) -> RepositoryResult<f64> {
        self.get_f64_or(KEY_HOLDING_COST_RATE, 0.25)
    }

    /// 投影天数 (默认 90)
    pub fn projection_horizon_days(&self) -> RepositoryResult<i64> {
        self.get_i64_or(KEY_PROJECTION_HORIZON_DAYS, 90)
    }

    /// 库容启发式乘数 (默认 2.0)
    pub fn capacity_multiplier(&self) -> RepositoryResult<f64> {
        self.get_f64_or(KEY_CAPACITY_MULTIPLIER, 2.0)
    }

    /// 安全库存下限乘数 (默认 3.0)
    pub fn safety_stock_floor_multiplier(&self) -> RepositoryResult<f64> {
        self.get_f64_or(KEY_SAFETY_STOCK_FLOOR, 3.0)
    }

    /// 统计历史窗口 (默认 365 天)
    pub fn history_window_days(&self) -> RepositoryResult<i64> {
        self.get_i64_or(KEY_HISTORY_WINDOW_DAYS, 365)
    }

    // ==========================================
    // 引擎参数装配
    // ==========================================

    /// 装配安全库存引擎参数
    pub fn safety_stock_params(&self) -> RepositoryResult<SafetyStockParams> {
        Ok(SafetyStockParams {
            z_score: self.z_score()?,
            floor_multiplier: self.safety_stock_floor_multiplier()?,
            history_window_days: self.history_window_days()?,
        })
    }

    /// 装配投影引擎参数
    pub fn projection_params(&self, start_date: NaiveDate) -> RepositoryResult<ProjectionParams> {
        Ok(ProjectionParams {
            start_date,
            horizon_days: self.projection_horizon_days()? as usize,
            capacity_multiplier: self.capacity_multiplier()?,
            simulate_replenishment: true,
        })
    }

    // ==========================================
    // 配置快照
    // ==========================================

    /// 获取所有计划常量的快照（JSON格式）
    ///
    /// # 用途
    /// - 情景执行时记录配置口径,便于结果复核
    pub fn snapshot_json(&self) -> RepositoryResult<String> {
        let snapshot = json!({
            "z_score": self.z_score()?,
            "unit_cost_estimate": self.unit_cost_estimate()?,
            "holding_cost_rate": self.holding_cost_rate()?,
            "projection_horizon_days": self.projection_horizon_days()?,
            "capacity_multiplier": self.capacity_multiplier()?,
            "safety_stock_floor_multiplier": self.safety_stock_floor_multiplier()?,
            "history_window_days": self.history_window_days()?,
        });
        Ok(snapshot.to_string())
    }
}
