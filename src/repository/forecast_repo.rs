// ==========================================
// 供应链需求计划系统 - 需求观测数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// 表: demand_observation (上游计划流程写入,本核心读取)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::demand::DemandObservation;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ForecastRepository - 需求观测仓储
// ==========================================
pub struct ForecastRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ForecastRepository {
    /// 创建新的 ForecastRepository 实例
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
            CREATE TABLE IF NOT EXISTS demand_observation (
              obs_date TEXT NOT NULL,
              product_id TEXT NOT NULL,
              location_id TEXT NOT NULL,
              customer_id TEXT,
              forecast REAL,
              actual REAL,
              sales_plan REAL,
              demand_planner REAL,
              commercial_input REAL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_demand_obs_key
              ON demand_observation(obs_date, product_id, location_id, IFNULL(customer_id, ''));

            CREATE INDEX IF NOT EXISTS idx_demand_obs_product_date
              ON demand_observation(product_id, obs_date);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入 (导入路径)
    // ==========================================

    /// 批量插入需求观测（INSERT OR REPLACE）
    ///
    /// # 参数
    /// - observations: 观测行列表
    ///
    /// # 返回
    /// - Ok(usize): 成功写入的记录数
    ///
    /// # 说明
    /// - 唯一键: (obs_date, product_id, location_id, customer_id)
    /// - 使用事务确保原子性
    pub fn batch_insert(&self, observations: Vec<DemandObservation>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for obs in observations {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO demand_observation (
                    obs_date, product_id, location_id, customer_id,
                    forecast, actual, sales_plan, demand_planner, commercial_input
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    obs.obs_date.to_string(),
                    obs.product_id,
                    obs.location_id,
                    obs.customer_id,
                    obs.forecast,
                    obs.actual,
                    obs.sales_plan,
                    obs.demand_planner,
                    obs.commercial_input,
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    // ==========================================
    // 过滤读取 (投影/统计的数据源)
    // ==========================================

    /// 查询单产品/地点的观测序列（按日期升序）
    ///
    /// # 参数
    /// - product_id: 产品ID
    /// - location_id: 地点ID
    /// - date_from / date_to: 日期范围（均含端点）
    pub fn find_series(
        &self,
        product_id: &str,
        location_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> RepositoryResult<Vec<DemandObservation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT obs_date, product_id, location_id, customer_id,
                   forecast, actual, sales_plan, demand_planner, commercial_input
            FROM demand_observation
            WHERE product_id = ?1 AND location_id = ?2
              AND obs_date >= ?3 AND obs_date <= ?4
            ORDER BY obs_date ASC
            "#,
        )?;

        let observations = stmt
            .query_map(
                params![
                    product_id,
                    location_id,
                    date_from.to_string(),
                    date_to.to_string()
                ],
                map_observation_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(observations)
    }

    /// 查询单产品跨地点的观测序列（按日期升序）
    pub fn find_by_product(
        &self,
        product_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> RepositoryResult<Vec<DemandObservation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT obs_date, product_id, location_id, customer_id,
                   forecast, actual, sales_plan, demand_planner, commercial_input
            FROM demand_observation
            WHERE product_id = ?1 AND obs_date >= ?2 AND obs_date <= ?3
            ORDER BY obs_date ASC, location_id ASC
            "#,
        )?;

        let observations = stmt
            .query_map(
                params![product_id, date_from.to_string(), date_to.to_string()],
                map_observation_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(observations)
    }

    /// 查询产品最近一条有预测值的观测
    ///
    /// # 返回
    /// - Ok(Some): 最近观测
    /// - Ok(None): 无数据
    pub fn find_latest_forecast(
        &self,
        product_id: &str,
        location_id: &str,
    ) -> RepositoryResult<Option<DemandObservation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT obs_date, product_id, location_id, customer_id,
                   forecast, actual, sales_plan, demand_planner, commercial_input
            FROM demand_observation
            WHERE product_id = ?1 AND location_id = ?2 AND forecast IS NOT NULL
            ORDER BY obs_date DESC
            LIMIT 1
            "#,
        )?;

        let result = stmt.query_row(params![product_id, location_id], map_observation_row);

        match result {
            Ok(obs) => Ok(Some(obs)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询多产品在日期范围内的预测值（情景基线聚合用）
    ///
    /// # 说明
    /// - product_ids 为空时不按产品过滤（全选语义）
    /// - 只返回预测非空的值
    pub fn find_forecast_values(
        &self,
        product_ids: &[String],
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> RepositoryResult<Vec<f64>> {
        let conn = self.get_conn()?;

        // 动态拼接 IN 子句占位符
        let mut sql = String::from(
            "SELECT forecast FROM demand_observation \
             WHERE forecast IS NOT NULL AND obs_date >= ?1 AND obs_date <= ?2",
        );
        if !product_ids.is_empty() {
            let placeholders: Vec<String> = (0..product_ids.len())
                .map(|i| format!("?{}", i + 3))
                .collect();
            sql.push_str(&format!(" AND product_id IN ({})", placeholders.join(", ")));
        }
        sql.push_str(" ORDER BY obs_date ASC");

        let mut stmt = conn.prepare(&sql)?;

        let mut bound: Vec<Box<dyn rusqlite::types::ToSql>> = vec![
            Box::new(date_from.to_string()),
            Box::new(date_to.to_string()),
        ];
        for pid in product_ids {
            bound.push(Box::new(pid.clone()));
        }
        let bound_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let values = stmt
            .query_map(bound_refs.as_slice(), |row| row.get::<_, f64>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(values)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 行映射: demand_observation → DemandObservation
fn map_observation_row(row: &Row<'_>) -> SqliteResult<DemandObservation> {
    Ok(DemandObservation {
        obs_date: NaiveDate::parse_from_str(&row.get::<_, String>(0)?, "%Y-%m-%d")
            .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
        product_id: row.get(1)?,
        location_id: row.get(2)?,
        customer_id: row.get(3)?,
        forecast: row.get(4)?,
        actual: row.get(5)?,
        sales_plan: row.get(6)?,
        demand_planner: row.get(7)?,
        commercial_input: row.get(8)?,
    })
}
