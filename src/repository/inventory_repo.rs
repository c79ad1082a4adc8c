// ==========================================
// 供应链需求计划系统 - 库存快照数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// 表: inventory_snapshot (外部补货/事务流程写入)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::inventory::InventorySnapshot;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// InventoryRepository - 库存快照仓储
// ==========================================
pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    /// 创建新的 InventoryRepository 实例
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
            CREATE TABLE IF NOT EXISTS inventory_snapshot (
              product_id TEXT NOT NULL,
              warehouse_id TEXT NOT NULL,
              current_stock REAL NOT NULL DEFAULT 0,
              reorder_point REAL NOT NULL DEFAULT 0,
              safety_stock REAL NOT NULL DEFAULT 0,
              unit_cost REAL NOT NULL DEFAULT 0,
              lead_time_days INTEGER NOT NULL DEFAULT 0,
              updated_at TEXT NOT NULL DEFAULT (datetime('now')),
              PRIMARY KEY (product_id, warehouse_id)
            );

            CREATE INDEX IF NOT EXISTS idx_inventory_snapshot_product
              ON inventory_snapshot(product_id);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 写入或更新库存快照（upsert）
    pub fn upsert(&self, snapshot: &InventorySnapshot) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO inventory_snapshot (
                product_id, warehouse_id, current_stock, reorder_point,
                safety_stock, unit_cost, lead_time_days, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                snapshot.product_id,
                snapshot.warehouse_id,
                snapshot.current_stock,
                snapshot.reorder_point,
                snapshot.safety_stock,
                snapshot.unit_cost,
                snapshot.lead_time_days,
                snapshot.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;
        Ok(())
    }

    /// 批量写入快照（事务）
    pub fn batch_upsert(&self, snapshots: Vec<InventorySnapshot>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for snapshot in snapshots {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO inventory_snapshot (
                    product_id, warehouse_id, current_stock, reorder_point,
                    safety_stock, unit_cost, lead_time_days, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    snapshot.product_id,
                    snapshot.warehouse_id,
                    snapshot.current_stock,
                    snapshot.reorder_point,
                    snapshot.safety_stock,
                    snapshot.unit_cost,
                    snapshot.lead_time_days,
                    snapshot.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 更新安全库存（建议显式保存路径）
    ///
    /// # 返回
    /// - Err(NotFound): 快照不存在
    pub fn update_safety_stock(
        &self,
        product_id: &str,
        warehouse_id: &str,
        safety_stock: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE inventory_snapshot
            SET safety_stock = ?3, updated_at = datetime('now')
            WHERE product_id = ?1 AND warehouse_id = ?2
            "#,
            params![product_id, warehouse_id, safety_stock],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "InventorySnapshot".to_string(),
                id: format!("{}/{}", product_id, warehouse_id),
            });
        }
        Ok(())
    }

    // ==========================================
    // 读取
    // ==========================================

    /// 按主键查询
    ///
    /// # 返回
    /// - Ok(Some): 找到快照
    /// - Ok(None): 未找到（调用方按"跳过该产品/仓库对"处理,不视为致命）
    pub fn find_by_key(
        &self,
        product_id: &str,
        warehouse_id: &str,
    ) -> RepositoryResult<Option<InventorySnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, warehouse_id, current_stock, reorder_point,
                   safety_stock, unit_cost, lead_time_days, updated_at
            FROM inventory_snapshot
            WHERE product_id = ?1 AND warehouse_id = ?2
            "#,
        )?;

        let result = stmt.query_row(params![product_id, warehouse_id], map_snapshot_row);

        match result {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询单产品的所有节点（多节点分布计划的输入）
    pub fn find_by_product(&self, product_id: &str) -> RepositoryResult<Vec<InventorySnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, warehouse_id, current_stock, reorder_point,
                   safety_stock, unit_cost, lead_time_days, updated_at
            FROM inventory_snapshot
            WHERE product_id = ?1
            ORDER BY warehouse_id ASC
            "#,
        )?;

        let snapshots = stmt
            .query_map(params![product_id], map_snapshot_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(snapshots)
    }

    /// 查询多产品的快照（服务水平情景的受影响产品集）
    ///
    /// # 说明
    /// - product_ids 为空时返回全部快照（全选语义）
    pub fn find_by_products(
        &self,
        product_ids: &[String],
    ) -> RepositoryResult<Vec<InventorySnapshot>> {
        if product_ids.is_empty() {
            return self.find_all();
        }

        let conn = self.get_conn()?;
        let placeholders: Vec<String> =
            (0..product_ids.len()).map(|i| format!("?{}", i + 1)).collect();
        let sql = format!(
            "SELECT product_id, warehouse_id, current_stock, reorder_point, \
             safety_stock, unit_cost, lead_time_days, updated_at \
             FROM inventory_snapshot WHERE product_id IN ({}) \
             ORDER BY product_id ASC, warehouse_id ASC",
            placeholders.join(", ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let bound: Vec<&dyn rusqlite::types::ToSql> = product_ids
            .iter()
            .map(|p| p as &dyn rusqlite::types::ToSql)
            .collect();

        let snapshots = stmt
            .query_map(bound.as_slice(), map_snapshot_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(snapshots)
    }

    /// 查询全部快照
    pub fn find_all(&self) -> RepositoryResult<Vec<InventorySnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, warehouse_id, current_stock, reorder_point,
                   safety_stock, unit_cost, lead_time_days, updated_at
            FROM inventory_snapshot
            ORDER BY product_id ASC, warehouse_id ASC
            "#,
        )?;

        let snapshots = stmt
            .query_map([], map_snapshot_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(snapshots)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 行映射: inventory_snapshot → InventorySnapshot
fn map_snapshot_row(row: &Row<'_>) -> SqliteResult<InventorySnapshot> {
    Ok(InventorySnapshot {
        product_id: row.get(0)?,
        warehouse_id: row.get(1)?,
        current_stock: row.get(2)?,
        reorder_point: row.get(3)?,
        safety_stock: row.get(4)?,
        unit_cost: row.get(5)?,
        lead_time_days: row.get(6)?,
        updated_at: chrono::NaiveDateTime::parse_from_str(
            &row.get::<_, String>(7)?,
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap_or_else(|_| chrono::NaiveDateTime::default()),
    })
}
