// ==========================================
// 供应链需求计划系统 - 预测文件导入器
// ==========================================
// 职责: 原始记录 → 需求观测行 (字段映射/校验/批量落库)
// 红线: 行级失败收集上报,不阻断整批 ("不让看板停摆")
// ==========================================

use crate::domain::demand::DemandObservation;
use crate::importer::error::ImportError;
use crate::importer::file_parser::UniversalFileParser;
use crate::repository::forecast_repo::ForecastRepository;
use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// 导入报告
// ==========================================

/// 单行失败明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFailure {
    pub row_index: usize, // 数据行号 (不含表头,从1起)
    pub reason: String,
}

/// 导入报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub file: String,
    pub total_rows: usize,
    pub imported: usize,
    pub failures: Vec<RowFailure>,
}

// ==========================================
// ForecastImporter - 预测文件导入器
// ==========================================
pub struct ForecastImporter {
    forecast_repo: Arc<ForecastRepository>,
    parser: UniversalFileParser,
}

impl ForecastImporter {
    /// 创建新的预测文件导入器
    pub fn new(forecast_repo: Arc<ForecastRepository>) -> Self {
        Self {
            forecast_repo,
            parser: UniversalFileParser,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 导入单个预测文件 (CSV/Excel)
    ///
    /// # 列别名 (统一小写匹配)
    /// - 必需: date|obs_date, product|product_id, location|location_id
    /// - 可选: customer|customer_id, forecast, actual, sales_plan,
    ///         demand_planner, commercial_input
    ///
    /// # 行级校验
    /// - 日期格式 %Y-%m-%d 或 %Y/%m/%d
    /// - 数值通道可缺失;给定时必须可解析且非负
    #[instrument(skip(self, path), fields(file = %path.as_ref().display()))]
    pub async fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportReport, ImportError> {
        let path = path.as_ref();
        let records = self.parser.parse(path).map_err(|e| {
            // 保留解析层的具体错误变体
            match e.downcast::<ImportError>() {
                Ok(import_error) => *import_error,
                Err(other) => ImportError::CsvParseError(other.to_string()),
            }
        })?;

        let total_rows = records.len();
        let mut observations = Vec::new();
        let mut failures = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            let row_index = idx + 1;
            match self.map_row(record) {
                Ok(obs) => observations.push(obs),
                Err(reason) => {
                    warn!(row = row_index, reason = %reason, "预测行校验失败");
                    failures.push(RowFailure { row_index, reason });
                }
            }
        }

        let imported = self
            .forecast_repo
            .batch_insert(observations)
            .map_err(|e| ImportError::PersistError(e.to_string()))?;

        info!(total_rows, imported, failed = failures.len(), "预测文件导入完成");

        Ok(ImportReport {
            file: path.display().to_string(),
            total_rows,
            imported,
            failures,
        })
    }

    /// 批量导入多个预测文件 (并发,单文件失败不影响其它文件)
    pub async fn import_files(&self, paths: &[String]) -> Vec<Result<ImportReport, ImportError>> {
        let futures: Vec<_> = paths.iter().map(|p| self.import_file(p)).collect();
        join_all(futures).await
    }

    // ==========================================
    // 行映射与校验
    // ==========================================

    /// 单行映射: 原始记录 → DemandObservation
    fn map_row(&self, record: &HashMap<String, String>) -> Result<DemandObservation, String> {
        let obs_date = self.parse_date(self.required(record, &["date", "obs_date"])?)?;
        let product_id = self.required(record, &["product", "product_id"])?.to_string();
        let location_id = self
            .required(record, &["location", "location_id"])?
            .to_string();

        let customer_id = self
            .optional(record, &["customer", "customer_id"])
            .map(|s| s.to_string());

        Ok(DemandObservation {
            obs_date,
            product_id,
            location_id,
            customer_id,
            forecast: self.parse_quantity(record, "forecast")?,
            actual: self.parse_quantity(record, "actual")?,
            sales_plan: self.parse_quantity(record, "sales_plan")?,
            demand_planner: self.parse_quantity(record, "demand_planner")?,
            commercial_input: self.parse_quantity(record, "commercial_input")?,
        })
    }

    /// 取必需列 (按别名顺序,非空才算命中)
    fn required<'a>(
        &self,
        record: &'a HashMap<String, String>,
        aliases: &[&str],
    ) -> Result<&'a str, String> {
        self.optional(record, aliases)
            .ok_or_else(|| format!("缺少必需列: {}", aliases.join("|")))
    }

    /// 取可选列
    fn optional<'a>(
        &self,
        record: &'a HashMap<String, String>,
        aliases: &[&str],
    ) -> Option<&'a str> {
        aliases
            .iter()
            .filter_map(|alias| record.get(*alias))
            .map(|s| s.as_str())
            .find(|s| !s.is_empty())
    }

    /// 解析日期 (%Y-%m-%d 或 %Y/%m/%d)
    fn parse_date(&self, raw: &str) -> Result<NaiveDate, String> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
            .map_err(|_| format!("日期格式非法: {}", raw))
    }

    /// 解析数值通道 (空 → None;给定时必须可解析且非负)
    fn parse_quantity(
        &self,
        record: &HashMap<String, String>,
        column: &str,
    ) -> Result<Option<f64>, String> {
        let raw = match record.get(column) {
            Some(v) if !v.is_empty() => v,
            _ => return Ok(None),
        };

        let value: f64 = raw
            .parse()
            .map_err(|_| format!("列{}数值非法: {}", column, raw))?;
        if value < 0.0 {
            return Err(format!("列{}不允许负值: {}", column, raw));
        }
        Ok(Some(value))
    }
}
