// ==========================================
// 供应链需求计划系统 - 演示库种子工具
// ==========================================
// 用途: 重置并填充一套可复现的演示数据
//       (需求观测 + 库存快照 + 告警行 + 一个草稿情景)
// 用法: seed_demo_db [db_path] [product_count]
// ==========================================

use chrono::{Duration, Local, Utc};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use demand_planning_dss::db::default_db_path;
use demand_planning_dss::domain::demand::DemandObservation;
use demand_planning_dss::domain::exception::ExceptionRecord;
use demand_planning_dss::domain::inventory::InventorySnapshot;
use demand_planning_dss::domain::scenario::{ScenarioParameters, ScenarioScope};
use demand_planning_dss::api::scenario_api::CreateScenarioRequest;
use demand_planning_dss::api::ScenarioApi;
use demand_planning_dss::domain::types::{ExceptionSeverity, ExceptionStatus};
use demand_planning_dss::repository::{
    ExceptionRepository, ForecastRepository, InventoryRepository, ScenarioRepository,
};
use demand_planning_dss::service::ScenarioRunner;

const DEFAULT_PRODUCT_COUNT: usize = 20;
const HISTORY_DAYS: i64 = 120;
const WAREHOUSES: [&str; 3] = ["WH01", "WH02", "WH03"];

fn main() -> Result<(), Box<dyn Error>> {
    demand_planning_dss::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(default_db_path);
    let product_count = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_PRODUCT_COUNT)
        .max(1);

    backup_and_reset_db(&db_path)?;

    tracing::info!("演示库路径: {}", db_path);

    let forecast_repo = Arc::new(ForecastRepository::new(&db_path)?);
    let inventory_repo = Arc::new(InventoryRepository::new(&db_path)?);
    let exception_repo = Arc::new(ExceptionRepository::new(&db_path)?);
    let scenario_repo = Arc::new(ScenarioRepository::new(&db_path)?);

    seed_forecast(&forecast_repo, product_count)?;
    seed_inventory(&inventory_repo, product_count)?;
    seed_exceptions(&exception_repo)?;
    seed_demo_scenario(scenario_repo, forecast_repo, inventory_repo)?;

    tracing::info!("演示数据填充完成 ({} 个产品)", product_count);
    Ok(())
}

/// 旧库备份后删除 (保留最近一次)
fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if path.exists() {
        let backup = format!("{}.bak", db_path);
        fs::copy(path, &backup)?;
        fs::remove_file(path)?;
        tracing::info!("旧库已备份: {}", backup);
    }
    Ok(())
}

/// 需求观测: 每产品×首仓库逐日一行,带周期波动
fn seed_forecast(repo: &ForecastRepository, product_count: usize) -> Result<(), Box<dyn Error>> {
    let today = Local::now().date_naive();
    let mut observations = Vec::new();

    for p in 1..=product_count {
        let product_id = format!("P{:03}", p);
        let base = 40.0 + (p % 7) as f64 * 12.0;

        for d in 0..HISTORY_DAYS {
            let obs_date = today - Duration::days(HISTORY_DAYS - d);
            // 确定性波动: 周内周期 + 线性漂移
            let wave = ((d % 7) as f64 - 3.0) * 4.0;
            let drift = d as f64 * 0.05;
            let forecast = (base + wave + drift).max(0.0);

            observations.push(DemandObservation {
                obs_date,
                product_id: product_id.clone(),
                location_id: WAREHOUSES[0].to_string(),
                customer_id: None,
                forecast: Some(forecast),
                actual: if d < HISTORY_DAYS - 7 {
                    Some(forecast * 0.93)
                } else {
                    None
                },
                sales_plan: None,
                demand_planner: None,
                commercial_input: None,
            });
        }
    }

    let count = repo.batch_insert(observations)?;
    tracing::info!("需求观测: {} 行", count);
    Ok(())
}

/// 库存快照: 每产品三个仓库节点
fn seed_inventory(repo: &InventoryRepository, product_count: usize) -> Result<(), Box<dyn Error>> {
    let now = Utc::now().naive_utc();
    let mut snapshots = Vec::new();

    for p in 1..=product_count {
        let product_id = format!("P{:03}", p);
        for (w, warehouse) in WAREHOUSES.iter().enumerate() {
            snapshots.push(InventorySnapshot {
                product_id: product_id.clone(),
                warehouse_id: warehouse.to_string(),
                current_stock: 600.0 + (w as f64) * 800.0 + (p % 5) as f64 * 50.0,
                reorder_point: 250.0,
                safety_stock: 150.0,
                unit_cost: 8.0 + (p % 4) as f64 * 2.5,
                lead_time_days: 5 + (w as i32) * 2,
                updated_at: now,
            });
        }
    }

    let count = repo.batch_upsert(snapshots)?;
    tracing::info!("库存快照: {} 行", count);
    Ok(())
}

/// 告警行: 缺货风险 + 库存积压各若干
fn seed_exceptions(repo: &ExceptionRepository) -> Result<(), Box<dyn Error>> {
    let now = Utc::now().naive_utc();
    let mut records = Vec::new();

    let samples = [
        ("stockout_risk", ExceptionSeverity::Critical, 1.2, 10.0),
        ("stockout_risk", ExceptionSeverity::High, 3.5, 10.0),
        ("excess_inventory", ExceptionSeverity::Medium, 900.0, 400.0),
        ("excess_inventory", ExceptionSeverity::Low, 520.0, 400.0),
    ];

    for (i, (exception_type, severity, current, threshold)) in samples.iter().enumerate() {
        records.push(ExceptionRecord {
            exception_id: Uuid::new_v4().to_string(),
            exception_type: exception_type.to_string(),
            severity: *severity,
            product_id: format!("P{:03}", i + 1),
            location: WAREHOUSES[0].to_string(),
            current_value: *current,
            threshold_value: *threshold,
            variance_percentage: 0.0,
            days_of_supply: 0.0,
            estimated_financial_impact: 0.0,
            status: ExceptionStatus::Active,
            resolved_at: None,
            resolution_notes: None,
            created_at: now,
        });
    }

    let count = repo.batch_insert(records)?;
    tracing::info!("告警行: {} 行", count);
    Ok(())
}

/// 一个草稿情景,演示执行路径
fn seed_demo_scenario(
    scenario_repo: Arc<ScenarioRepository>,
    forecast_repo: Arc<ForecastRepository>,
    inventory_repo: Arc<InventoryRepository>,
) -> Result<(), Box<dyn Error>> {
    let runner = Arc::new(ScenarioRunner::new(
        scenario_repo.clone(),
        forecast_repo,
        inventory_repo,
    ));
    let api = ScenarioApi::new(scenario_repo, runner);

    let mut parameters = ScenarioParameters::default();
    parameters.percentage = Some(15.0);

    let definition = api.create_scenario(CreateScenarioRequest {
        scenario_name: "需求上行 +15%".to_string(),
        scenario_type: "FORECAST_ADJUSTMENT".to_string(),
        parameters,
        scope: ScenarioScope {
            product_ids: vec!["P001".to_string(), "P002".to_string()],
            warehouse_ids: vec![],
            customer_ids: vec![],
            time_horizon_days: 90,
        },
        description: Some("演示用: 商务预期上调".to_string()),
    })?;

    tracing::info!("草稿情景: {}", definition.scenario_id);
    Ok(())
}
