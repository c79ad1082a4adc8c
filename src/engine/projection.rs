// ==========================================
// 供应链需求计划系统 - 库存投影引擎
// ==========================================
// 依据: Planning_Engine_Specs.md - 3. Projection Engine
// ==========================================
// 职责: 逐日推演库存余额并分类状态
// 输入: 库存快照 + 预测需求序列 + 投影参数
// 输出: InventoryProjection (逐日有序序列,每次从第0天重算)
// ==========================================

use crate::domain::demand::DemandObservation;
use crate::domain::inventory::{
    InventoryProjection, InventoryProjectionPoint, InventorySnapshot,
};
use crate::domain::types::InventoryStatus;
use crate::engine::seasonal::SeasonalAdjustment;
use chrono::{Duration, NaiveDate};
use tracing::instrument;

// ==========================================
// ProjectionParams - 投影参数
// ==========================================
#[derive(Debug, Clone)]
pub struct ProjectionParams {
    pub start_date: NaiveDate,      // 投影起始日 (第0天)
    pub horizon_days: usize,        // 投影天数
    pub capacity_multiplier: f64,   // 库容启发式乘数 (默认 2.0)
    pub simulate_replenishment: bool, // 是否模拟自动补货
}

impl ProjectionParams {
    /// 默认参数: 90 天投影,2 倍库容启发式,开启补货模拟
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            horizon_days: 90,
            capacity_multiplier: 2.0,
            simulate_replenishment: true,
        }
    }
}

// ==========================================
// InventoryProjector - 库存投影引擎
// ==========================================
// 红线: 无状态引擎,纯函数;相同输入必须产出逐位一致的输出
pub struct InventoryProjector {
    seasonal: SeasonalAdjustment,
}

impl InventoryProjector {
    /// 创建新的库存投影引擎
    pub fn new() -> Self {
        Self {
            seasonal: SeasonalAdjustment::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 生成单产品/仓库的库存投影
    ///
    /// # 算法 (逐日,第 0..horizon 天)
    /// 1. 解析当日需求: 精确日期命中优先,否则取时间距离最近的预测值
    ///    (距离相同时取较早日期,保证跨运行确定性)
    /// 2. 乘以当月季节因子
    /// 3. 累计需求,projected = 起始库存 − 累计需求 + 已模拟补货量
    /// 4. day>0 且 projected ≤ 再订货点时,补货至估算库容
    ///    (只影响当日及之后的投影值,不回写此前的累计需求)
    /// 5. 状态分类 (补货后判定)
    ///
    /// # 边界
    /// - 预测序列为空 → 每日需求 0,投影退化为起始库存水平线
    #[instrument(skip(self, snapshot, forecast), fields(
        product_id = %snapshot.product_id,
        warehouse_id = %snapshot.warehouse_id,
        forecast_rows = forecast.len()
    ))]
    pub fn project(
        &self,
        snapshot: &InventorySnapshot,
        forecast: &[DemandObservation],
        params: &ProjectionParams,
    ) -> InventoryProjection {
        // 预测序列按日期整理 (解析用)
        let series = self.build_series(forecast);

        let starting_stock = snapshot.current_stock;
        let capacity = snapshot.estimated_capacity(params.capacity_multiplier);

        let mut points = Vec::with_capacity(params.horizon_days);
        let mut cumulative_demand = 0.0;
        let mut replenished_total = 0.0;

        for day in 0..params.horizon_days {
            let point_date = params.start_date + Duration::days(day as i64);

            // 1-2. 当日需求 (最近匹配 + 季节调整)
            let raw_demand = self.resolve_demand(&series, point_date);
            let demand = self.seasonal.adjust_daily_demand(raw_demand, point_date);

            // 3. 余额推演
            cumulative_demand += demand;
            let mut projected = starting_stock - cumulative_demand + replenished_total;

            // 4. 补货模拟 (第0天不触发)
            let mut replenishment_qty = None;
            if params.simulate_replenishment && day > 0 && projected <= snapshot.reorder_point {
                let gap = capacity - projected;
                if gap > 0.0 {
                    replenished_total += gap;
                    projected += gap;
                    replenishment_qty = Some(gap);
                }
            }

            // 5. 状态分类
            let status = self.classify_status(projected, snapshot.safety_stock);

            points.push(InventoryProjectionPoint {
                point_date,
                projected_inventory: projected,
                forecast_demand: demand,
                cumulative_demand,
                reorder_point: snapshot.reorder_point,
                safety_stock: snapshot.safety_stock,
                status,
                replenishment_qty,
            });
        }

        InventoryProjection {
            product_id: snapshot.product_id.clone(),
            warehouse_id: snapshot.warehouse_id.clone(),
            starting_stock,
            points,
        }
    }

    // ==========================================
    // 需求解析 (依据 Planning_Engine_Specs 3.1)
    // ==========================================

    /// 整理预测序列: 按日期升序,缺失预测值按 0 处理
    fn build_series(&self, forecast: &[DemandObservation]) -> Vec<(NaiveDate, f64)> {
        let mut series: Vec<(NaiveDate, f64)> = forecast
            .iter()
            .map(|obs| (obs.obs_date, obs.forecast_or_zero()))
            .collect();
        series.sort_by_key(|(date, _)| *date);
        series
    }

    /// 解析指定日期的需求
    ///
    /// # 规则
    /// - 精确日期命中 → 该值
    /// - 否则取绝对时间距离最近的值;距离相同时较早日期胜出
    /// - 序列为空 → 0
    fn resolve_demand(&self, series: &[(NaiveDate, f64)], target: NaiveDate) -> f64 {
        let mut best: Option<(i64, NaiveDate, f64)> = None;

        for (date, value) in series {
            let delta = (*date - target).num_days().abs();
            if delta == 0 {
                return *value;
            }

            match best {
                None => best = Some((delta, *date, *value)),
                Some((best_delta, best_date, _)) => {
                    // 距离更近,或距离相同且日期更早
                    if delta < best_delta || (delta == best_delta && *date < best_date) {
                        best = Some((delta, *date, *value));
                    }
                }
            }
        }

        best.map(|(_, _, value)| value).unwrap_or(0.0)
    }

    // ==========================================
    // 状态分类 (依据 Planning_Engine_Specs 3.2)
    // ==========================================

    /// 按投影余额分类库存状态
    ///
    /// 阶跃函数,边界值落在低档:
    /// - projected ≤ 0            → Stockout
    /// - projected ≤ 0.5×安全库存 → Critical
    /// - projected ≤ 安全库存     → Warning
    /// - 其他                     → Optimal
    pub fn classify_status(&self, projected: f64, safety_stock: f64) -> InventoryStatus {
        if projected <= 0.0 {
            InventoryStatus::Stockout
        } else if projected <= safety_stock * 0.5 {
            InventoryStatus::Critical
        } else if projected <= safety_stock {
            InventoryStatus::Warning
        } else {
            InventoryStatus::Optimal
        }
    }
}

impl Default for InventoryProjector {
    fn default() -> Self {
        Self::new()
    }
}
