// ==========================================
// 供应链需求计划系统 - 时间序列统计引擎
// ==========================================
// 依据: Planning_Engine_Specs.md - 1. Statistics Engine
// ==========================================
// 职责: 均值/方差/变异系数/线性趋势/离群点计数
// 红线: 无状态引擎,所有方法都是纯函数
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// TrendPoint - 趋势线上的点
// ==========================================
// 对原序列的每个下标都产出投影值 (含缺失下标),用于整长趋势线绘制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub index: usize, // 原序列下标
    pub value: f64,   // 趋势投影值
}

// ==========================================
// TimeSeriesStatistics - 时间序列统计引擎
// ==========================================
pub struct TimeSeriesStatistics;

impl TimeSeriesStatistics {
    /// 创建新的统计引擎
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 基础统计量
    // ==========================================

    /// 算术平均
    ///
    /// 边界处理: 空输入 → 0
    pub fn mean(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// 总体方差
    ///
    /// 边界处理: 空输入或单元素 → 0
    pub fn variance(&self, values: &[f64]) -> f64 {
        if values.len() <= 1 {
            return 0.0;
        }
        let mean = self.mean(values);
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
    }

    /// 标准差
    pub fn stddev(&self, values: &[f64]) -> f64 {
        self.variance(values).sqrt()
    }

    /// 变异系数 = 标准差 / 均值
    ///
    /// 边界处理: 均值为 0 → 返回 0 (哨兵值,不传播 NaN/Infinity)
    pub fn coefficient_of_variation(&self, values: &[f64]) -> f64 {
        let mean = self.mean(values);
        if mean == 0.0 {
            return 0.0;
        }
        self.stddev(values) / mean
    }

    // ==========================================
    // 线性趋势 (依据 Planning_Engine_Specs 1.3)
    // ==========================================

    /// 最小二乘趋势线
    ///
    /// # 参数
    /// - `values`: 按时间顺序排列的观测序列,缺失值为 None
    ///
    /// # 规则
    /// - 回归只使用非空且非零的 (下标, 值) 对
    /// - 有效点不足 2 个 → 返回空趋势序列
    /// - 对原序列的每个下标都产出投影值 (整长趋势线)
    pub fn linear_trend(&self, values: &[Option<f64>]) -> Vec<TrendPoint> {
        let pairs: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| match v {
                Some(x) if *x != 0.0 => Some((i as f64, *x)),
                _ => None,
            })
            .collect();

        if pairs.len() < 2 {
            return Vec::new();
        }

        let (slope, intercept) = match self.least_squares(&pairs) {
            Some(fit) => fit,
            None => return Vec::new(),
        };

        (0..values.len())
            .map(|i| TrendPoint {
                index: i,
                value: intercept + slope * i as f64,
            })
            .collect()
    }

    /// 普通最小二乘拟合 (斜率, 截距)
    ///
    /// 边界处理: 所有 x 相同 (分母为 0) → None
    fn least_squares(&self, pairs: &[(f64, f64)]) -> Option<(f64, f64)> {
        let n = pairs.len() as f64;
        let sum_x: f64 = pairs.iter().map(|(x, _)| x).sum();
        let sum_y: f64 = pairs.iter().map(|(_, y)| y).sum();
        let sum_xy: f64 = pairs.iter().map(|(x, y)| x * y).sum();
        let sum_x2: f64 = pairs.iter().map(|(x, _)| x * x).sum();

        let denominator = n * sum_x2 - sum_x * sum_x;
        if denominator == 0.0 {
            return None;
        }

        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;
        Some((slope, intercept))
    }

    // ==========================================
    // 离群点计数
    // ==========================================

    /// 离群点数量: 与均值的绝对偏差超过 2 倍标准差
    pub fn outlier_count(&self, values: &[f64]) -> usize {
        if values.len() <= 1 {
            return 0;
        }
        let mean = self.mean(values);
        let stddev = self.stddev(values);
        if stddev == 0.0 {
            return 0;
        }
        values
            .iter()
            .filter(|v| (**v - mean).abs() > 2.0 * stddev)
            .count()
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 过滤出非空观测值
    pub fn non_null(&self, values: &[Option<f64>]) -> Vec<f64> {
        values.iter().filter_map(|v| *v).collect()
    }
}

impl Default for TimeSeriesStatistics {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_basic() {
        let stats = TimeSeriesStatistics::new();
        assert_eq!(stats.mean(&[10.0, 20.0, 30.0]), 20.0);
        assert_eq!(stats.mean(&[]), 0.0);
    }

    #[test]
    fn test_variance_and_stddev() {
        let stats = TimeSeriesStatistics::new();

        // 总体方差: [2,4,4,4,5,5,7,9] → 4.0
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(stats.variance(&values), 4.0);
        assert_eq!(stats.stddev(&values), 2.0);

        // 空输入与单元素 → 0
        assert_eq!(stats.variance(&[]), 0.0);
        assert_eq!(stats.variance(&[42.0]), 0.0);
    }

    #[test]
    fn test_coefficient_of_variation_zero_mean_sentinel() {
        let stats = TimeSeriesStatistics::new();

        // 均值为 0 → 哨兵 0,不产生 NaN
        let cv = stats.coefficient_of_variation(&[-1.0, 1.0]);
        assert_eq!(cv, 0.0);

        // 正常情况
        let cv = stats.coefficient_of_variation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((cv - 2.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_trend_full_length() {
        let stats = TimeSeriesStatistics::new();

        // 完美线性序列 y = 2x + 1
        let values = vec![Some(1.0), Some(3.0), Some(5.0), Some(7.0)];
        let trend = stats.linear_trend(&values);

        assert_eq!(trend.len(), 4);
        assert!((trend[0].value - 1.0).abs() < 1e-9);
        assert!((trend[3].value - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_trend_skips_null_and_zero() {
        let stats = TimeSeriesStatistics::new();

        // 缺失值与零值不参与回归,但下标仍产出投影值
        let values = vec![Some(1.0), None, Some(0.0), Some(7.0)];
        let trend = stats.linear_trend(&values);

        // 有效点: (0,1) 和 (3,7) → 斜率2, 截距1
        assert_eq!(trend.len(), 4);
        assert!((trend[1].value - 3.0).abs() < 1e-9);
        assert!((trend[2].value - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_trend_insufficient_points() {
        let stats = TimeSeriesStatistics::new();

        // 有效点不足 2 个 → 空序列
        assert!(stats.linear_trend(&[Some(5.0)]).is_empty());
        assert!(stats.linear_trend(&[Some(5.0), None, Some(0.0)]).is_empty());
        assert!(stats.linear_trend(&[]).is_empty());
    }

    #[test]
    fn test_outlier_count() {
        let stats = TimeSeriesStatistics::new();

        // 常量序列无离群点
        assert_eq!(stats.outlier_count(&[5.0, 5.0, 5.0]), 0);

        // 100.0 相对其余值是离群点
        let mut values = vec![10.0; 20];
        values.push(100.0);
        assert_eq!(stats.outlier_count(&values), 1);
    }

    #[test]
    fn test_non_null_filter() {
        let stats = TimeSeriesStatistics::new();
        let filtered = stats.non_null(&[Some(1.0), None, Some(3.0)]);
        assert_eq!(filtered, vec![1.0, 3.0]);
    }
}
