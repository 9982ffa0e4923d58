//! Spending forecasts
//!
//! Two projections are offered:
//! - [`ForecastEngine::predict`]: ordinary least squares over monthly totals,
//!   projected N months ahead with ±2σ residual bounds and a confidence that
//!   decays with the horizon.
//! - [`ForecastEngine::next_month`]: a cheap continuation based on average
//!   month-over-month growth, used to pad charts with one forecast bucket.

use chrono::NaiveDate;
use tracing::debug;

use crate::anomaly::mean_std_dev;
use crate::config::ForecastConfig;
use crate::models::{Forecast, ForecastFactor, MonthlyBucket};
use crate::period::{month_key, shift_months, MAX_HORIZON_MONTHS};

/// Result of fitting `y = slope·x + intercept` with `x = 0..n`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Population standard deviation of `actual - predicted`
    pub residual_std_dev: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a least-squares line to evenly spaced values
///
/// Returns None for fewer than two points.
pub fn fit_linear(values: &[f64]) -> Option<LinearFit> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let residuals: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(i, &y)| y - (slope * i as f64 + intercept))
        .collect();
    let residual_std_dev = mean_std_dev(&residuals).map_or(0.0, |(_, std)| std);

    Some(LinearFit {
        slope,
        intercept,
        residual_std_dev,
    })
}

/// Growth-rate continuation for the month after the last total
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextMonthForecast {
    pub predicted_amount: f64,
    pub confidence: f64,
    /// Mean month-over-month growth rate (0.1 = +10%)
    pub average_growth: f64,
    /// Standard deviation of the growth rates
    pub volatility: f64,
}

/// Projects future monthly spending from history
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Project `horizon` months after `last_month`
    ///
    /// `totals` are chronological monthly totals ending with `last_month`.
    /// `recurring` is the committed monthly cost of active subscriptions,
    /// attached as an informational factor when known. Returns an empty list
    /// when fewer than `min_months` totals are available. The horizon is
    /// capped at `MAX_HORIZON_MONTHS`.
    pub fn predict(
        &self,
        totals: &[f64],
        last_month: NaiveDate,
        horizon: usize,
        recurring: Option<f64>,
    ) -> Vec<Forecast> {
        let horizon = horizon.min(MAX_HORIZON_MONTHS);
        if totals.len() < self.config.min_months || horizon == 0 {
            debug!(
                months = totals.len(),
                min = self.config.min_months,
                "Not enough history to forecast"
            );
            return vec![];
        }

        let Some(fit) = fit_linear(totals) else {
            return vec![];
        };

        let last_index = (totals.len() - 1) as f64;
        let spread = 2.0 * fit.residual_std_dev;

        (1..=horizon)
            .map(|i| {
                let x = last_index + i as f64;
                let raw = fit.predict(x);
                let predicted = raw.max(0.0);
                let confidence = (1.0 - (i as f64 / horizon as f64) * 0.5).clamp(0.0, 1.0);

                let mut factors = vec![
                    ForecastFactor {
                        name: "baseline".to_string(),
                        impact: fit.intercept,
                        description: "Starting level of the fitted trend line".to_string(),
                    },
                    ForecastFactor {
                        name: "trend".to_string(),
                        impact: fit.slope * x,
                        description: format!(
                            "{} of ${:.2} per month",
                            if fit.slope >= 0.0 { "Growth" } else { "Decline" },
                            fit.slope.abs()
                        ),
                    },
                ];
                if let Some(committed) = recurring {
                    factors.push(ForecastFactor {
                        name: "recurring".to_string(),
                        impact: committed,
                        description: "Monthly cost of active subscriptions".to_string(),
                    });
                }

                Forecast {
                    period: month_key(shift_months(last_month, i as i32)),
                    predicted_amount: predicted,
                    confidence,
                    lower_bound: (predicted - spread).max(0.0),
                    upper_bound: predicted + spread,
                    factors,
                }
            })
            .collect()
    }

    /// Continue the series by its average growth rate
    ///
    /// Rates are taken over consecutive pairs whose earlier total is
    /// nonzero. Returns None when no such pair exists.
    pub fn next_month(&self, totals: &[f64]) -> Option<NextMonthForecast> {
        let rates: Vec<f64> = totals
            .windows(2)
            .filter(|pair| pair[0] > 0.0)
            .map(|pair| (pair[1] - pair[0]) / pair[0])
            .collect();

        let (average_growth, volatility) = mean_std_dev(&rates)?;
        let last = *totals.last()?;

        Some(NextMonthForecast {
            predicted_amount: (last * (1.0 + average_growth)).max(0.0),
            confidence: (1.0 - volatility * 2.0).clamp(0.0, 1.0),
            average_growth,
            volatility,
        })
    }
}

/// Synthetic bucket for the month after `last`, split like `last`
pub fn forecast_bucket(last: &MonthlyBucket, month: String, next: &NextMonthForecast) -> MonthlyBucket {
    let scale = if last.total > 0.0 {
        next.predicted_amount / last.total
    } else {
        0.0
    };

    MonthlyBucket {
        month,
        total: next.predicted_amount,
        categories: last
            .categories
            .iter()
            .map(|(k, v)| (k.clone(), v * scale))
            .collect(),
        subscriptions: last
            .subscriptions
            .iter()
            .map(|(k, v)| (k.clone(), v * scale))
            .collect(),
        count: last.count,
        average: if last.count > 0 {
            next.predicted_amount / last.count as f64
        } else {
            0.0
        },
        trend_pct: crate::aggregate::trend_pct(next.predicted_amount, last.total),
        is_forecast: true,
    }
}
