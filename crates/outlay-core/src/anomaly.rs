//! Statistical anomaly detection
//!
//! Flags charges above `mean + k·σ` of the population of charges in the
//! lookback window. The result does not depend on record order.

use tracing::debug;

use crate::config::AnomalyConfig;
use crate::models::{Anomaly, AnomalySeverity, SpendingRecord};

/// Population mean and standard deviation; None for an empty slice
pub fn mean_std_dev(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Detects charges that deviate from the rest of the window
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Flag records above the medium threshold, ordered by date
    ///
    /// Returns an empty list when the window holds fewer than
    /// `min_records` records.
    pub fn detect(&self, records: &[SpendingRecord]) -> Vec<Anomaly> {
        if records.len() < self.config.min_records {
            debug!(
                records = records.len(),
                min = self.config.min_records,
                "Not enough records for anomaly detection"
            );
            return vec![];
        }

        let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
        let Some((mean, std_dev)) = mean_std_dev(&amounts) else {
            return vec![];
        };

        let threshold = mean + self.config.medium_sigma * std_dev;
        let high_threshold = mean + self.config.high_sigma * std_dev;

        let mut anomalies: Vec<Anomaly> = records
            .iter()
            .filter(|r| r.amount > threshold)
            .map(|r| {
                let severity = if r.amount > high_threshold {
                    AnomalySeverity::High
                } else {
                    AnomalySeverity::Medium
                };
                let sigmas = if std_dev > 0.0 {
                    (r.amount - mean) / std_dev
                } else {
                    0.0
                };
                let label = r
                    .subscription_name
                    .as_deref()
                    .unwrap_or(r.category.as_str());

                Anomaly {
                    date: r.date,
                    amount: r.amount,
                    expected_amount: mean,
                    deviation: r.amount - mean,
                    severity,
                    reason: format!(
                        "{} charge of ${:.2} is {:.1}σ above the average of ${:.2}",
                        label, r.amount, sigmas, mean
                    ),
                    category: Some(r.category.clone()),
                    subscription_id: r.subscription_id.clone(),
                }
            })
            .collect();

        anomalies.sort_by(|a, b| {
            a.date.cmp(&b.date).then_with(|| {
                b.amount
                    .partial_cmp(&a.amount)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });

        debug!(
            anomalies = anomalies.len(),
            mean, std_dev, threshold, "Anomaly detection complete"
        );

        anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn records(amounts: &[f64]) -> Vec<SpendingRecord> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| SpendingRecord {
                date: start + Duration::days(i as i64),
                amount,
                category: "Streaming".to_string(),
                subscription_id: Some(format!("sub-{}", i)),
                subscription_name: None,
            })
            .collect()
    }

    #[test]
    fn test_mean_std_dev() {
        let (mean, std) = mean_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
        assert!(mean_std_dev(&[]).is_none());
    }

    #[test]
    fn test_skips_small_windows() {
        let detector = AnomalyDetector::default();
        let amounts = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 500.0];
        assert!(detector.detect(&records(&amounts)).is_empty());
    }

    #[test]
    fn test_flags_outlier() {
        let detector = AnomalyDetector::default();
        let amounts = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 100.0];
        let anomalies = detector.detect(&records(&amounts));

        assert_eq!(anomalies.len(), 1);
        let anomaly = &anomalies[0];
        assert_eq!(anomaly.amount, 100.0);
        assert_eq!(anomaly.expected_amount, 19.0);
        assert_eq!(anomaly.deviation, 81.0);
        // σ = 27, so 100 sits exactly 3σ above the mean: not strictly above
        assert_eq!(anomaly.severity, AnomalySeverity::Medium);
        assert_eq!(anomaly.category.as_deref(), Some("Streaming"));
    }

    #[test]
    fn test_high_severity_beyond_three_sigma() {
        let detector = AnomalyDetector::default();
        let mut amounts = vec![10.0; 19];
        amounts.push(200.0);
        let anomalies = detector.detect(&records(&amounts));

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].severity, AnomalySeverity::High);
    }

    #[test]
    fn test_uniform_amounts_produce_no_anomalies() {
        let detector = AnomalyDetector::default();
        assert!(detector.detect(&records(&[12.0; 15])).is_empty());
    }

    #[test]
    fn test_order_independent() {
        let detector = AnomalyDetector::default();
        let amounts = [10.0, 100.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0];
        let mut shuffled = records(&amounts);
        shuffled.reverse();

        let a = detector.detect(&records(&amounts));
        let b = detector.detect(&shuffled);
        assert_eq!(a, b);
    }
}
