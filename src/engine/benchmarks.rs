//! Benchmark thresholds and performance-tier classification
//!
//! Each derived metric has a fixed polarity (a high CTR is good, a high CPC
//! is not). Accounts store per-metric `{low, medium}` thresholds; a value is
//! banded into good/warning/poor against them, or left neutral when the
//! account has no thresholds for that metric.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::engine::aggregate::Metrics;

/// Identifier of a derived performance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    Ctr,
    Cpc,
    Cpm,
    CostPerPurchase,
    Roas,
    ConversionRate,
}

impl MetricId {
    pub const ALL: [MetricId; 6] = [
        MetricId::Ctr,
        MetricId::Cpc,
        MetricId::Cpm,
        MetricId::CostPerPurchase,
        MetricId::Roas,
        MetricId::ConversionRate,
    ];

    /// Fixed polarity: CTR, ROAS and rate metrics improve upward, cost
    /// metrics improve downward.
    pub fn higher_is_better(self) -> bool {
        matches!(
            self,
            MetricId::Ctr | MetricId::Roas | MetricId::ConversionRate
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricId::Ctr => "ctr",
            MetricId::Cpc => "cpc",
            MetricId::Cpm => "cpm",
            MetricId::CostPerPurchase => "cost_per_purchase",
            MetricId::Roas => "roas",
            MetricId::ConversionRate => "conversion_rate",
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ctr" => Ok(MetricId::Ctr),
            "cpc" => Ok(MetricId::Cpc),
            "cpm" => Ok(MetricId::Cpm),
            "cost_per_purchase" => Ok(MetricId::CostPerPurchase),
            "roas" => Ok(MetricId::Roas),
            "conversion_rate" => Ok(MetricId::ConversionRate),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}

/// Per-metric banding thresholds. Either bound may be absent, in which case
/// classification stays neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub medium: Option<f64>,
}

/// Snapshot of an account's stored thresholds, keyed by metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkThresholds(pub HashMap<MetricId, Threshold>);

impl BenchmarkThresholds {
    pub fn get(&self, metric: MetricId) -> Option<Threshold> {
        self.0.get(&metric).copied()
    }

    pub fn set(&mut self, metric: MetricId, threshold: Threshold) {
        self.0.insert(metric, threshold);
    }
}

/// Performance band for one metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Good,
    Warning,
    Poor,
    /// No thresholds configured, or the value is not classifiable.
    Neutral,
}

/// Band a metric value against the account thresholds.
pub fn classify(metric: MetricId, value: f64, thresholds: &BenchmarkThresholds) -> Tier {
    let Some(threshold) = thresholds.get(metric) else {
        return Tier::Neutral;
    };
    let (Some(low), Some(medium)) = (threshold.low, threshold.medium) else {
        return Tier::Neutral;
    };
    if !value.is_finite() {
        return Tier::Neutral;
    }

    if metric.higher_is_better() {
        if value >= medium {
            Tier::Good
        } else if value >= low {
            Tier::Warning
        } else {
            Tier::Poor
        }
    } else if value <= medium {
        Tier::Good
    } else if value <= low {
        Tier::Warning
    } else {
        Tier::Poor
    }
}

/// Classify every derived metric of a row at once.
pub fn classify_row(
    metrics: &Metrics,
    thresholds: &BenchmarkThresholds,
) -> HashMap<MetricId, Tier> {
    MetricId::ALL
        .iter()
        .map(|&metric| (metric, classify(metric, metrics.get(metric), thresholds)))
        .collect()
}
