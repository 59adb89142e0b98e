//! Creative-performance aggregation engine
//!
//! This module turns a flat export of per-ad performance records into
//! presentation-ready aggregate rows: it decomposes ad display names into
//! semantic segments, groups records at a configurable granularity,
//! extracts representative ad copy, derives ratio metrics, and classifies
//! them against stored benchmarks.
//!
//! The whole pipeline is pure and synchronous. Identical inputs always
//! produce identical outputs, so callers re-run it from scratch on every
//! parameter change instead of updating incrementally.

pub mod aggregate;
pub mod benchmarks;
pub mod copy;
pub mod patterns;
pub mod record;
pub mod view;

pub use aggregate::{aggregate, AggregateRow, GroupMode, Metrics};
pub use benchmarks::{classify, classify_row, BenchmarkThresholds, MetricId, Threshold, Tier};
pub use copy::CopyEngine;
pub use patterns::{DiscoveredPattern, PatternEngine};
pub use record::{PerformanceRecord, RawRecord};
pub use view::{apply_view, SortDir, SortKey, ViewOptions};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("aggregation level must be between 1 and 5, got {0}")]
    InvalidLevel(u8),
}

/// Grouping granularity for creative aggregation.
///
/// Level 1 is the broadest (one row per product/campaign family), level 5
/// is exact (one row per distinct underlying creative). Levels in between
/// progressively retain more name segments.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum AggregationLevel {
    Campaign = 1,
    Concept = 2,
    Variant = 3,
    Detailed = 4,
    Exact = 5,
}

impl AggregationLevel {
    pub fn from_u8(level: u8) -> Result<Self, EngineError> {
        match level {
            1 => Ok(Self::Campaign),
            2 => Ok(Self::Concept),
            3 => Ok(Self::Variant),
            4 => Ok(Self::Detailed),
            5 => Ok(Self::Exact),
            other => Err(EngineError::InvalidLevel(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for AggregationLevel {
    type Error = EngineError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::from_u8(level)
    }
}

impl From<AggregationLevel> for u8 {
    fn from(level: AggregationLevel) -> u8 {
        level.as_u8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip() {
        for n in 1..=5u8 {
            assert_eq!(AggregationLevel::from_u8(n).unwrap().as_u8(), n);
        }
    }

    #[test]
    fn test_level_out_of_range() {
        assert!(AggregationLevel::from_u8(0).is_err());
        assert!(AggregationLevel::from_u8(6).is_err());
    }

    #[test]
    fn test_level_deserializes_from_integer() {
        let level: AggregationLevel = serde_json::from_str("3").unwrap();
        assert_eq!(level, AggregationLevel::Variant);
        assert!(serde_json::from_str::<AggregationLevel>("9").is_err());
    }
}
