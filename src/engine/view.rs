//! Row filtering and sorting
//!
//! The last pipeline stage before presentation: a case-insensitive substring
//! filter over name and copy, then a stable typed sort. Ties keep input
//! order so repeated calls with the same parameters reproduce the same view.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::engine::aggregate::AggregateRow;

/// Sortable column of an [`AggregateRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Copy,
    Impressions,
    Clicks,
    Spend,
    Purchases,
    Revenue,
    Ctr,
    Cpc,
    Cpm,
    CostPerPurchase,
    Roas,
    ConversionRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "copy" => Ok(SortKey::Copy),
            "impressions" => Ok(SortKey::Impressions),
            "clicks" => Ok(SortKey::Clicks),
            "spend" => Ok(SortKey::Spend),
            "purchases" => Ok(SortKey::Purchases),
            "revenue" => Ok(SortKey::Revenue),
            "ctr" => Ok(SortKey::Ctr),
            "cpc" => Ok(SortKey::Cpc),
            "cpm" => Ok(SortKey::Cpm),
            "cost_per_purchase" => Ok(SortKey::CostPerPurchase),
            "roas" => Ok(SortKey::Roas),
            "conversion_rate" => Ok(SortKey::ConversionRate),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}

impl FromStr for SortDir {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// View parameters, typically deserialized straight from a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewOptions {
    /// Substring filter over display name and extracted copy; empty passes
    /// every row.
    #[serde(default)]
    pub query: String,
    #[serde(default = "ViewOptions::default_sort_key")]
    pub sort_key: SortKey,
    #[serde(default = "ViewOptions::default_sort_dir")]
    pub sort_dir: SortDir,
}

impl ViewOptions {
    fn default_sort_key() -> SortKey {
        SortKey::Spend
    }

    fn default_sort_dir() -> SortDir {
        SortDir::Desc
    }
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort_key: Self::default_sort_key(),
            sort_dir: Self::default_sort_dir(),
        }
    }
}

/// Filter and sort rows for presentation. Stable and pure: re-applying the
/// same options to its own output changes nothing.
pub fn apply_view(rows: Vec<AggregateRow>, options: &ViewOptions) -> Vec<AggregateRow> {
    let query = options.query.trim().to_lowercase();
    let mut filtered: Vec<AggregateRow> = if query.is_empty() {
        rows
    } else {
        rows.into_iter()
            .filter(|row| {
                row.display_name.to_lowercase().contains(&query)
                    || row.extracted_copy.to_lowercase().contains(&query)
            })
            .collect()
    };

    filtered.sort_by(|a, b| {
        let ordering = compare(a, b, options.sort_key);
        match options.sort_dir {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    });
    filtered
}

fn compare(a: &AggregateRow, b: &AggregateRow, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a
            .display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase()),
        SortKey::Copy => a
            .extracted_copy
            .to_lowercase()
            .cmp(&b.extracted_copy.to_lowercase()),
        SortKey::Impressions => a.impressions.cmp(&b.impressions),
        SortKey::Clicks => a.clicks.cmp(&b.clicks),
        SortKey::Spend => compare_f64(a.spend, b.spend),
        SortKey::Purchases => a.purchases.cmp(&b.purchases),
        SortKey::Revenue => compare_f64(a.revenue, b.revenue),
        SortKey::Ctr => compare_f64(a.metrics.ctr, b.metrics.ctr),
        SortKey::Cpc => compare_f64(a.metrics.cpc, b.metrics.cpc),
        SortKey::Cpm => compare_f64(a.metrics.cpm, b.metrics.cpm),
        SortKey::CostPerPurchase => {
            compare_f64(a.metrics.cost_per_purchase, b.metrics.cost_per_purchase)
        }
        SortKey::Roas => compare_f64(a.metrics.roas, b.metrics.roas),
        SortKey::ConversionRate => {
            compare_f64(a.metrics.conversion_rate, b.metrics.conversion_rate)
        }
    }
}

/// Metric values are guaranteed finite, so equal-fallback only covers the
/// impossible comparison.
fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregate::Metrics;

    fn row(name: &str, copy: &str, spend: f64, roas: f64) -> AggregateRow {
        AggregateRow {
            group_key: name.to_string(),
            display_name: name.to_string(),
            extracted_copy: copy.to_string(),
            ad_ids: vec![],
            adset_count: 0,
            creative_count: 1,
            thumbnail_url: None,
            impressions: 0,
            clicks: 0,
            spend,
            purchases: 0,
            revenue: 0.0,
            metrics: Metrics {
                roas,
                ..Metrics::default()
            },
        }
    }

    fn options(query: &str, sort_key: SortKey, sort_dir: SortDir) -> ViewOptions {
        ViewOptions {
            query: query.to_string(),
            sort_key,
            sort_dir,
        }
    }

    #[test]
    fn test_empty_query_passes_all() {
        let rows = vec![row("A", "", 1.0, 0.0), row("B", "", 2.0, 0.0)];
        let viewed = apply_view(rows, &ViewOptions::default());
        assert_eq!(viewed.len(), 2);
    }

    #[test]
    fn test_filter_matches_name_or_copy() {
        let rows = vec![
            row("Winter Jacket", "warm and light", 1.0, 0.0),
            row("Summer Hat", "keeps the sun off", 2.0, 0.0),
            row("Gloves", "WINTER ready hands", 3.0, 0.0),
        ];
        let viewed = apply_view(rows, &options("winter", SortKey::Name, SortDir::Asc));
        assert_eq!(viewed.len(), 2);
        assert_eq!(viewed[0].display_name, "Gloves");
        assert_eq!(viewed[1].display_name, "Winter Jacket");
    }

    #[test]
    fn test_numeric_sort_desc() {
        let rows = vec![
            row("A", "", 1.0, 0.5),
            row("B", "", 2.0, 2.5),
            row("C", "", 3.0, 1.5),
        ];
        let viewed = apply_view(rows, &options("", SortKey::Roas, SortDir::Desc));
        let names: Vec<&str> = viewed.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let rows = vec![
            row("first", "", 5.0, 0.0),
            row("second", "", 5.0, 0.0),
            row("third", "", 5.0, 0.0),
        ];
        for dir in [SortDir::Asc, SortDir::Desc] {
            let viewed = apply_view(rows.clone(), &options("", SortKey::Spend, dir));
            let names: Vec<&str> = viewed.iter().map(|r| r.display_name.as_str()).collect();
            assert_eq!(names, vec!["first", "second", "third"]);
        }
    }

    #[test]
    fn test_view_is_idempotent() {
        let rows = vec![
            row("B", "x", 2.0, 1.0),
            row("A", "y", 1.0, 2.0),
            row("C", "z", 3.0, 0.5),
        ];
        let opts = options("", SortKey::Spend, SortDir::Desc);
        let once = apply_view(rows, &opts);
        let twice = apply_view(once.clone(), &opts);
        let names =
            |rows: &[AggregateRow]| rows.iter().map(|r| r.display_name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&once), names(&twice));
    }
}
