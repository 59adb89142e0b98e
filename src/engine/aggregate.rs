//! Record grouping and metric derivation
//!
//! Groups performance records either by discovered name pattern (Creative
//! mode) or by classified copy text (Copy mode), sums the raw counters per
//! group, and derives the ratio metrics. Every division is guarded: a zero
//! denominator yields `0.0`, never NaN or infinity, so downstream consumers
//! can render any row without checking.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::engine::benchmarks::MetricId;
use crate::engine::copy::CopyEngine;
use crate::engine::patterns::PatternEngine;
use crate::engine::{AggregationLevel, PerformanceRecord};

/// How records are clustered into rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    /// Group by the name-derived key at the requested level.
    Creative,
    /// Group by copy-content classification.
    Copy,
}

/// Named copy buckets for Copy mode, matched by substring in order.
const COPY_BUCKETS: [(&str, &str); 8] = [
    ("emotional", "emotional_strength"),
    ("little moment", "little_moments"),
    ("testimonial", "testimonial"),
    ("what makes", "product_focused"),
    ("benefit", "benefit_led"),
    ("offer", "offer_promo"),
    ("% off", "offer_promo"),
    ("lifestyle", "lifestyle"),
];

/// Maximum length of the normalized prefix used for catch-all bucket keys.
const CATCH_ALL_PREFIX_LEN: usize = 40;

/// Ratio metrics derived from a group's summed counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Click-through rate, percent.
    pub ctr: f64,
    /// Cost per click.
    pub cpc: f64,
    /// Cost per thousand impressions.
    pub cpm: f64,
    pub cost_per_purchase: f64,
    /// Return on ad spend.
    pub roas: f64,
    /// Purchases per click, percent.
    pub conversion_rate: f64,
}

impl Metrics {
    /// Derive all ratios from summed counters, zero-guarding every division.
    pub fn derive(
        impressions: u64,
        clicks: u64,
        spend: f64,
        purchases: u64,
        revenue: f64,
    ) -> Self {
        Self {
            ctr: ratio(clicks as f64, impressions as f64) * 100.0,
            cpc: ratio(spend, clicks as f64),
            cpm: ratio(spend, impressions as f64) * 1000.0,
            cost_per_purchase: ratio(spend, purchases as f64),
            roas: if spend > 0.0 && revenue > 0.0 {
                revenue / spend
            } else {
                0.0
            },
            conversion_rate: if clicks > 0 && purchases > 0 {
                purchases as f64 / clicks as f64 * 100.0
            } else {
                0.0
            },
        }
    }

    pub fn get(&self, metric: MetricId) -> f64 {
        match metric {
            MetricId::Ctr => self.ctr,
            MetricId::Cpc => self.cpc,
            MetricId::Cpm => self.cpm,
            MetricId::CostPerPurchase => self.cost_per_purchase,
            MetricId::Roas => self.roas,
            MetricId::ConversionRate => self.conversion_rate,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// One presentation-ready aggregate row. Constructed fresh per aggregation
/// call and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRow {
    pub group_key: String,
    /// First-seen record's name, shown as the row title.
    pub display_name: String,
    pub extracted_copy: String,
    pub ad_ids: Vec<String>,
    pub adset_count: usize,
    pub creative_count: usize,
    /// First non-empty thumbnail across the group.
    pub thumbnail_url: Option<String>,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub purchases: u64,
    pub revenue: f64,
    pub metrics: Metrics,
}

/// Working accumulator for one group.
struct GroupAccumulator {
    group_key: String,
    display_name: String,
    extracted_copy: String,
    ad_ids: Vec<String>,
    seen_ad_ids: HashSet<String>,
    adset_names: HashSet<String>,
    creative_ids: HashSet<String>,
    thumbnail_url: Option<String>,
    impressions: u64,
    clicks: u64,
    spend: f64,
    purchases: u64,
    revenue: f64,
}

impl GroupAccumulator {
    fn new(group_key: String, display_name: String, extracted_copy: String) -> Self {
        Self {
            group_key,
            display_name,
            extracted_copy,
            ad_ids: Vec::new(),
            seen_ad_ids: HashSet::new(),
            adset_names: HashSet::new(),
            creative_ids: HashSet::new(),
            thumbnail_url: None,
            impressions: 0,
            clicks: 0,
            spend: 0.0,
            purchases: 0,
            revenue: 0.0,
        }
    }

    fn absorb(&mut self, record: &PerformanceRecord) {
        if !record.ad_id.is_empty() && self.seen_ad_ids.insert(record.ad_id.clone()) {
            self.ad_ids.push(record.ad_id.clone());
        }
        if let Some(adset) = &record.adset_name {
            self.adset_names.insert(adset.clone());
        }
        if let Some(creative) = &record.creative_id {
            self.creative_ids.insert(creative.clone());
        }
        if self.thumbnail_url.is_none() {
            self.thumbnail_url = record.thumbnail_url.clone();
        }
        self.impressions += record.impressions;
        self.clicks += record.clicks;
        self.spend += record.spend;
        self.purchases += record.purchases;
        self.revenue += record.revenue;
    }

    fn finish(self) -> AggregateRow {
        let metrics = Metrics::derive(
            self.impressions,
            self.clicks,
            self.spend,
            self.purchases,
            self.revenue,
        );
        AggregateRow {
            group_key: self.group_key,
            display_name: self.display_name,
            extracted_copy: self.extracted_copy,
            ad_ids: self.ad_ids,
            adset_count: self.adset_names.len(),
            // A group always represents at least one creative even when the
            // upstream export carries no creative ids.
            creative_count: self.creative_ids.len().max(1),
            thumbnail_url: self.thumbnail_url,
            impressions: self.impressions,
            clicks: self.clicks,
            spend: self.spend,
            purchases: self.purchases,
            revenue: self.revenue,
            metrics,
        }
    }
}

/// Aggregate records into presentation-ready rows.
///
/// Rows come back in first-seen group order, so identical inputs produce
/// identical outputs.
pub fn aggregate(
    records: &[PerformanceRecord],
    level: AggregationLevel,
    mode: GroupMode,
    patterns: &PatternEngine,
    copy_engine: &CopyEngine,
) -> Vec<AggregateRow> {
    let mut order: Vec<GroupAccumulator> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let extracted_copy = copy_engine.extract(record, patterns);
        let group_key = match mode {
            GroupMode::Creative => creative_key(record, level, patterns),
            GroupMode::Copy => copy_bucket(&extracted_copy),
        };

        let slot = *index.entry(group_key.clone()).or_insert_with(|| {
            order.push(GroupAccumulator::new(
                group_key,
                record.display_name.clone(),
                extracted_copy.clone(),
            ));
            order.len() - 1
        });
        order[slot].absorb(record);
    }

    order.into_iter().map(GroupAccumulator::finish).collect()
}

/// Group key for Creative mode. An upstream pre-computed campaign group key
/// takes precedence at level 1.
fn creative_key(
    record: &PerformanceRecord,
    level: AggregationLevel,
    patterns: &PatternEngine,
) -> String {
    if level == AggregationLevel::Campaign {
        if let Some(group) = &record.campaign_group {
            return group.clone();
        }
    }
    patterns.discover(&record.display_name, level).group_key
}

/// Classify extracted copy into one of the named buckets, or a catch-all
/// keyed by a normalized prefix of the copy itself.
fn copy_bucket(copy: &str) -> String {
    let lowered = copy.to_lowercase();
    for (needle, bucket) in COPY_BUCKETS {
        if lowered.contains(needle) {
            return bucket.to_string();
        }
    }
    format!("other_{}", normalized_prefix(&lowered))
}

fn normalized_prefix(text: &str) -> String {
    let mut prefix: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    prefix.truncate(CATCH_ALL_PREFIX_LEN);
    prefix
}
