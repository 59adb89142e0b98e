//! Ad-name pattern discovery
//!
//! Decomposes free-text ad display names into semantic segments and derives
//! a deterministic group key for a requested aggregation level. The shape of
//! the algorithm is fixed (separator detection, technical-token filtering,
//! level-bounded segment retention, a level-5 exactness shortcut); the
//! technical-token vocabulary is an ordered rule table and can be replaced
//! per deployment, since ad-naming conventions vary by organization.

use regex::Regex;
use std::sync::OnceLock;

use crate::engine::AggregationLevel;

/// Group key used when the display name is empty.
pub const UNKNOWN_KEY: &str = "unknown";

/// Candidate separators, highest priority first.
const SEPARATORS: [&str; 6] = ["|", " | ", "_", "-", "  ", " "];

/// Outcome of decomposing a display name at a given level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPattern {
    /// Opaque cluster identifier. Identical `(name, level)` inputs always
    /// produce the identical key.
    pub group_key: String,
    /// Segments retained for the key (all raw segments at level 5).
    pub segments: Vec<String>,
    /// True only for level-5 results.
    pub is_exact: bool,
}

/// Where a technical-token rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Unambiguous machine noise, dropped at every level.
    Always,
    /// Dropped only under the broad filter (levels 1-3), and only past the
    /// leading segments protected at that level.
    BroadOnly,
}

/// One entry in the technical-token vocabulary.
#[derive(Debug, Clone)]
pub struct TokenRule {
    pub name: String,
    pub pattern: Regex,
    pub scope: RuleScope,
}

impl TokenRule {
    pub fn new(name: &str, pattern: &str, scope: RuleScope) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.to_string(),
            pattern: Regex::new(pattern)?,
            scope,
        })
    }
}

/// Pattern-discovery engine with a replaceable technical vocabulary.
pub struct PatternEngine {
    rules: Vec<TokenRule>,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternEngine {
    /// Engine with the built-in technical vocabulary.
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    /// Engine with a caller-supplied vocabulary, e.g. loaded from config.
    pub fn with_rules(rules: Vec<TokenRule>) -> Self {
        Self { rules }
    }

    /// Derive the group key and retained segments for `display_name`.
    pub fn discover(&self, display_name: &str, level: AggregationLevel) -> DiscoveredPattern {
        let name = display_name.trim();
        if name.is_empty() {
            return DiscoveredPattern {
                group_key: UNKNOWN_KEY.to_string(),
                segments: Vec::new(),
                is_exact: level == AggregationLevel::Exact,
            };
        }

        let raw_segments = split_segments(name);

        if level == AggregationLevel::Exact {
            // One group per distinct underlying creative: a trailing long
            // numeric ID identifies renamed variants of the same creative,
            // otherwise the verbatim name keeps distinct creatives apart.
            let group_key = match trailing_creative_id(name) {
                Some(id) => format!("exact_{id}"),
                None => format!("exact_{name}"),
            };
            return DiscoveredPattern {
                group_key,
                segments: raw_segments,
                is_exact: true,
            };
        }

        let level_n = level.as_u8() as usize;
        let narrow_only = level_n >= 4;

        let mut filtered: Vec<String> = Vec::with_capacity(raw_segments.len());
        for (idx, segment) in raw_segments.iter().enumerate() {
            let drop = if narrow_only || idx < level_n {
                // Leading segments usually carry the product/campaign name;
                // only unambiguous machine noise is dropped there.
                self.matches_scope(segment, RuleScope::Always)
            } else {
                self.matches_any(segment)
            };
            if !drop {
                filtered.push(segment.clone());
            }
        }

        if filtered.is_empty() {
            // Everything looked technical; keep the first raw segment so the
            // key stays meaningful rather than collapsing to nothing.
            filtered.extend(raw_segments.first().cloned());
        }

        let retained: Vec<String> = filtered.into_iter().take(level_n.max(2)).collect();

        DiscoveredPattern {
            group_key: retained.join(" | "),
            segments: retained,
            is_exact: false,
        }
    }

    fn matches_scope(&self, segment: &str, scope: RuleScope) -> bool {
        self.rules
            .iter()
            .filter(|r| r.scope == scope)
            .any(|r| r.pattern.is_match(segment))
    }

    fn matches_any(&self, segment: &str) -> bool {
        self.rules.iter().any(|r| r.pattern.is_match(segment))
    }
}

/// Built-in technical-token vocabulary.
fn builtin_rules() -> Vec<TokenRule> {
    [
        ("long-numeric-id", r"^\d{10,}$", RuleScope::Always),
        ("account-id", r"^act_\d+$", RuleScope::Always),
        ("pixel-dimensions", r"^\d{2,4}x\d{2,4}$", RuleScope::Always),
        (
            "date-token",
            r"^(?:20\d{2}|\d{2})[-_.]?(?:0[1-9]|1[0-2])(?:[-_.]?[0-3]\d)?$",
            RuleScope::BroadOnly,
        ),
        ("homepage", r"(?i)^homepage$", RuleScope::BroadOnly),
        ("label-prefix", r"(?i)^(?:lp|copy):", RuleScope::BroadOnly),
        ("version-token", r"(?i)^v\d+$", RuleScope::BroadOnly),
    ]
    .into_iter()
    .map(|(name, pattern, scope)| {
        TokenRule::new(name, pattern, scope).expect("built-in pattern compiles")
    })
    .collect()
}

/// Split a name on the first matching separator, falling back to camel-case
/// boundaries, then to the whole name as one segment.
pub fn split_segments(name: &str) -> Vec<String> {
    for separator in SEPARATORS {
        if name.contains(separator) {
            let segments: Vec<String> = name
                .split(separator)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !segments.is_empty() {
                return segments;
            }
        }
    }

    let camel = split_camel(name);
    if camel.len() > 1 {
        return camel;
    }

    vec![name.to_string()]
}

/// Break before each internal uppercase letter that follows a lowercase one.
fn split_camel(name: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for ch in name.chars() {
        if ch.is_uppercase() && previous_lower && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        current.push(ch);
        previous_lower = ch.is_lowercase();
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Trailing run of 10+ digits, optionally followed by a dash-prefixed
/// uppercase suffix, anchored at the end of the name.
pub fn trailing_creative_id(name: &str) -> Option<&str> {
    static CREATIVE_ID: OnceLock<Regex> = OnceLock::new();
    let re = CREATIVE_ID.get_or_init(|| {
        Regex::new(r"(\d{10,})(?:-[A-Z#-]+)?$").expect("built-in pattern compiles")
    });
    re.captures(name)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}
