//! Ad copy extraction
//!
//! Derives a representative, displayable copy text for each record. The
//! priority chain: literal copy from the structured creative metadata,
//! then copy-style inference from the ad name, then quoted text embedded
//! in the name, then a segment-based fallback. The result is never empty
//! and is wrapped to at most three lines.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::engine::patterns::{split_segments, PatternEngine};
use crate::engine::{AggregationLevel, PerformanceRecord};

/// Structured-metadata accepts require more than this many characters, to
/// filter out near-empty placeholders.
const MIN_SPEC_TEXT_LEN: usize = 10;

/// Quoted runs in the display name must be at least this long.
const MIN_QUOTED_LEN: usize = 20;

/// Single-line copy longer than this gets wrapped.
const MAX_SINGLE_LINE: usize = 120;

/// Two joined sentences must stay under this to keep both.
const MAX_TWO_SENTENCES: usize = 150;

const WRAP_WIDTH: usize = 50;
const MAX_LINES: usize = 3;

/// Known sub-paths of the creative metadata blob that carry literal copy,
/// probed in order.
const SPEC_TEXT_PATHS: &[&[&str]] = &[
    &["message"],
    &["object_story_spec", "link_data", "message"],
    &["object_story_spec", "link_data", "description"],
    &["object_story_spec", "video_data", "message"],
    &["object_story_spec", "photo_data", "message"],
    &["object_story_spec", "text_data", "message"],
    &["object_story_spec", "template_data", "message"],
    &["object_story_spec", "link_data", "call_to_action", "value", "label"],
];

/// How a matched copy-style rule produces text.
#[derive(Debug, Clone)]
pub enum CopyKind {
    /// Use the rule's first capture group verbatim.
    Verbatim,
    /// Render a fixed sentence, substituting `{product}` with the product
    /// name inferred from the display name.
    Template(String),
}

/// One entry in the ordered copy-style table. First match wins.
#[derive(Debug, Clone)]
pub struct CopyRule {
    pub style: String,
    pub pattern: Regex,
    pub kind: CopyKind,
}

impl CopyRule {
    pub fn new(style: &str, pattern: &str, kind: CopyKind) -> Result<Self, regex::Error> {
        Ok(Self {
            style: style.to_string(),
            pattern: Regex::new(pattern)?,
            kind,
        })
    }
}

/// Copy-extraction engine with a replaceable style table.
pub struct CopyEngine {
    rules: Vec<CopyRule>,
}

impl Default for CopyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyEngine {
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    pub fn with_rules(rules: Vec<CopyRule>) -> Self {
        Self { rules }
    }

    /// Extract representative copy for a record. Never returns an empty
    /// string; output is at most three lines.
    pub fn extract(&self, record: &PerformanceRecord, patterns: &PatternEngine) -> String {
        let text = self
            .spec_copy(record)
            .or_else(|| self.style_copy(&record.display_name))
            .or_else(|| quoted_copy(&record.display_name))
            .unwrap_or_else(|| self.segment_copy(&record.display_name, patterns));
        format_copy(&text)
    }

    /// First sufficiently long text field in the structured metadata.
    fn spec_copy(&self, record: &PerformanceRecord) -> Option<String> {
        let spec = record.creative_spec.as_ref()?;
        SPEC_TEXT_PATHS.iter().find_map(|path| {
            let text = lookup_str(spec, path)?.trim();
            (text.chars().count() > MIN_SPEC_TEXT_LEN).then(|| text.to_string())
        })
    }

    /// Copy-type inference from the display name via the style table.
    fn style_copy(&self, display_name: &str) -> Option<String> {
        for rule in &self.rules {
            let Some(captures) = rule.pattern.captures(display_name) else {
                continue;
            };
            match &rule.kind {
                CopyKind::Verbatim => {
                    let remainder = captures.get(1)?.as_str().trim();
                    if !remainder.is_empty() {
                        return Some(remainder.to_string());
                    }
                }
                CopyKind::Template(template) => {
                    let product = product_name(display_name);
                    return Some(template.replace("{product}", &product));
                }
            }
        }
        None
    }

    /// Last resort: build a sentence from the most meaningful name segment.
    fn segment_copy(&self, display_name: &str, patterns: &PatternEngine) -> String {
        let discovered = patterns.discover(display_name, AggregationLevel::Variant);
        let segment = discovered.segments.iter().find(|segment| {
            segment.chars().count() > 3
                && !segment.chars().all(|c| c.is_ascii_digit())
                && !is_media_type_token(segment)
        });
        match segment {
            Some(segment) => format!("Creative variation highlighting {segment}."),
            None => "Ad copy unavailable for this creative.".to_string(),
        }
    }
}

/// Built-in copy-style table. Named styles come before the custom `Copy:`
/// rule so labelled concepts win over raw remainders.
fn builtin_rules() -> Vec<CopyRule> {
    let template = |s: &str| CopyKind::Template(s.to_string());
    [
        (
            "Emotional Strength Approach",
            r"(?i)emotional[\s_-]*strength",
            template("An emotional look at the strength {product} brings to everyday life."),
        ),
        (
            "Little Moments Focus",
            r"(?i)little[\s_-]*moments?",
            template("Celebrating the little moments that matter with {product}."),
        ),
        (
            "Testimonial-Driven",
            r"(?i)testimonial",
            template("Testimonials from real customers on why they chose {product}."),
        ),
        (
            "Product-Focused",
            r"(?i)product[\s_-]*(?:focus(?:ed)?|shot)",
            template("A closer look at what makes {product} different."),
        ),
        (
            "Benefit-Led",
            r"(?i)\bbenefits?\b",
            template("The everyday benefits of choosing {product}."),
        ),
        (
            "Offer-Led",
            r"(?i)(?:\boffer\b|%\s*off|\bdiscount\b|\bsale\b)",
            template("A limited-time offer on {product}."),
        ),
        (
            "Lifestyle Snapshot",
            r"(?i)lifestyle",
            template("Everyday lifestyle moments made better with {product}."),
        ),
        ("Custom Copy", r"(?i)copy:\s*(.+)$", CopyKind::Verbatim),
    ]
    .into_iter()
    .map(|(style, pattern, kind)| {
        CopyRule::new(style, pattern, kind).expect("built-in pattern compiles")
    })
    .collect()
}

/// Text before the first separator in the display name.
fn product_name(display_name: &str) -> String {
    split_segments(display_name.trim())
        .into_iter()
        .next()
        .unwrap_or_else(|| display_name.trim().to_string())
}

/// Double-quoted run of at least [`MIN_QUOTED_LEN`] characters.
fn quoted_copy(display_name: &str) -> Option<String> {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    let re = QUOTED.get_or_init(|| {
        Regex::new(&format!(r#""([^"]{{{MIN_QUOTED_LEN},}})""#))
            .expect("built-in pattern compiles")
    });
    re.captures(display_name)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
        .filter(|text| !text.is_empty())
        .map(String::from)
}

fn is_media_type_token(segment: &str) -> bool {
    matches!(
        segment.to_ascii_uppercase().as_str(),
        "VID" | "IMG" | "GIF"
    )
}

fn lookup_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str()
}

/// Wrap copy to at most three displayable lines.
fn format_copy(text: &str) -> String {
    if text.contains('\n') {
        return text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(MAX_LINES)
            .collect::<Vec<_>>()
            .join("\n");
    }

    if text.chars().count() <= MAX_SINGLE_LINE {
        return text.to_string();
    }

    let sentences = split_sentences(text);
    if sentences.len() > 1 {
        let two = format!("{} {}", sentences[0], sentences[1]);
        if two.chars().count() < MAX_TWO_SENTENCES {
            return format!("{}\n{}", sentences[0], sentences[1]);
        }
        return sentences[0].clone();
    }

    word_wrap(text, WRAP_WIDTH, MAX_LINES)
}

/// Split into sentences at `.`/`!`/`?` boundaries followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?')
            && chars.peek().map_or(true, |next| next.is_whitespace())
        {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Greedy word wrap; the last permitted line absorbs the remainder.
fn word_wrap(text: &str, width: usize, max_lines: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let fits = current.is_empty() || current.chars().count() + 1 + word.chars().count() <= width;
        if fits || lines.len() + 1 == max_lines {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.truncate(max_lines);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RawRecord;
    use serde_json::json;

    fn record_named(name: &str) -> PerformanceRecord {
        PerformanceRecord::from_raw(RawRecord {
            display_name: Some(name.to_string()),
            ..RawRecord::default()
        })
    }

    fn extract(record: &PerformanceRecord) -> String {
        CopyEngine::new().extract(record, &PatternEngine::new())
    }

    #[test]
    fn test_spec_copy_wins_over_name() {
        let mut record = record_named("BrandY_Copy Emotional Strength Approach_v2");
        record.creative_spec = Some(json!({
            "object_story_spec": {
                "link_data": { "message": "Made for mornings that start too early." }
            }
        }));
        assert_eq!(extract(&record), "Made for mornings that start too early.");
    }

    #[test]
    fn test_short_spec_text_is_skipped() {
        let mut record = record_named("BrandY_Testimonial_v1");
        record.creative_spec = Some(json!({ "message": "Shop now" }));
        let copy = extract(&record);
        assert!(copy.to_lowercase().contains("testimonial"));
    }

    #[test]
    fn test_emotional_strength_references_product() {
        let record = record_named("BrandY_Copy Emotional Strength Approach_v2");
        let copy = extract(&record);
        assert!(copy.contains("emotional"), "copy was: {copy}");
        assert!(copy.contains("BrandY"), "copy was: {copy}");
    }

    #[test]
    fn test_custom_copy_rule_uses_remainder_verbatim() {
        let record = record_named("BrandY | Copy: Three out of four parents pick us twice");
        assert_eq!(
            extract(&record),
            "Three out of four parents pick us twice"
        );
    }

    #[test]
    fn test_quoted_text_used_verbatim() {
        let record = record_named(r#"XQ99 "The only jacket you will ever need to own""#);
        assert_eq!(extract(&record), "The only jacket you will ever need to own");
    }

    #[test]
    fn test_short_quote_falls_through() {
        let record = record_named(r#"XQ99 "Great coat" extended"#);
        let copy = extract(&record);
        assert_ne!(copy, "Great coat");
        assert!(!copy.is_empty());
    }

    #[test]
    fn test_segment_fallback_skips_media_tokens() {
        let record = record_named("VID | 123 | WinterJackets");
        let copy = extract(&record);
        assert!(copy.contains("WinterJackets"), "copy was: {copy}");
    }

    #[test]
    fn test_generic_fallback_is_never_empty() {
        let record = record_named("");
        assert!(!extract(&record).is_empty());
    }

    #[test]
    fn test_multiline_spec_copy_keeps_three_lines() {
        let mut record = record_named("BrandY");
        record.creative_spec = Some(json!({
            "message": "First line of copy here.\n\nSecond line.\nThird line.\nFourth line."
        }));
        let copy = extract(&record);
        assert_eq!(
            copy,
            "First line of copy here.\nSecond line.\nThird line."
        );
    }

    #[test]
    fn test_long_copy_splits_at_sentence_boundary() {
        let mut record = record_named("BrandY");
        let first = "This winter jacket was tested in the coldest towns above the arctic circle by the people who actually live and work there.";
        let second = "It held up.";
        record.creative_spec = Some(json!({ "message": format!("{first} {second}") }));
        assert_eq!(extract(&record), format!("{first}\n{second}"));
    }

    #[test]
    fn test_unbroken_long_copy_word_wraps() {
        let mut record = record_named("BrandY");
        let words = "warm light tough quiet bold fresh clean smart fast calm deep wide soft keen pure brave vivid crisp solid sound sturdy gentle rugged sleek simple honest modern";
        record.creative_spec = Some(json!({ "message": words }));
        let copy = extract(&record);
        assert!(copy.lines().count() <= 3);
        assert!(!copy.is_empty());
    }

    #[test]
    fn test_copy_is_at_most_three_lines() {
        for name in [
            "BrandY_Copy Emotional Strength Approach_v2",
            "A_B_C_D_E_F_G",
            "Plain",
        ] {
            let copy = extract(&record_named(name));
            assert!(copy.lines().count() <= 3, "name {name} gave {copy}");
        }
    }
}
