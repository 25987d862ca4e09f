use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, instrument, trace};

use super::Candidate;

const FALLBACK_SELECTOR: &str = "unknown";
const MAX_PREVIEW_CHARS: usize = 80;

/// `N. [Score: S |] selector [| trailing text]`
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\s*(?:Score:\s*(\d+)\s*\|?\s*)?(.+?)(?:\s*\||\s*$)")
        .expect("header pattern is valid")
});

/// Shape detected for a raw diagnostic report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// JSON array or object of candidate records.
    Structured,
    /// Console text with numbered header lines.
    Lines,
}

impl ReportFormat {
    pub fn detect(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            Self::Structured
        } else {
            Self::Lines
        }
    }
}

/// Parse a diagnostic report into candidates, in report order.
///
/// Structured input that fails to decode falls back to line parsing, so this
/// never fails; unusable input yields an empty list.
#[instrument(name = "parse_report", skip(raw), fields(input_len = raw.len()))]
pub fn parse_report(raw: &str) -> Vec<Candidate> {
    if ReportFormat::detect(raw) == ReportFormat::Structured {
        match parse_structured(raw.trim()) {
            Ok(candidates) => {
                debug!(count = candidates.len(), "parsed structured report");
                return candidates;
            }
            Err(err) => debug!(error = %err, "not a structured report, trying line format"),
        }
    }
    let candidates = parse_lines(raw);
    debug!(count = candidates.len(), "parsed line report");
    candidates
}

fn parse_structured(trimmed: &str) -> Result<Vec<Candidate>, serde_json::Error> {
    let value: Value = serde_json::from_str(trimmed)?;
    let records = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let empty = Map::new();
    Ok(records
        .iter()
        .map(|record| candidate_from_record(record.as_object().unwrap_or(&empty)))
        .collect())
}

fn candidate_from_record(record: &Map<String, Value>) -> Candidate {
    let mut details = Vec::new();

    if let Some(value) = record.get("childCount") {
        details.push(format!("Children: {}", display_value(value)));
    }
    if let Some(value) = record.get("textLength") {
        details.push(format!("Text length: {} chars", display_value(value)));
    }
    if let Some(value) = record.get("hasImages") {
        details.push(format!("Images: {}", display_value(value)));
    }
    if let Some(value) = record.get("radioCount") {
        details.push(format!("Radio buttons: {}", display_value(value)));
    }
    if let Some(value) = record.get("inputCount") {
        details.push(format!("Inputs: {}", display_value(value)));
    }
    if let Some(value) = record.get("foundCount") {
        details.push(format!("Fields found: {}", display_value(value)));
    }
    if let Some(value) = record.get("amount") {
        let currencies = record
            .get("currencies")
            .and_then(Value::as_array)
            .map(|codes| codes.iter().map(display_value).collect::<Vec<_>>().join(","))
            .unwrap_or_default();
        details.push(format!("Amount: {} {}", display_value(value), currencies));
    }
    if let Some(preview) = record
        .get("preview")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
    {
        let clipped: String = preview.chars().take(MAX_PREVIEW_CHARS).collect();
        details.push(format!("Preview: \"{clipped}...\""));
    }
    if let Some(fields) = record.get("fields").and_then(Value::as_array) {
        let labels: Vec<_> = fields.iter().map(display_value).collect();
        details.push(format!("Fields: {}", labels.join(", ")));
    }

    Candidate {
        selector: selector_of(record),
        score: score_of(record),
        details,
    }
}

fn score_of(record: &Map<String, Value>) -> i64 {
    match record.get("score") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

fn selector_of(record: &Map<String, Value>) -> String {
    match record.get("selector") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(value @ Value::Number(_)) => display_value(value),
        _ => FALLBACK_SELECTOR.to_string(),
    }
}

/// Render a JSON value the way it reads in a console line: bare strings,
/// integral floats without a fractional part.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn parse_lines(raw: &str) -> Vec<Candidate> {
    let mut results = Vec::new();
    let mut current: Option<Candidate> = None;

    for line in raw.lines().map(str::trim) {
        if let Some(caps) = HEADER_RE.captures(line) {
            if let Some(done) = current.take() {
                results.push(done);
            }
            let score: i64 = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or_default();
            let selector = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            trace!(score, selector, "candidate header");
            current = Some(Candidate::new(selector, score, Vec::new()));
        } else if let Some(candidate) = current.as_mut() {
            if !line.is_empty() && !line.starts_with("===") && !line.starts_with("---") {
                candidate.details.push(line.to_string());
            }
        }
    }

    results.extend(current);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    const CART_REPORT: &str = "=== CART ITEMS DIAGNOSTIC ===
1. Score: 42 | .cart-items
   Children: 5 | Images: 3
---
2. Score: 18 | #mini-cart
   Children: 1 | Images: 0
---
";

    #[test]
    fn parses_single_json_object() {
        let candidates = parse_report(r#"{"score":42,"selector":".foo","childCount":5}"#);
        assert_eq!(
            candidates,
            vec![Candidate::new(".foo", 42, vec!["Children: 5".into()])]
        );
    }

    #[test]
    fn parses_console_text() {
        let candidates = parse_report(CART_REPORT);
        assert_eq!(
            candidates,
            vec![
                Candidate::new(".cart-items", 42, vec!["Children: 5 | Images: 3".into()]),
                Candidate::new("#mini-cart", 18, vec!["Children: 1 | Images: 0".into()]),
            ]
        );
    }

    #[test]
    fn malformed_json_falls_back_to_lines() {
        let raw = "[not json\n1. Score: 12 | .basket\n   Inputs: 3";
        let candidates = parse_report(raw);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].selector, ".basket");
        assert_eq!(candidates[0].score, 12);
        assert_eq!(candidates[0].details, vec!["Inputs: 3".to_string()]);
    }

    #[test]
    fn malformed_json_without_headers_yields_nothing() {
        assert!(parse_report("[{\"score\": 4").is_empty());
        assert!(parse_report("").is_empty());
    }

    #[test]
    fn defaults_missing_score_and_selector() {
        let candidates = parse_report(r#"[{"preview": ""}, {"selector": ""}]"#);
        assert_eq!(candidates.len(), 2);
        for candidate in candidates {
            assert_eq!(candidate.score, 0);
            assert_eq!(candidate.selector, "unknown");
            assert!(candidate.details.is_empty());
        }
    }

    #[test]
    fn details_follow_fixed_field_order() {
        let raw = r#"{
            "fields": ["number: cc", "cvv: cvc"],
            "preview": "Total 25,00 лв",
            "amount": 25.0,
            "currencies": ["BGN", "EUR"],
            "foundCount": 4,
            "inputCount": 6,
            "radioCount": 2,
            "hasImages": 1,
            "textLength": 120,
            "childCount": 3,
            "score": 30,
            "selector": "form.pay"
        }"#;
        let candidates = parse_report(raw);
        assert_eq!(
            candidates[0].details,
            vec![
                "Children: 3",
                "Text length: 120 chars",
                "Images: 1",
                "Radio buttons: 2",
                "Inputs: 6",
                "Fields found: 4",
                "Amount: 25 BGN,EUR",
                "Preview: \"Total 25,00 лв...\"",
                "Fields: number: cc, cvv: cvc",
            ]
        );
    }

    #[test]
    fn preview_is_clipped() {
        let long = "x".repeat(120);
        let raw = serde_json::json!({ "selector": ".a", "preview": long }).to_string();
        let candidates = parse_report(&raw);
        assert_eq!(candidates[0].details[0], format!("Preview: \"{}...\"", "x".repeat(80)));
    }

    #[test]
    fn header_without_score_keeps_selector() {
        let raw = concat!(
            "=== AUTOFILL FIELDS DIAGNOSTIC ===\n",
            "1. form#checkout (Found: 4)\n",
            "   - number: cc-number\n",
            "   - cvv: cvc\n",
            "---",
        );
        let candidates = parse_report(raw);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].score, 0);
        assert_eq!(candidates[0].selector, "form#checkout (Found: 4)");
        assert_eq!(candidates[0].details.len(), 2);
    }

    #[test]
    fn trailing_pipe_text_is_stripped_from_selector() {
        let candidates = parse_report("3. Score: 7 | .total | extra text");
        assert_eq!(candidates[0].selector, ".total");
        assert_eq!(candidates[0].score, 7);
    }

    #[test]
    fn detail_lines_before_first_header_are_ignored() {
        let candidates = parse_report("stray line\n1. Score: 5 | .a\nkept");
        assert_eq!(candidates[0].details, vec!["kept".to_string()]);
    }

    #[test]
    fn detects_format() {
        assert_eq!(ReportFormat::detect("  [1]"), ReportFormat::Structured);
        assert_eq!(ReportFormat::detect("{}"), ReportFormat::Structured);
        assert_eq!(ReportFormat::detect("1. .a"), ReportFormat::Lines);
    }
}
