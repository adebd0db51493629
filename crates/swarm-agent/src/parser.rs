//! Reply parsing.
//!
//! A worker's stdout is interpreted in priority order:
//!
//! 1. a result envelope (`{"type": "result", "subtype": ...}`) on the last
//!    JSON line, whose `result` text becomes the body for the next steps;
//! 2. a fenced ```` ```json ```` block with the structured report;
//! 3. a fenced ```` ```summary ```` block of `key: value` lines;
//! 4. the tail of the text, verbatim.
//!
//! Parsing never fails: the worst case is an unstructured summary.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use swarm_core::text::tail_chars;
use swarm_core::{Issue, Severity};

use regex::Regex;

/// Characters of unstructured text kept as the summary.
pub const FALLBACK_SUMMARY_CHARS: usize = 1500;

static JSON_BLOCK: OnceLock<Regex> = OnceLock::new();
static SUMMARY_BLOCK: OnceLock<Regex> = OnceLock::new();

// Literal patterns; they compile.
#[allow(clippy::unwrap_used)]
fn json_block() -> &'static Regex {
    JSON_BLOCK.get_or_init(|| Regex::new(r"(?s)```json\s*\n(\{.*?\})\s*\n```").unwrap())
}

#[allow(clippy::unwrap_used)]
fn summary_block() -> &'static Regex {
    SUMMARY_BLOCK.get_or_init(|| Regex::new(r"(?s)```summary\s*\n(.*?)\n```").unwrap())
}

/// How the capability said the run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyStatus {
    /// Envelope with `subtype: success`.
    Success,
    /// Envelope with an `error_*` subtype or `is_error: true`.
    Error(String),
    /// The run hit its turn limit.
    MaxTurns,
    /// The run was handed to an interactive session; the reply is whatever it
    /// left behind.
    Interactive,
    /// No envelope; plain text output.
    Unstructured,
}

impl ReplyStatus {
    /// Whether the capability itself reported a clean finish.
    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            ReplyStatus::Success | ReplyStatus::Interactive | ReplyStatus::Unstructured
        )
    }

    fn describe(&self) -> Option<String> {
        match self {
            ReplyStatus::Error(subtype) => Some(format!("Agent reported an error ({subtype})")),
            ReplyStatus::MaxTurns => Some("Agent stopped after reaching its turn limit".into()),
            _ => None,
        }
    }
}

/// Structured fields a worker reports about its run.
///
/// Keys outside the known set are kept in `details`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredReport {
    /// What the worker says it did.
    pub summary: String,
    /// Existing files the worker modified.
    pub files_changed: Vec<String>,
    /// Files the worker added.
    pub files_created: Vec<String>,
    /// Findings, read from `issues` or `issues_found`.
    pub issues: Vec<Issue>,
    /// Follow-up ideas.
    pub suggestions: Vec<String>,
    /// The worker refuses to let the work proceed.
    pub blocked: bool,
    /// Why the worker blocked.
    pub block_reason: Option<String>,
    /// Tokens the worker reports spending.
    pub tokens_used: Option<u64>,
    /// Every other key of the report object.
    pub details: Map<String, Value>,
}

impl StructuredReport {
    /// Read the known keys of a report object one at a time.
    ///
    /// A field of the wrong type is coerced or dropped on its own; it never
    /// discards the rest of the report.
    fn from_object(mut object: Map<String, Value>) -> Self {
        let issues = object
            .remove("issues")
            .filter(|v| !v.is_null())
            .or_else(|| object.remove("issues_found"));
        object.remove("issues_found");

        Self {
            summary: object.remove("summary").and_then(text_value).unwrap_or_default(),
            files_changed: object.remove("files_changed").map(list_value).unwrap_or_default(),
            files_created: object.remove("files_created").map(list_value).unwrap_or_default(),
            issues: issues.map(issue_list).unwrap_or_default(),
            suggestions: object.remove("suggestions").map(list_value).unwrap_or_default(),
            blocked: object.remove("blocked").is_some_and(flag_value),
            block_reason: object
                .remove("block_reason")
                .and_then(text_value)
                .filter(|reason| !reason.trim().is_empty()),
            tokens_used: object.remove("tokens_used").and_then(count_value),
            details: object,
        }
    }
}

fn text_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// An array of scalars, or one comma separated string.
fn list_value(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Array(_) | Value::Object(_) => None,
                scalar => text_value(scalar),
            })
            .collect(),
        Value::String(s) => split_list(&s),
        _ => Vec::new(),
    }
}

fn flag_value(value: Value) -> bool {
    match value {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "yes" | "true" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

fn count_value(value: Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn issue_list(value: Value) -> Vec<Issue> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(issue_value).collect(),
        Value::Null => Vec::new(),
        single => issue_value(single).into_iter().collect(),
    }
}

/// One issue; a bare string becomes an informational issue.
fn issue_value(value: Value) -> Option<Issue> {
    match value {
        Value::String(description) => Some(Issue::new(Severity::Info, description)),
        Value::Object(mut fields) => {
            let severity = fields
                .remove("severity")
                .and_then(text_value)
                .map(|tag| {
                    serde_json::from_value(Value::String(tag.trim().to_lowercase()))
                        .unwrap_or(Severity::Other)
                })
                .unwrap_or_default();
            Some(Issue {
                severity,
                description: fields.remove("description").and_then(text_value).unwrap_or_default(),
                file: fields.remove("file").and_then(text_value),
                line: fields
                    .remove("line")
                    .and_then(count_value)
                    .and_then(|line| u32::try_from(line).ok()),
                suggestion: fields.remove("suggestion").and_then(text_value),
            })
        }
        other => {
            tracing::debug!(issue = %other, "Skipping malformed issue entry");
            None
        }
    }
}

/// A parsed worker reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    /// How the run ended.
    pub status: ReplyStatus,
    /// What the worker reported.
    pub report: StructuredReport,
}

#[derive(Debug, Deserialize)]
struct ReplyEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    is_error: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl ReplyEnvelope {
    fn status(&self) -> ReplyStatus {
        match self.subtype.as_deref() {
            Some("success") if !self.is_error => ReplyStatus::Success,
            Some("error_max_turns") => ReplyStatus::MaxTurns,
            Some(sub) if sub.starts_with("error") => ReplyStatus::Error(sub.to_string()),
            _ if self.is_error => ReplyStatus::Error("is_error".into()),
            _ => ReplyStatus::Interactive,
        }
    }
}

/// Find the result envelope: the whole output, or else the last JSON line
/// with `type == "result"` (stream output ends with it).
fn find_envelope(output: &str) -> Option<ReplyEnvelope> {
    let whole = output.trim();
    if let Ok(envelope) = serde_json::from_str::<ReplyEnvelope>(whole) {
        if envelope.kind == "result" {
            return Some(envelope);
        }
    }
    output
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .filter_map(|line| serde_json::from_str::<ReplyEnvelope>(line).ok())
        .find(|envelope| envelope.kind == "result")
}

/// Parse a worker's raw output.
pub fn parse_reply(output: &str) -> ParsedReply {
    let (status, body, envelope_tokens) = match find_envelope(output) {
        Some(envelope) => {
            let status = envelope.status();
            let tokens = envelope
                .usage
                .as_ref()
                .map(|u| u.input_tokens + u.output_tokens);
            (status, envelope.result.unwrap_or_default(), tokens)
        }
        None => (ReplyStatus::Unstructured, output.to_string(), None),
    };

    let mut report = parse_body(&body);
    if report.tokens_used.is_none() {
        report.tokens_used = envelope_tokens;
    }
    if report.summary.trim().is_empty() {
        if let Some(description) = status.describe() {
            report.summary = description;
        }
    }

    ParsedReply { status, report }
}

/// Steps 2 to 4 of the priority order, over the reply body.
pub fn parse_body(text: &str) -> StructuredReport {
    if let Some(report) = parse_json_block(text) {
        return report;
    }
    if let Some(report) = parse_summary_block(text) {
        return report;
    }
    StructuredReport {
        summary: tail_chars(text.trim(), FALLBACK_SUMMARY_CHARS).to_string(),
        ..StructuredReport::default()
    }
}

fn parse_json_block(text: &str) -> Option<StructuredReport> {
    let captures = json_block().captures(text)?;
    let raw = captures.get(1)?.as_str();
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Some(StructuredReport::from_object(object)),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Fenced JSON block did not parse, trying next format");
            None
        }
    }
}

fn parse_summary_block(text: &str) -> Option<StructuredReport> {
    let captures = summary_block().captures(text)?;
    let block = captures.get(1)?.as_str();
    let mut report = StructuredReport {
        summary: block.to_string(),
        ..StructuredReport::default()
    };

    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase().replace(' ', "_");
        let value = value.trim();
        match key.as_str() {
            "files_changed" => report.files_changed = split_list(value),
            "files_created" => report.files_created = split_list(value),
            "blocked" => {
                report.blocked = matches!(value.to_lowercase().as_str(), "yes" | "true" | "1");
            }
            "block_reason" => report.block_reason = Some(value.to_string()),
            _ => {}
        }
    }
    Some(report)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
