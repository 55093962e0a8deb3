use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::recovery::{ErrorRecord, RecoveredRecord, EMPTY_OBJECT};

/// First fenced block, optionally tagged `json`, whose body is a brace-delimited
/// object. The lazy body stops at the first `}` that is followed by the fence.
static FENCED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?i:json)?\s*(\{.*?\})\s*```").expect("fenced-object pattern is valid")
});

/// First `{` through the last `}` in the text.
static GREEDY_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("greedy-object pattern is valid"));

/// How the bare-object layer picks its span when no fenced block matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpanStrategy {
    /// From the first `{` to the last `}`. Tolerates trailing commentary but
    /// over-captures when that commentary itself contains a `}`.
    #[default]
    Greedy,
    /// From the first `{` to the brace that closes it, skipping braces inside
    /// string literals. Falls back to `Greedy` when the object never closes
    /// or when the balanced span does not decode.
    Balanced,
}

impl FromStr for SpanStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(SpanStrategy::Greedy),
            "balanced" => Ok(SpanStrategy::Balanced),
            other => Err(format!(
                "unknown span strategy '{other}' (expected greedy or balanced)"
            )),
        }
    }
}

/// Which search layer produced the candidate span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanSource {
    Fenced,
    Bare,
}

#[derive(Debug, Error)]
#[error("Failed to parse JSON: {primary}; escaped-string fallback: {fallback}")]
struct DecodeError {
    primary: serde_json::Error,
    fallback: serde_json::Error,
}

/// Layered JSON recovery. Stateless and `Copy`, so one value can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    strategy: SpanStrategy,
}

impl Extractor {
    pub fn new(strategy: SpanStrategy) -> Self {
        Self { strategy }
    }

    /// Finds the candidate span: a fenced block first, then a bare object.
    pub fn locate_span<'a>(&self, text: &'a str) -> Option<(SpanSource, &'a str)> {
        if let Some(body) = FENCED_OBJECT.captures(text).and_then(|c| c.get(1)) {
            return Some((SpanSource::Fenced, body.as_str()));
        }

        let bare = match self.strategy {
            SpanStrategy::Greedy => greedy_span(text),
            SpanStrategy::Balanced => balanced_span(text).or_else(|| greedy_span(text)),
        };
        bare.map(|span| (SpanSource::Bare, span))
    }

    /// A balanced scan does not see `\"` as a string delimiter, so on a
    /// double-encoded payload it can stop at a `}` inside an escaped value.
    /// The greedy span is the second chance in that case.
    fn retry_span<'a>(
        &self,
        source: SpanSource,
        text: &'a str,
        span: &str,
    ) -> Option<&'a str> {
        if self.strategy != SpanStrategy::Balanced || source != SpanSource::Bare {
            return None;
        }
        greedy_span(text).filter(|wider| *wider != span)
    }

    /// Recovers a record from `text`. Never fails: problems are reported as
    /// `RecoveredRecord::Failed` carrying the raw text and the attempted span.
    pub fn recover(&self, text: &str) -> RecoveredRecord {
        let Some((source, span)) = self.locate_span(text) else {
            warn!("No JSON object found in model response ({} bytes)", text.len());
            return RecoveredRecord::Failed(ErrorRecord::new(
                "No JSON object found in response",
                text,
                EMPTY_OBJECT,
            ));
        };

        debug!(?source, span_len = span.len(), "Located candidate JSON span");

        let decoded = decode(span).or_else(|e| match self.retry_span(source, text, span) {
            Some(wider) => {
                debug!("Balanced span failed to decode, retrying with greedy span");
                decode(wider).map_err(|_| e)
            }
            None => Err(e),
        });

        match decoded {
            Ok(value) => RecoveredRecord::Decoded(value),
            Err(e) => {
                warn!("Model response could not be recovered: {e}");
                debug!("Unrecoverable model response: {text}");
                RecoveredRecord::Failed(ErrorRecord::new(e.to_string(), text, span))
            }
        }
    }
}

fn greedy_span(text: &str) -> Option<&str> {
    GREEDY_OBJECT.find(text).map(|m| m.as_str())
}

fn balanced_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Primary decode, then the double-encoded fallback: treat the span as the
/// body of a JSON string literal, unescape it, and decode the result.
fn decode(span: &str) -> Result<Value, DecodeError> {
    let primary = match serde_json::from_str::<Value>(span) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let unescaped = match serde_json::from_str::<String>(&format!("\"{span}\"")) {
        Ok(unescaped) => unescaped,
        Err(fallback) => return Err(DecodeError { primary, fallback }),
    };

    serde_json::from_str::<Value>(&unescaped)
        .map_err(|fallback| DecodeError { primary, fallback })
}
