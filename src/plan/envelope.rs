//! Plan extraction from raw producer output.
//!
//! Plans arrive either as a bare JSON object, inside a CLI envelope carrying
//! `structured_output`, or as a `result` string that may be wrapped in code
//! fences or surrounded by prose.
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Where in the response the plan was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Bare,
    StructuredOutput,
    ResultText,
}

#[derive(Debug)]
pub struct ExtractedPlan {
    pub value: Value,
    pub source: PlanSource,
}

pub fn load_plan_value(path: &Path) -> Result<ExtractedPlan> {
    let bytes = fs::read(path).with_context(|| format!("read plan {}", path.display()))?;
    extract_plan(&bytes).map_err(|details| {
        anyhow!(
            "no plan found in {}: {}",
            path.display(),
            details.join("; ")
        )
    })
}

/// Extract the plan object, collecting every reason extraction failed.
pub fn extract_plan(response: &[u8]) -> Result<ExtractedPlan, Vec<String>> {
    let mut details = Vec::new();
    let text = String::from_utf8_lossy(response);
    let value: Value = match serde_json::from_str(text.trim()) {
        Ok(value) => value,
        Err(err) => {
            if let Some(parsed) = first_embedded_object(&strip_code_fences(&text)) {
                return object_or_error(parsed, PlanSource::ResultText, &mut details);
            }
            details.push(format!("response JSON failed to parse: {err}"));
            return Err(details);
        }
    };

    if let Some(structured) = value.get("structured_output") {
        return object_or_error(structured.clone(), PlanSource::StructuredOutput, &mut details);
    }

    if let Some(result) = value.get("result").and_then(Value::as_str) {
        let cleaned = strip_code_fences(result);
        return match serde_json::from_str::<Value>(&cleaned) {
            Ok(parsed) => object_or_error(parsed, PlanSource::ResultText, &mut details),
            Err(err) => match first_embedded_object(&cleaned) {
                Some(parsed) => object_or_error(parsed, PlanSource::ResultText, &mut details),
                None => {
                    details.push(format!("result JSON failed to parse: {err}"));
                    Err(details)
                }
            },
        };
    }

    object_or_error(value, PlanSource::Bare, &mut details)
}

fn object_or_error(
    value: Value,
    source: PlanSource,
    details: &mut Vec<String>,
) -> Result<ExtractedPlan, Vec<String>> {
    if !value.is_object() {
        details.push(format!("plan must be a JSON object (found {})", kind_name(&value)));
        return Err(details.clone());
    }
    Ok(ExtractedPlan { value, source })
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Body of a leading fenced block, without the info string (`json`) on the
/// opening fence. Unfenced text comes back trimmed.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// First JSON value that parses starting at some `{` in surrounding prose.
fn first_embedded_object(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<Value>()
            .next()
            .and_then(Result::ok)
    })
}
