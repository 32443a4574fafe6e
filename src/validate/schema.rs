//! Schema phase: structure and field contracts on the raw plan value.
use super::Findings;
use crate::oracle::{lookup_element_type, lookup_relationship_type, CompatibilityOracle};
use crate::plan::catalog::{
    field_spec, FieldKind, OpKind, MAX_ACTIONS, MAX_QUESTIONS, MAX_QUESTION_CHARS,
    MAX_SUMMARY_CHARS, PLAN_STATUSES, SCHEMA_VERSIONS, TOP_LEVEL_FIELDS, TYPE_LABEL_MAX,
};
use crate::plan::ChangePlan;
use serde_json::{Map, Value};

const REQUIRED_TOP_LEVEL: &[&str] = &["schema_version", "status", "summary", "actions"];

/// Check the plan and decode it when no errors were found.
pub(super) fn check_plan<O>(raw: &Value, oracle: &O, findings: &mut Findings) -> Option<ChangePlan>
where
    O: CompatibilityOracle + ?Sized,
{
    let Some(plan) = raw.as_object() else {
        findings.error(None, None, "plan must be a JSON object".to_string());
        return None;
    };

    for (key, value) in plan {
        if !TOP_LEVEL_FIELDS.contains(&key.as_str()) && !value.is_null() {
            findings.error(None, Some(key.as_str()), "unknown top-level field".to_string());
        }
    }
    for field in REQUIRED_TOP_LEVEL {
        if plan.get(*field).map_or(true, Value::is_null) {
            findings.error(None, Some(*field), "required field is missing".to_string());
        }
    }

    check_closed_set(plan, "schema_version", SCHEMA_VERSIONS, findings);
    let status = check_closed_set(plan, "status", PLAN_STATUSES, findings);
    check_summary(plan, findings);
    let question_count = check_questions(plan, findings);

    let action_count = match plan.get("actions") {
        Some(Value::Array(actions)) => {
            if actions.len() > MAX_ACTIONS {
                findings.error(
                    None,
                    Some("actions"),
                    format!("{} actions exceeds the limit of {MAX_ACTIONS}", actions.len()),
                );
            }
            for (index, action) in actions.iter().enumerate() {
                check_action(index, action, oracle, findings);
            }
            actions.len()
        }
        Some(Value::Null) | None => 0,
        Some(_) => {
            findings.error(None, Some("actions"), "must be an array".to_string());
            0
        }
    };

    match status {
        Some("ready") if action_count == 0 => findings.warning(
            None,
            Some("actions"),
            "plan is ready but contains no actions".to_string(),
        ),
        Some("needs_clarification") if question_count == 0 => findings.warning(
            None,
            Some("questions"),
            "plan needs clarification but asks no questions".to_string(),
        ),
        _ => {}
    }

    if !findings.errors.is_empty() {
        return None;
    }
    match ChangePlan::from_value(raw) {
        Ok(plan) => Some(plan),
        Err(err) => {
            findings.error(None, None, format!("{err:#}"));
            None
        }
    }
}

fn check_closed_set<'a>(
    plan: &'a Map<String, Value>,
    field: &str,
    allowed: &[&str],
    findings: &mut Findings,
) -> Option<&'a str> {
    match plan.get(field) {
        Some(Value::String(value)) if allowed.contains(&value.as_str()) => Some(value.as_str()),
        Some(Value::String(value)) => {
            findings.error(
                None,
                Some(field),
                format!("'{value}' is not one of {}", allowed.join(", ")),
            );
            None
        }
        Some(Value::Null) | None => None,
        Some(_) => {
            findings.error(None, Some(field), "must be a string".to_string());
            None
        }
    }
}

fn check_summary(plan: &Map<String, Value>, findings: &mut Findings) {
    match plan.get("summary") {
        Some(Value::String(summary)) => {
            let chars = summary.chars().count();
            if chars > MAX_SUMMARY_CHARS {
                findings.error(
                    None,
                    Some("summary"),
                    format!("{chars} characters exceeds the limit of {MAX_SUMMARY_CHARS}"),
                );
            }
        }
        Some(Value::Null) | None => {}
        Some(_) => findings.error(None, Some("summary"), "must be a string".to_string()),
    }
}

fn check_questions(plan: &Map<String, Value>, findings: &mut Findings) -> usize {
    let questions = match plan.get("questions") {
        Some(Value::Array(questions)) => questions,
        Some(Value::Null) | None => return 0,
        Some(_) => {
            findings.error(None, Some("questions"), "must be an array or null".to_string());
            return 0;
        }
    };
    if questions.len() > MAX_QUESTIONS {
        findings.error(
            None,
            Some("questions"),
            format!("{} questions exceeds the limit of {MAX_QUESTIONS}", questions.len()),
        );
    }
    for (index, question) in questions.iter().enumerate() {
        let field = format!("questions[{index}]");
        match question.as_str() {
            Some(text) if text.trim().is_empty() => {
                findings.error(None, Some(field.as_str()), "must not be empty".to_string());
            }
            Some(text) if text.chars().count() > MAX_QUESTION_CHARS => findings.error(
                None,
                Some(field.as_str()),
                format!("exceeds the limit of {MAX_QUESTION_CHARS} characters"),
            ),
            Some(_) => {}
            None => findings.error(None, Some(field.as_str()), "must be a string".to_string()),
        }
    }
    questions.len()
}

fn check_action<O>(index: usize, action: &Value, oracle: &O, findings: &mut Findings)
where
    O: CompatibilityOracle + ?Sized,
{
    let Some(object) = action.as_object() else {
        findings.error(Some(index), None, "action must be a JSON object".to_string());
        return;
    };
    let op = match object.get("op") {
        Some(Value::String(name)) => match OpKind::from_name(name) {
            Some(op) => op,
            None => {
                findings.error(Some(index), Some("op"), format!("unknown op '{name}'"));
                return;
            }
        },
        Some(Value::Null) | None => {
            findings.error(Some(index), Some("op"), "required field is missing".to_string());
            return;
        }
        Some(_) => {
            findings.error(Some(index), Some("op"), "must be a string".to_string());
            return;
        }
    };
    let contract = op.contract();

    for (field, value) in object {
        if field == "op" || value.is_null() {
            continue;
        }
        if !contract.declares(field) {
            findings.error(
                Some(index),
                Some(field.as_str()),
                format!("field is not used by {}", op.name()),
            );
        }
    }

    for field in contract.required {
        if object.get(*field).map_or(true, Value::is_null) {
            findings.error(
                Some(index),
                Some(*field),
                format!("required by {}", op.name()),
            );
        }
    }

    for field in contract.fields() {
        let Some(value) = object.get(field).filter(|value| !value.is_null()) else {
            continue;
        };
        let Some(spec) = field_spec(field) else {
            continue;
        };
        if let Err(message) = check_field(spec.kind, value, oracle) {
            findings.error(Some(index), Some(field), message);
        }
    }

    if op == OpKind::AddToView {
        let has = |field: &str| object.get(field).is_some_and(|value| !value.is_null());
        match (has("x"), has("y")) {
            (true, false) => findings.error(
                Some(index),
                Some("y"),
                "x and y must be given together".to_string(),
            ),
            (false, true) => findings.error(
                Some(index),
                Some("x"),
                "x and y must be given together".to_string(),
            ),
            _ => {}
        }
    }
}

fn check_field<O>(kind: FieldKind, value: &Value, oracle: &O) -> Result<(), String>
where
    O: CompatibilityOracle + ?Sized,
{
    match kind {
        FieldKind::Text {
            max_chars,
            allow_empty,
        } => {
            let text = value.as_str().ok_or("must be a string")?;
            check_length(text, max_chars, allow_empty)
        }
        FieldKind::ElementTypeLabel => {
            let label = value.as_str().ok_or("must be a string")?;
            check_length(label, TYPE_LABEL_MAX, false)?;
            lookup_element_type(oracle, label)
                .map(|_| ())
                .ok_or_else(|| format!("unknown element type '{label}'"))
        }
        FieldKind::RelationshipTypeLabel => {
            let label = value.as_str().ok_or("must be a string")?;
            check_length(label, TYPE_LABEL_MAX, false)?;
            lookup_relationship_type(oracle, label)
                .map(|_| ())
                .ok_or_else(|| format!("unknown relationship type '{label}'"))
        }
        FieldKind::Integer { min, max } => {
            let number = value.as_i64().ok_or("must be an integer")?;
            if (min..=max).contains(&number) {
                Ok(())
            } else {
                Err(format!("{number} is outside {min}..={max}"))
            }
        }
    }
}

fn check_length(text: &str, max_chars: usize, allow_empty: bool) -> Result<(), String> {
    if !allow_empty && text.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    let chars = text.chars().count();
    if chars > max_chars {
        return Err(format!("{chars} characters exceeds the limit of {max_chars}"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
