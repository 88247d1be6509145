//! JSON-Patch (RFC 6902) operations over the mutable part of a review.
//!
//! Only top-level paths are meaningful because the patch target is a flat
//! object. Field names match case-insensitively, the same way model binding
//! treats property names on the wire.

use crate::domain::model::{FieldError, ReviewVisibility};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const IS_HIDDEN: &str = "isHidden";

/// Fields a patch is allowed to address.
const PATCHABLE_FIELDS: &[&str] = &[IS_HIDDEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

impl PatchOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Remove => "remove",
            PatchOp::Replace => "replace",
            PatchOp::Move => "move",
            PatchOp::Copy => "copy",
            PatchOp::Test => "test",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl PatchOperation {
    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: value.into(),
            from: None,
        }
    }
}

/// Applies `ops` to `target` and re-validates the result.
///
/// Every failing operation is reported, and a patched document that no
/// longer describes a valid [`ReviewVisibility`] is rejected as a whole.
pub fn apply_patch(
    target: ReviewVisibility,
    ops: &[PatchOperation],
) -> Result<ReviewVisibility, Vec<FieldError>> {
    let mut doc = Map::new();
    doc.insert(IS_HIDDEN.to_string(), Value::Bool(target.is_hidden));

    let mut errors = Vec::new();
    for op in ops {
        if let Err(e) = apply_one(&mut doc, op) {
            errors.push(e);
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    match doc.get(IS_HIDDEN) {
        Some(Value::Bool(is_hidden)) => Ok(ReviewVisibility {
            is_hidden: *is_hidden,
        }),
        Some(Value::Null) | None => Err(vec![FieldError::new(
            IS_HIDDEN,
            "The isHidden field is required.",
        )]),
        Some(other) => Err(vec![FieldError::new(
            IS_HIDDEN,
            format!("The value '{}' is not valid for isHidden.", other),
        )]),
    }
}

fn apply_one(doc: &mut Map<String, Value>, op: &PatchOperation) -> Result<(), FieldError> {
    let field = resolve(&op.path)?;

    match op.op {
        PatchOp::Add => {
            doc.insert(field.to_string(), op.value.clone());
        }
        PatchOp::Replace => {
            if !doc.contains_key(field) {
                return Err(not_found(&op.path));
            }
            doc.insert(field.to_string(), op.value.clone());
        }
        PatchOp::Remove => {
            if doc.remove(field).is_none() {
                return Err(not_found(&op.path));
            }
        }
        PatchOp::Test => {
            let current = doc.get(field).ok_or_else(|| not_found(&op.path))?;
            if *current != op.value {
                return Err(FieldError::new(
                    op.path.clone(),
                    format!(
                        "The current value '{}' at path '{}' is not equal to the test value '{}'.",
                        current, op.path, op.value
                    ),
                ));
            }
        }
        PatchOp::Move | PatchOp::Copy => {
            let from_path = op.from.as_deref().ok_or_else(|| {
                FieldError::new(
                    op.path.clone(),
                    format!("The '{}' operation requires a 'from' location.", op.op.as_str()),
                )
            })?;
            let source = resolve(from_path)?;
            let value = doc
                .get(source)
                .cloned()
                .ok_or_else(|| not_found(from_path))?;
            if op.op == PatchOp::Move {
                doc.remove(source);
            }
            doc.insert(field.to_string(), value);
        }
    }

    Ok(())
}

/// Maps a single-segment JSON pointer onto a patchable field name.
fn resolve(path: &str) -> Result<&'static str, FieldError> {
    let segment = path
        .strip_prefix('/')
        .filter(|s| !s.is_empty() && !s.contains('/'))
        .ok_or_else(|| not_found(path))?;
    let segment = segment.replace("~1", "/").replace("~0", "~");

    PATCHABLE_FIELDS
        .iter()
        .copied()
        .find(|f| f.eq_ignore_ascii_case(&segment))
        .ok_or_else(|| not_found(path))
}

fn not_found(path: &str) -> FieldError {
    FieldError::new(
        path.to_string(),
        format!("The target location specified by path '{}' was not found.", path),
    )
}
