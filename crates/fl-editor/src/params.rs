//! Parameter edits from text fields.
//!
//! Edits arrive as raw text while the user types (`commit == false`) and once
//! more when the field loses focus (`commit == true`). Text is sanitized
//! rather than rejected: numeric fields keep their digits and decimal point,
//! text fields lose invalid characters.

use fl_core::parse_lenient;
use fl_graph::{Param, ParamValue};

use crate::naming::filter_invalid_characters;

/// A text field change for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamEdit {
    pub name: String,
    pub text: String,
    /// Map entry to edit, e.g. the source block id of a sequence label.
    pub key: Option<String>,
    pub commit: bool,
}

impl ParamEdit {
    pub fn typing(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            key: None,
            commit: false,
        }
    }

    pub fn committed(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            commit: true,
            ..Self::typing(name, text)
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Whether a parameter takes numbers, judged by its default (or its value
/// when it has no default).
pub fn is_numeric(param: &Param) -> bool {
    match &param.default {
        Some(default) => matches!(default, ParamValue::Number(_)),
        None => matches!(param.value, Some(ParamValue::Number(_))),
    }
}

/// Apply an edit to `param`. Returns whether the stored value changed.
///
/// Numeric text that does not parse falls back to the default; an empty
/// field is left alone until commit. Parsed numbers are clamped to the
/// parameter's range.
pub fn apply_edit(param: &mut Param, edit: &ParamEdit) -> bool {
    let next = if is_numeric(param) {
        match parse_lenient(&edit.text) {
            Some(v) => Some(ParamValue::Number(param.clamp(v))),
            None if edit.text.trim().is_empty() && !edit.commit => return false,
            None => param.default.clone(),
        }
    } else {
        let mut text = filter_invalid_characters(&edit.text);
        if edit.commit {
            text = text.trim().to_string();
        }
        match &edit.key {
            Some(key) => {
                let mut map = match &param.value {
                    Some(ParamValue::Map(m)) => m.clone(),
                    _ => Default::default(),
                };
                map.insert(key.clone(), text);
                Some(ParamValue::Map(map))
            }
            None => Some(ParamValue::Text(text)),
        }
    };

    if next == param.value {
        return false;
    }
    param.value = next;
    true
}
