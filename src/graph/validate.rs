//! Shared input-item validation.
//!
//! One validator for every context that checks text inputs (page
//! transitions, confirmation modals), so both apply identical rules.

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    common::{Vars, coerce_string},
    model::{InputType, ItemModel},
};

const MSG_REQUIRED: &str = "This field is required";
const MSG_EMAIL: &str = "Please enter a valid email address";
const MSG_TEL: &str = "Please enter a valid phone number";
const MSG_NUMBER: &str = "Please enter a number";

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn tel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9()\-\s]{7,}$").unwrap())
}

/// Validate a single text-input item against the current variable map.
///
/// Returns the user-facing error message on failure, `None` when valid.
/// Items that are not text inputs always pass.
pub fn validate_input_item(
    item: &ItemModel,
    variables: &Vars,
) -> Option<String> {
    if !item.is_text_input() {
        return None;
    }

    let value = variables.get_value(item.variable_name()).map(coerce_string).unwrap_or_default();
    let value = value.trim();

    if value.is_empty() {
        return item.data.required.then(|| MSG_REQUIRED.to_string());
    }

    match item.data.input_type {
        InputType::Text => None,
        InputType::Email => (!email_re().is_match(value)).then(|| MSG_EMAIL.to_string()),
        InputType::Tel => (!tel_re().is_match(value)).then(|| MSG_TEL.to_string()),
        InputType::Number => value.parse::<f64>().is_err().then(|| MSG_NUMBER.to_string()),
    }
}
