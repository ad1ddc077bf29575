//! Edit-time validation of URLs and condition values

use crate::core::condition::Condition;
use crate::core::evaluator::{coerce_number, compile_pattern};
use crate::core::types::Operator;
use crate::error::{FilterDeckError, Result};
use lazy_static::lazy_static;
use regex::Regex;

pub const NUMBER_REQUIRED_MESSAGE: &str =
    "Input must be a number when using comparison operators (i.e. < or >).";
pub const INVALID_REGEX_MESSAGE: &str = "Invalid regular expression.";

lazy_static! {
    static ref URL_SHAPE: Regex =
        Regex::new(r"^(https?://)?(www\.)?([a-zA-Z0-9\-.]+\.[a-zA-Z]{2,}|localhost|\d{1,3}(\.\d{1,3}){3})(:\d{1,5})?(/\S*)?$")
            .expect("URL shape pattern is valid");
}

pub fn is_number(text: &str) -> bool {
    !coerce_number(text).is_nan()
}

pub fn is_valid_url(text: &str) -> bool {
    URL_SHAPE.is_match(text)
}

pub fn is_valid_regex(text: &str) -> bool {
    compile_pattern(text).is_some()
}

/// Run `check` on `value`, producing `InvalidInputValue` on failure
///
/// With `allow_empty` an empty value always passes.
pub fn validate_input<F>(
    field: &str,
    value: &str,
    check: F,
    message: &str,
    allow_empty: bool,
) -> Result<()>
where
    F: Fn(&str) -> bool,
{
    if (allow_empty && value.is_empty()) || check(value) {
        Ok(())
    } else {
        Err(FilterDeckError::invalid_input(field, message))
    }
}

/// Operator-specific check of a condition's value
pub fn validate_condition(condition: &Condition) -> Result<()> {
    match condition.operator {
        Operator::GreaterThan | Operator::LessThan => validate_input(
            "value",
            &condition.value,
            is_number,
            NUMBER_REQUIRED_MESSAGE,
            true,
        ),
        Operator::Regex => validate_input(
            "value",
            &condition.value,
            is_valid_regex,
            INVALID_REGEX_MESSAGE,
            true,
        ),
        Operator::Equals | Operator::Contains | Operator::NotContains => Ok(()),
    }
}

/// Check a user-entered source URL and return the URL to request
///
/// Adds `https://` when no scheme was typed.
pub fn normalize_url(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if !is_valid_url(trimmed) {
        return Err(FilterDeckError::InvalidUrl(trimmed.to_string()));
    }
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    reqwest::Url::parse(&with_scheme)
        .map(|url| url.to_string())
        .map_err(|_| FilterDeckError::InvalidUrl(trimmed.to_string()))
}
