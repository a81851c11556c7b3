//! Request handlers, grouped by the area of the site they serve.
//!
//! Handlers stay thin: extract, validate, call the repository or session store, map
//! the result. Access control is decided by the router layer a handler is mounted
//! under, plus the ownership checks in `board`.

pub mod auth;
pub mod board;
pub mod content;
pub mod site;
pub mod stats;
pub mod upload;
pub mod users;

use crate::error::AppError;

/// Trims a required text field, rejecting it when blank.
pub(crate) fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid(format!("{field}을(를) 입력해주세요.")));
    }
    Ok(trimmed.to_string())
}
