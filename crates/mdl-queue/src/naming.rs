//! Destination naming and source validation.

use std::path::Path;

use url::Url;

use crate::error::{QueueError, Result};
use crate::job::JobId;

/// Characters that are invalid in file names on at least one supported platform.
const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Normalise a user supplied naming pattern.
///
/// Invalid characters become `_` (runs collapse into one), surrounding
/// whitespace, dots and spaces are trimmed. Fails if nothing usable is left.
pub fn sanitize_pattern(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QueueError::invalid_argument("naming pattern must not be empty"));
    }

    let mut result = String::with_capacity(trimmed.len());
    let mut last_was_replacement = false;
    for c in trimmed.chars() {
        if c.is_control() || INVALID_NAME_CHARS.contains(&c) {
            if !last_was_replacement {
                result.push('_');
                last_was_replacement = true;
            }
        } else {
            result.push(c);
            last_was_replacement = false;
        }
    }

    let result = result.trim_matches(|c| c == ' ' || c == '.');
    if result.is_empty() || result.chars().all(|c| c == '_') {
        return Err(QueueError::invalid_argument(format!(
            "naming pattern '{trimmed}' contains no usable characters"
        )));
    }

    Ok(result.to_string())
}

/// Destination name for the job with the given sequence number.
pub fn destination_name(pattern: &str, id: JobId) -> String {
    format!("{pattern}_{id}")
}

/// Validate an enqueue argument and return its normalised form.
///
/// Accepts an absolute URL with an authority (or a `file:` URL), or the path
/// of something that exists on the local filesystem.
pub fn validate_source(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QueueError::invalid_argument("source must not be empty"));
    }

    if let Ok(url) = Url::parse(trimmed)
        && (url.has_host() || url.scheme() == "file")
    {
        return Ok(trimmed.to_string());
    }

    if Path::new(trimmed).exists() {
        return Ok(trimmed.to_string());
    }

    Err(QueueError::invalid_argument(format!(
        "'{trimmed}' is neither an absolute URI nor an existing path"
    )))
}
