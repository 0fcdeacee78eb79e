//! Input validation shared by every entry point into the shortener.

use crate::error::ShortenerError;
use url::Url;

/// Maximum length of an original URL, in characters.
pub const MAX_URL_LENGTH: usize = 2048;

/// Maximum length of an owner note, in characters.
pub const MAX_NOTE_LENGTH: usize = 5000;

/// Validates that the URL is an absolute `http`/`https` URL with a host.
pub fn validate_url(url: &str) -> Result<(), ShortenerError> {
    if url.trim().is_empty() {
        return Err(ShortenerError::validation(
            "original_url",
            "URL cannot be empty",
        ));
    }

    let length = url.chars().count();
    if length > MAX_URL_LENGTH {
        return Err(ShortenerError::validation(
            "original_url",
            format!("URL cannot exceed {MAX_URL_LENGTH} characters, got {length}"),
        ));
    }

    // Url::parse strips these, so they must not reach the store unparsed.
    if url.chars().any(|c| c.is_ascii_control()) {
        return Err(ShortenerError::validation(
            "original_url",
            "URL cannot contain control characters",
        ));
    }

    if url.trim() != url {
        return Err(ShortenerError::validation(
            "original_url",
            "URL cannot start or end with whitespace",
        ));
    }

    let parsed = Url::parse(url).map_err(|e| {
        ShortenerError::validation("original_url", format!("malformed URL: {e}"))
    })?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ShortenerError::validation(
            "original_url",
            format!("URL scheme must be http or https: {scheme}"),
        ));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ShortenerError::validation(
            "original_url",
            "URL must have a host",
        ));
    }

    Ok(())
}

pub fn validate_note(note: Option<&str>) -> Result<(), ShortenerError> {
    let Some(note) = note else {
        return Ok(());
    };

    let length = note.chars().count();
    if length > MAX_NOTE_LENGTH {
        return Err(ShortenerError::validation(
            "note",
            format!("note cannot exceed {MAX_NOTE_LENGTH} characters, got {length}"),
        ));
    }

    Ok(())
}
