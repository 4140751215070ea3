use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{CoreError, CoreResult};

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://[^\s/$.?#][^\s]*|/[^\s]*)$").expect("Invalid URL regex pattern")
});

/// Required-field checks shared by the services
pub struct ValidationService;

impl ValidationService {
    /// Trim and require a non-empty value no longer than `max` characters
    pub fn required_text(field: &str, value: &str, max: usize) -> CoreResult<String> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(CoreError::invalid_field(
                field,
                format!("{} is required", display_name(field)),
            ));
        }

        if trimmed.chars().count() > max {
            return Err(CoreError::invalid_field(
                field,
                format!("{} is too long (max {} characters)", display_name(field), max),
            ));
        }

        Ok(trimmed.to_string())
    }

    /// Like [`required_text`](Self::required_text) but blank input becomes `None`
    pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> CoreResult<Option<String>> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Self::required_text(field, value, max).map(Some),
        }
    }

    pub fn validate_url(field: &str, value: &str) -> CoreResult<String> {
        let trimmed = value.trim();
        if !URL_PATTERN.is_match(trimmed) {
            return Err(CoreError::invalid_field(
                field,
                format!("{} must be an http(s) URL or an absolute path", display_name(field)),
            ));
        }

        Ok(trimmed.to_string())
    }

    pub fn non_negative(field: &str, value: i64) -> CoreResult<i64> {
        if value < 0 {
            return Err(CoreError::invalid_field(
                field,
                format!("{} cannot be negative", display_name(field)),
            ));
        }
        Ok(value)
    }

    /// Derive a URL slug from a title: lowercase alphanumerics joined by dashes
    pub fn slugify(title: &str) -> String {
        let mut slug = String::with_capacity(title.len());
        let mut pending_dash = false;

        for c in title.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }

        if slug.is_empty() {
            "course".to_string()
        } else {
            slug
        }
    }

    /// Reduce an uploaded file name to a safe single path component
    pub fn sanitize_file_name(name: &str) -> String {
        let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

        let cleaned: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || "-_.".contains(c) {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        let cleaned = cleaned.trim_start_matches('.');
        let cleaned: String = cleaned.chars().take(100).collect();

        if cleaned.is_empty() || cleaned.chars().all(|c| c == '_' || c == '.') {
            "file".to_string()
        } else {
            cleaned
        }
    }
}

fn display_name(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
