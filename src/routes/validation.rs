/**
 * Input validation shared by the public forms and the admin editors
 */
use regex::Regex;

use crate::error::ApiError;

/// Category stored when the editor leaves it blank
pub const DEFAULT_CATEGORY: &str = "General";

/// Reading speed used to estimate a blog post's read time
const WORDS_PER_MINUTE: usize = 200;

/// Cap on inline `data:` image URIs stored in a row
const MAX_DATA_URI_BYTES: usize = 2 * 1024 * 1024;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid");
}

/// Trimmed value of a required field, or a 400 naming the field.
pub fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trimmed value, or None when absent or blank.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Required, trimmed, well-formed email.
pub fn email(value: &str) -> Result<String, ApiError> {
    let email = required("Email", value)?;
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    Ok(email)
}

pub fn category(value: Option<&str>) -> String {
    optional(value).unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Accepts absolute http(s) URLs, uploaded-image paths, and bounded inline image data URIs.
pub fn image_url(value: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(url) = optional(value) else {
        return Ok(None);
    };

    if url.starts_with("data:") {
        if !url.starts_with("data:image/") {
            return Err(ApiError::bad_request("Inline images must be image data URIs"));
        }
        if url.len() > MAX_DATA_URI_BYTES {
            return Err(ApiError::bad_request(
                "Inline image too large. Upload the file instead.",
            ));
        }
        return Ok(Some(url));
    }

    if url.starts_with("https://") || url.starts_with("http://") || url.starts_with("/uploads/") {
        return Ok(Some(url));
    }

    Err(ApiError::bad_request("Invalid image URL"))
}

/// Sanitize HTML content using ammonia
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

/// "N min read" at [`WORDS_PER_MINUTE`], never less than one minute.
pub fn estimate_read_time(content: &str) -> String {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{} min read", minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required("Title", "  Dawn ").unwrap(), "Dawn");
        let err = required("Title", "   ").unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("reader@example.com"));
        assert!(!is_valid_email("reader@example"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two words@example.com"));
        assert_eq!(email(" reader@example.com ").unwrap(), "reader@example.com");
        assert!(email("").is_err());
    }

    #[test]
    fn test_category_defaults_when_blank() {
        assert_eq!(category(None), DEFAULT_CATEGORY);
        assert_eq!(category(Some("  ")), DEFAULT_CATEGORY);
        assert_eq!(category(Some(" Nature")), "Nature");
    }

    #[test]
    fn test_image_url_rules() {
        assert_eq!(image_url(None).unwrap(), None);
        assert_eq!(image_url(Some("")).unwrap(), None);
        assert!(image_url(Some("https://images.example.com/a.jpg")).unwrap().is_some());
        assert!(image_url(Some("/uploads/images/abc.png")).unwrap().is_some());
        assert!(image_url(Some("data:image/png;base64,iVBORw0KGgo=")).unwrap().is_some());
        assert!(image_url(Some("data:text/html;base64,PHNjcmlwdD4=")).is_err());
        assert!(image_url(Some("javascript:alert(1)")).is_err());

        let huge = format!("data:image/png;base64,{}", "A".repeat(MAX_DATA_URI_BYTES));
        assert!(image_url(Some(&huge)).is_err());
    }

    #[test]
    fn test_sanitize_html_strips_scripts() {
        let clean = sanitize_html("<p>verse</p><script>alert(1)</script>");
        assert!(clean.contains("<p>verse</p>"));
        assert!(!clean.contains("script"));
    }

    #[test]
    fn test_estimate_read_time() {
        assert_eq!(estimate_read_time(""), "1 min read");
        assert_eq!(estimate_read_time(&"word ".repeat(200)), "1 min read");
        assert_eq!(estimate_read_time(&"word ".repeat(201)), "2 min read");
        assert_eq!(estimate_read_time(&"word ".repeat(1000)), "5 min read");
    }
}
