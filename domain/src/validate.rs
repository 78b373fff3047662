//! URL safety classifier shared by the editing form and the renderer.
//!
//! Decides whether a user-supplied string may be placed into a navigation or
//! image-source attribute. Allow-list of navigation shapes; anything else is
//! rejected. Keep this pure and deterministic: both call sites depend on it
//! reaching the same verdict.

use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Rejected ahead of the allow-list only so the message can be specific.
const DANGEROUS_PREFIXES: [&str; 2] = ["javascript:", "data:"];

const ALLOWED_PREFIXES: [&str; 7] = ["http://", "https://", "/", "./", "../", "#", "?"];

/// Why a value was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlRejection {
    /// Empty or whitespace only. A required-field concern, not a security one.
    Absent,
    /// `javascript:` or `data:`.
    DangerousScheme,
    /// Not one of the allowed prefixes.
    InvalidFormat,
}

impl UrlRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlRejection::Absent => "absent",
            UrlRejection::DangerousScheme => "dangerous_scheme",
            UrlRejection::InvalidFormat => "invalid_format",
        }
    }

    /// Field-level message for the editor. `None` for [`UrlRejection::Absent`].
    pub fn message(&self) -> Option<&'static str> {
        match self {
            UrlRejection::Absent => None,
            UrlRejection::DangerousScheme => {
                Some("URLs using the javascript: or data: scheme are not allowed")
            }
            UrlRejection::InvalidFormat => {
                Some("URL must start with http://, https://, /, ./, ../, # or ?")
            }
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, UrlRejection::Absent)
    }
}

impl Display for UrlRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlRejection::Absent => write!(f, "no value"),
            UrlRejection::DangerousScheme => write!(f, "dangerous scheme"),
            UrlRejection::InvalidFormat => write!(f, "invalid format"),
        }
    }
}

/// Classify a URL or image-source value.
///
/// On acceptance returns the value with surrounding whitespace trimmed and its
/// case untouched; that is the form to store or emit. Prefix matching is ASCII
/// case-insensitive and anchored at the start of the trimmed value.
pub fn classify_url(value: &str) -> Result<&str, UrlRejection> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UrlRejection::Absent);
    }
    if DANGEROUS_PREFIXES
        .iter()
        .any(|p| starts_with_ignore_case(trimmed, p))
    {
        return Err(UrlRejection::DangerousScheme);
    }
    if ALLOWED_PREFIXES
        .iter()
        .any(|p| starts_with_ignore_case(trimmed, p))
    {
        return Ok(trimmed);
    }
    Err(UrlRejection::InvalidFormat)
}

/// Convenience predicate over [`classify_url`].
pub fn is_safe_url(value: &str) -> bool {
    classify_url(value).is_ok()
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
