//! ZPL label validation
//!
//! Two checks over untrusted label content:
//!
//! - [`syntax_valid`] - the `^XA ... ^XZ` format envelope
//! - [`security_valid`] - envelope, size ceiling and a denylist of device
//!   management commands (firmware update, reset, persistent memory writes)
//!
//! Anything that ends up on a printer must go through [`security_valid`].
//! The denylist only catches commands we know about; it is not an allowlist.

use thiserror::Error;

/// Format-open token
pub const FORMAT_OPEN: &str = "^XA";

/// Format-close token
pub const FORMAT_CLOSE: &str = "^XZ";

/// Maximum label payload in UTF-8 bytes (100 KiB)
pub const MAX_LABEL_BYTES: usize = 100 * 1024;

/// Commands that can alter firmware, reset the device or rewrite its memory.
///
/// `^MC` also blocks the common `^MCY` form; labels that need map control
/// have to be rewritten without it.
pub const FORBIDDEN_COMMANDS: &[&str] = &[
    "^JU", // save/restore configuration
    "^JF", // set battery condition / power-up behaviour
    "~JR", // power-on reset
    "^MC", // map clear
    "~MT", // media type
    "~HS", // host status
    "^ID", // delete stored objects
    "~JB", // reset optional memory
];

/// Reason a label was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("Label content is empty")]
    Empty,

    #[error("Label content is too large: {actual} bytes (maximum {max} bytes)")]
    TooLarge { actual: usize, max: usize },

    #[error("Label content must start with ^XA and end with ^XZ")]
    MissingEnvelope,

    #[error("Label content contains forbidden command {command}")]
    ForbiddenCommand { command: &'static str },
}

/// Check the `^XA ... ^XZ` envelope, ignoring case and surrounding whitespace.
///
/// Necessary but not sufficient for hardware submission.
pub fn syntax_valid(content: &str) -> bool {
    let trimmed = content.trim();
    starts_with_ignore_case(trimmed, FORMAT_OPEN) && ends_with_ignore_case(trimmed, FORMAT_CLOSE)
}

/// Full validation for content headed to a device.
pub fn security_valid(content: &str) -> Result<(), LabelError> {
    if content.trim().is_empty() {
        return Err(LabelError::Empty);
    }

    let actual = content.len();
    if actual > MAX_LABEL_BYTES {
        return Err(LabelError::TooLarge {
            actual,
            max: MAX_LABEL_BYTES,
        });
    }

    if !syntax_valid(content) {
        return Err(LabelError::MissingEnvelope);
    }

    if let Some(command) = find_forbidden_command(content) {
        return Err(LabelError::ForbiddenCommand { command });
    }

    Ok(())
}

/// First denylisted command found in `content`, case-insensitive
pub fn find_forbidden_command(content: &str) -> Option<&'static str> {
    let upper = content.to_ascii_uppercase();
    FORBIDDEN_COMMANDS
        .iter()
        .copied()
        .find(|command| upper.contains(command))
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

fn ends_with_ignore_case(s: &str, suffix: &str) -> bool {
    s.len() >= suffix.len()
        && s.as_bytes()[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes())
}
