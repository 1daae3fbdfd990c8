// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Business Onboarding Validation
//!
//! Client-side checks applied to a [`BusinessDetails`] submission before it
//! is sent. A payload that fails here never reaches the network.
//!
//! ## Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | `email` | syntactically valid address |
//! | `name` | at least 2 characters |
//! | `address` | at least 5 characters |
//! | `phone` | `+` country code, 8 to 15 digits |
//! | `logo` | present, `image/jpeg` or `image/png`, under 500 KB |

use std::path::Path;

use base64ct::{Base64, Encoding};
use serde::Serialize;

use crate::models::BusinessDetails;

/// Logos must be strictly smaller than this many bytes.
pub const MAX_LOGO_BYTES: usize = 500_000;

pub const ALLOWED_LOGO_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

pub const MSG_EMAIL: &str = "Please enter a valid email";
pub const MSG_NAME: &str = "Business name must be at least 2 characters";
pub const MSG_ADDRESS: &str = "Address is required";
pub const MSG_PHONE: &str = "Include country code (e.g., +1, +44)";
pub const MSG_LOGO_MISSING: &str = "Please upload a business logo";
pub const MSG_LOGO_TYPE: &str = "Please upload a .jpeg or .png file!";
pub const MSG_LOGO_SIZE: &str = "Upload image cannot be more than 500kb!";
pub const MSG_LOGO_ENCODING: &str = "Business logo must be a base64 image data URL";
pub const MSG_LOGO_UNREADABLE: &str = "Please select a file";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// Every failed field of one submission, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn first_message(&self) -> &str {
        self.0.first().map(|e| e.message.as_str()).unwrap_or_default()
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", joined.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A logo accepted by the upload checks, encoded for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoUpload {
    pub file_name: String,
    pub mime: String,
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
}

impl LogoUpload {
    pub fn from_bytes(file_name: &str, mime: &str, bytes: &[u8]) -> Result<Self, FieldError> {
        check_logo(mime, bytes.len())?;
        Ok(Self {
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            data_url: format!("data:{mime};base64,{}", Base64::encode_string(bytes)),
        })
    }

    /// Read a logo from disk; the MIME type comes from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FieldError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FieldError::new("logo", MSG_LOGO_UNREADABLE))?;
        let mime = mime_from_extension(path).ok_or_else(|| FieldError::new("logo", MSG_LOGO_TYPE))?;

        let size = std::fs::metadata(path)
            .map_err(|_| FieldError::new("logo", MSG_LOGO_UNREADABLE))?
            .len();
        // Size check before reading so oversized files are never loaded.
        if size >= MAX_LOGO_BYTES as u64 {
            return Err(FieldError::new("logo", MSG_LOGO_SIZE));
        }

        let bytes = std::fs::read(path).map_err(|_| FieldError::new("logo", MSG_LOGO_UNREADABLE))?;
        Self::from_bytes(file_name, mime, &bytes)
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

fn check_logo(mime: &str, size: usize) -> Result<(), FieldError> {
    if !ALLOWED_LOGO_TYPES.contains(&mime) {
        return Err(FieldError::new("logo", MSG_LOGO_TYPE));
    }
    if size >= MAX_LOGO_BYTES {
        return Err(FieldError::new("logo", MSG_LOGO_SIZE));
    }
    Ok(())
}

/// Split a `data:<mime>;base64,<payload>` URL.
fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    Some((mime, payload))
}

fn check_logo_data_url(logo: &str, file_name: &str) -> Result<(), FieldError> {
    if logo.trim().is_empty() || file_name.trim().is_empty() {
        return Err(FieldError::new("logo", MSG_LOGO_MISSING));
    }
    let (mime, payload) =
        parse_data_url(logo).ok_or_else(|| FieldError::new("logo", MSG_LOGO_ENCODING))?;
    let bytes = Base64::decode_vec(payload).map_err(|_| FieldError::new("logo", MSG_LOGO_ENCODING))?;
    check_logo(mime, bytes.len())
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// International number with a leading `+` country code.
///
/// Spaces, dashes, dots and parentheses are ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    let Some(digits) = compact.strip_prefix('+') else {
        return false;
    };
    (8..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0')
}

/// Validate a submission, collecting every failing field.
pub fn validate_business_details(details: &BusinessDetails) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if details.name.trim().chars().count() < 2 {
        errors.push(FieldError::new("name", MSG_NAME));
    }
    if !is_valid_email(&details.email) {
        errors.push(FieldError::new("email", MSG_EMAIL));
    }
    if details.address.trim().chars().count() < 5 {
        errors.push(FieldError::new("address", MSG_ADDRESS));
    }
    if !is_valid_phone(&details.phone) {
        errors.push(FieldError::new("phone", MSG_PHONE));
    }
    if let Err(e) = check_logo_data_url(&details.logo, &details.logo_file_name) {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
