//! Input domain types for licensee submissions.

use serde::{Deserialize, Serialize};

use crate::error::{LicenseeError, Result};

// ---------------------------------------------------------------------------
// InputRow
// ---------------------------------------------------------------------------

/// One submitted row before validation (form, CSV file, or pasted CSV).
///
/// Every field may be empty. Column names match the CSV header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRow {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub headquarters: String,
}

impl InputRow {
    /// Names of required fields that are empty in this row.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.uid.trim().is_empty() {
            missing.push("uid");
        }
        if self.website.trim().is_empty() {
            missing.push("website");
        }
        missing
    }

    /// Validate the row and convert it into a [`LicenseeInput`].
    pub fn into_input(self) -> Result<LicenseeInput> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(LicenseeError::validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(LicenseeInput {
            uid: self.uid.trim().to_string(),
            brand_name: self.brand_name.trim().to_string(),
            contact: non_empty(self.contact),
            email: non_empty(self.email),
            website: self.website.trim().to_string(),
            headquarters: non_empty(self.headquarters),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// LicenseeInput
// ---------------------------------------------------------------------------

/// A validated licensee submission. Read-only inside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseeInput {
    /// Caller-supplied identifier, stable across re-submission.
    pub uid: String,
    pub brand_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Website as submitted; see [`normalize_website`].
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headquarters: Option<String>,
}

/// Prefix `https://` unless the URL already starts with `http://` or `https://`.
///
/// Hosts are not validated.
pub fn normalize_website(website: &str) -> String {
    if website.starts_with("http://") || website.starts_with("https://") {
        website.to_string()
    } else {
        format!("https://{website}")
    }
}
