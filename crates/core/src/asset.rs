//! Binary assets (images) uploaded alongside a catalog update.
//!
//! Each asset lands at `media/<filename>` in the store. Content stays
//! base64 end to end; the service never decodes it.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Directory every asset is written under.
pub const MEDIA_DIR: &str = "media";

/// Largest accepted base64 payload, in characters.
///
/// 8 MiB of decoded data expressed as base64 length (`8 MiB * 4 / 3`,
/// integer division). A payload of exactly this length is accepted.
pub const MAX_ASSET_BASE64_LEN: usize = 8 * 1024 * 1024 * 4 / 3;

/// A validated asset ready to be synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub filename: String,
    pub content_base64: String,
}

impl Asset {
    /// Store path for this asset: `media/<filename>`.
    pub fn destination_path(&self) -> String {
        format!("{MEDIA_DIR}/{}", self.filename)
    }

    /// Commit message for a batch write of this asset.
    pub fn batch_commit_message(&self) -> String {
        format!("Add/Update image {}", self.filename)
    }

    /// Commit message for a single-image upload.
    pub fn upload_commit_message(&self) -> String {
        format!("Upload {}", self.filename)
    }

    /// Filename safety, non-empty content and size, in that order.
    pub fn validate(&self, max_base64_len: usize) -> Result<(), CoreError> {
        if self.filename.trim().is_empty() {
            return Err(CoreError::Validation("missing filename".into()));
        }
        validate_filename(&self.filename).map_err(CoreError::Validation)?;
        if self.content_base64.is_empty() {
            return Err(CoreError::Validation(format!(
                "{}: missing content_base64",
                self.filename
            )));
        }
        self.check_size(max_base64_len)
    }

    /// Reject payloads longer than `max_base64_len` characters.
    pub fn check_size(&self, max_base64_len: usize) -> Result<(), CoreError> {
        let len = self.content_base64.len();
        if len > max_base64_len {
            return Err(CoreError::Validation(format!(
                "Image {} too large: {len} base64 characters exceeds limit of {max_base64_len}",
                self.filename
            )));
        }
        Ok(())
    }
}

/// Asset as it arrives on the wire, before presence checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetInput {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_base64: Option<String>,
}

impl AssetInput {
    /// Check presence and filename safety for the asset at `index` of a
    /// batch. Errors are prefixed with `images[index]`.
    pub fn into_asset(self, index: usize) -> Result<Asset, CoreError> {
        self.check(Some(index))
    }

    /// Same checks for a standalone upload, which has no `images` array.
    pub fn into_single_asset(self) -> Result<Asset, CoreError> {
        self.check(None)
    }

    fn check(self, index: Option<usize>) -> Result<Asset, CoreError> {
        let label = |filename: Option<&str>| match (index, filename) {
            (Some(i), Some(f)) => format!("images[{i}] ({f}): "),
            (Some(i), None) => format!("images[{i}]: "),
            (None, Some(f)) => format!("{f}: "),
            (None, None) => String::new(),
        };

        let filename = self
            .filename
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| CoreError::Validation(format!("{}missing filename", label(None))))?;
        validate_filename(&filename)
            .map_err(|reason| CoreError::Validation(format!("{}{reason}", label(None))))?;

        let content_base64 = self
            .content_base64
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "{}missing content_base64",
                    label(Some(filename.as_str()))
                ))
            })?;

        Ok(Asset {
            filename,
            content_base64,
        })
    }
}

/// A filename must stay inside `media/`: no separators, no dot segments.
fn validate_filename(filename: &str) -> Result<(), String> {
    if filename.contains('/') || filename.contains('\\') {
        return Err(format!("filename '{filename}' must not contain path separators"));
    }
    if filename == "." || filename == ".." {
        return Err(format!("filename '{filename}' is not a file name"));
    }
    if filename.chars().any(char::is_control) {
        return Err("filename must not contain control characters".to_string());
    }
    Ok(())
}
