use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

const ACCEPTED_MEDIA_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature must be a data URI")]
    NotDataUri,

    #[error("Unsupported signature media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Signature payload must be base64 encoded")]
    NotBase64,

    #[error("Signature image is empty")]
    Empty,
}

/// A finished signature image, stored as a `data:` URI
///
/// Construction validates the URI, so a value of this type is always a
/// complete still image and never a partial capture.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SignatureImage {
    uri: String,
    payload_offset: usize,
}

impl SignatureImage {
    /// Wrap encoded PNG bytes
    pub fn from_png(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.is_empty() {
            return Err(SignatureError::Empty);
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self::from_data_uri(format!("data:image/png;base64,{}", encoded))
    }

    pub fn from_data_uri(uri: impl Into<String>) -> Result<Self, SignatureError> {
        let uri = uri.into();
        let rest = uri
            .strip_prefix("data:")
            .ok_or(SignatureError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(SignatureError::NotDataUri)?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or(SignatureError::NotBase64)?;

        if !ACCEPTED_MEDIA_TYPES.contains(&media_type) {
            return Err(SignatureError::UnsupportedMediaType(media_type.to_string()));
        }
        if payload.is_empty() {
            return Err(SignatureError::Empty);
        }
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|_| SignatureError::NotBase64)?;

        let payload_offset = uri.len() - payload.len();
        Ok(Self {
            uri,
            payload_offset,
        })
    }

    pub fn as_data_uri(&self) -> &str {
        &self.uri
    }

    pub fn media_type(&self) -> &str {
        let header = &self.uri["data:".len()..self.payload_offset - 1];
        header.trim_end_matches(";base64")
    }

    /// Decoded image bytes
    pub fn bytes(&self) -> Vec<u8> {
        // Validated on construction
        base64::engine::general_purpose::STANDARD
            .decode(&self.uri[self.payload_offset..])
            .unwrap_or_default()
    }

    /// SHA-256 of the decoded image, hex encoded
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.bytes()))
    }
}

impl TryFrom<String> for SignatureImage {
    type Error = SignatureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_data_uri(value)
    }
}

impl From<SignatureImage> for String {
    fn from(image: SignatureImage) -> Self {
        image.uri
    }
}

impl fmt::Debug for SignatureImage {
    // Data URIs run to tens of kilobytes; keep logs readable.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureImage")
            .field("media_type", &self.media_type())
            .field("len", &self.uri.len())
            .finish()
    }
}
