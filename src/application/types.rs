use crate::application::link::SigningLink;
use crate::application::session::SessionKey;
use crate::domain::SignerRole;
use serde::{Deserialize, Serialize};

/// Signing link handed to the operator, with its scannable code
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningLinkResponse {
    pub record_id: String,
    pub role: SignerRole,
    /// Full URL to open on the signing device
    pub url: String,
    /// `#/sign/{recordId}/{role}`
    pub fragment: String,
    /// QR code of `url` as an SVG document
    pub qr_svg: String,
}

impl SigningLinkResponse {
    pub fn new(key: &SessionKey, link: SigningLink, qr_svg: String) -> Self {
        Self {
            record_id: key.record_id.clone(),
            role: key.role,
            url: link.url,
            fragment: link.fragment,
            qr_svg,
        }
    }
}

/// Body of a successful write
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
