use crate::application::session::SessionKey;
use base64::Engine;
use image::{ImageFormat, Luma};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use qrcode::render::svg;
use qrcode::QrCode;
use std::io::Cursor;
use thiserror::Error;
use url::Url;

/// Fragment prefix of a signing link
pub const SIGN_ROUTE_PREFIX: &str = "#/sign/";

/// Longest link still rendered as a scannable code
pub const MAX_LINK_LEN: usize = 2048;

/// Characters escaped inside a single route segment
pub const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

const QR_MIN_SIZE: u32 = 240;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Invalid public origin: {0}")]
    InvalidOrigin(String),

    #[error("Signing link is {0} bytes, limit is {}", MAX_LINK_LEN)]
    TooLong(usize),

    #[error("Failed to build QR code: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("Failed to encode QR image: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningLink {
    pub url: String,
    pub fragment: String,
}

/// Builds shareable signing links for the public address of the app
#[derive(Debug, Clone)]
pub struct LinkGenerator {
    // origin + path, no fragment
    base: String,
}

impl LinkGenerator {
    pub fn new(origin: &str, path: &str) -> Result<Self, LinkError> {
        let origin_url =
            Url::parse(origin).map_err(|e| LinkError::InvalidOrigin(format!("{}: {}", origin, e)))?;
        if !matches!(origin_url.scheme(), "http" | "https") || !origin_url.has_host() {
            return Err(LinkError::InvalidOrigin(origin.to_string()));
        }

        let mut url = origin_url;
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self {
            base: url.to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn fragment_for(key: &SessionKey) -> String {
        format!(
            "{}{}/{}",
            SIGN_ROUTE_PREFIX,
            utf8_percent_encode(&key.record_id, SEGMENT),
            key.role.as_str()
        )
    }

    pub fn link_for(&self, key: &SessionKey) -> Result<SigningLink, LinkError> {
        let fragment = Self::fragment_for(key);
        let url = format!("{}{}", self.base, fragment);
        if url.len() > MAX_LINK_LEN {
            return Err(LinkError::TooLong(url.len()));
        }
        Ok(SigningLink { url, fragment })
    }
}

impl SigningLink {
    pub fn qr_code(&self) -> Result<QrCode, LinkError> {
        Ok(QrCode::new(self.url.as_bytes())?)
    }

    pub fn qr_svg(&self) -> Result<String, LinkError> {
        let code = self.qr_code()?;
        Ok(code
            .render::<svg::Color<'_>>()
            .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
            .build())
    }

    pub fn qr_png_data_uri(&self) -> Result<String, LinkError> {
        let code = self.qr_code()?;
        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
            .build();

        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}
