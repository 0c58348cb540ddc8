//! Verification token derivation and QR rendering.
//!
//! The token seals the client name, the amount in cents and the generation
//! instant into a short identifier that is both printed on the document and
//! encoded in its QR code, so a scanned code can be checked against the
//! printed one.

use chrono::{DateTime, Utc};
use image::{GrayImage, Luma};
use qrcode::QrCode;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::agreement::models::AgreementInput;

/// QR payloads are truncated to this length instead of failing encoding.
pub const MAX_QR_PAYLOAD: usize = 64;

/// Minimum rendered QR edge in pixels, print quality at the embedded size.
const MIN_QR_PIXELS: u32 = 200;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("verification code encoding failed: {0}")]
    Encode(String),
}

/// A verification identifier plus its rendered QR bitmap.
#[derive(Debug, Clone)]
pub struct VerificationToken {
    /// Short human-typable identifier, e.g. `AGR-9F2C41AB`.
    pub id: String,
    pub qr: GrayImage,
}

impl VerificationToken {
    /// Derive the token for one generation request.
    ///
    /// Deterministic: the same input and the same timestamp always produce
    /// the same identifier and the same QR bitmap.
    pub fn derive(
        input: &AgreementInput,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, TokenError> {
        let cents = (input.amount * 100.0).round() as i64;
        let material = format!(
            "{}|{}|{}",
            input.client_name,
            cents,
            generated_at.format("%Y-%m-%dT%H:%M:%SZ")
        );

        let digest = Sha256::digest(material.as_bytes());
        let mut id = String::from("AGR-");
        for byte in &digest[..4] {
            id.push_str(&format!("{byte:02X}"));
        }

        let qr = render_qr(&id)?;
        Ok(Self { id, qr })
    }
}

fn render_qr(payload: &str) -> Result<GrayImage, TokenError> {
    let bytes = payload.as_bytes();
    let bounded = &bytes[..bytes.len().min(MAX_QR_PAYLOAD)];

    let code = QrCode::new(bounded).map_err(|e| TokenError::Encode(e.to_string()))?;
    Ok(code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_QR_PIXELS, MIN_QR_PIXELS)
        .build())
}
