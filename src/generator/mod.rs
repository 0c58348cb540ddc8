//! Generator module - business logic for turning validated agreement data
//! into the finished PDF.
//!
//! The pipeline: `signature` normalizes the optional signature bitmap,
//! `token` derives the verification identifier and its QR image, and
//! `composer` lays out the single fixed A4 page and serializes it to bytes.

pub mod common;
pub mod composer;
pub mod signature;
pub mod token;
pub mod traits;

pub use composer::{AgreementJob, AgreementPdfGenerator};
pub use signature::{SignatureAsset, SignatureError, SignatureSource};
pub use token::VerificationToken;
pub use traits::{Generator, Validator};

use thiserror::Error;

/// Errors that can occur during document composition.
///
/// Either the full byte stream is produced or one of these is raised and no
/// output is returned; the composer never emits a truncated document.
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("failed to assemble page canvas: {0}")]
    Canvas(String),
    #[error("failed to embed image: {0}")]
    Image(String),
    #[error("failed to serialize document: {0}")]
    Serialize(String),
}

/// Result of a successful document generation.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// Unique download filename, `<client-slug>_<timestamp>_<suffix>.pdf`.
    pub filename: String,
    pub pdf: Vec<u8>,
    /// Verification identifier printed on the page and encoded in the QR.
    pub token_id: String,
    /// Display form of the generation date, e.g. "August 06, 2026".
    pub generated_on: String,
}
