use actix_multipart::Multipart;
use actix_web::HttpResponse;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::agreement::models::AgreementRequest;
use crate::ErrorResponse;

/// Agreement form fields extracted from one multipart submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct ParsedAgreementForm {
    pub metadata: AgreementRequest,
    /// Uploaded signature image bytes plus the declared content type.
    pub signature_file: Option<(Vec<u8>, Option<String>)>,
    /// Drawing-canvas export (base64 PNG, possibly a data URL).
    pub signature_drawn: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MultipartParseError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("Missing or invalid metadata: {0}")]
    MetadataError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Invalid UTF-8 data: {0}")]
    Utf8Error(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<MultipartParseError> for HttpResponse {
    fn from(error: MultipartParseError) -> Self {
        match error {
            MultipartParseError::MetadataError(_)
            | MultipartParseError::Utf8Error(_)
            | MultipartParseError::SerializationError(_) => {
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&format!("{}", error)))
            }
            _ => HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&format!("{}", error))),
        }
    }
}

pub struct AgreementMultipartParser;

impl AgreementMultipartParser {
    /// Parse the agreement submission: a required `metadata` JSON part and
    /// optional `signature` (file) / `signature_drawn` (base64) parts.
    /// Unknown parts are skipped.
    pub async fn parse(
        mut multipart: Multipart,
    ) -> Result<ParsedAgreementForm, MultipartParseError> {
        let mut metadata: Option<AgreementRequest> = None;
        let mut signature_file: Option<(Vec<u8>, Option<String>)> = None;
        let mut signature_drawn: Option<String> = None;

        while let Some(item) = multipart.next().await {
            let mut field = item.map_err(|e| MultipartParseError::FieldError(e.to_string()))?;
            let content_disposition = field.content_disposition().ok_or_else(|| {
                MultipartParseError::FieldError("Content disposition not found".to_string())
            })?;
            let name = content_disposition
                .get_name()
                .ok_or_else(|| MultipartParseError::FieldError("Field name not found".to_string()))?
                .to_string();
            let content_type = field.content_type().map(|mime| mime.to_string());

            let mut buffer = Vec::new();
            while let Some(chunk) = field.next().await {
                let data = chunk.map_err(|e| MultipartParseError::IoError(e.to_string()))?;
                buffer.extend_from_slice(&data);
            }

            match name.as_str() {
                "metadata" => {
                    let metadata_str = String::from_utf8(buffer)
                        .map_err(|e| MultipartParseError::Utf8Error(e.to_string()))?;
                    let parsed: AgreementRequest = serde_json::from_str(&metadata_str)
                        .map_err(|e| MultipartParseError::SerializationError(e.to_string()))?;
                    metadata = Some(parsed);
                }
                "signature" => {
                    if !buffer.is_empty() {
                        signature_file = Some((buffer, content_type));
                    }
                }
                "signature_drawn" => {
                    let payload = String::from_utf8(buffer)
                        .map_err(|e| MultipartParseError::Utf8Error(e.to_string()))?;
                    if !payload.trim().is_empty() {
                        signature_drawn = Some(payload);
                    }
                }
                _ => continue,
            }
        }

        let metadata = metadata.ok_or_else(|| {
            MultipartParseError::MetadataError(
                "multipart payload has no 'metadata' field".to_string(),
            )
        })?;

        Ok(ParsedAgreementForm {
            metadata,
            signature_file,
            signature_drawn,
        })
    }
}
