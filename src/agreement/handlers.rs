use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use log::{error, info};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::agreement::models::{AgreementInput, AgreementRequest, AgreementResponse};
use crate::agreement::multipart_parser::AgreementMultipartParser;
use crate::generator::composer::{AgreementJob, AgreementPdfGenerator};
use crate::generator::traits::Generator;
use crate::generator::{signature, SignatureError};
use crate::storage::DeliveryError;
use crate::{AppState, ErrorResponse};

/// Multipart shape of the agreement submission, for the API docs.
#[derive(Debug, Serialize, ToSchema)]
pub struct AgreementFormDoc {
    /// JSON-encoded [`AgreementRequest`].
    pub metadata: AgreementRequest,
    /// Optional signature image upload (PNG or JPEG).
    #[schema(value_type = Option<String>, format = Binary)]
    pub signature: Option<String>,
    /// Optional drawn signature as a base64 PNG data URL.
    pub signature_drawn: Option<String>,
}

#[utoipa::path(
    context_path = "/api",
    tag = "Agreement Service",
    post,
    path = "/agreements",
    request_body(content = inline(AgreementFormDoc), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Agreement PDF generated", body = AgreementResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 415, description = "Unsupported signature image format", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    )
)]
pub async fn create_agreement(payload: Multipart, data: web::Data<AppState>) -> impl Responder {
    let form = match AgreementMultipartParser::parse(payload).await {
        Ok(form) => form,
        Err(e) => return HttpResponse::from(e),
    };

    let input = match AgreementInput::from_request(&form.metadata) {
        Ok(input) => input,
        Err(errors) => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::bad_request(&errors.to_message()))
        }
    };

    let uploaded = form
        .signature_file
        .as_ref()
        .map(|(bytes, content_type)| (bytes.as_slice(), content_type.as_deref()));
    let resolved = match signature::resolve(form.signature_drawn.as_deref(), uploaded) {
        Ok(resolved) => resolved,
        Err(e @ SignatureError::UnsupportedFormat(_)) => {
            return HttpResponse::UnsupportedMediaType()
                .json(ErrorResponse::new("UnsupportedImageFormat", &e.to_string()))
        }
        Err(e) => return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string())),
    };

    let job = AgreementJob {
        input,
        signature: resolved,
        generated_at: Utc::now(),
    };
    let document = match AgreementPdfGenerator.generate(job) {
        Ok(document) => document,
        Err(e) => {
            error!("agreement composition failed: {e}");
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("PDF generation failed"));
        }
    };

    match data.delivery.store(&document) {
        Ok(ticket) => {
            data.generated.inc();
            info!(
                "generated agreement {} ({} bytes)",
                ticket.filename, ticket.size_bytes
            );
            HttpResponse::Created().json(AgreementResponse {
                id: ticket.id,
                download_url: format!("/api/agreements/{}/download", ticket.id),
                filename: ticket.filename,
                token: document.token_id,
                size_bytes: ticket.size_bytes,
            })
        }
        Err(e) => {
            error!("failed to persist agreement artifact: {e}");
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("PDF generation failed"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Agreement Service",
    get,
    path = "/agreements/{id}/download",
    responses(
        (status = 200, description = "The generated PDF, served as an attachment"),
        (status = 404, description = "Unknown, expired or already downloaded", body = ErrorResponse),
        (status = 500, description = "Artifact could not be read", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Ticket ID returned by the create endpoint")
    )
)]
pub async fn download_agreement(
    id: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.delivery.take(&id.into_inner()) {
        Ok((filename, bytes)) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{filename}\""),
            ))
            .body(bytes),
        Err(DeliveryError::NotFound) => HttpResponse::NotFound().json(ErrorResponse::not_found(
            "Agreement not found, expired, or already downloaded",
        )),
        Err(e) => {
            error!("failed to serve agreement artifact: {e}");
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Download failed"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Agreement Service",
    get,
    path = "/agreements/sample",
    responses(
        (status = 200, description = "Demo form payload", body = AgreementRequest)
    )
)]
pub async fn sample_agreement() -> impl Responder {
    HttpResponse::Ok().json(AgreementRequest {
        client_name: "John Smith".to_string(),
        client_address: "123 Main Street\nAnytown, ST 12345\nUnited States".to_string(),
        amount: "5000.00".to_string(),
        terms: "This agreement covers consulting services for a period of 6 months. \
                Services include strategic planning, market analysis, and implementation \
                support. Payment terms: 50% upfront, 50% upon completion."
            .to_string(),
    })
}

#[utoipa::path(
    tag = "Agreement Service",
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
