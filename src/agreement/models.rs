use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::agreement::validation::{validate_amount, validate_required, ValidationErrors};
use crate::generator::traits::Validator;

/// Raw agreement form payload, as submitted in the `metadata` multipart
/// part. All fields arrive as text; validation and typing happen in
/// [`AgreementInput::from_request`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AgreementRequest {
    #[schema(example = "John Smith")]
    pub client_name: String,
    #[schema(example = "123 Main Street, Anytown, ST 12345")]
    pub client_address: String,
    /// Currency-formatted amount text, e.g. "5000.00" or "$5,000.00".
    #[schema(example = "5000.00")]
    pub amount: String,
    #[schema(example = "Consulting services for a period of 6 months.")]
    #[serde(default)]
    pub terms: String,
}

impl Validator for AgreementRequest {
    fn validate(&self) -> Result<(), String> {
        AgreementInput::from_request(self)
            .map(|_| ())
            .map_err(|errors| errors.to_message())
    }
}

/// Validated, immutable agreement record for one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct AgreementInput {
    pub client_name: String,
    /// Single-line address; newlines in the submitted text are flattened.
    pub client_address: String,
    pub amount: f64,
    pub terms: String,
}

impl AgreementInput {
    /// Validate a raw request, collecting every violation.
    pub fn from_request(request: &AgreementRequest) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_required(
            &request.client_name,
            "client_name",
            "Client Name",
            &mut errors,
        );
        validate_required(
            &request.client_address,
            "client_address",
            "Client Address",
            &mut errors,
        );
        let amount = validate_amount(&request.amount, "amount", &mut errors);

        match (errors.is_empty(), amount) {
            (true, Some(amount)) => Ok(Self {
                client_name: request.client_name.trim().to_string(),
                client_address: flatten_address(&request.client_address),
                amount,
                terms: request.terms.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

fn flatten_address(address: &str) -> String {
    address
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Receipt returned after a successful generation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgreementResponse {
    #[schema(example = "f1e2d3c4-b5a6-7890-1234-567890abcdef")]
    pub id: Uuid,
    #[schema(example = "john-smith_20260806120000_a1b2c3d4.pdf")]
    pub filename: String,
    /// Verification identifier printed on the document and encoded in its
    /// QR code.
    #[schema(example = "AGR-9F2C41AB")]
    pub token: String,
    pub size_bytes: usize,
    #[schema(example = "/api/agreements/f1e2d3c4-b5a6-7890-1234-567890abcdef/download")]
    pub download_url: String,
}
