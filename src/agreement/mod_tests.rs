use crate::agreement::models::{AgreementInput, AgreementRequest};
use crate::agreement::validation::{validate_amount, validate_required, ValidationErrors};
use crate::generator::traits::Validator;

fn request(name: &str, address: &str, amount: &str, terms: &str) -> AgreementRequest {
    AgreementRequest {
        client_name: name.to_string(),
        client_address: address.to_string(),
        amount: amount.to_string(),
        terms: terms.to_string(),
    }
}

#[test]
fn test_valid_request_produces_input() {
    let req = request(
        "John Smith",
        "123 Main Street, Anytown, ST 12345",
        "5000.00",
        "Consulting services for 6 months.",
    );
    let input = AgreementInput::from_request(&req).unwrap();

    assert_eq!(input.client_name, "John Smith");
    assert_eq!(input.amount, 5000.0);
    assert_eq!(input.terms, "Consulting services for 6 months.");
}

#[test]
fn test_currency_formatted_amount_is_accepted() {
    let req = request("Jane Doe", "1 First Ave", "$5,000.00", "");
    let input = AgreementInput::from_request(&req).unwrap();
    assert_eq!(input.amount, 5000.0);
}

#[test]
fn test_zero_negative_and_non_numeric_amounts_fail() {
    for bad in ["0", "-5", "abc"] {
        let req = request("Jane Doe", "1 First Ave", bad, "");
        let errors = AgreementInput::from_request(&req).unwrap_err();
        assert_eq!(errors.len(), 1, "amount {bad:?} should fail validation");
    }
}

#[test]
fn test_empty_name_and_address_are_both_reported() {
    let req = request("", "   ", "100.00", "");
    let errors = AgreementInput::from_request(&req).unwrap_err();
    assert_eq!(errors.len(), 2);

    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"client_name"));
    assert!(fields.contains(&"client_address"));
}

#[test]
fn test_multiline_address_is_flattened() {
    let req = request(
        "John Smith",
        "123 Main Street\nAnytown, ST 12345\n\nUnited States",
        "1.00",
        "",
    );
    let input = AgreementInput::from_request(&req).unwrap();
    assert_eq!(
        input.client_address,
        "123 Main Street, Anytown, ST 12345, United States"
    );
}

#[test]
fn test_validator_trait_reports_messages() {
    let req = request("", "1 First Ave", "abc", "");
    let message = Validator::validate(&req).unwrap_err();
    assert!(message.contains("Client Name"));
    assert!(message.contains("not a valid number"));
}

#[test]
fn test_validate_required_trims_whitespace() {
    let mut errors = ValidationErrors::new();
    validate_required("  \t ", "field", "Field", &mut errors);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_validate_amount_returns_parsed_value() {
    let mut errors = ValidationErrors::new();
    let amount = validate_amount(" $1,234.56 ", "amount", &mut errors);
    assert!(errors.is_empty());
    assert_eq!(amount, Some(1234.56));
}
