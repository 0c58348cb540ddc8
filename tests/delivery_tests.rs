use chrono::{TimeZone, Utc};

use agreement_server::agreement::models::{AgreementInput, AgreementRequest};
use agreement_server::generator::{AgreementJob, AgreementPdfGenerator, Generator};
use agreement_server::storage::{DeliveryError, DeliveryStore};

fn generated_document() -> agreement_server::generator::GeneratedDocument {
    let input = AgreementInput::from_request(&AgreementRequest {
        client_name: "John Smith".to_string(),
        client_address: "123 Main Street, Anytown, ST 12345".to_string(),
        amount: "5000.00".to_string(),
        terms: "Consulting services for 6 months.".to_string(),
    })
    .unwrap();

    AgreementPdfGenerator
        .generate(AgreementJob {
            input,
            signature: None,
            generated_at: Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap(),
        })
        .unwrap()
}

#[test]
fn test_store_and_one_shot_download_of_real_document() {
    let store = DeliveryStore::new().unwrap();
    let document = generated_document();

    let ticket = store.store(&document).unwrap();
    assert_eq!(ticket.filename, document.filename);
    assert_eq!(ticket.size_bytes, document.pdf.len());

    let (filename, bytes) = store.take(&ticket.id).unwrap();
    assert_eq!(filename, document.filename);
    assert_eq!(bytes, document.pdf);

    // The artifact is gone after the first download.
    assert!(matches!(
        store.take(&ticket.id),
        Err(DeliveryError::NotFound)
    ));
    assert_eq!(store.pending_count(), 0);
}

#[test]
fn test_concurrent_requests_for_same_client_never_collide() {
    let store = DeliveryStore::new().unwrap();
    let first = generated_document();
    let second = generated_document();
    assert_ne!(first.filename, second.filename);

    let ticket_a = store.store(&first).unwrap();
    let ticket_b = store.store(&second).unwrap();
    assert_eq!(store.pending_count(), 2);

    let (name_a, bytes_a) = store.take(&ticket_a.id).unwrap();
    let (name_b, bytes_b) = store.take(&ticket_b.id).unwrap();
    assert_ne!(name_a, name_b);
    assert_eq!(bytes_a, first.pdf);
    assert_eq!(bytes_b, second.pdf);
}
