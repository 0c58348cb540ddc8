use chrono::{DateTime, TimeZone, Utc};
use image::RgbImage;

use agreement_server::agreement::models::{AgreementInput, AgreementRequest};
use agreement_server::generator::{
    AgreementJob, AgreementPdfGenerator, Generator, SignatureAsset, SignatureSource,
    VerificationToken,
};

fn sample_input() -> AgreementInput {
    AgreementInput::from_request(&AgreementRequest {
        client_name: "John Smith".to_string(),
        client_address: "123 Main Street, Anytown, ST 12345".to_string(),
        amount: "5000.00".to_string(),
        terms: "Consulting services for 6 months.".to_string(),
    })
    .expect("sample input must validate")
}

fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
}

fn job(signature: Option<SignatureAsset>) -> AgreementJob {
    AgreementJob {
        input: sample_input(),
        signature,
        generated_at: fixed_instant(),
    }
}

fn drawn_signature() -> SignatureAsset {
    SignatureAsset {
        bitmap: RgbImage::from_pixel(400, 150, image::Rgb([20, 20, 20])),
        source: SignatureSource::Drawn,
    }
}

fn page_content(pdf: &[u8]) -> String {
    let doc = lopdf::Document::load_mem(pdf).expect("output must parse as PDF");
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1, "agreement must be a single page");
    let page_id = *pages.values().next().unwrap();
    let content = doc.get_page_content(page_id).unwrap();
    String::from_utf8_lossy(&content).into_owned()
}

#[test]
fn test_valid_input_produces_single_a4_page() {
    let document = AgreementPdfGenerator.generate(job(None)).unwrap();
    assert!(!document.pdf.is_empty());

    let doc = lopdf::Document::load_mem(&document.pdf).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1);

    let page_id = *pages.values().next().unwrap();
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(media_box[2].as_i64().unwrap(), 595);
    assert_eq!(media_box[3].as_i64().unwrap(), 842);
}

#[test]
fn test_composition_is_byte_identical_for_identical_input() {
    let a = AgreementPdfGenerator.generate(job(Some(drawn_signature()))).unwrap();
    let b = AgreementPdfGenerator.generate(job(Some(drawn_signature()))).unwrap();

    assert_eq!(a.pdf, b.pdf);
    assert_eq!(a.token_id, b.token_id);
    // Filenames are intentionally unique per request.
    assert_ne!(a.filename, b.filename);
}

#[test]
fn test_page_contains_client_details_and_token() {
    let document = AgreementPdfGenerator.generate(job(None)).unwrap();
    let content = page_content(&document.pdf);

    assert!(content.contains("John Smith"));
    assert!(content.contains("$5,000.00"));
    assert!(content.contains("CLIENT SERVICE AGREEMENT"));
    assert!(content.contains(&document.token_id));
}

#[test]
fn test_printed_identifier_matches_derived_token() {
    let token = VerificationToken::derive(&sample_input(), fixed_instant()).unwrap();
    let document = AgreementPdfGenerator.generate(job(None)).unwrap();

    assert_eq!(document.token_id, token.id);
    let content = page_content(&document.pdf);
    assert!(content.contains(&token.id));
}

#[test]
fn test_missing_signature_renders_labeled_blank_line() {
    let document = AgreementPdfGenerator.generate(job(None)).unwrap();
    let content = page_content(&document.pdf);
    assert!(content.contains("Client Signature:"));

    let doc = lopdf::Document::load_mem(&document.pdf).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    assert!(xobjects.has(b"QrIm"));
    assert!(!xobjects.has(b"SigIm"));
}

#[test]
fn test_supplied_signature_is_embedded() {
    let document = AgreementPdfGenerator
        .generate(job(Some(drawn_signature())))
        .unwrap();

    let doc = lopdf::Document::load_mem(&document.pdf).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    assert!(xobjects.has(b"SigIm"));
    assert!(xobjects.has(b"QrIm"));
}

#[test]
fn test_oversized_terms_truncate_with_marker_consistently() {
    let mut request = AgreementRequest {
        client_name: "Jane Doe".to_string(),
        client_address: "1 First Ave".to_string(),
        amount: "250.00".to_string(),
        terms: "All work products remain the property of the client upon payment. "
            .repeat(60),
    };
    request.terms.push_str("Final clause.");
    let input = AgreementInput::from_request(&request).unwrap();

    let make_job = || AgreementJob {
        input: input.clone(),
        signature: None,
        generated_at: fixed_instant(),
    };

    let first = AgreementPdfGenerator.generate(make_job()).unwrap();
    let second = AgreementPdfGenerator.generate(make_job()).unwrap();

    let content = page_content(&first.pdf);
    assert!(content.contains("continued - full terms on file"));
    // Still exactly one page, and the policy is stable across runs.
    assert_eq!(first.pdf, second.pdf);
}

#[test]
fn test_short_terms_have_no_truncation_marker() {
    let document = AgreementPdfGenerator.generate(job(None)).unwrap();
    let content = page_content(&document.pdf);
    assert!(!content.contains("continued - full terms on file"));
}

#[test]
fn test_filename_is_slugged_and_unique() {
    let a = AgreementPdfGenerator.generate(job(None)).unwrap();
    let b = AgreementPdfGenerator.generate(job(None)).unwrap();

    assert!(a.filename.starts_with("john-smith_20260806120000_"));
    assert!(a.filename.ends_with(".pdf"));
    assert_ne!(a.filename, b.filename);
}
