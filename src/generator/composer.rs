//! Document composer - lays out the single fixed A4 agreement page and
//! serializes it to PDF bytes.
//!
//! The document has one known shape, so all geometry (band origins, row
//! heights, font sizes, image boxes) is fixed constants rather than a
//! computed layout. Composition is deterministic: identical input,
//! signature bytes and timestamp produce byte-identical output.

use chrono::{DateTime, Utc};
use image::{GrayImage, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use uuid::Uuid;

use super::common::{filename_slug, format_currency, format_display_date, truncate_line, wrap_text};
use super::signature::SignatureAsset;
use super::token::VerificationToken;
use super::traits::Generator;
use super::{CompositionError, GeneratedDocument};
use crate::agreement::models::AgreementInput;

// A4 in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 72.0;
const CONTENT_RIGHT: f32 = PAGE_WIDTH - MARGIN;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

// Brand palette.
const BRAND: Rgb = (0.122, 0.306, 0.475); // #1f4e79
const BLACK: Rgb = (0.0, 0.0, 0.0);
const KEY_FILL: Rgb = (0.973, 0.976, 0.980); // #f8f9fa
const GRID: Rgb = (0.871, 0.886, 0.898); // #dee2e6
const CAPTION_GRAY: Rgb = (0.4, 0.4, 0.4); // #666666

const TITLE_TEXT: &str = "CLIENT SERVICE AGREEMENT";
const TITLE_SIZE: f32 = 24.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 11.0;
const SMALL_SIZE: f32 = 9.0;
const FOOTNOTE_SIZE: f32 = 8.0;

// Header band.
const TITLE_X: f32 = 103.0; // centers the fixed title text
const TITLE_BASELINE: f32 = 762.0;
const DATE_BASELINE: f32 = 742.0;
const HEADER_RULE_Y: f32 = 732.0;

// Client-info table.
const TABLE_TOP: f32 = 706.0;
const ROW_HEIGHT: f32 = 24.0;
const KEY_COL_WIDTH: f32 = 150.0;
const CELL_PAD: f32 = 6.0;
const TEXT_DROP: f32 = 16.0; // baseline offset from a row's top edge
const VALUE_MAX_CHARS: usize = 52;

// Terms block. Text beyond the line capacity is truncated and flagged with
// a visible marker; the page never grows.
const TERMS_HEADING_BASELINE: f32 = 556.0;
const TERMS_BODY_TOP: f32 = 536.0;
const LINE_HEIGHT: f32 = 14.0;
const TERMS_MAX_LINES: usize = 8;
const WRAP_CHARS: usize = 82;
const TERMS_CONTINUED_MARKER: &str = "(continued - full terms on file)";

// Standard provisions block.
const PROVISIONS_HEADING_BASELINE: f32 = 398.0;
const PROVISIONS_BODY_TOP: f32 = 378.0;
const PROVISIONS_MAX_LINES: usize = 5;
const STANDARD_PROVISIONS: &str = "This agreement constitutes the entire agreement between \
the parties and supersedes all prior negotiations, representations, or agreements relating \
to the subject matter herein. This agreement shall be governed by the laws of the applicable \
jurisdiction. Any modifications to this agreement must be made in writing and signed by both \
parties.";

// Signature block.
const SIGNATURE_LABEL_BASELINE: f32 = 300.0;
const SIGNATURE_BOX_X: f32 = 222.0;
const SIGNATURE_BOX_Y: f32 = 276.0;
const SIGNATURE_BOX_W: f32 = 180.0;
const SIGNATURE_BOX_H: f32 = 54.0;
const SIGNATURE_LINE_Y: f32 = 282.0;
const SIGNATURE_LINE_LEN: f32 = 200.0;
const SIGNATURE_DATE_BASELINE: f32 = 252.0;
const SIGNATURE_NAME_BASELINE: f32 = 228.0;

// QR verification block.
const QR_SIZE: f32 = 72.0;
const QR_X: f32 = CONTENT_RIGHT - QR_SIZE;
const QR_Y: f32 = 130.0;
const QR_ID_BASELINE: f32 = 118.0;
const QR_CAPTION_BASELINE: f32 = 106.0;
const QR_CAPTION: &str = "Scan to verify";

// Footer band.
const FOOTER_RULE_Y: f32 = 96.0;
const FOOTER_DISCLAIMER_BASELINE: f32 = 82.0;
const FOOTER_PAGE_BASELINE: f32 = 70.0;
const FOOTER_ID_X: f32 = CONTENT_RIGHT - 140.0;
const DISCLAIMER: &str =
    "This document was generated electronically and is verifiable via the QR code above.";

type Rgb = (f32, f32, f32);

/// One fully-resolved generation request: validated input, optional
/// signature bitmap, and the injected generation instant.
#[derive(Debug, Clone)]
pub struct AgreementJob {
    pub input: AgreementInput,
    pub signature: Option<SignatureAsset>,
    pub generated_at: DateTime<Utc>,
}

/// Stateless composer for agreement documents.
pub struct AgreementPdfGenerator;

impl Generator<AgreementJob> for AgreementPdfGenerator {
    /// Derive the verification token, lay out the page, and return the
    /// finished document with its unique download filename.
    fn generate(&self, job: AgreementJob) -> Result<GeneratedDocument, CompositionError> {
        let token = VerificationToken::derive(&job.input, job.generated_at)
            .map_err(|e| CompositionError::Canvas(e.to_string()))?;
        let generated_on = format_display_date(job.generated_at.date_naive());

        let pdf = compose_page(&job.input, job.signature.as_ref(), &token, &generated_on)?;

        let slug = filename_slug(&job.input.client_name, "agreement");
        let suffix = Uuid::new_v4().simple().to_string();
        let filename = format!(
            "{}_{}_{}.pdf",
            slug,
            job.generated_at.format("%Y%m%d%H%M%S"),
            &suffix[..8]
        );

        Ok(GeneratedDocument {
            filename,
            pdf,
            token_id: token.id,
            generated_on,
        })
    }
}

/// Assemble the page objects and content stream, returning the serialized
/// document. On error nothing is returned; there is no partial output.
fn compose_page(
    input: &AgreementInput,
    signature: Option<&SignatureAsset>,
    token: &VerificationToken,
    generated_on: &str,
) -> Result<Vec<u8>, CompositionError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let font_bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let qr_id = doc.add_object(gray_image_xobject(&token.qr)?);
    let mut xobjects = Dictionary::new();
    xobjects.set("QrIm", Object::Reference(qr_id));
    if let Some(asset) = signature {
        let sig_id = doc.add_object(rgb_image_xobject(&asset.bitmap)?);
        xobjects.set("SigIm", Object::Reference(sig_id));
    }

    let operations = build_operations(input, signature, token, generated_on);
    let content = Content { operations };
    let encoded = content
        .encode()
        .map_err(|e| CompositionError::Canvas(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_regular_id,
            "F2" => font_bold_id,
        },
        "XObject" => Object::Dictionary(xobjects),
    };

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            (PAGE_WIDTH as i64).into(),
            (PAGE_HEIGHT as i64).into(),
        ],
        "Contents" => content_id,
        "Resources" => resources,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| CompositionError::Serialize(e.to_string()))?;
    Ok(bytes)
}

/// Build the full content stream, top band to footer.
fn build_operations(
    input: &AgreementInput,
    signature: Option<&SignatureAsset>,
    token: &VerificationToken,
    generated_on: &str,
) -> Vec<Operation> {
    let mut ops = Vec::new();

    // Header band.
    push_text(&mut ops, "F2", TITLE_SIZE, BRAND, TITLE_X, TITLE_BASELINE, TITLE_TEXT);
    push_text(
        &mut ops,
        "F1",
        SMALL_SIZE,
        CAPTION_GRAY,
        MARGIN,
        DATE_BASELINE,
        &format!("Generated on {generated_on}"),
    );
    push_fill_rect(&mut ops, BRAND, MARGIN, HEADER_RULE_Y, CONTENT_WIDTH, 2.0);

    // Client-info table.
    let rows = [
        ("Agreement Date:", generated_on.to_string()),
        ("Client Name:", input.client_name.clone()),
        (
            "Client Address:",
            truncate_line(&input.client_address, VALUE_MAX_CHARS),
        ),
        ("Agreement Amount:", format_currency(input.amount)),
        ("Agreement ID:", token.id.clone()),
    ];
    let table_bottom = TABLE_TOP - rows.len() as f32 * ROW_HEIGHT;

    for (i, (label, value)) in rows.iter().enumerate() {
        let row_top = TABLE_TOP - i as f32 * ROW_HEIGHT;
        push_fill_rect(
            &mut ops,
            KEY_FILL,
            MARGIN,
            row_top - ROW_HEIGHT,
            KEY_COL_WIDTH,
            ROW_HEIGHT,
        );
        let baseline = row_top - TEXT_DROP;
        push_text(&mut ops, "F2", BODY_SIZE, BLACK, MARGIN + CELL_PAD, baseline, label);
        push_text(
            &mut ops,
            "F1",
            BODY_SIZE,
            BLACK,
            MARGIN + KEY_COL_WIDTH + CELL_PAD,
            baseline,
            value,
        );
    }
    for i in 0..=rows.len() {
        let y = TABLE_TOP - i as f32 * ROW_HEIGHT;
        push_stroke_line(&mut ops, GRID, 1.0, MARGIN, y, CONTENT_RIGHT, y);
    }
    for x in [MARGIN, MARGIN + KEY_COL_WIDTH, CONTENT_RIGHT] {
        push_stroke_line(&mut ops, GRID, 1.0, x, table_bottom, x, TABLE_TOP);
    }

    // Terms block.
    push_text(
        &mut ops,
        "F2",
        HEADING_SIZE,
        BRAND,
        MARGIN,
        TERMS_HEADING_BASELINE,
        "TERMS AND CONDITIONS",
    );
    let term_lines = wrap_text(&input.terms, WRAP_CHARS);
    let truncated = term_lines.len() > TERMS_MAX_LINES;
    for (i, line) in term_lines.iter().take(TERMS_MAX_LINES).enumerate() {
        let y = TERMS_BODY_TOP - i as f32 * LINE_HEIGHT;
        push_text(&mut ops, "F1", BODY_SIZE, BLACK, MARGIN, y, line);
    }
    if truncated {
        let y = TERMS_BODY_TOP - TERMS_MAX_LINES as f32 * LINE_HEIGHT;
        push_text(
            &mut ops,
            "F1",
            BODY_SIZE,
            CAPTION_GRAY,
            MARGIN,
            y,
            TERMS_CONTINUED_MARKER,
        );
    }

    // Standard provisions.
    push_text(
        &mut ops,
        "F2",
        HEADING_SIZE,
        BRAND,
        MARGIN,
        PROVISIONS_HEADING_BASELINE,
        "STANDARD PROVISIONS",
    );
    let provision_lines = wrap_text(STANDARD_PROVISIONS, WRAP_CHARS);
    for (i, line) in provision_lines.iter().take(PROVISIONS_MAX_LINES).enumerate() {
        let y = PROVISIONS_BODY_TOP - i as f32 * LINE_HEIGHT;
        push_text(&mut ops, "F1", BODY_SIZE, BLACK, MARGIN, y, line);
    }

    // Signature block: scaled bitmap or a ruled blank line.
    push_text(
        &mut ops,
        "F2",
        BODY_SIZE,
        BLACK,
        MARGIN,
        SIGNATURE_LABEL_BASELINE,
        "Client Signature:",
    );
    match signature {
        Some(asset) => {
            let (w, h) = asset.bitmap.dimensions();
            let (dw, dh) = scale_into_box(w, h, SIGNATURE_BOX_W, SIGNATURE_BOX_H);
            let x = SIGNATURE_BOX_X + (SIGNATURE_BOX_W - dw) / 2.0;
            push_image(&mut ops, "SigIm", x, SIGNATURE_BOX_Y, dw, dh);
        }
        None => {
            push_stroke_line(
                &mut ops,
                BLACK,
                1.0,
                SIGNATURE_BOX_X,
                SIGNATURE_LINE_Y,
                SIGNATURE_BOX_X + SIGNATURE_LINE_LEN,
                SIGNATURE_LINE_Y,
            );
        }
    }
    push_text(&mut ops, "F2", BODY_SIZE, BLACK, MARGIN, SIGNATURE_DATE_BASELINE, "Date:");
    push_text(
        &mut ops,
        "F1",
        BODY_SIZE,
        BLACK,
        SIGNATURE_BOX_X,
        SIGNATURE_DATE_BASELINE,
        generated_on,
    );
    push_text(
        &mut ops,
        "F2",
        BODY_SIZE,
        BLACK,
        MARGIN,
        SIGNATURE_NAME_BASELINE,
        "Print Name:",
    );
    push_text(
        &mut ops,
        "F1",
        BODY_SIZE,
        BLACK,
        SIGNATURE_BOX_X,
        SIGNATURE_NAME_BASELINE,
        &input.client_name,
    );

    // QR verification block.
    push_image(&mut ops, "QrIm", QR_X, QR_Y, QR_SIZE, QR_SIZE);
    push_text(&mut ops, "F1", SMALL_SIZE, BLACK, QR_X + 6.0, QR_ID_BASELINE, &token.id);
    push_text(
        &mut ops,
        "F1",
        FOOTNOTE_SIZE,
        CAPTION_GRAY,
        QR_X + 10.0,
        QR_CAPTION_BASELINE,
        QR_CAPTION,
    );

    // Footer band.
    push_fill_rect(&mut ops, GRID, MARGIN, FOOTER_RULE_Y, CONTENT_WIDTH, 0.75);
    push_text(
        &mut ops,
        "F1",
        FOOTNOTE_SIZE,
        CAPTION_GRAY,
        MARGIN,
        FOOTER_DISCLAIMER_BASELINE,
        DISCLAIMER,
    );
    push_text(
        &mut ops,
        "F1",
        FOOTNOTE_SIZE,
        CAPTION_GRAY,
        MARGIN,
        FOOTER_PAGE_BASELINE,
        "Page 1 of 1",
    );
    push_text(
        &mut ops,
        "F1",
        FOOTNOTE_SIZE,
        CAPTION_GRAY,
        FOOTER_ID_X,
        FOOTER_PAGE_BASELINE,
        &format!("Document ID: {}", token.id),
    );

    ops
}

fn push_text(
    ops: &mut Vec<Operation>,
    font: &str,
    size: f32,
    color: Rgb,
    x: f32,
    y: f32,
    text: &str,
) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "rg",
        vec![
            Object::Real(color.0),
            Object::Real(color.1),
            Object::Real(color.2),
        ],
    ));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size)],
    ));
    ops.push(Operation::new(
        "Td",
        vec![Object::Real(x), Object::Real(y)],
    ));
    ops.push(Operation::new("Tj", vec![pdf_string(text)]));
    ops.push(Operation::new("ET", vec![]));
}

fn push_fill_rect(ops: &mut Vec<Operation>, color: Rgb, x: f32, y: f32, w: f32, h: f32) {
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "rg",
        vec![
            Object::Real(color.0),
            Object::Real(color.1),
            Object::Real(color.2),
        ],
    ));
    ops.push(Operation::new(
        "re",
        vec![
            Object::Real(x),
            Object::Real(y),
            Object::Real(w),
            Object::Real(h),
        ],
    ));
    ops.push(Operation::new("f", vec![]));
    ops.push(Operation::new("Q", vec![]));
}

fn push_stroke_line(
    ops: &mut Vec<Operation>,
    color: Rgb,
    width: f32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
) {
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "RG",
        vec![
            Object::Real(color.0),
            Object::Real(color.1),
            Object::Real(color.2),
        ],
    ));
    ops.push(Operation::new("w", vec![Object::Real(width)]));
    ops.push(Operation::new(
        "m",
        vec![Object::Real(x1), Object::Real(y1)],
    ));
    ops.push(Operation::new(
        "l",
        vec![Object::Real(x2), Object::Real(y2)],
    ));
    ops.push(Operation::new("S", vec![]));
    ops.push(Operation::new("Q", vec![]));
}

fn push_image(ops: &mut Vec<Operation>, name: &str, x: f32, y: f32, w: f32, h: f32) {
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "cm",
        vec![
            Object::Real(w),
            Object::Real(0.0),
            Object::Real(0.0),
            Object::Real(h),
            Object::Real(x),
            Object::Real(y),
        ],
    ));
    ops.push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
    ops.push(Operation::new("Q", vec![]));
}

/// Encode text as a PDF literal string in WinAnsi (Latin-1) bytes. Code
/// points outside the encoding are replaced, never dropped.
fn pdf_string(text: &str) -> Object {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if code < 256 {
                code as u8
            } else {
                b'?'
            }
        })
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

/// Fit image dimensions into a bounding box preserving aspect ratio.
fn scale_into_box(width: u32, height: u32, box_w: f32, box_h: f32) -> (f32, f32) {
    let scale = (box_w / width as f32).min(box_h / height as f32);
    (width as f32 * scale, height as f32 * scale)
}

fn rgb_image_xobject(image: &RgbImage) -> Result<Stream, CompositionError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(CompositionError::Image("empty signature bitmap".to_string()));
    }
    Ok(image_xobject_stream(width, height, "DeviceRGB", image.as_raw().clone()))
}

fn gray_image_xobject(image: &GrayImage) -> Result<Stream, CompositionError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(CompositionError::Image("empty barcode bitmap".to_string()));
    }
    Ok(image_xobject_stream(width, height, "DeviceGray", image.as_raw().clone()))
}

/// Raw (uncompressed) raster XObject; re-encoding every source to raw
/// pixels keeps the output independent of the input container.
fn image_xobject_stream(width: u32, height: u32, color_space: &str, data: Vec<u8>) -> Stream {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(width)));
    dict.set("Height", Object::Integer(i64::from(height)));
    dict.set(
        "ColorSpace",
        Object::Name(color_space.as_bytes().to_vec()),
    );
    dict.set("BitsPerComponent", Object::Integer(8));
    Stream::new(dict, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_into_box_preserves_aspect() {
        let (w, h) = scale_into_box(400, 100, 180.0, 54.0);
        assert!((w - 180.0).abs() < 0.01);
        assert!((h - 45.0).abs() < 0.01);

        let (w, h) = scale_into_box(100, 400, 180.0, 54.0);
        assert!((h - 54.0).abs() < 0.01);
        assert!((w - 13.5).abs() < 0.01);
    }

    #[test]
    fn test_pdf_string_replaces_non_latin1() {
        let obj = pdf_string("café \u{2014} ok");
        match obj {
            Object::String(bytes, _) => {
                assert_eq!(bytes, b"caf\xe9 ? ok".to_vec());
            }
            other => panic!("expected string object, got {other:?}"),
        }
    }

    #[test]
    fn test_layout_fits_single_page() {
        // Lowest body element must stay above the footer band.
        let terms_bottom = TERMS_BODY_TOP - TERMS_MAX_LINES as f32 * LINE_HEIGHT;
        assert!(terms_bottom > PROVISIONS_HEADING_BASELINE);
        let provisions_bottom = PROVISIONS_BODY_TOP - (PROVISIONS_MAX_LINES - 1) as f32 * LINE_HEIGHT;
        assert!(provisions_bottom > SIGNATURE_LABEL_BASELINE);
        assert!(QR_Y > FOOTER_RULE_Y);
        assert!(PAGE_HEIGHT > TITLE_BASELINE);
    }
}
