mod common;

use chrono::{DateTime, TimeZone, Utc};
use std::io::Write;
use uuid::Uuid;

use printer_service_server::case::model::{Case, CaseStatus};
use printer_service_server::documents::intake_receipt::signature_top;
use printer_service_server::documents::layout::{DocumentLayout, DrawOp, PageGeometry};
use printer_service_server::documents::logo::{load_logo, AssetSource, FileAssetSource};
use printer_service_server::documents::{
    ComposeContext, Composer, DeliveryCertificate, DocumentComposer, DocumentSettings,
    IntakeReceipt, ListingReport, PdfRenderEngine, PreparedLogo,
};

fn intake_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 14, 30, 0).unwrap()
}

fn case_with_notes(case_number: i64, notes: Option<String>) -> Case {
    Case {
        id: Uuid::new_v4(),
        case_number,
        reference: "HP M404dn".to_string(),
        client_name: "Ana Ruiz".to_string(),
        client_tax_id: "123".to_string(),
        phone: "3000000000".to_string(),
        notes,
        intake_at: intake_time(),
        delivered_at: None,
        status: CaseStatus::Pending,
        status_changed_at: intake_time(),
        resolution_note: None,
        process_note: None,
    }
}

fn compose<I: ?Sized, C: Composer<I>>(
    composer: &C,
    input: &I,
    logo: Option<&PreparedLogo>,
) -> DocumentLayout {
    let settings = DocumentSettings::default();
    let ctx = ComposeContext {
        settings: &settings,
        logo,
        now: Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap(),
    };
    composer.compose(input, &ctx)
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Text drawn on every page of a rendered PDF, in drawing order.
fn pdf_text(pdf: &[u8]) -> String {
    let doc = printpdf::lopdf::Document::load_mem(pdf).unwrap();
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages).unwrap()
}

fn assert_within_margins(layout: &DocumentLayout) {
    let limit = layout.geometry.bottom_limit();
    for (i, page) in layout.pages.iter().enumerate() {
        assert!(
            page.lowest_point() <= limit + 1e-3,
            "page {} reaches {} past the bottom margin {}",
            i + 1,
            page.lowest_point(),
            limit
        );
    }
}

/// 40 short lines, 2,000 characters in total.
fn two_thousand_char_notes() -> String {
    let mut notes = (0..40)
        .map(|i| format!("{:02} rodillo de arrastre gastado, revisar sensor ok", i))
        .collect::<Vec<_>>()
        .join("\n");
    notes.push('!');
    notes
}

#[test]
fn test_intake_receipt_fits_long_notes_on_one_page() {
    let notes = two_thousand_char_notes();
    assert_eq!(notes.chars().count(), 2000);

    let case = case_with_notes(7, Some(notes.clone()));
    let layout = compose(&IntakeReceipt, &case, None);

    assert_eq!(layout.page_count(), 1);

    let rendered = strip_whitespace(&layout.text_lines().concat());
    assert!(rendered.contains(&strip_whitespace(&notes)));

    // Forty lines do not fit at the normal size; the notes must have shrunk.
    let shrunk = layout.pages[0].ops.iter().any(|op| {
        matches!(op, DrawOp::Text { size, text, .. } if *size < 10.0 && text.starts_with("00 "))
    });
    assert!(shrunk);
    assert_within_margins(&layout);

    let pdf = PdfRenderEngine::render(&layout, None).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    assert!(strip_whitespace(&pdf_text(&pdf)).contains(&strip_whitespace(&notes)));
}

#[test]
fn test_characters_without_glyphs_still_show_in_pdf() {
    let mut case = case_with_notes(8, Some("ZZZ tóner ✓ 打印机 😀 end".to_string()));
    case.client_name = "Ñandú Peña".to_string();

    let layout = compose(&IntakeReceipt, &case, None);
    let pdf = PdfRenderEngine::render(&layout, None).unwrap();
    let text = pdf_text(&pdf);

    assert!(text.contains("ZZZ tóner ? ??? ? end"), "notes missing from: {}", text);
    assert!(text.contains("Ñandú Peña"));
}

#[test]
fn test_long_client_details_stay_above_signature() {
    let mut case = case_with_notes(9, Some("Ingresa sin bandeja".to_string()));
    case.reference = "Impresora laser multifuncional con bandeja adicional ".repeat(40);
    case.client_name = "Distribuidora de Suministros de Oficina del Norte ".repeat(40);

    let layout = compose(&IntakeReceipt, &case, None);
    assert_eq!(layout.page_count(), 1);

    let ops = &layout.pages[0].ops;
    let signature = ops
        .iter()
        .position(|op| matches!(op, DrawOp::Text { text, .. } if text == "Firma del cliente"))
        .unwrap();
    let limit = signature_top(&PageGeometry::A4);
    for op in &ops[..signature] {
        assert!(op.bottom() <= limit, "{:?} runs into the signature block", op);
    }
    assert!(layout.text_lines().iter().any(|line| line.ends_with("...")));
    assert!(layout.text_lines().contains(&"Ingresa sin bandeja"));
}

#[test]
fn test_intake_receipt_lists_client_details() {
    let case = case_with_notes(3, None);
    let layout = compose(&IntakeReceipt, &case, None);
    let lines = layout.text_lines();

    assert!(lines.contains(&"Recepción de Equipo"));
    assert!(lines.contains(&"Orden de servicio No. 3"));
    assert!(lines.contains(&"Ana Ruiz"));
    assert!(lines.contains(&"01/10/2026 09:30"));
    assert!(!lines.contains(&"Observaciones:"));
}

#[test]
fn test_certificate_with_long_notes_spans_pages() {
    let notes = (1..=50)
        .map(|i| format!("Linea {} de observaciones del técnico", i))
        .collect::<Vec<_>>()
        .join("\n");
    let mut case = case_with_notes(12, Some(notes));
    case.status = CaseStatus::Resolved;
    case.resolution_note = Some("Cambio de fusor".to_string());

    let layout = compose(&DeliveryCertificate, &case, None);

    assert!(layout.page_count() > 1);
    assert_within_margins(&layout);

    let lines = layout.text_lines();
    assert!(lines.contains(&"Linea 50 de observaciones del técnico"));
    assert!(lines.contains(&"Motivo de la solución"));
    assert!(lines.contains(&"Cambio de fusor"));
    // Delivery time falls back to the composition time.
    assert!(lines.contains(&"19/10/2026 10:00"));

    let pdf = PdfRenderEngine::render(&layout, None).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn test_short_certificate_is_one_page() {
    let mut case = case_with_notes(2, None);
    case.status = CaseStatus::Resolved;
    case.delivered_at = Some(intake_time());
    case.resolution_note = Some("Limpieza general".to_string());

    let layout = compose(&DeliveryCertificate, &case, None);
    assert_eq!(layout.page_count(), 1);
    assert!(layout.text_lines().contains(&"Garantía"));
}

#[test]
fn test_empty_listing_report() {
    let cases: Vec<Case> = Vec::new();
    let layout = compose(&ListingReport, cases.as_slice(), None);
    let lines = layout.text_lines();

    assert_eq!(layout.page_count(), 1);
    assert!(lines.contains(&"Total de registros: 0"));
    assert!(lines.contains(&"No hay casos registrados."));
    assert!(lines.contains(&"Fecha del reporte: 19 de octubre de 2026"));
}

#[test]
fn test_listing_report_paginates_many_cases() {
    let cases: Vec<Case> = (1..=60)
        .map(|n| case_with_notes(n, Some(format!("Nota del caso {}", n))))
        .collect();

    let layout = compose(&ListingReport, cases.as_slice(), None);

    assert!(layout.page_count() > 1);
    assert_within_margins(&layout);
    let lines = layout.text_lines();
    assert!(lines.contains(&"Total de registros: 60"));
    assert!(lines.contains(&"No. 60 - HP M404dn"));
    assert!(lines.contains(&"Pendiente"));
}

#[tokio::test]
async fn test_logo_is_placed_and_embedded() {
    let source = common::MockAssetSource::png(800, 400);
    let bytes = source.fetch().await.unwrap();
    let logo = PreparedLogo::prepare(&bytes).unwrap();

    let case = case_with_notes(5, None);
    let layout = compose(&IntakeReceipt, &case, Some(&logo));
    assert!(layout.has_logo());

    let with_logo = PdfRenderEngine::render(&layout, Some(&logo)).unwrap();
    let without_logo = PdfRenderEngine::render(&layout, None).unwrap();
    assert!(with_logo.len() > without_logo.len());

    // The prepared JPEG is embedded byte for byte.
    let doc = printpdf::lopdf::Document::load_mem(&with_logo).unwrap();
    let embedded = doc
        .objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .any(|stream| stream.content == logo.jpeg);
    assert!(embedded);
}

#[test]
fn test_composer_reports_page_count() {
    let composer = DocumentComposer::default();
    let cases: Vec<Case> = (1..=3).map(|n| case_with_notes(n, None)).collect();

    let document = composer.listing_report(&cases, None).unwrap();
    assert_eq!(document.page_count, 1);
    assert!(document.pdf.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_file_logo_source_reads_from_disk() {
    let source = common::MockAssetSource::png(64, 32);
    let bytes = source.fetch().await.unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();

    let file_source = FileAssetSource::new(file.path().to_path_buf());
    let loaded = load_logo(&file_source).await.unwrap();
    assert_eq!(loaded, bytes);

    let logo = PreparedLogo::prepare(&loaded).unwrap();
    assert_eq!((logo.width_px(), logo.height_px()), (64, 32));
}
