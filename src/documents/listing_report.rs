//! Listing report: one compact section per case.

use super::common::{format_datetime, format_spanish_date};
use super::layout::{DocumentLayout, FontWeight, LayoutWriter, PageGeometry};
use super::parts::{self, BODY_LINE_HEIGHT, BODY_SIZE};
use super::traits::{ComposeContext, Composer};
use super::DocumentKind;
use crate::case::model::Case;

const ENTRY_SIZE: f32 = 9.0;
const ENTRY_LINE_HEIGHT: f32 = 5.0;
const ENTRY_NOTES_LINE_HEIGHT: f32 = 4.5;
const ENTRY_LABEL_WIDTH: f32 = 28.0;

pub struct ListingReport;

impl Composer<[Case]> for ListingReport {
    const KIND: DocumentKind = DocumentKind::ListingReport;

    fn compose(&self, cases: &[Case], ctx: &ComposeContext<'_>) -> DocumentLayout {
        let offset = ctx.settings.utc_offset;
        let mut writer = LayoutWriter::new(PageGeometry::A4, true);

        parts::header(&mut writer, ctx, "Reporte de Casos", None);
        writer.line(
            &format!("Fecha del reporte: {}", format_spanish_date(ctx.now, offset)),
            BODY_SIZE,
            FontWeight::Regular,
            BODY_LINE_HEIGHT,
        );
        writer.line(
            &format!("Total de registros: {}", cases.len()),
            BODY_SIZE,
            FontWeight::Bold,
            BODY_LINE_HEIGHT,
        );
        writer.rule(4.0, 0.4);

        if cases.is_empty() {
            writer.line(
                "No hay casos registrados.",
                BODY_SIZE,
                FontWeight::Regular,
                BODY_LINE_HEIGHT,
            );
        }

        for (i, case) in cases.iter().enumerate() {
            // Keep the title with its first detail line.
            writer.ensure_space(BODY_LINE_HEIGHT + ENTRY_LINE_HEIGHT);
            writer.line(
                &format!("No. {} - {}", case.case_number, case.reference),
                BODY_SIZE + 1.0,
                FontWeight::Bold,
                BODY_LINE_HEIGHT,
            );

            let rows = [
                ("Cliente:", case.client_name.clone()),
                ("NIT/Cédula:", case.client_tax_id.clone()),
                ("Teléfono:", case.phone.clone()),
                ("Ingreso:", format_datetime(case.intake_at, offset)),
                ("Estado:", case.status.label().to_string()),
            ];
            for (label, value) in &rows {
                writer.labeled_line(label, value, ENTRY_LABEL_WIDTH, ENTRY_SIZE, ENTRY_LINE_HEIGHT);
            }

            if let Some(notes) = case.notes.as_deref().filter(|n| !n.trim().is_empty()) {
                writer.ensure_space(ENTRY_LINE_HEIGHT + ENTRY_NOTES_LINE_HEIGHT);
                writer.line("Notas:", ENTRY_SIZE, FontWeight::Bold, ENTRY_LINE_HEIGHT);
                writer.paragraph(notes, ENTRY_SIZE, FontWeight::Regular, ENTRY_NOTES_LINE_HEIGHT);
            }

            if i + 1 < cases.len() {
                writer.rule(4.0, 0.1);
            }
        }

        writer.finish(format!("Reporte de casos ({})", cases.len()))
    }
}
