//! Intake receipt, signed by the client when the printer is received.
//!
//! The receipt is always a single page. The signature block and footer sit at
//! fixed positions at the bottom; the notes block has to fit in the space
//! above them, shrinking its line height and then its font if needed.

use super::common::{format_datetime, wrap_text};
use super::layout::{DocumentLayout, FontWeight, LayoutWriter, PageGeometry};
use super::parts::{self, BODY_SIZE, FOOTER_HEIGHT, KEY_VALUE_LINE_HEIGHT, SECTION_GAP, SIGNATURE_BLOCK_HEIGHT};
use super::traits::{ComposeContext, Composer};
use super::DocumentKind;
use crate::case::model::Case;

pub const NOTES_FONT_SIZE: f32 = 10.0;
pub const NOTES_LINE_HEIGHT: f32 = 6.0;
pub const NOTES_REDUCED_LINE_HEIGHT: f32 = 5.0;
pub const NOTES_SHRUNK_FONT_SIZE: f32 = 8.0;
pub const NOTES_MIN_LINE_HEIGHT: f32 = 3.2;
/// Lines any one client detail may take, keeping the block clear of the signature.
pub const DETAIL_MAX_LINES: usize = 3;

/// Which step of the shrinking sequence the notes needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStrategy {
    Normal,
    Reduced,
    Shrunk,
    /// Even the minimum line height runs past the available space.
    Overflow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotesFit {
    pub strategy: FitStrategy,
    pub font_size: f32,
    pub line_height: f32,
    pub lines: Vec<String>,
}

impl NotesFit {
    pub fn height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }
}

/// Choose font size and line height so `text` fits in `available` millimetres.
pub fn fit_notes(text: &str, available: f32, width: f32) -> NotesFit {
    let lines = wrap_text(text, NOTES_FONT_SIZE, width, false);
    let count = lines.len() as f32;

    if count * NOTES_LINE_HEIGHT <= available {
        return NotesFit {
            strategy: FitStrategy::Normal,
            font_size: NOTES_FONT_SIZE,
            line_height: NOTES_LINE_HEIGHT,
            lines,
        };
    }
    if count * NOTES_REDUCED_LINE_HEIGHT <= available {
        return NotesFit {
            strategy: FitStrategy::Reduced,
            font_size: NOTES_FONT_SIZE,
            line_height: NOTES_REDUCED_LINE_HEIGHT,
            lines,
        };
    }

    let lines = wrap_text(text, NOTES_SHRUNK_FONT_SIZE, width, false);
    let line_height = (available / lines.len().max(1) as f32).min(NOTES_REDUCED_LINE_HEIGHT);

    if line_height >= NOTES_MIN_LINE_HEIGHT {
        NotesFit {
            strategy: FitStrategy::Shrunk,
            font_size: NOTES_SHRUNK_FONT_SIZE,
            line_height,
            lines,
        }
    } else {
        NotesFit {
            strategy: FitStrategy::Overflow,
            font_size: NOTES_SHRUNK_FONT_SIZE,
            line_height: NOTES_MIN_LINE_HEIGHT,
            lines,
        }
    }
}

/// Top of the signature block on the receipt page.
pub fn signature_top(geometry: &PageGeometry) -> f32 {
    geometry.bottom_limit() - FOOTER_HEIGHT - SIGNATURE_BLOCK_HEIGHT
}

pub struct IntakeReceipt;

impl Composer<Case> for IntakeReceipt {
    const KIND: DocumentKind = DocumentKind::IntakeReceipt;

    fn compose(&self, case: &Case, ctx: &ComposeContext<'_>) -> DocumentLayout {
        let geometry = PageGeometry::A4;
        let offset = ctx.settings.utc_offset;
        let mut writer = LayoutWriter::new(geometry, false);

        parts::header(&mut writer, ctx, "Recepción de Equipo", Some(case.case_number));
        parts::key_values_bounded(
            &mut writer,
            &[
                ("Referencia:", case.reference.clone()),
                ("Cliente:", case.client_name.clone()),
                ("NIT/Cédula:", case.client_tax_id.clone()),
                ("Teléfono:", case.phone.clone()),
                ("Fecha de ingreso:", format_datetime(case.intake_at, offset)),
            ],
            DETAIL_MAX_LINES,
        );
        writer.advance(SECTION_GAP);

        let signature_top = signature_top(&geometry);

        if let Some(notes) = case.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            writer.line("Observaciones:", BODY_SIZE, FontWeight::Bold, KEY_VALUE_LINE_HEIGHT);
            let available = (signature_top - writer.y() - SECTION_GAP).max(0.0);
            let fit = fit_notes(notes, available, geometry.content_width());
            if fit.strategy != FitStrategy::Normal {
                log::debug!(
                    "Intake receipt {} notes fitted with {:?} ({} lines at {:.2} mm)",
                    case.case_number,
                    fit.strategy,
                    fit.lines.len(),
                    fit.line_height
                );
            }
            writer.lines(&fit.lines, fit.font_size, FontWeight::Regular, fit.line_height);
        }

        writer.set_y(signature_top);
        parts::signature_block(&mut writer, &case.client_name);
        parts::footer(&mut writer, ctx);

        writer.finish(format!("Recepción de equipo No. {}", case.case_number))
    }
}
