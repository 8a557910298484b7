//! Blocks shared by several documents: header, key-value rows, signature
//! block and footer.

use super::common::printable_text;
use super::layout::{DrawOp, FontWeight, LayoutWriter};
use super::logo::PreparedLogo;
use super::traits::ComposeContext;

pub const BODY_SIZE: f32 = 10.0;
pub const BODY_LINE_HEIGHT: f32 = 6.0;
pub const KEY_VALUE_LINE_HEIGHT: f32 = 7.0;
pub const LABEL_WIDTH: f32 = 42.0;
pub const SECTION_GAP: f32 = 3.0;

pub const LOGO_MAX_WIDTH: f32 = 32.0;
pub const LOGO_MAX_HEIGHT: f32 = 22.0;

pub const SIGNATURE_BLOCK_HEIGHT: f32 = 42.0;
pub const FOOTER_HEIGHT: f32 = 10.0;

const SIGNATURE_BOX_WIDTH: f32 = 80.0;
const SIGNATURE_BOX_HEIGHT: f32 = 25.0;

/// Logo size on the page, fitted inside the logo box keeping its aspect ratio.
pub fn logo_size(logo: &PreparedLogo) -> (f32, f32) {
    let ratio = logo.aspect_ratio();
    let width = LOGO_MAX_WIDTH.min(LOGO_MAX_HEIGHT / ratio.max(f32::EPSILON));
    (width, width * ratio)
}

/// Logo, business name, document title and optional case number, closed by a rule.
pub fn header(
    writer: &mut LayoutWriter,
    ctx: &ComposeContext<'_>,
    title: &str,
    case_number: Option<i64>,
) {
    let top = writer.y();
    let margin = writer.geometry().margin;

    let logo_bottom = ctx.logo.map(|logo| {
        let (width, height) = logo_size(logo);
        writer.push(DrawOp::Logo {
            x: margin,
            y: top,
            width,
            height,
        });
        top + height
    });

    writer.centered_line(&ctx.settings.business_name, 15.0, FontWeight::Bold, 8.0);
    writer.centered_line(title, 12.0, FontWeight::Bold, 7.0);
    if let Some(number) = case_number {
        writer.centered_line(
            &format!("Orden de servicio No. {}", number),
            11.0,
            FontWeight::Regular,
            6.0,
        );
    }

    if let Some(bottom) = logo_bottom {
        if writer.y() < bottom + 2.0 {
            writer.set_y(bottom + 2.0);
        }
    }
    writer.rule(4.0, 0.4);
}

pub fn key_values(writer: &mut LayoutWriter, rows: &[(&str, String)]) {
    key_values_bounded(writer, rows, usize::MAX);
}

/// Key-value rows whose values take at most `max_lines` lines each.
pub fn key_values_bounded(writer: &mut LayoutWriter, rows: &[(&str, String)], max_lines: usize) {
    for (label, value) in rows {
        writer.labeled_line_bounded(
            label,
            value,
            LABEL_WIDTH,
            BODY_SIZE,
            KEY_VALUE_LINE_HEIGHT,
            max_lines,
        );
    }
}

/// Bold heading kept on the same page as the first line that follows it.
pub fn section_heading(writer: &mut LayoutWriter, heading: &str) {
    writer.ensure_space(KEY_VALUE_LINE_HEIGHT + BODY_LINE_HEIGHT);
    writer.line(heading, BODY_SIZE + 1.0, FontWeight::Bold, KEY_VALUE_LINE_HEIGHT);
}

/// Ruled signing box plus client name and date lines.
pub fn signature_block(writer: &mut LayoutWriter, client_name: &str) {
    writer.ensure_space(SIGNATURE_BLOCK_HEIGHT);

    let top = writer.y();
    let margin = writer.geometry().margin;
    let right = writer.geometry().width - margin;
    let column = margin + SIGNATURE_BOX_WIDTH + 10.0;

    writer.push(DrawOp::Text {
        x: margin,
        baseline: top + 4.5,
        size: 9.0,
        weight: FontWeight::Bold,
        text: "Firma del cliente".to_string(),
    });
    writer.push(DrawOp::Frame {
        x: margin,
        y: top + 7.0,
        width: SIGNATURE_BOX_WIDTH,
        height: SIGNATURE_BOX_HEIGHT,
        thickness: 0.3,
    });

    writer.push(DrawOp::Text {
        x: column,
        baseline: top + 15.0,
        size: BODY_SIZE,
        weight: FontWeight::Regular,
        text: printable_text(client_name).into_owned(),
    });
    writer.push(DrawOp::Rule {
        x1: column,
        y1: top + 17.0,
        x2: right,
        y2: top + 17.0,
        thickness: 0.3,
    });
    writer.push(DrawOp::Text {
        x: column,
        baseline: top + 21.0,
        size: 8.0,
        weight: FontWeight::Regular,
        text: "Nombre del cliente".to_string(),
    });
    writer.push(DrawOp::Rule {
        x1: column,
        y1: top + 29.0,
        x2: right,
        y2: top + 29.0,
        thickness: 0.3,
    });
    writer.push(DrawOp::Text {
        x: column,
        baseline: top + 33.0,
        size: 8.0,
        weight: FontWeight::Regular,
        text: "Fecha".to_string(),
    });

    writer.set_y(top + SIGNATURE_BLOCK_HEIGHT);
}

/// Thin rule and the business contact line, or the business name when no
/// contact line is configured.
pub fn footer(writer: &mut LayoutWriter, ctx: &ComposeContext<'_>) {
    writer.ensure_space(FOOTER_HEIGHT);
    writer.rule(3.0, 0.1);
    let contact = if ctx.settings.contact_line.trim().is_empty() {
        ctx.settings.business_name.as_str()
    } else {
        ctx.settings.contact_line.as_str()
    };
    writer.centered_line(contact, 8.0, FontWeight::Regular, FOOTER_HEIGHT - 3.0);
}
