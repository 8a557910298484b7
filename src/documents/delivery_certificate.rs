//! Delivery and warranty certificate, produced when a case is resolved.
//! Paginates: any block that does not fit moves to a fresh page.

use super::common::format_datetime;
use super::layout::{DocumentLayout, FontWeight, LayoutWriter, PageGeometry};
use super::parts::{self, BODY_LINE_HEIGHT, BODY_SIZE, SECTION_GAP};
use super::traits::{ComposeContext, Composer};
use super::DocumentKind;
use crate::case::model::Case;

pub const WARRANTY_DAYS: u32 = 30;

/// Client's statement that the printer was received back.
pub fn receipt_confirmation(case: &Case) -> String {
    format!(
        "Yo, {}, identificado(a) con NIT/Cédula {}, hago constar que recibo a entera \
         satisfacción la impresora {}, correspondiente a la orden de servicio No. {}, \
         en correcto estado de funcionamiento y con los trabajos descritos en este documento.",
        case.client_name.trim(),
        case.client_tax_id.trim(),
        case.reference.trim(),
        case.case_number
    )
}

pub fn warranty_terms() -> String {
    format!(
        "El servicio realizado tiene una garantía de {} días calendario contados a partir \
         de la fecha de entrega. La garantía cubre únicamente el trabajo realizado y los \
         repuestos suministrados por el taller. No cubre daños causados por mal uso, golpes, \
         humedad, variaciones de voltaje, consumibles no originales ni manipulación del equipo \
         por terceros. Para hacerla efectiva presente este documento junto con el equipo.",
        WARRANTY_DAYS
    )
}

pub struct DeliveryCertificate;

impl Composer<Case> for DeliveryCertificate {
    const KIND: DocumentKind = DocumentKind::DeliveryCertificate;

    fn compose(&self, case: &Case, ctx: &ComposeContext<'_>) -> DocumentLayout {
        let offset = ctx.settings.utc_offset;
        let delivered_at = case.delivered_at.unwrap_or(ctx.now);
        let mut writer = LayoutWriter::new(PageGeometry::A4, true);

        parts::header(&mut writer, ctx, "Acta de Entrega y Garantía", Some(case.case_number));
        parts::key_values(
            &mut writer,
            &[
                ("Referencia:", case.reference.clone()),
                ("Cliente:", case.client_name.clone()),
                ("NIT/Cédula:", case.client_tax_id.clone()),
                ("Teléfono:", case.phone.clone()),
                ("Fecha de ingreso:", format_datetime(case.intake_at, offset)),
                ("Fecha de entrega:", format_datetime(delivered_at, offset)),
            ],
        );
        writer.advance(SECTION_GAP);

        if let Some(notes) = case.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            parts::section_heading(&mut writer, "Observaciones");
            writer.paragraph(notes, BODY_SIZE, FontWeight::Regular, BODY_LINE_HEIGHT);
            writer.advance(SECTION_GAP);
        }

        parts::section_heading(&mut writer, "Constancia de recibido");
        writer.paragraph(
            &receipt_confirmation(case),
            BODY_SIZE,
            FontWeight::Regular,
            BODY_LINE_HEIGHT,
        );
        writer.advance(SECTION_GAP);

        parts::section_heading(&mut writer, "Garantía");
        writer.paragraph(&warranty_terms(), BODY_SIZE, FontWeight::Regular, BODY_LINE_HEIGHT);
        writer.advance(SECTION_GAP);

        if let Some(resolution) = case
            .resolution_note
            .as_deref()
            .filter(|n| !n.trim().is_empty())
        {
            parts::section_heading(&mut writer, "Motivo de la solución");
            writer.paragraph(resolution, BODY_SIZE, FontWeight::Regular, BODY_LINE_HEIGHT);
            writer.advance(SECTION_GAP);
        }

        writer.advance(SECTION_GAP * 2.0);
        parts::signature_block(&mut writer, &case.client_name);
        parts::footer(&mut writer, ctx);

        writer.finish(format!("Acta de entrega No. {}", case.case_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::model::CaseStatus;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_confirmation_interpolates_client_and_printer() {
        let now = Utc::now();
        let case = Case {
            id: Uuid::new_v4(),
            case_number: 12,
            reference: "Brother HL-1212W".to_string(),
            client_name: "Ana Ruiz".to_string(),
            client_tax_id: "123".to_string(),
            phone: "3000000000".to_string(),
            notes: None,
            intake_at: now,
            delivered_at: Some(now),
            status: CaseStatus::Resolved,
            status_changed_at: now,
            resolution_note: Some("Cambio de fusor".to_string()),
            process_note: None,
        };

        let text = receipt_confirmation(&case);
        assert!(text.contains("Ana Ruiz"));
        assert!(text.contains("NIT/Cédula 123"));
        assert!(text.contains("Brother HL-1212W"));
        assert!(text.contains("No. 12"));
    }

    #[test]
    fn test_warranty_mentions_thirty_days() {
        assert!(warranty_terms().contains("30 días"));
    }
}
