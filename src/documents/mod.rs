//! Documents module - fixed-layout PDF documents for repair cases.
//!
//! Each document kind has its own composer:
//! - `IntakeReceipt` - signed by the client when the printer is received
//! - `DeliveryCertificate` - delivery confirmation with warranty terms
//! - `ListingReport` - compact listing of many cases
//!
//! Composers produce a [`layout::DocumentLayout`]; [`engine::PdfRenderEngine`]
//! turns it into PDF bytes.

pub mod common;
pub mod delivery_certificate;
pub mod engine;
pub mod intake_receipt;
pub mod layout;
pub mod listing_report;
pub mod logo;
pub mod parts;
pub mod traits;

pub use delivery_certificate::DeliveryCertificate;
pub use engine::PdfRenderEngine;
pub use intake_receipt::IntakeReceipt;
pub use listing_report::ListingReport;
pub use logo::PreparedLogo;
pub use traits::{ComposeContext, Composer};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::case::model::Case;

/// Errors that can occur during document generation.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] printpdf::Error),
    #[error("document generation task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    IntakeReceipt,
    DeliveryCertificate,
    ListingReport,
}

impl DocumentKind {
    /// Short name used when naming downloads.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::IntakeReceipt => "recepcion",
            Self::DeliveryCertificate => "acta-entrega",
            Self::ListingReport => "reporte-casos",
        }
    }
}

/// Result of a successful document generation.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub kind: DocumentKind,
    pub page_count: usize,
    pub pdf: Vec<u8>,
}

/// Business details printed on every document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSettings {
    pub business_name: String,
    pub contact_line: String,
    pub utc_offset: FixedOffset,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            business_name: "Servicio Técnico de Impresoras".to_string(),
            contact_line: String::new(),
            utc_offset: FixedOffset::west_opt(5 * 3600).expect("UTC-5 is a valid offset"),
        }
    }
}

/// Entry point for document generation: composes with the business settings
/// and renders to PDF.
#[derive(Debug, Clone, Default)]
pub struct DocumentComposer {
    settings: DocumentSettings,
}

impl DocumentComposer {
    pub fn new(settings: DocumentSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    pub fn intake_receipt(
        &self,
        case: &Case,
        logo: Option<&PreparedLogo>,
    ) -> Result<GeneratedDocument, DocumentError> {
        self.generate(&IntakeReceipt, case, logo, Utc::now())
    }

    pub fn delivery_certificate(
        &self,
        case: &Case,
        logo: Option<&PreparedLogo>,
    ) -> Result<GeneratedDocument, DocumentError> {
        self.generate(&DeliveryCertificate, case, logo, Utc::now())
    }

    pub fn listing_report(
        &self,
        cases: &[Case],
        logo: Option<&PreparedLogo>,
    ) -> Result<GeneratedDocument, DocumentError> {
        self.generate(&ListingReport, cases, logo, Utc::now())
    }

    pub fn generate<I, C>(
        &self,
        composer: &C,
        input: &I,
        logo: Option<&PreparedLogo>,
        now: DateTime<Utc>,
    ) -> Result<GeneratedDocument, DocumentError>
    where
        I: ?Sized,
        C: Composer<I>,
    {
        let ctx = ComposeContext {
            settings: &self.settings,
            logo,
            now,
        };
        let layout = composer.compose(input, &ctx);
        let pdf = PdfRenderEngine::render(&layout, logo)?;

        log::debug!(
            "Rendered {:?}: {} page(s), {} bytes",
            C::KIND,
            layout.page_count(),
            pdf.len()
        );

        Ok(GeneratedDocument {
            kind: C::KIND,
            page_count: layout.page_count(),
            pdf,
        })
    }
}
