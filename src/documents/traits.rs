//! Traits for composer standardization.

use chrono::{DateTime, Utc};

use super::layout::DocumentLayout;
use super::logo::PreparedLogo;
use super::{DocumentKind, DocumentSettings};

/// Everything a composer may read besides its input.
#[derive(Debug, Clone, Copy)]
pub struct ComposeContext<'a> {
    pub settings: &'a DocumentSettings,
    pub logo: Option<&'a PreparedLogo>,
    /// Clock used for "today" and for fallback dates.
    pub now: DateTime<Utc>,
}

/// Trait for document composers.
pub trait Composer<Input: ?Sized> {
    const KIND: DocumentKind;

    /// Lay the document out. Pure: the same input and context give the same layout.
    fn compose(&self, input: &Input, ctx: &ComposeContext<'_>) -> DocumentLayout;
}
