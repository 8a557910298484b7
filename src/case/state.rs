//! Case status transitions and the side effects each one carries.
//!
//! Any status may follow any other; only membership in [`CaseStatus`] is
//! checked. What differs per target state is the note it demands and the
//! fields it touches.

use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;

use super::model::{Case, CasePatch, CaseStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("a note is required to move a case to {}", .0.label())]
    MissingRequiredNote(CaseStatus),
}

/// A requested move to a status, carrying the note that status requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    ToPending,
    ToInProgress { process_note: String },
    ToResolved { resolution_note: String },
}

impl Transition {
    /// Build a transition, refusing a missing or blank mandatory note.
    /// Notes are kept verbatim; only emptiness is judged on the trimmed text.
    pub fn new(target: CaseStatus, note: Option<&str>) -> Result<Self, TransitionError> {
        let note = note.filter(|n| !n.trim().is_empty());
        match target {
            CaseStatus::Pending => Ok(Self::ToPending),
            CaseStatus::InProgress => note
                .map(|n| Self::ToInProgress {
                    process_note: n.to_string(),
                })
                .ok_or(TransitionError::MissingRequiredNote(target)),
            CaseStatus::Resolved => note
                .map(|n| Self::ToResolved {
                    resolution_note: n.to_string(),
                })
                .ok_or(TransitionError::MissingRequiredNote(target)),
        }
    }

    pub fn target(&self) -> CaseStatus {
        match self {
            Self::ToPending => CaseStatus::Pending,
            Self::ToInProgress { .. } => CaseStatus::InProgress,
            Self::ToResolved { .. } => CaseStatus::Resolved,
        }
    }

    /// Compute the patch that moves `case` into the target status at `now`.
    /// `offset` localizes the timestamp written into appended notes.
    pub fn plan(&self, case: &Case, now: DateTime<Utc>, offset: FixedOffset) -> CasePatch {
        let mut patch = CasePatch {
            status: Some(self.target()),
            status_changed_at: Some(now),
            ..Default::default()
        };

        match self {
            Self::ToPending => {}
            Self::ToInProgress { process_note } => {
                let entry = format!(
                    "[{}] {}: {}",
                    format_note_timestamp(now, offset),
                    CaseStatus::InProgress.label(),
                    process_note
                );
                patch.notes = Some(Some(append_note(case.notes.as_deref(), &entry)));
                patch.process_note = Some(process_note.clone());
            }
            Self::ToResolved { resolution_note } => {
                patch.resolution_note = Some(resolution_note.clone());
                if case.delivered_at.is_none() {
                    patch.delivered_at = Some(now);
                }
            }
        }

        patch
    }
}

/// Append `entry` after existing notes, separated by a blank line.
pub fn append_note(existing: Option<&str>, entry: &str) -> String {
    match existing {
        Some(existing) if !existing.trim().is_empty() => format!("{}\n\n{}", existing, entry),
        _ => entry.to_string(),
    }
}

pub fn format_note_timestamp(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset)
        .format("%d/%m/%Y %H:%M:%S")
        .to_string()
}
