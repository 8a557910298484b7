//! Case service - the operations the HTTP layer calls.
//!
//! Coordinates validation, the state machine, the store and document
//! composition. Documents are composed on the blocking pool; the logo is
//! fetched fresh for every document and skipped when unavailable.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::model::{
    Case, CaseFilter, CasePatch, CaseStatus, CreateCaseRequest, InvalidStatus, NewCase,
    UpdateCaseRequest,
};
use super::state::{Transition, TransitionError};
use super::validation::{validate_create, validate_update, ValidationError, ValidationErrors};
use crate::db::{CaseStore, StoreError};
use crate::documents::logo::{load_logo, prepare_or_skip, AssetSource};
use crate::documents::{DocumentComposer, DocumentError, GeneratedDocument};

#[derive(Debug, Error)]
pub enum CaseError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),
    #[error("a note is required to move a case to {}", .0.label())]
    MissingRequiredNote(CaseStatus),
    #[error("case {0} not found")]
    NotFound(Uuid),
    #[error("case store unavailable: {0}")]
    PersistenceUnavailable(String),
    #[error("case store error: {0}")]
    Persistence(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl From<ValidationErrors> for CaseError {
    fn from(errors: ValidationErrors) -> Self {
        CaseError::Validation(errors)
    }
}

impl From<StoreError> for CaseError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => CaseError::PersistenceUnavailable(msg),
            other => CaseError::Persistence(other.to_string()),
        }
    }
}

impl From<TransitionError> for CaseError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::MissingRequiredNote(status) => CaseError::MissingRequiredNote(status),
        }
    }
}

/// Which document to compose for a single case.
#[derive(Debug, Clone, Copy)]
enum CaseDocument {
    IntakeReceipt,
    DeliveryCertificate,
}

pub struct CaseService {
    store: Arc<dyn CaseStore>,
    assets: Option<Arc<dyn AssetSource>>,
    composer: DocumentComposer,
}

impl CaseService {
    pub fn new(
        store: Arc<dyn CaseStore>,
        assets: Option<Arc<dyn AssetSource>>,
        composer: DocumentComposer,
    ) -> Self {
        Self {
            store,
            assets,
            composer,
        }
    }

    /// Register a new case and compose its intake receipt.
    pub async fn create_case(
        &self,
        request: CreateCaseRequest,
    ) -> Result<(Case, GeneratedDocument), CaseError> {
        validate_create(&request)?;

        let new_case = NewCase {
            reference: request.reference,
            client_name: request.client_name,
            client_tax_id: request.client_tax_id,
            phone: request.phone,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
        };

        let case = self.store.create(new_case).await?;
        log::info!("Created case No. {} ({})", case.case_number, case.id);

        let document = self.compose(case.clone(), CaseDocument::IntakeReceipt).await?;
        Ok((case, document))
    }

    /// Move a case to `status`. Resolving also composes the delivery certificate.
    pub async fn change_status(
        &self,
        id: Uuid,
        status: &str,
        note: Option<&str>,
    ) -> Result<(Case, Option<GeneratedDocument>), CaseError> {
        let target: CaseStatus = status.parse()?;
        let case = self.find(id).await?;
        let transition = Transition::new(target, note)?;

        let patch = transition.plan(&case, Utc::now(), self.composer.settings().utc_offset);
        let updated = self
            .store
            .update(&id, patch)
            .await?
            .ok_or(CaseError::NotFound(id))?;

        log::info!(
            "Case No. {} moved from {} to {}",
            updated.case_number,
            case.status,
            updated.status
        );

        let document = if target == CaseStatus::Resolved {
            Some(
                self.compose(updated.clone(), CaseDocument::DeliveryCertificate)
                    .await?,
            )
        } else {
            None
        };

        Ok((updated, document))
    }

    /// Edit the descriptive fields of a case. Status, identity, case number
    /// and intake time are refused.
    pub async fn edit_case(&self, id: Uuid, request: UpdateCaseRequest) -> Result<Case, CaseError> {
        validate_update(&request)?;

        let patch = CasePatch {
            reference: request.reference,
            client_name: request.client_name,
            client_tax_id: request.client_tax_id,
            phone: request.phone,
            notes: request
                .notes
                .map(|n| if n.trim().is_empty() { None } else { Some(n) }),
            ..Default::default()
        };

        if patch.is_empty() {
            return self.find(id).await;
        }

        let updated = self
            .store
            .update(&id, patch)
            .await?
            .ok_or(CaseError::NotFound(id))?;
        log::info!("Edited case No. {}", updated.case_number);
        Ok(updated)
    }

    pub async fn delete_case(&self, id: Uuid) -> Result<(), CaseError> {
        if self.store.delete(&id).await? {
            log::info!("Deleted case {}", id);
            Ok(())
        } else {
            Err(CaseError::NotFound(id))
        }
    }

    /// All cases, newest intake first, narrowed by `filter`.
    pub async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>, CaseError> {
        let status = filter
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<CaseStatus>)
            .transpose()?;
        let query = filter
            .q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let cases = self.store.list().await?;
        Ok(cases
            .into_iter()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .filter(|c| query.as_deref().map_or(true, |q| c.matches_search(q)))
            .collect())
    }

    pub async fn get_case(&self, id: Uuid) -> Result<Case, CaseError> {
        self.find(id).await
    }

    /// Re-issue the intake receipt, returned with the case it was composed from.
    pub async fn intake_receipt(&self, id: Uuid) -> Result<(Case, GeneratedDocument), CaseError> {
        let case = self.find(id).await?;
        let document = self.compose(case.clone(), CaseDocument::IntakeReceipt).await?;
        Ok((case, document))
    }

    /// Re-issue the delivery certificate. Only resolved cases have one.
    pub async fn delivery_certificate(
        &self,
        id: Uuid,
    ) -> Result<(Case, GeneratedDocument), CaseError> {
        let case = self.find(id).await?;
        if case.status != CaseStatus::Resolved {
            return Err(CaseError::Validation(ValidationErrors::single(
                ValidationError::new(
                    "status",
                    "El acta de entrega solo está disponible para casos resueltos",
                )
                .with_suggestion("Cambie el estado del caso a resuelto"),
            )));
        }
        let document = self
            .compose(case.clone(), CaseDocument::DeliveryCertificate)
            .await?;
        Ok((case, document))
    }

    pub async fn listing_report(&self, filter: &CaseFilter) -> Result<GeneratedDocument, CaseError> {
        let cases = self.list_cases(filter).await?;
        let logo_bytes = self.fetch_logo().await;
        let composer = self.composer.clone();

        let document = tokio::task::spawn_blocking(move || {
            let logo = prepare_or_skip(logo_bytes.as_deref());
            composer.listing_report(&cases, logo.as_ref())
        })
        .await
        .map_err(|e| DocumentError::Task(e.to_string()))??;

        log::info!("Listing report composed: {} page(s)", document.page_count);
        Ok(document)
    }

    async fn find(&self, id: Uuid) -> Result<Case, CaseError> {
        self.store
            .get_by_id(&id)
            .await?
            .ok_or(CaseError::NotFound(id))
    }

    async fn fetch_logo(&self) -> Option<Vec<u8>> {
        match &self.assets {
            Some(source) => load_logo(source.as_ref()).await,
            None => None,
        }
    }

    async fn compose(
        &self,
        case: Case,
        which: CaseDocument,
    ) -> Result<GeneratedDocument, CaseError> {
        let logo_bytes = self.fetch_logo().await;
        let composer = self.composer.clone();

        let document = tokio::task::spawn_blocking(move || {
            let logo = prepare_or_skip(logo_bytes.as_deref());
            match which {
                CaseDocument::IntakeReceipt => composer.intake_receipt(&case, logo.as_ref()),
                CaseDocument::DeliveryCertificate => {
                    composer.delivery_certificate(&case, logo.as_ref())
                }
            }
        })
        .await
        .map_err(|e| DocumentError::Task(e.to_string()))?;

        let document = document.map_err(|e| {
            log::error!("Failed to compose {:?}: {}", which, e);
            e
        })?;
        Ok(document)
    }
}
