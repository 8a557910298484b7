#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use std::io::Cursor;
use uuid::Uuid;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use printer_service_server::case::model::{Case, CasePatch, CreateCaseRequest, NewCase};
use printer_service_server::case::CaseService;
use printer_service_server::db::{AppState, CaseStore, InMemoryCaseStore, StoreError};
use printer_service_server::documents::logo::{AssetError, AssetSource};
use printer_service_server::documents::DocumentComposer;

/// Logo source serving a fixed PNG and counting fetches.
pub struct MockAssetSource {
    bytes: Vec<u8>,
    fetches: AtomicUsize,
}

impl MockAssetSource {
    pub fn png(width: u32, height: u32) -> Self {
        let img = RgbaImage::from_pixel(width, height, Rgba([20, 60, 160, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .expect("encode test logo");
        Self {
            bytes,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetSource for MockAssetSource {
    async fn fetch(&self) -> Result<Vec<u8>, AssetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }

    fn describe(&self) -> String {
        "mock://logo.png".to_string()
    }
}

/// Logo source that always fails, like an unreachable URL.
pub struct FailingAssetSource;

#[async_trait]
impl AssetSource for FailingAssetSource {
    async fn fetch(&self) -> Result<Vec<u8>, AssetError> {
        Err(AssetError::Status(404))
    }

    fn describe(&self) -> String {
        "mock://missing.png".to_string()
    }
}

/// Case store whose every call fails, either unreachable or rejecting.
pub struct FailingCaseStore {
    unavailable: bool,
}

impl FailingCaseStore {
    pub fn unavailable() -> Self {
        Self { unavailable: true }
    }

    pub fn rejecting() -> Self {
        Self { unavailable: false }
    }

    fn error(&self) -> StoreError {
        if self.unavailable {
            StoreError::Unavailable("connection refused".to_string())
        } else {
            StoreError::Rejected("duplicate key value violates unique constraint".to_string())
        }
    }
}

#[async_trait]
impl CaseStore for FailingCaseStore {
    async fn list(&self) -> Result<Vec<Case>, StoreError> {
        Err(self.error())
    }

    async fn get_by_id(&self, _id: &Uuid) -> Result<Option<Case>, StoreError> {
        Err(self.error())
    }

    async fn create(&self, _new_case: NewCase) -> Result<Case, StoreError> {
        Err(self.error())
    }

    async fn update(&self, _id: &Uuid, _patch: CasePatch) -> Result<Option<Case>, StoreError> {
        Err(self.error())
    }

    async fn delete(&self, _id: &Uuid) -> Result<bool, StoreError> {
        Err(self.error())
    }
}

pub fn memory_store() -> Arc<InMemoryCaseStore> {
    Arc::new(InMemoryCaseStore::new())
}

pub fn service_with(
    store: Arc<dyn CaseStore>,
    assets: Option<Arc<dyn AssetSource>>,
) -> CaseService {
    CaseService::new(store, assets, DocumentComposer::default())
}

pub fn memory_service() -> CaseService {
    service_with(memory_store(), None)
}

pub fn memory_app_state() -> AppState {
    app_state_with(memory_store())
}

pub fn app_state_with(store: Arc<dyn CaseStore>) -> AppState {
    AppState::new_with_store(store, None, DocumentComposer::default())
}

pub fn ana_ruiz() -> CreateCaseRequest {
    CreateCaseRequest {
        reference: "HP M404dn".to_string(),
        client_name: "Ana Ruiz".to_string(),
        client_tax_id: "123".to_string(),
        phone: "3000000000".to_string(),
        notes: None,
    }
}

pub fn request_with_notes(reference: &str, notes: &str) -> CreateCaseRequest {
    CreateCaseRequest {
        reference: reference.to_string(),
        notes: Some(notes.to_string()),
        ..ana_ruiz()
    }
}
