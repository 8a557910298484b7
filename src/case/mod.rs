//! Case module - repair cases from intake to delivery
//!
//! - `model` - case record, status and request payloads
//! - `validation` - field checks collected into `ValidationErrors`
//! - `state` - status transitions and the patches they produce
//! - `service` - orchestration over the store and the document composer
//! - `handlers` - HTTP endpoints

pub mod handlers;
pub mod model;
pub mod service;
pub mod state;
pub mod validation;

pub use model::{Case, CaseStatus};
pub use service::{CaseError, CaseService};
