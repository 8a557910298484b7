//! Input validation for case requests.
//!
//! Errors are collected rather than short-circuited so a form can show every
//! problem at once.

use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

use super::model::{CreateCaseRequest, UpdateCaseRequest};

/// Validation error with a user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message in Spanish
    pub message: String,
    /// Suggestion for how to fix the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create error for empty required field
    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} no puede estar vacío", label))
            .with_suggestion(format!("Ingrese {}", label.to_lowercase()))
    }

    /// Create error for a field that may never be edited
    pub fn locked_field(field: &str) -> Self {
        let suggestion = if field == "status" {
            "Use el cambio de estado para modificar el estado del caso"
        } else {
            "Este campo se asigna al crear el caso"
        };
        Self::new(field, format!("El campo '{}' no se puede modificar", field))
            .with_suggestion(suggestion)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors with formatted output.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn single(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Ok if no errors were collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validación fallida: {} error(es)", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate that a string is not empty after trimming
pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// Validate an optional replacement for a required field: absent is fine, blank is not.
pub fn validate_required_optional(
    value: Option<&str>,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) {
    if let Some(value) = value {
        validate_required(value, field, label, errors);
    }
}

pub fn validate_create(request: &CreateCaseRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    validate_required(&request.reference, "reference", "Referencia de la impresora", &mut errors);
    validate_required(&request.client_name, "client_name", "Nombre del cliente", &mut errors);
    validate_required(&request.client_tax_id, "client_tax_id", "NIT/Cédula", &mut errors);
    validate_required(&request.phone, "phone", "Teléfono", &mut errors);
    errors.into_result()
}

pub fn validate_update(request: &UpdateCaseRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for field in request.locked_fields() {
        errors.add(ValidationError::locked_field(field));
    }
    validate_required_optional(
        request.reference.as_deref(),
        "reference",
        "Referencia de la impresora",
        &mut errors,
    );
    validate_required_optional(
        request.client_name.as_deref(),
        "client_name",
        "Nombre del cliente",
        &mut errors,
    );
    validate_required_optional(
        request.client_tax_id.as_deref(),
        "client_tax_id",
        "NIT/Cédula",
        &mut errors,
    );
    validate_required_optional(request.phone.as_deref(), "phone", "Teléfono", &mut errors);
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateCaseRequest {
        CreateCaseRequest {
            reference: "HP M404dn".to_string(),
            client_name: "Ana Ruiz".to_string(),
            client_tax_id: "123".to_string(),
            phone: "3000000000".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_create_accepts_complete_request() {
        assert!(validate_create(&valid_request()).is_ok());
    }

    #[test]
    fn test_create_collects_every_blank_field() {
        let request = CreateCaseRequest {
            reference: "  ".to_string(),
            phone: String::new(),
            ..valid_request()
        };

        let errors = validate_create(&request).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.has_field("reference"));
        assert!(errors.has_field("phone"));
    }

    #[test]
    fn test_update_rejects_locked_fields_even_when_null() {
        let request: UpdateCaseRequest =
            serde_json::from_str(r#"{"id": null, "intake_at": "2024-01-01T00:00:00Z"}"#).unwrap();

        let errors = validate_update(&request).unwrap_err();
        assert!(errors.has_field("id"));
        assert!(errors.has_field("intake_at"));
    }

    #[test]
    fn test_update_rejects_blanking_required_field() {
        let request = UpdateCaseRequest {
            client_name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(validate_update(&request).unwrap_err().has_field("client_name"));
    }

    #[test]
    fn test_update_allows_clearing_notes() {
        let request = UpdateCaseRequest {
            notes: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_update(&request).is_ok());
    }

    #[test]
    fn test_display_lists_errors() {
        let errors = ValidationErrors::single(ValidationError::empty_field("phone", "Teléfono"));
        let text = errors.to_string();
        assert!(text.contains("1 error"));
        assert!(text.contains("[phone]"));
    }
}
