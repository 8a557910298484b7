use actix_web::http::header;
use actix_web::{web, HttpResponse, Responder};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::case::model::{Case, CaseFilter, ChangeStatusRequest, CreateCaseRequest, UpdateCaseRequest};
use crate::case::service::CaseError;
use crate::case::validation::ValidationError;
use crate::documents::{DocumentKind, GeneratedDocument};
use crate::{AppState, ErrorResponse};

/// A generated PDF inlined in a JSON response.
#[derive(Serialize, ToSchema)]
pub struct DocumentPayload {
    pub kind: DocumentKind,
    #[schema(example = "recepcion-42.pdf")]
    pub filename: String,
    #[schema(example = "application/pdf")]
    pub content_type: String,
    pub page_count: usize,
    pub data_base64: String,
}

impl DocumentPayload {
    fn from_document(document: &GeneratedDocument, filename: String) -> Self {
        Self {
            kind: document.kind,
            filename,
            content_type: "application/pdf".to_string(),
            page_count: document.page_count,
            data_base64: BASE64.encode(&document.pdf),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CaseWithDocument {
    pub case: Case,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentPayload>,
}

/// 400 body for rejected input, listing every offending field.
#[derive(Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub message: String,
    pub errors: Vec<ValidationError>,
    pub timestamp: String,
}

fn document_filename(kind: DocumentKind, case_number: Option<i64>) -> String {
    match case_number {
        Some(number) => format!("{}-{}.pdf", kind.slug(), number),
        None => format!("{}.pdf", kind.slug()),
    }
}

fn pdf_response(document: GeneratedDocument, filename: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", filename),
        ))
        .body(document.pdf)
}

fn error_response(err: CaseError) -> HttpResponse {
    match err {
        CaseError::Validation(errors) => {
            log::debug!("Rejected case request: {}", errors);
            HttpResponse::BadRequest().json(ValidationErrorResponse {
                error: "ValidationError".to_string(),
                message: errors.to_string(),
                errors: errors.errors().to_vec(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            })
        }
        CaseError::InvalidStatus(_) | CaseError::MissingRequiredNote(_) => {
            log::debug!("Rejected status change: {}", err);
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(&err.to_string()))
        }
        CaseError::NotFound(_) => {
            HttpResponse::NotFound().json(ErrorResponse::not_found(&err.to_string()))
        }
        CaseError::PersistenceUnavailable(_) => {
            log::error!("{}", err);
            HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
                "ServiceUnavailable",
                "El almacenamiento de casos no está disponible",
            ))
        }
        CaseError::Persistence(_) | CaseError::Document(_) => {
            log::error!("{}", err);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&err.to_string()))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Cases",
    get,
    path = "/cases",
    params(CaseFilter),
    responses(
        (status = 200, description = "Cases, newest intake first", body = [Case]),
        (status = 400, description = "Unknown status filter", body = ErrorResponse)
    )
)]
pub async fn list_cases(
    query: web::Query<CaseFilter>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.cases.list_cases(&query).await {
        Ok(cases) => HttpResponse::Ok().json(cases),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Cases",
    post,
    path = "/cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case created with its intake receipt", body = CaseWithDocument),
        (status = 400, description = "Missing required fields", body = ValidationErrorResponse),
        (status = 500, description = "Storage or document failure", body = ErrorResponse)
    )
)]
pub async fn create_case(
    req: web::Json<CreateCaseRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    log::info!("Creating case for client '{}'", req.client_name);
    match data.cases.create_case(req.into_inner()).await {
        Ok((case, document)) => {
            let filename = document_filename(document.kind, Some(case.case_number));
            let document = DocumentPayload::from_document(&document, filename);
            HttpResponse::Created().json(CaseWithDocument {
                case,
                document: Some(document),
            })
        }
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Cases",
    get,
    path = "/cases/{id}",
    responses(
        (status = 200, description = "Case found", body = Case),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "ID of the case")
    )
)]
pub async fn get_case(id: web::Path<Uuid>, data: web::Data<AppState>) -> impl Responder {
    match data.cases.get_case(id.into_inner()).await {
        Ok(case) => HttpResponse::Ok().json(case),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Cases",
    patch,
    path = "/cases/{id}",
    request_body = UpdateCaseRequest,
    responses(
        (status = 200, description = "Case updated", body = Case),
        (status = 400, description = "Locked or blank fields", body = ValidationErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "ID of the case to edit")
    )
)]
pub async fn edit_case(
    id: web::Path<Uuid>,
    req: web::Json<UpdateCaseRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.cases.edit_case(id.into_inner(), req.into_inner()).await {
        Ok(case) => HttpResponse::Ok().json(case),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Cases",
    delete,
    path = "/cases/{id}",
    responses(
        (status = 204, description = "Case deleted"),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "ID of the case to delete")
    )
)]
pub async fn delete_case(id: web::Path<Uuid>, data: web::Data<AppState>) -> impl Responder {
    match data.cases.delete_case(id.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Cases",
    post,
    path = "/cases/{id}/status",
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed; resolving returns the delivery certificate", body = CaseWithDocument),
        (status = 400, description = "Unknown status or missing note", body = ErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "ID of the case")
    )
)]
pub async fn change_status(
    id: web::Path<Uuid>,
    req: web::Json<ChangeStatusRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let id = id.into_inner();
    log::info!("Changing status of case {} to '{}'", id, req.status);
    match data
        .cases
        .change_status(id, &req.status, req.note.as_deref())
        .await
    {
        Ok((case, document)) => {
            let document = document.map(|d| {
                let filename = document_filename(d.kind, Some(case.case_number));
                DocumentPayload::from_document(&d, filename)
            });
            HttpResponse::Ok().json(CaseWithDocument { case, document })
        }
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    get,
    path = "/cases/{id}/receipt",
    responses(
        (status = 200, description = "Intake receipt PDF"),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "ID of the case")
    )
)]
pub async fn download_receipt(id: web::Path<Uuid>, data: web::Data<AppState>) -> impl Responder {
    match data.cases.intake_receipt(id.into_inner()).await {
        Ok((case, document)) => {
            let filename = document_filename(document.kind, Some(case.case_number));
            pdf_response(document, &filename)
        }
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    get,
    path = "/cases/{id}/certificate",
    responses(
        (status = 200, description = "Delivery certificate PDF"),
        (status = 400, description = "Case is not resolved", body = ValidationErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "ID of the case")
    )
)]
pub async fn download_certificate(
    id: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.cases.delivery_certificate(id.into_inner()).await {
        Ok((case, document)) => {
            let filename = document_filename(document.kind, Some(case.case_number));
            pdf_response(document, &filename)
        }
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    get,
    path = "/cases/report",
    params(CaseFilter),
    responses(
        (status = 200, description = "Listing report PDF"),
        (status = 400, description = "Unknown status filter", body = ErrorResponse)
    )
)]
pub async fn download_report(
    query: web::Query<CaseFilter>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.cases.listing_report(&query).await {
        Ok(document) => {
            let filename = document_filename(document.kind, None);
            pdf_response(document, &filename)
        }
        Err(e) => error_response(e),
    }
}

/// Register case routes. `/cases/report` goes before `/cases/{id}` so the
/// literal segment wins.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/cases/report").route(web::get().to(download_report)))
        .service(
            web::resource("/cases")
                .route(web::get().to(list_cases))
                .route(web::post().to(create_case)),
        )
        .service(
            web::resource("/cases/{id}")
                .route(web::get().to(get_case))
                .route(web::patch().to(edit_case))
                .route(web::delete().to(delete_case)),
        )
        .service(web::resource("/cases/{id}/status").route(web::post().to(change_status)))
        .service(web::resource("/cases/{id}/receipt").route(web::get().to(download_receipt)))
        .service(
            web::resource("/cases/{id}/certificate").route(web::get().to(download_certificate)),
        );
}
