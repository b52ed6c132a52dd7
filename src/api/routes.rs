use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Result as WebResult};
use futures_util::StreamExt as _;
use tracing::{error, warn};

use crate::api::models::{ChatForm, ErrorResponse, StatusResponse};
use crate::chat::{ChatError, ChatOrchestrator};
use crate::documents::annotations::{AnnotationStore, Annotations};
use crate::documents::{DocumentError, DocumentLibrary};

const UPLOAD_FIELD: &str = "file";

#[get("/health")]
pub async fn health() -> WebResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(StatusResponse { status: "healthy" }))
}

#[get("/")]
pub async fn index() -> WebResult<HttpResponse> {
    let html = include_str!("../../static/index.html");
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

// --- Documents ---

/// Failures are reported in the body with a 200 so the page can show them inline.
#[post("/upload")]
pub async fn upload(
    library: web::Data<DocumentLibrary>,
    mut payload: Multipart,
) -> WebResult<HttpResponse> {
    let message = match read_upload(&mut payload).await {
        Ok((file_name, bytes)) => match library.ingest(&file_name, &bytes).await {
            Ok(stored) => format!("Uploaded {}", stored),
            Err(e) => {
                warn!(file = %file_name, error = %e, "Upload failed");
                format!("Upload failed: {}", e)
            }
        },
        Err(reason) => {
            warn!(%reason, "Rejected upload");
            format!("Upload failed: {}", reason)
        }
    };

    Ok(HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(message))
}

async fn read_upload(payload: &mut Multipart) -> Result<(String, Vec<u8>), String> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| e.to_string())?;
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .ok_or_else(|| "missing file name".to_string())?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            bytes.extend_from_slice(&chunk.map_err(|e| e.to_string())?);
        }
        return Ok((file_name, bytes));
    }

    Err(format!("no '{}' field in upload", UPLOAD_FIELD))
}

#[get("/files")]
pub async fn list_files(library: web::Data<DocumentLibrary>) -> WebResult<HttpResponse> {
    match library.list() {
        Ok(names) => Ok(HttpResponse::Ok().json(names)),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

#[get("/files/{name}")]
pub async fn get_file(
    library: web::Data<DocumentLibrary>,
    name: web::Path<String>,
) -> WebResult<HttpResponse> {
    match library.read(&name) {
        Ok(bytes) => Ok(HttpResponse::Ok().content_type("application/pdf").body(bytes)),
        Err(DocumentError::NotFound(_)) => Ok(HttpResponse::NotFound().finish()),
        Err(e @ DocumentError::InvalidName(_)) => Ok(HttpResponse::BadRequest().body(e.to_string())),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

// --- Annotations ---

#[get("/annotations/{name}")]
pub async fn get_annotations(
    store: web::Data<AnnotationStore>,
    name: web::Path<String>,
) -> WebResult<HttpResponse> {
    match store.load(&name) {
        Ok(annotations) => Ok(HttpResponse::Ok().json(annotations)),
        Err(e) => {
            error!(document = %name.as_str(), error = %e, "Failed to load annotations");
            Ok(HttpResponse::InternalServerError().json(ErrorResponse { error: e.to_string() }))
        }
    }
}

#[post("/annotations/{name}")]
pub async fn save_annotations(
    store: web::Data<AnnotationStore>,
    name: web::Path<String>,
    body: web::Json<Annotations>,
) -> WebResult<HttpResponse> {
    match store.save(&name, &body) {
        Ok(()) => Ok(HttpResponse::Ok().json(StatusResponse { status: "saved" })),
        Err(e) => Ok(HttpResponse::InternalServerError().json(ErrorResponse { error: e.to_string() })),
    }
}

// --- Chat ---

#[post("/chat")]
pub async fn chat(
    orchestrator: web::Data<ChatOrchestrator>,
    form: web::Form<ChatForm>,
) -> WebResult<HttpResponse> {
    let form = form.into_inner();

    match orchestrator.chat(form.current_file.as_deref(), &form.message).await {
        Ok(reply) => Ok(HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(reply)),
        Err(ChatError::Llm(e)) => {
            error!(error = %e, "Chat turn failed");
            Ok(HttpResponse::InternalServerError().body(format!("LLM Error: {}", e)))
        }
        Err(e) => {
            error!(error = %e, "Chat turn failed");
            Ok(HttpResponse::InternalServerError().body(e.to_string()))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(health)
        .service(upload)
        .service(list_files)
        .service(get_file)
        .service(get_annotations)
        .service(save_annotations)
        .service(chat);
}
