use std::path::{Component, Path};

use actix_web::{web, HttpResponse};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::response::{ErrorBody, INTERNAL_SERVER_ERROR, NOT_FOUND};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/uploads/{path:.*}").route(web::get().to(uploaded_file)));
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Serves a stored upload. Paths that would leave the upload directory are not found.
async fn uploaded_file(
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let relative = Path::new(path.as_str());
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if relative.as_os_str().is_empty() || escapes {
        return Err(AppError::not_found(NOT_FOUND));
    }

    let full = config.upload_dir.join(relative);
    match tokio::fs::metadata(&full).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(AppError::not_found(NOT_FOUND)),
    }
    let data = tokio::fs::read(&full)
        .await
        .map_err(|e| AppError::internal("uploads.read", e, INTERNAL_SERVER_ERROR))?;
    let mime = mime_guess::from_path(&full).first_or_octet_stream();
    Ok(HttpResponse::Ok().content_type(mime.essence_str()).body(data))
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody { error: NOT_FOUND })
}
