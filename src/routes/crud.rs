use actix_web::error::UrlencodedError;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use sea_orm::{DatabaseConnection, DbErr, IntoActiveModel};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::repository::{Repository, SoftDelete};
use crate::response::{ListResponse, BODY_LIMIT, INVALID_BODY, PAYLOAD_TOO_LARGE};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const TITLE_AND_CONTENT_REQUIRED: &str = "title과 content는 필수입니다.";

/// What a resource's handlers log and answer with.
pub struct Wording {
    /// Prefix for log lines, e.g. `notice` in `notice.list: ...`.
    pub op: &'static str,
    pub invalid_id: &'static str,
    pub not_found: &'static str,
    pub list_failed: &'static str,
    pub get_failed: &'static str,
    pub create_failed: &'static str,
    pub update_failed: &'static str,
    pub delete_failed: &'static str,
}

impl Wording {
    pub fn not_found(&self) -> AppError {
        AppError::not_found(self.not_found)
    }

    pub fn internal(&self, action: &str, cause: DbErr, msg: &'static str) -> AppError {
        AppError::internal(&format!("{}.{}", self.op, action), cause, msg)
    }

    /// Ids are positive integers; anything else is rejected before touching storage.
    pub fn parse_id(&self, raw: &str) -> Result<i32, AppError> {
        raw.parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::bad_request(self.invalid_id))
    }
}

pub async fn list<E>(db: &DatabaseConnection, wording: &Wording) -> Result<HttpResponse, AppError>
where
    E: SoftDelete,
    E::Model: IntoActiveModel<E::Active> + Serialize + Sync,
{
    let rows = Repository::<E>::new(db)
        .list()
        .await
        .map_err(|e| wording.internal("list", e, wording.list_failed))?;
    Ok(HttpResponse::Ok().json(ListResponse::new(rows)))
}

/// Single-record read; counts a view on tables that track them.
pub async fn get<E>(
    db: &DatabaseConnection,
    wording: &Wording,
    raw_id: &str,
) -> Result<HttpResponse, AppError>
where
    E: SoftDelete,
    E::Model: IntoActiveModel<E::Active> + Serialize + Sync,
{
    let id = wording.parse_id(raw_id)?;
    let row = Repository::<E>::new(db)
        .find_and_count_view(id)
        .await
        .map_err(|e| wording.internal("get", e, wording.get_failed))?
        .ok_or_else(|| wording.not_found())?;
    Ok(HttpResponse::Ok().json(row))
}

pub async fn remove<E>(
    db: &DatabaseConnection,
    wording: &Wording,
    raw_id: &str,
) -> Result<HttpResponse, AppError>
where
    E: SoftDelete,
    E::Model: IntoActiveModel<E::Active> + Sync,
{
    let id = wording.parse_id(raw_id)?;
    let deleted = Repository::<E>::new(db)
        .soft_delete(id)
        .await
        .map_err(|e| wording.internal("remove", e, wording.delete_failed))?;
    if !deleted {
        return Err(wording.not_found());
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Reads a JSON or urlencoded request body. An empty body reads as `T::default()`.
pub async fn read_body<T>(req: &HttpRequest, mut payload: web::Payload) -> Result<T, AppError>
where
    T: DeserializeOwned + Default + 'static,
{
    if req.content_type().eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
        let mut payload = payload.into_inner();
        return web::Form::<T>::from_request(req, &mut payload)
            .await
            .map(web::Form::into_inner)
            .map_err(|e| match e.as_error::<UrlencodedError>() {
                Some(UrlencodedError::Overflow { .. }) => AppError::bad_request(PAYLOAD_TOO_LARGE),
                _ => AppError::bad_request(INVALID_BODY),
            });
    }

    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|_| AppError::bad_request(INVALID_BODY))?;
        if body.len() + chunk.len() > BODY_LIMIT {
            return Err(AppError::bad_request(PAYLOAD_TOO_LARGE));
        }
        body.extend_from_slice(&chunk);
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&body).map_err(|_| AppError::bad_request(INVALID_BODY))
}

/// A required text field counts as missing when empty.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Keeps `null` apart from an absent key: absent stays `None`, `null` becomes `Some(None)`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Reads any JSON value as a flag the way a loosely typed client means it.
pub fn truthy<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let flag = match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    };
    Ok(Some(flag))
}
