use actix_web::{web, HttpRequest, HttpResponse};
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;

use crate::entity::quote_inquiry;
use crate::error::AppError;
use crate::repository::Repository;
use crate::routes::crud::{self, non_empty, present, Wording};

const NAME_REQUIRED: &str = "name은 필수입니다.";
const INVALID_STATUS: &str = "status는 pending, processing, completed 중 하나여야 합니다.";

const WORDING: Wording = Wording {
    op: "quoteInquiry",
    invalid_id: "잘못된 ID입니다.",
    not_found: "견적문의를 찾을 수 없습니다.",
    list_failed: "견적문의 목록 조회에 실패했습니다.",
    get_failed: "견적문의 조회에 실패했습니다.",
    create_failed: "견적문의 등록에 실패했습니다.",
    update_failed: "견적문의 수정에 실패했습니다.",
    delete_failed: "견적문의 삭제에 실패했습니다.",
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(["", "/"])
            .route(web::get().to(list))
            .route(web::post().to(create)),
    )
    .service(
        web::resource("/{id}")
            .route(web::get().to(get))
            .route(web::put().to(update))
            .route(web::delete().to(remove)),
    );
}

#[derive(Deserialize, Default)]
struct CreateQuoteInquiryRequest {
    name: Option<String>,
    contact: Option<String>,
    company: Option<String>,
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct UpdateQuoteInquiryRequest {
    name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    contact: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    company: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    content: Option<Option<String>>,
    status: Option<String>,
}

async fn list(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    crud::list::<quote_inquiry::Entity>(db.get_ref(), &WORDING).await
}

async fn get(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    crud::get::<quote_inquiry::Entity>(db.get_ref(), &WORDING, &path).await
}

async fn create(
    db: web::Data<DatabaseConnection>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let payload: CreateQuoteInquiryRequest = crud::read_body(&req, payload).await?;
    let Some(name) = non_empty(payload.name) else {
        return Err(AppError::bad_request(NAME_REQUIRED));
    };

    let active = quote_inquiry::ActiveModel {
        name: Set(name),
        contact: Set(payload.contact),
        company: Set(payload.company),
        content: Set(payload.content),
        status: Set(quote_inquiry::STATUS_PENDING.to_string()),
        is_deleted: Set(0),
        ..Default::default()
    };
    let created = Repository::<quote_inquiry::Entity>::new(db.get_ref())
        .create(active)
        .await
        .map_err(|e| WORDING.internal("create", e, WORDING.create_failed))?;
    Ok(HttpResponse::Created().json(created))
}

async fn update(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let id = WORDING.parse_id(&path)?;
    let payload: UpdateQuoteInquiryRequest = crud::read_body(&req, payload).await?;
    if let Some(status) = &payload.status {
        if !quote_inquiry::STATUSES.contains(&status.as_str()) {
            return Err(AppError::bad_request(INVALID_STATUS));
        }
    }

    let updated = Repository::<quote_inquiry::Entity>::new(db.get_ref())
        .update(id, move |active| {
            if let Some(name) = payload.name {
                active.name = Set(name);
            }
            if let Some(contact) = payload.contact {
                active.contact = Set(contact);
            }
            if let Some(company) = payload.company {
                active.company = Set(company);
            }
            if let Some(content) = payload.content {
                active.content = Set(content);
            }
            if let Some(status) = payload.status {
                active.status = Set(status);
            }
        })
        .await
        .map_err(|e| WORDING.internal("update", e, WORDING.update_failed))?
        .ok_or_else(|| WORDING.not_found())?;
    Ok(HttpResponse::Ok().json(updated))
}

async fn remove(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    crud::remove::<quote_inquiry::Entity>(db.get_ref(), &WORDING, &path).await
}
