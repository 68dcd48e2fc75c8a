use actix_web::{web, HttpRequest, HttpResponse};
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;

use crate::entity::board;
use crate::error::AppError;
use crate::repository::Repository;
use crate::routes::crud::{self, non_empty, present, Wording, TITLE_AND_CONTENT_REQUIRED};

const DEFAULT_WRITER: &str = "anonymous";

const WORDING: Wording = Wording {
    op: "board",
    invalid_id: "잘못된 게시글 ID입니다.",
    not_found: "게시글을 찾을 수 없습니다.",
    list_failed: "게시글 목록 조회에 실패했습니다.",
    get_failed: "게시글 조회에 실패했습니다.",
    create_failed: "게시글 등록에 실패했습니다.",
    update_failed: "게시글 수정에 실패했습니다.",
    delete_failed: "게시글 삭제에 실패했습니다.",
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
struct CreateBoardRequest {
    title: Option<String>,
    content: Option<String>,
    writer: Option<String>,
}

/// The author of a post is fixed at creation.
#[derive(Deserialize, Default)]
struct UpdateBoardRequest {
    title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    content: Option<Option<String>>,
}

async fn list(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    crud::list::<board::Entity>(db.get_ref(), &WORDING).await
}

async fn get(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    crud::get::<board::Entity>(db.get_ref(), &WORDING, &path).await
}

async fn create(
    db: web::Data<DatabaseConnection>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let payload: CreateBoardRequest = crud::read_body(&req, payload).await?;
    let (Some(title), Some(content)) = (non_empty(payload.title), non_empty(payload.content)) else {
        return Err(AppError::bad_request(TITLE_AND_CONTENT_REQUIRED));
    };

    let active = board::ActiveModel {
        title: Set(title),
        content: Set(Some(content)),
        writer: Set(Some(payload.writer.unwrap_or_else(|| DEFAULT_WRITER.to_string()))),
        view_count: Set(0),
        is_deleted: Set(0),
        ..Default::default()
    };
    let created = Repository::<board::Entity>::new(db.get_ref())
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
    let payload: UpdateBoardRequest = crud::read_body(&req, payload).await?;

    let updated = Repository::<board::Entity>::new(db.get_ref())
        .update(id, move |active| {
            if let Some(title) = payload.title {
                active.title = Set(title);
            }
            if let Some(content) = payload.content {
                active.content = Set(content);
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
    crud::remove::<board::Entity>(db.get_ref(), &WORDING, &path).await
}
