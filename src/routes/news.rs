use actix_multipart::Multipart;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use sea_orm::{DatabaseConnection, Set};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::entity::news::{self, ImageList};
use crate::error::AppError;
use crate::repository::Repository;
use crate::routes::crud::{self, non_empty, present, Wording, TITLE_AND_CONTENT_REQUIRED};
use crate::upload::{self, NewsForm, PendingImages};

const DEFAULT_WRITER: &str = "admin";

const WORDING: Wording = Wording {
    op: "news",
    invalid_id: "잘못된 ID입니다.",
    not_found: "뉴스를 찾을 수 없습니다.",
    list_failed: "뉴스 목록 조회에 실패했습니다.",
    get_failed: "뉴스 조회에 실패했습니다.",
    create_failed: "뉴스 등록에 실패했습니다.",
    update_failed: "뉴스 수정에 실패했습니다.",
    delete_failed: "뉴스 삭제에 실패했습니다.",
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
struct CreateNewsRequest {
    title: Option<String>,
    content: Option<String>,
    writer: Option<String>,
    image_url: Option<String>,
    images: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
struct UpdateNewsRequest {
    title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    content: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    writer: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    images: Option<Option<Vec<String>>>,
}

enum NewsBody<T> {
    Fields(T),
    Form(NewsForm),
}

/// Multipart bodies go through the upload reader; anything else is read as JSON or a urlencoded form.
async fn read_body<T>(req: &HttpRequest, payload: web::Payload) -> Result<NewsBody<T>, AppError>
where
    T: DeserializeOwned + Default + 'static,
{
    if req.content_type().to_ascii_lowercase().starts_with("multipart/") {
        let multipart = Multipart::new(req.headers(), payload);
        return upload::read_news_form(multipart).await.map(NewsBody::Form);
    }
    crud::read_body(req, payload).await.map(NewsBody::Fields)
}

async fn list(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    crud::list::<news::Entity>(db.get_ref(), &WORDING).await
}

async fn get(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    crud::get::<news::Entity>(db.get_ref(), &WORDING, &path).await
}

async fn create(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let (request, files) = match read_body::<CreateNewsRequest>(&req, payload).await? {
        NewsBody::Fields(request) => (request, PendingImages::default()),
        NewsBody::Form(form) => (
            CreateNewsRequest {
                title: form.title,
                content: form.content,
                writer: form.writer,
                image_url: form.image_url,
                images: (!form.image_refs.is_empty()).then_some(form.image_refs),
            },
            form.files,
        ),
    };
    let (Some(title), Some(content)) = (non_empty(request.title), non_empty(request.content)) else {
        return Err(AppError::bad_request(TITLE_AND_CONTENT_REQUIRED));
    };

    let stored = upload::store(&config.news_upload_dir(), files)
        .await
        .map_err(|e| AppError::internal("news.create", e, WORDING.create_failed))?;
    let image_url = stored.image_url.clone().or(request.image_url);
    let images = if stored.images.is_empty() {
        request.images.unwrap_or_default()
    } else {
        stored.images.clone()
    };

    let active = news::ActiveModel {
        title: Set(title),
        content: Set(Some(content)),
        writer: Set(Some(request.writer.unwrap_or_else(|| DEFAULT_WRITER.to_string()))),
        image_url: Set(image_url),
        images: Set(Some(ImageList(images))),
        view_count: Set(0),
        is_deleted: Set(0),
        ..Default::default()
    };
    match Repository::<news::Entity>::new(db.get_ref()).create(active).await {
        Ok(created) => Ok(HttpResponse::Created().json(created)),
        Err(e) => {
            stored.discard().await;
            Err(WORDING.internal("create", e, WORDING.create_failed))
        }
    }
}

/// Uploaded files replace the stored references field by field: a new lead image
/// replaces `image_url`, a new set of secondary images replaces `images`.
async fn update(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    req: HttpRequest,
    path: web::Path<String>,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let id = WORDING.parse_id(&path)?;
    let (request, files) = match read_body::<UpdateNewsRequest>(&req, payload).await? {
        NewsBody::Fields(request) => (request, PendingImages::default()),
        NewsBody::Form(form) => (
            UpdateNewsRequest {
                title: form.title,
                content: form.content.map(Some),
                writer: form.writer.map(Some),
                image_url: form.image_url.map(Some),
                images: (!form.image_refs.is_empty()).then_some(Some(form.image_refs)),
            },
            form.files,
        ),
    };

    let stored = upload::store(&config.news_upload_dir(), files)
        .await
        .map_err(|e| AppError::internal("news.update", e, WORDING.update_failed))?;
    let image_url = stored.image_url.clone().map(Some).or(request.image_url);
    let images = if stored.images.is_empty() {
        request.images
    } else {
        Some(Some(stored.images.clone()))
    };
    let (title, content, writer) = (request.title, request.content, request.writer);

    let result = Repository::<news::Entity>::new(db.get_ref())
        .update(id, move |active| {
            if let Some(title) = title {
                active.title = Set(title);
            }
            if let Some(content) = content {
                active.content = Set(content);
            }
            if let Some(writer) = writer {
                active.writer = Set(writer);
            }
            if let Some(image_url) = image_url {
                active.image_url = Set(image_url);
            }
            if let Some(images) = images {
                active.images = Set(images.map(ImageList));
            }
        })
        .await;

    match result {
        Ok(Some(updated)) => Ok(HttpResponse::Ok().json(updated)),
        Ok(None) => {
            stored.discard().await;
            Err(WORDING.not_found())
        }
        Err(e) => {
            stored.discard().await;
            Err(WORDING.internal("update", e, WORDING.update_failed))
        }
    }
}

async fn remove(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    crud::remove::<news::Entity>(db.get_ref(), &WORDING, &path).await
}
