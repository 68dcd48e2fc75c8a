use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::error::AppError;

#[derive(Serialize)]
pub struct ListResponse<T: Serialize> {
    pub data: Vec<T>,
    pub count: usize,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        let count = data.len();
        Self { data, count }
    }
}

#[derive(Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

pub const NOT_FOUND: &str = "Not Found";
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";
pub const INVALID_BODY: &str = "요청 본문이 올바르지 않습니다.";
pub const PAYLOAD_TOO_LARGE: &str = "요청 본문이 너무 큽니다.";

/// Upper bound for JSON and urlencoded request bodies.
pub const BODY_LIMIT: usize = 1024 * 1024;

pub fn response_from_error(err: &AppError) -> HttpResponse {
    HttpResponse::build(err.status_code()).json(ErrorBody { error: err.msg() })
}
