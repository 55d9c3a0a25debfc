//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Fail,
}

#[derive(Serialize)]
pub struct Success<T> {
    pub status: Status,
    pub data: T,
}

#[derive(Serialize)]
pub struct Failure {
    pub status: Status,
    pub reason: String,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<Success<T>>) {
    (
        StatusCode::CREATED,
        Json(Success {
            status: Status::Ok,
            data,
        }),
    )
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<Success<T>>) {
    (
        StatusCode::OK,
        Json(Success {
            status: Status::Ok,
            data,
        }),
    )
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<Success<Vec<T>>>) {
    success_one_ok(data)
}

/// Body returned by deletes: `{"status":"ok","data":[]}`.
pub fn success_empty() -> (StatusCode, Json<Success<Vec<serde_json::Value>>>) {
    success_one_ok(Vec::new())
}

pub fn error_body(reason: impl Into<String>) -> Failure {
    Failure {
        status: Status::Fail,
        reason: reason.into(),
    }
}
