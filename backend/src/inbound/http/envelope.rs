//! Success envelope shared by every JSON endpoint.
//!
//! Successful responses are `{status: "success", data}`; deletions carry a
//! `message` instead of data. Failures use the error envelope built in
//! [`super::error`].

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

const SUCCESS_STATUS: &str = "success";

#[derive(Debug, Serialize)]
struct DataEnvelope<T> {
    status: &'static str,
    data: T,
}

#[derive(Debug, Serialize)]
struct MessageEnvelope<'a> {
    status: &'static str,
    message: &'a str,
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> HttpResponse {
    HttpResponse::build(status).json(DataEnvelope {
        status: SUCCESS_STATUS,
        data,
    })
}

/// `200 OK` wrapping `data`.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::OK, data)
}

/// `201 Created` wrapping `data`.
pub fn created<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::CREATED, data)
}

/// `200 OK` acknowledging a request that returns no resource.
pub fn message(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(MessageEnvelope {
        status: SUCCESS_STATUS,
        message,
    })
}
