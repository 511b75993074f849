//! HTTP inbound adapter exposing REST endpoints.

pub mod dto;
pub mod envelope;
pub mod error;
pub mod health;
pub mod images;
pub mod manuals;
pub mod schemas;
pub mod session;
pub mod state;
pub mod steps;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;

use actix_web::web;

use self::error::{json_error_handler, path_error_handler, query_error_handler};

/// Register every `/api/v1` resource on `cfg`.
///
/// Extractor failures are routed through the error envelope so malformed
/// JSON, query strings and path ids answer with `invalid_request`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(users::register)
        .service(users::login)
        .service(users::logout)
        .service(users::current_user)
        .service(users::update_profile)
        .service(users::change_password)
        .service(users::my_manuals)
        .service(manuals::list_manuals)
        .service(manuals::create_manual)
        .service(steps::reorder_steps)
        .service(steps::list_steps)
        .service(steps::create_step)
        .service(manuals::get_manual)
        .service(manuals::update_manual)
        .service(manuals::delete_manual)
        .service(steps::update_step)
        .service(steps::delete_step)
        .service(images::attach_image)
        .service(images::delete_image);
}
