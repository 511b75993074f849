//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use mockable::DefaultClock;
use serde_json::{Value, json};

use crate::Trace;
use crate::domain::ports::FixtureImageStorage;
use crate::domain::{AccountService, ManualService};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::InMemoryStore;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Real services over a fresh in-memory store.
pub fn memory_state() -> HttpState {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(DefaultClock);
    let accounts = Arc::new(AccountService::new(store.clone(), clock.clone()));
    let manuals = Arc::new(ManualService::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(FixtureImageStorage),
        clock,
    ));
    HttpState::new(HttpStatePorts {
        login: accounts.clone(),
        accounts: accounts.clone(),
        profile: accounts,
        manuals: manuals.clone(),
        manuals_query: manuals.clone(),
        steps: manuals.clone(),
        images: manuals,
    })
}

/// Full API under `/api/v1` with tracing and sessions.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
}

/// Register `username` and return the session cookie from logging in.
pub async fn register_and_login(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    username: &str,
) -> Cookie<'static> {
    let email = format!("{username}@example.com");
    let register = test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(json!({
            "username": username,
            "email": email,
            "password": "correct horse",
        }))
        .to_request();
    let res = test::call_service(app, register).await;
    assert!(res.status().is_success(), "register {username}: {}", res.status());

    let login = test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "email": email, "password": "correct horse" }))
        .to_request();
    let res = test::call_service(app, login).await;
    assert!(res.status().is_success(), "login {username}: {}", res.status());
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(|cookie| cookie.into_owned())
        .expect("session cookie")
}

/// Send `req` and decode the JSON body alongside the status code.
pub async fn call_json(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    req: test::TestRequest,
) -> (u16, Value) {
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status().as_u16();
    let body = test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}

/// Create a manual as the cookie's owner and return its id.
pub async fn create_manual(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    cookie: &Cookie<'static>,
    body: Value,
) -> i64 {
    let (status, value) = call_json(
        app,
        test::TestRequest::post()
            .uri("/api/v1/manuals")
            .cookie(cookie.clone())
            .set_json(body),
    )
    .await;
    assert_eq!(status, 201, "{value}");
    value["data"]["id"].as_i64().expect("manual id")
}

/// Append a step titled `title` and return its id.
pub async fn create_step(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    cookie: &Cookie<'static>,
    manual_id: i64,
    title: &str,
) -> i64 {
    let (status, value) = call_json(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/manuals/{manual_id}/steps"))
            .cookie(cookie.clone())
            .set_json(json!({ "title": title })),
    )
    .await;
    assert_eq!(status, 201, "{value}");
    value["data"]["id"].as_i64().expect("step id")
}
