//! In-memory service harness shared by the manual behaviour suites.

use std::future::Future;
use std::sync::Arc;

use guideforge::domain::ports::FixtureImageStorage;
use guideforge::domain::{Error, ErrorCode, ManualService};
use guideforge::outbound::memory::InMemoryStore;
use mockable::DefaultClock;
use tokio::runtime::Runtime;

/// Manual service backed entirely by process memory.
pub type MemoryManualService =
    ManualService<InMemoryStore, InMemoryStore, InMemoryStore, FixtureImageStorage>;

/// Service plus the runtime used to drive it from synchronous step functions.
pub struct Harness {
    runtime: Runtime,
    pub service: MemoryManualService,
}

impl Harness {
    pub fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        let store = Arc::new(InMemoryStore::new());
        let service = ManualService::new(
            store.clone(),
            store.clone(),
            store,
            Arc::new(FixtureImageStorage),
            Arc::new(DefaultClock),
        );
        Self { runtime, service }
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Split a quoted, comma-separated step argument into trimmed titles.
pub fn title_list(raw: &str) -> Vec<String> {
    raw.trim_matches('"')
        .split(',')
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse the wire name of an error code as written in feature files.
pub fn error_code(raw: &str) -> ErrorCode {
    match raw.trim_matches('"') {
        "invalid_request" => ErrorCode::InvalidRequest,
        "unauthorized" => ErrorCode::Unauthorized,
        "forbidden" => ErrorCode::Forbidden,
        "not_found" => ErrorCode::NotFound,
        "conflict" => ErrorCode::Conflict,
        "out_of_range" => ErrorCode::OutOfRange,
        other => panic!("unknown error code in feature file: {other}"),
    }
}

/// Assert that `error` carries the code named by `expected`.
pub fn assert_error_code(error: Option<&Error>, expected: &str) {
    let error = error.expect("the last request should have failed");
    assert_eq!(error.code(), error_code(expected), "{error:?}");
}
