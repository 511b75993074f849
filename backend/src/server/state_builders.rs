//! Builders wiring repositories and services into [`HttpState`].

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use guideforge::domain::ports::{ImageRepository, ManualRepository, StepRepository, UserRepository};
use guideforge::domain::{AccountService, ContentPolicy, ManualService};
use guideforge::inbound::http::state::{HttpState, HttpStatePorts};
use guideforge::outbound::memory::InMemoryStore;
use guideforge::outbound::persistence::{
    DbPool, DieselImageRepository, DieselManualRepository, DieselStepRepository,
    DieselUserRepository,
};
use guideforge::outbound::storage::UploadDirectory;

use super::ServerConfig;

/// Repositories backing one server instance.
struct Repositories<M, S, I, U> {
    manuals: Arc<M>,
    steps: Arc<S>,
    images: Arc<I>,
    users: Arc<U>,
}

fn wire<M, S, I, U>(
    repos: Repositories<M, S, I, U>,
    uploads: Arc<UploadDirectory>,
    policy: ContentPolicy,
) -> HttpState
where
    M: ManualRepository + 'static,
    S: StepRepository + 'static,
    I: ImageRepository + 'static,
    U: UserRepository + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let accounts = Arc::new(AccountService::new(repos.users, clock.clone()));
    let manuals = Arc::new(
        ManualService::new(repos.manuals, repos.steps, repos.images, uploads, clock)
            .with_policy(policy),
    );
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

fn diesel_repositories(
    pool: &DbPool,
) -> Repositories<DieselManualRepository, DieselStepRepository, DieselImageRepository, DieselUserRepository>
{
    Repositories {
        manuals: Arc::new(DieselManualRepository::new(pool.clone())),
        steps: Arc::new(DieselStepRepository::new(pool.clone())),
        images: Arc::new(DieselImageRepository::new(pool.clone())),
        users: Arc::new(DieselUserRepository::new(pool.clone())),
    }
}

fn memory_repositories()
-> Repositories<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    Repositories {
        manuals: store.clone(),
        steps: store.clone(),
        images: store.clone(),
        users: store,
    }
}

/// Build HTTP state from the configured storage backend.
pub(super) fn build_http_state(config: &ServerConfig) -> HttpState {
    let uploads = Arc::new(config.uploads.clone());
    let policy = config.policy.clone();
    match &config.db_pool {
        Some(pool) => wire(diesel_repositories(pool), uploads, policy),
        None => {
            tracing::warn!("no database configured; data is kept in memory only");
            wire(memory_repositories(), uploads, policy)
        }
    }
}
