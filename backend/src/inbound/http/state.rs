//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ImageCommand, LoginService, ManualCommand, ManualQuery, StepCommand, UserAccountCommand,
    UserProfileQuery,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn UserAccountCommand>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub manuals: Arc<dyn ManualCommand>,
    pub manuals_query: Arc<dyn ManualQuery>,
    pub steps: Arc<dyn StepCommand>,
    pub images: Arc<dyn ImageCommand>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn UserAccountCommand>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub manuals: Arc<dyn ManualCommand>,
    pub manuals_query: Arc<dyn ManualQuery>,
    pub steps: Arc<dyn StepCommand>,
    pub images: Arc<dyn ImageCommand>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// A single service usually backs several ports, so callers clone one
    /// `Arc` into each slot.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use guideforge::domain::{AccountService, ManualService};
    /// use guideforge::domain::ports::FixtureImageStorage;
    /// use guideforge::inbound::http::state::{HttpState, HttpStatePorts};
    /// use guideforge::outbound::memory::InMemoryStore;
    /// use mockable::DefaultClock;
    ///
    /// let store = Arc::new(InMemoryStore::new());
    /// let clock = Arc::new(DefaultClock);
    /// let accounts = Arc::new(AccountService::new(store.clone(), clock.clone()));
    /// let manuals = Arc::new(ManualService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     store,
    ///     Arc::new(FixtureImageStorage),
    ///     clock,
    /// ));
    /// let state = HttpState::new(HttpStatePorts {
    ///     login: accounts.clone(),
    ///     accounts: accounts.clone(),
    ///     profile: accounts,
    ///     manuals: manuals.clone(),
    ///     manuals_query: manuals.clone(),
    ///     steps: manuals.clone(),
    ///     images: manuals,
    /// });
    /// let _login = state.login.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            accounts,
            profile,
            manuals,
            manuals_query,
            steps,
            images,
        } = ports;
        Self {
            login,
            accounts,
            profile,
            manuals,
            manuals_query,
            steps,
            images,
        }
    }
}
