//! Manual authoring service.
//!
//! [`ManualService`] implements the manual, step and image driving ports on
//! top of the repository ports. Ownership is checked before any mutation.
//! Positional step mutations read the manual's step set, run the ordering
//! engine, and commit against the revision they read; a stale revision is
//! retried a bounded number of times before surfacing as a conflict.

mod image_ops;
mod manual_ops;
mod step_ops;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::ports::{
    ImageRepository, ImageRepositoryError, ImageStorage, ManualRepository, ManualRepositoryError,
    StepRepository, StepRepositoryError,
};
use crate::domain::{
    ContentPolicy, Error, Image, Manual, ManualId, OrderingError, Step, StepId, UserId,
};

/// Attempts made for one positional mutation before reporting a conflict.
pub const MAX_ATTEMPTS: u32 = 3;

/// Domain service for manuals, their steps and step images.
#[derive(Clone)]
pub struct ManualService<M, S, I, B> {
    manuals: Arc<M>,
    steps: Arc<S>,
    images: Arc<I>,
    storage: Arc<B>,
    clock: Arc<dyn Clock>,
    policy: ContentPolicy,
}

impl<M, S, I, B> ManualService<M, S, I, B> {
    /// Create a service over the given adapters.
    pub fn new(
        manuals: Arc<M>,
        steps: Arc<S>,
        images: Arc<I>,
        storage: Arc<B>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            manuals,
            steps,
            images,
            storage,
            clock,
            policy: ContentPolicy::default(),
        }
    }

    /// Replace the default content limits.
    #[must_use]
    pub fn with_policy(mut self, policy: ContentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ContentPolicy {
        &self.policy
    }
}

impl<M, S, I, B> ManualService<M, S, I, B>
where
    M: ManualRepository,
    S: StepRepository,
    I: ImageRepository,
    B: ImageStorage,
{
    async fn find_manual(&self, id: ManualId) -> Result<Manual, Error> {
        self.manuals
            .find_by_id(id)
            .await
            .map_err(map_manual_error)?
            .ok_or_else(|| manual_not_found(id))
    }

    /// Load a manual the actor owns.
    async fn owned_manual(&self, actor: UserId, id: ManualId) -> Result<Manual, Error> {
        let manual = self.find_manual(id).await?;
        if !manual.is_owned_by(&actor) {
            return Err(Error::forbidden("only the owner may modify this manual"));
        }
        Ok(manual)
    }

    /// Load a manual the viewer may read.
    async fn readable_manual(&self, viewer: Option<UserId>, id: ManualId) -> Result<Manual, Error> {
        let manual = self.find_manual(id).await?;
        if !manual.is_readable_by(viewer.as_ref()) {
            return Err(Error::forbidden("this manual is private"));
        }
        Ok(manual)
    }

    async fn find_step(&self, id: StepId) -> Result<Step, Error> {
        self.steps
            .find_step(id)
            .await
            .map_err(map_step_error)?
            .ok_or_else(|| Error::not_found(format!("step {id} not found")))
    }

    /// Attach each step's images, keeping step order.
    async fn expand_images(&self, steps: Vec<Step>) -> Result<Vec<Step>, Error> {
        if steps.is_empty() {
            return Ok(steps);
        }
        let ids: Vec<StepId> = steps.iter().map(|step| step.id).collect();
        let mut by_step: HashMap<StepId, Vec<Image>> = HashMap::new();
        for image in self
            .images
            .list_for_steps(&ids)
            .await
            .map_err(map_image_error)?
        {
            by_step.entry(image.step_id).or_default().push(image);
        }
        Ok(steps
            .into_iter()
            .map(|step| {
                let images = by_step.remove(&step.id).unwrap_or_default();
                step.with_images(images)
            })
            .collect())
    }

    /// Remove stored files after their metadata is gone. Failures are
    /// logged and never fail the request.
    async fn remove_files(&self, images: &[Image]) {
        for image in images {
            if let Err(err) = self.storage.remove(&image.file_path).await {
                warn!(
                    image_id = %image.id,
                    path = %image.file_path,
                    error = %err,
                    "failed to remove stored image file",
                );
            }
        }
    }
}

/// Outcome of one optimistic attempt.
enum AttemptError {
    /// The step set changed since it was read.
    Stale { expected: u64, actual: u64 },
    Failed(Error),
}

impl From<Error> for AttemptError {
    fn from(value: Error) -> Self {
        Self::Failed(value)
    }
}

impl From<StepRepositoryError> for AttemptError {
    fn from(value: StepRepositoryError) -> Self {
        match value {
            StepRepositoryError::RevisionMismatch { expected, actual } => {
                Self::Stale { expected, actual }
            }
            other => Self::Failed(map_step_error(other)),
        }
    }
}

impl From<OrderingError<StepId>> for AttemptError {
    fn from(value: OrderingError<StepId>) -> Self {
        Self::Failed(map_ordering_error(value))
    }
}

/// Run `attempt` until it commits, fails for a non-concurrency reason, or
/// exhausts [`MAX_ATTEMPTS`].
async fn retry_on_stale<T, F, Fut>(manual_id: ManualId, mut attempt: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let mut last = (0, 0);
    for round in 1..=MAX_ATTEMPTS {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Failed(error)) => return Err(error),
            Err(AttemptError::Stale { expected, actual }) => {
                debug!(
                    manual_id = %manual_id,
                    round,
                    expected,
                    actual,
                    "step set changed concurrently; retrying",
                );
                last = (expected, actual);
            }
        }
    }
    Err(
        Error::conflict("the manual's steps were changed concurrently; please retry").with_details(
            json!({
                "code": "revision_mismatch",
                "attempts": MAX_ATTEMPTS,
                "expectedRevision": last.0,
                "actualRevision": last.1,
            }),
        ),
    )
}

fn manual_not_found(id: ManualId) -> Error {
    Error::not_found(format!("manual {id} not found"))
}

fn map_manual_error(error: ManualRepositoryError) -> Error {
    match error {
        ManualRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("manual repository unavailable: {message}"))
        }
        ManualRepositoryError::Query { message } => {
            Error::internal(format!("manual repository error: {message}"))
        }
        ManualRepositoryError::NotFound { id } => Error::not_found(format!("manual {id} not found")),
    }
}

fn map_step_error(error: StepRepositoryError) -> Error {
    match error {
        StepRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("step repository unavailable: {message}"))
        }
        StepRepositoryError::Query { message } => {
            Error::internal(format!("step repository error: {message}"))
        }
        StepRepositoryError::RevisionMismatch { expected, actual } => {
            Error::conflict("the manual's steps were changed concurrently; please retry")
                .with_details(json!({
                    "code": "revision_mismatch",
                    "expectedRevision": expected,
                    "actualRevision": actual,
                }))
        }
        StepRepositoryError::NotFound { message } => Error::not_found(message),
    }
}

fn map_image_error(error: ImageRepositoryError) -> Error {
    match error {
        ImageRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("image repository unavailable: {message}"))
        }
        ImageRepositoryError::Query { message } => {
            Error::internal(format!("image repository error: {message}"))
        }
        ImageRepositoryError::NotFound { message } => Error::not_found(message),
    }
}

fn map_ordering_error(error: OrderingError<StepId>) -> Error {
    match error {
        OrderingError::OutOfRange { requested, max } => Error::out_of_range(format!(
            "position {requested} is outside the valid range 1..={max}"
        ))
        .with_details(json!({ "requested": requested, "min": 1, "max": max })),
        OrderingError::NotFound { id } => Error::not_found(format!("step {id} not found")),
        OrderingError::Conflict { reason } => Error::conflict(reason),
    }
}
