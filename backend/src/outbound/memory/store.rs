//! Mutex-guarded state shared by the in-memory repository adapters.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::Page;

use crate::domain::ports::{
    ImageRepository, ImageRepositoryError, ManualRepository, ManualRepositoryError, NewManual,
    NewStep, StepRepository, StepRepositoryError, StepSet, UserRepository, UserRepositoryError,
};
use crate::domain::{
    EmailAddress, IdValidationError, Image, ImageId, ImageUpload, Manual, ManualId, ManualSearch, NewUser,
    OrderChange, PasswordDigest, Relation, SearchScope, Step, StepId, StoredCredentials, User,
    UserId, search,
};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    users: BTreeMap<UserId, StoredCredentials>,
    manuals: BTreeMap<ManualId, StoredManual>,
    steps: BTreeMap<StepId, Step>,
    images: BTreeMap<ImageId, Image>,
}

#[derive(Debug)]
struct StoredManual {
    manual: Manual,
    step_revision: u64,
}

impl State {
    /// Identifiers share one counter; uniqueness per table is all callers
    /// rely on.
    fn allocate<T>(
        &mut self,
        build: impl FnOnce(i64) -> Result<T, IdValidationError>,
    ) -> Result<T, String> {
        self.next_id += 1;
        build(self.next_id).map_err(|err| err.to_string())
    }

    fn revision_of(&self, manual_id: ManualId) -> Result<u64, StepRepositoryError> {
        self.manuals
            .get(&manual_id)
            .map(|stored| stored.step_revision)
            .ok_or_else(|| StepRepositoryError::not_found(format!("manual {manual_id} not found")))
    }

    fn check_revision(&self, manual_id: ManualId, expected: u64) -> Result<(), StepRepositoryError> {
        let actual = self.revision_of(manual_id)?;
        if actual != expected {
            return Err(StepRepositoryError::revision_mismatch(expected, actual));
        }
        Ok(())
    }

    fn bump_revision(&mut self, manual_id: ManualId) {
        if let Some(stored) = self.manuals.get_mut(&manual_id) {
            stored.step_revision += 1;
        }
    }

    /// Validate every shift before touching anything so a failed write
    /// leaves the state untouched.
    fn check_shifts(
        &self,
        manual_id: ManualId,
        shifts: &[OrderChange<StepId>],
    ) -> Result<(), StepRepositoryError> {
        for change in shifts {
            match self.steps.get(&change.id) {
                Some(step) if step.manual_id == manual_id => {}
                _ => {
                    return Err(StepRepositoryError::not_found(format!(
                        "step {} not found in manual {manual_id}",
                        change.id
                    )));
                }
            }
        }
        Ok(())
    }

    fn apply_shifts(&mut self, shifts: &[OrderChange<StepId>]) {
        for change in shifts {
            if let Some(step) = self.steps.get_mut(&change.id) {
                step.order_number = change.to;
            }
        }
    }

    /// Remove the images of `steps`, returning them ordered by id.
    fn take_images(&mut self, steps: &[StepId]) -> Vec<Image> {
        let doomed: Vec<ImageId> = self
            .images
            .values()
            .filter(|image| steps.contains(&image.step_id))
            .map(|image| image.id)
            .collect();
        doomed
            .into_iter()
            .filter_map(|id| self.images.remove(&id))
            .collect()
    }

    fn ensure_unique(
        &self,
        username: &str,
        email: &str,
        except: Option<UserId>,
    ) -> Result<(), UserRepositoryError> {
        for (id, stored) in &self.users {
            if Some(*id) == except {
                continue;
            }
            if stored.user.username.as_ref() == username {
                return Err(UserRepositoryError::duplicate("username"));
            }
            if stored.user.email.as_ref() == email {
                return Err(UserRepositoryError::duplicate("email"));
            }
        }
        Ok(())
    }
}

/// Repository adapters backed by process memory.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use guideforge::outbound::memory::InMemoryStore;
///
/// let store = Arc::new(InMemoryStore::default());
/// let manuals = Arc::clone(&store);
/// let steps = Arc::clone(&store);
/// # let _ = (manuals, steps);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutations validate before writing, so a poisoned lock still guards
    /// consistent state.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn header(manual: &Manual) -> Manual {
    Manual {
        steps: Relation::NotLoaded,
        ..manual.clone()
    }
}

fn bare_step(step: &Step) -> Step {
    Step {
        images: Relation::NotLoaded,
        ..step.clone()
    }
}

#[async_trait]
impl ManualRepository for InMemoryStore {
    async fn create(&self, manual: &NewManual) -> Result<Manual, ManualRepositoryError> {
        let mut state = self.lock();
        let id = state
            .allocate(ManualId::new)
            .map_err(ManualRepositoryError::query)?;
        let created = Manual {
            id,
            owner_id: manual.owner_id,
            title: manual.title.clone(),
            description: manual.description.clone(),
            category: manual.category.clone(),
            visibility: manual.visibility,
            created_at: manual.created_at,
            updated_at: manual.created_at,
            steps: Relation::NotLoaded,
        };
        state.manuals.insert(
            id,
            StoredManual {
                manual: created.clone(),
                step_revision: 0,
            },
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: ManualId) -> Result<Option<Manual>, ManualRepositoryError> {
        Ok(self.lock().manuals.get(&id).map(|stored| header(&stored.manual)))
    }

    async fn update(&self, manual: &Manual) -> Result<(), ManualRepositoryError> {
        let mut state = self.lock();
        let stored = state
            .manuals
            .get_mut(&manual.id)
            .ok_or_else(|| ManualRepositoryError::not_found(manual.id.get()))?;
        stored.manual = header(manual);
        Ok(())
    }

    async fn delete_cascade(&self, id: ManualId) -> Result<Vec<Image>, ManualRepositoryError> {
        let mut state = self.lock();
        if state.manuals.remove(&id).is_none() {
            return Err(ManualRepositoryError::not_found(id.get()));
        }
        let step_ids: Vec<StepId> = state
            .steps
            .values()
            .filter(|step| step.manual_id == id)
            .map(|step| step.id)
            .collect();
        for step_id in &step_ids {
            state.steps.remove(step_id);
        }
        Ok(state.take_images(&step_ids))
    }

    async fn search(
        &self,
        query: &ManualSearch,
        scope: &SearchScope,
    ) -> Result<Page<Manual>, ManualRepositoryError> {
        let headers: Vec<Manual> = self
            .lock()
            .manuals
            .values()
            .map(|stored| header(&stored.manual))
            .collect();
        Ok(search::run(headers, query, scope))
    }
}

#[async_trait]
impl StepRepository for InMemoryStore {
    async fn load_sequence(&self, manual_id: ManualId) -> Result<StepSet, StepRepositoryError> {
        let state = self.lock();
        let revision = state.revision_of(manual_id)?;
        let mut steps: Vec<Step> = state
            .steps
            .values()
            .filter(|step| step.manual_id == manual_id)
            .map(bare_step)
            .collect();
        steps.sort_by_key(|step| (step.order_number, step.id));
        Ok(StepSet { revision, steps })
    }

    async fn find_step(&self, id: StepId) -> Result<Option<Step>, StepRepositoryError> {
        Ok(self.lock().steps.get(&id).map(bare_step))
    }

    async fn insert_step(
        &self,
        expected_revision: u64,
        step: &NewStep,
        shifts: &[OrderChange<StepId>],
    ) -> Result<Step, StepRepositoryError> {
        let mut state = self.lock();
        state.check_revision(step.manual_id, expected_revision)?;
        state.check_shifts(step.manual_id, shifts)?;
        state.apply_shifts(shifts);
        let id = state
            .allocate(StepId::new)
            .map_err(StepRepositoryError::query)?;
        let created = Step {
            id,
            manual_id: step.manual_id,
            order_number: step.order_number,
            title: step.title.clone(),
            content: step.content.clone(),
            created_at: step.created_at,
            updated_at: step.created_at,
            images: Relation::NotLoaded,
        };
        state.steps.insert(id, created.clone());
        state.bump_revision(step.manual_id);
        Ok(created)
    }

    async fn delete_step(
        &self,
        manual_id: ManualId,
        expected_revision: u64,
        step_id: StepId,
        shifts: &[OrderChange<StepId>],
    ) -> Result<Vec<Image>, StepRepositoryError> {
        let mut state = self.lock();
        state.check_revision(manual_id, expected_revision)?;
        match state.steps.get(&step_id) {
            Some(step) if step.manual_id == manual_id => {}
            _ => {
                return Err(StepRepositoryError::not_found(format!(
                    "step {step_id} not found in manual {manual_id}"
                )));
            }
        }
        state.check_shifts(manual_id, shifts)?;
        state.steps.remove(&step_id);
        state.apply_shifts(shifts);
        state.bump_revision(manual_id);
        Ok(state.take_images(&[step_id]))
    }

    async fn apply_order(
        &self,
        manual_id: ManualId,
        expected_revision: u64,
        changes: &[OrderChange<StepId>],
    ) -> Result<(), StepRepositoryError> {
        let mut state = self.lock();
        state.check_revision(manual_id, expected_revision)?;
        state.check_shifts(manual_id, changes)?;
        state.apply_shifts(changes);
        state.bump_revision(manual_id);
        Ok(())
    }

    async fn update_step(
        &self,
        manual_id: ManualId,
        expected_revision: u64,
        step: &Step,
        shifts: &[OrderChange<StepId>],
    ) -> Result<(), StepRepositoryError> {
        let mut state = self.lock();
        state.check_revision(manual_id, expected_revision)?;
        match state.steps.get(&step.id) {
            Some(stored) if stored.manual_id == manual_id => {}
            _ => {
                return Err(StepRepositoryError::not_found(format!(
                    "step {} not found in manual {manual_id}",
                    step.id
                )));
            }
        }
        state.check_shifts(manual_id, shifts)?;
        state.apply_shifts(shifts);
        if let Some(stored) = state.steps.get_mut(&step.id) {
            stored.title.clone_from(&step.title);
            stored.content.clone_from(&step.content);
            stored.updated_at = step.updated_at;
        }
        state.bump_revision(manual_id);
        Ok(())
    }
}

#[async_trait]
impl ImageRepository for InMemoryStore {
    async fn attach(
        &self,
        step_id: StepId,
        upload: &ImageUpload,
        created_at: DateTime<Utc>,
    ) -> Result<Image, ImageRepositoryError> {
        let mut state = self.lock();
        if !state.steps.contains_key(&step_id) {
            return Err(ImageRepositoryError::not_found(format!(
                "step {step_id} not found"
            )));
        }
        let id = state
            .allocate(ImageId::new)
            .map_err(ImageRepositoryError::query)?;
        let image = Image {
            id,
            step_id,
            file_path: upload.file_path.clone(),
            file_name: upload.file_name.clone(),
            file_size: upload.file_size,
            mime_type: upload.mime_type.clone(),
            created_at,
        };
        state.images.insert(id, image.clone());
        Ok(image)
    }

    async fn find_by_id(&self, id: ImageId) -> Result<Option<Image>, ImageRepositoryError> {
        Ok(self.lock().images.get(&id).cloned())
    }

    async fn delete(&self, id: ImageId) -> Result<(), ImageRepositoryError> {
        self.lock()
            .images
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ImageRepositoryError::not_found(format!("image {id} not found")))
    }

    async fn list_for_steps(
        &self,
        step_ids: &[StepId],
    ) -> Result<Vec<Image>, ImageRepositoryError> {
        Ok(self
            .lock()
            .images
            .values()
            .filter(|image| step_ids.contains(&image.step_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut state = self.lock();
        state.ensure_unique(user.username.as_ref(), user.email.as_ref(), None)?;
        let id = state
            .allocate(UserId::new)
            .map_err(UserRepositoryError::query)?;
        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            profile_image: None,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        state.users.insert(
            id,
            StoredCredentials {
                user: created.clone(),
                password_digest: user.password_digest.clone(),
            },
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.lock().users.get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|stored| &stored.user.email == email)
            .cloned())
    }

    async fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn update_profile(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut state = self.lock();
        state.ensure_unique(user.username.as_ref(), user.email.as_ref(), Some(user.id))?;
        let stored = state
            .users
            .get_mut(&user.id)
            .ok_or_else(|| UserRepositoryError::query(format!("user {} no longer exists", user.id)))?;
        stored.user = user.clone();
        Ok(())
    }

    async fn update_password(
        &self,
        id: UserId,
        digest: &PasswordDigest,
        updated_at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        let mut state = self.lock();
        let stored = state
            .users
            .get_mut(&id)
            .ok_or_else(|| UserRepositoryError::query(format!("user {id} no longer exists")))?;
        stored.password_digest = digest.clone();
        stored.user.updated_at = updated_at;
        Ok(())
    }
}
