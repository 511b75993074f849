//! PostgreSQL-backed `StepRepository` implementation using Diesel ORM.
//!
//! Every positional write runs in one transaction that first locks the
//! manual row, compares `step_revision` against the caller's snapshot and
//! finally increments it. The `(manual_id, order_number)` uniqueness
//! constraint is deferred to commit so shifts can pass through transient
//! duplicates.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{NewStep, StepRepository, StepRepositoryError, StepSet};
use crate::domain::{Image, ManualId, OrderChange, Step, StepId};

use super::error_mapping::{is_foreign_key_violation, map_diesel_error, map_pool_error};
use super::models::{ImageRow, NewStepRow, StepContentUpdate, StepRow, collect_rows};
use super::pool::{DbPool, PoolError};
use super::schema::{images, manuals, steps};

/// Diesel-backed implementation of the `StepRepository` port.
#[derive(Clone)]
pub struct DieselStepRepository {
    pool: DbPool,
}

impl DieselStepRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a write transaction: either the database refused or a
/// repository rule was broken and the transaction must roll back.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Repo(StepRepositoryError),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl From<TxError> for StepRepositoryError {
    fn from(error: TxError) -> Self {
        match error {
            TxError::Diesel(error) => diesel_error(error),
            TxError::Repo(error) => error,
        }
    }
}

fn pool_error(error: PoolError) -> StepRepositoryError {
    map_pool_error(error, StepRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> StepRepositoryError {
    map_diesel_error(
        error,
        StepRepositoryError::query,
        StepRepositoryError::connection,
    )
}

fn order_column(value: u32) -> Result<i32, StepRepositoryError> {
    i32::try_from(value)
        .map_err(|_| StepRepositoryError::query(format!("order number {value} exceeds storage range")))
}

fn revision_value(stored: i64) -> u64 {
    u64::try_from(stored).unwrap_or_default()
}

fn manual_missing(manual_id: i64) -> StepRepositoryError {
    StepRepositoryError::not_found(format!("manual {manual_id} not found"))
}

/// Lock the manual row and verify the caller's revision snapshot.
async fn lock_revision(
    conn: &mut AsyncPgConnection,
    manual_id: i64,
    expected: u64,
) -> Result<(), TxError> {
    let stored: Option<i64> = manuals::table
        .find(manual_id)
        .select(manuals::step_revision)
        .for_update()
        .first(conn)
        .await
        .optional()?;
    let actual = stored
        .map(revision_value)
        .ok_or_else(|| TxError::Repo(manual_missing(manual_id)))?;
    if actual != expected {
        return Err(TxError::Repo(StepRepositoryError::revision_mismatch(
            expected, actual,
        )));
    }
    Ok(())
}

async fn bump_revision(conn: &mut AsyncPgConnection, manual_id: i64) -> Result<(), TxError> {
    diesel::update(manuals::table.find(manual_id))
        .set(manuals::step_revision.eq(manuals::step_revision + 1))
        .execute(conn)
        .await?;
    Ok(())
}

/// Write each changed order number, scoped to the manual so a foreign step
/// id can never be moved.
async fn apply_shifts(
    conn: &mut AsyncPgConnection,
    manual_id: i64,
    shifts: &[(i64, i32)],
) -> Result<(), TxError> {
    for (step_id, order_number) in shifts {
        let updated = diesel::update(
            steps::table
                .filter(steps::id.eq(*step_id))
                .filter(steps::manual_id.eq(manual_id)),
        )
        .set(steps::order_number.eq(*order_number))
        .execute(conn)
        .await?;
        if updated == 0 {
            return Err(TxError::Repo(StepRepositoryError::not_found(format!(
                "step {step_id} not found in manual {manual_id}"
            ))));
        }
    }
    Ok(())
}

fn shift_rows(changes: &[OrderChange<StepId>]) -> Result<Vec<(i64, i32)>, StepRepositoryError> {
    changes
        .iter()
        .map(|change| Ok((change.id.get(), order_column(change.to)?)))
        .collect()
}

#[async_trait]
impl StepRepository for DieselStepRepository {
    async fn load_sequence(&self, manual_id: ManualId) -> Result<StepSet, StepRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let id = manual_id.get();
        // Revision first: a concurrent write between the two reads then
        // surfaces as a mismatch instead of a silently stale snapshot.
        let revision: Option<i64> = manuals::table
            .find(id)
            .select(manuals::step_revision)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        let revision = revision.map(revision_value).ok_or_else(|| manual_missing(id))?;
        let rows: Vec<StepRow> = steps::table
            .filter(steps::manual_id.eq(id))
            .order_by((steps::order_number.asc(), steps::id.asc()))
            .select(StepRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        let steps = collect_rows(rows, StepRow::into_step).map_err(StepRepositoryError::query)?;
        Ok(StepSet { revision, steps })
    }

    async fn find_step(&self, id: StepId) -> Result<Option<Step>, StepRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<StepRow> = steps::table
            .find(id.get())
            .select(StepRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(StepRow::into_step)
            .transpose()
            .map_err(StepRepositoryError::query)
    }

    async fn insert_step(
        &self,
        expected_revision: u64,
        step: &NewStep,
        shifts: &[OrderChange<StepId>],
    ) -> Result<Step, StepRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let manual_id = step.manual_id.get();
        let shifts = shift_rows(shifts)?;
        let row = NewStepRow {
            manual_id,
            order_number: order_column(step.order_number)?,
            title: &step.title,
            content: step.content.as_deref(),
            created_at: step.created_at,
            updated_at: step.created_at,
        };

        let inserted: StepRow = conn
            .transaction(|conn| {
                async move {
                    lock_revision(conn, manual_id, expected_revision).await?;
                    apply_shifts(conn, manual_id, &shifts).await?;
                    let inserted: StepRow = diesel::insert_into(steps::table)
                        .values(&row)
                        .returning(StepRow::as_returning())
                        .get_result(conn)
                        .await?;
                    bump_revision(conn, manual_id).await?;
                    Ok::<_, TxError>(inserted)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| match error {
                TxError::Diesel(ref inner) if is_foreign_key_violation(inner) => {
                    manual_missing(manual_id)
                }
                other => other.into(),
            })?;
        inserted.into_step().map_err(StepRepositoryError::query)
    }

    async fn delete_step(
        &self,
        manual_id: ManualId,
        expected_revision: u64,
        step_id: StepId,
        shifts: &[OrderChange<StepId>],
    ) -> Result<Vec<Image>, StepRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let manual_id = manual_id.get();
        let step_id = step_id.get();
        let shifts = shift_rows(shifts)?;

        let removed: Vec<ImageRow> = conn
            .transaction(|conn| {
                async move {
                    lock_revision(conn, manual_id, expected_revision).await?;
                    let doomed: Vec<ImageRow> = images::table
                        .filter(images::step_id.eq(step_id))
                        .order_by(images::id)
                        .select(ImageRow::as_select())
                        .load(conn)
                        .await?;
                    let deleted = diesel::delete(
                        steps::table
                            .filter(steps::id.eq(step_id))
                            .filter(steps::manual_id.eq(manual_id)),
                    )
                    .execute(conn)
                    .await?;
                    if deleted == 0 {
                        return Err(TxError::Repo(StepRepositoryError::not_found(format!(
                            "step {step_id} not found in manual {manual_id}"
                        ))));
                    }
                    apply_shifts(conn, manual_id, &shifts).await?;
                    bump_revision(conn, manual_id).await?;
                    Ok::<_, TxError>(doomed)
                }
                .scope_boxed()
            })
            .await
            .map_err(StepRepositoryError::from)?;
        collect_rows(removed, ImageRow::into_image).map_err(StepRepositoryError::query)
    }

    async fn apply_order(
        &self,
        manual_id: ManualId,
        expected_revision: u64,
        changes: &[OrderChange<StepId>],
    ) -> Result<(), StepRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let manual_id = manual_id.get();
        let shifts = shift_rows(changes)?;

        conn.transaction(|conn| {
            async move {
                lock_revision(conn, manual_id, expected_revision).await?;
                apply_shifts(conn, manual_id, &shifts).await?;
                bump_revision(conn, manual_id).await?;
                Ok::<_, TxError>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(StepRepositoryError::from)
    }

    async fn update_step(
        &self,
        manual_id: ManualId,
        expected_revision: u64,
        step: &Step,
        shifts: &[OrderChange<StepId>],
    ) -> Result<(), StepRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let manual_id = manual_id.get();
        let step_id = step.id.get();
        let shifts = shift_rows(shifts)?;
        let content = StepContentUpdate {
            title: &step.title,
            content: step.content.as_deref(),
            updated_at: step.updated_at,
        };

        conn.transaction(|conn| {
            async move {
                lock_revision(conn, manual_id, expected_revision).await?;
                apply_shifts(conn, manual_id, &shifts).await?;
                let updated = diesel::update(
                    steps::table
                        .filter(steps::id.eq(step_id))
                        .filter(steps::manual_id.eq(manual_id)),
                )
                .set(&content)
                .execute(conn)
                .await?;
                if updated == 0 {
                    return Err(TxError::Repo(StepRepositoryError::not_found(format!(
                        "step {step_id} not found in manual {manual_id}"
                    ))));
                }
                bump_revision(conn, manual_id).await?;
                Ok::<_, TxError>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(StepRepositoryError::from)
    }
}
