//! PostgreSQL-backed `ImageRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ImageRepository, ImageRepositoryError};
use crate::domain::{Image, ImageId, ImageUpload, StepId};

use super::error_mapping::{is_foreign_key_violation, map_diesel_error, map_pool_error};
use super::models::{ImageRow, NewImageRow, collect_rows};
use super::pool::{DbPool, PoolError};
use super::schema::images;

/// Diesel-backed implementation of the `ImageRepository` port.
#[derive(Clone)]
pub struct DieselImageRepository {
    pool: DbPool,
}

impl DieselImageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ImageRepositoryError {
    map_pool_error(error, ImageRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ImageRepositoryError {
    map_diesel_error(
        error,
        ImageRepositoryError::query,
        ImageRepositoryError::connection,
    )
}

#[async_trait]
impl ImageRepository for DieselImageRepository {
    async fn attach(
        &self,
        step_id: StepId,
        upload: &ImageUpload,
        created_at: DateTime<Utc>,
    ) -> Result<Image, ImageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewImageRow {
            step_id: step_id.get(),
            file_path: &upload.file_path,
            file_name: &upload.file_name,
            file_size: upload.file_size,
            mime_type: &upload.mime_type,
            created_at,
        };
        let inserted: ImageRow = diesel::insert_into(images::table)
            .values(&row)
            .returning(ImageRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| {
                // The step vanished between the service's lookup and the
                // insert.
                if is_foreign_key_violation(&error) {
                    ImageRepositoryError::not_found(format!("step {step_id} not found"))
                } else {
                    diesel_error(error)
                }
            })?;
        inserted.into_image().map_err(ImageRepositoryError::query)
    }

    async fn find_by_id(&self, id: ImageId) -> Result<Option<Image>, ImageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<ImageRow> = images::table
            .find(id.get())
            .select(ImageRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(ImageRow::into_image)
            .transpose()
            .map_err(ImageRepositoryError::query)
    }

    async fn delete(&self, id: ImageId) -> Result<(), ImageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(images::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if deleted == 0 {
            return Err(ImageRepositoryError::not_found(format!(
                "image {id} not found"
            )));
        }
        Ok(())
    }

    async fn list_for_steps(
        &self,
        step_ids: &[StepId],
    ) -> Result<Vec<Image>, ImageRepositoryError> {
        if step_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let ids: Vec<i64> = step_ids.iter().map(|id| id.get()).collect();
        let rows: Vec<ImageRow> = images::table
            .filter(images::step_id.eq_any(ids))
            .order_by(images::id.asc())
            .select(ImageRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        collect_rows(rows, ImageRow::into_image).map_err(ImageRepositoryError::query)
    }
}
