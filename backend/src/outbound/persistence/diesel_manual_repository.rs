//! PostgreSQL-backed `ManualRepository` implementation using Diesel ORM.
//!
//! Search runs entirely in SQL: `ILIKE` for the search term, equality
//! filters, `ORDER BY <field>, id` and `LIMIT/OFFSET`, plus a `COUNT(*)`
//! over the same filters for the total. Titles sort under `COLLATE "C"` so
//! the order matches the byte-wise comparison in `domain::search`.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::dsl::sql;
use diesel::expression::SqlLiteral;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use pagination::Page;

use crate::domain::ports::{ManualRepository, ManualRepositoryError, NewManual};
use crate::domain::{
    Image, Manual, ManualId, ManualSearch, SearchScope, SortField, SortOrder, Visibility,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ImageRow, ManualRow, ManualUpdate, NewManualRow, collect_rows};
use super::pool::{DbPool, PoolError};
use super::schema::{images, manuals, steps};

/// Diesel-backed implementation of the `ManualRepository` port.
#[derive(Clone)]
pub struct DieselManualRepository {
    pool: DbPool,
}

impl DieselManualRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ManualRepositoryError {
    map_pool_error(error, ManualRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ManualRepositoryError {
    map_diesel_error(
        error,
        ManualRepositoryError::query,
        ManualRepositoryError::connection,
    )
}

/// Escape `LIKE` metacharacters and wrap the term for a substring match.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Scope and filters shared by the page query and the count query.
fn filtered(query: &ManualSearch, scope: &SearchScope) -> manuals::BoxedQuery<'static, Pg> {
    let mut statement = manuals::table.into_boxed();
    statement = match scope {
        SearchScope::Public => statement.filter(manuals::is_public.eq(true)),
        SearchScope::Owner(user) => statement.filter(manuals::owner_id.eq(user.get())),
        SearchScope::Visible(user) => statement.filter(
            manuals::is_public
                .eq(true)
                .or(manuals::owner_id.eq(user.get())),
        ),
    };
    if let Some(term) = query.normalised_term() {
        let pattern = like_pattern(&term);
        statement = statement.filter(
            manuals::title
                .ilike(pattern.clone())
                .or(manuals::description.ilike(pattern)),
        );
    }
    if let Some(category) = &query.category {
        statement = statement.filter(manuals::category.eq(category.clone()));
    }
    if let Some(visibility) = query.visibility {
        statement = statement.filter(manuals::is_public.eq(visibility.is_public()));
    }
    statement
}

/// `manuals.title` under the byte-wise collation.
fn title_bytewise() -> SqlLiteral<Text> {
    sql::<Text>(r#""manuals"."title" COLLATE "C""#)
}

fn ordered(
    statement: manuals::BoxedQuery<'static, Pg>,
    query: &ManualSearch,
) -> manuals::BoxedQuery<'static, Pg> {
    let statement = match (query.sort_by, query.sort_order) {
        (SortField::Title, SortOrder::Asc) => statement.order_by(title_bytewise().asc()),
        (SortField::Title, SortOrder::Desc) => statement.order_by(title_bytewise().desc()),
        (SortField::CreatedAt, SortOrder::Asc) => statement.order_by(manuals::created_at.asc()),
        (SortField::CreatedAt, SortOrder::Desc) => statement.order_by(manuals::created_at.desc()),
        (SortField::UpdatedAt, SortOrder::Asc) => statement.order_by(manuals::updated_at.asc()),
        (SortField::UpdatedAt, SortOrder::Desc) => statement.order_by(manuals::updated_at.desc()),
    };
    statement.then_order_by(manuals::id.asc())
}

#[async_trait]
impl ManualRepository for DieselManualRepository {
    async fn create(&self, manual: &NewManual) -> Result<Manual, ManualRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewManualRow {
            owner_id: manual.owner_id.get(),
            title: &manual.title,
            description: manual.description.as_deref(),
            category: manual.category.as_deref(),
            is_public: manual.visibility == Visibility::Public,
            created_at: manual.created_at,
            updated_at: manual.created_at,
        };
        let inserted: ManualRow = diesel::insert_into(manuals::table)
            .values(&row)
            .returning(ManualRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        inserted.into_manual().map_err(ManualRepositoryError::query)
    }

    async fn find_by_id(&self, id: ManualId) -> Result<Option<Manual>, ManualRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<ManualRow> = manuals::table
            .find(id.get())
            .select(ManualRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(ManualRow::into_manual)
            .transpose()
            .map_err(ManualRepositoryError::query)
    }

    async fn update(&self, manual: &Manual) -> Result<(), ManualRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let changes = ManualUpdate {
            title: &manual.title,
            description: manual.description.as_deref(),
            category: manual.category.as_deref(),
            is_public: manual.visibility.is_public(),
            updated_at: manual.updated_at,
        };
        let updated = diesel::update(manuals::table.find(manual.id.get()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(ManualRepositoryError::not_found(manual.id.get()));
        }
        Ok(())
    }

    async fn delete_cascade(&self, id: ManualId) -> Result<Vec<Image>, ManualRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let manual_id = id.get();
        // Lock the manual so no step or image can be added while the
        // cascade runs.
        let removed: Option<Vec<ImageRow>> = conn
            .transaction(|conn| {
                async move {
                    let locked: Option<i64> = manuals::table
                        .find(manual_id)
                        .select(manuals::id)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    if locked.is_none() {
                        return Ok(None);
                    }
                    let doomed: Vec<ImageRow> = images::table
                        .inner_join(steps::table)
                        .filter(steps::manual_id.eq(manual_id))
                        .select(ImageRow::as_select())
                        .order_by(images::id)
                        .load(conn)
                        .await?;
                    diesel::delete(manuals::table.find(manual_id))
                        .execute(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>(Some(doomed))
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error)?;
        let rows = removed.ok_or_else(|| ManualRepositoryError::not_found(manual_id))?;
        collect_rows(rows, ImageRow::into_image).map_err(ManualRepositoryError::query)
    }

    async fn search(
        &self,
        query: &ManualSearch,
        scope: &SearchScope,
    ) -> Result<Page<Manual>, ManualRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let limit = i64::from(query.page.limit());
        let offset = i64::try_from(query.page.offset())
            .map_err(|_| ManualRepositoryError::query("page offset exceeds supported range"))?;

        let total: i64 = filtered(query, scope)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        let rows: Vec<ManualRow> = ordered(filtered(query, scope), query)
            .select(ManualRow::as_select())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        let items =
            collect_rows(rows, ManualRow::into_manual).map_err(ManualRepositoryError::query)?;
        let total = u64::try_from(total).unwrap_or_default();
        Ok(Page::new(items, total, query.page))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("onboard", "%onboard%")]
    #[case("100%", "%100\\%%")]
    #[case("snake_case", "%snake\\_case%")]
    #[case("back\\slash", "%back\\\\slash%")]
    fn like_patterns_escape_metacharacters(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(term), expected);
    }

    #[rstest]
    fn search_statement_binds_every_filter() {
        let query = ManualSearch {
            search: Some("Guide".to_owned()),
            category: Some("hr".to_owned()),
            visibility: Some(Visibility::Public),
            ..ManualSearch::default()
        };
        let scope = SearchScope::Visible(crate::domain::UserId::new(4).expect("id"));
        let sql = diesel::debug_query::<Pg, _>(&ordered(filtered(&query, &scope), &query))
            .to_string();
        assert!(sql.contains("ILIKE"), "{sql}");
        assert!(sql.contains("\"manuals\".\"category\" ="), "{sql}");
        assert!(sql.contains("ORDER BY \"manuals\".\"updated_at\" DESC, \"manuals\".\"id\" ASC"), "{sql}");
    }

    #[rstest]
    #[case(SortOrder::Asc, "ASC")]
    #[case(SortOrder::Desc, "DESC")]
    fn title_sort_uses_the_c_collation(#[case] order: SortOrder, #[case] keyword: &str) {
        let query = ManualSearch {
            sort_by: SortField::Title,
            sort_order: order,
            ..ManualSearch::default()
        };
        let sql = diesel::debug_query::<Pg, _>(&ordered(filtered(&query, &SearchScope::Public), &query))
            .to_string();
        let expected = format!(r#"ORDER BY "manuals"."title" COLLATE "C" {keyword}, "manuals"."id" ASC"#);
        assert!(sql.contains(&expected), "{sql}");
    }
}
