//! User repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{parse_user_id, NewUser, User, UserChanges};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Identifiers arrive as text and are parsed here; a malformed id fails with
/// `AppError::InvalidId` before any statement is issued.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user with a fresh id and return the stored row
    async fn create(&self, new_user: NewUser, password_hash: String) -> AppResult<User>;

    /// Find user by ID. `None` when no row matches.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    /// List all users ordered by name
    async fn list(&self) -> AppResult<Vec<User>>;

    /// Overlay the supplied fields onto the stored row and return the result.
    /// Fails with `AppError::NotFound` when no row matches.
    async fn update(
        &self,
        id: &str,
        changes: UserChanges,
        password_hash: Option<String>,
    ) -> AppResult<User>;

    /// Hard delete. Fails with `AppError::NotFound` when no row was removed.
    async fn delete(&self, id: &str) -> AppResult<()>;
}

/// Column values written by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Overlay non-empty changes onto the current row.
///
/// Empty strings count as "not supplied", so a name or email can never be
/// cleared.
pub fn merge_changes(
    current: &user::Model,
    changes: UserChanges,
    password_hash: Option<String>,
) -> MergedRow {
    fn pick(new: Option<String>, old: &str) -> String {
        match new {
            Some(value) if !value.is_empty() => value,
            _ => old.to_string(),
        }
    }

    MergedRow {
        name: pick(changes.name, &current.name),
        email: pick(changes.email, &current.email),
        password_hash: pick(password_hash, &current.password_hash),
    }
}

/// SeaORM-backed implementation of UserRepository
pub struct UserStore {
    db: Arc<DatabaseConnection>,
}

impl UserStore {
    /// Create new repository instance over a shared pool
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> AppResult<Option<user::Model>> {
        let model = UserEntity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(model)
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn create(&self, new_user: NewUser, password_hash: String) -> AppResult<User> {
        let id = Uuid::new_v4();
        let active_model = ActiveModel {
            id: Set(id),
            name: Set(new_user.name),
            email: Set(new_user.email),
            password_hash: Set(password_hash),
            ..Default::default()
        };

        UserEntity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        // Re-read so the timestamps come from storage
        let model = self.fetch(id).await?.ok_or_else(|| {
            AppError::internal(format!("inserted user {} could not be read back", id))
        })?;

        tracing::debug!(user_id = %id, "Inserted user row");
        Ok(User::from(model))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let id = parse_user_id(id)?;
        Ok(self.fetch(id).await?.map(User::from))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn update(
        &self,
        id: &str,
        changes: UserChanges,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        let id = parse_user_id(id)?;
        let current = self.fetch(id).await?.ok_or(AppError::NotFound)?;
        let merged = merge_changes(&current, changes, password_hash);

        UserEntity::update_many()
            .col_expr(user::Column::Name, Expr::value(merged.name))
            .col_expr(user::Column::Email, Expr::value(merged.email))
            .col_expr(user::Column::PasswordHash, Expr::value(merged.password_hash))
            .col_expr(user::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        // A concurrent delete between the write and this read surfaces as not found
        let model = self.fetch(id).await?.ok_or(AppError::NotFound)?;

        tracing::debug!(user_id = %id, "Updated user row");
        Ok(User::from(model))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let id = parse_user_id(id)?;
        let result = UserEntity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        tracing::debug!(user_id = %id, "Deleted user row");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn current_row() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            name: "Old Name".to_string(),
            email: "old@example.com".to_string(),
            password_hash: "$argon2id$old".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_merge_keeps_unsupplied_fields() {
        let current = current_row();
        let merged = merge_changes(&current, UserChanges::default(), None);

        assert_eq!(merged.name, "Old Name");
        assert_eq!(merged.email, "old@example.com");
        assert_eq!(merged.password_hash, "$argon2id$old");
    }

    #[test]
    fn test_merge_overlays_supplied_fields() {
        let current = current_row();
        let changes = UserChanges {
            name: Some("New Name".to_string()),
            email: None,
        };
        let merged = merge_changes(&current, changes, Some("$argon2id$new".to_string()));

        assert_eq!(merged.name, "New Name");
        assert_eq!(merged.email, "old@example.com");
        assert_eq!(merged.password_hash, "$argon2id$new");
    }

    #[test]
    fn test_merge_treats_empty_strings_as_unsupplied() {
        let current = current_row();
        let changes = UserChanges {
            name: Some(String::new()),
            email: Some(String::new()),
        };
        let merged = merge_changes(&current, changes, Some(String::new()));

        assert_eq!(merged.name, "Old Name");
        assert_eq!(merged.email, "old@example.com");
        assert_eq!(merged.password_hash, "$argon2id$old");
    }

    #[test]
    fn test_model_into_domain_user() {
        let row = current_row();
        let id = row.id;
        let user = User::from(row);

        assert_eq!(user.id, id);
        assert_eq!(user.password_hash, "$argon2id$old");
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn mock_store(mock: MockDatabase) -> (UserStore, Arc<DatabaseConnection>) {
        let db = Arc::new(mock.into_connection());
        (UserStore::new(Arc::clone(&db)), db)
    }

    /// SQL text of every statement the store issued, in order.
    fn issued_sql(store: UserStore, db: Arc<DatabaseConnection>) -> Vec<String> {
        drop(store);
        let db = match Arc::try_unwrap(db) {
            Ok(db) => db,
            Err(_) => panic!("connection still shared"),
        };
        db.into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_returns_row_read_back_from_storage() {
        let stored = current_row();
        let (store, db) = mock_store(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .append_query_results([vec![stored.clone()]]),
        );

        let new_user = NewUser {
            name: stored.name.clone(),
            email: stored.email.clone(),
        };
        let user = store
            .create(new_user, stored.password_hash.clone())
            .await
            .unwrap();

        assert_eq!(user, User::from(stored));

        let sql = issued_sql(store, db);
        assert_eq!(sql.len(), 2);
        assert!(sql[0].starts_with(r#"INSERT INTO "users""#));
        assert!(sql[1].starts_with("SELECT"));
    }

    #[tokio::test]
    async fn test_find_by_id_without_row_is_none() {
        let (store, _db) = mock_store(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let found = store.find_by_id(&Uuid::new_v4().to_string()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_malformed_id_issues_no_statement() {
        let (store, db) = mock_store(MockDatabase::new(DatabaseBackend::Postgres));

        assert!(matches!(
            store.find_by_id("not-a-uuid").await,
            Err(AppError::InvalidId(_))
        ));
        assert!(matches!(
            store.delete("").await,
            Err(AppError::InvalidId(_))
        ));
        assert!(issued_sql(store, db).is_empty());
    }

    #[tokio::test]
    async fn test_list_empty_table_is_empty_vec() {
        let (store, _db) = mock_store(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        assert_eq!(store.list().await.unwrap(), Vec::<User>::new());
    }

    #[tokio::test]
    async fn test_list_orders_by_name() {
        let (store, db) = mock_store(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![current_row()]]),
        );

        assert_eq!(store.list().await.unwrap().len(), 1);

        let sql = issued_sql(store, db);
        assert!(sql[0].ends_with(r#"ORDER BY "users"."name" ASC"#));
    }

    #[tokio::test]
    async fn test_update_overlays_and_refreshes_timestamp() {
        let current = current_row();
        let updated = user::Model {
            name: "New Name".to_string(),
            updated_at: current.updated_at + Duration::seconds(5),
            ..current.clone()
        };
        let (store, db) = mock_store(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![current.clone()], vec![updated.clone()]])
                .append_exec_results([exec(1)]),
        );

        let changes = UserChanges {
            name: Some("New Name".to_string()),
            email: None,
        };
        let user = store
            .update(&current.id.to_string(), changes, None)
            .await
            .unwrap();

        assert_eq!(user, User::from(updated));

        let sql = issued_sql(store, db);
        assert_eq!(sql.len(), 3);
        assert!(sql[1].starts_with(r#"UPDATE "users" SET"#));
        assert!(sql[1].contains(r#""updated_at" = CURRENT_TIMESTAMP"#));
        assert!(sql[2].starts_with("SELECT"));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let (store, db) = mock_store(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let changes = UserChanges {
            name: Some("Nobody".to_string()),
            email: None,
        };
        let result = store
            .update(&Uuid::new_v4().to_string(), changes, None)
            .await;

        assert!(matches!(result, Err(AppError::NotFound)));
        // Only the lookup ran; nothing was written
        assert_eq!(issued_sql(store, db).len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let (store, _db) = mock_store(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(1)]),
        );

        assert!(store.delete(&Uuid::new_v4().to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_without_affected_row_is_not_found() {
        let (store, _db) = mock_store(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(0)]),
        );

        let result = store.delete(&Uuid::new_v4().to_string()).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_database_error() {
        let (store, _db) = mock_store(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([sea_orm::DbErr::Custom("gone".to_string())]),
        );

        assert!(matches!(store.list().await, Err(AppError::Database(_))));
    }
}
