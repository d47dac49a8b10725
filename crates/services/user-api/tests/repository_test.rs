//! Repository tests against a live PostgreSQL.
//!
//! To run them:
//! 1. Start PostgreSQL and export DATABASE_URL
//! 2. Run: cargo test -p user-api --test repository_test -- --ignored
//!
//! The schema in `sql/schema.sql` is applied before each test.

use sea_orm::{ConnectionTrait, Database as SeaDatabase};
use uuid::Uuid;

use common::AppError;
use domain::{NewUser, Password, UserChanges};
use user_api_lib::infra::Database;
use user_api_lib::repository::{UserRepository, UserStore};

async fn connect() -> UserStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = SeaDatabase::connect(&url).await.unwrap();
    db.execute_unprepared(include_str!("../sql/schema.sql"))
        .await
        .unwrap();

    let database = Database::from_connection(db);
    database.ping().await.unwrap();
    UserStore::new(database.connection())
}

fn unique_email(tag: &str) -> String {
    format!("{}-{}@example.com", tag, Uuid::new_v4())
}

fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
    }
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_create_then_fetch_round_trip() {
    let store = connect().await;
    let email = unique_email("roundtrip");
    let hash = Password::new("secret").unwrap().into_string();

    let created = store
        .create(new_user("Round Trip", &email), hash.clone())
        .await
        .unwrap();
    let fetched = store
        .find_by_id(&created.id.to_string())
        .await
        .unwrap()
        .expect("created user should be readable");

    assert_eq!(fetched.name, "Round Trip");
    assert_eq!(fetched.email, email);
    assert_eq!(fetched.password_hash, hash);
    assert_eq!(fetched.created_at, created.created_at);
    assert!(fetched.verify_password("secret"));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_find_missing_is_none() {
    let store = connect().await;
    let result = store.find_by_id(&Uuid::new_v4().to_string()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_malformed_id_is_rejected() {
    let store = connect().await;

    assert!(matches!(
        store.find_by_id("not-a-uuid").await,
        Err(AppError::InvalidId(_))
    ));
    assert!(matches!(
        store.delete("not-a-uuid").await,
        Err(AppError::InvalidId(_))
    ));
    assert!(matches!(
        store
            .update("not-a-uuid", UserChanges::default(), None)
            .await,
        Err(AppError::InvalidId(_))
    ));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_list_is_ordered_by_name() {
    let store = connect().await;
    let tag = Uuid::new_v4().to_string();

    for name in ["Charlie", "Alice", "Bob"] {
        store
            .create(new_user(&format!("{} {}", name, tag), &unique_email(name)), "h".into())
            .await
            .unwrap();
    }

    let names: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .filter(|name| name.ends_with(&tag))
        .collect();

    assert_eq!(
        names,
        vec![
            format!("Alice {}", tag),
            format!("Bob {}", tag),
            format!("Charlie {}", tag),
        ]
    );
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_update_overlays_supplied_fields() {
    let store = connect().await;
    let email = unique_email("update");
    let created = store
        .create(new_user("Before", &email), "old-hash".into())
        .await
        .unwrap();

    let changes = UserChanges {
        name: Some("After".to_string()),
        email: Some(String::new()),
    };
    let updated = store
        .update(&created.id.to_string(), changes, Some("new-hash".into()))
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "After");
    assert_eq!(updated.email, email);
    assert_eq!(updated.password_hash, "new-hash");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_update_missing_is_not_found() {
    let store = connect().await;
    let changes = UserChanges {
        name: Some("Nobody".to_string()),
        email: None,
    };

    let result = store
        .update(&Uuid::new_v4().to_string(), changes, None)
        .await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_delete_then_fetch_is_none() {
    let store = connect().await;
    let created = store
        .create(new_user("Doomed", &unique_email("delete")), "h".into())
        .await
        .unwrap();
    let id = created.id.to_string();

    store.delete(&id).await.unwrap();

    assert!(store.find_by_id(&id).await.unwrap().is_none());
    assert!(matches!(store.delete(&id).await, Err(AppError::NotFound)));
}
