//! `PostgreSQL`-backed repository tests.
//!
//! These run against a real database and are ignored by default:
//!
//! ```bash
//! OAKWOOD_TEST_DATABASE_URL=postgres://localhost/oakwood_test \
//!     cargo test -p oakwood-storefront -- --ignored
//! ```

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use oakwood_core::{Email, Slug};
use oakwood_storefront::db::ProductRepository;
use oakwood_storefront::db::users::PgIdentityStore;
use oakwood_storefront::models::{NewIdentity, NewProduct};
use oakwood_storefront::services::accounts::IdentityStore;

async fn test_pool() -> PgPool {
    let url = std::env::var("OAKWOOD_TEST_DATABASE_URL")
        .expect("OAKWOOD_TEST_DATABASE_URL must be set for ignored tests");
    let pool = PgPool::connect(&url).await.expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

async fn create_test_product(pool: &PgPool) -> oakwood_storefront::models::Product {
    let (category_id,): (i32,) = sqlx::query_as("SELECT id FROM categories ORDER BY id LIMIT 1")
        .fetch_one(pool)
        .await
        .expect("seeded category");

    ProductRepository::new(pool)
        .create(NewProduct {
            name: format!("Test chair {}", Uuid::new_v4()),
            slug: Slug::from_title("test chair"),
            description: "Solid oak chair".to_owned(),
            photo: None,
            category_id: category_id.into(),
            price: Decimal::new(14900, 2),
            manufactured_at: None,
        })
        .await
        .expect("create product")
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set OAKWOOD_TEST_DATABASE_URL)"]
async fn sequential_views_count_up_by_one() {
    let pool = test_pool().await;
    let product = create_test_product(&pool).await;
    let repo = ProductRepository::new(&pool);

    let base = product.views_count;
    for i in 1..=5 {
        let views = repo.record_view(product.id).await.expect("record view");
        assert_eq!(views, base + i);
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set OAKWOOD_TEST_DATABASE_URL)"]
async fn concurrent_views_lose_no_updates() {
    const VIEWERS: i32 = 20;

    let pool = test_pool().await;
    let product = create_test_product(&pool).await;
    let base = product.views_count;

    let mut tasks = Vec::new();
    for _ in 0..VIEWERS {
        let pool = pool.clone();
        let id = product.id;
        tasks.push(tokio::spawn(async move {
            ProductRepository::new(&pool)
                .record_view(id)
                .await
                .expect("record view")
        }));
    }
    for task in tasks {
        task.await.expect("task");
    }

    let stored = ProductRepository::new(&pool)
        .get(product.id)
        .await
        .expect("get product")
        .expect("product exists");
    assert_eq!(stored.views_count, base + VIEWERS);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set OAKWOOD_TEST_DATABASE_URL)"]
async fn identity_store_enforces_unique_email_and_consumes_token() {
    let pool = test_pool().await;
    let store = PgIdentityStore::new(pool);

    let email = Email::parse(&format!("user-{}@example.com", Uuid::new_v4())).expect("email");

    let identity = store
        .insert(NewIdentity {
            email: email.clone(),
            password_hash: "$argon2id$fake".to_owned(),
            verification_token: Uuid::new_v4().simple().to_string(),
            phone: None,
            country: None,
        })
        .await
        .expect("insert identity");
    assert!(!identity.is_active);

    // Second insert with the same email hits the unique constraint.
    let err = store
        .insert(NewIdentity {
            email: email.clone(),
            password_hash: "$argon2id$fake".to_owned(),
            verification_token: Uuid::new_v4().simple().to_string(),
            phone: None,
            country: None,
        })
        .await
        .expect_err("duplicate email must conflict");
    assert!(matches!(
        err,
        oakwood_storefront::db::RepositoryError::Conflict(_)
    ));

    // Activation flips the flag and clears the token in one statement.
    let token = identity.verification_token.clone().expect("token");
    let found = store
        .find_by_token(&token)
        .await
        .expect("lookup")
        .expect("token resolves");
    assert_eq!(found.id, identity.id);

    store.activate(identity.id).await.expect("activate");

    let activated = store
        .find_by_id(identity.id)
        .await
        .expect("lookup")
        .expect("record exists");
    assert!(activated.is_active);
    assert_eq!(activated.verification_token, None);
    assert!(
        store
            .find_by_token(&token)
            .await
            .expect("lookup")
            .is_none()
    );
}
