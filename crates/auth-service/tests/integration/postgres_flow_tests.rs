//! End-to-end flow against PostgreSQL

use auth_test_utils::{TestAuthServer, TokenAssertions, TEST_JWT_SECRET};
use reqwest::StatusCode;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_register_login_flow_with_postgres(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn_with_pool(pool.clone()).await?;

    let user = server.register("a@x.com", "longenough1", "A").await?;
    let duplicate = server.post_register("a@x.com", "longenough1", "A").await?;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let token = server.login_token("a@x.com", "longenough1").await?;
    token
        .assert_valid_jwt()
        .assert_for_subject(&user.id.to_string())
        .assert_verifies_with(TEST_JWT_SECRET);

    let wrong = server.post_login("a@x.com", "wrong").await?;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let (hash,): (String,) = sqlx::query_as("SELECT password_hash FROM users WHERE email = $1")
        .bind("a@x.com")
        .fetch_one(&pool)
        .await?;
    assert!(hash.starts_with("$2b$12$"));

    Ok(())
}
