use sqlx::PgPool;

/// Connect, migrate, verify the seeded roles.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    hoshidori_db::health_check(&pool).await.unwrap();

    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM roles ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(names, vec!["admin", "user"]);
}

/// Every unique constraint follows the `uq_` naming used by the error layer.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unique_constraints_are_prefixed(pool: PgPool) {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT conname::text FROM pg_constraint \
         WHERE contype = 'u' AND connamespace = 'public'::regnamespace",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!names.is_empty());
    for name in names {
        assert!(name.starts_with("uq_"), "{name} should start with uq_");
    }
}
