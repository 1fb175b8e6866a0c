//! Integration tests for ratings, viewing logs and CSV import.

use chrono::{TimeZone, Utc};
use hoshidori_core::csv_import::{parse_rows, RunCsvRow, TheaterCsvRow, WorkCsvRow};
use hoshidori_core::work_status::WorkStatus;
use hoshidori_db::models::user::CreateUser;
use hoshidori_db::models::viewing_log::{LogListParams, NewViewingLog, UpdateViewingLog};
use hoshidori_db::models::work::NewWork;
use hoshidori_db::repositories::{
    ActorRepo, ImportRepo, RatingRepo, TagRepo, UserRepo, ViewingLogRepo, WorkRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, username: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: String::new(),
            password_hash: "not-a-real-hash".to_string(),
            role_id: 2,
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_work(pool: &PgPool, slug: &str) -> i64 {
    let input = NewWork {
        title: slug.to_uppercase(),
        slug: slug.to_string(),
        status: WorkStatus::Approved,
        ..Default::default()
    };
    WorkRepo::create(pool, &input, &[], &[]).await.unwrap().id
}

fn log(user_id: i64, work_id: i64, rating: Option<f64>) -> NewViewingLog {
    NewViewingLog {
        user_id,
        work_id,
        run_id: None,
        watched_at: Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap(),
        seat: String::new(),
        memo: String::new(),
        rating,
        tag_ids: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_average_absent_without_ratings(pool: PgPool) {
    let user = new_user(&pool, "fan").await;
    let work = new_work(&pool, "quiet").await;
    // A log without a rating does not count.
    ViewingLogRepo::create(&pool, &log(user, work, None)).await.unwrap();

    assert_eq!(RatingRepo::calculate_avg_rating(&pool, work).await.unwrap(), None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_average_combines_logs_and_standalone_ratings(pool: PgPool) {
    let user = new_user(&pool, "fan").await;
    let work = new_work(&pool, "rated").await;

    ViewingLogRepo::create(&pool, &log(user, work, Some(4.0))).await.unwrap();
    ViewingLogRepo::create(&pool, &log(user, work, Some(5.0))).await.unwrap();

    // (4.0 + 5.0 + 3.5) / 3 = 4.1666...
    let avg = RatingRepo::add_rating_entry(&pool, work, 3.5, None).await.unwrap();
    assert_eq!(avg, Some(4.2));

    let (rating, user_id): (f64, Option<i64>) =
        sqlx::query_as("SELECT rating::float8, user_id FROM work_ratings WHERE work_id = $1")
            .bind(work)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rating, 3.5);
    assert_eq!(user_id, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_batch_averages_cover_every_work(pool: PgPool) {
    let rated = new_work(&pool, "rated").await;
    let unrated = new_work(&pool, "unrated").await;
    RatingRepo::add_rating_entry(&pool, rated, 2.0, None).await.unwrap();

    let averages = RatingRepo::averages(&pool, &[rated, unrated]).await.unwrap();
    assert_eq!(averages.get(&rated), Some(&Some(2.0)));
    assert_eq!(averages.get(&unrated), Some(&None));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_out_of_range_rating_rejected_by_schema(pool: PgPool) {
    let work = new_work(&pool, "strict").await;
    let result = RatingRepo::add_rating_entry(&pool, work, 5.1, None).await;
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Viewing logs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logs_are_scoped_to_owner(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;
    let work = new_work(&pool, "shared").await;

    let mine = ViewingLogRepo::create(&pool, &log(alice, work, Some(4.5))).await.unwrap();
    ViewingLogRepo::create(&pool, &log(bob, work, None)).await.unwrap();

    let listed = ViewingLogRepo::list(&pool, alice, &LogListParams::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].rating, Some(4.5));

    assert!(ViewingLogRepo::find_own(&pool, mine.id, bob).await.unwrap().is_none());
    assert!(!ViewingLogRepo::delete(&pool, mine.id, bob).await.unwrap());
    assert!(ViewingLogRepo::delete(&pool, mine.id, alice).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_log_update_replaces_tags(pool: PgPool) {
    let user = new_user(&pool, "fan").await;
    let work = new_work(&pool, "tagged").await;
    let mut conn = pool.acquire().await.unwrap();
    let funny = TagRepo::create_or_get(&mut conn, "funny").await.unwrap();
    let moving = TagRepo::create_or_get(&mut conn, "moving").await.unwrap();
    drop(conn);

    let mut input = log(user, work, None);
    input.tag_ids = vec![funny.id];
    let created = ViewingLogRepo::create(&pool, &input).await.unwrap();

    let changes = UpdateViewingLog {
        seat: Some("A-12".to_string()),
        rating: Some(Some(3.0)),
        ..Default::default()
    };
    let updated = ViewingLogRepo::update(&pool, created.id, user, &changes, Some(&[moving.id]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.seat, "A-12");
    assert_eq!(updated.rating, Some(3.0));

    let tags = TagRepo::names_for_logs(&pool, &[created.id]).await.unwrap();
    assert_eq!(tags.get(&created.id), Some(&vec!["moving".to_string()]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_log_update_clears_rating_only_when_null(pool: PgPool) {
    let user = new_user(&pool, "fan").await;
    let work = new_work(&pool, "cleared").await;
    let created = ViewingLogRepo::create(&pool, &log(user, work, Some(4.0))).await.unwrap();

    let untouched = UpdateViewingLog {
        memo: Some("second look".to_string()),
        ..Default::default()
    };
    let updated = ViewingLogRepo::update(&pool, created.id, user, &untouched, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.rating, Some(4.0));

    let cleared = UpdateViewingLog {
        rating: Some(None),
        ..Default::default()
    };
    let updated = ViewingLogRepo::update(&pool, created.id, user, &cleared, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.rating, None);
    assert_eq!(updated.memo, "second look");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_watched_times_respect_window(pool: PgPool) {
    let user = new_user(&pool, "fan").await;
    let work = new_work(&pool, "matinee").await;
    for (day, hour) in [(1, 13), (1, 13), (1, 18), (2, 13)] {
        let mut input = log(user, work, None);
        input.watched_at = Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap();
        ViewingLogRepo::create(&pool, &input).await.unwrap();
    }

    let from = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
    let times = ViewingLogRepo::watched_times(&pool, work, from, to).await.unwrap();
    assert_eq!(times.len(), 3);
}

// ---------------------------------------------------------------------------
// CSV import
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_collapses_duplicate_actor_names(pool: PgPool) {
    let csv = "id,title,slug,troupe,main_theater,actors,status,tags\n\
               ,Hamlet,,Globe Players,Globe Theatre,\"A, B, B\",,\"drama\"\n";
    let rows = parse_rows::<WorkCsvRow>(csv.as_bytes()).unwrap();

    let summary = ImportRepo::import_works(&pool, rows).await.unwrap();
    assert_eq!(summary.created, 1);
    assert!(summary.errors.is_empty(), "{:?}", summary.errors);

    let actors = ActorRepo::list(&pool, &Default::default()).await.unwrap();
    let names: Vec<&str> = actors.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM work_actors")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(links, 2);

    let exported = ImportRepo::export_works(&pool).await.unwrap();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].actors.as_deref(), Some("A, B"));
    assert_eq!(exported[0].troupe.as_deref(), Some("Globe Players"));
    assert_eq!(exported[0].main_theater.as_deref(), Some("Globe Theatre"));
    assert_eq!(exported[0].status.as_deref(), Some("APPROVED"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_reports_bad_rows_and_continues(pool: PgPool) {
    let csv = "id,title,slug,troupe,main_theater,actors,status,tags\n\
               ,,,,,,,\n\
               ,Macbeth,,,,,BOGUS,\n\
               999,Ghost,,,,,,\n\
               ,Othello,,,,,PENDING,\n";
    let rows = parse_rows::<WorkCsvRow>(csv.as_bytes()).unwrap();

    let summary = ImportRepo::import_works(&pool, rows).await.unwrap();
    assert_eq!(summary.created, 1);
    let failed_rows: Vec<usize> = summary.errors.iter().map(|e| e.row).collect();
    assert_eq!(failed_rows, vec![2, 3, 4]);

    let statuses: Vec<String> = sqlx::query_scalar("SELECT status FROM works")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(statuses, vec!["PENDING"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_updates_by_id(pool: PgPool) {
    let csv = "id,name,slug,area,address,image_url,area_tags\n\
               ,Globe Theatre,,London,,,\"Southwark, riverside\"\n";
    let summary = ImportRepo::import_theaters(&pool, parse_rows::<TheaterCsvRow>(csv.as_bytes()).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.created, 1);

    let exported = ImportRepo::export_theaters(&pool).await.unwrap();
    let id = exported[0].id.unwrap();
    assert_eq!(exported[0].slug.as_deref(), Some("globe-theatre"));
    assert_eq!(exported[0].area_tags.as_deref(), Some("Southwark, riverside"));

    let csv = format!(
        "id,name,slug,area,address,image_url,area_tags\n{id},New Globe,,London,,,\n"
    );
    let summary = ImportRepo::import_theaters(&pool, parse_rows::<TheaterCsvRow>(csv.as_bytes()).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.updated, 1);

    let exported = ImportRepo::export_theaters(&pool).await.unwrap();
    assert_eq!(exported[0].name, "New Globe");
    assert_eq!(exported[0].slug.as_deref(), Some("globe-theatre"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_run_requires_existing_work(pool: PgPool) {
    let work = new_work(&pool, "touring").await;
    let csv = format!(
        "id,work,label,area,theater,start_date,end_date\n\
         ,{work},Osaka run,Osaka,,2024-06-01,2024-06-10\n\
         ,{missing},Nagoya run,,,,\n",
        missing = work + 1000,
    );
    let summary = ImportRepo::import_runs(&pool, parse_rows::<RunCsvRow>(csv.as_bytes()).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].row, 3);

    let exported = ImportRepo::export_runs(&pool).await.unwrap();
    assert_eq!(exported[0].label, "Osaka run");
    assert_eq!(exported[0].start_date, chrono::NaiveDate::from_ymd_opt(2024, 6, 1));
}
