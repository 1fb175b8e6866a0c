//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or a connection inside an open transaction) as the
//! first argument.

pub mod actor_repo;
pub mod import_repo;
pub mod rating_repo;
pub mod role_repo;
pub mod run_repo;
pub mod tag_repo;
pub mod theater_repo;
pub mod troupe_repo;
pub mod user_repo;
pub mod viewing_log_repo;
pub mod work_repo;

mod slugs;

pub use actor_repo::ActorRepo;
pub use import_repo::ImportRepo;
pub use rating_repo::RatingRepo;
pub use role_repo::RoleRepo;
pub use run_repo::RunRepo;
pub use tag_repo::TagRepo;
pub use theater_repo::TheaterRepo;
pub use troupe_repo::TroupeRepo;
pub use user_repo::UserRepo;
pub use viewing_log_repo::ViewingLogRepo;
pub use work_repo::WorkRepo;

/// Whether `err` is a unique violation of the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation() && db.constraint() == Some(constraint))
}
