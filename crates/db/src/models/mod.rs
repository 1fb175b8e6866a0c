//! Row models and request/response DTOs.
//!
//! Row structs derive `FromRow`; write DTOs derive `Deserialize` and
//! `Validate`; enriched read shapes are plain `Serialize` structs built by
//! the repositories.

pub mod actor;
pub mod patch;
pub mod role;
pub mod run;
pub mod tag;
pub mod theater;
pub mod troupe;
pub mod user;
pub mod validators;
pub mod viewing_log;
pub mod work;
pub mod work_rating;
