//! Domain types, constants, and pure logic shared by the database and API
//! layers. Nothing in this crate performs I/O.

pub mod csv_import;
pub mod error;
pub mod rating;
pub mod roles;
pub mod schedule;
pub mod search;
pub mod slug;
pub mod types;
pub mod work_status;
