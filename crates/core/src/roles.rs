//! Role names seeded by the accounts migration.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
