//! Well-known role name constants carried in bearer token claims.

pub const ROLE_SUPERUSER: &str = "superuser";
pub const ROLE_USER: &str = "user";
