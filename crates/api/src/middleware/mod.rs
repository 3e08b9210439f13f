//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the user behind a required Bearer token.
//! - [`auth::MaybeAuthUser`] -- same, but anonymous requests are allowed.
//! - [`rbac::RequireSuperuser`] -- requires the `superuser` role.

pub mod auth;
pub mod rbac;
