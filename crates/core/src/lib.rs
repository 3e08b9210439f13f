//! Pure domain logic for the urban scenario platform.
//!
//! Nothing in this crate performs I/O. Repositories in `urban_db` fetch rows,
//! the functions here decide what those rows mean for a scenario.

pub mod access;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod overlay;
pub mod roles;
pub mod scenario;
pub mod territory;
pub mod types;
