//! Query filter validation for overlay reads.

use crate::error::CoreError;
use crate::types::DbId;

/// Accept at most one of two mutually exclusive filters.
pub fn exclusive<'a>(
    first: (&'a str, Option<DbId>),
    second: (&'a str, Option<DbId>),
) -> Result<Option<(&'a str, DbId)>, CoreError> {
    match (first, second) {
        ((a, Some(_)), (b, Some(_))) => Err(CoreError::BadRequest(format!(
            "Please, choose either {a} or {b}"
        ))),
        ((name, Some(id)), _) | (_, (name, Some(id))) => Ok(Some((name, id))),
        _ => Ok(None),
    }
}
