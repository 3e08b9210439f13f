//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use urban_core::access::require_superuser;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `superuser` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn promote(RequireSuperuser(user): RequireSuperuser) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireSuperuser(pub AuthUser);

impl FromRequestParts<AppState> for RequireSuperuser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_superuser(&user.requester())?;
        Ok(RequireSuperuser(user))
    }
}
