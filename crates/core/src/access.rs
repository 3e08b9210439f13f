//! Project access policy.
//!
//! Pure decision functions; the API guard loads the rows and calls these.

use crate::error::CoreError;
use crate::roles::ROLE_SUPERUSER;
use crate::types::DbId;

/// The caller of an operation. Anonymous callers may only read public projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: DbId,
    pub is_superuser: bool,
}

impl Requester {
    pub fn new(user_id: DbId, role: &str) -> Self {
        Self {
            user_id,
            is_superuser: role == ROLE_SUPERUSER,
        }
    }
}

/// The project fields the policy looks at.
#[derive(Debug, Clone, Copy)]
pub struct ProjectAccess {
    pub project_id: DbId,
    pub owner_id: DbId,
    pub is_public: bool,
    pub is_regional: bool,
}

/// Decide whether `requester` may read (or, with `to_edit`, modify) a project.
///
/// Editing needs ownership or superuser. Reading additionally allows anyone
/// when the project is public. `allow_regional = false` rejects regional
/// projects after the permission check.
pub fn check_project_access(
    project: &ProjectAccess,
    requester: Option<&Requester>,
    to_edit: bool,
    allow_regional: bool,
) -> Result<(), CoreError> {
    let privileged = requester
        .is_some_and(|r| r.is_superuser || r.user_id == project.owner_id);

    if to_edit && !privileged {
        return Err(CoreError::Forbidden(format!(
            "Not allowed to modify project {}",
            project.project_id
        )));
    }
    if !to_edit && !privileged && !project.is_public {
        return Err(CoreError::Forbidden(format!(
            "Not allowed to view project {}",
            project.project_id
        )));
    }
    if !allow_regional && project.is_regional {
        return Err(CoreError::BadRequest(format!(
            "Project {} cannot be accessed in a REGIONAL project",
            project.project_id
        )));
    }
    Ok(())
}

/// Promotion to base scenario is reserved to superusers.
pub fn require_superuser(requester: &Requester) -> Result<(), CoreError> {
    if requester.is_superuser {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Superuser role required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::ROLE_USER;
    use assert_matches::assert_matches;

    fn project(is_public: bool, is_regional: bool) -> ProjectAccess {
        ProjectAccess { project_id: 1, owner_id: 7, is_public, is_regional }
    }

    fn owner() -> Requester {
        Requester::new(7, ROLE_USER)
    }

    fn stranger() -> Requester {
        Requester::new(8, ROLE_USER)
    }

    fn admin() -> Requester {
        Requester::new(99, ROLE_SUPERUSER)
    }

    #[test]
    fn owner_can_read_and_edit_private_project() {
        let p = project(false, false);
        assert!(check_project_access(&p, Some(&owner()), false, true).is_ok());
        assert!(check_project_access(&p, Some(&owner()), true, true).is_ok());
    }

    #[test]
    fn stranger_reads_public_but_cannot_edit() {
        let p = project(true, false);
        assert!(check_project_access(&p, Some(&stranger()), false, true).is_ok());
        assert_matches!(
            check_project_access(&p, Some(&stranger()), true, true),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn private_project_is_hidden_from_strangers_and_anonymous() {
        let p = project(false, false);
        assert_matches!(
            check_project_access(&p, Some(&stranger()), false, true),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(check_project_access(&p, None, false, true), Err(CoreError::Forbidden(_)));
    }

    #[test]
    fn superuser_can_edit_anything() {
        assert!(check_project_access(&project(false, false), Some(&admin()), true, true).is_ok());
    }

    #[test]
    fn regional_rejected_when_not_allowed() {
        let p = project(true, true);
        assert_matches!(
            check_project_access(&p, Some(&owner()), false, false),
            Err(CoreError::BadRequest(msg)) if msg.contains("REGIONAL")
        );
    }

    #[test]
    fn permission_checked_before_kind() {
        let p = project(false, true);
        assert_matches!(
            check_project_access(&p, Some(&stranger()), true, false),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn superuser_gate() {
        assert!(require_superuser(&admin()).is_ok());
        assert_matches!(require_superuser(&owner()), Err(CoreError::Forbidden(_)));
    }
}
