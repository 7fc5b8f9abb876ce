//! Group membership authorization.
//!
//! Only a group's creator may remove other members. Any member may remove
//! themselves; the caller vouches that the acting user is that member.

use tally_shared::types::{GroupId, UserId};

use crate::error::{LedgerError, LedgerResult};
use crate::validation::positive_id;

/// Checks that `actor` may remove members from `group`.
///
/// # Errors
///
/// Returns `NotAuthorized` unless `actor` is the group's stored creator.
pub fn authorize_removal(group: GroupId, creator: UserId, actor: UserId) -> LedgerResult<()> {
    if creator != actor {
        return Err(LedgerError::NotAuthorized { actor, group });
    }
    Ok(())
}

/// Checks the ids of a membership operation.
///
/// # Errors
///
/// Returns `InvalidArgument` for a non-positive group or user id.
pub fn validate_pair(group: GroupId, user: UserId) -> LedgerResult<()> {
    positive_id("group_id", group.get())?;
    positive_id("user_id", user.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_may_remove() {
        assert!(authorize_removal(GroupId::new(1), UserId::new(5), UserId::new(5)).is_ok());
    }

    #[test]
    fn test_other_user_not_authorized() {
        let err = authorize_removal(GroupId::new(1), UserId::new(5), UserId::new(6)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NotAuthorized { actor, group }
                if actor == UserId::new(6) && group == GroupId::new(1)
        ));
        assert_eq!(err.http_status_code(), 403);
    }

    #[test]
    fn test_validate_pair() {
        assert!(validate_pair(GroupId::new(1), UserId::new(1)).is_ok());
        assert!(validate_pair(GroupId::new(0), UserId::new(1)).is_err());
        assert!(validate_pair(GroupId::new(1), UserId::new(-2)).is_err());
    }
}
