//! Access rules consulted by every mutating use case.
//!
//! | resource              | read   | create | update / delete            |
//! |-----------------------|--------|--------|----------------------------|
//! | category/genre/title  | anyone | admin  | admin                      |
//! | review/comment        | anyone | user+  | author, moderator, admin   |
//! | users (admin API)     | admin  | admin  | admin                      |
//! | users/me              | user+  | -      | user+ (role is read-only)  |

use yamdb_auth_types::identity::Caller;

use crate::error::ApiError;

pub fn require_admin(caller: &Caller) -> Result<(), ApiError> {
    if caller.tier().is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Returns the caller's user id.
pub fn require_account(caller: &Caller) -> Result<i32, ApiError> {
    caller.user_id().ok_or(ApiError::Forbidden)
}

/// Authors may change their own feedback; moderators and admins anyone's.
pub fn require_author_or_staff(caller: &Caller, author_id: i32) -> Result<(), ApiError> {
    if caller.tier().is_staff() || caller.user_id() == Some(author_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
