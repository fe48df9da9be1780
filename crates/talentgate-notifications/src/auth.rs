//! Authenticated identity supplied by the platform's auth middleware.
//!
//! The middleware itself is a boundary collaborator; handlers receive the
//! resolved identity as a request extension and scope every query and
//! mutation to it.

use uuid::Uuid;

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl AuthContext {
    #[must_use]
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            email: None,
        }
    }
}
