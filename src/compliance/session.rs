use serde::{Deserialize, Serialize};

/// Authenticated admin behind the current request.
///
/// The host's auth layer resolves the session and inserts this into the request extensions;
/// `role_id` is set when the session is bound to a role (a restricted admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub is_sys_admin: bool,
    pub role_id: Option<i64>,
}

/// Who is making the current request
pub trait CurrentSession: Send + Sync {
    fn current_user(&self) -> Option<&SessionUser>;

    /// True when the session acts through a role rather than as a full admin
    fn has_role(&self) -> bool {
        self.current_user().map(|u| u.role_id.is_some()).unwrap_or(false)
    }

    fn user_email(&self) -> String {
        self.current_user().map(|u| u.email.clone()).unwrap_or_default()
    }
}

/// Session as captured from one request
#[derive(Debug, Clone, Default)]
pub struct RequestSession(pub Option<SessionUser>);

impl CurrentSession for RequestSession {
    fn current_user(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }
}
