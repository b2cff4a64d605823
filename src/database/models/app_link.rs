use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A `user_to_app_to_role` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AppLink {
    pub id: i64,
    pub user_id: i64,
    pub app_id: i64,
    pub role_id: i64,
}

/// Link entry written into `user_to_app_to_role_by_user_id` on an admin payload.
/// `user_id` is unknown while the admin itself is still being created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub app_id: i64,
    pub role_id: i64,
}

impl From<AppLink> for LinkRequest {
    fn from(link: AppLink) -> Self {
        Self {
            id: Some(link.id),
            user_id: Some(link.user_id),
            app_id: link.app_id,
            role_id: link.role_id,
        }
    }
}
