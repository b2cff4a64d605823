use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::compliance::audit::ServiceAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ServiceReport {
    pub id: i64,
    pub service_name: String,
    pub user_email: String,
    pub action: Option<String>,
    pub request_verb: String,
    pub created_date: Option<DateTime<Utc>>,
    pub last_modified_date: DateTime<Utc>,
}

/// Report row to append
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServiceReport {
    pub service_name: String,
    pub user_email: String,
    pub action: ServiceAction,
    pub request_verb: String,
}
