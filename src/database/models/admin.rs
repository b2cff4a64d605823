use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Admin user as seen by the compliance layer (a `user` row with `is_sys_admin`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AdminRecord {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_sys_admin: bool,
    pub is_root_admin: bool,
    pub created_date: Option<DateTime<Utc>>,
}

impl AdminRecord {
    pub fn new(id: i64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
            first_name: None,
            last_name: None,
            is_active: true,
            is_sys_admin: true,
            is_root_admin: false,
            created_date: None,
        }
    }

    pub fn root(mut self) -> Self {
        self.is_root_admin = true;
        self
    }

    pub fn non_admin(mut self) -> Self {
        self.is_sys_admin = false;
        self
    }

    /// Name shown in admin listings, falling back to first/last name
    pub fn display_name(&self) -> String {
        match (&self.name, &self.first_name, &self.last_name) {
            (Some(name), _, _) if !name.is_empty() => name.clone(),
            (_, Some(first), Some(last)) => format!("{} {}", first, last),
            (_, Some(first), None) => first.clone(),
            _ => String::new(),
        }
    }
}
