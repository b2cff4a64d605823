use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::compliance::catalogue::AccessTemplate;
use crate::types::{RequestorMask, VerbMask};

pub const DEFAULT_FILTER_OP: &str = "AND";

/// One service access granted to a role (a `role_service_access` row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AclEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub role_id: Option<i64>,
    pub service_id: i64,
    pub component: String,
    pub verb_mask: VerbMask,
    pub requestor_mask: RequestorMask,
    pub filters: Value,
    pub filter_op: String,
}

/// Identity of a grant for reconciliation; filters are not part of it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AclKey {
    pub component: String,
    pub service_id: i64,
    pub verb_mask: VerbMask,
    pub requestor_mask: RequestorMask,
}

impl AclEntry {
    /// Unsaved entry for a catalogue template whose service is already resolved
    pub fn from_template(template: &AccessTemplate, service_id: i64) -> Self {
        Self {
            id: None,
            role_id: None,
            service_id,
            component: template.component.to_string(),
            verb_mask: template.verb_mask,
            requestor_mask: RequestorMask::ALL,
            filters: json!([]),
            filter_op: DEFAULT_FILTER_OP.to_string(),
        }
    }

    pub fn key(&self) -> AclKey {
        AclKey {
            component: self.component.clone(),
            service_id: self.service_id,
            verb_mask: self.verb_mask,
            requestor_mask: self.requestor_mask,
        }
    }

    pub fn same_grant(&self, other: &AclEntry) -> bool {
        self.component == other.component
            && self.service_id == other.service_id
            && self.verb_mask == other.verb_mask
            && self.requestor_mask == other.requestor_mask
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::catalogue::tab_access;

    #[test]
    fn same_grant_ignores_filters_and_identity() {
        let template = tab_access("roles").unwrap().access[0];
        let fresh = AclEntry::from_template(&template, 1);

        let mut stored = fresh.clone();
        stored.id = Some(10);
        stored.role_id = Some(3);
        stored.filters = json!([{"name": "id", "operator": "=", "value": 1}]);
        stored.filter_op = "OR".to_string();

        assert!(fresh.same_grant(&stored));
        assert_eq!(fresh.key(), stored.key());
    }

    #[test]
    fn same_grant_compares_service_and_mask() {
        let template = tab_access("roles").unwrap().access[0];
        let a = AclEntry::from_template(&template, 1);

        let mut other_service = a.clone();
        other_service.service_id = 2;
        assert!(!a.same_grant(&other_service));

        let mut other_mask = a.clone();
        other_mask.verb_mask = VerbMask::FULL;
        assert!(!a.same_grant(&other_mask));
    }

    #[test]
    fn generated_entries_use_all_requestors() {
        let template = tab_access("users").unwrap().access[0];
        let entry = AclEntry::from_template(&template, 7);
        assert_eq!(entry.requestor_mask, RequestorMask::ALL);
        assert_eq!(entry.filters, json!([]));
        assert_eq!(entry.filter_op, "AND");
        assert!(!entry.is_persisted());
    }
}
