// Turns tab selections into ACL entries and computes minimal diffs between selections.
//
// Entry identity is `AclEntry::key()`: component, service, verb mask and requestor mask.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::compliance::acl::{AclEntry, AclKey};
use crate::compliance::catalogue::{self, AccessTemplate, TabAccess, DEFAULT_TAB};
use crate::compliance::error::ComplianceError;
use crate::compliance::store::ServiceLookup;

/// Result of reconciling a role's entries against a new tab selection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AclChangeSet {
    /// Current entries left untouched
    pub kept: Vec<AclEntry>,
    /// New entries to insert
    pub added: Vec<AclEntry>,
    /// Persisted entries to detach from the role
    pub detached: Vec<AclEntry>,
}

impl AclChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.detached.is_empty()
    }
}

/// Resolves catalogue templates against the service registry.
///
/// Service ids are memoized for the lifetime of the reconciler, which is one request.
pub struct AclReconciler<'a> {
    services: &'a dyn ServiceLookup,
    service_ids: HashMap<&'static str, i64>,
}

impl<'a> AclReconciler<'a> {
    pub fn new(services: &'a dyn ServiceLookup) -> Self {
        Self { services, service_ids: HashMap::new() }
    }

    async fn service_id(&mut self, name: &'static str) -> Result<i64, ComplianceError> {
        if let Some(id) = self.service_ids.get(name) {
            return Ok(*id);
        }
        let id = self.services.id_by_name(name).await?;
        self.service_ids.insert(name, id);
        Ok(id)
    }

    async fn resolve(&mut self, template: &AccessTemplate) -> Result<AclEntry, ComplianceError> {
        let service_id = self.service_id(template.service_name()).await?;
        Ok(AclEntry::from_template(template, service_id))
    }

    /// Concrete entries for `tabs` (after `default` when requested), first occurrence wins.
    /// Any unknown tab or unresolvable service fails the whole call.
    pub async fn materialize<S: AsRef<str>>(
        &mut self,
        tabs: &[S],
        include_default: bool,
    ) -> Result<Vec<AclEntry>, ComplianceError> {
        catalogue::validate_tabs(tabs)?;

        let mut selected: Vec<&'static TabAccess> = Vec::with_capacity(tabs.len() + 1);
        if include_default {
            selected.extend(catalogue::tab_access(DEFAULT_TAB));
        }
        for tab in tabs {
            selected.extend(catalogue::tab_access(tab.as_ref()));
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for tab in selected {
            for template in tab.access {
                let entry = self.resolve(template).await?;
                if seen.insert(entry.key()) {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }

    /// Selectable tabs whose every template is present among `entries`, in catalogue order.
    /// A template whose service no longer exists cannot be granted.
    pub async fn granted_tabs(&mut self, entries: &[AclEntry]) -> Result<Vec<&'static str>, ComplianceError> {
        let held: HashSet<AclKey> = entries.iter().map(AclEntry::key).collect();
        let mut granted = Vec::new();

        'tabs: for tab in catalogue::tab_access_map(false) {
            for template in tab.access {
                let entry = match self.resolve(template).await {
                    Ok(entry) => entry,
                    Err(err) if err.is_not_found() => continue 'tabs,
                    Err(err) => return Err(err),
                };
                if !held.contains(&entry.key()) {
                    continue 'tabs;
                }
            }
            granted.push(tab.tab);
        }
        Ok(granted)
    }

    /// Minimal change taking `current` to the grants `desired` needs.
    ///
    /// Only entries of tabs being removed are candidates for removal, and a candidate survives
    /// while any remaining tab (or `default`) still needs it.
    pub async fn reconcile<S: AsRef<str>>(
        &mut self,
        current: Vec<AclEntry>,
        desired: &[S],
    ) -> Result<AclChangeSet, ComplianceError> {
        catalogue::validate_tabs(desired)?;

        let current_tabs: BTreeSet<&str> = self.granted_tabs(&current).await?.into_iter().collect();
        let desired_tabs: BTreeSet<&str> = desired.iter().map(|tab| tab.as_ref()).collect();

        let to_add: Vec<&str> = desired_tabs.difference(&current_tabs).copied().collect();
        let to_delete: Vec<&str> = current_tabs.difference(&desired_tabs).copied().collect();
        debug!("Reconcile: add {:?}, remove {:?}", to_add, to_delete);

        // Resolve everything before deciding anything
        let desired_list: Vec<&str> = desired_tabs.iter().copied().collect();
        let required: HashSet<AclKey> =
            self.materialize(&desired_list, true).await?.iter().map(AclEntry::key).collect();
        let removable: HashSet<AclKey> = self
            .materialize(&to_delete, false)
            .await?
            .iter()
            .map(AclEntry::key)
            .filter(|key| !required.contains(key))
            .collect();
        let additions = self.materialize(&to_add, false).await?;

        let mut changes = AclChangeSet::default();
        for entry in current {
            if removable.contains(&entry.key()) {
                if entry.is_persisted() {
                    changes.detached.push(entry);
                }
            } else {
                changes.kept.push(entry);
            }
        }

        let mut present: HashSet<AclKey> = changes.kept.iter().map(AclEntry::key).collect();
        for entry in additions {
            if present.insert(entry.key()) {
                changes.added.push(entry);
            }
        }

        Ok(changes)
    }
}
