// Permission catalogue: which service accesses each admin UI tab needs.
//
// The table is plain static data so it can be dumped (`df-compliance tabs`) and diffed on its
// own. Templates are resolved into concrete ACL entries by the reconciler.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::compliance::error::ComplianceError;
use crate::types::VerbMask;

/// Service every template targets unless it names another one
pub const SYSTEM_SERVICE_NAME: &str = "system";

/// Always-granted tab: base navigation plus the admin's own profile
pub const DEFAULT_TAB: &str = "default";

pub const API_DOCS_TAB: &str = "apidocs";
pub const FILES_TAB: &str = "files";

/// One service access a tab requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessTemplate {
    pub component: &'static str,
    pub verb_mask: VerbMask,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<&'static str>,
}

impl AccessTemplate {
    const fn system(component: &'static str, verb_mask: VerbMask) -> Self {
        Self { component, verb_mask, service_name: None }
    }

    const fn on(service_name: &'static str, component: &'static str, verb_mask: VerbMask) -> Self {
        Self { component, verb_mask, service_name: Some(service_name) }
    }

    pub fn service_name(&self) -> &'static str {
        self.service_name.unwrap_or(SYSTEM_SERVICE_NAME)
    }
}

/// A tab and the accesses it needs
#[derive(Debug, Serialize)]
pub struct TabAccess {
    pub tab: &'static str,
    pub access: &'static [AccessTemplate],
}

const FULL: VerbMask = VerbMask::FULL;
const GET: VerbMask = VerbMask::GET;
const GET_POST: VerbMask = VerbMask::GET.union(VerbMask::POST);

static TAB_ACCESS: &[TabAccess] = &[
    TabAccess {
        tab: "apps",
        access: &[
            AccessTemplate::system("app/*", FULL),
            AccessTemplate::system("service/*", GET),
            AccessTemplate::system("role/*", GET),
        ],
    },
    TabAccess {
        tab: "users",
        access: &[
            AccessTemplate::system("user/*", FULL),
            AccessTemplate::system("role/*", GET),
            AccessTemplate::system("app/*", GET),
        ],
    },
    TabAccess {
        tab: "roles",
        access: &[AccessTemplate::system("role/*", GET)],
    },
    TabAccess {
        tab: "services",
        access: &[
            AccessTemplate::system("service_type/", FULL),
            AccessTemplate::system("service/*", FULL),
        ],
    },
    TabAccess {
        tab: API_DOCS_TAB,
        access: &[AccessTemplate::on("api_docs", "*", FULL)],
    },
    TabAccess {
        tab: "schema/data",
        access: &[AccessTemplate::on("db", "*", FULL)],
    },
    TabAccess {
        tab: FILES_TAB,
        access: &[
            AccessTemplate::on("files", "*", FULL),
            AccessTemplate::on("logs", "*", FULL),
        ],
    },
    TabAccess {
        tab: "scripts",
        access: &[
            AccessTemplate::system("event/*", FULL),
            AccessTemplate::system("event_script/*", FULL),
            AccessTemplate::system("script_type/*", FULL),
        ],
    },
    TabAccess {
        tab: "config",
        access: &[
            AccessTemplate::system("custom/*", FULL),
            AccessTemplate::system("cache/*", FULL),
            AccessTemplate::system("cors/*", FULL),
            AccessTemplate::system("email_template/*", FULL),
            AccessTemplate::system("lookup/*", FULL),
            AccessTemplate::system("", GET),
            AccessTemplate::on("logs", "*", FULL),
            AccessTemplate::on("email", "*", FULL),
        ],
    },
    TabAccess {
        tab: "packages",
        access: &[
            AccessTemplate::system("package/*", FULL),
            AccessTemplate::system("app/*", GET),
            AccessTemplate::on("logs", "*", GET_POST),
            AccessTemplate::on("files", "*", GET_POST),
            AccessTemplate::on(SYSTEM_SERVICE_NAME, "*", GET),
        ],
    },
    TabAccess {
        tab: "limits",
        access: &[
            AccessTemplate::system("limit/*", FULL),
            AccessTemplate::system("limit_cache/*", FULL),
            AccessTemplate::system("user/", GET),
            AccessTemplate::system("role/", GET),
            AccessTemplate::system("", GET),
            AccessTemplate::system("service/", GET),
        ],
    },
    TabAccess {
        tab: "scheduler",
        access: &[
            AccessTemplate::system("scheduler/*", FULL),
            AccessTemplate::system("", GET),
        ],
    },
    TabAccess {
        tab: DEFAULT_TAB,
        access: &[
            AccessTemplate::system("role/*", GET),
            AccessTemplate::system("", GET),
            AccessTemplate::system("admin/*", GET),
            AccessTemplate::system("admin/profile", FULL),
            AccessTemplate::system("admin/password", FULL),
        ],
    },
];

/// The catalogue in declaration order, optionally without the default tab
pub fn tab_access_map(include_default: bool) -> Vec<&'static TabAccess> {
    TAB_ACCESS
        .iter()
        .filter(|entry| include_default || entry.tab != DEFAULT_TAB)
        .collect()
}

/// Look up one tab (the default tab included)
pub fn tab_access(tab: &str) -> Option<&'static TabAccess> {
    TAB_ACCESS.iter().find(|entry| entry.tab == tab)
}

/// Every selectable tab, in catalogue order
pub fn all_tabs() -> Vec<&'static str> {
    tab_access_map(false).into_iter().map(|entry| entry.tab).collect()
}

/// True when `tabs` selects every tab. Order and duplicates are ignored.
pub fn is_all_tabs<S: AsRef<str>>(tabs: &[S]) -> bool {
    let selected: BTreeSet<&str> = tabs.iter().map(|tab| tab.as_ref()).collect();
    let every: BTreeSet<&str> = all_tabs().into_iter().collect();
    selected == every
}

/// Reject tab names the catalogue does not know
pub fn validate_tabs<S: AsRef<str>>(tabs: &[S]) -> Result<(), ComplianceError> {
    for tab in tabs {
        let tab = tab.as_ref();
        if tab == DEFAULT_TAB || tab_access(tab).is_none() {
            return Err(ComplianceError::UnknownTab(tab.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_twelve_selectable_tabs() {
        assert_eq!(tab_access_map(true).len(), 13);
        assert_eq!(all_tabs().len(), 12);
        assert!(!all_tabs().contains(&DEFAULT_TAB));
    }

    #[test]
    fn all_tabs_is_order_insensitive() {
        let mut tabs: Vec<&str> = all_tabs();
        assert!(is_all_tabs(&tabs));

        tabs.reverse();
        assert!(is_all_tabs(&tabs));

        tabs.pop();
        assert!(!is_all_tabs(&tabs));
        assert!(!is_all_tabs(&["users"]));
        assert!(!is_all_tabs::<&str>(&[]));
    }

    #[test]
    fn all_tabs_rejects_default_in_selection() {
        let mut tabs = all_tabs();
        tabs.push(DEFAULT_TAB);
        assert!(!is_all_tabs(&tabs));
    }

    #[test]
    fn templates_default_to_system_service() {
        let users = tab_access("users").unwrap();
        assert!(users.access.iter().all(|t| t.service_name() == SYSTEM_SERVICE_NAME));

        let files = tab_access(FILES_TAB).unwrap();
        let services: Vec<&str> = files.access.iter().map(|t| t.service_name()).collect();
        assert_eq!(services, vec!["files", "logs"]);
    }

    #[test]
    fn validate_tabs_rejects_unknown_and_default() {
        assert!(validate_tabs(&["users", "config"]).is_ok());
        assert!(matches!(validate_tabs(&["bogus"]), Err(ComplianceError::UnknownTab(t)) if t == "bogus"));
        assert!(validate_tabs(&[DEFAULT_TAB]).is_err());
    }

    #[test]
    fn catalogue_serializes_as_data() {
        let value = serde_json::to_value(tab_access("packages").unwrap()).unwrap();
        assert_eq!(value["tab"], "packages");
        assert_eq!(value["access"][2]["verb_mask"], 3);
        assert_eq!(value["access"][2]["service_name"], "logs");
        assert!(value["access"][0].get("service_name").is_none());
    }
}
