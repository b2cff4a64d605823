use axum::http::Uri;

use crate::compliance::audit::value_as_id;

/// A platform API path: `/api/{version}/{service}/{resource...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoute {
    pub version: String,
    pub service: String,
    pub resource: Vec<String>,
}

impl ApiRoute {
    pub fn parse(path: &str) -> Option<Self> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        if segments.next()? != "api" {
            return None;
        }
        let version = segments.next()?.to_string();
        let service = segments.next()?.to_string();
        Some(Self {
            version,
            service,
            resource: segments.map(str::to_string).collect(),
        })
    }

    pub fn from_uri(uri: &Uri) -> Option<Self> {
        Self::parse(uri.path())
    }

    /// True when this is `{service}/{resource}` or anything below it
    pub fn targets(&self, service: &str, resource: &str) -> bool {
        self.service == service && self.resource.first().map(String::as_str) == Some(resource)
    }

    /// Second resource segment, e.g. the id in `system/role/12`
    pub fn resource_id(&self) -> Option<&str> {
        self.resource.get(1).map(String::as_str)
    }

    pub fn resource_path(&self) -> String {
        self.resource.join("/")
    }
}

/// First value of a query parameter
pub fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Numeric ids from a comma-separated `ids` parameter; anything unparsable is skipped
pub fn ids_param(uri: &Uri) -> Vec<i64> {
    query_param(uri, "ids")
        .map(|ids| {
            ids.split(',')
                .filter_map(|id| value_as_id(&serde_json::Value::String(id.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Ids a request addresses: the path id if present, else the `ids` parameter
pub fn target_ids(route: &ApiRoute, uri: &Uri) -> Vec<i64> {
    match route.resource_id().and_then(|id| id.parse().ok()) {
        Some(id) => vec![id],
        None => ids_param(uri),
    }
}

/// Query flags as clients send them
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
