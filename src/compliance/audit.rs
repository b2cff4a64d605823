use std::sync::Arc;

use axum::http::Method;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::compliance::error::ComplianceError;
use crate::compliance::store::{ServiceLookup, ServiceReportStore};
use crate::database::models::{NewServiceReport, ServiceReport};

/// What happened to a service definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceAction {
    #[serde(rename = "Service created")]
    Created,
    #[serde(rename = "Service modified")]
    Modified,
    #[serde(rename = "Service deleted")]
    Deleted,
}

impl ServiceAction {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceAction::Created => "Service created",
            ServiceAction::Modified => "Service modified",
            ServiceAction::Deleted => "Service deleted",
        }
    }

    /// Reads are never audited
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::POST => Some(ServiceAction::Created),
            Method::PUT | Method::PATCH => Some(ServiceAction::Modified),
            Method::DELETE => Some(ServiceAction::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One affected service, captured before the request runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceChange {
    pub service_name: String,
    pub action: ServiceAction,
    pub request_verb: String,
}

/// Where a service request says which services it touches
#[derive(Debug, Default, Clone)]
pub struct ServiceTarget<'a> {
    /// Id from the URL path (`system/service/{id}`)
    pub path_id: Option<i64>,
    /// Ids from the `ids` query parameter
    pub ids: Vec<i64>,
    pub payload: Option<&'a Value>,
}

pub struct ServiceAuditRecorder {
    services: Arc<dyn ServiceLookup>,
    reports: Arc<dyn ServiceReportStore>,
}

impl ServiceAuditRecorder {
    pub fn new(services: Arc<dyn ServiceLookup>, reports: Arc<dyn ServiceReportStore>) -> Self {
        Self { services, reports }
    }

    /// Resolve the affected service names. Deleted services cannot be looked up afterwards,
    /// so this has to run before the downstream handler.
    pub async fn collect(
        &self,
        method: &Method,
        target: &ServiceTarget<'_>,
    ) -> Result<Vec<ServiceChange>, ComplianceError> {
        let Some(action) = ServiceAction::from_method(method) else {
            return Ok(Vec::new());
        };

        let names = if let Some(id) = target.path_id {
            vec![self.name_or_blank(id).await?]
        } else if !target.ids.is_empty() {
            try_join_all(target.ids.iter().map(|id| self.name_or_blank(*id))).await?
        } else {
            match target.payload {
                Some(Value::Object(map)) => match map.get("resource") {
                    Some(Value::Array(items)) => {
                        try_join_all(items.iter().map(|item| self.name_from_item(item))).await?
                    }
                    _ => vec![self.name_from_item(&Value::Object(map.clone())).await?],
                },
                _ => vec![String::new()],
            }
        };

        Ok(names
            .into_iter()
            .map(|service_name| ServiceChange {
                service_name,
                action,
                request_verb: method.as_str().to_string(),
            })
            .collect())
    }

    /// Append one report row per change
    pub async fn record(
        &self,
        user_email: &str,
        changes: Vec<ServiceChange>,
    ) -> Result<Vec<ServiceReport>, ComplianceError> {
        let mut written = Vec::with_capacity(changes.len());
        for change in changes {
            debug!("Audit: {} '{}' by {}", change.action, change.service_name, user_email);
            let report = self
                .reports
                .append(NewServiceReport {
                    service_name: change.service_name,
                    user_email: user_email.to_string(),
                    action: change.action,
                    request_verb: change.request_verb,
                })
                .await?;
            written.push(report);
        }
        Ok(written)
    }

    async fn name_from_item(&self, item: &Value) -> Result<String, ComplianceError> {
        if let Some(name) = item.get("name").and_then(Value::as_str) {
            return Ok(name.to_string());
        }
        match item.get("id").and_then(value_as_id) {
            Some(id) => self.name_or_blank(id).await,
            None => Ok(String::new()),
        }
    }

    async fn name_or_blank(&self, id: i64) -> Result<String, ComplianceError> {
        match self.services.name_by_id(id).await {
            Ok(name) => Ok(name),
            Err(err) if err.is_not_found() => {
                warn!("Audit: no service with id {}", id);
                Ok(String::new())
            }
            Err(err) => Err(err),
        }
    }
}

/// Ids arrive as numbers or numeric strings
pub fn value_as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
