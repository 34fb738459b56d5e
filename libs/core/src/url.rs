use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Logical description of a subscribed service.
///
/// Built once at subscribe time. The parameter map carries free-form
/// metadata (caller host, provider weights); everything else is
/// read-only after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceUrl {
    pub application_name: String,
    pub service_name: String,
    parameters: HashMap<String, String>,
}

impl ServiceUrl {
    pub fn new(application_name: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            service_name: service_name.into(),
            parameters: HashMap::new(),
        }
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }
}
