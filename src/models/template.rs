//! Checklist template model.

use serde::{Deserialize, Serialize};

/// Stable layout code stored alongside a template.
///
/// Templates created before codes existed carry none; their layout is
/// inferred from the template name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    OilChange,
    Refrigeration,
    Pizza,
    Production,
    Hygiene,
    Generic,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::OilChange => "oil_change",
            TemplateKind::Refrigeration => "refrigeration",
            TemplateKind::Pizza => "pizza",
            TemplateKind::Production => "production",
            TemplateKind::Hygiene => "hygiene",
            TemplateKind::Generic => "generic",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "oil_change" => Some(TemplateKind::OilChange),
            "refrigeration" => Some(TemplateKind::Refrigeration),
            "pizza" => Some(TemplateKind::Pizza),
            "production" => Some(TemplateKind::Production),
            "hygiene" => Some(TemplateKind::Hygiene),
            "generic" => Some(TemplateKind::Generic),
            _ => None,
        }
    }
}

/// A named, reusable checklist definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistTemplate {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// UI layout description; opaque to the backend
    pub config: serde_json::Value,
    pub active: bool,
    pub departments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_code: Option<TemplateKind>,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// One entry of the fleet-wide template catalog, de-duplicated by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCatalogEntry {
    pub name: String,
    pub template_ids: Vec<String>,
    pub departments: Vec<String>,
}

/// Request body for creating a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub type_code: Option<TemplateKind>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Request body for updating a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub departments: Option<Vec<String>>,
    #[serde(default)]
    pub type_code: Option<TemplateKind>,
    #[serde(default)]
    pub active: Option<bool>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}
