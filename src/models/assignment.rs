//! Template-to-restaurant assignment model.

use serde::{Deserialize, Serialize};

/// Links one checklist template to one restaurant, optionally under a department.
///
/// Several rows may link the same template to the same restaurant under
/// different departments; they still count as a single expected checklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateAssignment {
    pub id: String,
    pub template_id: String,
    pub restaurant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub enabled: bool,
    pub created_at: String,
}

/// Request body for assigning a template to a restaurant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub template_id: String,
    pub restaurant_id: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Request body for toggling an assignment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    pub enabled: bool,
}
