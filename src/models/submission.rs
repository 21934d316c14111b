//! Checklist submission model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One filled-in checklist for a restaurant and calendar date.
///
/// Several submissions may share a date. The payload shape depends on the
/// template and is not validated on write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub restaurant_id: String,
    pub template_id: String,
    /// Joined from the template table; absent when the template is gone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    pub submission_date: NaiveDate,
    pub submitted_at: String,
    pub submitted_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub data: serde_json::Value,
}

/// Request body for recording a submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub restaurant_id: String,
    pub template_id: String,
    pub submission_date: NaiveDate,
    pub submitted_by: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Query filter for listing submissions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFilter {
    #[serde(default)]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}
