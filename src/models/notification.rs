//! Restaurant-scoped notification model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    MissingChecklist,
    Reminder,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::MissingChecklist => "missing_checklist",
            NotificationType::Reminder => "reminder",
            NotificationType::System => "system",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "missing_checklist" => Some(NotificationType::MissingChecklist),
            "reminder" => Some(NotificationType::Reminder),
            "system" => Some(NotificationType::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Urgent => "urgent",
            NotificationPriority::High => "high",
            NotificationPriority::Normal => "normal",
            NotificationPriority::Low => "low",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "urgent" => Some(NotificationPriority::Urgent),
            "high" => Some(NotificationPriority::High),
            "normal" => Some(NotificationPriority::Normal),
            "low" => Some(NotificationPriority::Low),
            _ => None,
        }
    }
}

/// A message shown in a restaurant's notification panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub restaurant_id: String,
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    pub created_at: String,
}

/// Request body for creating a notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub restaurant_id: String,
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: NotificationPriority,
    pub title: String,
    #[serde(default)]
    pub message: String,
}
