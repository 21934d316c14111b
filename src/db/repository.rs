//! Database repository for CRUD operations and report snapshots.
//!
//! Every write bumps the revision counter in `meta`; report snapshots read
//! everything they need inside one transaction so the counts they feed are
//! taken at a single revision.

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    ChecklistTemplate, CreateAssignmentRequest, CreateNotificationRequest,
    CreateRestaurantRequest, CreateSubmissionRequest, CreateTemplateRequest, Notification,
    NotificationPriority, NotificationType, Restaurant, RevisionInfo, Submission,
    SubmissionFilter, TemplateAssignment, TemplateCatalogEntry, TemplateKind,
    UpdateRestaurantRequest, UpdateTemplateRequest,
};

const RESTAURANT_COLUMNS: &str = "id, name, email, active, created_at, updated_at";

const TEMPLATE_COLUMNS: &str =
    "id, name, description, config, active, departments, type_code, created_at, updated_at, version";

const ASSIGNMENT_COLUMNS: &str =
    "a.id, a.template_id, a.restaurant_id, a.department, a.enabled, a.created_at";

const SUBMISSION_SELECT: &str = r#"SELECT s.id, s.restaurant_id, s.template_id, t.name AS template_name,
           s.submission_date, s.submitted_at, s.submitted_by, s.author_name, s.data
    FROM submissions s
    LEFT JOIN checklist_templates t ON t.id = s.template_id"#;

const NOTIFICATION_COLUMNS: &str =
    "id, restaurant_id, notification_type, priority, title, message, is_read, read_at, created_at";

/// Everything a report needs, read at one revision.
#[derive(Debug, Clone)]
pub struct ReportSnapshot {
    pub revision_id: i64,
    pub date: NaiveDate,
    pub restaurants: Vec<Restaurant>,
    /// Enabled assignments only, ordered by template name
    pub assignments: Vec<TemplateAssignment>,
    pub templates: Vec<ChecklistTemplate>,
    /// Submissions for `date` only
    pub submissions: Vec<Submission>,
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    // ==================== RESTAURANT OPERATIONS ====================

    /// List restaurants ordered by name.
    pub async fn list_restaurants(&self, include_inactive: bool) -> Result<Vec<Restaurant>, AppError> {
        let sql = if include_inactive {
            format!("SELECT {} FROM restaurants ORDER BY name", RESTAURANT_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM restaurants WHERE active = 1 ORDER BY name",
                RESTAURANT_COLUMNS
            )
        };
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(restaurant_from_row).collect())
    }

    /// Get a restaurant by ID.
    pub async fn get_restaurant(&self, id: &str) -> Result<Option<Restaurant>, AppError> {
        let sql = format!("SELECT {} FROM restaurants WHERE id = ?", RESTAURANT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(restaurant_from_row))
    }

    /// Create a new restaurant.
    pub async fn create_restaurant(
        &self,
        request: &CreateRestaurantRequest,
    ) -> Result<Restaurant, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO restaurants (id, name, email, active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(request.name.trim())
        .bind(&request.email)
        .bind(request.active as i32)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Restaurant {
            id,
            name: request.name.trim().to_string(),
            email: request.email.clone(),
            active: request.active,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a restaurant. Setting `active = false` is the only way to retire one.
    pub async fn update_restaurant(
        &self,
        id: &str,
        request: &UpdateRestaurantRequest,
    ) -> Result<Restaurant, AppError> {
        let existing = self
            .get_restaurant(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Restaurant {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.name)
            .to_string();
        let email = request.email.clone().or(existing.email.clone());
        let active = request.active.unwrap_or(existing.active);

        sqlx::query("UPDATE restaurants SET name = ?, email = ?, active = ?, updated_at = ? WHERE id = ?")
            .bind(&name)
            .bind(&email)
            .bind(active as i32)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;

        Ok(Restaurant {
            id: id.to_string(),
            name,
            email,
            active,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    // ==================== TEMPLATE OPERATIONS ====================

    /// List templates ordered by name.
    pub async fn list_templates(&self, active_only: bool) -> Result<Vec<ChecklistTemplate>, AppError> {
        let sql = if active_only {
            format!(
                "SELECT {} FROM checklist_templates WHERE active = 1 ORDER BY name",
                TEMPLATE_COLUMNS
            )
        } else {
            format!("SELECT {} FROM checklist_templates ORDER BY name", TEMPLATE_COLUMNS)
        };
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(template_from_row).collect())
    }

    /// Get a template by ID.
    pub async fn get_template(&self, id: &str) -> Result<Option<ChecklistTemplate>, AppError> {
        let sql = format!("SELECT {} FROM checklist_templates WHERE id = ?", TEMPLATE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(template_from_row))
    }

    /// Create a new template.
    pub async fn create_template(
        &self,
        request: &CreateTemplateRequest,
    ) -> Result<ChecklistTemplate, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let departments = normalize_departments(&request.departments);
        let config_json = serde_json::to_string(&request.config)?;
        let departments_json = serde_json::to_string(&departments)?;

        sqlx::query(
            r#"INSERT INTO checklist_templates (
                id, name, description, config, active, departments, type_code,
                created_at, updated_at, version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1)"#,
        )
        .bind(&id)
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(&config_json)
        .bind(request.active as i32)
        .bind(&departments_json)
        .bind(request.type_code.map(|k| k.as_str()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(ChecklistTemplate {
            id,
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            config: request.config.clone(),
            active: request.active,
            departments,
            type_code: request.type_code,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        })
    }

    /// Update a template with optimistic concurrency control.
    pub async fn update_template(
        &self,
        id: &str,
        request: &UpdateTemplateRequest,
    ) -> Result<ChecklistTemplate, AppError> {
        let existing = self
            .get_template(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Template {} not found", id)))?;

        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let now = Utc::now().to_rfc3339();
        let new_version = existing.version + 1;

        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.name)
            .to_string();
        let description = request.description.clone().or(existing.description.clone());
        let config = request.config.clone().unwrap_or(existing.config.clone());
        let departments = request
            .departments
            .as_ref()
            .map(|d| normalize_departments(d))
            .unwrap_or(existing.departments.clone());
        let type_code = request.type_code.or(existing.type_code);
        let active = request.active.unwrap_or(existing.active);
        let config_json = serde_json::to_string(&config)?;
        let departments_json = serde_json::to_string(&departments)?;

        let result = sqlx::query(
            r#"UPDATE checklist_templates SET
                name = ?, description = ?, config = ?, active = ?, departments = ?,
                type_code = ?, updated_at = ?, version = ?
            WHERE id = ? AND version = ?"#,
        )
        .bind(&name)
        .bind(&description)
        .bind(&config_json)
        .bind(active as i32)
        .bind(&departments_json)
        .bind(type_code.map(|k| k.as_str()))
        .bind(&now)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_template(id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|t| t.version).unwrap_or(0),
            });
        }

        self.increment_revision().await?;

        Ok(ChecklistTemplate {
            id: id.to_string(),
            name,
            description,
            config,
            active,
            departments,
            type_code,
            created_at: existing.created_at,
            updated_at: now,
            version: new_version,
        })
    }

    /// Fleet-wide template catalog, one entry per distinct template name.
    pub async fn template_catalog(&self) -> Result<Vec<TemplateCatalogEntry>, AppError> {
        let templates = self.list_templates(true).await?;
        Ok(build_catalog(&templates))
    }

    // ==================== ASSIGNMENT OPERATIONS ====================

    /// List every assignment (enabled or not) of one restaurant.
    pub async fn list_assignments_for_restaurant(
        &self,
        restaurant_id: &str,
    ) -> Result<Vec<TemplateAssignment>, AppError> {
        let sql = format!(
            r#"SELECT {} FROM template_assignments a
               LEFT JOIN checklist_templates t ON t.id = a.template_id
               WHERE a.restaurant_id = ?
               ORDER BY t.name, a.created_at"#,
            ASSIGNMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(assignment_from_row).collect())
    }

    /// Get an assignment by ID.
    pub async fn get_assignment(&self, id: &str) -> Result<Option<TemplateAssignment>, AppError> {
        let sql = format!(
            "SELECT {} FROM template_assignments a WHERE a.id = ?",
            ASSIGNMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(assignment_from_row))
    }

    /// Assign a template to a restaurant.
    pub async fn create_assignment(
        &self,
        request: &CreateAssignmentRequest,
    ) -> Result<TemplateAssignment, AppError> {
        if self.get_template(&request.template_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Template {} does not exist",
                request.template_id
            )));
        }
        if self.get_restaurant(&request.restaurant_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Restaurant {} does not exist",
                request.restaurant_id
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let department = request
            .department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        sqlx::query(
            "INSERT INTO template_assignments (id, template_id, restaurant_id, department, enabled, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.template_id)
        .bind(&request.restaurant_id)
        .bind(&department)
        .bind(request.enabled as i32)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(TemplateAssignment {
            id,
            template_id: request.template_id.clone(),
            restaurant_id: request.restaurant_id.clone(),
            department,
            enabled: request.enabled,
            created_at: now,
        })
    }

    /// Enable or disable an assignment.
    pub async fn set_assignment_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<TemplateAssignment, AppError> {
        let result = sqlx::query("UPDATE template_assignments SET enabled = ? WHERE id = ?")
            .bind(enabled as i32)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Assignment {} not found", id)));
        }

        self.increment_revision().await?;

        self.get_assignment(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))
    }

    /// Delete an assignment, returning the removed row.
    pub async fn delete_assignment(&self, id: &str) -> Result<TemplateAssignment, AppError> {
        let existing = self
            .get_assignment(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;

        sqlx::query("DELETE FROM template_assignments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;
        Ok(existing)
    }

    // ==================== SUBMISSION OPERATIONS ====================

    /// Record a filled-in checklist.
    pub async fn create_submission(
        &self,
        request: &CreateSubmissionRequest,
    ) -> Result<Submission, AppError> {
        if self.get_restaurant(&request.restaurant_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Restaurant {} does not exist",
                request.restaurant_id
            )));
        }
        let template = self.get_template(&request.template_id).await?.ok_or_else(|| {
            AppError::Validation(format!("Template {} does not exist", request.template_id))
        })?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let data_json = serde_json::to_string(&request.data)?;

        sqlx::query(
            r#"INSERT INTO submissions (
                id, restaurant_id, template_id, submission_date, submitted_at,
                submitted_by, author_name, data
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&request.restaurant_id)
        .bind(&request.template_id)
        .bind(request.submission_date)
        .bind(&now)
        .bind(&request.submitted_by)
        .bind(&request.author_name)
        .bind(&data_json)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Submission {
            id,
            restaurant_id: request.restaurant_id.clone(),
            template_id: request.template_id.clone(),
            template_name: Some(template.name),
            submission_date: request.submission_date,
            submitted_at: now,
            submitted_by: request.submitted_by.clone(),
            author_name: request.author_name.clone(),
            data: request.data.clone(),
        })
    }

    /// Get a submission by ID.
    pub async fn get_submission(&self, id: &str) -> Result<Option<Submission>, AppError> {
        let sql = format!("{} WHERE s.id = ?", SUBMISSION_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(submission_from_row))
    }

    /// List submissions, newest first, optionally filtered by restaurant and date.
    pub async fn list_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<Vec<Submission>, AppError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SUBMISSION_SELECT);
        builder.push(" WHERE 1 = 1");
        if let Some(restaurant_id) = &filter.restaurant_id {
            builder.push(" AND s.restaurant_id = ").push_bind(restaurant_id.clone());
        }
        if let Some(date) = filter.date {
            builder.push(" AND s.submission_date = ").push_bind(date);
        }
        builder.push(" ORDER BY s.submitted_at DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(submission_from_row).collect())
    }

    // ==================== NOTIFICATION OPERATIONS ====================

    /// List a restaurant's notifications, unread first, newest first.
    pub async fn list_notifications(
        &self,
        restaurant_id: &str,
    ) -> Result<Vec<Notification>, AppError> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE restaurant_id = ? ORDER BY is_read ASC, created_at DESC",
            NOTIFICATION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(notification_from_row).collect())
    }

    /// Get a notification by ID.
    pub async fn get_notification(&self, id: &str) -> Result<Option<Notification>, AppError> {
        let sql = format!("SELECT {} FROM notifications WHERE id = ?", NOTIFICATION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(notification_from_row))
    }

    /// Create a notification.
    pub async fn create_notification(
        &self,
        request: &CreateNotificationRequest,
    ) -> Result<Notification, AppError> {
        if self.get_restaurant(&request.restaurant_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Restaurant {} does not exist",
                request.restaurant_id
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO notifications (
                id, restaurant_id, notification_type, priority, title, message,
                is_read, read_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, 0, NULL, ?)"#,
        )
        .bind(&id)
        .bind(&request.restaurant_id)
        .bind(request.notification_type.as_str())
        .bind(request.priority.as_str())
        .bind(&request.title)
        .bind(&request.message)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Notification {
            id,
            restaurant_id: request.restaurant_id.clone(),
            notification_type: request.notification_type,
            priority: request.priority,
            title: request.title.clone(),
            message: request.message.clone(),
            is_read: false,
            read_at: None,
            created_at: now,
        })
    }

    /// Mark one notification read. Marking an already-read one keeps its first `read_at`.
    pub async fn mark_notification_read(&self, id: &str) -> Result<Notification, AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1, read_at = COALESCE(read_at, ?) WHERE id = ?",
        )
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Notification {} not found", id)));
        }

        self.increment_revision().await?;

        self.get_notification(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
    }

    /// Mark all unread notifications of a restaurant read. Returns how many changed.
    pub async fn mark_all_notifications_read(&self, restaurant_id: &str) -> Result<u64, AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1, read_at = ? WHERE restaurant_id = ? AND is_read = 0",
        )
        .bind(&now)
        .bind(restaurant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            self.increment_revision().await?;
        }
        Ok(result.rows_affected())
    }

    /// Delete a notification, returning the removed row.
    pub async fn delete_notification(&self, id: &str) -> Result<Notification, AppError> {
        let existing = self
            .get_notification(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;

        sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;
        Ok(existing)
    }

    // ==================== REPORT SNAPSHOTS ====================

    /// Read the whole fleet for one date at a single revision.
    pub async fn fleet_snapshot(&self, date: NaiveDate) -> Result<ReportSnapshot, AppError> {
        self.load_snapshot(date, None).await
    }

    /// Read one restaurant for one date at a single revision.
    ///
    /// The restaurant is included even when inactive so historical reports stay reachable.
    pub async fn restaurant_snapshot(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
    ) -> Result<Option<ReportSnapshot>, AppError> {
        let snapshot = self.load_snapshot(date, Some(restaurant_id)).await?;
        if snapshot.restaurants.is_empty() {
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    async fn load_snapshot(
        &self,
        date: NaiveDate,
        restaurant_id: Option<&str>,
    ) -> Result<ReportSnapshot, AppError> {
        let mut tx = self.pool.begin().await?;

        let revision_id: i64 = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&mut *tx)
            .await?
            .get("revision_id");

        let restaurant_sql = format!(
            "SELECT {} FROM restaurants WHERE (? IS NULL AND active = 1) OR id = ? ORDER BY name",
            RESTAURANT_COLUMNS
        );
        let restaurants = sqlx::query(&restaurant_sql)
            .bind(restaurant_id)
            .bind(restaurant_id)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(restaurant_from_row)
            .collect();

        let assignment_sql = format!(
            r#"SELECT {} FROM template_assignments a
               LEFT JOIN checklist_templates t ON t.id = a.template_id
               WHERE a.enabled = 1 AND (? IS NULL OR a.restaurant_id = ?)
               ORDER BY t.name, a.created_at"#,
            ASSIGNMENT_COLUMNS
        );
        let assignments = sqlx::query(&assignment_sql)
            .bind(restaurant_id)
            .bind(restaurant_id)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(assignment_from_row)
            .collect();

        let template_sql = format!("SELECT {} FROM checklist_templates ORDER BY name", TEMPLATE_COLUMNS);
        let templates = sqlx::query(&template_sql)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(template_from_row)
            .collect();

        let submission_sql = format!(
            "{} WHERE s.submission_date = ? AND (? IS NULL OR s.restaurant_id = ?) ORDER BY s.submitted_at",
            SUBMISSION_SELECT
        );
        let submissions = sqlx::query(&submission_sql)
            .bind(date)
            .bind(restaurant_id)
            .bind(restaurant_id)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(submission_from_row)
            .collect();

        tx.commit().await?;

        Ok(ReportSnapshot {
            revision_id,
            date,
            restaurants,
            assignments,
            templates,
            submissions,
        })
    }
}

/// Group templates by name, keeping the first-seen order.
pub fn build_catalog(templates: &[ChecklistTemplate]) -> Vec<TemplateCatalogEntry> {
    let mut catalog: Vec<TemplateCatalogEntry> = Vec::new();
    for template in templates {
        match catalog.iter_mut().find(|entry| entry.name == template.name) {
            Some(entry) => {
                entry.template_ids.push(template.id.clone());
                for department in &template.departments {
                    if !entry.departments.contains(department) {
                        entry.departments.push(department.clone());
                    }
                }
            }
            None => catalog.push(TemplateCatalogEntry {
                name: template.name.clone(),
                template_ids: vec![template.id.clone()],
                departments: template.departments.clone(),
            }),
        }
    }
    catalog
}

fn normalize_departments(departments: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for department in departments {
        let trimmed = department.trim();
        if !trimmed.is_empty() && !normalized.iter().any(|d| d == trimmed) {
            normalized.push(trimmed.to_string());
        }
    }
    normalized
}

// Helper functions for row conversion

fn restaurant_from_row(row: &sqlx::sqlite::SqliteRow) -> Restaurant {
    let active: i32 = row.get("active");
    Restaurant {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        active: active != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn template_from_row(row: &sqlx::sqlite::SqliteRow) -> ChecklistTemplate {
    let active: i32 = row.get("active");
    let config_str: String = row.get("config");
    let departments_str: String = row.get("departments");
    let type_code: Option<String> = row.get("type_code");
    ChecklistTemplate {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        config: parse_json_value(&config_str),
        active: active != 0,
        departments: parse_json_array(&departments_str),
        type_code: type_code.as_deref().and_then(TemplateKind::from_code),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn assignment_from_row(row: &sqlx::sqlite::SqliteRow) -> TemplateAssignment {
    let enabled: i32 = row.get("enabled");
    TemplateAssignment {
        id: row.get("id"),
        template_id: row.get("template_id"),
        restaurant_id: row.get("restaurant_id"),
        department: row.get("department"),
        enabled: enabled != 0,
        created_at: row.get("created_at"),
    }
}

fn submission_from_row(row: &sqlx::sqlite::SqliteRow) -> Submission {
    let data_str: String = row.get("data");
    Submission {
        id: row.get("id"),
        restaurant_id: row.get("restaurant_id"),
        template_id: row.get("template_id"),
        template_name: row.get("template_name"),
        submission_date: row.get("submission_date"),
        submitted_at: row.get("submitted_at"),
        submitted_by: row.get("submitted_by"),
        author_name: row.get("author_name"),
        data: parse_json_value(&data_str),
    }
}

fn notification_from_row(row: &sqlx::sqlite::SqliteRow) -> Notification {
    let notification_type: String = row.get("notification_type");
    let priority: String = row.get("priority");
    let is_read: i32 = row.get("is_read");
    Notification {
        id: row.get("id"),
        restaurant_id: row.get("restaurant_id"),
        notification_type: NotificationType::from_code(&notification_type)
            .unwrap_or(NotificationType::System),
        priority: NotificationPriority::from_code(&priority).unwrap_or_default(),
        title: row.get("title"),
        message: row.get("message"),
        is_read: is_read != 0,
        read_at: row.get("read_at"),
        created_at: row.get("created_at"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

fn parse_json_value(s: &str) -> serde_json::Value {
    serde_json::from_str(s).unwrap_or_else(|e| {
        tracing::warn!("Stored JSON could not be parsed, treating as null: {}", e);
        serde_json::Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::db::init_database;

    async fn test_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("repo.sqlite"))
            .await
            .unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn template_request(name: &str, departments: &[&str]) -> CreateTemplateRequest {
        CreateTemplateRequest {
            name: name.to_string(),
            description: None,
            config: serde_json::json!({ "fields": [] }),
            departments: departments.iter().map(|d| d.to_string()).collect(),
            type_code: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_snapshot_reads_enabled_assignments_and_date_submissions() {
        let (repo, _dir) = test_repo().await;
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        let restaurant = repo
            .create_restaurant(&CreateRestaurantRequest {
                name: "Central".to_string(),
                email: None,
                active: true,
            })
            .await
            .unwrap();
        let fridge = repo
            .create_template(&template_request("Fridge Log", &["Operations"]))
            .await
            .unwrap();
        let hygiene = repo
            .create_template(&template_request("Hygiene Round", &[]))
            .await
            .unwrap();

        repo.create_assignment(&CreateAssignmentRequest {
            template_id: fridge.id.clone(),
            restaurant_id: restaurant.id.clone(),
            department: Some("Operations".to_string()),
            enabled: true,
        })
        .await
        .unwrap();
        repo.create_assignment(&CreateAssignmentRequest {
            template_id: hygiene.id.clone(),
            restaurant_id: restaurant.id.clone(),
            department: None,
            enabled: false,
        })
        .await
        .unwrap();

        for day in [date, date.succ_opt().unwrap()] {
            repo.create_submission(&CreateSubmissionRequest {
                restaurant_id: restaurant.id.clone(),
                template_id: fridge.id.clone(),
                submission_date: day,
                submitted_by: "user-1".to_string(),
                author_name: Some("Ivan".to_string()),
                data: serde_json::json!({ "dateBlocks": [] }),
            })
            .await
            .unwrap();
        }

        let snapshot = repo.fleet_snapshot(date).await.unwrap();
        assert_eq!(snapshot.revision_id, repo.get_revision_id().await.unwrap());
        assert_eq!(snapshot.restaurants.len(), 1);
        assert_eq!(snapshot.assignments.len(), 1);
        assert_eq!(snapshot.assignments[0].template_id, fridge.id);
        assert_eq!(snapshot.submissions.len(), 1);
        assert_eq!(snapshot.submissions[0].submission_date, date);
        assert_eq!(snapshot.submissions[0].template_name.as_deref(), Some("Fridge Log"));
    }

    #[tokio::test]
    async fn test_restaurant_snapshot_includes_inactive_restaurant() {
        let (repo, _dir) = test_repo().await;
        let closed = repo
            .create_restaurant(&CreateRestaurantRequest {
                name: "Closed".to_string(),
                email: None,
                active: false,
            })
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        assert!(repo.fleet_snapshot(date).await.unwrap().restaurants.is_empty());
        let snapshot = repo.restaurant_snapshot(&closed.id, date).await.unwrap();
        assert_eq!(snapshot.unwrap().restaurants[0].name, "Closed");
        assert!(repo.restaurant_snapshot("missing", date).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_template_version_conflict() {
        let (repo, _dir) = test_repo().await;
        let template = repo
            .create_template(&template_request("Production", &["Pizza", " Pizza ", ""]))
            .await
            .unwrap();
        assert_eq!(template.departments, vec!["Pizza".to_string()]);

        let update = UpdateTemplateRequest {
            name: Some("Production Log".to_string()),
            description: None,
            config: None,
            departments: None,
            type_code: Some(TemplateKind::Production),
            active: None,
            expected_version: Some(5),
        };
        match repo.update_template(&template.id, &update).await {
            Err(AppError::Conflict {
                current_version, ..
            }) => assert_eq!(current_version, 1),
            other => panic!("expected conflict, got {:?}", other.map(|t| t.version)),
        }
    }

    #[tokio::test]
    async fn test_notifications_read_flow() {
        let (repo, _dir) = test_repo().await;
        let restaurant = repo
            .create_restaurant(&CreateRestaurantRequest {
                name: "North".to_string(),
                email: None,
                active: true,
            })
            .await
            .unwrap();

        for title in ["Fridge log missing", "Hygiene round missing"] {
            repo.create_notification(&CreateNotificationRequest {
                restaurant_id: restaurant.id.clone(),
                notification_type: NotificationType::MissingChecklist,
                priority: NotificationPriority::High,
                title: title.to_string(),
                message: String::new(),
            })
            .await
            .unwrap();
        }

        let listed = repo.list_notifications(&restaurant.id).await.unwrap();
        let first = repo.mark_notification_read(&listed[0].id).await.unwrap();
        assert!(first.is_read);
        assert!(first.read_at.is_some());

        let listed = repo.list_notifications(&restaurant.id).await.unwrap();
        assert!(!listed[0].is_read, "unread notifications come first");

        assert_eq!(repo.mark_all_notifications_read(&restaurant.id).await.unwrap(), 1);
        assert_eq!(repo.mark_all_notifications_read(&restaurant.id).await.unwrap(), 0);
    }

    #[test]
    fn test_catalog_deduplicates_by_name() {
        let make = |id: &str, name: &str, departments: &[&str]| ChecklistTemplate {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            config: serde_json::Value::Null,
            active: true,
            departments: departments.iter().map(|d| d.to_string()).collect(),
            type_code: None,
            created_at: String::new(),
            updated_at: String::new(),
            version: 1,
        };
        let catalog = build_catalog(&[
            make("a", "Fridge Log", &["Pizza"]),
            make("b", "Fridge Log", &["Doner", "Pizza"]),
            make("c", "Hygiene", &[]),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].template_ids, vec!["a", "b"]);
        assert_eq!(catalog[0].departments, vec!["Pizza", "Doner"]);
    }
}
