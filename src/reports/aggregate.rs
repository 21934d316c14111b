//! Completion statistics over a report snapshot.
//!
//! All functions here are pure and synchronous. Completion of a
//! (restaurant, date, template) triple means at least one submission row
//! exists; payload content is not inspected.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::db::ReportSnapshot;
use crate::models::{Restaurant, Submission, TemplateAssignment};

/// `numerator / denominator * 100`, or `0` when the denominator is zero.
pub fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

/// Nearest whole percent for display.
pub fn rounded_percent(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round() as u32
}

/// Letters with no canonical decomposition, spelled out the way German and
/// Scandinavian dictionaries file them.
const EXPANSIONS: &[(char, &str)] = &[
    ('ß', "ss"),
    ('æ', "ae"),
    ('œ', "oe"),
    ('ø', "o"),
    ('ł', "l"),
    ('đ', "d"),
];

/// Primary sort key: lowercase, accents stripped, ligatures expanded.
fn collation_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.nfd().filter(|c| !is_combining_mark(*c)) {
        for lower in c.to_lowercase() {
            match EXPANSIONS.iter().find(|(from, _)| *from == lower) {
                Some((_, to)) => key.push_str(to),
                None => key.push(lower),
            }
        }
    }
    key
}

/// Dictionary name ordering shared by the supported locales.
///
/// Base letters decide first (`Ägäis` files under `a`, `ё` under `е`), then
/// accents, then case.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Per-restaurant completion for one date.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantStat {
    pub restaurant_id: String,
    pub name: String,
    /// Distinct templates with an enabled assignment
    pub expected: usize,
    /// Distinct *expected* templates with at least one submission; a narrower
    /// count than all distinct submitted templates (see `unassigned_completed`)
    pub completed: usize,
    pub missing: usize,
    /// Distinct submitted templates that were never expected
    pub unassigned_completed: usize,
    pub percentage: f64,
    pub percentage_display: u32,
    pub has_activity: bool,
    pub submission_count: usize,
}

/// Compute the statistic for one restaurant.
///
/// `submissions` must already be filtered to the target date.
pub fn restaurant_stat(
    restaurant: &Restaurant,
    assignments: &[TemplateAssignment],
    submissions: &[Submission],
) -> RestaurantStat {
    let assignments: Vec<&TemplateAssignment> = assignments
        .iter()
        .filter(|a| a.restaurant_id == restaurant.id)
        .collect();
    let submissions: Vec<&Submission> = submissions
        .iter()
        .filter(|s| s.restaurant_id == restaurant.id)
        .collect();
    stat_from_parts(restaurant, &assignments, &submissions)
}

fn stat_from_parts(
    restaurant: &Restaurant,
    assignments: &[&TemplateAssignment],
    submissions: &[&Submission],
) -> RestaurantStat {
    let expected_ids: BTreeSet<&str> = assignments
        .iter()
        .filter(|a| a.enabled)
        .map(|a| a.template_id.as_str())
        .collect();
    let submitted_ids: BTreeSet<&str> = submissions
        .iter()
        .map(|s| s.template_id.as_str())
        .collect();

    let expected = expected_ids.len();
    let completed = expected_ids.intersection(&submitted_ids).count();
    let unassigned_completed = submitted_ids.difference(&expected_ids).count();
    let pct = percentage(completed, expected);

    RestaurantStat {
        restaurant_id: restaurant.id.clone(),
        name: restaurant.name.clone(),
        expected,
        completed,
        missing: expected - completed,
        unassigned_completed,
        percentage: pct,
        percentage_display: rounded_percent(pct),
        has_activity: !submissions.is_empty(),
        submission_count: submissions.len(),
    }
}

/// Compute statistics for every restaurant, in input order.
pub fn restaurant_stats(
    restaurants: &[Restaurant],
    assignments: &[TemplateAssignment],
    submissions: &[Submission],
) -> Vec<RestaurantStat> {
    let mut assignments_by_restaurant: HashMap<&str, Vec<&TemplateAssignment>> = HashMap::new();
    for assignment in assignments {
        assignments_by_restaurant
            .entry(assignment.restaurant_id.as_str())
            .or_default()
            .push(assignment);
    }
    let mut submissions_by_restaurant: HashMap<&str, Vec<&Submission>> = HashMap::new();
    for submission in submissions {
        submissions_by_restaurant
            .entry(submission.restaurant_id.as_str())
            .or_default()
            .push(submission);
    }

    restaurants
        .iter()
        .map(|restaurant| {
            let id = restaurant.id.as_str();
            stat_from_parts(
                restaurant,
                assignments_by_restaurant.get(id).map(Vec::as_slice).unwrap_or(&[]),
                submissions_by_restaurant.get(id).map(Vec::as_slice).unwrap_or(&[]),
            )
        })
        .collect()
}

/// Worst performers first. Restaurants with nothing expected always go last;
/// equal percentages are ordered by name.
pub fn rank_fleet(stats: &mut [RestaurantStat]) {
    stats.sort_by(|a, b| {
        (a.expected == 0)
            .cmp(&(b.expected == 0))
            .then_with(|| a.percentage.total_cmp(&b.percentage))
            .then_with(|| compare_names(&a.name, &b.name))
    });
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FleetTotals {
    pub total_expected: usize,
    pub total_completed: usize,
    pub total_percentage: f64,
    pub total_percentage_display: u32,
}

pub fn fleet_totals(stats: &[RestaurantStat]) -> FleetTotals {
    let total_expected = stats.iter().map(|s| s.expected).sum();
    let total_completed = stats.iter().map(|s| s.completed).sum();
    let total_percentage = percentage(total_completed, total_expected);

    FleetTotals {
        total_expected,
        total_completed,
        total_percentage,
        total_percentage_display: rounded_percent(total_percentage),
    }
}

/// Fleet-wide ranked summary for one date.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FleetOverview {
    pub date: NaiveDate,
    pub revision_id: i64,
    /// Restaurants with at least one expected checklist, worst first
    pub ranking: Vec<RestaurantStat>,
    /// Restaurants with nothing assigned, by name
    pub unassigned: Vec<RestaurantStat>,
    pub totals: FleetTotals,
}

pub fn build_overview(snapshot: &ReportSnapshot) -> FleetOverview {
    let mut stats = restaurant_stats(
        &snapshot.restaurants,
        &snapshot.assignments,
        &snapshot.submissions,
    );
    rank_fleet(&mut stats);
    let totals = fleet_totals(&stats);
    let (ranking, unassigned): (Vec<_>, Vec<_>) = stats.into_iter().partition(|s| s.expected > 0);

    FleetOverview {
        date: snapshot.date,
        revision_id: snapshot.revision_id,
        ranking,
        unassigned,
        totals,
    }
}

/// Assigned template names that were not submitted, in assigned order.
pub fn missing_template_names(assigned: &[String], submitted: &HashSet<String>) -> Vec<String> {
    assigned
        .iter()
        .filter(|name| !submitted.contains(*name))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRef {
    pub id: String,
    pub template_id: String,
    pub submitted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

/// Submissions of one template name.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedChecklist {
    pub template_name: String,
    /// False when the template is not assigned to the restaurant
    pub assigned: bool,
    pub submissions: Vec<SubmissionRef>,
}

/// Single-restaurant detail for one date.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantReport {
    pub restaurant: RestaurantSummary,
    pub date: NaiveDate,
    pub revision_id: i64,
    pub stat: RestaurantStat,
    pub completed: Vec<CompletedChecklist>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSummary {
    pub id: String,
    pub name: String,
    pub active: bool,
}

pub fn build_restaurant_report(
    snapshot: &ReportSnapshot,
    restaurant_id: &str,
) -> Option<RestaurantReport> {
    let restaurant = snapshot.restaurants.iter().find(|r| r.id == restaurant_id)?;
    let stat = restaurant_stat(restaurant, &snapshot.assignments, &snapshot.submissions);

    let template_names: HashMap<&str, &str> = snapshot
        .templates
        .iter()
        .map(|t| (t.id.as_str(), t.name.as_str()))
        .collect();
    let name_of = |template_id: &str| -> String {
        template_names
            .get(template_id)
            .map(|name| name.to_string())
            .unwrap_or_else(|| template_id.to_string())
    };

    let mut assigned: Vec<String> = Vec::new();
    for assignment in snapshot
        .assignments
        .iter()
        .filter(|a| a.restaurant_id == restaurant_id && a.enabled)
    {
        let name = name_of(&assignment.template_id);
        if !assigned.contains(&name) {
            assigned.push(name);
        }
    }

    let mut completed: Vec<CompletedChecklist> = Vec::new();
    for submission in snapshot
        .submissions
        .iter()
        .filter(|s| s.restaurant_id == restaurant_id)
    {
        let name = submission
            .template_name
            .clone()
            .unwrap_or_else(|| name_of(&submission.template_id));
        let reference = SubmissionRef {
            id: submission.id.clone(),
            template_id: submission.template_id.clone(),
            submitted_at: submission.submitted_at.clone(),
            author_name: submission.author_name.clone(),
        };
        match completed.iter_mut().find(|c| c.template_name == name) {
            Some(group) => group.submissions.push(reference),
            None => completed.push(CompletedChecklist {
                assigned: assigned.contains(&name),
                template_name: name,
                submissions: vec![reference],
            }),
        }
    }
    completed.sort_by(|a, b| compare_names(&a.template_name, &b.template_name));

    let submitted: HashSet<String> = completed.iter().map(|c| c.template_name.clone()).collect();
    let missing = missing_template_names(&assigned, &submitted);

    Some(RestaurantReport {
        restaurant: RestaurantSummary {
            id: restaurant.id.clone(),
            name: restaurant.name.clone(),
            active: restaurant.active,
        },
        date: snapshot.date,
        revision_id: snapshot.revision_id,
        stat,
        completed,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChecklistTemplate;

    fn restaurant(id: &str, name: &str) -> Restaurant {
        Restaurant {
            id: id.to_string(),
            name: name.to_string(),
            email: None,
            active: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn assignment(restaurant_id: &str, template_id: &str, department: &str) -> TemplateAssignment {
        TemplateAssignment {
            id: format!("{}-{}-{}", restaurant_id, template_id, department),
            template_id: template_id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            department: Some(department.to_string()),
            enabled: true,
            created_at: String::new(),
        }
    }

    fn submission(id: &str, restaurant_id: &str, template_id: &str) -> Submission {
        Submission {
            id: id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            template_id: template_id.to_string(),
            template_name: None,
            submission_date: date(),
            submitted_at: "2025-01-10T08:00:00Z".to_string(),
            submitted_by: "user".to_string(),
            author_name: None,
            data: serde_json::Value::Null,
        }
    }

    fn template(id: &str, name: &str) -> ChecklistTemplate {
        ChecklistTemplate {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            config: serde_json::Value::Null,
            active: true,
            departments: Vec::new(),
            type_code: None,
            created_at: String::new(),
            updated_at: String::new(),
            version: 1,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn stat_with(name: &str, expected: usize, completed: usize) -> RestaurantStat {
        let pct = percentage(completed, expected);
        RestaurantStat {
            restaurant_id: name.to_lowercase(),
            name: name.to_string(),
            expected,
            completed,
            missing: expected - completed,
            unassigned_completed: 0,
            percentage: pct,
            percentage_display: rounded_percent(pct),
            has_activity: completed > 0,
            submission_count: completed,
        }
    }

    #[test]
    fn test_two_of_three_templates_submitted() {
        let r = restaurant("r1", "Central");
        let assignments = vec![
            assignment("r1", "t1", "Pizza"),
            assignment("r1", "t2", "Pizza"),
            assignment("r1", "t3", "Operations"),
        ];
        let submissions = vec![submission("s1", "r1", "t1"), submission("s2", "r1", "t2")];

        let stat = restaurant_stat(&r, &assignments, &submissions);
        assert_eq!(stat.expected, 3);
        assert_eq!(stat.completed, 2);
        assert_eq!(stat.missing, 1);
        assert!((stat.percentage - 66.666).abs() < 0.01);
        assert_eq!(stat.percentage_display, 67);
        assert!(stat.has_activity);
    }

    #[test]
    fn test_no_assignments_means_zero_percent() {
        let stat = restaurant_stat(&restaurant("r1", "Idle"), &[], &[]);
        assert_eq!(stat.expected, 0);
        assert_eq!(stat.missing, 0);
        assert_eq!(stat.percentage, 0.0);
        assert!(!stat.has_activity);
    }

    #[test]
    fn test_departments_under_one_template_count_once() {
        let assignments = vec![
            assignment("r1", "t1", "Pizza"),
            assignment("r1", "t1", "Doner"),
            assignment("r1", "t2", "Chicken"),
        ];
        let stat = restaurant_stat(&restaurant("r1", "Central"), &assignments, &[]);
        assert_eq!(stat.expected, 2);
    }

    #[test]
    fn test_disabled_assignment_is_not_expected() {
        let mut disabled = assignment("r1", "t2", "Pizza");
        disabled.enabled = false;
        let assignments = vec![assignment("r1", "t1", "Pizza"), disabled];
        let stat = restaurant_stat(&restaurant("r1", "Central"), &assignments, &[]);
        assert_eq!(stat.expected, 1);
    }

    #[test]
    fn test_unassigned_submission_does_not_reduce_missing() {
        let assignments = vec![assignment("r1", "t1", "Pizza"), assignment("r1", "t2", "Pizza")];
        let submissions = vec![submission("s1", "r1", "t9"), submission("s2", "r1", "t1")];
        let stat = restaurant_stat(&restaurant("r1", "Central"), &assignments, &submissions);
        assert_eq!(stat.completed, 1);
        assert_eq!(stat.missing, 1);
        assert_eq!(stat.unassigned_completed, 1);
        assert_eq!(stat.completed + stat.missing, stat.expected);
    }

    #[test]
    fn test_percentage_monotonic_in_completed() {
        let mut previous = -1.0;
        for completed in 0..=7 {
            let pct = percentage(completed, 7);
            assert!(pct >= previous);
            previous = pct;
        }
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(rounded_percent(f64::NAN), 0);
    }

    #[test]
    fn test_ranking_pushes_unassigned_last_and_breaks_ties_by_name() {
        let mut stats = vec![
            stat_with("Zeta", 0, 0),
            stat_with("bravo", 4, 2),
            stat_with("Alpha", 2, 1),
            stat_with("Charlie", 3, 3),
            stat_with("Delta", 5, 0),
            stat_with("Aaron", 0, 0),
        ];
        rank_fleet(&mut stats);
        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Delta", "Alpha", "bravo", "Charlie", "Aaron", "Zeta"]);

        let again = {
            let mut copy = stats.clone();
            rank_fleet(&mut copy);
            copy
        };
        assert_eq!(again, stats);
    }

    #[test]
    fn test_accented_names_sort_with_their_base_letter() {
        let mut stats = vec![
            stat_with("Zeta Grill", 2, 1),
            stat_with("Ägäis Taverne", 2, 1),
            stat_with("Bistro", 2, 1),
            stat_with("Éclair Café", 2, 1),
        ];
        rank_fleet(&mut stats);
        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ägäis Taverne", "Bistro", "Éclair Café", "Zeta Grill"]);

        assert_eq!(compare_names("Straße", "Strasse"), Ordering::Greater);
        assert_eq!(compare_names("Straße", "Strast"), Ordering::Less);
        assert_eq!(compare_names("Ёлка", "Жара"), Ordering::Less);
        assert_eq!(compare_names("Ёлка", "Елка"), Ordering::Greater);
        assert_eq!(compare_names("cafe", "Cafe"), Ordering::Greater);
    }

    #[test]
    fn test_fleet_totals() {
        let stats = vec![stat_with("A", 3, 2), stat_with("B", 0, 0), stat_with("C", 1, 1)];
        let totals = fleet_totals(&stats);
        assert_eq!(totals.total_expected, 4);
        assert_eq!(totals.total_completed, 3);
        assert_eq!(totals.total_percentage_display, 75);
        assert_eq!(fleet_totals(&[]).total_percentage, 0.0);
    }

    #[test]
    fn test_missing_names_keep_assigned_order() {
        let assigned = vec![
            "Hygiene".to_string(),
            "Fridge".to_string(),
            "Oil".to_string(),
        ];
        let submitted: HashSet<String> = ["Fridge".to_string(), "Extra".to_string()].into();
        assert_eq!(missing_template_names(&assigned, &submitted), vec!["Hygiene", "Oil"]);
    }

    #[test]
    fn test_overview_partitions_idle_restaurants() {
        let snapshot = ReportSnapshot {
            revision_id: 9,
            date: date(),
            restaurants: vec![restaurant("r1", "Central"), restaurant("r2", "Idle")],
            assignments: vec![
                assignment("r1", "t1", "Pizza"),
                assignment("r1", "t2", "Pizza"),
                assignment("r1", "t3", "Pizza"),
            ],
            templates: Vec::new(),
            submissions: vec![submission("s1", "r1", "t1"), submission("s2", "r1", "t2")],
        };

        let overview = build_overview(&snapshot);
        assert_eq!(overview.revision_id, 9);
        assert_eq!(overview.ranking.len(), 1);
        assert_eq!(overview.ranking[0].percentage_display, 67);
        assert_eq!(overview.unassigned.len(), 1);
        assert_eq!(overview.unassigned[0].name, "Idle");
        assert_eq!(overview.totals.total_expected, 3);
    }

    #[test]
    fn test_restaurant_report_groups_by_template_name() {
        let snapshot = ReportSnapshot {
            revision_id: 3,
            date: date(),
            restaurants: vec![restaurant("r1", "Central")],
            assignments: vec![
                assignment("r1", "t1", "Pizza"),
                assignment("r1", "t2", "Pizza"),
                assignment("r1", "t3", "Pizza"),
            ],
            templates: vec![
                template("t1", "Fridge Log"),
                template("t2", "Hygiene"),
                template("t3", "Oil Change"),
                template("t9", "Extra Audit"),
            ],
            submissions: vec![
                submission("s1", "r1", "t1"),
                submission("s2", "r1", "t1"),
                submission("s3", "r1", "t9"),
            ],
        };

        let report = build_restaurant_report(&snapshot, "r1").unwrap();
        assert_eq!(report.completed.len(), 2);
        assert_eq!(report.completed[0].template_name, "Extra Audit");
        assert!(!report.completed[0].assigned);
        assert_eq!(report.completed[1].submissions.len(), 2);
        assert_eq!(report.missing, vec!["Hygiene", "Oil Change"]);
        assert_eq!(report.stat.missing, 2);
        assert!(build_restaurant_report(&snapshot, "nope").is_none());
    }
}
