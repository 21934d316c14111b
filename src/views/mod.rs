//! Report navigation: overview → restaurant → submission detail.
//!
//! `ViewState::transition` is the pure state machine; `SessionStore` keeps
//! one state per client and loads the matching report for it.

mod sessions;

pub use sessions::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Screen {
    Overview,
    Restaurant {
        restaurant_id: String,
    },
    Detail {
        restaurant_id: String,
        submission_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NavAction {
    SelectRestaurant { restaurant_id: String },
    SelectSubmission { submission_id: String },
    Back,
    ChangeDate { date: NaiveDate },
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub screen: Screen,
    /// Bumped on every accepted transition
    pub generation: u64,
}

impl ViewState {
    pub fn initial(date: NaiveDate) -> Self {
        Self {
            date,
            screen: Screen::Overview,
            generation: 0,
        }
    }

    /// Apply an action. Moves the screen graph does not allow are rejected.
    pub fn transition(&self, action: &NavAction) -> Result<ViewState, AppError> {
        let (date, screen) = match (&self.screen, action) {
            (Screen::Overview, NavAction::SelectRestaurant { restaurant_id }) => (
                self.date,
                Screen::Restaurant {
                    restaurant_id: restaurant_id.clone(),
                },
            ),
            (Screen::Restaurant { restaurant_id }, NavAction::SelectSubmission { submission_id }) => (
                self.date,
                Screen::Detail {
                    restaurant_id: restaurant_id.clone(),
                    submission_id: submission_id.clone(),
                },
            ),
            (Screen::Detail { restaurant_id, .. }, NavAction::Back) => (
                self.date,
                Screen::Restaurant {
                    restaurant_id: restaurant_id.clone(),
                },
            ),
            (Screen::Restaurant { .. }, NavAction::Back) => (self.date, Screen::Overview),
            // The open submission belongs to the old date
            (Screen::Detail { restaurant_id, .. }, NavAction::ChangeDate { date }) => (
                *date,
                Screen::Restaurant {
                    restaurant_id: restaurant_id.clone(),
                },
            ),
            (screen, NavAction::ChangeDate { date }) => (*date, screen.clone()),
            (screen, NavAction::Refresh) => (self.date, screen.clone()),
            (screen, action) => {
                return Err(AppError::Validation(format!(
                    "Action {} is not available from the {} view",
                    action.name(),
                    screen.name()
                )))
            }
        };

        Ok(ViewState {
            date,
            screen,
            generation: self.generation + 1,
        })
    }
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Overview => "overview",
            Screen::Restaurant { .. } => "restaurant",
            Screen::Detail { .. } => "detail",
        }
    }
}

impl NavAction {
    pub fn name(&self) -> &'static str {
        match self {
            NavAction::SelectRestaurant { .. } => "selectRestaurant",
            NavAction::SelectSubmission { .. } => "selectSubmission",
            NavAction::Back => "back",
            NavAction::ChangeDate { .. } => "changeDate",
            NavAction::Refresh => "refresh",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn select_restaurant(id: &str) -> NavAction {
        NavAction::SelectRestaurant {
            restaurant_id: id.to_string(),
        }
    }

    fn select_submission(id: &str) -> NavAction {
        NavAction::SelectSubmission {
            submission_id: id.to_string(),
        }
    }

    #[test]
    fn test_drill_down_and_back() {
        let overview = ViewState::initial(day(10));
        let restaurant = overview.transition(&select_restaurant("r1")).unwrap();
        let detail = restaurant.transition(&select_submission("s1")).unwrap();
        assert_eq!(
            detail.screen,
            Screen::Detail {
                restaurant_id: "r1".to_string(),
                submission_id: "s1".to_string()
            }
        );
        assert_eq!(detail.generation, 2);

        let back = detail.transition(&NavAction::Back).unwrap();
        assert_eq!(back.screen, restaurant.screen);
        let back = back.transition(&NavAction::Back).unwrap();
        assert_eq!(back.screen, Screen::Overview);
        assert_eq!(back.generation, 4);
    }

    #[test]
    fn test_illegal_moves_are_rejected() {
        let overview = ViewState::initial(day(10));
        assert!(matches!(
            overview.transition(&select_submission("s1")),
            Err(AppError::Validation(_))
        ));
        assert!(overview.transition(&NavAction::Back).is_err());

        let restaurant = overview.transition(&select_restaurant("r1")).unwrap();
        assert!(restaurant.transition(&select_restaurant("r2")).is_err());
    }

    #[test]
    fn test_change_date_per_screen() {
        let overview = ViewState::initial(day(10));
        let moved = overview
            .transition(&NavAction::ChangeDate { date: day(11) })
            .unwrap();
        assert_eq!(moved.screen, Screen::Overview);
        assert_eq!(moved.date, day(11));

        let restaurant = overview.transition(&select_restaurant("r1")).unwrap();
        let moved = restaurant
            .transition(&NavAction::ChangeDate { date: day(12) })
            .unwrap();
        assert_eq!(moved.screen, restaurant.screen);
        assert_eq!(moved.date, day(12));

        let detail = restaurant.transition(&select_submission("s1")).unwrap();
        let moved = detail
            .transition(&NavAction::ChangeDate { date: day(9) })
            .unwrap();
        assert_eq!(moved.screen, restaurant.screen);
        assert_eq!(moved.date, day(9));
    }

    #[test]
    fn test_refresh_keeps_screen_and_bumps_generation() {
        let state = ViewState::initial(day(10));
        let refreshed = state.transition(&NavAction::Refresh).unwrap();
        assert_eq!(refreshed.screen, state.screen);
        assert_eq!(refreshed.generation, state.generation + 1);
    }

    #[test]
    fn test_actions_deserialize_from_camel_case() {
        let action: NavAction = serde_json::from_value(serde_json::json!({
            "action": "selectRestaurant",
            "restaurantId": "r1"
        }))
        .unwrap();
        assert_eq!(action, select_restaurant("r1"));

        let action: NavAction = serde_json::from_value(serde_json::json!({
            "action": "changeDate",
            "date": "2025-01-11"
        }))
        .unwrap();
        assert_eq!(action, NavAction::ChangeDate { date: day(11) });
    }
}
