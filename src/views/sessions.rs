//! In-memory navigation sessions.
//!
//! A navigation first commits the new state and takes a ticket carrying its
//! generation, then loads the report, then applies it only if no later
//! navigation has happened in between. Sessions nobody has touched for the
//! configured idle timeout are swept by a background task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::{NavAction, Screen, ViewState};
use crate::errors::AppError;
use crate::render::{Locale, RenderContext};
use crate::reports::{FleetOverview, ReportService, RestaurantReport, SubmissionDetail};

/// The report loaded for a view state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", content = "report", rename_all = "camelCase")]
pub enum ViewData {
    Overview(FleetOverview),
    Restaurant(RestaurantReport),
    Detail(Box<SubmissionDetail>),
}

/// Last successfully loaded view and the state it was loaded for.
#[derive(Debug, Clone)]
struct Shown {
    state: ViewState,
    view: ViewData,
}

#[derive(Debug, Clone)]
struct Session {
    state: ViewState,
    shown: Option<Shown>,
    locale: Locale,
    updated_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl Session {
    fn is_idle(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        (now - self.last_seen)
            .to_std()
            .map(|idle| idle >= timeout)
            .unwrap_or(false)
    }
}

/// What a client sees after creating, reading or navigating a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub state: ViewState,
    pub locale: Locale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewData>,
    /// The current state's view is still being loaded
    pub loading: bool,
    /// True when this navigation's result arrived after a newer one and was dropped
    pub discarded: bool,
    pub updated_at: String,
}

/// State committed by `begin`.
#[derive(Debug, Clone)]
pub struct NavTicket {
    pub state: ViewState,
    pub locale: Locale,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    reports: ReportService,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(reports: ReportService, idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            reports,
            idle_timeout,
        }
    }

    /// Open a session on the overview. The date defaults to today in local time.
    pub async fn create(
        &self,
        date: Option<NaiveDate>,
        locale: Locale,
    ) -> Result<SessionView, AppError> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let state = ViewState::initial(date);
        let view = self.load(&state, locale).await?;

        let session_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let session = Session {
            shown: Some(Shown {
                state: state.clone(),
                view,
            }),
            state,
            locale,
            updated_at: now,
            last_seen: now,
        };
        let snapshot = to_view(&session_id, &session, false);
        self.sessions.write().await.insert(session_id.clone(), session);

        tracing::debug!("Opened navigation session {} for {}", session_id, date);
        Ok(snapshot)
    }

    pub async fn get(&self, session_id: &str) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.last_seen = Utc::now();
        Ok(to_view(session_id, session, false))
    }

    pub async fn remove(&self, session_id: &str) -> Result<(), AppError> {
        match self.sessions.write().await.remove(session_id) {
            Some(_) => Ok(()),
            None => Err(session_not_found(session_id)),
        }
    }

    /// Drop sessions not seen since `now - idle_timeout`. Returns how many went.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(now, self.idle_timeout));
        before - sessions.len()
    }

    /// Apply an action and load the resulting view.
    pub async fn navigate(
        &self,
        session_id: &str,
        action: &NavAction,
    ) -> Result<SessionView, AppError> {
        let ticket = self.begin(session_id, action).await?;
        let loaded = self.load(&ticket.state, ticket.locale).await;
        self.apply(session_id, &ticket, loaded).await
    }

    /// Validate and commit the transition. Later tickets supersede earlier ones.
    ///
    /// Until `apply` stores the new view, readers see the session as loading.
    pub async fn begin(&self, session_id: &str, action: &NavAction) -> Result<NavTicket, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| session_not_found(session_id))?;

        let next = session.state.transition(action)?;
        session.state = next.clone();
        session.updated_at = Utc::now();
        session.last_seen = session.updated_at;

        Ok(NavTicket {
            state: next,
            locale: session.locale,
        })
    }

    /// Store a loaded view if the ticket is still current.
    ///
    /// A failed load on a current ticket puts the session back on the last
    /// screen that loaded successfully.
    pub async fn apply(
        &self,
        session_id: &str,
        ticket: &NavTicket,
        loaded: Result<ViewData, AppError>,
    ) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.last_seen = Utc::now();

        if session.state.generation != ticket.state.generation {
            tracing::debug!(
                "Discarding stale view for session {} (generation {} < {})",
                session_id,
                ticket.state.generation,
                session.state.generation
            );
            return Ok(to_view(session_id, session, true));
        }

        match loaded {
            Ok(view) => {
                session.shown = Some(Shown {
                    state: ticket.state.clone(),
                    view,
                });
                session.updated_at = Utc::now();
                Ok(to_view(session_id, session, false))
            }
            Err(e) => {
                if let Some(shown) = session.shown.as_mut() {
                    shown.state.generation = ticket.state.generation;
                    session.state = shown.state.clone();
                }
                Err(e)
            }
        }
    }

    async fn load(&self, state: &ViewState, locale: Locale) -> Result<ViewData, AppError> {
        match &state.screen {
            Screen::Overview => Ok(ViewData::Overview(self.reports.overview(state.date).await?)),
            Screen::Restaurant { restaurant_id } => Ok(ViewData::Restaurant(
                self.reports.restaurant(restaurant_id, state.date).await?,
            )),
            Screen::Detail {
                restaurant_id,
                submission_id,
            } => {
                let detail = self
                    .reports
                    .submission_detail(submission_id, &RenderContext::new(locale))
                    .await?;
                if &detail.submission.restaurant_id != restaurant_id
                    || detail.submission.submission_date != state.date
                {
                    return Err(AppError::Validation(format!(
                        "Submission {} is not part of this restaurant's report for {}",
                        submission_id, state.date
                    )));
                }
                Ok(ViewData::Detail(Box::new(detail)))
            }
        }
    }
}

/// Periodically drop idle sessions.
pub fn spawn_session_sweeper(store: Arc<SessionStore>) -> JoinHandle<()> {
    let period = (store.idle_timeout / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let evicted = store.evict_idle(Utc::now()).await;
            if evicted > 0 {
                tracing::debug!("Evicted {} idle navigation sessions", evicted);
            }
        }
    })
}

fn to_view(session_id: &str, session: &Session, discarded: bool) -> SessionView {
    let view = session
        .shown
        .as_ref()
        .filter(|shown| shown.state.generation == session.state.generation)
        .map(|shown| shown.view.clone());
    SessionView {
        session_id: session_id.to_string(),
        state: session.state.clone(),
        locale: session.locale,
        loading: view.is_none(),
        view,
        discarded,
        updated_at: session.updated_at.to_rfc3339(),
    }
}

fn session_not_found(session_id: &str) -> AppError {
    AppError::NotFound(format!("Session {} not found", session_id))
}
