//! HTTP client for the routine API.

mod error;
mod sse;

pub use error::ApiError;
pub use sse::{LiveUpdates, SeatEvent};

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::classify::{classify_response, Feedback, Outcome};
use crate::model::{Course, Section};
use crate::selection::RoutineRequest;

const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Client configuration. The base URL comes from `ROUTINEZ_API_BASE`
/// when set.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("ROUTINEZ_API_BASE")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A successfully generated routine plus any AI feedback.
#[derive(Debug, Clone)]
pub struct RoutinePlan {
    pub routine: Vec<Section>,
    pub feedback: Option<Feedback>,
}

/// Connection status of the upstream course-data feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnStatus {
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// The routine API client. Cheap to clone behind an [`Arc`]; all calls
/// share one connection pool.
pub struct RoutineClient {
    http: reqwest::Client,
    base_url: String,
}

impl RoutineClient {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_config(ApiConfig::default())
    }

    pub fn with_config(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network {
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET /courses`: the course catalogue, sorted by code. With
    /// `show_all`, full courses are included.
    pub async fn courses(&self, show_all: bool) -> Result<Vec<Course>, ApiError> {
        debug!(show_all, "fetching course list");
        let mut courses: Vec<Course> = self
            .http
            .get(format!("{}/courses", self.base_url))
            .query(&[("show_all", show_all)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        courses.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(courses)
    }

    /// `GET /course_details`: all sections of one course. Sections come
    /// back without their course code on some API versions, so it is
    /// stamped in here.
    pub async fn course_details(
        &self,
        course: &str,
        show_all: bool,
    ) -> Result<Vec<Section>, ApiError> {
        debug!(course, show_all, "fetching course details");
        let mut sections: Vec<Section> = self
            .http
            .get(format!("{}/course_details", self.base_url))
            .query(&[("course", course)])
            .query(&[("show_all", show_all)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        for section in &mut sections {
            if section.course_code.is_empty() {
                section.course_code = course.to_string();
            }
        }
        Ok(sections)
    }

    /// `POST /routine`: generate a routine from the current selection.
    ///
    /// The body is classified regardless of HTTP status, since the server
    /// reports routine-level failures in the body with a 200 as often as
    /// not.
    pub async fn generate(&self, request: &RoutineRequest) -> Result<RoutinePlan, ApiError> {
        info!(
            courses = request.courses.len(),
            use_ai = request.use_ai,
            "generating routine"
        );
        let body: Value = self
            .http
            .post(format!("{}/routine", self.base_url))
            .json(request)
            .send()
            .await?
            .json()
            .await?;

        match classify_response(&body) {
            Outcome::Success { routine, feedback } => {
                info!(sections = routine.len(), "routine generated");
                Ok(RoutinePlan { routine, feedback })
            }
            Outcome::Failure(error) => {
                warn!(title = %error.title, "routine generation failed");
                Err(ApiError::Routine(error))
            }
        }
    }

    /// `GET /connapi-status`: whether course data is live or served from
    /// cache.
    pub async fn conn_status(&self) -> Result<ConnStatus, ApiError> {
        let status = self
            .http
            .get(format!("{}/connapi-status", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(status)
    }

    /// `GET /courses/sse`: opens the live seat-update stream.
    pub async fn live_updates(&self) -> Result<LiveUpdates, ApiError> {
        info!("opening seat update stream");
        let response = self
            .http
            .get(format!("{}/courses/sse", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(LiveUpdates::new(response))
    }
}

/// Last-request-wins section refetching.
///
/// Seat displays fire a refresh on every selection change; only the
/// latest one matters, so any in-flight fetch is aborted before the next
/// starts. Results arrive on the channel handed to [`Self::refresh`].
pub struct SectionRefresher {
    client: Arc<RoutineClient>,
    inflight: Mutex<Option<JoinHandle<()>>>,
}

impl SectionRefresher {
    pub fn new(client: Arc<RoutineClient>) -> Self {
        Self {
            client,
            inflight: Mutex::new(None),
        }
    }

    /// Starts a refresh for `course`, aborting any previous one still in
    /// flight.
    pub async fn refresh(
        &self,
        course: &str,
        show_all: bool,
        tx: mpsc::Sender<Result<Vec<Section>, ApiError>>,
    ) {
        let mut inflight = self.inflight.lock().await;
        if let Some(handle) = inflight.take() {
            debug!(course, "aborting superseded section refresh");
            handle.abort();
        }

        let client = Arc::clone(&self.client);
        let course = course.to_string();
        *inflight = Some(tokio::spawn(async move {
            let result = client.course_details(&course, show_all).await;
            let _ = tx.send(result).await;
        }));
    }
}
