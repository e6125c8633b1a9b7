pub mod transport;

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::normalize::{self, CanonicalResult, RawResultPayload};
use crate::render::{self, ReportSink, Status};

pub use transport::{HttpReply, HttpTransport, Transport, TransportOptions, TransportSetupError};

pub const LOCAL_BASE_URL: &str = "http://localhost:3000";
pub const REMOTE_BASE_URL: &str = "https://exambeuresultbackend.onrender.com";
pub const DEFAULT_YEAR: &str = "2024";
pub const DEFAULT_EXAM_HELD: &str = "July/2025";

const BODY_EXCERPT_CHARS: usize = 200;

/// Every way a fetch attempt can end without a report. The `Display` text is
/// the status line shown to the user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Please enter Registration No")]
    Validation,

    #[error("No Result Found. {reason}")]
    ServiceRejection { reason: String },

    #[error("Server returned {status}. {excerpt}")]
    Transport { status: u16, excerpt: String },

    #[error("Invalid JSON from server")]
    Parse,

    #[error("Network / Proxy error: {message}")]
    Network { message: String },
}

/// Raw control values as the user left them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormInput {
    pub registration: String,
    pub semester: Option<String>,
    pub year: Option<String>,
    pub exam_held: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultQuery {
    pub registration: String,
    pub semester: String,
    pub year: String,
    pub exam_held: String,
}

impl ResultQuery {
    pub fn from_form(form: &FormInput) -> Result<Self, FetchError> {
        let registration = form.registration.trim();
        if registration.is_empty() {
            return Err(FetchError::Validation);
        }
        Ok(Self {
            registration: registration.to_string(),
            semester: form
                .semester
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            year: form.year.clone().unwrap_or_else(|| DEFAULT_YEAR.to_string()),
            exam_held: form
                .exam_held
                .clone()
                .unwrap_or_else(|| DEFAULT_EXAM_HELD.to_string()),
        })
    }

    pub fn url(&self, endpoint: &Endpoint) -> reqwest::Url {
        let mut url = endpoint.url().clone();
        url.query_pairs_mut()
            .append_pair("reg", &self.registration)
            .append_pair("sem", &self.semester)
            .append_pair("year", &self.year)
            .append_pair("examHeld", &self.exam_held);
        url
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    url: reqwest::Url,
}

impl Endpoint {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let base = base_url.trim().trim_end_matches('/');
        let url = reqwest::Url::parse(&format!("{base}/result"))
            .map_err(|e| format!("invalid base URL '{base_url}': {e}"))?;
        Ok(Self { url })
    }

    /// An explicit base URL wins; otherwise `local` picks the development
    /// server over the deployed one.
    pub fn select(base_url: Option<&str>, local: bool) -> Result<Self, String> {
        match base_url.filter(|b| !b.trim().is_empty()) {
            Some(base) => Self::new(base),
            None if local => Self::new(LOCAL_BASE_URL),
            None => Self::new(REMOTE_BASE_URL),
        }
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Idle,
    Fetching,
    Shown,
    Hidden,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SupersedePolicy {
    /// Whichever response resolves last paints the report.
    #[default]
    LastResponseWins,
    /// Responses to anything but the newest submission are dropped.
    LatestRequestWins,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Shown { from: String },
    Hidden(FetchError),
    Rejected(FetchError),
    Superseded,
}

impl Outcome {
    pub fn is_shown(&self) -> bool {
        matches!(self, Outcome::Shown { .. })
    }
}

struct View<S> {
    sink: S,
    state: PipelineState,
}

/// Drives one report surface. `submit` takes `&self`, so several
/// submissions can be in flight on the same controller; the view lock is
/// never held across the network await.
pub struct Controller<T, S> {
    endpoint: Endpoint,
    transport: T,
    view: Mutex<View<S>>,
    generation: AtomicU64,
    policy: SupersedePolicy,
}

impl<T: Transport, S: ReportSink> Controller<T, S> {
    pub fn new(endpoint: Endpoint, transport: T, sink: S) -> Self {
        Self {
            endpoint,
            transport,
            view: Mutex::new(View {
                sink,
                state: PipelineState::Idle,
            }),
            generation: AtomicU64::new(0),
            policy: SupersedePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SupersedePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub async fn state(&self) -> PipelineState {
        self.view.lock().await.state
    }

    pub async fn inspect<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let view = self.view.lock().await;
        f(&view.sink)
    }

    pub fn into_sink(self) -> S {
        self.view.into_inner().sink
    }

    pub async fn submit(&self, form: &FormInput) -> Outcome {
        let query = match ResultQuery::from_form(form) {
            Ok(query) => query,
            Err(e) => {
                self.view.lock().await.sink.set_status(Status::error(e.to_string()));
                return Outcome::Rejected(e);
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let url = query.url(&self.endpoint);
        {
            let mut view = self.view.lock().await;
            view.sink.set_visible(false);
            view.sink.clear_tables();
            view.sink.set_status(Status::info("Fetching..."));
            view.sink.trace(&format!("GET {url}"));
            view.state = PipelineState::Fetching;
        }

        let fetched = self.fetch(&query, &url).await;

        let mut view = self.view.lock().await;
        if self.policy == SupersedePolicy::LatestRequestWins
            && self.generation.load(Ordering::SeqCst) != generation
        {
            view.sink
                .trace(&format!("dropped superseded response for {}", query.registration));
            return Outcome::Superseded;
        }

        match fetched {
            Ok((result, from)) => {
                render::render(&result, &mut view.sink);
                view.sink.set_visible(true);
                view.sink.set_status(Status::info(format!("Result loaded ({from})")));
                view.state = PipelineState::Shown;
                Outcome::Shown { from }
            }
            Err(e) => {
                view.sink.set_status(Status::error(e.to_string()));
                view.sink.set_visible(false);
                view.state = PipelineState::Hidden;
                Outcome::Hidden(e)
            }
        }
    }

    async fn fetch(
        &self,
        query: &ResultQuery,
        url: &reqwest::Url,
    ) -> Result<(CanonicalResult, String), FetchError> {
        let reply = self
            .transport
            .get(url)
            .await
            .map_err(|message| FetchError::Network { message })?;

        if !reply.is_success() {
            let excerpt = reply
                .body
                .unwrap_or_default()
                .chars()
                .take(BODY_EXCERPT_CHARS)
                .collect::<String>();
            return Err(FetchError::Transport {
                status: reply.status,
                excerpt,
            });
        }

        let body = reply.body.ok_or(FetchError::Parse)?;
        let payload = RawResultPayload::from_body(&body)?;
        match payload.data.as_ref() {
            Some(data) if payload.success => {
                let result = normalize::normalize(data, &query.registration);
                let from = payload.from.unwrap_or_else(|| "unknown".to_string());
                Ok((result, from))
            }
            _ => Err(FetchError::ServiceRejection {
                reason: payload.rejection_reason(),
            }),
        }
    }
}
