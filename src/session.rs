//! Search session state.
//!
//! The comparison flow is modeled as an explicit state machine instead of
//! independent loading/results flags: one `SearchState` per session, advanced
//! by a single reducer. Overlapping searches resolve "latest wins" via a
//! monotonically increasing sequence number; a resolution carrying a stale
//! sequence is discarded. Lookup failures become a `Failed` phase rather
//! than being dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::metrics;
use crate::scoring::{Comparison, Summary};

/// Sessions idle for longer than this are dropped by the cleanup sweep.
pub const SESSION_TTL: Duration = Duration::from_secs(3600);
/// How often the cleanup sweep runs.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);
/// Hard cap on live sessions. When reached, the least recently touched
/// session is evicted before a new one is created.
pub const MAX_SESSIONS: usize = 10_000;

/// Where a session currently stands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SearchPhase {
    /// No search has run yet.
    Idle,
    /// A search is in flight.
    Loading { test: String },
    /// The latest search produced ranked results.
    Loaded {
        test: String,
        results: Vec<Comparison>,
        summary: Summary,
    },
    /// The latest search matched no hospital. Not an error.
    Empty { test: String },
    /// The latest search failed; the reason is always surfaced.
    Failed { test: String, reason: String },
}

/// What a finished search resolved to.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Results {
        results: Vec<Comparison>,
        summary: Summary,
    },
    Empty,
    Failed { reason: String },
}

impl SearchOutcome {
    /// Metric label for the outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Results { .. } => "results",
            Self::Empty => "empty",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Per-session search state.
#[derive(Debug, Clone, Serialize)]
pub struct SearchState {
    /// Sequence number of the most recently begun search. Strictly
    /// increasing within a session.
    pub seq: u64,
    #[serde(flatten)]
    pub phase: SearchPhase,
    /// When this session last began or resolved a search. Drives expiry.
    #[serde(skip)]
    pub touched: Instant,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            seq: 0,
            phase: SearchPhase::Idle,
            touched: Instant::now(),
        }
    }
}

impl SearchState {
    /// Begin a new search: bump the sequence number and enter `Loading`.
    /// Returns the sequence number the eventual resolution must carry.
    pub fn begin(&mut self, test: &str) -> u64 {
        self.seq += 1;
        self.phase = SearchPhase::Loading {
            test: test.to_string(),
        };
        self.touched = Instant::now();
        self.seq
    }

    /// Apply a resolution. Returns `false` (and leaves the state untouched)
    /// when `seq` is not the current sequence number, i.e. a newer search
    /// has started since this one began.
    pub fn resolve(&mut self, seq: u64, outcome: SearchOutcome) -> bool {
        if seq != self.seq {
            debug!(stale = seq, current = self.seq, "Discarding stale search resolution");
            return false;
        }

        let test = match &self.phase {
            SearchPhase::Loading { test } => test.clone(),
            // Current seq but not loading: already resolved.
            _ => return false,
        };

        self.phase = match outcome {
            SearchOutcome::Results { results, summary } => SearchPhase::Loaded {
                test,
                results,
                summary,
            },
            SearchOutcome::Empty => SearchPhase::Empty { test },
            SearchOutcome::Failed { reason } => SearchPhase::Failed { test, reason },
        };
        self.touched = Instant::now();
        true
    }
}

/// Concurrent store of live search sessions, keyed by a client-held UUID.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, SearchState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a search on an existing session, or on a fresh one when `id`
    /// is absent or unknown. Returns the session id and the sequence number
    /// for this search.
    pub fn begin(&self, id: Option<Uuid>, test: &str) -> (Uuid, u64) {
        let id = id.unwrap_or_else(Uuid::new_v4);
        if !self.sessions.contains_key(&id) && self.sessions.len() >= MAX_SESSIONS {
            self.evict_oldest();
        }
        let mut entry = self.sessions.entry(id).or_default();
        let seq = entry.begin(test);
        (id, seq)
    }

    /// Drop the least recently touched session to make room at the cap.
    fn evict_oldest(&self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().touched)
            .map(|entry| *entry.key());
        if let Some(id) = oldest {
            self.sessions.remove(&id);
            debug!(session = %id, "Evicted oldest session at capacity");
        }
    }

    /// Drop sessions untouched for `ttl` or longer. Returns how many remain.
    pub fn purge_expired(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        self.sessions
            .retain(|_id, state| now.duration_since(state.touched) < ttl);
        self.sessions.len()
    }

    /// Background sweep dropping expired sessions. Runs until the server
    /// shuts down.
    pub async fn cleanup_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let remaining = self.purge_expired(SESSION_TTL);
            metrics::update_session_count(remaining);
            debug!(active_sessions = remaining, "Session cleanup completed");
        }
    }

    /// Commit a resolution to a session. Returns `false` when the session is
    /// unknown or the resolution is stale.
    pub fn resolve(&self, id: Uuid, seq: u64, outcome: SearchOutcome) -> bool {
        match self.sessions.get_mut(&id) {
            Some(mut state) => state.resolve(seq, outcome),
            None => false,
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<SearchState> {
        self.sessions.get(id).map(|state| state.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
