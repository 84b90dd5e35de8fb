//! Upload sessions.
//!
//! Each upload becomes a [`Session`] keyed by a random UUID. A session owns
//! the uploaded table and lazily computes each derived artifact (profile,
//! risk, cleaned table, comparison, script, explanation) at most once.
//!
//! # Concurrency
//!
//! ```text
//! SessionStore
//! └── RwLock<HashMap<Uuid, Arc<Session>>>     (lookups take the read lock)
//!     └── Session
//!         ├── table: DataFrame                (immutable after upload)
//!         ├── last_accessed: Mutex<Instant>   (touched on every lookup)
//!         └── OnceCell<Arc<..>> per artifact  (concurrent callers block on
//!                                              the first computation)
//! ```
//!
//! Sessions expire after an idle TTL and the least recently used session is
//! evicted when the store is full.

use chrono::{DateTime, Utc};
use eda_processing::{
    CleaningScript, Comparator, ComparisonResult, DataCleaner, DataProfiler, DatasetProfile,
    EdaResult, Explanation, ExplanationProvider, ExplanationRequest, RiskAssessment, RiskScorer,
    ScriptGenerator, explain_or_fallback,
};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

// ============================================================================
// ARTIFACTS
// ============================================================================

/// A computed result together with the moment it was produced.
#[derive(Debug)]
pub struct Artifact<T> {
    pub value: T,
    pub generated_at: DateTime<Utc>,
}

impl<T> Artifact<T> {
    fn now(value: T) -> Arc<Self> {
        Arc::new(Self {
            value,
            generated_at: Utc::now(),
        })
    }
}

// ============================================================================
// SESSION
// ============================================================================

pub struct Session {
    pub id: Uuid,
    pub filename: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    table: DataFrame,
    last_accessed: Mutex<Instant>,

    profile: OnceCell<Arc<DatasetProfile>>,
    risk: OnceCell<Arc<Artifact<RiskAssessment>>>,
    cleaned: OnceCell<Arc<DataFrame>>,
    comparison: OnceCell<Arc<Artifact<ComparisonResult>>>,
    script: OnceCell<Arc<CleaningScript>>,
    explanation: OnceCell<Arc<Artifact<Explanation>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("filename", &self.filename)
            .field("shape", &self.table.shape())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(filename: impl Into<String>, size_bytes: u64, table: DataFrame) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            size_bytes,
            created_at: Utc::now(),
            table,
            last_accessed: Mutex::new(Instant::now()),
            profile: OnceCell::new(),
            risk: OnceCell::new(),
            cleaned: OnceCell::new(),
            comparison: OnceCell::new(),
            script: OnceCell::new(),
            explanation: OnceCell::new(),
        }
    }

    /// The table as uploaded. Never mutated.
    pub fn table(&self) -> &DataFrame {
        &self.table
    }

    pub fn profile(&self) -> EdaResult<Arc<DatasetProfile>> {
        self.profile
            .get_or_try_init(|| {
                debug!("Profiling session {}", self.id);
                DataProfiler::profile_dataset(&self.table).map(Arc::new)
            })
            .cloned()
    }

    pub fn risk(&self) -> EdaResult<Arc<Artifact<RiskAssessment>>> {
        self.risk
            .get_or_try_init(|| {
                let profile = self.profile()?;
                Ok(Artifact::now(RiskScorer::assess(&profile)))
            })
            .cloned()
    }

    /// The table after the default cleaning transform.
    pub fn cleaned(&self) -> EdaResult<Arc<DataFrame>> {
        self.cleaned
            .get_or_try_init(|| DataCleaner::clean(&self.table).map(Arc::new))
            .cloned()
    }

    pub fn comparison(&self) -> EdaResult<Arc<Artifact<ComparisonResult>>> {
        self.comparison
            .get_or_try_init(|| {
                let cleaned = self.cleaned()?;
                Comparator::compare_frames(&self.table, &cleaned).map(Artifact::now)
            })
            .cloned()
    }

    pub fn script(&self) -> EdaResult<Arc<CleaningScript>> {
        self.script
            .get_or_try_init(|| {
                let profile = self.profile()?;
                Ok(Arc::new(ScriptGenerator::generate(&profile, &self.filename)))
            })
            .cloned()
    }

    /// Explanation of the risk assessment. Provider failures fall back to the
    /// rule-based text, which is memoized like any other result.
    pub fn explanation(
        &self,
        provider: Option<&dyn ExplanationProvider>,
    ) -> EdaResult<Arc<Artifact<Explanation>>> {
        self.explanation
            .get_or_try_init(|| {
                let profile = self.profile()?;
                let risk = self.risk()?;
                let request = ExplanationRequest::new(&profile, &risk.value);
                Ok(Artifact::now(explain_or_fallback(provider, &request)))
            })
            .cloned()
    }

    fn touch(&self) {
        *self.last_accessed.lock() = Instant::now();
    }

    fn last_accessed(&self) -> Instant {
        *self.last_accessed.lock()
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_accessed()) > ttl
    }
}

// ============================================================================
// SESSION STORE
// ============================================================================

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Register a freshly uploaded table and return its session.
    ///
    /// Expired sessions are dropped first; if the store is still full the
    /// least recently used session makes room.
    pub fn insert(
        &self,
        filename: impl Into<String>,
        size_bytes: u64,
        table: DataFrame,
    ) -> Arc<Session> {
        let session = Arc::new(Session::new(filename, size_bytes, table));
        let now = Instant::now();

        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| !s.is_expired(now, self.ttl));

        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.last_accessed())
                .map(|s| s.id)
            else {
                break;
            };
            sessions.remove(&oldest);
            info!("Evicted least recently used session {}", oldest);
        }

        sessions.insert(session.id, Arc::clone(&session));
        info!(
            "Created session {} for '{}' ({} live)",
            session.id,
            session.filename,
            sessions.len()
        );
        session
    }

    /// Look up a live session and mark it as recently used.
    pub fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.read().get(id).cloned()?;

        if session.is_expired(Instant::now(), self.ttl) {
            self.sessions.write().remove(id);
            debug!("Session {} expired on access", id);
            return None;
        }

        session.touch();
        Some(session)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    /// Drop every session idle for longer than the TTL. Returns how many went.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    fn evict_expired_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, self.ttl));
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

static_assertions::assert_impl_all!(Session: Send, Sync);
static_assertions::assert_impl_all!(SessionStore: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use eda_processing::RiskLevel;
    use polars::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_table() -> DataFrame {
        df! {
            "age" => &[Some(30i64), None, Some(41), Some(30)],
            "city" => &[Some("Oslo"), Some("Oslo"), None, Some("Oslo")],
        }
        .unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let store = SessionStore::new(Duration::from_secs(60), 10);
        let session = store.insert("data.csv", 42, sample_table());

        let found = store.get(&session.id).unwrap();
        assert_eq!(found.filename, "data.csv");
        assert_eq!(found.size_bytes, 42);
        assert_eq!(store.len(), 1);
        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new(Duration::from_secs(60), 10);
        let session = store.insert("data.csv", 1, sample_table());

        assert!(store.remove(&session.id));
        assert!(!store.remove(&session.id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_ttl_sweep() {
        let store = SessionStore::new(Duration::from_secs(60), 10);
        store.insert("a.csv", 1, sample_table());
        store.insert("b.csv", 1, sample_table());

        assert_eq!(store.evict_expired(), 0);
        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(store.evict_expired_at(later), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_session_is_not_returned() {
        let store = SessionStore::new(Duration::from_millis(20), 10);
        let session = store.insert("a.csv", 1, sample_table());

        std::thread::sleep(Duration::from_millis(60));
        assert!(store.get(&session.id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let store = SessionStore::new(Duration::from_secs(60), 2);
        let a = store.insert("a.csv", 1, sample_table());
        std::thread::sleep(Duration::from_millis(5));
        let b = store.insert("b.csv", 1, sample_table());
        std::thread::sleep(Duration::from_millis(5));

        // Touch `a` so `b` becomes the least recently used.
        assert!(store.get(&a.id).is_some());
        std::thread::sleep(Duration::from_millis(5));
        let c = store.insert("c.csv", 1, sample_table());

        assert_eq!(store.len(), 2);
        assert!(store.get(&a.id).is_some());
        assert!(store.get(&b.id).is_none());
        assert!(store.get(&c.id).is_some());
    }

    #[test]
    fn test_artifacts_are_memoized() {
        let session = Session::new("data.csv", 1, sample_table());

        let first = session.profile().unwrap();
        let second = session.profile().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let risk = session.risk().unwrap();
        assert!(Arc::ptr_eq(&risk, &session.risk().unwrap()));
        assert_eq!(risk.value.risk_level, RiskLevel::from_score(risk.value.risk_score));

        let comparison = session.comparison().unwrap();
        assert_eq!(comparison.value.before.rows, 4);
        assert_eq!(comparison.value.after.rows, 3);
        assert_eq!(comparison.value.after.missing_values, 0);
    }

    #[test]
    fn test_uploaded_table_is_unchanged_by_cleaning() {
        let session = Session::new("data.csv", 1, sample_table());
        let cleaned = session.cleaned().unwrap();

        assert_eq!(cleaned.height(), 3);
        assert_eq!(session.table().height(), 4);
        assert_eq!(session.profile().unwrap().total_missing(), 2);
    }

    struct CountingProvider(AtomicUsize);

    impl ExplanationProvider for CountingProvider {
        fn explain(&self, _request: &ExplanationRequest<'_>) -> anyhow::Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            Ok("Looks fine.".to_string())
        }

        fn name(&self) -> &str {
            "Counting"
        }
    }

    #[test]
    fn test_concurrent_explanations_call_provider_once() {
        let session = Arc::new(Session::new("data.csv", 1, sample_table()));
        let provider = Arc::new(CountingProvider(AtomicUsize::new(0)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                let provider = Arc::clone(&provider);
                std::thread::spawn(move || {
                    session
                        .explanation(Some(provider.as_ref() as &dyn ExplanationProvider))
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(provider.0.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
        assert_eq!(results[0].value.provider, "Counting");
    }

    #[test]
    fn test_explanation_without_provider_uses_rules() {
        let session = Session::new("data.csv", 1, sample_table());
        let explanation = session.explanation(None).unwrap();
        assert_eq!(explanation.value.provider, "RuleBased");
        assert!(explanation.value.model.is_none());
    }
}
