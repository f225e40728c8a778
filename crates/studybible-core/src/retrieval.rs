//! Related-passage retrieval.
//!
//! Every request is stamped with the epoch that was current when it was sent.
//! Starting a new request, deselecting, or navigating bumps the epoch, so a
//! completion whose epoch no longer matches belongs to a superseded selection
//! and is dropped on arrival. Completions come back over a channel owned by
//! the coordinator and are applied by whoever owns it, one at a time.

use crate::error::StudyError;
use crate::search::{Citation, RelatedVerse, SearchError, SimilaritySearch};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestEpoch(u64);

impl RequestEpoch {
    fn next(self) -> Self {
        RequestEpoch(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RetrievalStatus {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<RelatedVerse>),
    Failed(StudyError),
}

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub timeout: Duration,
    /// Abort the task of a superseded request instead of only ignoring its
    /// result.
    pub cancel_superseded: bool,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            cancel_superseded: true,
        }
    }
}

#[derive(Debug)]
pub struct Completion {
    pub epoch: RequestEpoch,
    pub citation: Citation,
    pub result: Result<Vec<RelatedVerse>, SearchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Applied,
    Discarded,
}

pub struct RetrievalCoordinator {
    search: Arc<dyn SimilaritySearch>,
    options: RetrievalOptions,
    epoch: RequestEpoch,
    status: RetrievalStatus,
    in_flight: Option<JoinHandle<()>>,
    requests_sent: u64,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl RetrievalCoordinator {
    pub fn new(search: Arc<dyn SimilaritySearch>, options: RetrievalOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            search,
            options,
            epoch: RequestEpoch::default(),
            status: RetrievalStatus::Idle,
            in_flight: None,
            requests_sent: 0,
            tx,
            rx,
        }
    }

    pub fn status(&self) -> &RetrievalStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, RetrievalStatus::Loading)
    }

    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    /// Send one request for `citation` and make it the current one. Must be
    /// called from within a tokio runtime.
    pub fn start(&mut self, citation: Citation) -> RequestEpoch {
        self.supersede();
        let epoch = self.epoch;
        self.status = RetrievalStatus::Loading;
        self.requests_sent += 1;

        debug!(epoch = epoch.value(), %citation, "retrieval started");

        let request = self.search.fetch_related(citation.clone());
        let tx = self.tx.clone();
        let timeout = self.options.timeout;
        let handle = tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, request).await {
                Ok(result) => result,
                Err(_) => {
                    let err = SearchError::Timeout(timeout);
                    err.log(&citation);
                    Err(err)
                }
            };
            // The receiver lives as long as the coordinator.
            let _ = tx.send(Completion {
                epoch,
                citation,
                result,
            });
        });
        self.in_flight = Some(handle);

        epoch
    }

    /// Forget the current request and return to `Idle`. Anything still
    /// outstanding will be discarded when it arrives.
    pub fn reset(&mut self) {
        self.supersede();
        self.status = RetrievalStatus::Idle;
    }

    fn supersede(&mut self) {
        self.epoch = self.epoch.next();
        if let Some(handle) = self.in_flight.take() {
            if self.options.cancel_superseded && !handle.is_finished() {
                debug!(epoch = self.epoch.value(), "aborting superseded retrieval");
                handle.abort();
            }
        }
    }

    /// Apply a completion if it still belongs to the current request.
    pub fn reconcile(&mut self, completion: Completion) -> Reconciled {
        if completion.epoch != self.epoch || !self.is_loading() {
            debug!(
                epoch = completion.epoch.value(),
                current = self.epoch.value(),
                citation = %completion.citation,
                "discarding stale retrieval"
            );
            return Reconciled::Discarded;
        }

        self.in_flight = None;
        self.status = match completion.result {
            Ok(related) => {
                debug!(citation = %completion.citation, results = related.len(), "retrieval applied");
                RetrievalStatus::Loaded(related)
            }
            Err(err) => RetrievalStatus::Failed(StudyError::RetrievalFailed(err.to_string())),
        };
        Reconciled::Applied
    }

    /// Wait for the next completion, current or stale.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    pub fn try_next_completion(&mut self) -> Option<Completion> {
        self.rx.try_recv().ok()
    }
}

impl Drop for RetrievalCoordinator {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;

    struct Fixed(Result<Vec<RelatedVerse>, SearchError>);

    impl SimilaritySearch for Fixed {
        fn fetch_related(
            &self,
            _citation: Citation,
        ) -> BoxFuture<'static, Result<Vec<RelatedVerse>, SearchError>> {
            let result = self.0.clone();
            Box::pin(async move { result })
        }
    }

    struct Never;

    impl SimilaritySearch for Never {
        fn fetch_related(
            &self,
            _citation: Citation,
        ) -> BoxFuture<'static, Result<Vec<RelatedVerse>, SearchError>> {
            Box::pin(futures_util::future::pending())
        }
    }

    fn citation(verse: u32) -> Citation {
        Citation {
            book: "Genesis".into(),
            chapter: 1,
            verse,
        }
    }

    fn related(reference: &str) -> Vec<RelatedVerse> {
        vec![RelatedVerse {
            reference: reference.into(),
            text: "...".into(),
        }]
    }

    fn coordinator(search: impl SimilaritySearch + 'static) -> RetrievalCoordinator {
        RetrievalCoordinator::new(Arc::new(search), RetrievalOptions::default())
    }

    #[tokio::test]
    async fn test_success_is_applied() {
        let mut coord = coordinator(Fixed(Ok(related("Gen 1:2"))));
        coord.start(citation(1));
        assert!(coord.is_loading());

        let completion = coord.next_completion().await.unwrap();
        assert_eq!(coord.reconcile(completion), Reconciled::Applied);
        assert_eq!(coord.status(), &RetrievalStatus::Loaded(related("Gen 1:2")));
    }

    #[tokio::test]
    async fn test_failure_sets_message() {
        let mut coord = coordinator(Fixed(Err(SearchError::Transport("refused".into()))));
        coord.start(citation(1));

        let completion = coord.next_completion().await.unwrap();
        coord.reconcile(completion);
        assert_eq!(
            coord.status(),
            &RetrievalStatus::Failed(StudyError::RetrievalFailed(
                "Could not reach the similarity service: refused".into()
            ))
        );
    }

    #[test]
    fn test_stale_epoch_is_discarded() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();

        let mut coord = coordinator(Never);
        let first = coord.start(citation(3));
        let second = coord.start(citation(5));
        assert_ne!(first, second);

        let stale = Completion {
            epoch: first,
            citation: citation(3),
            result: Ok(related("stale")),
        };
        assert_eq!(coord.reconcile(stale), Reconciled::Discarded);
        assert!(coord.is_loading());

        let current = Completion {
            epoch: second,
            citation: citation(5),
            result: Ok(related("fresh")),
        };
        assert_eq!(coord.reconcile(current), Reconciled::Applied);
        assert_eq!(coord.status(), &RetrievalStatus::Loaded(related("fresh")));
    }

    #[test]
    fn test_reset_discards_outstanding() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();

        let mut coord = coordinator(Never);
        let epoch = coord.start(citation(1));
        coord.reset();
        assert_eq!(coord.status(), &RetrievalStatus::Idle);

        let late = Completion {
            epoch,
            citation: citation(1),
            result: Err(SearchError::Malformed("late".into())),
        };
        assert_eq!(coord.reconcile(late), Reconciled::Discarded);
        assert_eq!(coord.status(), &RetrievalStatus::Idle);
    }

    #[tokio::test]
    async fn test_timeout_fails_request() {
        let mut coord = RetrievalCoordinator::new(
            Arc::new(Never),
            RetrievalOptions {
                timeout: Duration::from_millis(20),
                cancel_superseded: true,
            },
        );
        coord.start(citation(1));

        let completion = coord.next_completion().await.unwrap();
        assert!(matches!(completion.result, Err(SearchError::Timeout(_))));
        coord.reconcile(completion);
        assert!(matches!(coord.status(), RetrievalStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_cancel_superseded_aborts_task() {
        let mut coord = coordinator(Never);
        coord.start(citation(3));
        coord.start(citation(5));
        coord.reset();
        assert_eq!(coord.requests_sent(), 2);

        let nothing = tokio::time::timeout(Duration::from_millis(50), coord.next_completion()).await;
        assert!(nothing.is_err());
    }
}
