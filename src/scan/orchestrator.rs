use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{ScanError, ScanErrorKind};

use super::backend::{FoodAnalysisBackend, ScanProgress, ScanStage};
use super::dto::{RawCapture, ScanResult};
use super::validate::validate;

/// Recorded outcome of a failed scan: message plus classified kind, as
/// surfaced to the user.
#[derive(Debug, Clone, Serialize)]
pub struct ScanFailure {
    pub message: String,
    pub kind: ScanErrorKind,
    pub hint: &'static str,
}

impl From<&ScanError> for ScanFailure {
    fn from(err: &ScanError) -> Self {
        Self {
            message: err.to_string(),
            kind: err.kind(),
            hint: err.hint(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// A second submission arrived while a scan was in flight.
    #[error("a scan is already in flight")]
    AlreadyScanning,

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Result, error, or neither (idle / in progress). Never both.
#[derive(Debug, Clone, Default)]
enum ScanState {
    #[default]
    Idle,
    Succeeded(ScanResult),
    Failed(ScanFailure),
}

/// Point-in-time view served to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSnapshot {
    pub stage: ScanStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ScanFailure>,
}

/// Sequences validate -> analyze and owns the current scan state. At most
/// one scan attempt is in flight at a time; a submission is user-serialized
/// work, so there is no queueing, only rejection.
pub struct ScanOrchestrator {
    backend: Arc<dyn FoodAnalysisBackend>,
    progress: ScanProgress,
    in_flight: AtomicBool,
    state: Mutex<ScanState>,
    /// The capture backing the current preview. Held until superseded by
    /// the next submission or released by reset.
    preview: Mutex<Option<RawCapture>>,
}

impl ScanOrchestrator {
    pub fn new(backend: Arc<dyn FoodAnalysisBackend>) -> Self {
        Self {
            backend,
            progress: ScanProgress::default(),
            in_flight: AtomicBool::new(false),
            state: Mutex::new(ScanState::Idle),
            preview: Mutex::new(None),
        }
    }

    /// Run one scan end to end. Rejects when a scan is already running;
    /// once accepted it runs to success or failure, no mid-flight
    /// cancellation.
    pub async fn submit(&self, capture: RawCapture) -> Result<ScanResult, SubmitError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("scan submission rejected, one already in flight");
            return Err(SubmitError::AlreadyScanning);
        }

        // Supersede any previous outcome and preview before starting.
        *self.lock_state() = ScanState::Idle;
        *self.lock_preview() = None;

        let outcome = self.run(capture).await;
        match &outcome {
            Ok(result) => {
                info!(food = %result.name, confidence = result.confidence, "scan succeeded");
                self.progress.enter(ScanStage::Succeeded);
                *self.lock_state() = ScanState::Succeeded(result.clone());
            }
            Err(err) => {
                warn!(kind = ?err.kind(), error = %err, "scan failed");
                self.progress.enter(ScanStage::Failed);
                *self.lock_state() = ScanState::Failed(ScanFailure::from(err));
            }
        }

        self.in_flight.store(false, Ordering::SeqCst);
        outcome.map_err(SubmitError::from)
    }

    async fn run(&self, capture: RawCapture) -> Result<ScanResult, ScanError> {
        self.progress.enter(ScanStage::Validating);
        validate(&capture)?;

        // Only a validated capture becomes the held preview.
        *self.lock_preview() = Some(capture.clone());

        self.backend.analyze(&capture, &self.progress).await
    }

    /// Clear result, error, and the held preview. Idempotent; a no-op
    /// while a scan is in flight.
    pub fn reset(&self) {
        if self.in_flight.load(Ordering::SeqCst) {
            debug!("reset ignored while a scan is in flight");
            return;
        }
        *self.lock_state() = ScanState::Idle;
        *self.lock_preview() = None;
        self.progress.enter(ScanStage::Idle);
    }

    pub fn stage(&self) -> ScanStage {
        self.progress.current()
    }

    pub fn result(&self) -> Option<ScanResult> {
        match &*self.lock_state() {
            ScanState::Succeeded(result) => Some(result.clone()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<ScanFailure> {
        match &*self.lock_state() {
            ScanState::Failed(failure) => Some(failure.clone()),
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<RawCapture> {
        self.lock_preview().clone()
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        let (result, error) = match &*self.lock_state() {
            ScanState::Idle => (None, None),
            ScanState::Succeeded(result) => (Some(result.clone()), None),
            ScanState::Failed(failure) => (None, Some(failure.clone())),
        };
        ScanSnapshot {
            stage: self.stage(),
            result,
            error,
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_preview(&self) -> std::sync::MutexGuard<'_, Option<RawCapture>> {
        self.preview.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::backend::BackendMode;
    use crate::scan::simulate::SimulatedBackend;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn small_png() -> RawCapture {
        RawCapture::new(vec![0u8; 10 * 1024], "image/png")
    }

    fn oversized_jpeg() -> RawCapture {
        RawCapture::new(vec![0u8; 6 * 1024 * 1024], "image/jpeg")
    }

    /// Wraps another backend and counts invocations, so tests can prove
    /// no network-side work happened.
    struct CountingBackend<B> {
        inner: B,
        calls: AtomicUsize,
    }

    impl<B> CountingBackend<B> {
        fn new(inner: B) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl<B: FoodAnalysisBackend> FoodAnalysisBackend for CountingBackend<B> {
        fn mode(&self) -> BackendMode {
            self.inner.mode()
        }

        async fn analyze(
            &self,
            capture: &RawCapture,
            progress: &ScanProgress,
        ) -> Result<ScanResult, ScanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.analyze(capture, progress).await
        }
    }

    /// Parks in `analyze` until released, to hold a scan in flight.
    struct BlockingBackend {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl FoodAnalysisBackend for BlockingBackend {
        fn mode(&self) -> BackendMode {
            BackendMode::Simulated
        }

        async fn analyze(
            &self,
            capture: &RawCapture,
            progress: &ScanProgress,
        ) -> Result<ScanResult, ScanError> {
            self.entered.notify_one();
            self.release.notified().await;
            SimulatedBackend.analyze(capture, progress).await
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl FoodAnalysisBackend for FailingBackend {
        fn mode(&self) -> BackendMode {
            BackendMode::Live
        }

        async fn analyze(
            &self,
            _capture: &RawCapture,
            _progress: &ScanProgress,
        ) -> Result<ScanResult, ScanError> {
            Err(ScanError::Analysis("food analysis service returned 500".into()))
        }
    }

    #[tokio::test]
    async fn successful_scan_reaches_succeeded() {
        let orchestrator = ScanOrchestrator::new(Arc::new(SimulatedBackend));
        let result = orchestrator.submit(small_png()).await.unwrap();
        assert!(!result.name.is_empty());
        assert_eq!(orchestrator.stage(), ScanStage::Succeeded);
        assert!(orchestrator.result().is_some());
        assert!(orchestrator.error().is_none());
        assert!(orchestrator.preview().is_some());
    }

    #[tokio::test]
    async fn invalid_image_fails_before_any_backend_call() {
        let backend = Arc::new(CountingBackend::new(SimulatedBackend));
        let orchestrator = ScanOrchestrator::new(backend.clone());

        let err = orchestrator.submit(oversized_jpeg()).await.unwrap_err();
        match err {
            SubmitError::Scan(e) => assert_eq!(e.kind(), ScanErrorKind::Upload),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.stage(), ScanStage::Failed);
        assert!(orchestrator.preview().is_none());
    }

    #[tokio::test]
    async fn backend_failure_is_recorded_with_its_kind() {
        let orchestrator = ScanOrchestrator::new(Arc::new(FailingBackend));
        let err = orchestrator.submit(small_png()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Scan(_)));

        let failure = orchestrator.error().expect("failure recorded");
        assert_eq!(failure.kind, ScanErrorKind::Analysis);
        assert!(!failure.message.is_empty());
        assert!(orchestrator.result().is_none());
    }

    #[tokio::test]
    async fn second_submission_is_rejected_while_in_flight() {
        let backend = Arc::new(BlockingBackend {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let orchestrator = Arc::new(ScanOrchestrator::new(
            backend.clone() as Arc<dyn FoodAnalysisBackend>
        ));

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit(small_png()).await })
        };
        backend.entered.notified().await;

        let second = orchestrator.submit(small_png()).await;
        assert!(matches!(second, Err(SubmitError::AlreadyScanning)));

        backend.release.notify_one();
        let first = first.await.unwrap();
        assert!(first.is_ok());
    }

    #[tokio::test]
    async fn state_is_mutually_exclusive() {
        let orchestrator = ScanOrchestrator::new(Arc::new(SimulatedBackend));

        let snapshot = orchestrator.snapshot();
        assert!(snapshot.result.is_none() && snapshot.error.is_none());

        orchestrator.submit(small_png()).await.unwrap();
        let snapshot = orchestrator.snapshot();
        assert!(snapshot.result.is_some() && snapshot.error.is_none());

        let _ = orchestrator.submit(oversized_jpeg()).await;
        let snapshot = orchestrator.snapshot();
        assert!(snapshot.result.is_none() && snapshot.error.is_some());
    }

    #[tokio::test]
    async fn reset_is_idempotent_from_every_terminal_state() {
        let orchestrator = ScanOrchestrator::new(Arc::new(SimulatedBackend));

        // From idle.
        orchestrator.reset();
        assert_eq!(orchestrator.stage(), ScanStage::Idle);

        // From succeeded.
        orchestrator.submit(small_png()).await.unwrap();
        orchestrator.reset();
        assert_eq!(orchestrator.stage(), ScanStage::Idle);
        assert!(orchestrator.result().is_none());
        assert!(orchestrator.error().is_none());
        assert!(orchestrator.preview().is_none());

        // From failed.
        let _ = orchestrator.submit(oversized_jpeg()).await;
        orchestrator.reset();
        orchestrator.reset();
        assert_eq!(orchestrator.stage(), ScanStage::Idle);
        assert!(orchestrator.error().is_none());
    }
}
