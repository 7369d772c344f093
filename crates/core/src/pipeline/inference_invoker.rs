use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_model::FaceModel;
use crate::pipeline::pipeline_error::PipelineError;
use crate::rendering::domain::render_surface::RenderSurface;

/// Runs the face model with at most one call in flight.
///
/// An overlapping call fails immediately instead of queueing.
pub struct InferenceInvoker {
    model: Mutex<Box<dyn FaceModel>>,
    calls: AtomicUsize,
}

impl InferenceInvoker {
    pub fn new(model: Box<dyn FaceModel>) -> Self {
        Self {
            model: Mutex::new(model),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn detect(&self, surface: &RenderSurface) -> Result<Vec<Detection>, PipelineError> {
        let Ok(mut model) = self.model.try_lock() else {
            log::error!("Rejected overlapping inference call");
            return Err(PipelineError::InvariantViolation);
        };
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let detections = model.estimate_faces(surface.frame()).await;
        log::debug!(
            "Inference call {call} on frame {} returned {} detection(s)",
            surface.frame().index(),
            detections.len()
        );
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::shared::frame::Frame;

    /// Suspends mid-call and records the peak number of concurrent calls.
    struct SlowModel {
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FaceModel for SlowModel {
        async fn estimate_faces(&mut self, _frame: &Frame) -> Vec<Detection> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);
            vec![Detection::new((1.0, 1.0), (4.0, 4.0), 0.9)]
        }
    }

    fn slow_invoker() -> (InferenceInvoker, Arc<AtomicUsize>) {
        let peak = Arc::new(AtomicUsize::new(0));
        let model = SlowModel {
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
        };
        (InferenceInvoker::new(Box::new(model)), peak)
    }

    fn staged_surface() -> RenderSurface {
        let mut surface = RenderSurface::new();
        surface.resize(8, 8);
        surface
    }

    #[tokio::test]
    async fn test_overlapping_call_rejected() {
        let (invoker, peak) = slow_invoker();
        let surface = staged_surface();

        let (first, second) = tokio::join!(invoker.detect(&surface), invoker.detect(&surface));

        assert_eq!(first.unwrap().len(), 1);
        assert!(matches!(second, Err(PipelineError::InvariantViolation)));
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sequential_calls_succeed() {
        let (invoker, peak) = slow_invoker();
        let surface = staged_surface();

        for _ in 0..3 {
            assert_eq!(invoker.detect(&surface).await.unwrap().len(), 1);
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_many_concurrent_calls_never_overlap() {
        let (invoker, peak) = slow_invoker();
        let surface = staged_surface();

        let (a, b, c, d) = tokio::join!(
            invoker.detect(&surface),
            invoker.detect(&surface),
            invoker.detect(&surface),
            invoker.detect(&surface)
        );
        let accepted = [a, b, c, d].iter().filter(|r| r.is_ok()).count();

        assert_eq!(accepted, 1);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_call_after_rejection_succeeds() {
        let (invoker, _) = slow_invoker();
        let surface = staged_surface();

        let (_, rejected) = tokio::join!(invoker.detect(&surface), invoker.detect(&surface));
        assert!(rejected.is_err());
        assert!(invoker.detect(&surface).await.is_ok());
    }
}
