use std::sync::Arc;

use crate::run::{ComparisonRun, PageProgress};

/// Where the current comparison stands.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Phase {
    #[default]
    Idle,
    /// `None` until the first page finishes.
    Running(Option<PageProgress>),
    Completed,
    Failed(String),
    Cancelled,
}

#[derive(Debug)]
pub enum SessionEvent {
    Started,
    Progressed(PageProgress),
    Finished(ComparisonRun),
    Aborted(String),
    Cancelled,
}

/// Comparison state for one interactive session.
///
/// `last_completed` only changes when a run finishes, so a failed or
/// cancelled run never hides the previous results.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: Phase,
    pub last_completed: Option<Arc<ComparisonRun>>,
}

pub fn reduce(state: SessionState, event: SessionEvent) -> SessionState {
    let SessionState {
        phase,
        last_completed,
    } = state;

    match (phase, event) {
        (_, SessionEvent::Started) => SessionState {
            phase: Phase::Running(None),
            last_completed,
        },
        (Phase::Running(_), SessionEvent::Progressed(p)) => SessionState {
            phase: Phase::Running(Some(p)),
            last_completed,
        },
        (Phase::Running(_), SessionEvent::Finished(run)) => SessionState {
            phase: Phase::Completed,
            last_completed: Some(Arc::new(run)),
        },
        (Phase::Running(_), SessionEvent::Aborted(message)) => SessionState {
            phase: Phase::Failed(message),
            last_completed,
        },
        (Phase::Running(_), SessionEvent::Cancelled) => SessionState {
            phase: Phase::Cancelled,
            last_completed,
        },
        // Late events from a run that is no longer current.
        (phase, _) => SessionState {
            phase,
            last_completed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::PixelBuffer;
    use crate::document::Document;
    use crate::run::{CancelFlag, RunRequest, run_comparison};

    struct Blank(u32);

    impl Document for Blank {
        fn page_count(&self) -> u32 {
            self.0
        }

        async fn render_page(&self, _page: u32, _scale: f64) -> anyhow::Result<PixelBuffer> {
            Ok(PixelBuffer::from_pixel(12, 12, image::Rgba([255, 255, 255, 255])))
        }
    }

    async fn run_of(pages: u32) -> ComparisonRun {
        let request = RunRequest {
            scale: 1.0,
            offset: Default::default(),
            page_ceiling: None,
        };
        run_comparison(&Blank(pages), &Blank(pages), &request, &CancelFlag::new(), |_, _| {})
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn finished_run_becomes_last_completed() {
        let s = reduce(SessionState::default(), SessionEvent::Started);
        assert_eq!(s.phase, Phase::Running(None));
        let s = reduce(s, SessionEvent::Progressed(PageProgress { page: 1, total: 2 }));
        assert_eq!(s.phase, Phase::Running(Some(PageProgress { page: 1, total: 2 })));

        let s = reduce(s, SessionEvent::Finished(run_of(2).await));
        assert_eq!(s.phase, Phase::Completed);
        assert_eq!(s.last_completed.as_ref().unwrap().pages().len(), 2);
    }

    #[tokio::test]
    async fn failure_keeps_previous_results() {
        let s = reduce(SessionState::default(), SessionEvent::Started);
        let s = reduce(s, SessionEvent::Finished(run_of(3).await));

        let s = reduce(s, SessionEvent::Started);
        let s = reduce(s, SessionEvent::Progressed(PageProgress { page: 1, total: 5 }));
        let s = reduce(s, SessionEvent::Aborted("page 2 failed".into()));

        assert_eq!(s.phase, Phase::Failed("page 2 failed".into()));
        assert_eq!(s.last_completed.as_ref().unwrap().pages().len(), 3);
    }

    #[tokio::test]
    async fn cancel_keeps_previous_results() {
        let s = reduce(SessionState::default(), SessionEvent::Started);
        let s = reduce(s, SessionEvent::Finished(run_of(1).await));
        let s = reduce(s, SessionEvent::Started);
        let s = reduce(s, SessionEvent::Cancelled);
        assert_eq!(s.phase, Phase::Cancelled);
        assert!(s.last_completed.is_some());
    }

    #[tokio::test]
    async fn events_outside_a_run_are_ignored() {
        let s = reduce(SessionState::default(), SessionEvent::Finished(run_of(1).await));
        assert_eq!(s.phase, Phase::Idle);
        assert!(s.last_completed.is_none());

        let s = reduce(s, SessionEvent::Progressed(PageProgress { page: 1, total: 1 }));
        assert_eq!(s.phase, Phase::Idle);
    }
}
