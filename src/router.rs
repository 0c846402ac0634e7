use std::time::Duration;

use crate::tools::ToolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Home,
    Tool(ToolKind),
}

/// The fixed pause shown on every view change before the new view appears.
///
/// Pure pacing: it is not tied to any loading work, and it is unrelated to
/// the readiness poll of the tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingTimer {
    generation: u64,
    delay: Duration,
}

impl PacingTimer {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[allow(dead_code)]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn elapse(self) -> u64 {
        tokio::time::sleep(self.delay).await;
        self.generation
    }
}

/// Home plus one view per tool. Home opens any tool; a tool only goes back
/// to Home.
#[derive(Debug)]
pub struct ShellRouter {
    active: ViewId,
    pacing_delay: Duration,
    generation: u64,
    pacing: bool,
}

impl ShellRouter {
    /// Starts on Home behind the pacing screen; reveal generation 0 to show it.
    pub fn new(pacing_delay: Duration) -> Self {
        Self {
            active: ViewId::Home,
            pacing_delay,
            generation: 0,
            pacing: true,
        }
    }

    pub fn initial_timer(&self) -> PacingTimer {
        PacingTimer {
            generation: 0,
            delay: self.pacing_delay,
        }
    }

    pub fn active(&self) -> ViewId {
        self.active
    }

    pub fn is_pacing(&self) -> bool {
        self.pacing
    }

    /// Returns the pacing timer for an accepted transition, `None` if the
    /// transition does not exist.
    pub fn navigate(&mut self, target: ViewId) -> Option<PacingTimer> {
        let allowed = matches!(
            (self.active, target),
            (ViewId::Home, ViewId::Tool(_)) | (ViewId::Tool(_), ViewId::Home)
        );
        if !allowed {
            tracing::debug!(from = ?self.active, to = ?target, "ignoring navigation");
            return None;
        }

        tracing::debug!(from = ?self.active, to = ?target, "navigating");
        self.active = target;
        self.generation += 1;
        self.pacing = true;
        Some(PacingTimer {
            generation: self.generation,
            delay: self.pacing_delay,
        })
    }

    pub fn back(&mut self) -> Option<PacingTimer> {
        self.navigate(ViewId::Home)
    }

    /// Ends the pacing screen if `generation` is the latest transition.
    pub fn reveal(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.pacing {
            return false;
        }
        self.pacing = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(1000);

    fn revealed() -> ShellRouter {
        let mut router = ShellRouter::new(DELAY);
        assert!(router.reveal(router.initial_timer().generation()));
        router
    }

    #[test]
    fn starts_on_home_behind_pacing() {
        let router = ShellRouter::new(DELAY);
        assert_eq!(router.active(), ViewId::Home);
        assert!(router.is_pacing());
    }

    #[test]
    fn home_opens_every_tool_and_back_returns() {
        for kind in ToolKind::ALL {
            let mut router = revealed();
            let timer = router.navigate(ViewId::Tool(kind)).unwrap();
            assert_eq!(timer.delay(), DELAY);
            assert_eq!(router.active(), ViewId::Tool(kind));
            assert!(router.is_pacing());

            assert!(router.back().is_some());
            assert_eq!(router.active(), ViewId::Home);
        }
    }

    #[test]
    fn tool_to_tool_is_rejected() {
        let mut router = revealed();
        router.navigate(ViewId::Tool(ToolKind::Compiler)).unwrap();
        assert!(router.navigate(ViewId::Tool(ToolKind::Explainer)).is_none());
        assert!(router.navigate(ViewId::Tool(ToolKind::Compiler)).is_none());
        assert_eq!(router.active(), ViewId::Tool(ToolKind::Compiler));
    }

    #[test]
    fn home_to_home_is_rejected() {
        let mut router = revealed();
        assert!(router.back().is_none());
        assert!(!router.is_pacing());
    }

    #[test]
    fn stale_reveal_is_ignored() {
        let mut router = revealed();
        let first = router.navigate(ViewId::Tool(ToolKind::Converter)).unwrap();
        let second = router.back().unwrap();

        assert!(!router.reveal(first.generation()));
        assert!(router.is_pacing());
        assert!(router.reveal(second.generation()));
        assert!(!router.is_pacing());
        assert!(!router.reveal(second.generation()));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_timer_waits_its_delay() {
        let mut router = revealed();
        let timer = router.navigate(ViewId::Tool(ToolKind::Explainer)).unwrap();
        let start = tokio::time::Instant::now();
        let generation = timer.elapse().await;
        assert!(start.elapsed() >= DELAY);
        assert!(router.reveal(generation));
    }
}
