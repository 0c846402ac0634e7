use anyhow::Result;
use futures_util::stream::{self, Stream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Polls for an external capability until it shows up or the owner goes away.
pub struct ReadinessGate;

impl ReadinessGate {
    /// Sets up a poll of `probe` every `poll_interval`.
    ///
    /// The handle belongs to the owning view. The poll is driven by whoever
    /// runs the view's async work; it ticks immediately, yields `true` once
    /// the probe reports the capability, and then ends. Disposing or dropping
    /// the handle ends it too, ready or not.
    pub fn observe<P>(probe: P, poll_interval: Duration) -> (ReadinessHandle, ReadinessPoll)
    where
        P: Fn() -> Result<bool> + Send + Sync + 'static,
    {
        let ready = Arc::new(AtomicBool::new(false));
        let token = CancellationToken::new();

        let handle = ReadinessHandle {
            ready: ready.clone(),
            token: token.clone(),
        };
        let poll = ReadinessPoll {
            probe: Box::new(probe),
            poll_interval,
            ready,
            token,
        };
        (handle, poll)
    }
}

pub struct ReadinessHandle {
    ready: Arc<AtomicBool>,
    token: CancellationToken,
}

impl ReadinessHandle {
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn dispose(&self) {
        self.token.cancel();
    }

    #[allow(dead_code)]
    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ReadinessHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

type Probe = Box<dyn Fn() -> Result<bool> + Send + Sync>;

pub struct ReadinessPoll {
    probe: Probe,
    poll_interval: Duration,
    ready: Arc<AtomicBool>,
    token: CancellationToken,
}

struct PollState {
    probe: Probe,
    ticker: Interval,
    ready: Arc<AtomicBool>,
    token: CancellationToken,
    done: bool,
}

impl ReadinessPoll {
    /// Must be polled inside a tokio runtime, the interval is created lazily
    /// on the first poll.
    pub fn into_stream(self) -> impl Stream<Item = bool> + Send + 'static {
        let ReadinessPoll {
            probe,
            poll_interval,
            ready,
            token,
        } = self;
        let mut init = Some((probe, ready, token));

        stream::unfold(None::<PollState>, move |state| {
            let state = state.or_else(|| {
                init.take().map(|(probe, ready, token)| {
                    let mut ticker = time::interval(poll_interval);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    PollState {
                        probe,
                        ticker,
                        ready,
                        token,
                        done: false,
                    }
                })
            });
            async move {
                let mut state = state?;
                if state.done {
                    return None;
                }
                loop {
                    tokio::select! {
                        _ = state.token.cancelled() => {
                            tracing::debug!("readiness poll disposed");
                            return None;
                        }
                        _ = state.ticker.tick() => {}
                    }

                    match (state.probe)() {
                        Ok(true) => {
                            state.ready.store(true, Ordering::Release);
                            state.done = true;
                            return Some((true, Some(state)));
                        }
                        Ok(false) => {}
                        Err(e) => tracing::debug!(error = %e, "readiness probe failed, retrying"),
                    }
                }
            }
        })
    }

    /// Drives the poll to completion, discarding the signal.
    #[allow(dead_code)]
    pub async fn run(self) {
        use futures_util::StreamExt;

        let stream = self.into_stream();
        futures_util::pin_mut!(stream);
        while stream.next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::AtomicUsize;

    fn counting_probe(
        ready_after: usize,
    ) -> (Arc<AtomicUsize>, impl Fn() -> Result<bool> + Send + Sync + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let probe = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(n >= ready_after)
        };
        (calls, probe)
    }

    #[tokio::test(start_paused = true)]
    async fn becomes_ready_once_probe_succeeds() {
        let (calls, probe) = counting_probe(3);
        let (handle, poll) = ReadinessGate::observe(probe, Duration::from_millis(300));
        let task = tokio::spawn(poll.run());

        tokio::task::yield_now().await;
        assert!(!handle.is_ready());

        time::sleep(Duration::from_millis(650)).await;
        task.await.unwrap();

        assert!(handle.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_polling_after_ready() {
        let (calls, probe) = counting_probe(1);
        let (handle, poll) = ReadinessGate::observe(probe, Duration::from_millis(300));
        poll.run().await;

        time::sleep(Duration::from_secs(5)).await;
        assert!(handle.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_errors_count_as_not_ready() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let probe = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(anyhow!("not loaded"))
            } else {
                Ok(true)
            }
        };
        let (handle, poll) = ReadinessGate::observe(probe, Duration::from_millis(300));
        poll.run().await;

        assert!(handle.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_stops_polling_before_ready() {
        let (calls, probe) = counting_probe(usize::MAX);
        let (handle, poll) = ReadinessGate::observe(probe, Duration::from_millis(300));
        let task = tokio::spawn(poll.run());

        time::sleep(Duration::from_millis(1000)).await;
        handle.dispose();
        task.await.unwrap();

        let seen = calls.load(Ordering::SeqCst);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), seen);
        assert!(!handle.is_ready());
        assert!(handle.is_disposed());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_ends_poll() {
        let (_calls, probe) = counting_probe(usize::MAX);
        let (handle, poll) = ReadinessGate::observe(probe, Duration::from_millis(300));
        let task = tokio::spawn(poll.run());

        time::sleep(Duration::from_millis(400)).await;
        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stream_yields_single_signal() {
        use futures_util::StreamExt;

        let (_calls, probe) = counting_probe(2);
        let (_handle, poll) = ReadinessGate::observe(probe, Duration::from_millis(300));
        let signals: Vec<bool> = poll.into_stream().collect().await;
        assert_eq!(signals, vec![true]);
    }
}
