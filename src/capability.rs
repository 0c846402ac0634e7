use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::{Arc, RwLock, RwLockReadGuard};

/// An AI chat service that answers a single prompt.
///
/// The payload is handed back exactly as the service produced it; turning it
/// into display text is the dispatcher's job.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, prompt: &str) -> Result<Value>;

    fn name(&self) -> &str;
}

static GLOBAL: Lazy<Arc<CapabilitySlot>> = Lazy::new(|| Arc::new(CapabilitySlot::new()));

/// Where the AI backend shows up once it has been reached.
///
/// Starts empty. The first install wins and nothing is ever removed, so an
/// observer that saw it available keeps seeing it available.
#[derive(Default)]
pub struct CapabilitySlot {
    backend: RwLock<Option<Arc<dyn ChatBackend>>>,
}

impl CapabilitySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide slot shared by the connector and every tool view.
    pub fn global() -> Arc<CapabilitySlot> {
        GLOBAL.clone()
    }

    /// Returns false if a backend was already installed.
    pub fn install(&self, backend: Arc<dyn ChatBackend>) -> bool {
        let mut slot = match self.backend.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_some() {
            return false;
        }
        tracing::info!(backend = backend.name(), "AI backend available");
        *slot = Some(backend);
        true
    }

    pub fn get(&self) -> Option<Arc<dyn ChatBackend>> {
        self.read().clone()
    }

    pub fn is_available(&self) -> bool {
        self.read().is_some()
    }

    // The slot only ever goes from empty to filled, so a panic while holding
    // the lock cannot leave it half written.
    fn read(&self) -> RwLockReadGuard<'_, Option<Arc<dyn ChatBackend>>> {
        self.backend.read().unwrap_or_else(|poisoned| {
            tracing::warn!("capability slot lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use anyhow::anyhow;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    /// Scripted backend: pops one reply per call, counts calls, and can hold
    /// every call until the test releases it.
    pub struct FakeBackend {
        replies: Mutex<VecDeque<Result<Value, String>>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
        gate: Option<Semaphore>,
    }

    impl FakeBackend {
        pub fn replying(replies: Vec<Result<Value, String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                gate: None,
            })
        }

        pub fn text(reply: &str) -> Arc<Self> {
            Self::replying(vec![Ok(Value::String(reply.to_string()))])
        }

        /// Calls block until `release` is called once per call.
        pub fn held(replies: Vec<Result<Value, String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                gate: Some(Semaphore::new(0)),
            })
        }

        pub fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.add_permits(1);
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn chat(&self, prompt: &str) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(gate) = &self.gate {
                gate.acquire().await?.forget();
            }
            let reply = self.replies.lock().unwrap().pop_front();
            match reply {
                Some(Ok(value)) => Ok(value),
                Some(Err(message)) => Err(anyhow!(message)),
                None => Ok(Value::Null),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    pub fn slot_with(backend: Arc<FakeBackend>) -> Arc<CapabilitySlot> {
        let slot = Arc::new(CapabilitySlot::new());
        slot.install(backend);
        slot
    }
}
