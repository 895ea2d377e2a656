/*!
 * Scripted translation ports for pipeline tests
 *
 * `ScriptedTranslator` implements `TranslationPort` directly, so tests can
 * control exactly what each batch call returns and observe what the pipeline
 * submitted:
 * - every call's requested ids are recorded in order
 * - concurrent calls are counted, to check that batches never overlap
 * - call N can be scripted to fail or to return a fixed reply
 * - a hook runs at the start of every call (e.g. to request a pause)
 * - a gate can hold calls until the test releases them
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, Semaphore};

use subtrans::errors::ProviderError;
use subtrans::translation::{TranslationItem, TranslationPort};

/// Hook invoked with the 1-based call number before a call is answered
pub type CallHook = Box<dyn Fn(usize) + Send + Sync>;

/// Scripted outcome of one call
pub enum Scripted {
    Reply(Vec<TranslationItem>),
    Fail(String),
}

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<Vec<u32>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    started: Notify,
    gate: Option<Semaphore>,
}

/// Observes a translator after it has been moved into a pipeline
#[derive(Clone)]
pub struct TranslatorProbe {
    shared: Arc<Shared>,
}

impl TranslatorProbe {
    /// Ids of every submitted batch, in submission order
    pub fn calls(&self) -> Vec<Vec<u32>> {
        self.shared.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.shared.calls.lock().len()
    }

    /// Highest number of calls that were running at once
    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until a call has started
    pub async fn wait_for_call(&self) {
        self.shared.started.notified().await;
    }

    /// Let `count` gated calls finish
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.shared.gate {
            gate.add_permits(count);
        }
    }
}

/// Translation port answering from a script
pub struct ScriptedTranslator {
    shared: Arc<Shared>,
    script: Mutex<HashMap<usize, Scripted>>,
    hook: Mutex<Option<CallHook>>,
    prefix: String,
}

impl ScriptedTranslator {
    /// Translates every item to `"[T] <text>"`
    pub fn new() -> Self {
        Self::with_shared(Shared::default())
    }

    /// Like `new`, but every call waits for `TranslatorProbe::release`
    pub fn gated() -> Self {
        Self::with_shared(Shared {
            gate: Some(Semaphore::new(0)),
            ..Shared::default()
        })
    }

    fn with_shared(shared: Shared) -> Self {
        Self {
            shared: Arc::new(shared),
            script: Mutex::new(HashMap::new()),
            hook: Mutex::new(None),
            prefix: "[T] ".to_string(),
        }
    }

    pub fn probe(&self) -> TranslatorProbe {
        TranslatorProbe {
            shared: self.shared.clone(),
        }
    }

    /// Script the outcome of the 1-based call `call`
    pub fn script(self, call: usize, outcome: Scripted) -> Self {
        self.script.lock().insert(call, outcome);
        self
    }

    /// Make the 1-based call `call` fail
    pub fn fail_on(self, call: usize) -> Self {
        self.script(call, Scripted::Fail(format!("scripted failure on call {}", call)))
    }

    /// Run `hook` at the start of every call
    pub fn set_hook(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }

    /// Text this translator produces for `text`
    pub fn translated(&self, text: &str) -> String {
        format!("{}{}", self.prefix, text)
    }

    // Keeps the in-flight counter right even if the call future is dropped
    fn enter(&self) -> InFlight<'_> {
        let now = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.shared)
    }
}

impl Default for ScriptedTranslator {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlight<'a>(&'a Shared);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TranslationPort for ScriptedTranslator {
    async fn translate(&self, items: &[TranslationItem]) -> Result<Vec<TranslationItem>, ProviderError> {
        let _in_flight = self.enter();
        let call = {
            let mut calls = self.shared.calls.lock();
            calls.push(items.iter().map(|item| item.id).collect());
            calls.len()
        };

        {
            let hook = self.hook.lock();
            if let Some(hook) = hook.as_ref() {
                hook(call);
            }
        }
        self.shared.started.notify_one();

        if let Some(gate) = &self.shared.gate {
            gate.acquire()
                .await
                .map_err(|e| ProviderError::ConnectionError(e.to_string()))?
                .forget();
        }
        tokio::task::yield_now().await;

        let scripted = self.script.lock().remove(&call);
        match scripted {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(message)) => Err(ProviderError::ApiError {
                status_code: 500,
                message,
            }),
            None => Ok(items
                .iter()
                .map(|item| TranslationItem::new(item.id, self.translated(&item.text)))
                .collect()),
        }
    }
}
