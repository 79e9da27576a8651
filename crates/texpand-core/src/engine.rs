//! The auto-expansion engine.
//!
//! Key events from the hook feed [`Engine::handle_key`], which updates the
//! typed buffer and arms the debounce timer on a match. When the timer fires
//! the expansion runs on the scheduler thread: secure-field gate, variable
//! resolution, delete-and-insert injection, usage report.
//!
//! Buffer and pending expansion share one lock that is only held for field
//! updates. The trigger snapshot is swapped whole behind its own lock.

use crate::buffer::TypedBuffer;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::keyboard::InputInjector;
use crate::matcher::{Trigger, TriggerSnapshot};
use crate::models::ActiveTrigger;
use crate::scheduler::Scheduler;
use crate::secure::SecureContextDetector;
use crate::storage::{TriggerSource, UsageSink};
use crate::variables::{self, Prompter, ResolveMode, VariableSources};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long typed-out characters may take to come back through the hook
const ECHO_WINDOW: Duration = Duration::from_millis(1000);

/// A key event after translation by the input tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A printable character was produced
    Char(char),
    Backspace,
    /// Escape, Enter or Tab
    Clear,
    /// Shift, Ctrl, Alt or Meta went down
    Modifier,
}

/// A matched trigger waiting out the debounce delay
#[derive(Debug, Clone)]
pub struct PendingExpansion {
    pub trigger: Arc<Trigger>,
    pub matched_length: usize,
    pub scheduled_at: Instant,
    generation: u64,
}

/// The resolved unit of work handed to the injector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionRequest {
    pub delete_count: usize,
    pub replacement_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionOutcome {
    Expanded { trigger_id: String, deleted: usize },
    /// Aborted because the focused control looks like a password field
    SecureContext,
    InjectionFailed { trigger_id: String },
    /// The pending record was superseded before the timer got to it
    Stale,
}

/// OS-facing collaborators the engine drives
#[derive(Clone)]
pub struct EngineServices {
    pub injector: InputInjector,
    pub sources: Arc<dyn VariableSources + Send + Sync>,
    pub secure: SecureContextDetector,
    pub usage: Arc<dyn UsageSink>,
}

struct EngineState {
    buffer: TypedBuffer,
    pending: Option<PendingExpansion>,
    generation: u64,
    echo: Echo,
}

/// Characters the engine typed that the hook has not reported back yet.
///
/// Hooks deliver synthetic input asynchronously, often after the injector
/// call has returned. Only the next expected character is absorbed, and
/// anything left over is forgotten once the window closes.
#[derive(Debug, Default)]
struct Echo {
    chars: VecDeque<char>,
    until: Option<Instant>,
}

impl Echo {
    fn expect(&mut self, text: &str, until: Instant) {
        // Control characters come back as Return/Tab key events, not chars
        self.chars = text.chars().filter(|c| !c.is_control()).collect();
        self.until = Some(until);
    }

    fn hold_until(&mut self, until: Instant) {
        if !self.chars.is_empty() {
            self.until = Some(until);
        }
    }

    /// Consume `c` if it is the next character the engine typed
    fn absorb(&mut self, c: char, now: Instant) -> bool {
        match self.until {
            Some(until) if now <= until => {}
            _ => {
                self.clear();
                return false;
            }
        }

        if self.chars.front() != Some(&c) {
            return false;
        }
        self.chars.pop_front();
        if self.chars.is_empty() {
            self.until = None;
        }
        true
    }

    fn clear(&mut self) {
        self.chars.clear();
        self.until = None;
    }
}

struct EngineInner {
    config: RwLock<EngineConfig>,
    state: Mutex<EngineState>,
    snapshot: RwLock<Arc<TriggerSnapshot>>,
    /// Set while the engine is typing, so its own events are not observed
    injecting: AtomicBool,
    services: EngineServices,
}

pub struct Engine {
    inner: Arc<EngineInner>,
    scheduler: Scheduler,
}

/// Clears the injecting flag even if resolution or injection panics
struct InjectingGuard<'a>(&'a AtomicBool);

impl<'a> InjectingGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InjectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Engine {
    pub fn new(config: EngineConfig, services: EngineServices) -> Result<Self> {
        config.validate()?;

        let inner = Arc::new(EngineInner {
            state: Mutex::new(EngineState {
                buffer: TypedBuffer::new(config.max_buffer_size),
                pending: None,
                generation: 0,
                echo: Echo::default(),
            }),
            config: RwLock::new(config),
            snapshot: RwLock::new(Arc::new(TriggerSnapshot::empty())),
            injecting: AtomicBool::new(false),
            services,
        });

        let weak: Weak<EngineInner> = Arc::downgrade(&inner);
        let scheduler = Scheduler::new(move |generation| {
            if let Some(inner) = weak.upgrade() {
                inner.fire(generation);
            }
        })?;

        Ok(Self { inner, scheduler })
    }

    /// Process one key event from the hook.
    ///
    /// Never blocks on I/O. Returns the newly scheduled expansion, if this
    /// event produced a match.
    pub fn handle_key(&self, input: KeyInput) -> Option<PendingExpansion> {
        let injecting = self.inner.injecting.load(Ordering::SeqCst);
        if injecting && !matches!(input, KeyInput::Char(_)) {
            return None;
        }

        let (delay, capacity) = {
            let config = self.inner.config.read();
            (
                Duration::from_millis(config.trigger_delay_ms),
                config.max_buffer_size,
            )
        };
        let snapshot = Arc::clone(&*self.inner.snapshot.read());

        let mut state = self.inner.state.lock();

        if let KeyInput::Char(c) = input {
            if state.echo.absorb(c, Instant::now()) || injecting {
                return None;
            }
        }

        // Any keystroke supersedes whatever was pending
        if state.pending.take().is_some() {
            self.scheduler.cancel();
        }

        match input {
            KeyInput::Clear | KeyInput::Modifier => {
                state.buffer.clear();
                None
            }
            KeyInput::Backspace => {
                state.buffer.pop();
                None
            }
            KeyInput::Char(c) => {
                if state.buffer.capacity() != capacity {
                    state.buffer.set_capacity(capacity);
                }
                state.buffer.push(c);

                let found = snapshot.find_match(&state.buffer)?;
                state.generation += 1;

                let pending = PendingExpansion {
                    trigger: found.trigger,
                    matched_length: found.matched_length,
                    scheduled_at: Instant::now(),
                    generation: state.generation,
                };
                state.pending = Some(pending.clone());
                self.scheduler.arm(pending.generation, delay);
                Some(pending)
            }
        }
    }

    /// Swap in a new trigger set; returns how many triggers are active
    pub fn replace_triggers(&self, triggers: Vec<ActiveTrigger>) -> usize {
        let snapshot = Arc::new(TriggerSnapshot::build(triggers));
        let count = snapshot.len();
        *self.inner.snapshot.write() = snapshot;
        info!(count, "Trigger snapshot replaced");
        count
    }

    /// Reload the trigger set from a source
    pub fn reload(&self, source: &dyn TriggerSource) -> Result<usize> {
        let triggers = source.list_active_triggers()?;
        Ok(self.replace_triggers(triggers))
    }

    pub fn trigger_count(&self) -> usize {
        self.inner.snapshot.read().len()
    }

    pub fn config(&self) -> EngineConfig {
        self.inner.config.read().clone()
    }

    /// Apply new settings; delay, secure gate and buffer cap take effect
    /// on the next operation that consults them
    pub fn update_config(&self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        let capacity = config.max_buffer_size;
        *self.inner.config.write() = config;
        self.inner.state.lock().buffer.set_capacity(capacity);
        Ok(())
    }

    pub fn pending(&self) -> Option<PendingExpansion> {
        self.inner.state.lock().pending.clone()
    }

    pub fn buffer_len(&self) -> usize {
        self.inner.state.lock().buffer.len()
    }

    /// Drop buffered characters and any pending expansion
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        state.buffer.clear();
        state.echo.clear();
        if state.pending.take().is_some() {
            self.scheduler.cancel();
        }
    }

    /// Resolve a template for display without any clipboard or prompt I/O
    pub fn preview(&self, template: &str) -> String {
        variables::preview(template, self.inner.services.sources.as_ref())
    }

    /// Resolve a template on request; `{input:...}` asks the prompter
    pub fn render(&self, template: &str, prompter: &dyn Prompter) -> String {
        variables::expand(
            template,
            self.inner.services.sources.as_ref(),
            ResolveMode::Interactive(prompter),
        )
    }

    /// Run the pending expansion immediately instead of waiting for the timer
    pub fn fire_pending(&self) -> ExpansionOutcome {
        let generation = match self.inner.state.lock().pending.as_ref() {
            Some(pending) => pending.generation,
            None => return ExpansionOutcome::Stale,
        };
        self.scheduler.cancel();
        self.inner.fire(generation)
    }
}

impl EngineInner {
    fn fire(&self, generation: u64) -> ExpansionOutcome {
        let pending = {
            let mut state = self.state.lock();
            match &state.pending {
                Some(p) if p.generation == generation => state.pending.take(),
                _ => None,
            }
        };

        match pending {
            Some(pending) => self.expand(pending),
            None => {
                debug!(generation, "Timer fired for a superseded match");
                ExpansionOutcome::Stale
            }
        }
    }

    fn expand(&self, pending: PendingExpansion) -> ExpansionOutcome {
        let trigger_id = pending.trigger.spec.id.clone();

        let deleted = {
            let _injecting = InjectingGuard::set(&self.injecting);
            let enable_in_secure_fields = self.config.read().enable_in_secure_fields;

            if !enable_in_secure_fields && self.services.secure.is_secure_context() {
                info!(trigger = %trigger_id, "Skipping expansion in secure field");
                self.clear_buffer();
                return ExpansionOutcome::SecureContext;
            }

            let request = ExpansionRequest {
                delete_count: pending.matched_length,
                replacement_text: variables::expand(
                    &pending.trigger.template,
                    self.services.sources.as_ref(),
                    ResolveMode::Automatic,
                ),
            };

            self.state
                .lock()
                .echo
                .expect(&request.replacement_text, Instant::now() + ECHO_WINDOW);

            let injected = self
                .services
                .injector
                .replace_text(request.delete_count, &request.replacement_text);

            {
                let mut state = self.state.lock();
                state.buffer.clear();
                state.echo.hold_until(Instant::now() + ECHO_WINDOW);
            }

            if !injected {
                warn!(trigger = %trigger_id, "Expansion injection incomplete");
                return ExpansionOutcome::InjectionFailed { trigger_id };
            }
            request.delete_count
        };

        info!(trigger = %trigger_id, deleted, "Expanded trigger");
        self.services.usage.record_usage(&trigger_id);

        ExpansionOutcome::Expanded {
            trigger_id,
            deleted,
        }
    }

    fn clear_buffer(&self) {
        self.state.lock().buffer.clear();
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
