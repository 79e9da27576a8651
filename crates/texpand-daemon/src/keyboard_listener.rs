use rdev::{self, Event, EventType, Key as RdevKey, ListenError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use texpand_core::{Engine, HookError, KeyInput};
use tracing::{debug, error, info, trace};

/// rdev reports hook installation failures by returning from `listen`
/// almost immediately; a listener still running after this long is installed.
const STARTUP_WINDOW: Duration = Duration::from_millis(250);

/// Global key observer feeding an [`Engine`].
///
/// rdev offers no way to remove its hook, so [`InputTap::stop`] only stops
/// delivery. A later [`InputTap::start`] resumes it on the same hook.
pub struct InputTap {
    engine: Arc<Engine>,
    active: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
}

impl InputTap {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            active: Arc::new(AtomicBool::new(false)),
            listener: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Install the hook, or resume delivery if it is already installed
    pub fn start(&mut self) -> Result<(), HookError> {
        if self.listener.is_some() {
            if !self.active.swap(true, Ordering::SeqCst) {
                info!("Keyboard listener resumed");
            }
            return Ok(());
        }

        let (failed_tx, failed_rx) = mpsc::channel::<HookError>();
        let engine = Arc::clone(&self.engine);
        let active = Arc::clone(&self.active);
        active.store(true, Ordering::SeqCst);

        let callback = {
            let active = Arc::clone(&active);
            move |event: Event| {
                if !active.load(Ordering::Relaxed) {
                    return;
                }
                let Some(input) = translate_event(&event) else {
                    return;
                };

                // A panic must never unwind into the OS hook chain
                let handled = panic::catch_unwind(AssertUnwindSafe(|| engine.handle_key(input)));
                match handled {
                    Ok(Some(pending)) => {
                        trace!(trigger = %pending.trigger.spec.id, "Trigger matched")
                    }
                    Ok(None) => {}
                    Err(_) => error!("Key handler panicked; event dropped"),
                }
            }
        };

        let spawned = thread::Builder::new()
            .name("texpand-input-tap".to_string())
            .spawn(move || {
                debug!("Installing keyboard hook");
                let result = rdev::listen(callback);
                active.store(false, Ordering::SeqCst);

                match result {
                    Ok(()) => info!("Keyboard listener exited"),
                    Err(e) => {
                        let hook_error = hook_error(e);
                        error!("Keyboard listener failed: {}", hook_error);
                        // Only delivered if start() is still waiting
                        let _ = failed_tx.send(hook_error);
                    }
                }
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.active.store(false, Ordering::SeqCst);
                return Err(HookError::ThreadSpawn(e.to_string()));
            }
        };

        match failed_rx.recv_timeout(STARTUP_WINDOW) {
            Ok(hook_error) => {
                let _ = handle.join();
                Err(hook_error)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                info!("Keyboard listener started");
                self.listener = Some(handle);
                Ok(())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                Err(HookError::ListenFailed(
                    "keyboard listener exited during startup".to_string(),
                ))
            }
        }
    }

    /// Stop delivering events. Safe to call at any time, any number of times.
    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.engine.reset();
            info!("Keyboard listener paused");
        }
    }

    /// Block until the listener thread ends, which only happens on a hook error
    pub fn wait(&mut self) {
        if let Some(handle) = self.listener.take() {
            if handle.join().is_err() {
                error!("Keyboard listener thread panicked");
            }
        }
    }
}

fn hook_error(err: ListenError) -> HookError {
    match err {
        ListenError::EventTapError => HookError::PermissionDenied(
            "accessibility access is required to observe the keyboard".to_string(),
        ),
        ListenError::MissingDisplayError => {
            HookError::ListenFailed("no X display available".to_string())
        }
        other => HookError::ListenFailed(format!("{:?}", other)),
    }
}

/// Convert a raw rdev event into what the engine consumes.
///
/// Only key-down events matter. The character comes from the
/// layout-resolved event name, which already reflects shift and dead keys.
pub fn translate_event(event: &Event) -> Option<KeyInput> {
    let key = match event.event_type {
        EventType::KeyPress(key) => key,
        _ => return None,
    };

    match key {
        RdevKey::ShiftLeft
        | RdevKey::ShiftRight
        | RdevKey::ControlLeft
        | RdevKey::ControlRight
        | RdevKey::Alt
        | RdevKey::AltGr
        | RdevKey::MetaLeft
        | RdevKey::MetaRight => Some(KeyInput::Modifier),
        RdevKey::Escape | RdevKey::Return | RdevKey::KpReturn | RdevKey::Tab => {
            Some(KeyInput::Clear)
        }
        RdevKey::Backspace => Some(KeyInput::Backspace),
        _ => event_char(event).map(KeyInput::Char),
    }
}

fn event_char(event: &Event) -> Option<char> {
    let name = event.name.as_deref()?;
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(c),
        _ => None,
    }
}

#[cfg(test)]
#[path = "keyboard_listener_test.rs"]
mod tests;
