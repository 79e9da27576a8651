use crate::error::{Result, TexpandError};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay between synthetic backspaces (ms)
const KEY_DELAY_MS: u64 = 2;
/// Delay between the delete and insert phases of a replacement (ms)
const SETTLE_DELAY_MS: u64 = 10;
/// Delay after a synthetic newline so it registers before the next line (ms)
const NEWLINE_DELAY_MS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthKey {
    Backspace,
    Control,
    Meta,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Press,
    Release,
}

/// Lowest-level synthetic keyboard: individual key transitions and
/// layout-independent character insertion.
pub trait KeySink {
    fn key(&mut self, key: SynthKey, direction: KeyDirection) -> Result<()>;
    fn char(&mut self, c: char) -> Result<()>;
}

/// Opens a [`KeySink`] on the calling thread.
///
/// Platform keyboard controllers are not always `Send`, so one is opened per
/// operation on whichever thread performs the injection.
pub trait KeyBackend: Send + Sync {
    fn open(&self) -> Result<Box<dyn KeySink>>;
}

/// Create a keyboard controller
pub fn create_keyboard_controller() -> Result<Enigo> {
    Enigo::new(&Settings::default()).map_err(|err| {
        TexpandError::Enigo(format!("Failed to create keyboard controller: {}", err))
    })
}

pub struct EnigoSink {
    enigo: Enigo,
}

impl EnigoSink {
    pub fn new() -> Result<Self> {
        Ok(Self {
            enigo: create_keyboard_controller()?,
        })
    }

    fn click(&mut self, key: Key) -> Result<()> {
        self.enigo
            .key(key, Direction::Click)
            .map_err(|err| TexpandError::Enigo(format!("Failed to click {:?}: {}", key, err)))
    }
}

impl KeySink for EnigoSink {
    fn key(&mut self, key: SynthKey, direction: KeyDirection) -> Result<()> {
        let key = match key {
            SynthKey::Backspace => Key::Backspace,
            SynthKey::Control => Key::Control,
            SynthKey::Meta => Key::Meta,
            SynthKey::Char(c) => Key::Unicode(c),
        };
        let direction = match direction {
            KeyDirection::Press => Direction::Press,
            KeyDirection::Release => Direction::Release,
        };

        self.enigo
            .key(key, direction)
            .map_err(|err| TexpandError::Enigo(format!("Failed to send {:?}: {}", key, err)))
    }

    fn char(&mut self, c: char) -> Result<()> {
        match c {
            '\n' => {
                self.click(Key::Return)?;
                // Small delay after newline to ensure it registers properly
                thread::sleep(Duration::from_millis(NEWLINE_DELAY_MS));
                Ok(())
            }
            '\t' => self.click(Key::Tab),
            _ => {
                let mut utf8 = [0u8; 4];
                self.enigo
                    .text(c.encode_utf8(&mut utf8))
                    .map_err(|err| TexpandError::Enigo(format!("Failed to type text: {}", err)))
            }
        }
    }
}

/// Backend driving the real keyboard through enigo
#[derive(Debug, Default, Clone, Copy)]
pub struct EnigoBackend;

impl KeyBackend for EnigoBackend {
    fn open(&self) -> Result<Box<dyn KeySink>> {
        Ok(Box::new(EnigoSink::new()?))
    }
}

#[derive(Debug, Clone)]
pub struct InjectorConfig {
    pub key_delay: Duration,
    pub settle_delay: Duration,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            key_delay: Duration::from_millis(KEY_DELAY_MS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
        }
    }
}

impl InjectorConfig {
    /// No pacing at all, for tests and recording backends
    pub fn immediate() -> Self {
        Self {
            key_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
        }
    }
}

/// Synthesizes typing into whatever control has focus.
///
/// Every operation reports plain success; a failure part way through is
/// logged with how far it got and never retried, since repeating would
/// duplicate keystrokes that already landed.
#[derive(Clone)]
pub struct InputInjector {
    backend: Arc<dyn KeyBackend>,
    config: InjectorConfig,
}

impl InputInjector {
    pub fn new(backend: Arc<dyn KeyBackend>, config: InjectorConfig) -> Self {
        Self { backend, config }
    }

    pub fn send_text(&self, text: &str) -> bool {
        self.run("send_text", |sink| self.type_text(sink, text))
    }

    pub fn send_backspaces(&self, count: usize) -> bool {
        self.run("send_backspaces", |sink| self.backspaces(sink, count))
    }

    /// Delete `delete_count` characters, then type `text`
    pub fn replace_text(&self, delete_count: usize, text: &str) -> bool {
        self.run("replace_text", |sink| {
            self.backspaces(sink, delete_count)?;
            pause(self.config.settle_delay);
            self.type_text(sink, text)
        })
    }

    /// Send the platform copy chord to the foreground application
    pub fn simulate_copy(&self) -> bool {
        self.run("simulate_copy", |sink| {
            let modifier = copy_modifier();
            sink.key(modifier, KeyDirection::Press)?;

            let chord = sink
                .key(SynthKey::Char('c'), KeyDirection::Press)
                .and_then(|_| sink.key(SynthKey::Char('c'), KeyDirection::Release));

            // Never leave the modifier held down
            let release = sink.key(modifier, KeyDirection::Release);
            chord.and(release)
        })
    }

    fn run<F>(&self, operation: &str, op: F) -> bool
    where
        F: FnOnce(&mut dyn KeySink) -> Result<()>,
    {
        let result = self.backend.open().and_then(|mut sink| op(sink.as_mut()));
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(operation, "Synthetic input failed: {}", e);
                false
            }
        }
    }

    fn backspaces(&self, sink: &mut dyn KeySink, count: usize) -> Result<()> {
        for sent in 0..count {
            pause(self.config.key_delay);
            sink.key(SynthKey::Backspace, KeyDirection::Press)
                .and_then(|_| sink.key(SynthKey::Backspace, KeyDirection::Release))
                .map_err(|e| partial(e, sent, count, "backspaces"))?;
        }
        Ok(())
    }

    fn type_text(&self, sink: &mut dyn KeySink, text: &str) -> Result<()> {
        let total = text.chars().filter(|c| *c != '\r').count();
        let mut sent = 0;

        for c in text.chars().filter(|c| *c != '\r') {
            sink.char(c)
                .map_err(|e| partial(e, sent, total, "characters"))?;
            sent += 1;
        }

        debug!(chars = sent, "Typed text");
        Ok(())
    }
}

fn partial(err: TexpandError, sent: usize, total: usize, what: &str) -> TexpandError {
    TexpandError::Enigo(format!("{} after {} of {} {}", err, sent, total, what))
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

fn copy_modifier() -> SynthKey {
    if cfg!(target_os = "macos") {
        SynthKey::Meta
    } else {
        SynthKey::Control
    }
}

#[cfg(test)]
#[path = "keyboard_test.rs"]
mod tests;
