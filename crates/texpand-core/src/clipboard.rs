use crate::error::{Result, TexpandError};
use crate::keyboard::InputInjector;
use arboard::{Clipboard, ImageData};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long to wait for the foreground app to honour a synthetic copy
const COPY_WAIT_MS: u64 = 250;
const COPY_POLL_MS: u64 = 25;

/// Access to a clipboard
pub trait ClipboardAccess: Send + Sync {
    /// `Ok(None)` when the clipboard is empty or holds non-text content
    fn get_text(&self) -> Result<Option<String>>;
    fn set_text(&self, text: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;

    /// `Ok(None)` when the clipboard holds no image
    fn get_image(&self) -> Result<Option<ImageData<'static>>> {
        Ok(None)
    }

    fn set_image(&self, _image: ImageData<'static>) -> Result<()> {
        Ok(())
    }
}

/// The OS clipboard through arboard
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

fn open_clipboard() -> Result<Clipboard> {
    Clipboard::new().map_err(|e| TexpandError::Clipboard(e.to_string()))
}

impl ClipboardAccess for SystemClipboard {
    fn get_text(&self) -> Result<Option<String>> {
        match open_clipboard()?.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(TexpandError::Clipboard(e.to_string())),
        }
    }

    fn set_text(&self, text: &str) -> Result<()> {
        open_clipboard()?
            .set_text(text)
            .map_err(|e| TexpandError::Clipboard(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        open_clipboard()?
            .clear()
            .map_err(|e| TexpandError::Clipboard(e.to_string()))
    }

    fn get_image(&self) -> Result<Option<ImageData<'static>>> {
        match open_clipboard()?.get_image() {
            Ok(image) => Ok(Some(image)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(TexpandError::Clipboard(e.to_string())),
        }
    }

    fn set_image(&self, image: ImageData<'static>) -> Result<()> {
        open_clipboard()?
            .set_image(image)
            .map_err(|e| TexpandError::Clipboard(e.to_string()))
    }
}

/// Saved clipboard content, restored after a transient change
#[derive(Debug, Clone)]
pub enum ClipboardSnapshot {
    Text(String),
    Image(ImageData<'static>),
    Empty,
}

#[derive(Clone)]
pub struct ClipboardBridge {
    access: Arc<dyn ClipboardAccess>,
    copy_wait: Duration,
}

impl ClipboardBridge {
    pub fn new(access: Arc<dyn ClipboardAccess>) -> Self {
        Self {
            access,
            copy_wait: Duration::from_millis(COPY_WAIT_MS),
        }
    }

    pub fn with_copy_wait(mut self, copy_wait: Duration) -> Self {
        self.copy_wait = copy_wait;
        self
    }

    /// Current clipboard text; empty/non-text/unavailable all read as `None`
    pub fn text(&self) -> Option<String> {
        match self.access.get_text() {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not read clipboard: {}", e);
                None
            }
        }
    }

    pub fn set_text(&self, text: &str) -> Result<()> {
        self.access.set_text(text)
    }

    /// Fails rather than report an unreadable clipboard as empty, so a
    /// later restore never wipes content it could not see
    pub fn save(&self) -> Result<ClipboardSnapshot> {
        if let Some(text) = self.access.get_text()? {
            return Ok(ClipboardSnapshot::Text(text));
        }
        Ok(match self.access.get_image()? {
            Some(image) => ClipboardSnapshot::Image(image),
            None => ClipboardSnapshot::Empty,
        })
    }

    pub fn restore(&self, snapshot: ClipboardSnapshot) -> Result<()> {
        match snapshot {
            ClipboardSnapshot::Text(text) => self.access.set_text(&text),
            ClipboardSnapshot::Image(image) => self.access.set_image(image),
            ClipboardSnapshot::Empty => self.access.clear(),
        }
    }

    /// Read the foreground selection by round-tripping it through the
    /// clipboard: save, clear, copy, read, restore.
    ///
    /// Any failing step yields `None`; the original clipboard is restored
    /// whenever it was successfully saved.
    pub fn capture_selection(&self, injector: &InputInjector) -> Option<String> {
        let saved = match self.save() {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Selection capture aborted, clipboard unreadable: {}", e);
                return None;
            }
        };

        let captured = self.copy_selection(injector);

        if let Err(e) = self.restore(saved) {
            warn!("Failed to restore clipboard after selection capture: {}", e);
        }

        captured
    }

    fn copy_selection(&self, injector: &InputInjector) -> Option<String> {
        if let Err(e) = self.access.clear() {
            warn!("Selection capture aborted, clipboard not cleared: {}", e);
            return None;
        }

        if !injector.simulate_copy() {
            return None;
        }

        let deadline = Instant::now() + self.copy_wait;
        loop {
            match self.access.get_text() {
                Ok(Some(text)) if !text.is_empty() => {
                    debug!(chars = text.chars().count(), "Captured selection");
                    return Some(text);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Clipboard read failed during selection capture: {}", e);
                    return None;
                }
            }

            if Instant::now() >= deadline {
                debug!("Nothing landed on the clipboard after copy");
                return None;
            }
            thread::sleep(Duration::from_millis(COPY_POLL_MS));
        }
    }
}

#[cfg(test)]
#[path = "clipboard_test.rs"]
mod tests;
