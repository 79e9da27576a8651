// Tests for the clipboard bridge with an in-memory clipboard

use super::*;
use crate::keyboard::{InjectorConfig, KeyBackend, KeyDirection, KeySink, SynthKey};
use parking_lot::Mutex;
use std::borrow::Cow;

/// In-memory clipboard; `on_copy` simulates what the foreground app would
/// place on the clipboard when it receives the copy chord.
#[derive(Default)]
struct MemoryClipboard {
    content: Mutex<Option<String>>,
    image: Mutex<Option<ImageData<'static>>>,
    fail_reads: bool,
}

impl ClipboardAccess for MemoryClipboard {
    fn get_text(&self) -> Result<Option<String>> {
        if self.fail_reads {
            return Err(TexpandError::Clipboard("locked".to_string()));
        }
        Ok(self.content.lock().clone())
    }

    fn set_text(&self, text: &str) -> Result<()> {
        *self.content.lock() = Some(text.to_string());
        *self.image.lock() = None;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.content.lock() = None;
        *self.image.lock() = None;
        Ok(())
    }

    fn get_image(&self) -> Result<Option<ImageData<'static>>> {
        Ok(self.image.lock().clone())
    }

    fn set_image(&self, image: ImageData<'static>) -> Result<()> {
        *self.content.lock() = None;
        *self.image.lock() = Some(image);
        Ok(())
    }
}

/// Key backend that "copies" `selection` into the clipboard on Ctrl/Cmd+C
struct CopyingBackend {
    clipboard: Arc<MemoryClipboard>,
    selection: Option<String>,
    fail: bool,
}

struct CopyingSink {
    clipboard: Arc<MemoryClipboard>,
    selection: Option<String>,
}

impl KeySink for CopyingSink {
    fn key(&mut self, key: SynthKey, direction: KeyDirection) -> Result<()> {
        if key == SynthKey::Char('c') && direction == KeyDirection::Press {
            if let Some(selection) = &self.selection {
                self.clipboard.set_text(selection)?;
            }
        }
        Ok(())
    }

    fn char(&mut self, _c: char) -> Result<()> {
        Ok(())
    }
}

impl KeyBackend for CopyingBackend {
    fn open(&self) -> Result<Box<dyn KeySink>> {
        if self.fail {
            return Err(TexpandError::Enigo("no display".to_string()));
        }
        Ok(Box::new(CopyingSink {
            clipboard: Arc::clone(&self.clipboard),
            selection: self.selection.clone(),
        }))
    }
}

fn setup(
    original: Option<&str>,
    selection: Option<&str>,
    fail_copy: bool,
) -> (ClipboardBridge, InputInjector, Arc<MemoryClipboard>) {
    let clipboard = Arc::new(MemoryClipboard {
        content: Mutex::new(original.map(str::to_string)),
        ..MemoryClipboard::default()
    });
    let backend = CopyingBackend {
        clipboard: Arc::clone(&clipboard),
        selection: selection.map(str::to_string),
        fail: fail_copy,
    };
    let bridge = ClipboardBridge::new(clipboard.clone()).with_copy_wait(Duration::from_millis(30));
    let injector = InputInjector::new(Arc::new(backend), InjectorConfig::immediate());
    (bridge, injector, clipboard)
}

#[test]
fn test_capture_selection_restores_clipboard() {
    let (bridge, injector, clipboard) = setup(Some("keep me"), Some("selected words"), false);

    assert_eq!(
        bridge.capture_selection(&injector),
        Some("selected words".to_string())
    );
    assert_eq!(clipboard.content.lock().as_deref(), Some("keep me"));
}

#[test]
fn test_capture_selection_nothing_selected() {
    let (bridge, injector, clipboard) = setup(Some("keep me"), None, false);

    assert_eq!(bridge.capture_selection(&injector), None);
    assert_eq!(clipboard.content.lock().as_deref(), Some("keep me"));
}

#[test]
fn test_capture_selection_copy_fails() {
    let (bridge, injector, clipboard) = setup(None, Some("x"), true);

    assert_eq!(bridge.capture_selection(&injector), None);
    assert_eq!(*clipboard.content.lock(), None);
}

#[test]
fn test_capture_selection_unreadable_clipboard() {
    let clipboard = Arc::new(MemoryClipboard {
        content: Mutex::new(Some("untouched".to_string())),
        fail_reads: true,
        ..MemoryClipboard::default()
    });
    let bridge = ClipboardBridge::new(clipboard.clone());
    let injector = InputInjector::new(
        Arc::new(CopyingBackend {
            clipboard: Arc::clone(&clipboard),
            selection: Some("x".to_string()),
            fail: false,
        }),
        InjectorConfig::immediate(),
    );

    assert_eq!(bridge.capture_selection(&injector), None);
    assert_eq!(clipboard.content.lock().as_deref(), Some("untouched"));
    assert_eq!(bridge.text(), None);
}

#[test]
fn test_save_and_restore() {
    let (bridge, _injector, clipboard) = setup(Some("before"), None, false);

    let snapshot = bridge.save().unwrap();
    bridge.set_text("during").unwrap();
    assert_eq!(bridge.text().as_deref(), Some("during"));

    bridge.restore(snapshot).unwrap();
    assert_eq!(clipboard.content.lock().as_deref(), Some("before"));
}

#[test]
fn test_capture_selection_keeps_copied_image() {
    let (bridge, injector, clipboard) = setup(None, Some("selected words"), false);
    clipboard
        .set_image(ImageData {
            width: 1,
            height: 1,
            bytes: Cow::Owned(vec![255, 0, 0, 255]),
        })
        .unwrap();

    assert_eq!(
        bridge.capture_selection(&injector),
        Some("selected words".to_string())
    );

    let image = clipboard.image.lock().clone().unwrap();
    assert_eq!((image.width, image.height), (1, 1));
    assert_eq!(&image.bytes[..], &[255u8, 0, 0, 255][..]);
    assert_eq!(*clipboard.content.lock(), None);
}
