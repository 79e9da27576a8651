// Tests for the input injector using a recording key backend

use super::*;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Recorded {
    Key(SynthKey, KeyDirection),
    Char(char),
}

#[derive(Default)]
struct RecordingBackend {
    events: Arc<Mutex<Vec<Recorded>>>,
    /// Index of the one attempted event that fails
    fail_after: Option<usize>,
}

struct RecordingSink {
    events: Arc<Mutex<Vec<Recorded>>>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    fn record(&mut self, event: Recorded) -> Result<()> {
        // Attempts are recorded even when they fail
        let mut events = self.events.lock();
        let index = events.len();
        events.push(event);
        if Some(index) == self.fail_after {
            return Err(TexpandError::Enigo("device gone".to_string()));
        }
        Ok(())
    }
}

impl KeySink for RecordingSink {
    fn key(&mut self, key: SynthKey, direction: KeyDirection) -> Result<()> {
        self.record(Recorded::Key(key, direction))
    }

    fn char(&mut self, c: char) -> Result<()> {
        self.record(Recorded::Char(c))
    }
}

impl KeyBackend for RecordingBackend {
    fn open(&self) -> Result<Box<dyn KeySink>> {
        Ok(Box::new(RecordingSink {
            events: Arc::clone(&self.events),
            fail_after: self.fail_after,
        }))
    }
}

struct BrokenBackend;

impl KeyBackend for BrokenBackend {
    fn open(&self) -> Result<Box<dyn KeySink>> {
        Err(TexpandError::Enigo("no display".to_string()))
    }
}

fn injector(fail_after: Option<usize>) -> (InputInjector, Arc<Mutex<Vec<Recorded>>>) {
    let backend = RecordingBackend {
        events: Arc::default(),
        fail_after,
    };
    let events = Arc::clone(&backend.events);
    (
        InputInjector::new(Arc::new(backend), InjectorConfig::immediate()),
        events,
    )
}

#[test]
fn test_replace_text_order() {
    let (injector, events) = injector(None);
    assert!(injector.replace_text(7, "user@example.com"));

    let mut expected = Vec::new();
    for _ in 0..7 {
        expected.push(Recorded::Key(SynthKey::Backspace, KeyDirection::Press));
        expected.push(Recorded::Key(SynthKey::Backspace, KeyDirection::Release));
    }
    expected.extend("user@example.com".chars().map(Recorded::Char));

    assert_eq!(*events.lock(), expected);
}

#[test]
fn test_send_text_unicode_codepoints() {
    let (injector, events) = injector(None);
    assert!(injector.send_text("héllo ✓"));
    assert_eq!(events.lock().len(), "héllo ✓".chars().count());
}

#[test]
fn test_send_text_drops_carriage_returns() {
    let (injector, events) = injector(None);
    assert!(injector.send_text("a\r\nb"));
    assert_eq!(
        *events.lock(),
        vec![Recorded::Char('a'), Recorded::Char('\n'), Recorded::Char('b')]
    );
}

#[test]
fn test_send_backspaces_zero() {
    let (injector, events) = injector(None);
    assert!(injector.send_backspaces(0));
    assert!(events.lock().is_empty());
}

#[test]
fn test_partial_failure_reports_false_without_retry() {
    let (injector, events) = injector(Some(4));
    assert!(!injector.replace_text(3, "abc"));
    // Two full backspaces, then the failed third press; nothing was re-sent
    let events = events.lock();
    assert_eq!(events.len(), 5);
    assert!(!events.iter().any(|e| matches!(e, Recorded::Char(_))));
}

#[test]
fn test_backend_unavailable() {
    let injector = InputInjector::new(Arc::new(BrokenBackend), InjectorConfig::immediate());
    assert!(!injector.send_text("x"));
    assert!(!injector.simulate_copy());
}

#[test]
fn test_simulate_copy_chord() {
    let (injector, events) = injector(None);
    assert!(injector.simulate_copy());

    let modifier = copy_modifier();
    assert_eq!(
        *events.lock(),
        vec![
            Recorded::Key(modifier, KeyDirection::Press),
            Recorded::Key(SynthKey::Char('c'), KeyDirection::Press),
            Recorded::Key(SynthKey::Char('c'), KeyDirection::Release),
            Recorded::Key(modifier, KeyDirection::Release),
        ]
    );
}

#[test]
fn test_simulate_copy_releases_modifier_on_failure() {
    let (injector, events) = injector(Some(1));
    assert!(!injector.simulate_copy());

    let modifier = copy_modifier();
    assert_eq!(
        *events.lock(),
        vec![
            Recorded::Key(modifier, KeyDirection::Press),
            Recorded::Key(SynthKey::Char('c'), KeyDirection::Press),
            Recorded::Key(modifier, KeyDirection::Release),
        ]
    );
}
