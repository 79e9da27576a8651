// End-to-end expansion flow: snippet store -> engine -> synthetic keyboard

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;
use texpand_core::keyboard::{KeyDirection, SynthKey};
use texpand_core::{
    Engine, EngineConfig, EngineServices, ExpansionOutcome, ForegroundProbe, InjectorConfig,
    InputInjector, KeyBackend, KeyInput, KeySink, Result, SecureContextDetector, SnippetEntry,
    SnippetStore, VariableSources,
};

/// Reconstructs the text the focused control would show
#[derive(Default)]
struct Screen(Mutex<String>);

struct ScreenSink(Arc<Screen>);

impl KeySink for ScreenSink {
    fn key(&mut self, key: SynthKey, direction: KeyDirection) -> Result<()> {
        if key == SynthKey::Backspace && direction == KeyDirection::Press {
            self.0 .0.lock().pop();
        }
        Ok(())
    }

    fn char(&mut self, c: char) -> Result<()> {
        self.0 .0.lock().push(c);
        Ok(())
    }
}

struct ScreenBackend(Arc<Screen>);

impl KeyBackend for ScreenBackend {
    fn open(&self) -> Result<Box<dyn KeySink>> {
        Ok(Box::new(ScreenSink(Arc::clone(&self.0))))
    }
}

struct Clock(DateTime<Local>);

impl VariableSources for Clock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
    fn env_var(&self, _name: &str) -> Option<String> {
        None
    }
    fn clipboard_text(&self) -> Option<String> {
        None
    }
    fn selection_text(&self) -> Option<String> {
        None
    }
    fn username(&self) -> String {
        "ada".to_string()
    }
    fn computer_name(&self) -> String {
        "host".to_string()
    }
    fn user_domain(&self) -> String {
        String::new()
    }
}

struct PlainField;

impl ForegroundProbe for PlainField {
    fn focused_class_name(&self) -> Result<Option<String>> {
        Ok(Some("Edit".to_string()))
    }
}

struct Setup {
    _dir: TempDir,
    store: Arc<SnippetStore>,
    screen: Arc<Screen>,
    engine: Engine,
    now: DateTime<Local>,
}

impl Setup {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SnippetStore::new(dir.path().join("snippets.json")));
        let screen = Arc::new(Screen::default());
        let now = Local::now();

        let services = EngineServices {
            injector: InputInjector::new(
                Arc::new(ScreenBackend(Arc::clone(&screen))),
                InjectorConfig::immediate(),
            ),
            sources: Arc::new(Clock(now)),
            secure: SecureContextDetector::new(Arc::new(PlainField)),
            usage: store.clone(),
        };
        let config = EngineConfig {
            trigger_delay_ms: 60_000,
            ..EngineConfig::default()
        };

        Self {
            _dir: dir,
            engine: Engine::new(config, services).unwrap(),
            store,
            screen,
            now,
        }
    }

    /// What a user types shows up on screen and reaches the hook
    fn type_str(&self, text: &str) {
        for c in text.chars() {
            self.screen.0.lock().push(c);
            self.engine.handle_key(KeyInput::Char(c));
        }
    }

    fn screen(&self) -> String {
        self.screen.0.lock().clone()
    }

    fn usage_of(&self, keyword: &str) -> u64 {
        self.store
            .list()
            .unwrap()
            .into_iter()
            .find(|e| e.keyword == keyword)
            .map(|e| e.usage_count)
            .unwrap_or(0)
    }
}

#[test]
fn test_today_expands_to_date() {
    let setup = Setup::new();
    setup
        .store
        .add(SnippetEntry::new("today".to_string(), "{date}".to_string()))
        .unwrap();
    assert_eq!(setup.engine.reload(setup.store.as_ref()).unwrap(), 1);

    setup.type_str("due today");
    let outcome = setup.engine.fire_pending();

    assert!(matches!(outcome, ExpansionOutcome::Expanded { deleted: 5, .. }));
    assert_eq!(
        setup.screen(),
        format!("due {}", setup.now.format("%Y-%m-%d"))
    );
    assert_eq!(setup.usage_of("today"), 1);
}

#[test]
fn test_typing_past_keyword_cancels() {
    let setup = Setup::new();
    setup
        .store
        .add(SnippetEntry::new("today".to_string(), "{date}".to_string()))
        .unwrap();
    setup.engine.reload(setup.store.as_ref()).unwrap();

    setup.type_str("todays");
    assert_eq!(setup.engine.fire_pending(), ExpansionOutcome::Stale);
    assert_eq!(setup.screen(), "todays");
    assert_eq!(setup.usage_of("today"), 0);
}

#[test]
fn test_regex_trigger_replaces_match_only() {
    let setup = Setup::new();
    let mut entry = SnippetEntry::new(r"#\d+".to_string(), "issue".to_string());
    entry.is_regex = true;
    setup.store.add(entry).unwrap();
    setup.engine.reload(setup.store.as_ref()).unwrap();

    setup.type_str("see #42");
    setup.engine.fire_pending();
    assert_eq!(setup.screen(), "see issue");
}

#[test]
fn test_disabled_group_not_matched() {
    let setup = Setup::new();
    let mut entry = SnippetEntry::new("brb".to_string(), "be right back".to_string());
    entry.group = Some("chat".to_string());
    setup.store.add(entry).unwrap();
    setup.store.set_group_enabled("chat", false).unwrap();
    assert_eq!(setup.engine.reload(setup.store.as_ref()).unwrap(), 0);

    setup.type_str("brb");
    assert!(setup.engine.pending().is_none());

    setup.store.set_group_enabled("chat", true).unwrap();
    setup.engine.reload(setup.store.as_ref()).unwrap();
    setup.engine.handle_key(KeyInput::Clear);
    setup.screen.0.lock().clear();

    setup.type_str("brb");
    setup.engine.fire_pending();
    assert_eq!(setup.screen(), "be right back");
}
