pub mod buffer;
pub mod clipboard;
pub mod config;
pub mod engine;
pub mod error;
pub mod keyboard;
pub mod matcher;
pub mod models;
pub mod scheduler;
pub mod secure;
pub mod storage;
pub mod variables;

// Re-export common items for convenience
pub use clipboard::{ClipboardAccess, ClipboardBridge, SystemClipboard};
pub use config::{get_config_dir, is_daemon_running, EngineConfig};
pub use engine::{Engine, EngineServices, ExpansionOutcome, KeyInput, PendingExpansion};
pub use error::{HookError, Result, TexpandError};
pub use keyboard::{EnigoBackend, InjectorConfig, InputInjector, KeyBackend, KeySink};
pub use models::{ActiveTrigger, SnippetEntry, TriggerSpec};
pub use secure::{system_probe, ForegroundProbe, SecureContextDetector};
pub use storage::{
    add_snippet, delete_snippet, load_snippets, update_snippet, SnippetStore, TriggerSource,
    UsageSink,
};
pub use variables::{expand, preview, Prompter, ResolveMode, SystemSources, VariableSources};

use std::sync::Arc;

/// Services wired to the real keyboard, clipboard and foreground window
pub fn system_services(usage: Arc<dyn UsageSink>) -> EngineServices {
    let injector = InputInjector::new(Arc::new(EnigoBackend), InjectorConfig::default());
    let clipboard = ClipboardBridge::new(Arc::new(SystemClipboard));

    EngineServices {
        sources: Arc::new(SystemSources::new(clipboard, injector.clone())),
        secure: SecureContextDetector::new(system_probe()),
        injector,
        usage,
    }
}
