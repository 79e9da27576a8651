use crate::cli::Commands;
use crate::utils::{summarize, LinePrompter};
use std::path::Path;
use std::sync::Arc;
use texpand_core::config::{get_config_file_path, load_config, save_config};
use texpand_core::matcher::TriggerSnapshot;
use texpand_core::storage::find_snippet;
use texpand_core::{
    expand, is_daemon_running, preview, ClipboardBridge, EnigoBackend, InjectorConfig,
    InputInjector, Result, ResolveMode, SnippetEntry, SnippetStore, SystemClipboard,
    SystemSources, TexpandError,
};
use texpand_daemon::{
    daemon_status, daemon_worker_entry, run_daemon_worker, start_daemon, stop_daemon,
};
use tracing::info;

pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            keyword,
            replacement,
            regex,
            priority,
            group,
        } => handle_add(keyword, replacement, regex, priority, group),
        Commands::Update {
            keyword,
            replacement,
        } => SnippetStore::open_default()?
            .update(&keyword, replacement)
            .map(|_| println!("Snippet updated successfully")),
        Commands::Delete { keyword } => SnippetStore::open_default()?
            .delete(&keyword)
            .map(|_| println!("Snippet deleted successfully")),
        Commands::List { group } => handle_list(group.as_deref()),
        Commands::EnableGroup { name } => set_group(&name, true),
        Commands::DisableGroup { name } => set_group(&name, false),
        Commands::Import { path } => handle_import(&path),
        Commands::Preview { text, snippet } => {
            let template = resolve_template(text, snippet)?;
            println!("{}", preview(&template, &system_sources()));
            Ok(())
        }
        Commands::Expand { text, snippet } => {
            let template = resolve_template(text, snippet)?;
            let prompter = LinePrompter::stdin();
            let expanded = expand(
                &template,
                &system_sources(),
                ResolveMode::Interactive(&prompter),
            );
            println!("{}", expanded);
            Ok(())
        }
        Commands::Config { set } => handle_config(&set),
        Commands::Start => start_daemon(),
        Commands::Stop => stop_daemon(),
        Commands::Status => daemon_status(),
        Commands::Run => handle_run(),
        Commands::DaemonWorker => daemon_worker_entry(),
    }
}

fn handle_add(
    keyword: String,
    replacement: String,
    regex: bool,
    priority: i32,
    group: Option<String>,
) -> Result<()> {
    if keyword.is_empty() {
        return Err(TexpandError::Other("Keyword must not be empty".to_string()));
    }
    if regex {
        TriggerSnapshot::validate_pattern(&keyword)
            .map_err(|e| TexpandError::InvalidPattern(format!("{}: {}", keyword, e)))?;
    }

    let mut entry = SnippetEntry::new(keyword, replacement);
    entry.is_regex = regex;
    entry.priority = priority;
    entry.group = group;

    SnippetStore::open_default()?.add(entry)?;
    println!("Snippet added successfully");
    Ok(())
}

fn handle_list(group: Option<&str>) -> Result<()> {
    let store = SnippetStore::open_default()?;
    let db = store.load_with_usage()?;

    let entries: Vec<&SnippetEntry> = db
        .snippets
        .iter()
        .filter(|e| group.is_none() || e.group.as_deref() == group)
        .collect();

    if entries.is_empty() {
        println!("No snippets found. Add one with 'texpand add -k <keyword> -r <text>'.");
        return Ok(());
    }

    println!(
        "{:<16} {:<12} {:>6} {:>9}  {}",
        "KEYWORD", "GROUP", "USES", "UPDATED", "REPLACEMENT"
    );
    for entry in entries {
        let enabled = db.is_group_enabled(entry.group.as_deref());
        let keyword = if entry.is_regex {
            format!("/{}/", entry.keyword)
        } else {
            entry.keyword.clone()
        };
        let group = match (&entry.group, enabled) {
            (Some(g), true) => g.clone(),
            (Some(g), false) => format!("{} (off)", g),
            (None, _) => "-".to_string(),
        };

        println!(
            "{:<16} {:<12} {:>6} {:>9}  {}",
            summarize(&keyword, 16),
            summarize(&group, 12),
            entry.usage_count,
            entry.formatted_time(),
            summarize(&entry.replacement, 48)
        );
    }
    Ok(())
}

fn set_group(name: &str, enabled: bool) -> Result<()> {
    SnippetStore::open_default()?.set_group_enabled(name, enabled)?;
    println!(
        "Group '{}' {}",
        name,
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn handle_import(path: &Path) -> Result<()> {
    let (added, updated) = SnippetStore::open_default()?.import(path)?;
    println!(
        "Imported {} new and {} updated snippets from {}",
        added,
        updated,
        path.display()
    );
    Ok(())
}

fn resolve_template(text: String, is_keyword: bool) -> Result<String> {
    if !is_keyword {
        return Ok(text);
    }

    let snippets = SnippetStore::open_default()?.list()?;
    find_snippet(&snippets, &text)
        .map(|entry| entry.replacement.clone())
        .ok_or(TexpandError::SnippetNotFound(text))
}

fn system_sources() -> SystemSources {
    let injector = InputInjector::new(Arc::new(EnigoBackend), InjectorConfig::default());
    SystemSources::new(ClipboardBridge::new(Arc::new(SystemClipboard)), injector)
}

fn handle_config(edits: &[String]) -> Result<()> {
    let mut config = load_config()?;

    if !edits.is_empty() {
        for edit in edits {
            let (key, value) = edit.split_once('=').ok_or_else(|| {
                TexpandError::InvalidConfig(format!("expected KEY=VALUE, got '{}'", edit))
            })?;
            config.set(key.trim(), value.trim())?;
        }
        save_config(&config)?;
        info!("Saved engine config");
        println!("Config saved. A running daemon applies it within a second.");
    }

    println!("Config file: {}", get_config_file_path().display());
    println!("trigger_delay_ms        = {}", config.trigger_delay_ms);
    println!("enable_in_secure_fields = {}", config.enable_in_secure_fields);
    println!("max_buffer_size         = {}", config.max_buffer_size);
    Ok(())
}

fn handle_run() -> Result<()> {
    if let Some(pid) = is_daemon_running()? {
        println!(
            "Note: a background daemon (PID {}) is also running; triggers may expand twice.",
            pid
        );
    }
    println!("texpand is running in the foreground. Press Ctrl+C to stop.");
    run_daemon_worker()
}
