use crate::config::{ensure_config_dir, get_db_file_path};
use crate::error::{Result, TexpandError};
use crate::models::{ActiveTrigger, SnippetDatabase, SnippetEntry, SnippetGroup};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Source of the triggers the engine should currently recognise.
pub trait TriggerSource: Send + Sync {
    fn list_active_triggers(&self) -> Result<Vec<ActiveTrigger>>;
}

/// Receives a notification each time a trigger expanded successfully.
///
/// Calls are fire-and-forget; an implementation must not fail the caller.
pub trait UsageSink: Send + Sync {
    fn record_usage(&self, trigger_id: &str);
}

/// JSON file backed snippet store.
///
/// Usage counts recorded by the engine go to a sidecar file next to the
/// database, so expansions never rewrite the snippets themselves.
#[derive(Debug, Clone)]
pub struct SnippetStore {
    path: PathBuf,
}

impl SnippetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location inside the config directory
    pub fn open_default() -> Result<Self> {
        ensure_config_dir()?;
        Ok(Self::new(get_db_file_path()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `snippets.json` keeps its counts in `snippets.usage.json`
    pub fn usage_path(&self) -> PathBuf {
        self.path.with_extension("usage.json")
    }

    /// Expansion counts recorded since the database last stored them
    pub fn usage_counts(&self) -> Result<BTreeMap<String, u64>> {
        let path = self.usage_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| e.into())
    }

    fn save_usage_counts(&self, counts: &BTreeMap<String, u64>) -> Result<()> {
        fs::write(self.usage_path(), serde_json::to_string_pretty(counts)?)?;
        Ok(())
    }

    /// Load the database with recorded usage folded into each entry
    pub fn load_with_usage(&self) -> Result<SnippetDatabase> {
        let db = self.load()?;
        self.with_usage(db)
    }

    fn with_usage(&self, mut db: SnippetDatabase) -> Result<SnippetDatabase> {
        let counts = self.usage_counts()?;
        for entry in &mut db.snippets {
            entry.usage_count += counts.get(&entry.id).copied().unwrap_or(0);
        }
        Ok(db)
    }

    /// Load the whole database
    pub fn load(&self) -> Result<SnippetDatabase> {
        if !self.path.exists() {
            return Err(TexpandError::DatabaseNotFound(
                self.path.to_string_lossy().to_string(),
            ));
        }

        let content = fs::read_to_string(&self.path)?;

        // Handle empty database file
        if content.trim().is_empty() {
            return Ok(SnippetDatabase::default());
        }

        serde_json::from_str(&content).map_err(|e| e.into())
    }

    fn load_or_default(&self) -> Result<SnippetDatabase> {
        match self.load() {
            Ok(db) => Ok(db),
            Err(TexpandError::DatabaseNotFound(_)) => Ok(SnippetDatabase::default()),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, db: &SnippetDatabase) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(db)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<SnippetEntry>> {
        Ok(self.with_usage(self.load_or_default()?)?.snippets)
    }

    /// Add a new snippet; keywords are unique
    pub fn add(&self, entry: SnippetEntry) -> Result<()> {
        let mut db = self.load_or_default()?;

        if db.snippets.iter().any(|e| e.keyword == entry.keyword) {
            return Err(TexpandError::Other(format!(
                "Keyword '{}' already exists",
                entry.keyword
            )));
        }

        if let Some(group) = &entry.group {
            if !db.groups.iter().any(|g| &g.name == group) {
                db.groups.push(SnippetGroup {
                    name: group.clone(),
                    enabled: true,
                });
            }
        }

        db.snippets.push(entry);
        self.save(&db)
    }

    pub fn update(&self, keyword: &str, new_replacement: String) -> Result<()> {
        let mut db = self.load()?;
        let entry = db
            .snippets
            .iter_mut()
            .find(|e| e.keyword == keyword)
            .ok_or_else(|| TexpandError::SnippetNotFound(keyword.to_string()))?;

        entry.update_replacement(new_replacement);
        self.save(&db)
    }

    pub fn delete(&self, keyword: &str) -> Result<()> {
        let mut db = self.load()?;
        let before = db.snippets.len();
        db.snippets.retain(|e| e.keyword != keyword);

        if db.snippets.len() == before {
            return Err(TexpandError::SnippetNotFound(keyword.to_string()));
        }
        self.save(&db)
    }

    pub fn set_group_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let mut db = self.load_or_default()?;
        match db.groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.enabled = enabled,
            None => db.groups.push(SnippetGroup {
                name: name.to_string(),
                enabled,
            }),
        }
        self.save(&db)
    }

    /// Merge another database file into this one.
    ///
    /// Existing keywords take the imported replacement, new keywords are
    /// appended and groups are unioned with local enablement winning.
    /// Returns `(added, updated)`.
    pub fn import(&self, other: &Path) -> Result<(usize, usize)> {
        let incoming = SnippetStore::new(other).load()?;
        let mut db = self.load_or_default()?;
        let (mut added, mut updated) = (0, 0);

        for group in incoming.groups {
            if !db.groups.iter().any(|g| g.name == group.name) {
                db.groups.push(group);
            }
        }

        for entry in incoming.snippets {
            match db.snippets.iter_mut().find(|e| e.keyword == entry.keyword) {
                Some(existing) => {
                    existing.update_replacement(entry.replacement);
                    existing.is_regex = entry.is_regex;
                    existing.priority = entry.priority;
                    updated += 1;
                }
                None => {
                    db.snippets.push(entry);
                    added += 1;
                }
            }
        }

        self.save(&db)?;
        Ok((added, updated))
    }
}

impl TriggerSource for SnippetStore {
    fn list_active_triggers(&self) -> Result<Vec<ActiveTrigger>> {
        Ok(self.load_or_default()?.active_triggers())
    }
}

impl UsageSink for SnippetStore {
    fn record_usage(&self, trigger_id: &str) {
        let result = self.load().and_then(|db| {
            if !db.snippets.iter().any(|e| e.id == trigger_id) {
                return Err(TexpandError::SnippetNotFound(trigger_id.to_string()));
            }
            let mut counts = self.usage_counts()?;
            *counts.entry(trigger_id.to_string()).or_insert(0) += 1;
            self.save_usage_counts(&counts)
        });

        match result {
            Ok(()) => debug!(trigger = %trigger_id, "Recorded usage"),
            Err(e) => warn!(trigger = %trigger_id, "Failed to record usage: {}", e),
        }
    }
}

/// Load all snippets from the default database
pub fn load_snippets() -> Result<Vec<SnippetEntry>> {
    SnippetStore::open_default()?.list()
}

/// Add a new snippet to the default database
pub fn add_snippet(keyword: String, replacement: String) -> Result<()> {
    SnippetStore::open_default()?.add(SnippetEntry::new(keyword, replacement))
}

/// Delete a snippet by keyword
pub fn delete_snippet(keyword: &str) -> Result<()> {
    SnippetStore::open_default()?.delete(keyword)
}

/// Update an existing snippet
pub fn update_snippet(keyword: &str, new_replacement: String) -> Result<()> {
    SnippetStore::open_default()?.update(keyword, new_replacement)
}

/// Find a snippet by keyword
pub fn find_snippet<'a>(snippets: &'a [SnippetEntry], keyword: &str) -> Option<&'a SnippetEntry> {
    snippets.iter().find(|entry| entry.keyword == keyword)
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
