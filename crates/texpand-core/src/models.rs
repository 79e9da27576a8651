use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// How a trigger is recognised in the typed buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSpec {
    /// Identifier reported to the usage sink when this trigger fires
    pub id: String,
    /// Literal keyword (case-insensitive suffix) or regex pattern
    pub keyword: String,
    pub is_regex: bool,
    pub priority: i32,
}

/// A trigger together with the template it expands to, as handed out by a
/// trigger source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTrigger {
    pub spec: TriggerSpec,
    pub template: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SnippetEntry {
    pub id: String,
    pub keyword: String,
    pub replacement: String,
    #[serde(default)]
    pub is_regex: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub usage_count: u64,
    pub timestamp: String,
}

impl SnippetEntry {
    pub fn new(keyword: String, replacement: String) -> Self {
        let now = Local::now();
        Self {
            id: format!("{}-{}", now.timestamp_millis(), keyword),
            keyword,
            replacement,
            is_regex: false,
            priority: 0,
            group: None,
            usage_count: 0,
            timestamp: now.to_rfc3339(),
        }
    }

    pub fn update_replacement(&mut self, new_replacement: String) {
        self.replacement = new_replacement;
        self.timestamp = Local::now().to_rfc3339();
    }

    pub fn to_trigger(&self) -> ActiveTrigger {
        ActiveTrigger {
            spec: TriggerSpec {
                id: self.id.clone(),
                keyword: self.keyword.clone(),
                is_regex: self.is_regex,
                priority: self.priority,
            },
            template: self.replacement.clone(),
        }
    }

    pub fn formatted_time(&self) -> String {
        let entry_time = DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Local))
            .unwrap_or_else(|_| Local::now());

        let duration = Local::now().signed_duration_since(entry_time);

        if duration.num_seconds() < 60 {
            format!("{}s ago", duration.num_seconds())
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            format!("{}d ago", duration.num_days())
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SnippetGroup {
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// On-disk document holding every snippet and group.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetDatabase {
    #[serde(default)]
    pub groups: Vec<SnippetGroup>,
    #[serde(default)]
    pub snippets: Vec<SnippetEntry>,
}

impl SnippetDatabase {
    /// Snippets without a group, or whose group is unknown, are active.
    pub fn is_group_enabled(&self, group: Option<&str>) -> bool {
        match group {
            None => true,
            Some(name) => self
                .groups
                .iter()
                .find(|g| g.name == name)
                .map(|g| g.enabled)
                .unwrap_or(true),
        }
    }

    pub fn active_triggers(&self) -> Vec<ActiveTrigger> {
        self.snippets
            .iter()
            .filter(|entry| self.is_group_enabled(entry.group.as_deref()))
            .map(SnippetEntry::to_trigger)
            .collect()
    }
}
