//! Placeholder expansion for snippet templates.
//!
//! Templates contain `{name}` or `{name:args}` tokens. Each token is parsed
//! into a [`VariableToken`] and resolved against a [`VariableSources`]
//! implementation. Unrecognised tokens are written back unchanged, braces
//! included.

use crate::clipboard::ClipboardBridge;
use crate::keyboard::InputInjector;
use chrono::{DateTime, Days, Local, Months, NaiveDate};
use std::env;
use tracing::debug;

pub const PREVIEW_CLIPBOARD: &str = "[clipboard]";
pub const PREVIEW_SELECTION: &str = "[selection]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Date,
    DateMath,
    Time,
    DateTime,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Timestamp,
    Env,
    Clipboard,
    Selection,
    Input,
    Username,
    ComputerName,
    UserDomain,
    Unknown,
}

/// A parsed `{...}` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableToken {
    /// Text between the braces, exactly as written
    pub raw: String,
    pub kind: VariableKind,
    pub args: Option<String>,
}

impl VariableToken {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();

        let (kind, args) = if let Some(name) = strip_prefix_ignore_case(trimmed, "env:") {
            (VariableKind::Env, Some(name.trim().to_string()))
        } else if let Some(prompt) = strip_prefix_ignore_case(trimmed, "input:") {
            (VariableKind::Input, Some(prompt.trim().to_string()))
        } else if lower.starts_with("date+") || lower.starts_with("date-") {
            (VariableKind::DateMath, Some(trimmed[4..].to_string()))
        } else {
            let kind = match lower.as_str() {
                "date" => VariableKind::Date,
                "time" => VariableKind::Time,
                "datetime" => VariableKind::DateTime,
                "year" => VariableKind::Year,
                "month" => VariableKind::Month,
                "day" => VariableKind::Day,
                "hour" => VariableKind::Hour,
                "minute" => VariableKind::Minute,
                "second" => VariableKind::Second,
                "timestamp" => VariableKind::Timestamp,
                "clipboard" => VariableKind::Clipboard,
                "selection" => VariableKind::Selection,
                "username" => VariableKind::Username,
                "computername" => VariableKind::ComputerName,
                "userdomain" => VariableKind::UserDomain,
                _ => VariableKind::Unknown,
            };
            (kind, None)
        };

        Self {
            raw: raw.to_string(),
            kind,
            args,
        }
    }

    /// The token as it appeared in the template
    pub fn placeholder(&self) -> String {
        format!("{{{}}}", self.raw)
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Token(VariableToken),
}

/// Split a template into literal text and placeholder tokens.
///
/// An unmatched `{` and any `{` followed by another `{` before a closing
/// brace stay literal.
pub fn tokenize(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Token(VariableToken::parse(&after[..close])));
                rest = &after[close + 1..];
            }
            Some(nested) => {
                literal.push('{');
                literal.push_str(&after[..nested]);
                rest = &after[nested..];
            }
            None => {
                literal.push('{');
                literal.push_str(after);
                rest = "";
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Where placeholder values come from
pub trait VariableSources {
    fn now(&self) -> DateTime<Local>;
    fn env_var(&self, name: &str) -> Option<String>;
    fn clipboard_text(&self) -> Option<String>;
    fn selection_text(&self) -> Option<String>;
    fn username(&self) -> String;
    fn computer_name(&self) -> String;
    fn user_domain(&self) -> String;
}

/// Answers `{input:...}` prompts during manual expansion
pub trait Prompter {
    /// `None` when the user cancelled
    fn prompt(&self, prompt: &str) -> Option<String>;
}

#[derive(Clone, Copy)]
pub enum ResolveMode<'a> {
    /// Triggered from the keyboard hook; nothing may block on the user
    Automatic,
    /// Explicitly requested; `{input:...}` asks the prompter
    Interactive(&'a dyn Prompter),
    /// Display only; no clipboard, selection or prompt I/O
    Preview,
}

/// Resolve every placeholder in `template`.
///
/// The clock is read once, so all date tokens in one expansion agree.
/// Clipboard and selection are fetched at most once each.
pub fn expand(template: &str, sources: &dyn VariableSources, mode: ResolveMode<'_>) -> String {
    let mut resolver = Resolver {
        sources,
        mode,
        now: sources.now(),
        clipboard: None,
        selection: None,
    };

    tokenize(template)
        .into_iter()
        .map(|segment| match segment {
            Segment::Literal(text) => text,
            Segment::Token(token) => resolver.resolve(&token),
        })
        .collect()
}

/// Resolution for display: never touches the clipboard or prompts
pub fn preview(template: &str, sources: &dyn VariableSources) -> String {
    expand(template, sources, ResolveMode::Preview)
}

struct Resolver<'a> {
    sources: &'a dyn VariableSources,
    mode: ResolveMode<'a>,
    now: DateTime<Local>,
    clipboard: Option<String>,
    selection: Option<String>,
}

impl Resolver<'_> {
    fn resolve(&mut self, token: &VariableToken) -> String {
        let args = token.args.as_deref().unwrap_or("");

        match token.kind {
            VariableKind::Date => format_date(self.now.date_naive()),
            VariableKind::DateMath => resolve_date_math(self.now.date_naive(), args),
            VariableKind::Time => self.now.format("%H:%M:%S").to_string(),
            VariableKind::DateTime => self.now.format("%Y-%m-%d %H:%M:%S").to_string(),
            VariableKind::Year => self.now.format("%Y").to_string(),
            VariableKind::Month => self.now.format("%m").to_string(),
            VariableKind::Day => self.now.format("%d").to_string(),
            VariableKind::Hour => self.now.format("%H").to_string(),
            VariableKind::Minute => self.now.format("%M").to_string(),
            VariableKind::Second => self.now.format("%S").to_string(),
            VariableKind::Timestamp => self.now.timestamp().to_string(),
            VariableKind::Env => self.sources.env_var(args).unwrap_or_default(),
            VariableKind::Clipboard => self.clipboard(),
            VariableKind::Selection => self.selection(),
            VariableKind::Input => self.input(args),
            VariableKind::Username => self.sources.username(),
            VariableKind::ComputerName => self.sources.computer_name(),
            VariableKind::UserDomain => self.sources.user_domain(),
            VariableKind::Unknown => {
                debug!("Leaving unknown placeholder unexpanded");
                token.placeholder()
            }
        }
    }

    fn clipboard(&mut self) -> String {
        if let ResolveMode::Preview = self.mode {
            return PREVIEW_CLIPBOARD.to_string();
        }
        self.clipboard
            .get_or_insert_with(|| self.sources.clipboard_text().unwrap_or_default())
            .clone()
    }

    fn selection(&mut self) -> String {
        if let ResolveMode::Preview = self.mode {
            return PREVIEW_SELECTION.to_string();
        }
        self.selection
            .get_or_insert_with(|| self.sources.selection_text().unwrap_or_default())
            .clone()
    }

    fn input(&self, prompt: &str) -> String {
        match self.mode {
            ResolveMode::Automatic => format!("[{}]", prompt),
            ResolveMode::Preview => format!("[input: {}]", prompt),
            ResolveMode::Interactive(prompter) => prompter.prompt(prompt).unwrap_or_default(),
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `args` is the part after `date`, e.g. `+7d` or `-1M`.
/// Anything malformed falls back to today's date.
fn resolve_date_math(today: NaiveDate, args: &str) -> String {
    shift_date(today, args)
        .map(format_date)
        .unwrap_or_else(|| format_date(today))
}

fn shift_date(today: NaiveDate, args: &str) -> Option<NaiveDate> {
    let mut chars = args.chars();
    let forward = match chars.next()? {
        '+' => true,
        '-' => false,
        _ => return None,
    };

    let rest = chars.as_str();
    let unit = rest.chars().last()?;
    let digits = &rest[..rest.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let amount: u32 = digits.parse().ok()?;

    match unit.to_ascii_lowercase() {
        'd' => shift_days(today, u64::from(amount), forward),
        'w' => shift_days(today, u64::from(amount) * 7, forward),
        'm' => shift_months(today, amount, forward),
        'y' => shift_months(today, amount.checked_mul(12)?, forward),
        _ => None,
    }
}

fn shift_days(today: NaiveDate, days: u64, forward: bool) -> Option<NaiveDate> {
    if forward {
        today.checked_add_days(Days::new(days))
    } else {
        today.checked_sub_days(Days::new(days))
    }
}

fn shift_months(today: NaiveDate, months: u32, forward: bool) -> Option<NaiveDate> {
    if forward {
        today.checked_add_months(Months::new(months))
    } else {
        today.checked_sub_months(Months::new(months))
    }
}

/// Live values from the OS
#[derive(Clone)]
pub struct SystemSources {
    clipboard: ClipboardBridge,
    injector: InputInjector,
}

impl SystemSources {
    pub fn new(clipboard: ClipboardBridge, injector: InputInjector) -> Self {
        Self {
            clipboard,
            injector,
        }
    }
}

impl VariableSources for SystemSources {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        env::var(name).ok()
    }

    fn clipboard_text(&self) -> Option<String> {
        self.clipboard.text()
    }

    fn selection_text(&self) -> Option<String> {
        self.clipboard.capture_selection(&self.injector)
    }

    fn username(&self) -> String {
        whoami::username()
    }

    fn computer_name(&self) -> String {
        whoami::fallible::hostname().unwrap_or_default()
    }

    fn user_domain(&self) -> String {
        env::var("USERDOMAIN").unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "variables_test.rs"]
mod tests;
