use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use texpand_core::Prompter;

/// Answers `{input:...}` prompts from a line-oriented reader.
///
/// End of input counts as cancelling the prompt.
pub struct LinePrompter<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }
}

impl LinePrompter<io::StdinLock<'static>, io::Stderr> {
    /// Prompts on stderr so stdout only carries the expansion
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn prompt(&self, prompt: &str) -> Option<String> {
        {
            let mut out = self.output.borrow_mut();
            write!(out, "{}: ", prompt).ok()?;
            out.flush().ok()?;
        }

        let mut line = String::new();
        match self.input.borrow_mut().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

/// One-line rendering of a replacement for tables
pub fn summarize(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .flat_map(|c| match c {
            '\n' => vec!['\\', 'n'],
            '\t' => vec!['\\', 't'],
            '\r' => vec![],
            c => vec![c],
        })
        .collect();

    if flat.chars().count() <= max_chars {
        flat
    } else {
        let mut cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
#[path = "utils_test.rs"]
mod tests;
