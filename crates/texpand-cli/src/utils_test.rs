// Tests for prompting and table helpers

use super::*;
use std::io::Cursor;

#[test]
fn test_prompter_reads_line() {
    let prompter = LinePrompter::new(Cursor::new("Grace Hopper\r\nnext\n"), Vec::new());
    assert_eq!(prompter.prompt("Name"), Some("Grace Hopper".to_string()));
    assert_eq!(prompter.prompt("Other"), Some("next".to_string()));
    assert_eq!(
        String::from_utf8(prompter.output.borrow().clone()).unwrap(),
        "Name: Other: "
    );
}

#[test]
fn test_prompter_eof_cancels() {
    let prompter = LinePrompter::new(Cursor::new(""), Vec::new());
    assert_eq!(prompter.prompt("Name"), None);
}

#[test]
fn test_prompter_empty_line_is_empty_answer() {
    let prompter = LinePrompter::new(Cursor::new("\n"), Vec::new());
    assert_eq!(prompter.prompt("Name"), Some(String::new()));
}

#[test]
fn test_summarize() {
    assert_eq!(summarize("Best,\nAda", 40), "Best,\\nAda");
    assert_eq!(summarize("abcdef", 4), "abc…");
    assert_eq!(summarize("abcd", 4), "abcd");
}
