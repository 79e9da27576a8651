use std::collections::VecDeque;

/// Rolling window of the most recently typed characters.
///
/// Never holds more than `capacity` characters; pushing past the cap drops
/// from the front.
#[derive(Debug, Clone)]
pub struct TypedBuffer {
    chars: VecDeque<char>,
    capacity: usize,
}

impl TypedBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            chars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the cap, trimming the oldest characters if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.truncate_front();
    }

    pub fn push(&mut self, c: char) {
        self.chars.push_back(c);
        self.truncate_front();
    }

    /// Remove the trailing character, if any
    pub fn pop(&mut self) -> Option<char> {
        self.chars.pop_back()
    }

    pub fn clear(&mut self) {
        self.chars.clear();
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Case-insensitive check that the buffer ends with `keyword`.
    ///
    /// `keyword` must already be lowercased.
    pub fn ends_with_ignore_case(&self, keyword: &[char]) -> bool {
        if keyword.is_empty() || keyword.len() > self.chars.len() {
            return false;
        }

        let start = self.chars.len() - keyword.len();
        self.chars
            .range(start..)
            .zip(keyword)
            .all(|(typed, expected)| fold_char(*typed) == *expected)
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }

    fn truncate_front(&mut self) {
        while self.chars.len() > self.capacity {
            self.chars.pop_front();
        }
    }
}

/// Single-codepoint lowercase fold; characters whose lowercase form expands
/// to several codepoints compare as themselves.
pub(crate) fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod tests;
