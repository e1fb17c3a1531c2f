//! Words and word lists, the host's unit of command construction.

use bitflags::bitflags;
use std::fmt;

use crate::config::is_identifier;

bitflags! {
    /// Per-word flags, mirroring what the host's `make_word` computes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WordFlags: u32 {
        /// Contains a `$` and may need parameter expansion.
        const HAS_DOLLAR = 1 << 0;
        /// Some or all of the word was quoted.
        const QUOTED     = 1 << 1;
        /// Looks like `NAME=value`.
        const ASSIGNMENT = 1 << 2;
        /// Do not expand at all.
        const NOEXPAND   = 1 << 3;
    }
}

/// A single token of text plus its flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub flags: WordFlags,
}

impl Word {
    /// Build a word and derive its flags from the text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let flags = derive_flags(&text);
        Self { text, flags }
    }

    /// Build a word with explicit flags, skipping derivation.
    pub fn with_flags(text: impl Into<String>, flags: WordFlags) -> Self {
        Self {
            text: text.into(),
            flags,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split an assignment word into `(name, value)`.
    pub fn assignment(&self) -> Option<(&str, &str)> {
        if !self.flags.contains(WordFlags::ASSIGNMENT) {
            return None;
        }
        self.text.split_once('=')
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Word {
    fn from(text: &str) -> Self {
        Word::new(text)
    }
}

impl From<String> for Word {
    fn from(text: String) -> Self {
        Word::new(text)
    }
}

fn derive_flags(text: &str) -> WordFlags {
    let mut flags = WordFlags::empty();
    if text.contains('$') {
        flags |= WordFlags::HAS_DOLLAR;
    }
    if text.contains(['\'', '"', '\\']) {
        flags |= WordFlags::QUOTED;
    }
    if let Some((name, _)) = text.split_once('=') {
        if is_identifier(name) {
            flags |= WordFlags::ASSIGNMENT;
        }
    }
    flags
}

/// Ordered sequence of words: program name first, then arguments.
///
/// Handing a list to the command builder consumes it; the list cannot be
/// touched again afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList(Vec<Word>);

impl WordList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, word: impl Into<Word>) {
        self.0.push(word.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Word> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Word> {
        self.0.iter()
    }

    /// Pop the leading word, returning it and the remainder.
    pub fn split_first(mut self) -> Option<(Word, WordList)> {
        if self.0.is_empty() {
            return None;
        }
        let head = self.0.remove(0);
        Some((head, self))
    }

    /// Texts of every word, in order.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|w| w.text.clone()).collect()
    }
}

impl<W: Into<Word>> FromIterator<W> for WordList {
    fn from_iter<I: IntoIterator<Item = W>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for WordList {
    type Item = Word;
    type IntoIter = std::vec::IntoIter<Word>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a WordList {
    type Item = &'a Word;
    type IntoIter = std::slice::Iter<'a, Word>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&word.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_word_flags() {
        assert_eq!(Word::new("plain").flags, WordFlags::empty());
        assert!(Word::new("$@").flags.contains(WordFlags::HAS_DOLLAR));
        assert!(Word::new("it's").flags.contains(WordFlags::QUOTED));
        assert!(Word::new("X=1").flags.contains(WordFlags::ASSIGNMENT));
        assert!(!Word::new("1X=1").flags.contains(WordFlags::ASSIGNMENT));
        assert!(!Word::new("=1").flags.contains(WordFlags::ASSIGNMENT));
    }

    #[test]
    fn test_assignment_split() {
        let word = Word::new("PATH=/bin:/usr/bin");
        assert_eq!(word.assignment(), Some(("PATH", "/bin:/usr/bin")));
        assert_eq!(Word::new("echo").assignment(), None);
        let literal = Word::with_flags("A=b", WordFlags::QUOTED);
        assert_eq!(literal.assignment(), None);
    }

    #[test]
    fn test_word_list_order() {
        let list: WordList = ["bridge", "call", "foo", "$@"].into_iter().collect();
        assert_eq!(list.len(), 4);
        assert_eq!(list.to_string(), "bridge call foo $@");

        let (head, rest) = list.split_first().unwrap();
        assert_eq!(head.as_str(), "bridge");
        assert_eq!(rest.to_strings(), vec!["call", "foo", "$@"]);
        assert!(WordList::new().split_first().is_none());
    }

    proptest! {
        #[test]
        fn dollar_flag_tracks_text(text in ".*") {
            let word = Word::new(text.clone());
            prop_assert_eq!(word.flags.contains(WordFlags::HAS_DOLLAR), text.contains('$'));
            prop_assert_eq!(word.text, text);
        }
    }
}
