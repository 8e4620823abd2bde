//! Character sets and the ordered alphabet candidates are drawn from.

use std::collections::HashSet;

use clap::ValueEnum;

use crate::error::ConfigError;

/// Symbol characters that can be included in the brute-force alphabet.
const SYMBOLS: &[char] = &[
    '.', '/', '-', '_', '!', '?', '@', '#', '$', '%', '^', '&', '*', '+', '=',
];

/// Built-in character sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Charset {
    /// a-z
    Lower,
    /// A-Z
    Upper,
    /// 0-9
    Digits,
    /// . / - _ ! ? @ # $ % ^ & * + =
    Symbols,
    /// Every printable ASCII character, space included
    Ascii,
}

impl Charset {
    pub fn chars(self) -> Vec<char> {
        match self {
            Charset::Lower => ('a'..='z').collect(),
            Charset::Upper => ('A'..='Z').collect(),
            Charset::Digits => ('0'..='9').collect(),
            Charset::Symbols => SYMBOLS.to_vec(),
            Charset::Ascii => (' '..='~').collect(),
        }
    }
}

/// An ordered set of distinct characters.
///
/// Candidate order follows the order characters were supplied in, not their
/// code points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    /// Builds an alphabet, rejecting empty input and repeated characters.
    pub fn new<I: IntoIterator<Item = char>>(chars: I) -> Result<Self, ConfigError> {
        let symbols: Vec<char> = chars.into_iter().collect();
        if symbols.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for &ch in &symbols {
            if !seen.insert(ch) {
                return Err(ConfigError::DuplicateCharacter(ch));
            }
        }

        Ok(Self { symbols })
    }

    /// Concatenates presets and extra characters, keeping the first
    /// occurrence of each character.
    pub fn from_sets(sets: &[Charset], extra: &str) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let merged: Vec<char> = sets
            .iter()
            .flat_map(|set| set.chars())
            .chain(extra.chars())
            .filter(|ch| seen.insert(*ch))
            .collect();
        Self::new(merged)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_slice(&self) -> &[char] {
        &self.symbols
    }
}

impl std::str::FromStr for Alphabet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.chars())
    }
}
