//! Lazy enumeration of fixed-length permutations of an alphabet.

use std::iter::FusedIterator;

use crate::charset::Alphabet;
use crate::error::ConfigError;

/// Number of `length`-permutations of `n` symbols, `n! / (n - length)!`.
///
/// Returns `None` on overflow or when `length > n`.
pub fn permutation_count(n: usize, length: usize) -> Option<u128> {
    if length > n {
        return None;
    }
    ((n - length + 1)..=n).try_fold(1u128, |acc, factor| acc.checked_mul(factor as u128))
}

/// Every arrangement of `length` distinct alphabet characters, in
/// lexicographic order relative to the alphabet's own ordering.
///
/// Only the current index tuple is held; nothing is buffered ahead.
#[derive(Debug, Clone)]
pub struct Permutations<'a> {
    symbols: &'a [char],
    indices: Vec<usize>,
    used: Vec<bool>,
    done: bool,
}

impl<'a> Permutations<'a> {
    pub fn new(alphabet: &'a Alphabet, length: usize) -> Result<Self, ConfigError> {
        let symbols = alphabet.as_slice();
        if length > symbols.len() {
            return Err(ConfigError::LengthExceedsAlphabet {
                length,
                alphabet: symbols.len(),
            });
        }

        let indices: Vec<usize> = (0..length).collect();
        let mut used = vec![false; symbols.len()];
        for &index in &indices {
            used[index] = true;
        }

        Ok(Self {
            symbols,
            indices,
            used,
            done: false,
        })
    }

    /// Steps `indices` to the next permutation. Returns false once the last
    /// one has been passed.
    fn advance(&mut self) -> bool {
        let n = self.symbols.len();

        for pos in (0..self.indices.len()).rev() {
            let current = self.indices[pos];
            self.used[current] = false;

            let Some(next) = (current + 1..n).find(|&i| !self.used[i]) else {
                continue;
            };
            self.indices[pos] = next;
            self.used[next] = true;

            // Every slot after `pos` was released on the way down; refill
            // them with the smallest free symbols in ascending order.
            let mut cursor = 0;
            for slot in pos + 1..self.indices.len() {
                while self.used[cursor] {
                    cursor += 1;
                }
                self.indices[slot] = cursor;
                self.used[cursor] = true;
            }
            return true;
        }

        false
    }
}

impl Iterator for Permutations<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        let candidate: String = self.indices.iter().map(|&i| self.symbols[i]).collect();
        if !self.advance() {
            self.done = true;
        }
        Some(candidate)
    }
}

impl FusedIterator for Permutations<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn alphabet(s: &str) -> Alphabet {
        s.parse().unwrap()
    }

    #[test]
    fn test_abc_length_two_order() {
        let abc = alphabet("abc");
        let got: Vec<String> = Permutations::new(&abc, 2).unwrap().collect();
        assert_eq!(got, vec!["ab", "ac", "ba", "bc", "ca", "cb"]);
    }

    #[test]
    fn test_exhaustive_counts_and_uniqueness() {
        let abcde = alphabet("abcde");
        for length in 0..=5 {
            let got: Vec<String> = Permutations::new(&abcde, length).unwrap().collect();
            let expected = permutation_count(5, length).unwrap() as usize;
            assert_eq!(got.len(), expected, "length {length}");

            let unique: HashSet<&String> = got.iter().collect();
            assert_eq!(unique.len(), expected, "duplicates at length {length}");

            for candidate in &got {
                assert_eq!(candidate.chars().count(), length);
                let distinct: HashSet<char> = candidate.chars().collect();
                assert_eq!(distinct.len(), length, "repeated char in {candidate}");
            }
        }
    }

    #[test]
    fn test_matches_brute_force_set() {
        let abcd = alphabet("abcd");
        let got: HashSet<String> = Permutations::new(&abcd, 3).unwrap().collect();

        let mut expected = HashSet::new();
        for a in "abcd".chars() {
            for b in "abcd".chars() {
                for c in "abcd".chars() {
                    if a != b && b != c && a != c {
                        expected.insert(format!("{a}{b}{c}"));
                    }
                }
            }
        }
        assert_eq!(got, expected);
    }

    #[test]
    fn test_order_follows_alphabet_not_code_points() {
        let cba = alphabet("cba");
        let got: Vec<String> = Permutations::new(&cba, 2).unwrap().collect();
        assert_eq!(got, vec!["cb", "ca", "bc", "ba", "ac", "ab"]);
    }

    #[test]
    fn test_sorted_alphabet_yields_sorted_stream() {
        let sorted = alphabet("0123456");
        let got: Vec<String> = Permutations::new(&sorted, 4).unwrap().collect();
        let mut resorted = got.clone();
        resorted.sort();
        assert_eq!(got, resorted);
    }

    #[test]
    fn test_zero_length_yields_single_empty_candidate() {
        let abc = alphabet("abc");
        let got: Vec<String> = Permutations::new(&abc, 0).unwrap().collect();
        assert_eq!(got, vec![String::new()]);
    }

    #[test]
    fn test_full_length() {
        let abc = alphabet("abc");
        let got: Vec<String> = Permutations::new(&abc, 3).unwrap().collect();
        assert_eq!(got, vec!["abc", "acb", "bac", "bca", "cab", "cba"]);
    }

    #[test]
    fn test_length_exceeding_alphabet_is_rejected() {
        let abc = alphabet("abc");
        assert!(matches!(
            Permutations::new(&abc, 4),
            Err(ConfigError::LengthExceedsAlphabet {
                length: 4,
                alphabet: 3
            })
        ));
    }

    #[test]
    fn test_fused_after_exhaustion() {
        let ab = alphabet("ab");
        let mut perms = Permutations::new(&ab, 1).unwrap();
        assert_eq!(perms.next().as_deref(), Some("a"));
        assert_eq!(perms.next().as_deref(), Some("b"));
        assert_eq!(perms.next(), None);
        assert_eq!(perms.next(), None);
    }

    #[test]
    fn test_permutation_count() {
        assert_eq!(permutation_count(3, 2), Some(6));
        assert_eq!(permutation_count(26, 6), Some(165_765_600));
        assert_eq!(permutation_count(10, 0), Some(1));
        assert_eq!(permutation_count(2, 3), None);
        assert_eq!(permutation_count(95, 95), None);
    }
}
