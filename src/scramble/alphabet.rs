use super::common::RandomSource;
use crate::config::ConfigError;
use std::collections::BTreeSet;

/// Letters, digits and a handful of symbols used when no alphabet is configured
pub const DEFAULT_CHARACTERS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz1234567890!@#$%^&*()_+";

/// Where the noise shown at unrevealed positions comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlphabetPolicy {
    /// Shuffle the still hidden characters of the target among themselves
    FromTarget,
    /// Sample independently from a caller supplied character set
    Custom(Vec<char>),
}

impl Default for AlphabetPolicy {
    fn default() -> Self {
        Self::Custom(DEFAULT_CHARACTERS.chars().collect())
    }
}

/// The names an alphabet policy can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(ascii_case_insensitive)]
pub(crate) enum AlphabetKind {
    #[strum(to_string = "custom", serialize = "characters")]
    Custom,
    #[strum(to_string = "original", serialize = "target")]
    FromTarget,
}

impl AlphabetPolicy {
    /// Build a policy sampling from the given characters
    pub fn custom(characters: &str) -> Result<Self, ConfigError> {
        let characters: Vec<char> = characters.chars().collect();
        if characters.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        Ok(Self::Custom(characters))
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Custom(characters) if characters.is_empty() => Err(ConfigError::EmptyAlphabet),
            _ => Ok(()),
        }
    }

    /// Produce a frame for `target` where revealed positions and spaces show their true
    /// character and every other position shows noise.
    pub fn scramble<R: RandomSource>(&self, target: &[char], revealed: &BTreeSet<usize>, rng: &mut R) -> Vec<char> {
        let is_hidden = |index: usize, ch: char| ch != ' ' && !revealed.contains(&index);
        match self {
            Self::FromTarget => {
                let mut pool: Vec<char> =
                    target.iter().enumerate().filter(|(i, c)| is_hidden(*i, **c)).map(|(_, c)| *c).collect();
                shuffle(&mut pool, rng);
                let mut pool = pool.into_iter();
                target
                    .iter()
                    .enumerate()
                    .map(|(i, &ch)| if is_hidden(i, ch) { pool.next().unwrap_or(ch) } else { ch })
                    .collect()
            }
            Self::Custom(characters) => target
                .iter()
                .enumerate()
                .map(|(i, &ch)| if is_hidden(i, ch) { characters[rng.below(characters.len())] } else { ch })
                .collect(),
        }
    }
}

/// Fisher-Yates
fn shuffle<T, R: RandomSource>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}
