//! A text decryption effect: a string starts out as noise and settles, tick by tick, on its
//! true value.
//!
//! [`TextScrambleEffect`] holds the state of a single effect, [`Stage`] hosts many of them with
//! their timers and visibility observers, and [`Page`] loads their configuration.

pub mod config;
pub mod render;
pub mod scramble;
pub mod stage;

pub use config::{ConfigError, Page, PageEntry, Preset, ScrambleConfig, ScrambleOptions};
pub use render::{CharStyle, Color};
pub use scramble::{
    ActivationMode, AlphabetPolicy, Frame, FrameChar, Phase, RandomSource, Reveal, RevealOrder, TextScrambleEffect,
};
pub use stage::{EffectHandle, Stage};
