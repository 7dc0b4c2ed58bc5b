mod activation;
mod alphabet;
mod common;
mod effect;
mod order;

pub use activation::{ActivationMode, Phase};
pub use alphabet::{AlphabetPolicy, DEFAULT_CHARACTERS};
pub(crate) use alphabet::AlphabetKind;
pub use common::{Frame, FrameChar, RandomSource, Reveal};
pub use effect::TextScrambleEffect;
pub use order::RevealOrder;
