use serde::Serialize;

/// Whether a rendered character has settled on its true value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reveal {
    /// The character is final, or the effect is not running
    Revealed,
    /// The character is still noise
    Masked,
}

/// A single rendered character tagged with its reveal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameChar {
    pub ch: char,
    pub reveal: Reveal,
}

impl FrameChar {
    /// Create a revealed character
    pub fn revealed(ch: char) -> Self {
        Self { ch, reveal: Reveal::Revealed }
    }

    /// Create a masked character
    pub fn masked(ch: char) -> Self {
        Self { ch, reveal: Reveal::Masked }
    }

    pub fn is_revealed(&self) -> bool {
        self.reveal == Reveal::Revealed
    }
}

/// One rendered frame of a scramble effect.
///
/// `chars` drives visual rendering while `accessible_text` is the plain string a screen reader
/// or any other non-visual consumer should get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub chars: Vec<FrameChar>,
    pub accessible_text: String,
}

impl Frame {
    pub(crate) fn new(chars: Vec<FrameChar>) -> Self {
        let accessible_text = chars.iter().map(|c| c.ch).collect();
        Self { chars, accessible_text }
    }

    /// The displayed characters as a string
    pub fn text(&self) -> &str {
        &self.accessible_text
    }

    /// Whether every character in this frame is tagged as revealed
    pub fn is_settled(&self) -> bool {
        self.chars.iter().all(FrameChar::is_revealed)
    }
}

/// Source of randomness for scrambling.
///
/// Effects own their random source so tests can inject a seeded one and replay a run exactly.
pub trait RandomSource {
    /// Return a uniformly distributed index in `0..bound`. `bound` is never zero.
    fn below(&mut self, bound: usize) -> usize;
}

impl RandomSource for fastrand::Rng {
    fn below(&mut self, bound: usize) -> usize {
        self.usize(..bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_text_matches_chars() {
        let frame = Frame::new(vec![FrameChar::revealed('H'), FrameChar::masked('#'), FrameChar::masked(' ')]);
        assert_eq!(frame.text(), "H# ");
        assert!(!frame.is_settled());
    }

    #[test]
    fn seeded_source_is_in_bounds() {
        let mut rng = fastrand::Rng::with_seed(7);
        for bound in 1..50 {
            assert!(rng.below(bound) < bound);
        }
    }
}
