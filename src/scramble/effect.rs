use super::activation::{ActivationMode, Phase};
use super::common::{Frame, FrameChar, RandomSource};
use crate::config::{ConfigError, ScrambleConfig};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// A string that decrypts from noise into its true value.
///
/// The effect owns no timer: whoever hosts it calls [`TextScrambleEffect::tick`] every
/// `tick_interval` while [`TextScrambleEffect::is_running`] holds. See [`crate::stage::Stage`].
#[derive(Debug)]
pub struct TextScrambleEffect<R = fastrand::Rng> {
    target: Vec<char>,
    config: ScrambleConfig,
    /// Positions settled on their true character during the current run
    revealed: BTreeSet<usize>,
    displayed: Vec<char>,
    phase: Phase,
    /// Ticks elapsed in a non-sequential run
    iteration: u32,
    rng: R,
}

impl TextScrambleEffect<fastrand::Rng> {
    /// Mount an effect using an entropy seeded random source
    pub fn mount(target: &str, config: ScrambleConfig) -> Result<Self, ConfigError> {
        Self::mount_with_rng(target, config, fastrand::Rng::new())
    }
}

impl<R: RandomSource> TextScrambleEffect<R> {
    /// Mount an effect. It starts settled, showing `target`, and waits for an activation.
    pub fn mount_with_rng(target: &str, config: ScrambleConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let target: Vec<char> = target.chars().collect();
        let phase = Phase::initial(config.activation);
        Ok(Self { displayed: target.clone(), target, config, revealed: BTreeSet::new(), phase, iteration: 0, rng })
    }

    /// Start a run. Returns `true` if the effect now needs ticks.
    ///
    /// Activating a running effect does nothing, as does activating a visible effect that
    /// already fired once.
    pub fn activate(&mut self) -> bool {
        if !self.phase.accepts_activation() {
            return false;
        }
        self.revealed.clear();
        self.iteration = 0;
        self.displayed.clone_from(&self.target);
        if self.target.is_empty() {
            self.phase = Phase::after_run(self.config.activation);
            return false;
        }
        debug!(len = self.target.len(), sequential = self.config.sequential, "starting scramble run");
        self.phase = Phase::Running;
        true
    }

    /// Cancel a hover run and go back to showing the target. Ignored for visible effects.
    pub fn deactivate(&mut self) {
        if self.config.activation != ActivationMode::Hover {
            return;
        }
        if self.phase.is_running() {
            debug!("scramble run cancelled");
        }
        self.phase = Phase::Idle;
        self.revealed.clear();
        self.iteration = 0;
        self.displayed.clone_from(&self.target);
    }

    /// Advance the run by one step and return the new frame.
    pub fn tick(&mut self) -> &[char] {
        if !self.phase.is_running() {
            return &self.displayed;
        }
        if self.config.sequential {
            if let Some(index) = self.config.reveal_order.next_index(&self.revealed, self.target.len()) {
                self.revealed.insert(index);
            }
            self.displayed = self.config.alphabet.scramble(&self.target, &self.revealed, &mut self.rng);
            trace!(revealed = self.revealed.len(), "sequential tick");
            if self.revealed.len() == self.target.len() {
                self.finish();
            }
        } else {
            self.displayed = self.config.alphabet.scramble(&self.target, &self.revealed, &mut self.rng);
            self.iteration += 1;
            trace!(iteration = self.iteration, "scramble tick");
            if self.iteration >= self.config.max_iterations {
                self.finish();
            }
        }
        &self.displayed
    }

    fn finish(&mut self) {
        self.displayed.clone_from(&self.target);
        self.phase = Phase::after_run(self.config.activation);
        debug!("scramble run settled");
    }

    /// The current frame, each character tagged for styling.
    ///
    /// Outside of a run everything counts as revealed.
    pub fn frame(&self) -> Frame {
        let running = self.phase.is_running();
        let chars = self
            .displayed
            .iter()
            .enumerate()
            .map(|(index, &ch)| {
                if !running || self.revealed.contains(&index) { FrameChar::revealed(ch) } else { FrameChar::masked(ch) }
            })
            .collect();
        Frame::new(chars)
    }

    pub fn displayed(&self) -> &[char] {
        &self.displayed
    }

    pub fn displayed_text(&self) -> String {
        self.displayed.iter().collect()
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn revealed(&self) -> &BTreeSet<usize> {
        &self.revealed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    /// Whether a visible effect has used up its single activation
    pub fn has_fired_once(&self) -> bool {
        self.config.activation == ActivationMode::OnceVisible && self.phase != Phase::Armed
    }

    pub fn config(&self) -> &ScrambleConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scramble::{AlphabetPolicy, RevealOrder};
    use rstest::rstest;
    use std::time::Duration;

    fn config() -> ScrambleConfig {
        ScrambleConfig { activation: ActivationMode::Hover, ..Default::default() }
    }

    fn mount(target: &str, config: ScrambleConfig) -> TextScrambleEffect {
        TextScrambleEffect::mount_with_rng(target, config, fastrand::Rng::with_seed(3)).expect("mount failed")
    }

    #[test]
    fn mounts_settled() {
        let effect = mount("GALLERY", config());
        assert_eq!(effect.displayed_text(), "GALLERY");
        assert!(effect.revealed().is_empty());
        assert!(!effect.is_running());
        assert!(effect.frame().is_settled());
    }

    #[test]
    fn sequential_forward_two_characters() {
        let config = ScrambleConfig {
            sequential: true,
            reveal_order: RevealOrder::Forward,
            alphabet: AlphabetPolicy::custom("XYZ").expect("valid alphabet"),
            ..config()
        };
        let mut effect = mount("AB", config);
        assert!(effect.activate());

        let first = effect.tick().to_vec();
        assert_eq!(first[0], 'A');
        assert!("XYZ".contains(first[1]));
        assert!(effect.is_running());
        let frame = effect.frame();
        assert!(frame.chars[0].is_revealed());
        assert!(!frame.chars[1].is_revealed());

        assert_eq!(effect.tick(), ['A', 'B']);
        assert!(!effect.is_running());
    }

    #[rstest]
    #[case(1)]
    #[case(10)]
    #[case(30)]
    fn non_sequential_settles_after_max_iterations(#[case] max_iterations: u32) {
        let mut effect = mount("FEATURED ARTISTS", ScrambleConfig { max_iterations, ..config() });
        effect.activate();
        for _ in 1..max_iterations {
            effect.tick();
            assert!(effect.is_running());
            assert!(effect.revealed().is_empty());
            assert_eq!(effect.displayed()[8], ' ');
        }
        let last = effect.tick().to_vec();
        assert_eq!(last, effect.target());
        assert!(!effect.is_running());
    }

    #[test]
    fn activation_is_idempotent() {
        let mut effect = mount("ABC", ScrambleConfig { sequential: true, ..config() });
        assert!(effect.activate());
        effect.tick();
        assert!(!effect.activate());
        assert_eq!(effect.revealed().len(), 1);
    }

    #[test]
    fn deactivation_resets() {
        let mut effect = mount("ABCDEF", ScrambleConfig { sequential: true, ..config() });
        effect.activate();
        effect.tick();
        effect.tick();
        effect.deactivate();
        assert_eq!(effect.displayed_text(), "ABCDEF");
        assert!(effect.revealed().is_empty());
        assert!(!effect.is_running());

        // re-entering starts a fresh run
        assert!(effect.activate());
        effect.tick();
        assert_eq!(effect.revealed().len(), 1);
    }

    #[test]
    fn tick_when_idle_is_noop() {
        let mut effect = mount("IDLE", config());
        let frame = effect.tick().to_vec();
        assert_eq!(frame, effect.target());
        assert_eq!(effect.phase(), Phase::Idle);
    }

    #[test]
    fn visible_fires_once() {
        let config = ScrambleConfig { activation: ActivationMode::OnceVisible, sequential: true, ..Default::default() };
        let mut effect = mount("ONCE", config);
        assert!(!effect.has_fired_once());
        assert!(effect.activate());
        assert!(effect.has_fired_once());
        effect.tick();
        assert!(!effect.activate());

        // deactivation has no meaning here
        effect.deactivate();
        assert!(effect.is_running());

        while effect.is_running() {
            effect.tick();
        }
        assert_eq!(effect.phase(), Phase::Settled);
        assert!(!effect.activate());
        assert_eq!(effect.displayed_text(), "ONCE");
    }

    #[test]
    fn empty_target_settles_immediately() {
        let mut effect = mount("", ScrambleConfig { activation: ActivationMode::OnceVisible, ..Default::default() });
        assert!(!effect.activate());
        assert!(!effect.is_running());
        assert_eq!(effect.phase(), Phase::Settled);
        assert!(effect.tick().is_empty());
    }

    #[rstest]
    #[case::zero_interval(ScrambleConfig { tick_interval: Duration::ZERO, ..Default::default() })]
    #[case::zero_iterations(ScrambleConfig { max_iterations: 0, ..Default::default() })]
    #[case::empty_alphabet(ScrambleConfig { alphabet: AlphabetPolicy::Custom(vec![]), ..Default::default() })]
    fn invalid_config_rejected(#[case] config: ScrambleConfig) {
        assert!(TextScrambleEffect::mount("TEXT", config).is_err());
    }

    #[test]
    fn spaces_stay_spaces() {
        let mut effect = mount("A B C", ScrambleConfig { sequential: true, reveal_order: RevealOrder::Backward, ..config() });
        effect.activate();
        while effect.is_running() {
            let frame = effect.tick();
            assert_eq!(frame[1], ' ');
            assert_eq!(frame[3], ' ');
        }
        assert_eq!(effect.displayed_text(), "A B C");
    }
}
