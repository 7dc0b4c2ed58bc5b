/// What starts (and possibly stops) an effect run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString, strum::Display)]
#[strum(ascii_case_insensitive)]
pub enum ActivationMode {
    /// Pointer enter starts a run, pointer leave cancels it. Re-entering restarts.
    #[strum(to_string = "hover")]
    Hover,

    /// The first time the host reports the effect as visible a run starts. Never re-arms.
    #[default]
    #[strum(to_string = "view", serialize = "visible")]
    OnceVisible,
}

/// Run lifecycle of an effect.
///
/// Hover effects move between `Idle` and `Running`. Visible effects walk `Armed -> Running ->
/// Settled` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Showing the target, waiting for a pointer enter
    Idle,
    /// Showing the target, waiting for the first visibility notification
    Armed,
    /// Scrambling
    Running,
    /// Showing the target for good
    Settled,
}

impl Phase {
    pub(crate) fn initial(mode: ActivationMode) -> Self {
        match mode {
            ActivationMode::Hover => Self::Idle,
            ActivationMode::OnceVisible => Self::Armed,
        }
    }

    /// The phase a run ends in, whether it completed or was cut short
    pub(crate) fn after_run(mode: ActivationMode) -> Self {
        match mode {
            ActivationMode::Hover => Self::Idle,
            ActivationMode::OnceVisible => Self::Settled,
        }
    }

    /// Whether an activation signal may start a run from this phase
    pub fn accepts_activation(self) -> bool {
        matches!(self, Self::Idle | Self::Armed)
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn initial_phases() {
        assert_eq!(Phase::initial(ActivationMode::Hover), Phase::Idle);
        assert_eq!(Phase::initial(ActivationMode::OnceVisible), Phase::Armed);
    }

    #[test]
    fn settled_never_accepts_activation() {
        assert!(!Phase::after_run(ActivationMode::OnceVisible).accepts_activation());
        assert!(Phase::after_run(ActivationMode::Hover).accepts_activation());
        assert!(!Phase::Running.accepts_activation());
    }

    #[test]
    fn parse() {
        assert_eq!(ActivationMode::from_str("view").expect("parse failed"), ActivationMode::OnceVisible);
        assert_eq!(ActivationMode::from_str("Visible").expect("parse failed"), ActivationMode::OnceVisible);
        assert_eq!(ActivationMode::from_str("hover").expect("parse failed"), ActivationMode::Hover);
        assert!(ActivationMode::from_str("click").is_err());
    }
}
