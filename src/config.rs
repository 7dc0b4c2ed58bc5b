use crate::render::{CharStyle, Color};
use crate::scramble::{ActivationMode, AlphabetKind, AlphabetPolicy, RevealOrder, DEFAULT_CHARACTERS};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

/// Errors that can occur when building an effect configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("tick interval must be positive, got {0}ms")]
    NonPositiveTickInterval(i64),

    #[error("max iterations must be positive, got {0}")]
    NonPositiveIterations(i64),

    #[error("unknown reveal order '{0}' (expected start, end or center)")]
    UnknownRevealOrder(String),

    #[error("unknown activation mode '{0}' (expected hover or view)")]
    UnknownActivation(String),

    #[error("unknown alphabet policy '{0}' (expected custom or original)")]
    UnknownAlphabet(String),

    #[error("custom alphabet has no characters")]
    EmptyAlphabet,

    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    #[error("visibility threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f32),

    #[error("page entry {0} has no text")]
    MissingText(usize),

    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A validated effect configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScrambleConfig {
    /// Time between two scramble updates
    pub tick_interval: Duration,
    /// Number of scrambles before a non-sequential run settles
    pub max_iterations: u32,
    /// Reveal one character per tick instead of scrambling everything until the end
    pub sequential: bool,
    pub reveal_order: RevealOrder,
    pub alphabet: AlphabetPolicy,
    pub activation: ActivationMode,
    /// Minimum visible fraction for a visibility notification to count. Zero means any overlap.
    pub visibility_threshold: f32,
    pub revealed_style: CharStyle,
    pub masked_style: CharStyle,
}

impl Default for ScrambleConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(150),
            max_iterations: 10,
            sequential: false,
            reveal_order: RevealOrder::default(),
            alphabet: AlphabetPolicy::default(),
            activation: ActivationMode::default(),
            visibility_threshold: 0.0,
            revealed_style: CharStyle::colored(Color::WHITE),
            masked_style: CharStyle::colored(Color::WHITE),
        }
    }
}

impl ScrambleConfig {
    /// Check the invariants a mounted effect relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::NonPositiveTickInterval(0));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::NonPositiveIterations(0));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(ConfigError::InvalidThreshold(self.visibility_threshold));
        }
        self.alphabet.validate()
    }

    /// Whether a host reporting `visible_fraction` of the effect on screen counts as visible
    pub fn is_visible(&self, visible_fraction: f32) -> bool {
        if self.visibility_threshold == 0.0 {
            visible_fraction > 0.0
        } else {
            visible_fraction >= self.visibility_threshold
        }
    }
}

/// Effect options as written in a configuration file.
///
/// Every field has a default so a file only needs to mention what it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub struct ScrambleOptions {
    pub tick_interval_ms: i64,
    pub max_iterations: i64,
    pub sequential: bool,
    /// `start`, `end` or `center`
    pub reveal_order: String,
    /// `custom` to sample from `characters`, `original` to shuffle the text's own characters
    pub alphabet: String,
    pub characters: String,
    /// `hover` or `view`
    pub activation: String,
    pub visibility_threshold: f32,
    pub revealed_style: CharStyle,
    pub masked_style: CharStyle,
}

impl Default for ScrambleOptions {
    fn default() -> Self {
        Self {
            tick_interval_ms: 150,
            max_iterations: 10,
            sequential: false,
            reveal_order: RevealOrder::default().to_string(),
            alphabet: "custom".into(),
            characters: DEFAULT_CHARACTERS.into(),
            activation: ActivationMode::default().to_string(),
            visibility_threshold: 0.0,
            revealed_style: CharStyle::colored(Color::WHITE),
            masked_style: CharStyle::colored(Color::WHITE),
        }
    }
}

impl TryFrom<ScrambleOptions> for ScrambleConfig {
    type Error = ConfigError;

    fn try_from(options: ScrambleOptions) -> Result<Self, Self::Error> {
        if options.tick_interval_ms <= 0 {
            return Err(ConfigError::NonPositiveTickInterval(options.tick_interval_ms));
        }
        if options.max_iterations <= 0 {
            return Err(ConfigError::NonPositiveIterations(options.max_iterations));
        }
        let reveal_order = RevealOrder::from_str(&options.reveal_order)
            .map_err(|_| ConfigError::UnknownRevealOrder(options.reveal_order.clone()))?;
        let activation = ActivationMode::from_str(&options.activation)
            .map_err(|_| ConfigError::UnknownActivation(options.activation.clone()))?;
        let alphabet = match AlphabetKind::from_str(&options.alphabet)
            .map_err(|_| ConfigError::UnknownAlphabet(options.alphabet.clone()))?
        {
            AlphabetKind::Custom => AlphabetPolicy::custom(&options.characters)?,
            AlphabetKind::FromTarget => AlphabetPolicy::FromTarget,
        };
        let config = Self {
            tick_interval: Duration::from_millis(options.tick_interval_ms as u64),
            max_iterations: u32::try_from(options.max_iterations).unwrap_or(u32::MAX),
            sequential: options.sequential,
            reveal_order,
            alphabet,
            activation,
            visibility_threshold: options.visibility_threshold,
            revealed_style: options.revealed_style,
            masked_style: options.masked_style,
        };
        config.validate()?;
        Ok(config)
    }
}

/// A page of texts to decrypt, as written in a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPage {
    /// Options shared by every entry
    #[serde(default)]
    defaults: Mapping,
    /// One mapping per text: a `text` key plus any option overrides
    entries: Vec<Mapping>,
}

impl RawPage {
    fn build(self, overrides: &Mapping) -> Result<Page, ConfigError> {
        let mut entries = Vec::with_capacity(self.entries.len());
        for (index, mut entry) in self.entries.into_iter().enumerate() {
            let text = match entry.remove("text") {
                Some(Value::String(text)) => text,
                _ => return Err(ConfigError::MissingText(index)),
            };
            let mut options = self.defaults.clone();
            overlay(&mut options, entry);
            overlay(&mut options, overrides.clone());
            let options: ScrambleOptions = serde_yaml::from_value(Value::Mapping(options))?;
            entries.push(PageEntry { text, config: options.try_into()? });
        }
        Ok(Page { entries })
    }
}

fn overlay(base: &mut Mapping, overrides: Mapping) {
    for (key, value) in overrides {
        base.insert(key, value);
    }
}

/// A text and the configuration to decrypt it with
#[derive(Debug, Clone, PartialEq)]
pub struct PageEntry {
    pub text: String,
    pub config: ScrambleConfig,
}

/// Every effect a host mounts at once
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub entries: Vec<PageEntry>,
}

impl Page {
    /// Parse a page from YAML
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Self::from_yaml_with_overrides(contents, &Mapping::new())
    }

    /// Parse a page from YAML, then apply `overrides` on top of every entry
    pub fn from_yaml_with_overrides(contents: &str, overrides: &Mapping) -> Result<Self, ConfigError> {
        let raw: RawPage = serde_yaml::from_str(contents)?;
        raw.build(overrides)
    }

    /// Load a page from a YAML file
    pub fn load(path: &Path, overrides: &Mapping) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_with_overrides(&contents, overrides)
    }

    /// Build a page with one entry per text, all using default options plus `overrides`
    pub fn from_texts<I>(texts: I, overrides: &Mapping) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let entries = texts
            .into_iter()
            .map(|text| {
                let mut entry = Mapping::new();
                entry.insert("text".into(), Value::String(text));
                entry
            })
            .collect();
        RawPage { defaults: Mapping::new(), entries }.build(overrides)
    }

    /// Build one of the built-in pages
    pub fn preset(preset: Preset, overrides: &Mapping) -> Result<Self, ConfigError> {
        Self::from_yaml_with_overrides(preset.yaml(), overrides)
    }

    /// Where a page file is looked up when none is given explicitly
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "decrypted-text").map(|dirs| dirs.config_dir().join("page.yaml"))
    }
}

/// Built-in pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Preset {
    /// The gallery section heading
    Gallery,
    /// The featured artists section heading
    FeaturedArtists,
    /// One entry per reveal order and activation mode
    Showcase,
}

impl Preset {
    fn yaml(self) -> &'static str {
        match self {
            Self::Gallery => presets::GALLERY,
            Self::FeaturedArtists => presets::FEATURED_ARTISTS,
            Self::Showcase => presets::SHOWCASE,
        }
    }
}

mod presets {
    pub(super) const GALLERY: &str = r#"
defaults:
  tick_interval_ms: 150
  max_iterations: 10
  sequential: true
  reveal_order: start
  alphabet: custom
  activation: view
entries:
  - text: GALLERY
"#;

    pub(super) const FEATURED_ARTISTS: &str = r#"
defaults:
  tick_interval_ms: 150
  max_iterations: 10
  sequential: true
  reveal_order: start
  alphabet: custom
  activation: view
entries:
  - text: FEATURED ARTISTS
"#;

    pub(super) const SHOWCASE: &str = r##"
defaults:
  tick_interval_ms: 80
  revealed_style:
    color: "#ffffff"
    bold: true
  masked_style:
    color: "#5f87af"
    dim: true
entries:
  - text: REVEAL FROM THE START
    sequential: true
    reveal_order: start
  - text: REVEAL FROM THE END
    sequential: true
    reveal_order: end
  - text: REVEAL FROM THE CENTER
    sequential: true
    reveal_order: center
  - text: SHUFFLE MY OWN LETTERS
    alphabet: original
    max_iterations: 30
  - text: HOVER OVER ME
    activation: hover
    sequential: true
    reveal_order: center
  - text: FLICKER THEN SETTLE
    activation: hover
    max_iterations: 30
"##;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use strum::IntoEnumIterator;

    #[test]
    fn default_options_match_default_config() {
        let config = ScrambleConfig::try_from(ScrambleOptions::default()).expect("invalid defaults");
        assert_eq!(config, ScrambleConfig::default());
    }

    #[test]
    fn parse_page() {
        let page = Page::from_yaml(
            r#"
defaults:
  tick_interval_ms: 50
  sequential: true
entries:
  - text: HOME
  - text: ABOUT
    reveal_order: center
    activation: hover
    alphabet: original
"#,
        )
        .expect("parse failed");
        assert_eq!(page.entries.len(), 2);
        let home = &page.entries[0];
        assert_eq!(home.text, "HOME");
        assert_eq!(home.config.tick_interval, Duration::from_millis(50));
        assert!(home.config.sequential);
        assert_eq!(home.config.reveal_order, RevealOrder::Forward);
        assert_eq!(home.config.activation, ActivationMode::OnceVisible);

        let about = &page.entries[1];
        assert_eq!(about.config.reveal_order, RevealOrder::CenterOut);
        assert_eq!(about.config.activation, ActivationMode::Hover);
        assert_eq!(about.config.alphabet, AlphabetPolicy::FromTarget);
        assert_eq!(about.config.tick_interval, Duration::from_millis(50));
    }

    #[test]
    fn overrides_win() {
        let mut overrides = Mapping::new();
        overrides.insert("max_iterations".into(), 30.into());
        let page = Page::from_yaml_with_overrides(
            "entries:\n  - text: A\n    max_iterations: 5\n",
            &overrides,
        )
        .expect("parse failed");
        assert_eq!(page.entries[0].config.max_iterations, 30);
    }

    #[rstest]
    #[case::zero_interval("tick_interval_ms: 0")]
    #[case::negative_interval("tick_interval_ms: -150")]
    #[case::zero_iterations("max_iterations: 0")]
    #[case::reveal_order("reveal_order: diagonal")]
    #[case::activation("activation: click")]
    #[case::alphabet("alphabet: emoji")]
    #[case::empty_characters("characters: ''")]
    #[case::threshold("visibility_threshold: 1.5")]
    #[case::color("revealed_style: { color: white }")]
    #[case::unknown_field("speed: 150")]
    fn invalid_options(#[case] option: &str) {
        let yaml = format!("entries:\n  - text: A\n    {option}\n");
        assert!(Page::from_yaml(&yaml).is_err(), "{option} was accepted");
    }

    #[test]
    fn error_variants() {
        let options = ScrambleOptions { tick_interval_ms: -1, ..Default::default() };
        assert!(matches!(ScrambleConfig::try_from(options), Err(ConfigError::NonPositiveTickInterval(-1))));
        let options = ScrambleOptions { reveal_order: "sideways".into(), ..Default::default() };
        assert!(matches!(ScrambleConfig::try_from(options), Err(ConfigError::UnknownRevealOrder(o)) if o == "sideways"));
    }

    #[test]
    fn missing_text() {
        let result = Page::from_yaml("entries:\n  - text: A\n  - sequential: true\n");
        assert!(matches!(result, Err(ConfigError::MissingText(1))));
    }

    #[test]
    fn visibility_threshold() {
        let config = ScrambleConfig::default();
        assert!(!config.is_visible(0.0));
        assert!(config.is_visible(0.01));
        let config = ScrambleConfig { visibility_threshold: 0.5, ..Default::default() };
        assert!(!config.is_visible(0.4));
        assert!(config.is_visible(0.5));
    }

    #[test]
    fn presets_are_valid() {
        for preset in Preset::iter() {
            let page = Page::preset(preset, &Mapping::new()).expect("invalid preset");
            assert!(!page.entries.is_empty(), "{preset} is empty");
        }
    }

    #[test]
    fn gallery_preset() {
        let page = Page::preset(Preset::Gallery, &Mapping::new()).expect("invalid preset");
        let entry = &page.entries[0];
        assert_eq!(entry.text, "GALLERY");
        assert_eq!(entry.config.tick_interval, Duration::from_millis(150));
        assert_eq!(entry.config.max_iterations, 10);
        assert!(entry.config.sequential);
        assert_eq!(entry.config.alphabet, AlphabetPolicy::default());
        assert_eq!(entry.config.activation, ActivationMode::OnceVisible);
    }

    #[test]
    fn preset_names() {
        assert_eq!(Preset::from_str("featured-artists").expect("parse failed"), Preset::FeaturedArtists);
        assert_eq!(Preset::Showcase.to_string(), "showcase");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("failed to create file");
        writeln!(file, "entries:\n  - text: WEB\n    activation: hover").expect("write failed");
        let page = Page::load(file.path(), &Mapping::new()).expect("load failed");
        assert_eq!(page.entries[0].text, "WEB");
        assert_eq!(page.entries[0].config.activation, ActivationMode::Hover);
    }

    #[test]
    fn from_texts() {
        let mut overrides = Mapping::new();
        overrides.insert("activation".into(), "hover".into());
        let page = Page::from_texts(["ONE".to_string(), "TWO".to_string()], &overrides).expect("build failed");
        assert_eq!(page.entries.len(), 2);
        assert!(page.entries.iter().all(|e| e.config.activation == ActivationMode::Hover));
    }
}
