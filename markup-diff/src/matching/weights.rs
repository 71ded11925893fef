//! Heuristic weight configuration.

use serde::Deserialize;

use crate::constants::DEFAULT_TEXT_THRESHOLD;
use crate::error::{Error, Result};

/// Multipliers scaling the base weight of each heuristic component.
///
/// A multiplier of 0 disables its component entirely: it neither scores nor
/// marks a pair as different. Weights are immutable once built and can be
/// shared freely between comparisons, including across threads.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "WeightsConfig")]
pub struct Weights {
    name: f64,
    id: f64,
    attributes: f64,
    contents: f64,
    text_contents: f64,
    text_contents_threshold: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            name: 1.0,
            id: 1.0,
            attributes: 1.0,
            contents: 1.0,
            text_contents: 1.0,
            text_contents_threshold: DEFAULT_TEXT_THRESHOLD,
        }
    }
}

impl Weights {
    /// Default weights: every component at 1.0, text threshold 0.5.
    pub fn new() -> Self {
        Self::default()
    }

    /// Weights under which tag names are the only thing that has to match.
    pub fn only_name() -> Self {
        Weights {
            name: 1.0,
            id: 0.0,
            attributes: 0.0,
            contents: 0.0,
            text_contents: 0.0,
            ..Self::default()
        }
    }

    /// Parses weights from a JSON object.
    ///
    /// Recognized keys are `name`, `id`, `attributes`, `contents`,
    /// `textContents` and `textContents_threshold`; values may be numbers or
    /// booleans (`true` is 1, `false` is 0). Other keys are ignored and
    /// missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: WeightsConfig = serde_json::from_str(json)?;
        Weights::try_from(config)
    }

    /// Returns a copy with the tag name multiplier replaced.
    pub fn with_name(self, value: f64) -> Result<Self> {
        Ok(Weights {
            name: multiplier("name", value)?,
            ..self
        })
    }

    /// Returns a copy with the id multiplier replaced.
    pub fn with_id(self, value: f64) -> Result<Self> {
        Ok(Weights {
            id: multiplier("id", value)?,
            ..self
        })
    }

    /// Returns a copy with the attributes multiplier replaced.
    pub fn with_attributes(self, value: f64) -> Result<Self> {
        Ok(Weights {
            attributes: multiplier("attributes", value)?,
            ..self
        })
    }

    /// Returns a copy with the contents multiplier replaced.
    pub fn with_contents(self, value: f64) -> Result<Self> {
        Ok(Weights {
            contents: multiplier("contents", value)?,
            ..self
        })
    }

    /// Returns a copy with the text contents multiplier replaced.
    pub fn with_text_contents(self, value: f64) -> Result<Self> {
        Ok(Weights {
            text_contents: multiplier("textContents", value)?,
            ..self
        })
    }

    /// Returns a copy with the text contents threshold replaced.
    pub fn with_text_threshold(self, value: f64) -> Result<Self> {
        Ok(Weights {
            text_contents_threshold: threshold(value)?,
            ..self
        })
    }

    /// Tag name multiplier.
    pub fn name(&self) -> f64 {
        self.name
    }

    /// Id multiplier.
    pub fn id(&self) -> f64 {
        self.id
    }

    /// Attributes multiplier.
    pub fn attributes(&self) -> f64 {
        self.attributes
    }

    /// Contents multiplier.
    pub fn contents(&self) -> f64 {
        self.contents
    }

    /// Text contents multiplier.
    pub fn text_contents(&self) -> f64 {
        self.text_contents
    }

    /// Fraction of changed characters above which text differs significantly.
    pub fn text_contents_threshold(&self) -> f64 {
        self.text_contents_threshold
    }
}

fn multiplier(key: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidWeight { key, value })
    }
}

fn threshold(value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidThreshold(value))
    }
}

/// A configured value: a number, or a boolean shorthand for 1 / 0.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Setting {
    Flag(bool),
    Value(f64),
}

impl Setting {
    fn value(self) -> f64 {
        match self {
            Setting::Flag(true) => 1.0,
            Setting::Flag(false) => 0.0,
            Setting::Value(v) => v,
        }
    }
}

/// Weights as written in configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WeightsConfig {
    name: Option<Setting>,
    id: Option<Setting>,
    attributes: Option<Setting>,
    contents: Option<Setting>,
    #[serde(rename = "textContents")]
    text_contents: Option<Setting>,
    #[serde(rename = "textContents_threshold")]
    text_contents_threshold: Option<Setting>,
}

impl TryFrom<WeightsConfig> for Weights {
    type Error = Error;

    fn try_from(config: WeightsConfig) -> Result<Self> {
        let defaults = Weights::default();
        let pick = |key: &'static str, setting: Option<Setting>, default: f64| {
            setting.map_or(Ok(default), |s| multiplier(key, s.value()))
        };

        Ok(Weights {
            name: pick("name", config.name, defaults.name)?,
            id: pick("id", config.id, defaults.id)?,
            attributes: pick("attributes", config.attributes, defaults.attributes)?,
            contents: pick("contents", config.contents, defaults.contents)?,
            text_contents: pick("textContents", config.text_contents, defaults.text_contents)?,
            text_contents_threshold: config
                .text_contents_threshold
                .map_or(Ok(defaults.text_contents_threshold), |s| threshold(s.value()))?,
        })
    }
}
