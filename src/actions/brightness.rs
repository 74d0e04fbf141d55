//! Display brightness control.

use serde_json::Value;

use crate::error::{DeckError, Result};
use crate::model::{
    Action, ActivationContext, BuildContext, DeckCommand, IconContents, PageEncoder,
    PreferenceControl, PreferenceField, PreferenceValue, PreferencesSurface, Settings,
};

pub const KIND: &str = "brightness";
pub const SET_ICON: &str = "display-brightness-symbolic";
pub const INCREASE_ICON: &str = "daytime-sunrise-symbolic";
pub const DECREASE_ICON: &str = "daytime-sunset-symbolic";

/// How a press changes the brightness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Set it to the configured value.
    #[default]
    Constant,
    Increase,
    Decrease,
}

impl Mode {
    const LABELS: [&'static str; 3] = ["Constant", "Increase", "Decrease"];

    const fn index(self) -> usize {
        match self {
            Self::Constant => 0,
            Self::Increase => 1,
            Self::Decrease => 2,
        }
    }

    const fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Self::Constant),
            1 => Some(Self::Increase),
            2 => Some(Self::Decrease),
            _ => None,
        }
    }

    const fn icon_name(self) -> &'static str {
        match self {
            Self::Constant => SET_ICON,
            Self::Increase => INCREASE_ICON,
            Self::Decrease => DECREASE_ICON,
        }
    }
}

/// Sets, raises or lowers the brightness by `value` percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brightness {
    mode: Mode,
    value: u8,
}

impl Default for Brightness {
    fn default() -> Self {
        Self {
            mode: Mode::Constant,
            value: 1,
        }
    }
}

impl Brightness {
    #[must_use]
    pub const fn new(mode: Mode, value: u8) -> Self {
        Self {
            mode,
            value: if value > 100 { 100 } else { value },
        }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Brightness after one press starting from `current`.
    #[must_use]
    pub fn apply(&self, current: u8) -> u8 {
        match self.mode {
            Mode::Constant => self.value,
            Mode::Increase => current.saturating_add(self.value).min(100),
            Mode::Decrease => current.saturating_sub(self.value),
        }
    }

    fn invalid(reason: impl Into<String>) -> DeckError {
        DeckError::InvalidSettings {
            kind: KIND.to_string(),
            reason: reason.into(),
        }
    }
}

// Clamped first, so the cast cannot truncate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(number: f64) -> u8 {
    number.round().clamp(0.0, 100.0) as u8
}

impl Action for Brightness {
    fn kind_id(&self) -> &str {
        KIND
    }

    fn display_name(&self) -> &str {
        "Brightness"
    }

    fn icon_contents(&self) -> IconContents {
        IconContents::named(self.mode.icon_name())
    }

    fn activate(&mut self, ctx: &ActivationContext) -> Option<DeckCommand> {
        Some(DeckCommand::SetBrightness(self.apply(ctx.brightness)))
    }

    fn preferences(&self) -> Option<PreferencesSurface> {
        Some(PreferencesSurface {
            title: "Brightness".to_string(),
            fields: vec![
                PreferenceField {
                    key: "mode".to_string(),
                    label: "Mode".to_string(),
                    control: PreferenceControl::Choice {
                        options: Mode::LABELS.iter().map(ToString::to_string).collect(),
                        selected: self.mode.index(),
                    },
                },
                PreferenceField {
                    key: "value".to_string(),
                    label: "Value".to_string(),
                    control: PreferenceControl::Range {
                        min: 0.0,
                        max: 100.0,
                        step: 1.0,
                        value: f64::from(self.value),
                    },
                },
            ],
        })
    }

    fn set_preference(&mut self, key: &str, value: &PreferenceValue) -> Result<()> {
        match (key, value) {
            ("mode", PreferenceValue::Choice(index)) => {
                self.mode = u64::try_from(*index)
                    .ok()
                    .and_then(Mode::from_index)
                    .ok_or_else(|| Self::invalid(format!("no mode #{index}")))?;
            }
            ("value", PreferenceValue::Number(number)) => self.value = percent(*number),
            ("mode" | "value", _) => return Err(Self::invalid(format!("wrong value type for '{key}'"))),
            _ => {
                return Err(DeckError::UnknownPreference {
                    kind: KIND.to_string(),
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    fn serialize_settings(&self, _pages: &dyn PageEncoder) -> Settings {
        let mut settings = Settings::new();
        settings.insert("mode".to_string(), Value::from(self.mode.index()));
        settings.insert("value".to_string(), Value::from(self.value));
        settings
    }

    /// Missing keys keep their defaults; malformed ones reject the whole
    /// settings object.
    fn deserialize_settings(&mut self, settings: &Settings, _ctx: &mut BuildContext<'_>) -> Result<()> {
        let mode = match settings.get("mode") {
            None => self.mode,
            Some(raw) => raw
                .as_u64()
                .and_then(Mode::from_index)
                .ok_or_else(|| Self::invalid(format!("bad mode {raw}")))?,
        };
        let value = match settings.get("value") {
            None => self.value,
            Some(raw) => raw
                .as_f64()
                .map(percent)
                .ok_or_else(|| Self::invalid(format!("bad value {raw}")))?,
        };

        self.mode = mode;
        self.value = value;
        Ok(())
    }
}
