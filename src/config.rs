use serde::Deserialize;

use crate::error::ViewError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub detection_interval_ms: u32,
    pub game_state_interval_ms: u32,
    pub countdown_interval_ms: u32,
    pub round_seconds: u32,
    pub poll_action: String,
    // Only used when the host has no push().
    pub start_action: String,
    pub hit_confidence: f64,
    pub style: OverlayStyle,
    pub elements: ElementIds,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            detection_interval_ms: 500,
            game_state_interval_ms: 1000,
            countdown_interval_ms: 1000,
            round_seconds: 60,
            poll_action: "get_data".to_string(),
            start_action: "start_game".to_string(),
            hit_confidence: 0.5,
            style: OverlayStyle::default(),
            elements: ElementIds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub box_color: String,
    pub hit_color: String,
    pub label_color: String,
    pub label_font: String,
    pub line_width: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            box_color: "#00ff00".to_string(),
            hit_color: "#ff3b30".to_string(),
            label_color: "#00ff00".to_string(),
            label_font: "16px sans-serif".to_string(),
            line_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub video: String,
    pub canvas: String,
    pub score: String,
    pub target: String,
    pub timer: String,
    pub phase: String,
    pub status: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            video: "video".to_string(),
            canvas: "overlay".to_string(),
            score: "score".to_string(),
            target: "target".to_string(),
            timer: "timer".to_string(),
            phase: "phase".to_string(),
            status: "status".to_string(),
        }
    }
}

impl ViewConfig {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ViewError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_json::from_value(value.clone()).map_err(|err| ViewError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ViewError> {
        let intervals = [
            ("detection_interval_ms", self.detection_interval_ms),
            ("game_state_interval_ms", self.game_state_interval_ms),
            ("countdown_interval_ms", self.countdown_interval_ms),
            ("round_seconds", self.round_seconds),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(ViewError::Config(format!("{} must be positive", name)));
        }
        if !(0.0..=1.0).contains(&self.hit_confidence) {
            return Err(ViewError::Config("hit_confidence must be within 0..=1".into()));
        }
        Ok(())
    }

    pub fn round_ms(&self) -> f64 {
        f64::from(self.round_seconds) * 1000.0
    }
}
