use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde_json::Value;

use crate::error::ViewError;

const SENTINEL: &str = "none";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const EPOCH_SECONDS_LIMIT: f64 = 1e11;

/// Round start as reported by the controller, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundStart {
    None,
    At(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub score: u32,
    pub item_to_detect: String,
    pub time_round_start: RoundStart,
}

impl GameSnapshot {
    pub fn from_value(value: &Value) -> Result<Self, ViewError> {
        let fields = value
            .as_object()
            .ok_or_else(|| ViewError::decode("snapshot", "expected an object"))?;

        let item_to_detect = match fields.get("item_to_detect") {
            Some(Value::String(item)) => item.trim().to_string(),
            Some(other) => {
                return Err(ViewError::decode(
                    "snapshot",
                    format!("item_to_detect is {}", other),
                ));
            }
            None => return Err(ViewError::decode("snapshot", "item_to_detect missing")),
        };

        let time_round_start = match fields.get("time_round_start") {
            Some(raw) => parse_round_start(raw).map_err(|reason| ViewError::decode("snapshot", reason))?,
            None => return Err(ViewError::decode("snapshot", "time_round_start missing")),
        };

        let score = match fields.get("score") {
            None | Some(Value::Null) => 0,
            Some(raw) => parse_score(raw).map_err(|reason| ViewError::decode("snapshot", reason))?,
        };

        Ok(Self {
            score,
            item_to_detect,
            time_round_start,
        })
    }

    /// No target and no round start: the controller has ended the round.
    pub fn is_over(&self) -> bool {
        self.item_to_detect.is_empty() && self.time_round_start == RoundStart::None
    }

    pub fn target(&self) -> Option<&str> {
        let item = self.item_to_detect.as_str();
        if item.is_empty() || item.eq_ignore_ascii_case(SENTINEL) {
            None
        } else {
            Some(item)
        }
    }
}

pub fn parse_round_start(raw: &Value) -> Result<RoundStart, String> {
    match raw {
        Value::Null => Ok(RoundStart::None),
        Value::Number(number) => {
            let value = number
                .as_f64()
                .ok_or_else(|| format!("time_round_start {} out of range", number))?;
            if value < EPOCH_SECONDS_LIMIT {
                Ok(RoundStart::At(value * 1000.0))
            } else {
                Ok(RoundStart::At(value))
            }
        }
        Value::String(text) => parse_timestamp(text),
        other => Err(format!("time_round_start is {}", other)),
    }
}

fn parse_timestamp(text: &str) -> Result<RoundStart, String> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case(SENTINEL) {
        return Ok(RoundStart::None);
    }

    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(RoundStart::At(stamp.timestamp_millis() as f64));
    }

    // The controller formats its local wall clock without an offset.
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|stamp| RoundStart::At(stamp.timestamp_millis() as f64))
                .ok_or_else(|| format!("time_round_start {:?} does not exist locally", text));
        }
    }

    Err(format!("unrecognised time_round_start {:?}", text))
}

fn parse_score(raw: &Value) -> Result<u32, String> {
    let value = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|value| value.is_finite())
    .ok_or_else(|| format!("score is {}", raw))?;

    Ok(value.max(0.0).min(f64::from(u32::MAX)).floor() as u32)
}
