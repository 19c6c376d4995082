use log::debug;
use serde::Deserialize;

use crate::error::ViewError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
    #[serde(alias = "xMin")]
    pub x_min: f64,
    #[serde(alias = "yMin")]
    pub y_min: f64,
    #[serde(alias = "xMax")]
    pub x_max: f64,
    #[serde(alias = "yMax")]
    pub y_max: f64,
    #[serde(alias = "className", default)]
    pub class_name: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSpace {
    Normalized,
    Pixel,
}

impl CoordinateSpace {
    pub fn of(detection: &Detection) -> Self {
        let corners = [
            detection.x_min,
            detection.y_min,
            detection.x_max,
            detection.y_max,
        ];
        if corners.iter().all(|v| *v <= 1.0) {
            CoordinateSpace::Normalized
        } else {
            CoordinateSpace::Pixel
        }
    }

    pub fn of_batch(detections: &[Detection]) -> Self {
        if detections
            .iter()
            .any(|d| CoordinateSpace::of(d) == CoordinateSpace::Pixel)
        {
            CoordinateSpace::Pixel
        } else {
            CoordinateSpace::Normalized
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

// Inverted boxes keep a negative extent instead of being rejected.
pub fn map_box(detection: &Detection, canvas_width: f64, canvas_height: f64) -> PixelBox {
    let (sx, sy) = match CoordinateSpace::of(detection) {
        CoordinateSpace::Normalized => (canvas_width, canvas_height),
        CoordinateSpace::Pixel => (1.0, 1.0),
    };

    let x = detection.x_min * sx;
    let y = detection.y_min * sy;
    PixelBox {
        x,
        y,
        width: detection.x_max * sx - x,
        height: detection.y_max * sy - y,
    }
}

pub fn is_hit(detection: &Detection, item: &str, min_confidence: f64) -> bool {
    detection.confidence > min_confidence && detection.class_name.eq_ignore_ascii_case(item)
}

pub fn decode_batch(value: &serde_json::Value) -> Result<Vec<Detection>, ViewError> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => return Ok(Vec::new()),
        other => return Err(ViewError::decode("detections", format!("expected list, got {}", other))),
    };

    let mut detections = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match Detection::deserialize(item) {
            Ok(detection) if is_finite(&detection) => detections.push(detection),
            Ok(_) => debug!("dropping detection #{} with non-finite box", index),
            Err(err) => debug!("dropping detection #{}: {}", index, err),
        }
    }
    Ok(detections)
}

fn is_finite(detection: &Detection) -> bool {
    [
        detection.x_min,
        detection.y_min,
        detection.x_max,
        detection.y_max,
        detection.confidence,
    ]
    .iter()
    .all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn det(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Detection {
        Detection {
            x_min,
            y_min,
            x_max,
            y_max,
            class_name: "cup".to_string(),
            confidence: 0.9,
        }
    }

    fn assert_box(actual: PixelBox, expected: (f64, f64, f64, f64)) {
        let got = (actual.x, actual.y, actual.width, actual.height);
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        assert!(
            close(got.0, expected.0)
                && close(got.1, expected.1)
                && close(got.2, expected.2)
                && close(got.3, expected.3),
            "got {:?}, expected {:?}",
            got,
            expected
        );
    }

    #[test]
    fn normalized_box_scales_to_canvas() {
        let mapped = map_box(&det(0.1, 0.2, 0.5, 0.6), 640.0, 480.0);
        assert_box(mapped, (64.0, 96.0, 256.0, 192.0));
    }

    #[test]
    fn pixel_box_passes_through() {
        let mapped = map_box(&det(10.0, 20.0, 110.0, 70.0), 640.0, 480.0);
        assert_box(mapped, (10.0, 20.0, 100.0, 50.0));
    }

    #[test]
    fn single_coordinate_above_one_switches_to_pixels() {
        let d = det(0.0, 0.0, 2.0, 0.5);
        assert_eq!(CoordinateSpace::of(&d), CoordinateSpace::Pixel);
        assert_box(map_box(&d, 640.0, 480.0), (0.0, 0.0, 2.0, 0.5));
    }

    #[test]
    fn exactly_one_is_still_normalized() {
        let d = det(0.0, 0.0, 1.0, 1.0);
        assert_eq!(CoordinateSpace::of(&d), CoordinateSpace::Normalized);
        assert_box(map_box(&d, 320.0, 240.0), (0.0, 0.0, 320.0, 240.0));
    }

    #[test]
    fn inverted_box_is_tolerated() {
        let mapped = map_box(&det(0.5, 0.5, 0.25, 0.5), 100.0, 100.0);
        assert_box(mapped, (50.0, 50.0, -25.0, 0.0));
    }

    #[test]
    fn batch_space_follows_any_pixel_entry() {
        let batch = vec![det(0.1, 0.1, 0.2, 0.2), det(5.0, 5.0, 10.0, 10.0)];
        assert_eq!(CoordinateSpace::of_batch(&batch), CoordinateSpace::Pixel);
        assert_eq!(CoordinateSpace::of_batch(&batch[..1]), CoordinateSpace::Normalized);
        assert_eq!(CoordinateSpace::of_batch(&[]), CoordinateSpace::Normalized);
    }

    #[test]
    fn hit_requires_matching_class_and_confidence() {
        let mut d = det(0.0, 0.0, 0.1, 0.1);
        assert!(is_hit(&d, "Cup", 0.5));
        assert!(!is_hit(&d, "Fork", 0.5));
        d.confidence = 0.5;
        assert!(!is_hit(&d, "cup", 0.5));
    }

    #[test]
    fn decode_accepts_both_spellings_and_skips_junk() {
        let batch = decode_batch(&json!([
            { "xMin": 0.1, "yMin": 0.2, "xMax": 0.3, "yMax": 0.4, "className": "Dog", "confidence": 0.8 },
            { "x_min": 10, "y_min": 20, "x_max": 30, "y_max": 40, "class_name": "Cat", "confidence": 0.6 },
            { "xMin": "left" },
            42
        ]))
        .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].class_name, "Dog");
        assert_eq!(batch[1].x_max, 30.0);
    }

    #[test]
    fn decode_rejects_non_list_payload() {
        assert!(decode_batch(&json!({ "detections": [] })).is_err());
        assert!(decode_batch(&serde_json::Value::Null).unwrap().is_empty());
    }
}
