use web_sys::CanvasRenderingContext2d;

use crate::config::OverlayStyle;
use crate::detection::{Detection, PixelBox, is_hit, map_box};

const LABEL_GAP: f64 = 5.0;
const LABEL_MIN_BASELINE: f64 = 14.0;

/// Drawing primitives the overlay needs from a 2D surface.
pub trait Surface {
    fn clear(&mut self, width: f64, height: f64);
    fn stroke_box(&mut self, bounds: PixelBox, color: &str, line_width: f64);
    fn fill_label(&mut self, text: &str, x: f64, y: f64, color: &str, font: &str);
}

impl Surface for CanvasRenderingContext2d {
    fn clear(&mut self, width: f64, height: f64) {
        self.clear_rect(0.0, 0.0, width, height);
    }

    fn stroke_box(&mut self, bounds: PixelBox, color: &str, line_width: f64) {
        self.set_stroke_style_str(color);
        self.set_line_width(line_width);
        self.stroke_rect(bounds.x, bounds.y, bounds.width, bounds.height);
    }

    fn fill_label(&mut self, text: &str, x: f64, y: f64, color: &str, font: &str) {
        self.set_fill_style_str(color);
        self.set_font(font);
        let _ = self.fill_text(text, x, y);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Highlight<'a> {
    pub item: &'a str,
    pub min_confidence: f64,
}

pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    /// Clears the surface and draws every detection. Returns whether any
    /// detection matched the highlight.
    pub fn repaint<S: Surface>(
        &self,
        surface: &mut S,
        width: f64,
        height: f64,
        detections: &[Detection],
        highlight: Option<Highlight<'_>>,
    ) -> bool {
        surface.clear(width, height);

        let mut any_hit = false;
        for detection in detections {
            let bounds = map_box(detection, width, height);
            let hit = highlight
                .map(|h| is_hit(detection, h.item, h.min_confidence))
                .unwrap_or(false);
            any_hit |= hit;

            let box_color = if hit {
                &self.style.hit_color
            } else {
                &self.style.box_color
            };
            surface.stroke_box(bounds, box_color, self.style.line_width);

            let (x, y) = label_origin(bounds);
            let label_color = if hit {
                &self.style.hit_color
            } else {
                &self.style.label_color
            };
            surface.fill_label(
                &label_text(detection),
                x,
                y,
                label_color,
                &self.style.label_font,
            );
        }
        any_hit
    }

    pub fn clear<S: Surface>(&self, surface: &mut S, width: f64, height: f64) {
        surface.clear(width, height);
    }
}

pub fn label_text(detection: &Detection) -> String {
    format!("{} {:.1}%", detection.class_name, detection.confidence * 100.0)
}

fn label_origin(bounds: PixelBox) -> (f64, f64) {
    (bounds.x, (bounds.y - LABEL_GAP).max(LABEL_MIN_BASELINE))
}
