use web_sys::{Document, Element};

use crate::config::ElementIds;
use crate::phase::GamePhase;

const NO_TARGET: &str = "—";
const NO_TIME: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelText {
    pub score: String,
    pub target: String,
    pub timer: String,
    pub phase: &'static str,
}

impl PanelText {
    pub fn new(phase: GamePhase, score: u32, target: Option<&str>, remaining: Option<u32>) -> Self {
        Self {
            score: score.to_string(),
            target: target.unwrap_or(NO_TARGET).to_string(),
            timer: remaining.map(format_remaining).unwrap_or_else(|| NO_TIME.to_string()),
            phase: phase.name(),
        }
    }
}

pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Score/timer panel. Every element is optional; missing ones are skipped.
pub struct Panel {
    document: Document,
    score: Option<Element>,
    target: Option<Element>,
    timer: Option<Element>,
    phase: Option<Element>,
    status: Option<Element>,
}

impl Panel {
    pub fn bind(document: &Document, ids: &ElementIds) -> Self {
        Self {
            document: document.clone(),
            score: document.get_element_by_id(&ids.score),
            target: document.get_element_by_id(&ids.target),
            timer: document.get_element_by_id(&ids.timer),
            phase: document.get_element_by_id(&ids.phase),
            status: document.get_element_by_id(&ids.status),
        }
    }

    pub fn show(&self, text: &PanelText) {
        set_text(&self.score, &text.score);
        set_text(&self.target, &text.target);
        set_text(&self.timer, &text.timer);
        set_text(&self.phase, text.phase);
        self.set_root_attribute("data-game-phase", text.phase);
    }

    pub fn set_target_visible(&self, visible: bool) {
        self.set_root_attribute("data-target-visible", if visible { "1" } else { "0" });
    }

    pub fn set_status(&self, status: &str, message: &str) {
        self.set_root_attribute("data-view-status", status);
        set_text(&self.status, message);
    }

    fn set_root_attribute(&self, name: &str, value: &str) {
        if let Some(el) = self.document.document_element() {
            let _ = el.set_attribute(name, value);
        }
    }
}

fn set_text(element: &Option<Element>, text: &str) {
    if let Some(element) = element {
        element.set_text_content(Some(text));
    }
}

pub fn report_fatal(status_id: &str, message: &str) {
    let Some(document) = web_sys::window().and_then(|win| win.document()) else {
        return;
    };
    if let Some(el) = document.document_element() {
        let _ = el.set_attribute("data-view-status", "error");
    }
    if let Some(status) = document.get_element_by_id(status_id) {
        status.set_text_content(Some(message));
    }
}
