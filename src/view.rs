use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use js_sys::Promise;
use log::{error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise, spawn_local};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlVideoElement, MediaStream};

use crate::config::{ElementIds, ViewConfig};
use crate::detection::Detection;
use crate::error::ViewError;
use crate::host::RemoteHost;
use crate::js::{js_value_to_string, to_json};
use crate::overlay::{Highlight, OverlayRenderer};
use crate::panel::{Panel, PanelText, report_fatal};
use crate::polling::LoopToken;
use crate::session::{self, LoopKind, Screen, Session};

type ViewState = Session<RemoteHost, DomScreen>;

struct DomScreen {
    this: Weak<RefCell<ViewState>>,
    video: HtmlVideoElement,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    panel: Panel,
    renderer: OverlayRenderer,
}

impl Screen for DomScreen {
    type Stream = MediaStream;

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    fn show(&self, text: &PanelText) {
        self.panel.show(text);
    }

    fn set_status(&self, status: &str, message: &str) {
        self.panel.set_status(status, message);
    }

    fn set_source(&self, stream: Option<&MediaStream>) {
        self.video.set_src_object(stream);
        if stream.is_none() {
            return;
        }
        match self.video.play() {
            Ok(playing) => spawn_local(async move {
                if let Err(err) = JsFuture::from(playing).await {
                    warn!("video playback: {}", js_value_to_string(&err));
                }
            }),
            Err(err) => warn!("video playback: {}", js_value_to_string(&err)),
        }
    }

    fn repaint(&mut self, detections: &[Detection], highlight: Option<Highlight<'_>>) {
        let (width, height) = (self.video.video_width(), self.video.video_height());
        if width == 0 || height == 0 {
            return;
        }
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }

        let hit = self.renderer.repaint(
            &mut self.ctx,
            f64::from(width),
            f64::from(height),
            detections,
            highlight,
        );
        self.panel.set_target_visible(hit);
    }

    fn clear_overlay(&mut self) {
        let (width, height) = (self.canvas.width(), self.canvas.height());
        self.renderer
            .clear(&mut self.ctx, f64::from(width), f64::from(height));
        self.panel.set_target_visible(false);
    }

    fn schedule(&self, kind: LoopKind, token: LoopToken, delay_ms: u32) -> Option<Timeout> {
        let this = self.this.clone();
        Some(Timeout::new(delay_ms, move || {
            if let Some(state) = this.upgrade() {
                spawn_local(session::run_tick(state, kind, token));
            }
        }))
    }
}

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, ViewError> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
        .ok_or_else(|| ViewError::MissingElement(id.to_string()))
}

fn decode_config(raw: &JsValue) -> Result<ViewConfig, ViewError> {
    let json = to_json(raw).map_err(ViewError::Config)?;
    ViewConfig::from_json(&json)
}

fn fail(status_id: &str, err: ViewError) -> JsValue {
    let message = format!("fatal: {}", err);
    error!("{}", message);
    report_fatal(status_id, &message);
    err.into()
}

fn bootstrap(host: &JsValue, config: ViewConfig) -> Result<Rc<RefCell<ViewState>>, ViewError> {
    let host = RemoteHost::from_js(host)?;
    let document = web_sys::window()
        .and_then(|win| win.document())
        .ok_or_else(|| ViewError::MissingElement("document".to_string()))?;

    let video: HtmlVideoElement = element(&document, &config.elements.video)?;
    let canvas: HtmlCanvasElement = element(&document, &config.elements.canvas)?;
    let ctx = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
        .ok_or_else(|| ViewError::NoContext(config.elements.canvas.clone()))?;
    let panel = Panel::bind(&document, &config.elements);
    panel.set_target_visible(false);

    let state = Rc::new_cyclic(|this| {
        let screen = DomScreen {
            this: this.clone(),
            video,
            canvas,
            ctx,
            panel,
            renderer: OverlayRenderer::new(config.style.clone()),
        };
        RefCell::new(Session::new(config, host, screen))
    });

    {
        let st = state.borrow();
        st.show_panel();
        st.set_status("ready", "Select a camera");
    }
    info!("view ready");
    Ok(state)
}

/// Live view of one remote detection game: camera feed, detection overlay
/// and the score/timer panel.
#[wasm_bindgen]
pub struct GameView {
    state: Rc<RefCell<ViewState>>,
}

#[wasm_bindgen]
impl GameView {
    #[wasm_bindgen(constructor)]
    pub fn new(host: JsValue, config: JsValue) -> Result<GameView, JsValue> {
        let config = decode_config(&config).map_err(|err| fail(&ElementIds::default().status, err))?;
        let status_id = config.elements.status.clone();
        bootstrap(&host, config)
            .map(|state| GameView { state })
            .map_err(|err| fail(&status_id, err))
    }

    #[wasm_bindgen(js_name = selectCamera)]
    pub fn select_camera(&self, camera_id: String) -> Promise {
        let state = Rc::clone(&self.state);
        future_to_promise(async move {
            session::select_camera(state, camera_id)
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(JsValue::from)
        })
    }

    #[wasm_bindgen(js_name = startGame)]
    pub fn start_game(&self) -> Promise {
        let state = Rc::clone(&self.state);
        future_to_promise(async move {
            session::start_game(state)
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(JsValue::from)
        })
    }

    #[wasm_bindgen(js_name = stopGame)]
    pub fn stop_game(&self) {
        self.state.borrow_mut().stop_game();
    }

    pub fn dispose(&self) {
        self.state.borrow_mut().dispose();
    }

    pub fn phase(&self) -> String {
        self.state.borrow().phase().name().to_string()
    }

    pub fn remaining(&self) -> Option<u32> {
        self.state.borrow().remaining()
    }

    pub fn score(&self) -> u32 {
        self.state.borrow().score()
    }

    #[wasm_bindgen(js_name = activeCamera)]
    pub fn active_camera(&self) -> Option<String> {
        self.state.borrow().active_camera().map(str::to_string)
    }
}

impl Drop for GameView {
    fn drop(&mut self) {
        if let Ok(mut st) = self.state.try_borrow_mut() {
            st.dispose();
        }
    }
}
