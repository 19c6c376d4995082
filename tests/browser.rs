use hunt_view::GameView;
use hunt_view::config::{OverlayStyle, ViewConfig};
use hunt_view::detection::Detection;
use hunt_view::overlay::{Highlight, OverlayRenderer};
use js_sys::{Array, Function, JSON, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

wasm_bindgen_test_configure!(run_in_browser);

fn canvas_2d(width: u32, height: u32) -> CanvasRenderingContext2d {
    let document = web_sys::window()
        .expect("no window")
        .document()
        .expect("no document");
    let canvas = document
        .create_element("canvas")
        .expect("create canvas")
        .dyn_into::<HtmlCanvasElement>()
        .expect("canvas element");
    canvas.set_width(width);
    canvas.set_height(height);

    canvas
        .get_context("2d")
        .expect("get context")
        .expect("2d context")
        .dyn_into::<CanvasRenderingContext2d>()
        .expect("cast 2d")
}

fn pixel(ctx: &CanvasRenderingContext2d, x: f64, y: f64) -> Vec<u8> {
    ctx.get_image_data(x, y, 1.0, 1.0)
        .expect("image data")
        .data()
        .to_vec()
}

fn cup(confidence: f64) -> Detection {
    Detection {
        x_min: 0.1,
        y_min: 0.2,
        x_max: 0.5,
        y_max: 0.6,
        class_name: "Cup".to_string(),
        confidence,
    }
}

#[wasm_bindgen_test]
fn overlay_strokes_mapped_box() {
    let mut ctx = canvas_2d(640, 480);
    let renderer = OverlayRenderer::new(OverlayStyle::default());

    renderer.repaint(&mut ctx, 640.0, 480.0, &[cup(0.9)], None);

    // Left edge of the 64,96 256x192 box.
    assert_eq!(pixel(&ctx, 64.0, 200.0), vec![0, 255, 0, 255]);
    // Box interior is untouched.
    assert_eq!(pixel(&ctx, 200.0, 200.0)[3], 0);
}

#[wasm_bindgen_test]
fn overlay_repaint_replaces_previous_frame() {
    let mut ctx = canvas_2d(640, 480);
    let renderer = OverlayRenderer::new(OverlayStyle::default());

    renderer.repaint(&mut ctx, 640.0, 480.0, &[cup(0.9)], None);
    renderer.repaint(&mut ctx, 640.0, 480.0, &[], None);

    assert_eq!(pixel(&ctx, 64.0, 200.0)[3], 0);
}

#[wasm_bindgen_test]
fn overlay_highlights_target() {
    let mut ctx = canvas_2d(640, 480);
    let renderer = OverlayRenderer::new(OverlayStyle::default());

    let hit = renderer.repaint(
        &mut ctx,
        640.0,
        480.0,
        &[cup(0.9)],
        Some(Highlight {
            item: "cup",
            min_confidence: 0.5,
        }),
    );

    assert!(hit);
    assert_eq!(pixel(&ctx, 64.0, 200.0), vec![255, 59, 48, 255]);
}

#[wasm_bindgen_test]
fn config_decodes_from_js_object() {
    let raw = Object::new();
    Reflect::set(&raw, &JsValue::from_str("round_seconds"), &JsValue::from_f64(45.0))
        .expect("set field");
    let json = hunt_view::to_json(&JsValue::from(raw)).expect("json");

    let config = ViewConfig::from_json(&json).expect("config");
    assert_eq!(config.round_seconds, 45);
    assert_eq!(config.detection_interval_ms, 500);
}

#[wasm_bindgen_test]
fn log_level_can_be_changed() {
    hunt_view::start();
    assert!(hunt_view::set_log_level("debug").is_ok());
    assert_eq!(log::max_level(), log::LevelFilter::Debug);
    assert!(hunt_view::set_log_level("chatty").is_err());
    hunt_view::set_log_level("info").expect("reset level");
}

// Adds a video and canvas under `prefix` and returns a config pointing at them.
fn mount(prefix: &str) -> JsValue {
    let body = web_sys::window()
        .expect("no window")
        .document()
        .expect("no document")
        .body()
        .expect("no body");
    body.insert_adjacent_html(
        "beforeend",
        &format!(r#"<video id="{0}-video"></video><canvas id="{0}-overlay"></canvas>"#, prefix),
    )
    .expect("mount elements");
    JSON::parse(&format!(
        r#"{{"elements":{{"video":"{0}-video","canvas":"{0}-overlay"}}}}"#,
        prefix
    ))
    .expect("config")
}

fn stub_host(with_push: bool) -> Object {
    let host = Object::new();
    let set = |name: &str, func: Function| {
        Reflect::set(&host, &JsValue::from_str(name), &func).expect("set host fn");
    };
    set(
        "getStream",
        Function::new_no_args("return Promise.resolve(new MediaStream());"),
    );
    set(
        "getDetectionsFromCamera",
        Function::new_no_args("return Promise.resolve([]);"),
    );
    set(
        "sendCommand",
        Function::new_with_args(
            "request",
            "this.actions = (this.actions || []).concat([request.action]); return Promise.resolve({});",
        ),
    );
    if with_push {
        set(
            "push",
            Function::new_no_args("this.pushes = (this.pushes || 0) + 1; return Promise.resolve();"),
        );
    }
    host
}

fn host_field(host: &Object, name: &str) -> JsValue {
    Reflect::get(host, &JsValue::from_str(name)).expect("read host field")
}

#[wasm_bindgen_test]
async fn start_presses_push_when_host_has_it() {
    let host = stub_host(true);
    let view = GameView::new(host.clone().into(), mount("push")).expect("view");

    JsFuture::from(view.start_game()).await.expect("start");

    assert_eq!(host_field(&host, "pushes").as_f64(), Some(1.0));
    assert!(host_field(&host, "actions").is_undefined());
    assert_eq!(view.phase(), "starting");
    view.dispose();
}

#[wasm_bindgen_test]
async fn start_falls_back_to_start_command() {
    let host = stub_host(false);
    let view = GameView::new(host.clone().into(), mount("command")).expect("view");

    JsFuture::from(view.start_game()).await.expect("start");

    let actions: Array = host_field(&host, "actions").dyn_into().expect("actions array");
    assert_eq!(actions.length(), 1);
    assert_eq!(actions.get(0).as_string(), Some("start_game".to_string()));
    view.dispose();
}

#[wasm_bindgen_test]
async fn selected_camera_becomes_active() {
    let host = stub_host(false);
    let view = GameView::new(host.into(), mount("camera")).expect("view");

    JsFuture::from(view.select_camera("front".to_string()))
        .await
        .expect("select");

    assert_eq!(view.active_camera(), Some("front".to_string()));
    view.dispose();
    assert_eq!(view.active_camera(), None);
}
