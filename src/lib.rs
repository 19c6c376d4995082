use log::LevelFilter;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod countdown;
pub mod detection;
pub mod error;
mod host;
mod js;
pub mod logging;
pub mod overlay;
pub mod panel;
pub mod phase;
pub mod polling;
mod session;
pub mod snapshot;
pub mod stream;
mod view;

pub use error::ViewError;
pub use js::to_json;
pub use view::GameView;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logging::init(LevelFilter::Info);
}

#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = logging::parse_level(level)
        .ok_or_else(|| ViewError::Config(format!("unknown log level {:?}", level)))?;
    logging::init(filter);
    Ok(())
}
