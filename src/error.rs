use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("missing element #{0}")]
    MissingElement(String),
    #[error("2d context unavailable on #{0}")]
    NoContext(String),
    #[error("host is missing {0}()")]
    MissingHostFn(&'static str),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("stream for camera {camera}: {reason}")]
    Stream { camera: String, reason: String },
    #[error("{call} failed: {reason}")]
    Remote { call: &'static str, reason: String },
    #[error("malformed {what}: {reason}")]
    Decode { what: &'static str, reason: String },
}

impl ViewError {
    pub fn is_surfaced(&self) -> bool {
        !matches!(self, ViewError::Remote { .. } | ViewError::Decode { .. })
    }

    pub fn decode(what: &'static str, reason: impl ToString) -> Self {
        ViewError::Decode {
            what,
            reason: reason.to_string(),
        }
    }
}

impl From<ViewError> for JsValue {
    fn from(err: ViewError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
