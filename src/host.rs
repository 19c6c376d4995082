use js_sys::{Function, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::MediaStream;

use crate::detection::{self, Detection};
use crate::error::ViewError;
use crate::js::{call_async, js_function, js_value_to_string, to_json};
use crate::session::Remote;

const GET_STREAM: &str = "getStream";
const GET_DETECTIONS: &str = "getDetectionsFromCamera";
const SEND_COMMAND: &str = "sendCommand";
const PUSH: &str = "push";

#[derive(Clone)]
pub struct RemoteHost {
    target: JsValue,
    get_stream: Function,
    get_detections: Function,
    send_command: Function,
    // Start button of the controller; rounds only begin through it when present.
    push: Option<Function>,
}

impl RemoteHost {
    pub fn from_js(host: &JsValue) -> Result<Self, ViewError> {
        let lookup = |name: &'static str| js_function(host, name).ok_or(ViewError::MissingHostFn(name));
        Ok(Self {
            target: host.clone(),
            get_stream: lookup(GET_STREAM)?,
            get_detections: lookup(GET_DETECTIONS)?,
            send_command: lookup(SEND_COMMAND)?,
            push: js_function(host, PUSH),
        })
    }
}

impl Remote for RemoteHost {
    type Stream = MediaStream;

    async fn stream(&self, camera: &str) -> Result<MediaStream, ViewError> {
        let stream_err = |reason: String| ViewError::Stream {
            camera: camera.to_string(),
            reason,
        };
        let value = call_async(&self.get_stream, &self.target, &JsValue::from_str(camera))
            .await
            .map_err(stream_err)?;
        value
            .dyn_into::<MediaStream>()
            .map_err(|other| stream_err(format!("expected MediaStream, got {}", js_value_to_string(&other))))
    }

    async fn detections(&self, camera: &str) -> Result<Vec<Detection>, ViewError> {
        let value = call_async(&self.get_detections, &self.target, &JsValue::from_str(camera))
            .await
            .map_err(|reason| ViewError::Remote {
                call: GET_DETECTIONS,
                reason,
            })?;
        let json = to_json(&value).map_err(|reason| ViewError::decode("detections", reason))?;
        detection::decode_batch(&json)
    }

    async fn command(&self, action: &str) -> Result<serde_json::Value, ViewError> {
        let remote_err = |reason: String| ViewError::Remote {
            call: SEND_COMMAND,
            reason,
        };
        let request = Object::new();
        Reflect::set(&request, &JsValue::from_str("action"), &JsValue::from_str(action))
            .map_err(|err| remote_err(js_value_to_string(&err)))?;

        let value = call_async(&self.send_command, &self.target, &JsValue::from(request))
            .await
            .map_err(remote_err)?;
        to_json(&value).map_err(|reason| ViewError::decode("command reply", reason))
    }

    async fn start_round(&self, action: &str) -> Result<(), ViewError> {
        let Some(push) = &self.push else {
            self.command(action).await?;
            return Ok(());
        };
        log::debug!("starting round through {}()", PUSH);
        call_async(push, &self.target, &JsValue::UNDEFINED)
            .await
            .map(|_| ())
            .map_err(|reason| ViewError::Remote { call: PUSH, reason })
    }
}
