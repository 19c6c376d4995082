use js_sys::{Function, JSON, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

pub fn js_value_to_string(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}

pub fn js_function(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

/// Calls `func` with one argument and awaits the result, whether or not the
/// callee returned a promise.
pub async fn call_async(func: &Function, this: &JsValue, arg: &JsValue) -> Result<JsValue, String> {
    let returned = func
        .call1(this, arg)
        .map_err(|err| js_value_to_string(&err))?;
    JsFuture::from(Promise::resolve(&returned))
        .await
        .map_err(|err| js_value_to_string(&err))
}

pub fn to_json(value: &JsValue) -> Result<serde_json::Value, String> {
    if value.is_undefined() || value.is_null() {
        return Ok(serde_json::Value::Null);
    }
    let text = JSON::stringify(value).map_err(|err| js_value_to_string(&err))?;
    let text = text
        .as_string()
        .ok_or_else(|| "value is not JSON serialisable".to_string())?;
    serde_json::from_str(&text).map_err(|err| err.to_string())
}
