//! Bridge to `window.Telegram.WebApp`.
//!
//! Every call degrades to a no-op outside Telegram so the app can be opened
//! in a plain browser during development.

use js_sys::{Function, Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

fn property(target: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn call(target: &JsValue, name: &str, args: &[&JsValue]) {
    let Some(function) = property(target, name).and_then(|f| f.dyn_into::<Function>().ok()) else {
        return;
    };
    let result = match args {
        [] => function.call0(target),
        [a] => function.call1(target, a),
        [a, b, ..] => function.call2(target, a, b),
    };
    if let Err(e) = result {
        log::warn!(target: "telegram", "WebApp.{} failed: {:?}", name, e);
    }
}

/// `window.Telegram.WebApp`, when running inside Telegram
pub fn web_app() -> Option<JsValue> {
    let window: JsValue = web_sys::window()?.into();
    let telegram = property(&window, "Telegram")?;
    property(&telegram, "WebApp")
}

/// Raw signed init data, `None` until Telegram provides a non-empty value
pub fn init_data() -> Option<String> {
    web_app()
        .and_then(|app| property(&app, "initData"))
        .and_then(|data| data.as_string())
        .filter(|data| !data.trim().is_empty())
}

/// Tell Telegram the app is ready and take the full viewport height
pub fn ready_and_expand() {
    if let Some(app) = web_app() {
        call(&app, "ready", &[]);
        call(&app, "expand", &[]);
        log::info!(target: "telegram", "WebApp ready");
    } else {
        log::info!(target: "telegram", "Running outside Telegram");
    }
}

/// Copy `themeParams` onto `--tg-theme-*` CSS variables of the root element
pub fn apply_theme() {
    let Some(params) = web_app().and_then(|app| property(&app, "themeParams")) else {
        return;
    };
    let Some(root) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.document_element())
        .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok())
    else {
        return;
    };

    let style = root.style();
    for (variable, value) in theme_variables(&params) {
        if let Err(e) = style.set_property(&variable, &value) {
            log::warn!(target: "telegram", "Cannot set {}: {:?}", variable, e);
        }
    }
}

/// `(css variable, value)` pairs for the string entries of `themeParams`
fn theme_variables(params: &JsValue) -> Vec<(String, String)> {
    Object::keys(params.unchecked_ref::<Object>())
        .iter()
        .filter_map(|key| {
            let name = key.as_string()?;
            let value = Reflect::get(params, &key).ok()?.as_string()?;
            Some((format!("--tg-theme-{}", name.replace('_', "-")), value))
        })
        .collect()
}

/// One of the native Telegram buttons with a click handler attached.
///
/// The handler is detached and the button hidden on drop.
pub struct NativeButton {
    button: JsValue,
    handler: Closure<dyn FnMut()>,
}

impl NativeButton {
    fn attach(name: &str, on_click: impl FnMut() + 'static) -> Option<Self> {
        let button = property(&web_app()?, name)?;
        let handler = Closure::<dyn FnMut()>::new(on_click);
        call(&button, "onClick", &[handler.as_ref()]);
        call(&button, "show", &[]);
        Some(Self { button, handler })
    }

    /// Bottom `MainButton` with `text`
    pub fn main(text: &str, on_click: impl FnMut() + 'static) -> Option<Self> {
        let button = Self::attach("MainButton", on_click)?;
        button.set_text(text);
        Some(button)
    }

    /// Header `BackButton`
    pub fn back(on_click: impl FnMut() + 'static) -> Option<Self> {
        Self::attach("BackButton", on_click)
    }

    pub fn set_text(&self, text: &str) {
        call(&self.button, "setText", &[&JsValue::from_str(text)]);
    }

    pub fn set_progress(&self, busy: bool) {
        if busy {
            call(&self.button, "showProgress", &[&JsValue::FALSE]);
        } else {
            call(&self.button, "hideProgress", &[]);
        }
    }
}

impl Drop for NativeButton {
    fn drop(&mut self) {
        call(&self.button, "offClick", &[self.handler.as_ref()]);
        call(&self.button, "hide", &[]);
    }
}

/// Write `text` to the clipboard through `navigator.clipboard.writeText`
pub async fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let window: JsValue = web_sys::window()
        .ok_or_else(|| "no window".to_string())?
        .into();
    let clipboard = property(&window, "navigator")
        .and_then(|navigator| property(&navigator, "clipboard"))
        .ok_or_else(|| "clipboard unavailable".to_string())?;
    let write = property(&clipboard, "writeText")
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| "clipboard unavailable".to_string())?;
    let promise = write
        .call1(&clipboard, &JsValue::from_str(text))
        .map_err(|e| format!("{:?}", e))?;
    wasm_bindgen_futures::JsFuture::from(promise.unchecked_into::<js_sys::Promise>())
        .await
        .map(|_| ())
        .map_err(|e| format!("{:?}", e))
}

/// `?debug=1` in the page URL
pub fn debug_requested() -> bool {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .is_some_and(|query| {
            query
                .trim_start_matches('?')
                .split('&')
                .any(|pair| pair == "debug=1" || pair == "debug=true")
        })
}
