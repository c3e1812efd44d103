use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosure, WasmClosureFnOnce};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    AddEventListenerOptions,
    CanvasRenderingContext2d,
    Document,
    EventTarget,
    HtmlCanvasElement,
    HtmlElement,
    HtmlImageElement,
    Response,
    Window,
};

// ==================== Macros ====================
// `format!` style logging straight to the browser console
macro_rules! log {
    ($($t:tt)*) => {
        web_sys::console::log_1(&format!($($t)*).into())
    }
}

macro_rules! error {
    ($($t:tt)*) => {
        web_sys::console::error_1(&format!($($t)*).into())
    }
}

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

// ==================== Window / Document ====================
pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn body() -> Result<HtmlElement> {
    document()?
        .body()
        .ok_or_else(|| anyhow!("Document has no <body>"))
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{:#?}'", html::CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context(html::CONTEXT_2D)
        // Result<Option<Object>, JsValue>
        // - JsValue error -> anyhow
        // - None -> anyhow
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

// ==================== Elements ====================
pub fn create_html_image_element() -> Result<HtmlImageElement> {
    HtmlImageElement::new()
        .map_err(|err| anyhow!("Could not create image element : {:#?}", err))
}

/// Create a detached element and cast it to the requested html type
/// - `create_element::<HtmlDivElement>("div")`
pub fn create_element<T: JsCast>(tag: &str) -> Result<T> {
    document()?
        .create_element(tag)
        .map_err(|err| anyhow!("Could not create <{}> element : {:#?}", tag, err))?
        .dyn_into::<T>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to {}",
                element,
                std::any::type_name::<T>()
            )
        })
}

pub fn element_exists(id: &str) -> Result<bool> {
    Ok(document()?.get_element_by_id(id).is_some())
}

/// Inline css, applied in order
pub fn set_styles(element: &HtmlElement, styles: &[(&str, &str)]) -> Result<()> {
    let style = element.style();
    for (property, value) in styles {
        style
            .set_property(property, value)
            .map_err(|err| anyhow!("Could not set style {} = {} : {:#?}", property, value, err))?;
    }
    Ok(())
}

// ==================== Closures & Events ====================
pub fn closure_once<F, M, A, R>(f: F) -> Closure<M>
where
    F: 'static + WasmClosureFnOnce<M, A, R>,
    M: ?Sized + WasmClosure,
{
    Closure::once(f)
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

/// Fire `callback` once after `millis`, the closure frees itself after running
pub fn set_timeout(millis: i32, callback: impl FnOnce() + 'static) -> Result<i32> {
    let callback = Closure::once_into_js(callback);
    window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
        .map_err(|err| anyhow!("Could not set timeout of {}ms : {:#?}", millis, err))
}

pub fn add_event_listener<T: WasmClosure + ?Sized>(
    target: &EventTarget,
    event: &str,
    callback: &Closure<T>,
) -> Result<()> {
    target
        .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Could not listen to '{}' : {:#?}", event, err))
}

pub fn remove_event_listener<T: WasmClosure + ?Sized>(
    target: &EventTarget,
    event: &str,
    callback: &Closure<T>,
) -> Result<()> {
    target
        .remove_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Could not stop listening to '{}' : {:#?}", event, err))
}

/// Listener the browser removes after the first dispatch
pub fn add_event_listener_once(
    target: &EventTarget,
    event: &str,
    callback: impl FnOnce(web_sys::Event) + 'static,
) -> Result<()> {
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    let callback = Closure::once_into_js(callback);
    target
        .add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.unchecked_ref(),
            &options,
        )
        .map_err(|err| anyhow!("Could not listen once to '{}' : {:#?}", event, err))
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

// ==================== Fetch ====================
pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!("fetching {} returned status {}", json_path, resp.status()));
    }
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}
