//! スコープ付きDOMイベントリスナー
//!
//! ウィジェットの表示中だけグローバルイベントを購読し、
//! 非表示・アンマウント時にDropで必ず解除する

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::EventTarget;

use crate::utils::log_trace::log_error;

/// 登録と解除が対になったイベントリスナー。Dropで解除される
pub struct DomListener {
    target: EventTarget,
    event: &'static str,
    capture: bool,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl DomListener {
    pub fn new(
        target: &EventTarget,
        event: &'static str,
        capture: bool,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Self {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
        let attached = target.add_event_listener_with_callback_and_bool(
            event,
            closure.as_ref().unchecked_ref(),
            capture,
        );
        if attached.is_err() {
            log_error("dom", &format!("failed to attach {} listener", event));
        }
        DomListener {
            target: target.clone(),
            event,
            capture,
            closure,
        }
    }

    /// window上のリスナー
    pub fn window(
        event: &'static str,
        capture: bool,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Option<Self> {
        let window = web_sys::window()?;
        Some(Self::new(&window, event, capture, handler))
    }

    /// document上のリスナー（外側クリック検出用）
    pub fn document(
        event: &'static str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self::new(&document, event, false, handler))
    }
}

impl Drop for DomListener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.event,
            self.closure.as_ref().unchecked_ref(),
            self.capture,
        );
    }
}
