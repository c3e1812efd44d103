use crate::browser;
use anyhow::Result;
use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use futures::channel::oneshot;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{EventTarget, Gamepad, GamepadButton, KeyboardEvent};

// ==================== Keyboard ====================
pub enum KeyPress {
    KeyUp(KeyboardEvent),
    KeyDown(KeyboardEvent),
}

/// Keys currently held down, keyed by `KeyboardEvent.code`
pub struct KeyState {
    pressed_keys: HashMap<String, KeyboardEvent>,
}

impl KeyState {
    pub fn new() -> Self {
        KeyState {
            pressed_keys: HashMap::new(),
        }
    }

    pub fn is_pressed(&self, code: &str) -> bool {
        self.pressed_keys.contains_key(code)
    }

    fn set_pressed(&mut self, code: &str, event: KeyboardEvent) {
        self.pressed_keys.insert(code.into(), event);
    }

    fn set_released(&mut self, code: &str) {
        self.pressed_keys.remove(code);
    }
}

impl Default for KeyState {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards document key events into a channel drained once per frame
pub fn prepare_input() -> Result<UnboundedReceiver<KeyPress>> {
    let (keydown_sender, keyevent_receiver) = unbounded();
    let keyup_sender = keydown_sender.clone();

    let onkeydown = browser::closure_wrap(Box::new(move |keycode: KeyboardEvent| {
        let _ = keydown_sender.unbounded_send(KeyPress::KeyDown(keycode));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let onkeyup = browser::closure_wrap(Box::new(move |keycode: KeyboardEvent| {
        let _ = keyup_sender.unbounded_send(KeyPress::KeyUp(keycode));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let document = browser::document()?;
    browser::add_event_listener(&document, "keydown", &onkeydown)?;
    browser::add_event_listener(&document, "keyup", &onkeyup)?;
    onkeydown.forget();
    onkeyup.forget();

    Ok(keyevent_receiver)
}

pub fn process_input(state: &mut KeyState, keyevent_receiver: &mut UnboundedReceiver<KeyPress>) {
    // try_recv :
    // - Ok(evt) -> event waiting
    // - Err(_)  -> nothing this frame, or the channel closed
    while let Ok(evt) = keyevent_receiver.try_recv() {
        match evt {
            KeyPress::KeyUp(evt) => state.set_released(&evt.code()),
            KeyPress::KeyDown(evt) => state.set_pressed(&evt.code(), evt),
        }
    }
}

// ==================== Activation ====================
/// How the player first poked the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Keyboard,
    Pointer,
    Touch,
    Gamepad,
}

const DOM_ACTIVATIONS: [(&str, Modality); 3] = [
    ("keydown", Modality::Keyboard),
    ("pointerdown", Modality::Pointer),
    ("touchstart", Modality::Touch),
];

type ActivationSender = Rc<RefCell<Option<oneshot::Sender<Modality>>>>;

/// Turns the first keyboard / pointer / touch / gamepad input into a single
/// `Modality` on a oneshot channel.
/// - DOM listeners are removed when the listener is dropped
/// - gamepads have no DOM event for button presses, poll them and `notify`
pub struct ActivationListener {
    sender: ActivationSender,
    target: EventTarget,
    listeners: Vec<(&'static str, Closure<dyn FnMut(web_sys::Event)>)>,
}

impl ActivationListener {
    pub fn listen() -> Result<(Self, oneshot::Receiver<Modality>)> {
        let (tx, rx) = oneshot::channel();
        let mut listener = ActivationListener {
            sender: Rc::new(RefCell::new(Some(tx))),
            target: browser::document()?.into(),
            listeners: Vec::with_capacity(DOM_ACTIVATIONS.len()),
        };

        for (event, modality) in DOM_ACTIVATIONS {
            let sender = listener.sender.clone();
            let callback = browser::closure_wrap(Box::new(move |_: web_sys::Event| {
                notify(&sender, modality);
            }) as Box<dyn FnMut(web_sys::Event)>);
            // an early return drops `listener`, unregistering what was added
            browser::add_event_listener(&listener.target, event, &callback)?;
            listener.listeners.push((event, callback));
        }

        Ok((listener, rx))
    }

    pub fn notify(&self, modality: Modality) {
        notify(&self.sender, modality);
    }

    pub fn is_pending(&self) -> bool {
        self.sender.borrow().is_some()
    }
}

impl Drop for ActivationListener {
    fn drop(&mut self) {
        for (event, callback) in &self.listeners {
            let _ = browser::remove_event_listener(&self.target, event, callback);
        }
    }
}

fn notify(sender: &ActivationSender, modality: Modality) {
    if let Some(tx) = sender.borrow_mut().take() {
        let _ = tx.send(modality);
    }
}

/// true when any button on any connected gamepad is held this frame
pub fn any_gamepad_button_pressed() -> bool {
    let Ok(window) = browser::window() else {
        return false;
    };
    let Ok(gamepads): Result<js_sys::Array, _> = window.navigator().get_gamepads() else {
        return false;
    };
    // disconnected slots come back as null
    gamepads
        .iter()
        .filter_map(|pad| pad.dyn_into::<Gamepad>().ok())
        .any(|pad| {
            pad.buttons()
                .iter()
                .filter_map(|button| button.dyn_into::<GamepadButton>().ok())
                .any(|button| button.pressed())
        })
}
