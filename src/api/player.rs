//! Exported player class
//!
//! `WasmPlayer` wires the engine to the page: a Verovio-rendered score in a
//! container, a JavaScript MIDI player and `requestAnimationFrame`.
//!
//! ```js
//! const player = new WasmPlayer("score", midiBytes, timemapJson, midiPlayer, { velocity: 1.25 });
//! player.play();
//! svg.addEventListener("click", (e) => player.onElementEvent(e.target.closest("g").id));
//! window.addEventListener("resize", (e) => player.notifyResize(e.timeStamp));
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::converters::{verovio::sounding_events, parse_verovio_timemap, StaticConverter};
use crate::options::PlayerOptions;
use crate::renderers::NotationRenderer;
use crate::sync::{FrameScheduler, Player};
use crate::{wasm_info, wasm_warn};

use super::helpers::{deserialize_or_default, serialize, sync_error};
use super::sequencer::{JsAudioSequencer, JsSequencer};
use super::surface::DomSurface;

type SharedPlayer = Rc<RefCell<Player>>;

/// Arms `requestAnimationFrame` for the player it is bound to
///
/// Holds the player weakly: once the `WasmPlayer` is dropped, pending frames
/// find nothing to tick.
struct AnimationFrames {
    target: Rc<RefCell<Weak<RefCell<Player>>>>,
}

impl FrameScheduler for AnimationFrames {
    fn request_frame(&mut self) {
        let target = self.target.borrow().clone();
        let callback = Closure::once_into_js(move |now: f64| {
            let Some(player) = target.upgrade() else {
                return;
            };
            match player.try_borrow_mut() {
                Ok(mut player) => {
                    player.tick(now);
                }
                Err(_) => wasm_warn!("frame dropped: player busy"),
            };
        });

        let Some(window) = web_sys::window() else {
            wasm_warn!("no window, cannot schedule frame");
            return;
        };
        if let Err(e) = window.request_animation_frame(callback.unchecked_ref::<js_sys::Function>()) {
            wasm_warn!("requestAnimationFrame failed: {:?}", e);
        }
    }
}

#[wasm_bindgen]
pub struct WasmPlayer {
    inner: SharedPlayer,
}

#[wasm_bindgen]
impl WasmPlayer {
    /// Load a Verovio-rendered score
    ///
    /// `midi` and `timemap_json` are Verovio's MIDI and timemap outputs for the
    /// SVG already present in `#container_id`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        container_id: &str,
        midi: Vec<u8>,
        timemap_json: &str,
        sequencer: JsSequencer,
        options: JsValue,
    ) -> Result<WasmPlayer, JsValue> {
        let options: PlayerOptions = deserialize_or_default(options, "Invalid player options")?;

        let events = parse_verovio_timemap(timemap_json).map_err(sync_error)?;
        let stream = sounding_events(&events).map_err(sync_error)?;
        let surface = DomSurface::attach(container_id).map_err(sync_error)?;
        let renderer = NotationRenderer::new(surface, stream, options.renderer.clone());
        let converter = StaticConverter::from_verovio(midi, timemap_json);

        let target = Rc::new(RefCell::new(Weak::new()));
        let frames = AnimationFrames {
            target: Rc::clone(&target),
        };

        let player = Player::create(
            options,
            Box::new(converter),
            Box::new(renderer),
            Box::new(JsAudioSequencer::new(sequencer)),
            Box::new(frames),
            "",
        )
        .map_err(sync_error)?;

        let inner = Rc::new(RefCell::new(player));
        *target.borrow_mut() = Rc::downgrade(&inner);
        wasm_info!("score player ready in #{}", container_id);
        Ok(WasmPlayer { inner })
    }

    pub fn play(&self) -> Result<(), JsValue> {
        self.inner.borrow_mut().play().map_err(sync_error)
    }

    pub fn pause(&self) -> Result<(), JsValue> {
        self.inner.borrow_mut().pause().map_err(sync_error)
    }

    pub fn rewind(&self) -> Result<(), JsValue> {
        self.inner.borrow_mut().rewind().map_err(sync_error)
    }

    #[wasm_bindgen(js_name = moveTo)]
    pub fn move_to(&self, measure_index: usize, measure_onset_ms: f64, offset_ms: f64) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .move_to(measure_index, measure_onset_ms, offset_ms)
            .map_err(sync_error)
    }

    /// Navigate to a clicked element; `false` if it starts no event
    #[wasm_bindgen(js_name = onElementEvent)]
    pub fn on_element_event(&self, element_id: &str) -> Result<bool, JsValue> {
        self.inner.borrow_mut().on_element_event(element_id).map_err(sync_error)
    }

    /// Call from the window `resize` handler with the event time
    ///
    /// While paused there is no frame loop, so a timer is armed to apply the
    /// re-layout once the burst settles.
    #[wasm_bindgen(js_name = notifyResize)]
    pub fn notify_resize(&self, now_ms: f64) {
        let delay = {
            let mut player = self.inner.borrow_mut();
            player.notify_resize(now_ms);
            player.options().resize_debounce_ms
        };

        let target = Rc::downgrade(&self.inner);
        let callback = Closure::once_into_js(move || {
            let Some(player) = target.upgrade() else {
                return;
            };
            let now = web_sys::window()
                .and_then(|w| w.performance())
                .map_or(f64::INFINITY, |p| p.now());
            if let Ok(mut player) = player.try_borrow_mut() {
                if let Err(e) = player.poll_resize(now) {
                    wasm_warn!("resize failed: {}", e);
                }
            };
        });
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref::<js_sys::Function>(),
                delay.ceil() as i32,
            ) {
                wasm_warn!("setTimeout failed: {:?}", e);
            }
        }
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        serialize(&self.inner.borrow().state(), "Failed to serialize state")
    }

    #[wasm_bindgen(js_name = durationMs)]
    pub fn duration_ms(&self) -> f64 {
        self.inner.borrow().duration_ms()
    }

    #[wasm_bindgen(js_name = positionMs)]
    pub fn position_ms(&self) -> f64 {
        self.inner.borrow().position_ms()
    }

    /// Aligned MIDI bytes, e.g. for download
    pub fn midi(&self) -> Vec<u8> {
        self.inner.borrow().midi().to_vec()
    }

    pub fn version(&self) -> Result<JsValue, JsValue> {
        serialize(&self.inner.borrow().version(), "Failed to serialize version")
    }

    #[wasm_bindgen(js_name = setMute)]
    pub fn set_mute(&self, mute: bool) {
        self.inner.borrow_mut().set_mute(mute);
    }

    /// `undefined` loops forever
    #[wasm_bindgen(js_name = setRepeat)]
    pub fn set_repeat(&self, repeat: Option<u32>) {
        self.inner.borrow_mut().set_repeat(repeat);
    }

    #[wasm_bindgen(js_name = setVelocity)]
    pub fn set_velocity(&self, velocity: f64) {
        self.inner.borrow_mut().set_velocity(velocity);
    }

    pub fn destroy(&self) {
        self.inner.borrow_mut().destroy();
    }
}
