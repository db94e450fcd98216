//! Mount-scoped resources: DOM listeners that must be removed on teardown,
//! the animation-frame loop, the stop flag shared with the UI, and the
//! resize debounce polled from the frame loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::wasm_bindgen::JsCast;
use leptos::wasm_bindgen::closure::Closure;
use leptos::web_sys::{Event, EventTarget};

/// Quiet period before a burst of resize events is acted on.
pub const RESIZE_QUIET_MS: f64 = 100.0;

type Listener = Closure<dyn FnMut(Event)>;

/// Owns every listener it registered and removes all of them when dropped,
/// whichever way the owner goes away.
#[derive(Default)]
pub struct ListenerGuard {
    listeners: Vec<(EventTarget, &'static str, Listener)>,
}

impl ListenerGuard {
    pub fn listen(
        &mut self,
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        if let Err(e) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
            log::warn!("could not listen for {}: {:?}", event, e);
            return;
        }
        self.listeners.push((target.clone(), event, closure));
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        for (target, event, closure) in self.listeners.drain(..) {
            let _ = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}

type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn request_frame(slot: &FrameSlot) -> Option<i32> {
    let slot = slot.borrow();
    let closure = slot.as_ref()?;
    leptos::web_sys::window()?
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .ok()
}

/// `requestAnimationFrame` loop. The callback returns false to stop
/// rescheduling; `cancel` (or drop) cancels the outstanding request.
pub struct FrameLoop {
    request_id: Rc<Cell<Option<i32>>>,
    slot: FrameSlot,
}

impl FrameLoop {
    pub fn start(mut on_frame: impl FnMut() -> bool + 'static) -> Self {
        let request_id = Rc::new(Cell::new(None));
        let slot: FrameSlot = Rc::new(RefCell::new(None));
        let next_id = request_id.clone();
        let next_slot = slot.clone();
        *slot.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            next_id.set(None);
            if on_frame() {
                next_id.set(request_frame(&next_slot));
            }
        }) as Box<dyn FnMut()>));
        request_id.set(request_frame(&slot));
        Self { request_id, slot }
    }

    pub fn cancel(&self) {
        if let Some(id) = self.request_id.take() {
            if let Some(window) = leptos::web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        // Breaks the closure -> slot reference cycle.
        self.slot.borrow_mut().take();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Stop flag shared between the mounted UI and the render loop.
///
/// `stop` only flips the flag; the render loop notices it on its next event,
/// drops its `ListenerGuard` and `FrameLoop`, closes the texture inbox and
/// exits. Stopping twice is harmless.
#[derive(Debug, Clone, Default)]
pub struct CarouselHandle {
    stopped: Arc<AtomicBool>,
}

impl CarouselHandle {
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            log::info!("carousel: stopping");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Coalesces a stream of resize notifications into one, fired after
/// `RESIZE_QUIET_MS` without another notification.
#[derive(Debug, Clone, Default)]
pub struct ResizeDebounce {
    last_request: Option<f64>,
}

impl ResizeDebounce {
    pub fn request(&mut self, now_ms: f64) {
        self.last_request = Some(now_ms);
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.last_request.is_some()
    }

    /// True exactly once per burst, when the quiet period has elapsed.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.last_request {
            Some(at) if now_ms - at >= RESIZE_QUIET_MS => {
                self.last_request = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_fires_once_after_quiet_period() {
        let mut debounce = ResizeDebounce::default();
        for t in 0..10 {
            debounce.request(t as f64 * 16.0);
            assert!(!debounce.poll(t as f64 * 16.0 + 1.0));
        }
        let last = 9.0 * 16.0;
        assert!(!debounce.poll(last + 99.0));
        assert!(debounce.poll(last + 100.0));
        assert!(!debounce.poll(last + 500.0));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn stop_is_shared_and_idempotent() {
        let handle = CarouselHandle::default();
        let ui_side = handle.clone();
        assert!(!handle.is_stopped());
        ui_side.stop();
        ui_side.stop();
        assert!(handle.is_stopped());
    }

    #[test]
    fn idle_debounce_never_fires() {
        let mut debounce = ResizeDebounce::default();
        assert!(!debounce.poll(1.0e6));
    }
}
