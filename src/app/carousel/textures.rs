//! Per-card texture delivery.
//!
//! Image loads are fire-and-forget; each one reports back into a
//! `TextureInbox` tagged with the generation it was started for. The frame
//! loop drains the inbox and only applies results for the current
//! generation, so loads that finish after the item list changed, or after
//! teardown, are dropped instead of landing on a card that no longer exists.

use std::cell::RefCell;
use std::rc::Rc;

use super::error::CarouselError;

/// What a card currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    /// Neutral placeholder while the image is in flight.
    Pending,
    Ready,
    /// Load failed; the placeholder stays for good.
    Failed,
}

/// Placeholder colour for cards without an image.
pub const PLACEHOLDER_RGBA: [u8; 4] = [0x1a, 0x1a, 0x1a, 0xff];

struct Delivery<T> {
    generation: u64,
    index: usize,
    result: Result<T, CarouselError>,
}

struct InboxInner<T> {
    generation: u64,
    closed: bool,
    deliveries: Vec<Delivery<T>>,
}

/// Shared, single-threaded mailbox between loader futures and the frame loop.
pub struct TextureInbox<T> {
    inner: Rc<RefCell<InboxInner<T>>>,
}

impl<T> Clone for TextureInbox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for TextureInbox<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(InboxInner {
                generation: 0,
                closed: false,
                deliveries: Vec::new(),
            })),
        }
    }
}

impl<T> TextureInbox<T> {
    /// Start a new generation; everything still in flight becomes stale.
    pub fn next_generation(&self) -> u64 {
        let mut inner = self.inner.borrow_mut();
        inner.generation += 1;
        inner.deliveries.clear();
        inner.generation
    }

    /// Stop accepting deliveries for good (component teardown).
    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.closed = true;
        inner.deliveries.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Called by a loader when its image resolves. Returns false when the
    /// result was discarded.
    pub fn deliver(&self, generation: u64, index: usize, result: Result<T, CarouselError>) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.closed || generation != inner.generation {
            return false;
        }
        inner.deliveries.push(Delivery {
            generation,
            index,
            result,
        });
        true
    }

    /// Take every delivery for the current generation.
    pub fn drain(&self) -> Vec<(usize, Result<T, CarouselError>)> {
        let mut inner = self.inner.borrow_mut();
        let current = inner.generation;
        std::mem::take(&mut inner.deliveries)
            .into_iter()
            .filter(|d| d.generation == current)
            .map(|d| (d.index, d.result))
            .collect()
    }
}

/// Apply drained results to per-card states and hand back the successful
/// payloads. Failures are logged and leave the placeholder in place.
pub fn apply_deliveries<T>(
    states: &mut [TextureState],
    deliveries: Vec<(usize, Result<T, CarouselError>)>,
) -> Vec<(usize, T)> {
    let mut ready = Vec::new();
    for (index, result) in deliveries {
        let Some(state) = states.get_mut(index) else {
            continue;
        };
        match result {
            Ok(texture) => {
                *state = TextureState::Ready;
                ready.push((index, texture));
            }
            Err(e) => {
                log::warn!("card {} keeps its placeholder: {}", index, e);
                *state = TextureState::Failed;
            }
        }
    }
    ready
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_generation_is_delivered() {
        let inbox = TextureInbox::<&str>::default();
        let generation = inbox.next_generation();
        assert!(inbox.deliver(generation, 2, Ok("two")));
        let drained = inbox.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0, 2);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn stale_generation_is_dropped() {
        let inbox = TextureInbox::<&str>::default();
        let old = inbox.next_generation();
        assert!(inbox.deliver(old, 0, Ok("queued before the switch")));
        let new = inbox.next_generation();
        assert!(!inbox.deliver(old, 1, Ok("late")));
        assert!(inbox.drain().is_empty());
        assert!(inbox.deliver(new, 1, Ok("fresh")));
        assert_eq!(inbox.drain().len(), 1);
    }

    #[test]
    fn closed_inbox_discards_everything() {
        let inbox = TextureInbox::<u8>::default();
        let generation = inbox.next_generation();
        let loader_side = inbox.clone();
        inbox.close();
        assert!(loader_side.is_closed());
        assert!(!loader_side.deliver(generation, 0, Ok(1)));
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn failures_are_isolated_per_card() {
        let mut states = vec![TextureState::Pending; 3];
        let ready = apply_deliveries(
            &mut states,
            vec![
                (0, Ok(10)),
                (1, Err(CarouselError::fetch("404"))),
                (2, Ok(12)),
                (7, Ok(99)),
            ],
        );
        assert_eq!(states, vec![TextureState::Ready, TextureState::Failed, TextureState::Ready]);
        assert_eq!(ready, vec![(0, 10), (2, 12)]);
    }
}
