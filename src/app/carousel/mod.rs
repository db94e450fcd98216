//! Cylindrical image carousel: the state the renderer draws from.
//!
//! `Carousel` owns the padded item list, the ring layout, the rotation and
//! wave state, and the slide-change callback. It is driven from exactly one
//! place, the per-frame `tick`, plus the input handlers that run on the same
//! thread between frames.

pub mod config;
pub mod error;
pub mod geometry;
pub mod item;
pub mod label;
pub mod layout;
pub mod motion;
pub mod textures;
pub mod wave;

use serde::Deserialize;

use config::CarouselConfig;
use error::CarouselResult;
use item::{CarouselItem, RingItem, normalize_items};
use layout::{RingLayout, view_ray};
use motion::{MotionSnapshot, RingMotion, active_index};
use wave::{WaveField, WaveFrame};

/// Called with the new active index and the card now in front.
pub type SlideChangeCallback = Box<dyn FnMut(usize, &RingItem)>;

/// Contents of `assets/carousel.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarouselManifest {
    #[serde(default)]
    pub config: CarouselConfig,
    pub items: Vec<CarouselItem>,
}

impl CarouselManifest {
    pub fn from_json(json: &str) -> CarouselResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The manifest's config if it validates, the defaults otherwise.
    pub fn checked_config(&self) -> CarouselConfig {
        match self.config.clone().validate() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring manifest config: {}", e);
                CarouselConfig::default()
            }
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub motion: MotionSnapshot,
    pub wave: Option<WaveFrame>,
    pub active: Option<usize>,
    /// Changes whenever the item list (and so the whole scene) changed.
    pub revision: u64,
}

pub struct Carousel {
    config: CarouselConfig,
    items: Vec<RingItem>,
    layout: RingLayout,
    motion: RingMotion,
    wave: WaveField,
    active: Option<usize>,
    revision: u64,
    on_slide_change: Option<SlideChangeCallback>,
}

impl Carousel {
    pub fn new(items: &[CarouselItem], config: CarouselConfig) -> Self {
        let motion = RingMotion::new(
            config.auto_rotate_speed,
            config.auto_rotate,
            config.enable_drag,
            config.enable_wheel,
        );
        let mut carousel = Self {
            layout: RingLayout::new(0, &config),
            config,
            items: Vec::new(),
            motion,
            wave: WaveField::default(),
            active: None,
            revision: 0,
            on_slide_change: None,
        };
        carousel.set_items(items);
        carousel
    }

    /// Replace the item list. Padding, layout and the active card are all
    /// recomputed from scratch; the rotation carries over so nothing snaps.
    pub fn set_items(&mut self, items: &[CarouselItem]) {
        self.items = normalize_items(items, self.config.min_cards);
        self.layout = RingLayout::new(self.items.len(), &self.config);
        self.revision += 1;
        log::info!(
            "carousel: {} items -> {} cards, radius {:.3}",
            items.len(),
            self.items.len(),
            self.layout.radius()
        );
        self.refresh_active();
    }

    pub fn set_on_slide_change(&mut self, callback: impl FnMut(usize, &RingItem) + 'static) {
        self.on_slide_change = Some(Box::new(callback));
    }

    pub fn config(&self) -> &CarouselConfig {
        &self.config
    }

    pub fn items(&self) -> &[RingItem] {
        &self.items
    }

    pub fn layout(&self) -> &RingLayout {
        &self.layout
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_item(&self) -> Option<&RingItem> {
        self.active.and_then(|i| self.items.get(i))
    }

    pub fn motion(&self) -> MotionSnapshot {
        self.motion.snapshot()
    }

    pub fn pointer_down(&mut self, client_x: f32) {
        self.motion.pointer_down(client_x);
    }

    pub fn pointer_move(&mut self, client_x: f32) {
        self.motion.pointer_move(client_x);
    }

    pub fn pointer_up(&mut self) {
        self.motion.pointer_up();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.motion.wheel(delta_y);
    }

    pub fn step_next(&mut self) {
        self.motion.step_next(self.items.len());
    }

    pub fn step_prev(&mut self) {
        self.motion.step_prev(self.items.len());
    }

    pub fn jump_to(&mut self, index: usize) {
        self.motion.jump_to(index, self.items.len());
    }

    /// Click at `ndc` (normalized device coordinates) on a viewport of the
    /// given aspect ratio: the card under the pointer is brought to the
    /// front the short way round. Presses that turned into a drag select
    /// nothing.
    pub fn select_at(&mut self, ndc: [f32; 2], aspect: f32) -> Option<usize> {
        if !self.motion.last_press_was_click() {
            return None;
        }
        let index = self.layout.card_under_ray(
            view_ray(ndc, aspect, self.config.camera_fov),
            self.motion.snapshot().render_angle(),
            self.config.card_width,
            self.config.card_height(),
        )?;
        self.jump_to(index);
        Some(index)
    }

    /// One animation frame, always in this order: auto-rotation and velocity
    /// decay, wave easing, rotation smoothing, slide-change notification.
    pub fn tick(&mut self) -> FrameSnapshot {
        self.motion.drive();
        let wave = if self.items.is_empty() {
            None
        } else {
            self.wave.advance(self.motion.velocity(), self.layout.radius())
        };
        self.motion.smooth();
        self.refresh_active();
        FrameSnapshot {
            motion: self.motion.snapshot(),
            wave,
            active: self.active,
            revision: self.revision,
        }
    }

    fn refresh_active(&mut self) {
        let active = active_index(self.motion.target_rotation(), self.items.len());
        if active == self.active {
            return;
        }
        self.active = active;
        let (Some(index), Some(callback)) = (active, self.on_slide_change.as_mut()) else {
            return;
        };
        if let Some(item) = self.items.get(index) {
            callback(index, item);
        }
    }
}
