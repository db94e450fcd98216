//! Title/year labels under each card.
//!
//! Text shaping is expensive, so each (text, alignment) pair is rasterized
//! exactly once and the bitmap is shared by every card that shows it.

use std::collections::HashMap;
use std::rc::Rc;

use leptos::wasm_bindgen::JsCast;
use leptos::web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::error::{CarouselError, CarouselResult};

pub const LABEL_TEXTURE_WIDTH: u32 = 1440;
pub const LABEL_TEXTURE_HEIGHT: u32 = 200;
const LABEL_FONT: &str = "normal 35px Helvetica Neue, Helvetica, Arial, sans-serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelAlign {
    /// Titles.
    Left,
    /// Years.
    Right,
}

/// RGBA8 pixels, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelBitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub trait LabelRasterizer {
    fn rasterize(&mut self, text: &str, align: LabelAlign) -> CarouselResult<LabelBitmap>;
}

/// No rasterizer available (e.g. no 2D canvas): every label is skipped.
impl<R: LabelRasterizer> LabelRasterizer for Option<R> {
    fn rasterize(&mut self, text: &str, align: LabelAlign) -> CarouselResult<LabelBitmap> {
        match self {
            Some(rasterizer) => rasterizer.rasterize(text, align),
            None => Err(CarouselError::canvas("label rasterizer unavailable")),
        }
    }
}

pub struct LabelCache<R> {
    rasterizer: R,
    bitmaps: HashMap<(String, LabelAlign), Rc<LabelBitmap>>,
}

impl<R: LabelRasterizer> LabelCache<R> {
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer,
            bitmaps: HashMap::new(),
        }
    }

    /// Labels are always shown upper-case; the cache key is the displayed text.
    pub fn get(&mut self, text: &str, align: LabelAlign) -> CarouselResult<Rc<LabelBitmap>> {
        let key = (text.to_uppercase(), align);
        if let Some(bitmap) = self.bitmaps.get(&key) {
            return Ok(bitmap.clone());
        }
        let bitmap = Rc::new(self.rasterizer.rasterize(&key.0, align)?);
        self.bitmaps.insert(key, bitmap.clone());
        Ok(bitmap)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.bitmaps.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }
}

/// Draws labels into a detached 2D canvas and reads the pixels back.
pub struct CanvasLabelRasterizer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasLabelRasterizer {
    pub fn new() -> CarouselResult<Self> {
        let document = leptos::web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| CarouselError::canvas("no document"))?;
        let canvas = document
            .create_element("canvas")
            .map_err(|e| CarouselError::canvas(format!("{:?}", e)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| CarouselError::canvas("created element is not a canvas"))?;
        canvas.set_width(LABEL_TEXTURE_WIDTH);
        canvas.set_height(LABEL_TEXTURE_HEIGHT);
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| CarouselError::canvas(format!("{:?}", e)))?
            .ok_or_else(|| CarouselError::canvas("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| CarouselError::canvas("context is not 2d"))?;
        Ok(Self { canvas, ctx })
    }
}

impl LabelRasterizer for CanvasLabelRasterizer {
    fn rasterize(&mut self, text: &str, align: LabelAlign) -> CarouselResult<LabelBitmap> {
        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
        let ctx = &self.ctx;
        ctx.clear_rect(0.0, 0.0, w, h);
        ctx.set_font(LABEL_FONT);
        ctx.set_fill_style_str("white");
        ctx.set_text_baseline("middle");
        let x = match align {
            LabelAlign::Left => {
                ctx.set_text_align("left");
                0.0
            }
            LabelAlign::Right => {
                ctx.set_text_align("right");
                w
            }
        };
        ctx.fill_text(text, x, h / 2.0)
            .map_err(|e| CarouselError::canvas(format!("{:?}", e)))?;
        let image = ctx
            .get_image_data(0.0, 0.0, w, h)
            .map_err(|e| CarouselError::canvas(format!("{:?}", e)))?;
        Ok(LabelBitmap {
            width: image.width(),
            height: image.height(),
            rgba: image.data().0,
        })
    }
}
