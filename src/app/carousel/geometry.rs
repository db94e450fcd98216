//! CPU-side card geometry: subdivided planes, the cylindrical bow applied
//! to them, and the rounded-corner mask baked into image alpha.

pub const CARD_SEGMENTS: (usize, usize) = (15, 15);
pub const LABEL_SEGMENTS: (usize, usize) = (8, 3);

/// Corner radius in pixels for a 512px-wide image; scaled for other sizes.
const CORNER_RADIUS_AT_512: f32 = 20.0;

/// A `width x height` plane in the XY plane, centred on the origin, split
/// into `segments_x * segments_y` quads. Row 0 is the top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneGrid {
    pub width: f32,
    pub height: f32,
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl PlaneGrid {
    pub fn new(width: f32, height: f32, segments_x: usize, segments_y: usize) -> Self {
        let segments_x = segments_x.max(1);
        let segments_y = segments_y.max(1);
        let columns = segments_x + 1;
        let mut positions = Vec::with_capacity(columns * (segments_y + 1));
        let mut uvs = Vec::with_capacity(positions.capacity());
        for row in 0..=segments_y {
            let v = row as f32 / segments_y as f32;
            for column in 0..=segments_x {
                let u = column as f32 / segments_x as f32;
                positions.push([(u - 0.5) * width, (0.5 - v) * height, 0.0]);
                uvs.push([u, v]);
            }
        }
        let mut indices = Vec::with_capacity(segments_x * segments_y * 6);
        for row in 0..segments_y {
            for column in 0..segments_x {
                let a = (row * columns + column) as u32;
                let b = a + 1;
                let c = a + columns as u32;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }
        Self {
            width,
            height,
            positions,
            uvs,
            indices,
        }
    }

    /// Bow the plane into a shallow cylinder: `z = -factor * (1 - u²)` with
    /// `u = x / (width / 2)`. Edges stay at z = 0.
    pub fn with_curvature(mut self, factor: f32) -> Self {
        let half = self.width / 2.0;
        for p in &mut self.positions {
            let u = if half > 0.0 { p[0] / half } else { 0.0 };
            p[2] = -factor * (1.0 - u * u);
        }
        self
    }
}

/// Multiply the alpha of an RGBA8 image by a rounded-rectangle mask.
pub fn rounded_corner_alpha(width: u32, height: u32, rgba: &mut [u8]) {
    if width == 0 || height == 0 || rgba.len() < (width * height * 4) as usize {
        return;
    }
    let (w, h) = (width as f32, height as f32);
    let radius = (CORNER_RADIUS_AT_512 * w / 512.0).min(w / 2.0).min(h / 2.0);
    for y in 0..height {
        for x in 0..width {
            // Pixel centre.
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let cx = px.clamp(radius, w - radius);
            let cy = py.clamp(radius, h - radius);
            let distance = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
            let coverage = (radius - distance + 0.5).clamp(0.0, 1.0);
            if coverage < 1.0 {
                let i = ((y * width + x) * 4 + 3) as usize;
                rgba[i] = (rgba[i] as f32 * coverage).round() as u8;
            }
        }
    }
}
