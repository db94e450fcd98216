//! three-d scene for the carousel: one image mesh and up to two label meshes
//! per card, rebuilt whenever the item list changes and re-posed every frame.

use std::collections::HashMap;
use std::rc::Rc;

use three_d::*;

use crate::app::carousel::{
    Carousel, FrameSnapshot,
    error::CarouselError,
    geometry::{CARD_SEGMENTS, LABEL_SEGMENTS, PlaneGrid, rounded_corner_alpha},
    label::{LabelAlign, LabelBitmap, LabelCache, LabelRasterizer},
    layout::CardPlacement,
    textures::{PLACEHOLDER_RGBA, TextureState, apply_deliveries},
};

type CardModel = Gm<Mesh, ColorMaterial>;

struct LabelModel {
    model: CardModel,
    offset: [f32; 3],
    distorted: bool,
}

struct CardModels {
    placement: CardPlacement,
    image: CardModel,
    distorted: bool,
    labels: Vec<LabelModel>,
}

pub struct CarouselScene {
    revision: u64,
    card_grid: PlaneGrid,
    label_grid: PlaneGrid,
    cards: Vec<CardModels>,
    textures: Vec<TextureState>,
    scratch: Vec<[f32; 3]>,
}

fn cpu_mesh(grid: &PlaneGrid, positions: &[[f32; 3]]) -> CpuMesh {
    CpuMesh {
        positions: Positions::F32(positions.iter().map(|&[x, y, z]| vec3(x, y, z)).collect()),
        indices: Indices::U32(grid.indices.clone()),
        uvs: Some(grid.uvs.iter().map(|&[u, v]| vec2(u, v)).collect()),
        ..Default::default()
    }
}

fn placeholder_material(context: &Context) -> ColorMaterial {
    let [r, g, b, a] = PLACEHOLDER_RGBA;
    let mut material = ColorMaterial::new_opaque(
        context,
        &CpuMaterial {
            albedo: Srgba::new(r, g, b, a),
            ..Default::default()
        },
    );
    material.render_states.cull = Cull::None;
    material
}

fn bitmap_texture(bitmap: &LabelBitmap) -> CpuTexture {
    CpuTexture {
        data: TextureData::RgbaU8(
            bitmap
                .rgba
                .chunks_exact(4)
                .map(|px| [px[0], px[1], px[2], px[3]])
                .collect(),
        ),
        width: bitmap.width,
        height: bitmap.height,
        min_filter: Interpolation::Linear,
        ..Default::default()
    }
}

fn textured_material(context: &Context, texture: CpuTexture) -> ColorMaterial {
    let mut material = ColorMaterial::new_transparent(
        context,
        &CpuMaterial {
            albedo: Srgba::WHITE,
            albedo_texture: Some(texture),
            ..Default::default()
        },
    );
    material.render_states.cull = Cull::None;
    material
}

/// Bake the rounded corners into a decoded card image. Only 8-bit RGB(A)
/// images are masked; anything else is used as decoded.
pub fn prepare_card_texture(mut texture: CpuTexture) -> CpuTexture {
    let (width, height) = (texture.width, texture.height);
    let mut rgba: Vec<u8> = match &texture.data {
        TextureData::RgbaU8(px) => px.iter().flatten().copied().collect(),
        TextureData::RgbU8(px) => px.iter().flat_map(|&[r, g, b]| [r, g, b, 255]).collect(),
        _ => return texture,
    };
    rounded_corner_alpha(width, height, &mut rgba);
    texture.data = TextureData::RgbaU8(
        rgba.chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect(),
    );
    texture
}

fn card_transform(placement: &CardPlacement, ring_rotation: f32, offset: [f32; 3]) -> Mat4 {
    let [x, y, z] = placement.position;
    Mat4::from_angle_y(radians(ring_rotation))
        * Mat4::from_translation(vec3(x, y, z))
        * Mat4::from_angle_y(radians(placement.facing))
        * Mat4::from_translation(vec3(offset[0], offset[1], offset[2]))
}

impl CarouselScene {
    /// Build meshes for every card. Labels are fetched through `labels`, so
    /// a title shared by repeated cards is only rasterized and uploaded once.
    pub fn build<R: LabelRasterizer>(
        context: &Context,
        carousel: &Carousel,
        labels: &mut LabelCache<R>,
    ) -> Self {
        let config = carousel.config();
        let card_height = config.card_height();
        let label_height = config.label_height();
        let card_grid = PlaneGrid::new(config.card_width, card_height, CARD_SEGMENTS.0, CARD_SEGMENTS.1)
            .with_curvature(config.card_curvature());
        let label_grid = PlaneGrid::new(config.card_width, label_height, LABEL_SEGMENTS.0, LABEL_SEGMENTS.1)
            .with_curvature(config.label_curvature());
        let label_y = -card_height / 2.0 - label_height / 4.0;
        let mut label_materials: HashMap<*const LabelBitmap, ColorMaterial> = HashMap::new();

        let cards = carousel
            .items()
            .iter()
            .zip(carousel.layout().placements())
            .map(|(ring_item, placement)| {
                let image = Gm::new(
                    Mesh::new(context, &cpu_mesh(&card_grid, &card_grid.positions)),
                    placeholder_material(context),
                );
                let mut card_labels = Vec::new();
                let texts = [
                    (Some(ring_item.item.title.as_str()), LabelAlign::Left, [0.01, label_y, -0.05]),
                    (ring_item.item.year.as_deref(), LabelAlign::Right, [-0.01, label_y, -0.05]),
                ];
                for (text, align, offset) in texts {
                    let Some(text) = text.filter(|t| !t.is_empty()) else {
                        continue;
                    };
                    match labels.get(text, align) {
                        Ok(bitmap) => card_labels.push(LabelModel {
                            model: Gm::new(
                                Mesh::new(context, &cpu_mesh(&label_grid, &label_grid.positions)),
                                label_materials
                                    .entry(Rc::as_ptr(&bitmap))
                                    .or_insert_with(|| textured_material(context, bitmap_texture(&bitmap)))
                                    .clone(),
                            ),
                            offset,
                            distorted: false,
                        }),
                        Err(e) => log::warn!("label {:?} skipped: {}", text, e),
                    }
                }
                CardModels {
                    placement,
                    image,
                    distorted: false,
                    labels: card_labels,
                }
            })
            .collect::<Vec<_>>();

        Self {
            revision: carousel.revision(),
            textures: vec![TextureState::Pending; cards.len()],
            card_grid,
            label_grid,
            cards,
            scratch: Vec::new(),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Swap placeholders for loaded images; failed cards keep the placeholder.
    /// Cards sharing one decoded image also share its GPU texture.
    pub fn apply_textures(
        &mut self,
        context: &Context,
        deliveries: Vec<(usize, Result<Rc<CpuTexture>, CarouselError>)>,
    ) {
        let mut uploaded: HashMap<*const CpuTexture, ColorMaterial> = HashMap::new();
        for (index, texture) in apply_deliveries(&mut self.textures, deliveries) {
            let Some(card) = self.cards.get_mut(index) else {
                continue;
            };
            card.image.material = uploaded
                .entry(Rc::as_ptr(&texture))
                .or_insert_with(|| textured_material(context, (*texture).clone()))
                .clone();
        }
    }

    /// Pose every card for this frame and apply the wave to cards inside
    /// its window. Cards that leave the window are restored once.
    pub fn update(&mut self, context: &Context, frame: &FrameSnapshot) {
        let rotation = frame.motion.render_angle();
        for card in &mut self.cards {
            let placement = card.placement;
            let distorted = frame.wave.is_some_and(|wave| {
                wave.distort(&self.card_grid.positions, &mut self.scratch, [0.0; 3], &placement, rotation)
            });
            if distorted {
                card.image.geometry = Mesh::new(context, &cpu_mesh(&self.card_grid, &self.scratch));
            } else if card.distorted {
                card.image.geometry = Mesh::new(context, &cpu_mesh(&self.card_grid, &self.card_grid.positions));
            }
            card.distorted = distorted;
            card.image
                .geometry
                .set_transformation(card_transform(&placement, rotation, [0.0; 3]));

            for label in &mut card.labels {
                let distorted = frame.wave.is_some_and(|wave| {
                    wave.distort(&self.label_grid.positions, &mut self.scratch, label.offset, &placement, rotation)
                });
                if distorted {
                    label.model.geometry = Mesh::new(context, &cpu_mesh(&self.label_grid, &self.scratch));
                } else if label.distorted {
                    label.model.geometry =
                        Mesh::new(context, &cpu_mesh(&self.label_grid, &self.label_grid.positions));
                }
                label.distorted = distorted;
                label
                    .model
                    .geometry
                    .set_transformation(card_transform(&placement, rotation, label.offset));
            }
        }
    }

    pub fn objects(&self) -> impl Iterator<Item = &CardModel> {
        self.cards
            .iter()
            .flat_map(|card| std::iter::once(&card.image).chain(card.labels.iter().map(|l| &l.model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_images_gain_masked_alpha() {
        let texture = CpuTexture {
            data: TextureData::RgbU8(vec![[10, 20, 30]; 512 * 512]),
            width: 512,
            height: 512,
            ..Default::default()
        };
        let prepared = prepare_card_texture(texture);
        let TextureData::RgbaU8(px) = prepared.data else {
            panic!("expected rgba output");
        };
        assert_eq!(px[0], [10, 20, 30, 0]);
        assert_eq!(px[256 * 512 + 256], [10, 20, 30, 255]);
    }

    #[test]
    fn float_images_pass_through() {
        let texture = CpuTexture {
            data: TextureData::RF32(vec![0.5; 4]),
            width: 2,
            height: 2,
            ..Default::default()
        };
        let prepared = prepare_card_texture(texture);
        assert!(matches!(prepared.data, TextureData::RF32(ref v) if v == &vec![0.5; 4]));
    }

    #[test]
    fn card_transform_places_centre_on_ring() {
        let placement = CardPlacement {
            angle: 0.0,
            position: [0.0, 0.0, 5.0],
            facing: std::f32::consts::PI,
        };
        let m = card_transform(&placement, std::f32::consts::FRAC_PI_2, [0.0; 3]);
        let p = m * vec4(0.0, 0.0, 0.0, 1.0);
        assert!((p.x - 5.0).abs() < 1e-4);
        assert!(p.z.abs() < 1e-4);
    }
}
