//! Shadow Atlas Tiling
//!
//! Each frame all shadow tiles of one light class are packed into a single
//! square atlas texture divided into a 1x1, 2x2 or 4x4 grid. This module
//! holds the grid math and the conversion from a tile's light-space
//! view-projection to a matrix that samples the atlas directly.

use glam::{Mat4, Vec2, Vec4};

use crate::command::Viewport;

/// Largest grid dimension an atlas is split into
pub const MAX_SPLIT: u32 = 4;

/// Grid dimension for `tile_count` tiles: 1, 2 or 4
pub fn split_for_tiles(tile_count: u32) -> u32 {
    if tile_count <= 1 {
        1
    } else if tile_count <= 4 {
        2
    } else {
        MAX_SPLIT
    }
}

/// Grid layout of one atlas for the current frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    /// Atlas edge length in pixels
    pub atlas_size: u32,
    pub split: u32,
    /// Tile edge length in pixels
    pub tile_size: u32,
    pub tile_count: u32,
}

impl AtlasLayout {
    pub fn new(atlas_size: u32, tile_count: u32) -> Self {
        let split = split_for_tiles(tile_count);
        Self {
            atlas_size,
            split,
            tile_size: atlas_size / split,
            tile_count,
        }
    }

    /// Tile `index` of this layout
    pub fn tile(&self, index: u32) -> AtlasTile {
        AtlasTile {
            index,
            split: self.split,
            tile_size: self.tile_size,
        }
    }
}

/// One cell of an atlas grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasTile {
    pub index: u32,
    pub split: u32,
    pub tile_size: u32,
}

impl AtlasTile {
    /// Grid coordinate `(index mod split, index div split)`
    pub fn grid(&self) -> (u32, u32) {
        (self.index % self.split, self.index / self.split)
    }

    /// Grid coordinate as the offset used by the atlas matrix
    pub fn offset(&self) -> Vec2 {
        let (x, y) = self.grid();
        Vec2::new(x as f32, y as f32)
    }

    /// Pixel viewport of the tile inside the atlas
    pub fn viewport(&self) -> Viewport {
        let offset = self.offset() * self.tile_size as f32;
        Viewport::new(offset.x, offset.y, self.tile_size as f32, self.tile_size as f32)
    }

    /// Convert a tile's projection * view into an atlas sampling matrix
    pub fn atlas_matrix(&self, view_projection: Mat4, reversed_z: bool) -> Mat4 {
        to_atlas_matrix(view_projection, self.offset(), self.split, reversed_z)
    }
}

/// Remap clip space of a tile into the tile's UV rectangle of the atlas
///
/// x/y go from [-1, 1] to `[offset, offset + 1] / split`, z from [-1, 1] to
/// [0, 1]. With a reversed depth buffer the z row is negated first so the
/// sampled depth compares the right way round.
pub fn to_atlas_matrix(m: Mat4, offset: Vec2, split: u32, reversed_z: bool) -> Mat4 {
    let mut row_x = m.row(0);
    let mut row_y = m.row(1);
    let mut row_z = m.row(2);
    let row_w = m.row(3);

    if reversed_z {
        row_z = -row_z;
    }

    let scale = 1.0 / split as f32;
    row_x = (0.5 * (row_x + row_w) + offset.x * row_w) * scale;
    row_y = (0.5 * (row_y + row_w) + offset.y * row_w) * scale;
    row_z = 0.5 * (row_z + row_w);

    from_rows(row_x, row_y, row_z, row_w)
}

fn from_rows(x: Vec4, y: Vec4, z: Vec4, w: Vec4) -> Mat4 {
    Mat4::from_cols(x, y, z, w).transpose()
}
