//! Texture atlas layout.
//!
//! Maps texture names to tiles of a square grid, row-major in insertion
//! order. Only the layout lives here; pixels are the renderer's business.

use std::collections::HashMap;

use strata_core::{BlockFace, BlockRegistry, StrataError, StrataResult};

/// UV rectangle of one atlas tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasRegion {
    /// Left edge.
    pub u0: f32,
    /// Top edge.
    pub v0: f32,
    /// Right edge.
    pub u1: f32,
    /// Bottom edge.
    pub v1: f32,
}

impl AtlasRegion {
    /// The whole texture, used for names the atlas does not know.
    pub const FULL: Self = Self {
        u0: 0.0,
        v0: 0.0,
        u1: 1.0,
        v1: 1.0,
    };

    /// Tile size in UV units.
    #[inline]
    #[must_use]
    pub fn span(&self) -> [f32; 2] {
        [self.u1 - self.u0, self.v1 - self.v0]
    }

    /// UV at a corner of the tile (`cu`, `cv` in {0, 1}).
    #[inline]
    #[must_use]
    pub fn corner(&self, cu: f32, cv: f32) -> [f32; 2] {
        [self.u0 + cu * (self.u1 - self.u0), self.v0 + cv * (self.v1 - self.v0)]
    }
}

impl Default for AtlasRegion {
    fn default() -> Self {
        Self::FULL
    }
}

/// Grid texture atlas.
#[derive(Clone, Debug)]
pub struct TextureAtlas {
    width: u32,
    height: u32,
    tile_size: u32,
    tiles_per_row: u32,
    capacity: usize,
    regions: HashMap<String, AtlasRegion>,
    /// Names in tile order.
    order: Vec<String>,
}

impl TextureAtlas {
    /// Default atlas edge length in pixels.
    pub const DEFAULT_SIZE: u32 = 256;

    /// Default tile edge length in pixels.
    pub const DEFAULT_TILE: u32 = 16;

    /// Creates an empty atlas.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the tile size is zero or larger than
    /// either atlas dimension.
    pub fn new(width: u32, height: u32, tile_size: u32) -> StrataResult<Self> {
        if tile_size == 0 || tile_size > width || tile_size > height {
            return Err(StrataError::InvalidConfig(format!(
                "atlas tile size {tile_size} does not fit a {width}x{height} atlas"
            )));
        }
        let tiles_per_row = width / tile_size;
        let capacity = (tiles_per_row * (height / tile_size)) as usize;
        Ok(Self {
            width,
            height,
            tile_size,
            tiles_per_row,
            capacity,
            regions: HashMap::with_capacity(capacity.min(256)),
            order: Vec::with_capacity(capacity.min(256)),
        })
    }

    /// Lays out every face texture of every registered block, in id order.
    ///
    /// # Errors
    ///
    /// Returns `AtlasFull` if the registry names more textures than fit,
    /// or the errors of [`new`](Self::new).
    pub fn from_registry(registry: &BlockRegistry, width: u32, height: u32, tile_size: u32) -> StrataResult<Self> {
        let mut atlas = Self::new(width, height, tile_size)?;
        for block in registry.iter() {
            for face in BlockFace::ALL {
                let name = block.texture(face);
                if !name.is_empty() {
                    atlas.add(name)?;
                }
            }
        }
        Ok(atlas)
    }

    /// Assigns the next free tile to a texture. Adding a known name returns
    /// its existing region.
    ///
    /// # Errors
    ///
    /// Returns `AtlasFull` when every tile is taken.
    pub fn add(&mut self, name: &str) -> StrataResult<AtlasRegion> {
        if let Some(region) = self.regions.get(name) {
            return Ok(*region);
        }
        let tile = self.order.len();
        if tile >= self.capacity {
            return Err(StrataError::AtlasFull {
                capacity: self.capacity,
                texture: name.to_owned(),
            });
        }

        let (tile_x, tile_y) = self.tile_xy(tile);
        let (w, h, t) = (self.width as f32, self.height as f32, self.tile_size as f32);
        let region = AtlasRegion {
            u0: tile_x as f32 * t / w,
            v0: tile_y as f32 * t / h,
            u1: (tile_x + 1) as f32 * t / w,
            v1: (tile_y + 1) as f32 * t / h,
        };

        self.regions.insert(name.to_owned(), region);
        self.order.push(name.to_owned());
        Ok(region)
    }

    #[inline]
    fn tile_xy(&self, tile: usize) -> (u32, u32) {
        let tile = tile as u32;
        (tile % self.tiles_per_row, tile / self.tiles_per_row)
    }

    /// Region of a texture, or the full texture if unknown.
    #[must_use]
    pub fn region(&self, name: &str) -> AtlasRegion {
        self.regions.get(name).copied().unwrap_or(AtlasRegion::FULL)
    }

    /// Region of a texture, if laid out.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<AtlasRegion> {
        self.regions.get(name).copied()
    }

    /// Grid cell `(column, row)` of a texture.
    #[must_use]
    pub fn tile_position(&self, name: &str) -> Option<(u32, u32)> {
        self.order.iter().position(|n| n == name).map(|tile| self.tile_xy(tile))
    }

    /// Texture names in tile order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of laid out textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no texture is laid out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of tiles.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tile edge length in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Atlas `(width, height)` in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let mut atlas = TextureAtlas::new(64, 32, 16).unwrap();
        assert_eq!(atlas.capacity(), 8);

        let first = atlas.add("stone").unwrap();
        assert_eq!(first, AtlasRegion { u0: 0.0, v0: 0.0, u1: 0.25, v1: 0.5 });

        for name in ["a", "b", "c", "d"] {
            atlas.add(name).unwrap();
        }
        assert_eq!(atlas.tile_position("d"), Some((0, 1)));
        let d = atlas.region("d");
        assert_eq!(d, AtlasRegion { u0: 0.0, v0: 0.5, u1: 0.25, v1: 1.0 });
        assert_eq!(d.span(), [0.25, 0.5]);
    }

    #[test]
    fn test_duplicate_add_reuses_tile() {
        let mut atlas = TextureAtlas::new(32, 32, 16).unwrap();
        let a = atlas.add("dirt").unwrap();
        assert_eq!(atlas.add("dirt").unwrap(), a);
        assert_eq!(atlas.len(), 1);
    }

    #[test]
    fn test_full_atlas() {
        let mut atlas = TextureAtlas::new(32, 16, 16).unwrap();
        atlas.add("a").unwrap();
        atlas.add("b").unwrap();
        assert_eq!(
            atlas.add("c").unwrap_err(),
            StrataError::AtlasFull {
                capacity: 2,
                texture: "c".to_owned()
            }
        );
    }

    #[test]
    fn test_missing_texture_is_full_tile() {
        let atlas = TextureAtlas::new(256, 256, 16).unwrap();
        assert_eq!(atlas.region("nope"), AtlasRegion::FULL);
        assert!(atlas.get("nope").is_none());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(TextureAtlas::new(16, 16, 0).is_err());
        assert!(TextureAtlas::new(16, 16, 32).is_err());
    }

    #[test]
    fn test_from_registry() {
        let registry = BlockRegistry::with_defaults();
        let atlas = TextureAtlas::from_registry(&registry, 256, 256, 16).unwrap();

        for name in ["stone", "grass_top", "grass_side", "dirt", "glass"] {
            assert!(atlas.get(name).is_some(), "{name} missing");
        }
        // Air has no texture; dirt is shared by grass and dirt
        let unique: std::collections::HashSet<&str> = atlas.names().collect();
        assert_eq!(unique.len(), atlas.len());
    }
}
