//! # Blocks
//!
//! Block identifiers, face directions, physical properties and the
//! block registry.
//!
//! ## Registry Ownership
//!
//! There is no global registry. A `BlockRegistry` is built by the caller
//! (usually once at startup), optionally locked, and passed by reference
//! into generators and meshers. Tests build fixture registries freely.
//!
//! ## TOML Format
//!
//! ```toml
//! [[blocks]]
//! id = 9
//! name = "ice"
//! display_name = "Ice"
//! solid = true
//! transparent = true
//! texture = "ice"
//! ```

use std::collections::HashMap;
use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::Deserialize;

use crate::error::{StrataError, StrataResult};

/// A block type identifier. `0` is always air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct BlockId(pub u8);

impl BlockId {
    /// Air (empty space).
    pub const AIR: Self = Self(0);
    /// Stone.
    pub const STONE: Self = Self(1);
    /// Grass block.
    pub const GRASS: Self = Self(2);
    /// Dirt.
    pub const DIRT: Self = Self(3);
    /// Sand.
    pub const SAND: Self = Self(4);
    /// Glass.
    pub const GLASS: Self = Self(5);
    /// Snow block.
    pub const SNOW_BLOCK: Self = Self(6);
    /// Jungle grass.
    pub const JUNGLE_GRASS: Self = Self(7);
    /// Sandstone.
    pub const SANDSTONE: Self = Self(8);

    /// Creates a block id from its raw byte.
    #[inline]
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw byte.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns true if this is air.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One of the six faces of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockFace {
    /// +Y
    Top = 0,
    /// -Y
    Bottom = 1,
    /// -Z
    North = 2,
    /// +Z
    South = 3,
    /// +X
    East = 4,
    /// -X
    West = 5,
}

impl BlockFace {
    /// All faces in index order.
    pub const ALL: [Self; 6] = [
        Self::Top,
        Self::Bottom,
        Self::North,
        Self::South,
        Self::East,
        Self::West,
    ];

    /// Stable index (0-5), used for per-face texture lookup.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Unit offset `(dx, dy, dz)` pointing out of the face.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Top => (0, 1, 0),
            Self::Bottom => (0, -1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::East => (1, 0, 0),
            Self::West => (-1, 0, 0),
        }
    }

    /// The face pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    /// Finds the face with the given unit offset.
    #[must_use]
    pub fn from_offset(dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|face| face.offset() == (dx, dy, dz))
    }

    /// Human readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Top => "Top",
            Self::Bottom => "Bottom",
            Self::North => "North",
            Self::South => "South",
            Self::East => "East",
            Self::West => "West",
        }
    }
}

/// Physical and rendering properties of a block type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockProperties {
    solid: bool,
    transparent: bool,
    light_emitting: bool,
    light_level: u8,
    gravity: bool,
}

impl BlockProperties {
    /// Maximum light level.
    pub const MAX_LIGHT: u8 = 15;

    /// Creates a property set. `light_level` is clamped to `0..=15`.
    #[must_use]
    pub const fn new(
        solid: bool,
        transparent: bool,
        light_emitting: bool,
        light_level: u8,
        gravity: bool,
    ) -> Self {
        let light_level = if light_level > Self::MAX_LIGHT {
            Self::MAX_LIGHT
        } else {
            light_level
        };
        Self {
            solid,
            transparent,
            light_emitting,
            light_level,
            gravity,
        }
    }

    /// Solid and opaque.
    #[must_use]
    pub const fn solid() -> Self {
        Self::new(true, false, false, 0, false)
    }

    /// Solid but see-through (glass, ice).
    #[must_use]
    pub const fn transparent() -> Self {
        Self::new(true, true, false, 0, false)
    }

    /// Empty space.
    #[must_use]
    pub const fn air() -> Self {
        Self::new(false, true, false, 0, false)
    }

    /// Whether the block occupies its cell.
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        self.solid
    }

    /// Whether light and sight pass through.
    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.transparent
    }

    /// Whether the block emits light.
    #[inline]
    #[must_use]
    pub const fn is_light_emitting(self) -> bool {
        self.light_emitting
    }

    /// Emitted light level (0-15).
    #[inline]
    #[must_use]
    pub const fn light_level(self) -> u8 {
        self.light_level
    }

    /// Whether the block falls when unsupported.
    #[inline]
    #[must_use]
    pub const fn has_gravity(self) -> bool {
        self.gravity
    }
}

/// A registered block type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockDefinition {
    id: BlockId,
    name: String,
    display_name: String,
    properties: BlockProperties,
    /// Texture names indexed by `BlockFace::index`.
    textures: [String; 6],
}

impl BlockDefinition {
    /// Creates a block using one texture on every face.
    #[must_use]
    pub fn new(
        id: BlockId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        properties: BlockProperties,
        texture: &str,
    ) -> Self {
        Self::with_face_textures(
            id,
            name,
            display_name,
            properties,
            std::array::from_fn(|_| texture.to_owned()),
        )
    }

    /// Creates a block with one texture per face
    /// (order: top, bottom, north, south, east, west).
    #[must_use]
    pub fn with_face_textures(
        id: BlockId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        properties: BlockProperties,
        textures: [String; 6],
    ) -> Self {
        Self {
            id,
            name: name.into(),
            display_name: display_name.into(),
            properties,
            textures,
        }
    }

    /// Block id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Registry name (unique).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Block properties.
    #[inline]
    #[must_use]
    pub const fn properties(&self) -> BlockProperties {
        self.properties
    }

    /// Texture name for a face. Empty for textureless blocks (air).
    #[must_use]
    pub fn texture(&self, face: BlockFace) -> &str {
        &self.textures[face.index()]
    }
}

/// One `[[blocks]]` entry of a registry TOML file.
#[derive(Debug, Deserialize)]
struct BlockEntry {
    id: u8,
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default = "default_true")]
    solid: bool,
    #[serde(default)]
    transparent: bool,
    #[serde(default)]
    light_level: u8,
    #[serde(default)]
    gravity: bool,
    #[serde(default)]
    texture: Option<String>,
    #[serde(default)]
    textures: Option<[String; 6]>,
}

const fn default_true() -> bool {
    true
}

/// Root of a registry TOML file.
#[derive(Debug, Deserialize)]
struct BlocksFile {
    #[serde(default)]
    blocks: Vec<BlockEntry>,
}

/// Registry of block types, indexed by id and by name.
///
/// Air is registered at id 0 on construction and is the fallback for
/// every unregistered id.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    /// 256 slots, one per possible id.
    blocks: Vec<Option<BlockDefinition>>,
    by_name: HashMap<String, BlockId>,
    /// Fallback returned for unregistered ids.
    air: BlockDefinition,
    locked: bool,
}

impl BlockRegistry {
    /// Number of possible block ids.
    pub const CAPACITY: usize = 256;

    /// Creates a registry containing only air.
    #[must_use]
    pub fn new() -> Self {
        let air = BlockDefinition::new(BlockId::AIR, "air", "Air", BlockProperties::air(), "");
        let mut blocks = vec![None; Self::CAPACITY];
        blocks[0] = Some(air.clone());
        let mut by_name = HashMap::with_capacity(32);
        by_name.insert("air".to_owned(), BlockId::AIR);
        Self {
            blocks,
            by_name,
            air,
            locked: false,
        }
    }

    /// Creates a registry with the default block palette.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for block in default_blocks() {
            // Default ids and names are distinct by construction.
            let _ = registry.register(block);
        }
        registry
    }

    /// Builds a registry (air plus the listed blocks) from TOML.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML and the registration
    /// errors of [`register`](Self::register).
    pub fn from_toml_str(source: &str) -> StrataResult<Self> {
        let mut registry = Self::new();
        registry.extend_from_toml(source)?;
        Ok(registry)
    }

    /// Registers every block listed in a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML and the registration
    /// errors of [`register`](Self::register).
    pub fn extend_from_toml(&mut self, source: &str) -> StrataResult<()> {
        let file: BlocksFile =
            toml::from_str(source).map_err(|e| StrataError::InvalidConfig(e.to_string()))?;

        for entry in file.blocks {
            let properties = BlockProperties::new(
                entry.solid,
                entry.transparent,
                entry.light_level > 0,
                entry.light_level,
                entry.gravity,
            );
            let display_name = entry.display_name.unwrap_or_else(|| entry.name.clone());
            let textures = match (entry.textures, entry.texture) {
                (Some(textures), _) => textures,
                (None, Some(texture)) => std::array::from_fn(|_| texture.clone()),
                (None, None) => std::array::from_fn(|_| entry.name.clone()),
            };
            self.register(BlockDefinition::with_face_textures(
                BlockId(entry.id),
                entry.name,
                display_name,
                properties,
                textures,
            ))?;
        }
        Ok(())
    }

    /// Registers a block.
    ///
    /// # Errors
    ///
    /// - `RegistryLocked` after [`lock`](Self::lock)
    /// - `DuplicateBlockId` if the id is taken
    /// - `DuplicateBlockName` if the name is taken
    pub fn register(&mut self, block: BlockDefinition) -> StrataResult<()> {
        if self.locked {
            return Err(StrataError::RegistryLocked);
        }
        let slot = usize::from(block.id.0);
        if let Some(existing) = &self.blocks[slot] {
            return Err(StrataError::DuplicateBlockId {
                id: block.id.0,
                existing: existing.name.clone(),
            });
        }
        if self.by_name.contains_key(&block.name) {
            return Err(StrataError::DuplicateBlockName(block.name));
        }

        self.by_name.insert(block.name.clone(), block.id);
        self.blocks[slot] = Some(block);
        Ok(())
    }

    /// Looks up a block by id, falling back to air.
    #[inline]
    #[must_use]
    pub fn get(&self, id: BlockId) -> &BlockDefinition {
        self.blocks[usize::from(id.0)].as_ref().unwrap_or(&self.air)
    }

    /// Properties of a block id (air properties if unregistered).
    #[inline]
    #[must_use]
    pub fn properties(&self, id: BlockId) -> BlockProperties {
        self.get(id).properties
    }

    /// Looks up a block by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&BlockDefinition> {
        self.by_name.get(name).map(|&id| self.get(id))
    }

    /// Resolves a block name to its id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBlock` if no block has this name.
    pub fn id_of(&self, name: &str) -> StrataResult<BlockId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| StrataError::UnknownBlock(name.to_owned()))
    }

    /// Whether a block is registered under this id.
    #[inline]
    #[must_use]
    pub fn is_registered(&self, id: BlockId) -> bool {
        self.blocks[usize::from(id.0)].is_some()
    }

    /// Fails with `UnknownBlockId` unless `id` is registered.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBlockId` for unregistered ids.
    pub fn require(&self, id: BlockId) -> StrataResult<()> {
        if self.is_registered(id) {
            Ok(())
        } else {
            Err(StrataError::UnknownBlockId(id.0))
        }
    }

    /// Iterates registered blocks in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.blocks.iter().filter_map(Option::as_ref)
    }

    /// Number of registered blocks (including air).
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Always false: air is always registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Prevents further registration.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Whether the registry is locked.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// The default palette (everything except air).
fn default_blocks() -> Vec<BlockDefinition> {
    let side = |top: &str, bottom: &str, side: &str| -> [String; 6] {
        [
            top.to_owned(),
            bottom.to_owned(),
            side.to_owned(),
            side.to_owned(),
            side.to_owned(),
            side.to_owned(),
        ]
    };

    vec![
        BlockDefinition::new(BlockId::STONE, "stone", "Stone", BlockProperties::solid(), "stone"),
        BlockDefinition::with_face_textures(
            BlockId::GRASS,
            "grass",
            "Grass Block",
            BlockProperties::solid(),
            side("grass_top", "dirt", "grass_side"),
        ),
        BlockDefinition::new(BlockId::DIRT, "dirt", "Dirt", BlockProperties::solid(), "dirt"),
        BlockDefinition::new(
            BlockId::SAND,
            "sand",
            "Sand",
            BlockProperties::new(true, false, false, 0, true),
            "sand",
        ),
        BlockDefinition::new(BlockId::GLASS, "glass", "Glass", BlockProperties::transparent(), "glass"),
        BlockDefinition::new(
            BlockId::SNOW_BLOCK,
            "snow_block",
            "Snow Block",
            BlockProperties::solid(),
            "snow",
        ),
        BlockDefinition::with_face_textures(
            BlockId::JUNGLE_GRASS,
            "jungle_grass",
            "Jungle Grass",
            BlockProperties::solid(),
            side("jungle_grass_top", "dirt", "jungle_grass_side"),
        ),
        BlockDefinition::new(
            BlockId::SANDSTONE,
            "sandstone",
            "Sandstone",
            BlockProperties::solid(),
            "sandstone",
        ),
    ]
}
