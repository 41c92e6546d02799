use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::BlocksConfig;
use super::types::{Block, BlockId};

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    pub opacity: u8,
    pub emission: u8,
    pub watery: bool,
    pub tile_entity: bool,
    pub leaves: bool,
    pub leaf_source: bool,
}

#[derive(Default, Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Resolve a block by name, falling back to air for unknown names.
    pub fn block(&self, name: &str) -> Block {
        Block::new(self.id_by_name(name).unwrap_or(0))
    }

    #[inline]
    pub fn is_solid(&self, b: Block) -> bool {
        self.get(b.id).map(|ty| ty.solid).unwrap_or(false)
    }

    #[inline]
    pub fn opacity(&self, b: Block) -> u8 {
        self.get(b.id).map(|ty| ty.opacity).unwrap_or(0)
    }

    #[inline]
    pub fn emission(&self, b: Block) -> u8 {
        self.get(b.id).map(|ty| ty.emission).unwrap_or(0)
    }

    #[inline]
    pub fn is_watery(&self, b: Block) -> bool {
        self.get(b.id).map(|ty| ty.watery).unwrap_or(false)
    }

    #[inline]
    pub fn has_tile_entity(&self, b: Block) -> bool {
        self.get(b.id).map(|ty| ty.tile_entity).unwrap_or(false)
    }

    #[inline]
    pub fn is_leaves(&self, b: Block) -> bool {
        self.get(b.id).map(|ty| ty.leaves).unwrap_or(false)
    }

    #[inline]
    pub fn is_leaf_source(&self, b: Block) -> bool {
        self.get(b.id).map(|ty| ty.leaf_source).unwrap_or(false)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = BlockRegistry::new();
        for def in cfg.blocks.into_iter() {
            let id = def.id.unwrap_or(reg.blocks.len() as u16);
            if reg.by_name.contains_key(&def.name) {
                return Err(format!("duplicate block name {:?}", def.name).into());
            }
            if (id as usize) != reg.blocks.len() {
                return Err(format!("non-contiguous block id {} for {:?}", id, def.name).into());
            }
            let solid = def.solid.unwrap_or(true);
            let opacity = def.opacity.unwrap_or(if solid { 15 } else { 0 });
            reg.by_name.insert(def.name.clone(), id);
            reg.blocks.push(BlockType {
                id,
                name: def.name,
                solid,
                opacity,
                emission: def.emission.unwrap_or(0),
                watery: def.watery.unwrap_or(false),
                tile_entity: def.tile_entity.unwrap_or(false),
                leaves: def.leaves.unwrap_or(false),
                leaf_source: def.leaf_source.unwrap_or(false),
            });
        }
        if reg.blocks.is_empty() || reg.blocks[0].name != "air" {
            return Err("block id 0 must be \"air\"".into());
        }
        Ok(reg)
    }

    /// Default block set used when no registry configuration is supplied.
    pub fn builtin() -> Self {
        let defs = [
            // name, solid, opacity, emission, watery, tile_entity, leaves, leaf_source
            ("air", false, 0u8, 0u8, false, false, false, false),
            ("stone", true, 15, 0, false, false, false, false),
            ("dirt", true, 15, 0, false, false, false, false),
            ("grass", true, 15, 0, false, false, false, false),
            ("sand", true, 15, 0, false, false, false, false),
            ("bedrock", true, 15, 0, false, false, false, false),
            ("water", false, 1, 0, true, false, false, false),
            ("lava", false, 1, 15, false, false, false, false),
            ("log", true, 15, 0, false, false, false, true),
            ("leaves", true, 1, 0, false, false, true, false),
            ("torch", false, 0, 14, false, false, false, false),
            ("chest", true, 0, 0, false, true, false, false),
        ];
        let mut reg = BlockRegistry::new();
        for (i, &(name, solid, opacity, emission, watery, tile_entity, leaves, leaf_source)) in
            defs.iter().enumerate()
        {
            let id = i as u16;
            reg.by_name.insert(name.to_string(), id);
            reg.blocks.push(BlockType {
                id,
                name: name.to_string(),
                solid,
                opacity,
                emission,
                watery,
                tile_entity,
                leaves,
                leaf_source,
            });
        }
        reg
    }
}
