use serde::Deserialize;

/// Top-level `[[blocks]]` table loaded from TOML.
#[derive(Deserialize)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
}

#[derive(Deserialize)]
pub struct BlockDef {
    pub name: String,
    pub id: Option<u16>,
    pub solid: Option<bool>,
    /// Light attenuation per step through this block; defaults to 15 for
    /// solid blocks and 0 otherwise.
    pub opacity: Option<u8>,
    pub emission: Option<u8>,
    pub watery: Option<bool>,
    pub tile_entity: Option<bool>,
    pub leaves: Option<bool>,
    pub leaf_source: Option<bool>,
}
