use std::collections::HashMap;
use std::sync::Arc;

use crate::coords::TileCoord;
use crate::dimension::{Border, Dimension, DimensionId};
use crate::layer::{Layer, LayerExporter};
use crate::settings::ExportSettings;
use crate::tile::Tile;

/// In-memory reference implementation of the terrain query surface, used
/// by the test suite and as the adapter for small authored worlds.
pub struct MemoryDimension {
    pub id: DimensionId,
    pub name: String,
    pub max_height: i32,
    pub ceiling_height: i32,
    pub border: Option<Border>,
    pub border_size: i32,
    pub border_level: i32,
    pub bedrock_wall: bool,
    pub settings: ExportSettings,
    tiles: HashMap<TileCoord, Arc<Tile>>,
    minimum_layers: Vec<Layer>,
    exporters: HashMap<String, Arc<dyn LayerExporter>>,
}

impl MemoryDimension {
    pub fn new(id: DimensionId, name: impl Into<String>, max_height: i32) -> Self {
        Self {
            id,
            name: name.into(),
            max_height,
            ceiling_height: max_height,
            border: None,
            border_size: 0,
            border_level: 62,
            bedrock_wall: false,
            settings: ExportSettings::default(),
            tiles: HashMap::new(),
            minimum_layers: Vec::new(),
            exporters: HashMap::new(),
        }
    }

    pub fn insert_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.coord, Arc::new(tile));
    }

    /// Author a rectangle of flat tiles, inclusive bounds in tile space.
    pub fn fill_tiles(&mut self, t0: TileCoord, t1: TileCoord, height: i32) {
        for tx in t0.tx..=t1.tx {
            for tz in t0.tz..=t1.tz {
                self.insert_tile(Tile::new(TileCoord::new(tx, tz), height));
            }
        }
    }

    pub fn add_minimum_layer(&mut self, layer: Layer) {
        if !self.minimum_layers.contains(&layer) {
            self.minimum_layers.push(layer);
        }
    }

    pub fn register_exporter(&mut self, layer: &Layer, exporter: Arc<dyn LayerExporter>) {
        self.exporters.insert(layer.name.clone(), exporter);
    }

    pub fn tile_mut(&mut self, at: TileCoord) -> Option<&mut Tile> {
        self.tiles.get_mut(&at).and_then(Arc::get_mut)
    }
}

impl Dimension for MemoryDimension {
    fn id(&self) -> DimensionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn max_height(&self) -> i32 {
        self.max_height
    }

    fn ceiling_height(&self) -> i32 {
        self.ceiling_height
    }

    fn tile(&self, at: TileCoord) -> Option<Arc<Tile>> {
        self.tiles.get(&at).cloned()
    }

    fn tile_coords(&self) -> Vec<TileCoord> {
        let mut coords: Vec<TileCoord> = self.tiles.keys().copied().collect();
        coords.sort();
        coords
    }

    fn all_layers(&self, include_hidden: bool) -> Vec<Layer> {
        let mut layers: Vec<Layer> = Vec::new();
        for tile in self.tiles.values() {
            for layer in tile.layers() {
                if (include_hidden || layer.export) && !layers.contains(layer) {
                    layers.push(layer.clone());
                }
            }
        }
        layers.sort();
        layers
    }

    fn minimum_layers(&self) -> Vec<Layer> {
        self.minimum_layers.clone()
    }

    fn border(&self) -> Option<Border> {
        self.border
    }

    fn border_size(&self) -> i32 {
        self.border_size
    }

    fn border_level(&self) -> i32 {
        self.border_level
    }

    fn bedrock_wall(&self) -> bool {
        self.bedrock_wall
    }

    fn exporter_for(&self, layer: &Layer) -> Option<Arc<dyn LayerExporter>> {
        self.exporters.get(&layer.name).cloned()
    }

    fn export_settings(&self) -> ExportSettings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_layers_skips_hidden_unless_asked() {
        let mut dim = MemoryDimension::new(DimensionId::Surface, "test", 64);
        let mut tile = Tile::new(TileCoord::new(0, 0), 10);
        tile.add_layer(Layer::new("caves", 1));
        tile.add_layer(Layer::new("scaffolding", 2).hidden());
        dim.insert_tile(tile);
        let shown = dim.all_layers(false);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].name, "caves");
        assert_eq!(dim.all_layers(true).len(), 2);
    }

    #[test]
    fn height_queries_route_through_tiles() {
        let mut dim = MemoryDimension::new(DimensionId::Surface, "test", 64);
        dim.fill_tiles(TileCoord::new(-1, -1), TileCoord::new(0, 0), 17);
        assert_eq!(dim.height_at(-1, -1), Some(17));
        assert_eq!(dim.height_at(127, 127), Some(17));
        assert_eq!(dim.height_at(128, 0), None);
    }
}
