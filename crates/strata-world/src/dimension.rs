use std::sync::Arc;

use crate::coords::TileCoord;
use crate::layer::{Layer, LayerExporter};
use crate::settings::ExportSettings;
use crate::tile::Tile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DimensionId {
    Surface,
    SurfaceCeiling,
    Nether,
    NetherCeiling,
    End,
    EndCeiling,
}

impl DimensionId {
    /// The ceiling companion of a primary dimension.
    pub fn ceiling(self) -> Option<DimensionId> {
        match self {
            DimensionId::Surface => Some(DimensionId::SurfaceCeiling),
            DimensionId::Nether => Some(DimensionId::NetherCeiling),
            DimensionId::End => Some(DimensionId::EndCeiling),
            _ => None,
        }
    }

    #[inline]
    pub fn is_ceiling(self) -> bool {
        matches!(
            self,
            DimensionId::SurfaceCeiling | DimensionId::NetherCeiling | DimensionId::EndCeiling
        )
    }
}

impl std::fmt::Display for DimensionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DimensionId::Surface => "surface",
            DimensionId::SurfaceCeiling => "surface ceiling",
            DimensionId::Nether => "nether",
            DimensionId::NetherCeiling => "nether ceiling",
            DimensionId::End => "end",
            DimensionId::EndCeiling => "end ceiling",
        };
        f.write_str(name)
    }
}

/// Border treatment outside the authored tiles. Endless variants suppress
/// border and wall chunk synthesis entirely (the platform extends the
/// terrain itself).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Border {
    Void,
    Water,
    Lava,
    Barren,
    EndlessVoid,
    EndlessWater,
    EndlessLava,
}

impl Border {
    #[inline]
    pub fn is_endless(self) -> bool {
        matches!(
            self,
            Border::EndlessVoid | Border::EndlessWater | Border::EndlessLava
        )
    }
}

/// Read-only query surface over the authored terrain model. The editable
/// model itself (painting, undo) lives outside this system; export only
/// ever consumes it through this trait.
pub trait Dimension: Send + Sync {
    fn id(&self) -> DimensionId;

    fn name(&self) -> &str;

    fn max_height(&self) -> i32;

    /// Height at which an inverted ceiling dimension is mounted.
    fn ceiling_height(&self) -> i32 {
        self.max_height()
    }

    fn tile(&self, at: TileCoord) -> Option<Arc<Tile>>;

    /// Coordinates of every authored tile.
    fn tile_coords(&self) -> Vec<TileCoord>;

    /// All layers painted anywhere on the dimension. Hidden layers are
    /// included only when `include_hidden` is set.
    fn all_layers(&self, include_hidden: bool) -> Vec<Layer>;

    /// Layers applied everywhere regardless of painting.
    fn minimum_layers(&self) -> Vec<Layer>;

    fn border(&self) -> Option<Border>;

    fn border_size(&self) -> i32;

    fn border_level(&self) -> i32;

    fn bedrock_wall(&self) -> bool;

    /// Exporter for a layer, already bound to the layer's settings.
    fn exporter_for(&self, layer: &Layer) -> Option<Arc<dyn LayerExporter>>;

    fn export_settings(&self) -> ExportSettings;

    /// Terrain height at a world-space column, from the owning tile.
    fn height_at(&self, x: i32, z: i32) -> Option<i32> {
        let tile = TileCoord::new(
            x.div_euclid(crate::coords::TILE_SIZE),
            z.div_euclid(crate::coords::TILE_SIZE),
        );
        self.tile(tile).and_then(|t| t.height_at(x, z))
    }

    /// Whether border-chunk synthesis applies: a border is configured, it
    /// is not endless, and its size is non-zero.
    fn border_active(&self) -> bool {
        match self.border() {
            Some(border) => !border.is_endless() && self.border_size() > 0,
            None => false,
        }
    }
}
