use std::cmp::Ordering;
use std::error::Error;

use crate::coords::BlockRect;
use crate::dimension::Dimension;
use crate::settings::ExportSettings;
use crate::target::WorldTarget;

/// A named terrain feature painted onto tiles.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Layer {
    pub name: String,
    /// Lower priorities export first within a second-pass stage.
    pub priority: i32,
    /// Layers excluded from export are dropped during discovery.
    pub export: bool,
    pub kind: LayerKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    Simple,
    /// A meta-layer standing for a set of constituent layers; expanded
    /// transitively before export begins.
    Combined(Vec<Layer>),
}

impl Layer {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            export: true,
            kind: LayerKind::Simple,
        }
    }

    pub fn combined(name: impl Into<String>, priority: i32, parts: Vec<Layer>) -> Self {
        Self {
            name: name.into(),
            priority,
            export: true,
            kind: LayerKind::Combined(parts),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.export = false;
        self
    }

    #[inline]
    pub fn is_combined(&self) -> bool {
        matches!(self.kind, LayerKind::Combined(_))
    }
}

impl PartialOrd for Layer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Layer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.export.cmp(&other.export))
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

/// Expand combined layers into their constituents until a full scan finds
/// nothing left to expand, then drop layers excluded from export.
pub fn expand_layers(layers: impl IntoIterator<Item = Layer>) -> Vec<Layer> {
    let mut active: Vec<Layer> = Vec::new();
    for layer in layers {
        if !active.contains(&layer) {
            active.push(layer);
        }
    }
    loop {
        let Some(pos) = active
            .iter()
            .position(|layer| layer.is_combined() && layer.export)
        else {
            break;
        };
        let layer = active.swap_remove(pos);
        if let LayerKind::Combined(parts) = layer.kind {
            for part in parts {
                if !active.contains(&part) {
                    active.push(part);
                }
            }
        }
    }
    active.retain(|layer| layer.export && !layer.is_combined());
    active
}

/// Second-pass stages, executed in this enumeration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Carve,
    AddFeatures,
}

impl Stage {
    pub const ALL: [Stage; 2] = [Stage::Carve, Stage::AddFeatures];
}

/// Capability set declaring which second-pass stages an exporter runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageSet(u8);

impl StageSet {
    pub const EMPTY: StageSet = StageSet(0);

    pub fn of(stages: &[Stage]) -> Self {
        let mut set = StageSet(0);
        for &stage in stages {
            set.0 |= 1 << stage as u8;
        }
        set
    }

    #[inline]
    pub fn contains(self, stage: Stage) -> bool {
        self.0 & (1 << stage as u8) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }
}

pub type FixupError = Box<dyn Error + Send + Sync>;

/// Deferred correction created when a layer effect touches blocks whose
/// correctness depends on a region that has not been exported yet. Applied
/// once all neighbors of the originating region are known.
pub trait Fixup: Send {
    fn apply(
        &self,
        world: &mut dyn WorldTarget,
        dimension: &dyn Dimension,
        settings: &ExportSettings,
    ) -> Result<(), FixupError>;
}

/// Export capability of one layer. Exporters are handed out by the
/// dimension with their settings already bound.
///
/// An exporter with an empty stage set runs only during chunk synthesis
/// (the ordinary pass); a non-empty stage set makes it a second-pass
/// exporter invoked per declared stage over a padded window.
pub trait LayerExporter: Send + Sync {
    fn stages(&self) -> StageSet {
        StageSet::EMPTY
    }

    /// Single-pass application while a chunk is synthesized. `rect` is the
    /// chunk's block footprint; no neighbor access is available.
    fn ordinary_pass(
        &self,
        _dimension: &dyn Dimension,
        _rect: BlockRect,
        _target: &mut dyn WorldTarget,
    ) {
    }

    fn carve(
        &self,
        _dimension: &dyn Dimension,
        _area: BlockRect,
        _exported_area: BlockRect,
        _target: &mut dyn WorldTarget,
    ) -> Vec<Box<dyn Fixup>> {
        Vec::new()
    }

    fn add_features(
        &self,
        _dimension: &dyn Dimension,
        _area: BlockRect,
        _exported_area: BlockRect,
        _target: &mut dyn WorldTarget,
    ) -> Vec<Box<dyn Fixup>> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_layers_expand_to_fixed_point() {
        let caves = Layer::new("caves", 10);
        let frost = Layer::new("frost", 20);
        let deep = Layer::combined("deep", 5, vec![caves.clone()]);
        let winter = Layer::combined("winter", 0, vec![frost.clone(), deep.clone()]);
        let mut out = expand_layers(vec![winter, frost.clone()]);
        out.sort();
        assert_eq!(out, vec![caves, frost]);
    }

    #[test]
    fn hidden_layers_are_dropped() {
        let shown = Layer::new("shown", 1);
        let hidden = Layer::new("hidden", 2).hidden();
        let out = expand_layers(vec![shown.clone(), hidden]);
        assert_eq!(out, vec![shown]);
    }

    #[test]
    fn stage_set_round_trip() {
        let set = StageSet::of(&[Stage::AddFeatures]);
        assert!(set.contains(Stage::AddFeatures));
        assert!(!set.contains(Stage::Carve));
        assert_eq!(set.len(), 1);
        assert!(StageSet::EMPTY.is_empty());
    }

    #[test]
    fn layer_order_is_priority_then_name() {
        let mut layers = vec![
            Layer::new("b", 2),
            Layer::new("a", 2),
            Layer::new("z", 1),
        ];
        layers.sort();
        let names: Vec<&str> = layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "b"]);
    }
}
