// qfiles.rs — lump records handed over by the map loader.
// The byte-level BSP parser lives with the asset pipeline; these are the
// decoded arrays it produces and the collision model consumes.

use crate::q_shared::{Contents, SurfaceFlags, Vec3};

// ============================================================
// Upper design bounds
// ============================================================

pub const MAX_MAP_MODELS: usize = 1024;
pub const MAX_MAP_BRUSHES: usize = 8192;
pub const MAX_MAP_PLANES: usize = 65536;
pub const MAX_MAP_NODES: usize = 65536;
pub const MAX_MAP_BRUSHSIDES: usize = 65536;
pub const MAX_MAP_LEAFS: usize = 65536;
pub const MAX_MAP_LEAFBRUSHES: usize = 65536;
pub const MAX_MAP_AREAS: usize = 256;

/// Identifies a lump in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LumpKind {
    Planes,
    Nodes,
    Leafs,
    LeafBrushes,
    Brushes,
    BrushSides,
    Models,
}

impl LumpKind {
    /// Engine limit for the number of records in this lump.
    pub fn max_count(self) -> usize {
        match self {
            LumpKind::Planes => MAX_MAP_PLANES,
            LumpKind::Nodes => MAX_MAP_NODES,
            LumpKind::Leafs => MAX_MAP_LEAFS,
            LumpKind::LeafBrushes => MAX_MAP_LEAFBRUSHES,
            LumpKind::Brushes => MAX_MAP_BRUSHES,
            LumpKind::BrushSides => MAX_MAP_BRUSHSIDES,
            LumpKind::Models => MAX_MAP_MODELS,
        }
    }
}

impl std::fmt::Display for LumpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LumpKind::Planes => "planes",
            LumpKind::Nodes => "nodes",
            LumpKind::Leafs => "leafs",
            LumpKind::LeafBrushes => "leafbrushes",
            LumpKind::Brushes => "brushes",
            LumpKind::BrushSides => "brushsides",
            LumpKind::Models => "models",
        };
        f.write_str(name)
    }
}

// ============================================================
// Lump records
// ============================================================

/// Sub-model record: bounds, local origin and root of its private subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DModel {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub origin: Vec3,
    /// Node index, or `-1 - leaf` for a model that is a single leaf.
    pub headnode: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DPlane {
    pub normal: Vec3,
    pub dist: f32,
    /// Axis type as stored in the file; the collision model re-derives it.
    pub plane_type: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DNode {
    pub planenum: i32,
    /// negative numbers are -(leafs+1), not nodes
    pub children: [i32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DLeaf {
    pub contents: Contents,
    pub cluster: i16,
    pub area: i16,
    pub firstleafbrush: u16,
    pub numleafbrushes: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DBrushSide {
    pub planenum: u16,
    pub surface_flags: SurfaceFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DBrush {
    pub firstside: i32,
    pub numsides: i32,
    pub contents: Contents,
}

/// All collision-relevant lumps of one map.
#[derive(Debug, Clone, Default)]
pub struct LumpData {
    pub planes: Vec<DPlane>,
    pub nodes: Vec<DNode>,
    pub leafs: Vec<DLeaf>,
    pub leafbrushes: Vec<u16>,
    pub brushes: Vec<DBrush>,
    pub brushsides: Vec<DBrushSide>,
    pub models: Vec<DModel>,
}

impl LumpData {
    /// Number of records in the given lump.
    pub fn count(&self, lump: LumpKind) -> usize {
        match lump {
            LumpKind::Planes => self.planes.len(),
            LumpKind::Nodes => self.nodes.len(),
            LumpKind::Leafs => self.leafs.len(),
            LumpKind::LeafBrushes => self.leafbrushes.len(),
            LumpKind::Brushes => self.brushes.len(),
            LumpKind::BrushSides => self.brushsides.len(),
            LumpKind::Models => self.models.len(),
        }
    }
}
