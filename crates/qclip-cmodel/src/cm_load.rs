// cm_load.rs — assembles lump arrays into a validated CollisionModel.
//
// Every index, range and count is checked here, once. The tracer and the
// point classifier index the arrays without further checks.

use log::{debug, error, warn};
use qclip_common::q_shared::{vector_length, CPlane, Contents};
use qclip_common::qfiles::{LumpData, LumpKind};
use rayon::prelude::*;

use crate::cmodel::{CBrush, CBrushSide, CLeaf, CNode, CollisionModel, NodeRef, SubModel};
use crate::config::CmodelConfig;
use crate::error::CmodelError;

/// Normals further than this from unit length are reported, not rejected.
const NORMAL_LENGTH_TOLERANCE: f32 = 0.001;

impl CollisionModel {
    /// Builds a model with the default configuration.
    pub fn build(lumps: &LumpData) -> Result<Self, CmodelError> {
        Self::build_with_config(lumps, &CmodelConfig::default())
    }

    /// Validates `lumps` and assembles the immutable model.
    pub fn build_with_config(lumps: &LumpData, config: &CmodelConfig) -> Result<Self, CmodelError> {
        let result = Self::assemble(lumps, config);
        if let Err(ref err) = result {
            error!("CM_LoadMap: {}", err);
        }
        result
    }

    fn assemble(lumps: &LumpData, config: &CmodelConfig) -> Result<Self, CmodelError> {
        check_counts(lumps, config)?;

        // Load in dependency order: each lump only references lumps already checked.
        let planes = load_planes(lumps, config);
        let brushsides = load_brush_sides(lumps, config)?;
        let brushes = load_brushes(lumps, config)?;
        let leafbrushes = load_leaf_brushes(lumps, config)?;
        let leafs = load_leafs(lumps, config)?;
        let nodes = load_nodes(lumps, config)?;
        let submodels = load_submodels(lumps, config)?;

        let numclusters = leafs
            .iter()
            .map(|l| if l.cluster >= 0 { (l.cluster + 1) as usize } else { 0 })
            .max()
            .unwrap_or(0);

        let mut model = CollisionModel {
            planes,
            nodes,
            leafs,
            leafbrushes,
            brushes,
            brushsides,
            submodels,
            numclusters,
            checksum: 0,
        };
        model.checksum = model.compute_checksum();

        debug!(
            "CM_LoadMap: {} planes, {} nodes, {} leafs, {} brushes, {} brushsides, {} models, checksum {:08x}",
            model.planes.len(),
            model.nodes.len(),
            model.leafs.len(),
            model.brushes.len(),
            model.brushsides.len(),
            model.submodels.len(),
            model.checksum
        );
        Ok(model)
    }
}

// ============================================================
// Helpers
// ============================================================

/// Converts every record with `f`, in parallel for large lumps. The first
/// failing record in lump order is reported either way.
fn convert<T, U, F>(records: &[T], config: &CmodelConfig, f: F) -> Result<Vec<U>, CmodelError>
where
    T: Sync,
    U: Send,
    F: Fn(usize, &T) -> Result<U, CmodelError> + Sync + Send,
{
    if config.use_parallel(records.len()) {
        let converted: Vec<Result<U, CmodelError>> =
            records.par_iter().enumerate().map(|(i, r)| f(i, r)).collect();
        converted.into_iter().collect()
    } else {
        records.iter().enumerate().map(|(i, r)| f(i, r)).collect()
    }
}

/// Checks that `first..first + count` lies inside an array of `len` entries.
fn check_range(
    lump: LumpKind,
    index: usize,
    first: i64,
    count: i64,
    len: usize,
    what: &str,
) -> Result<(usize, usize), CmodelError> {
    if first < 0 || count < 0 {
        return Err(CmodelError::malformed(
            lump,
            index,
            format!("negative {} range ({}, {})", what, first, count),
        ));
    }
    if first + count > len as i64 {
        return Err(CmodelError::malformed(
            lump,
            index,
            format!("{} range {}..{} exceeds {}", what, first, first + count, len),
        ));
    }
    Ok((first as usize, count as usize))
}

fn check_counts(lumps: &LumpData, config: &CmodelConfig) -> Result<(), CmodelError> {
    for lump in [
        LumpKind::Planes,
        LumpKind::Nodes,
        LumpKind::Leafs,
        LumpKind::LeafBrushes,
        LumpKind::Brushes,
        LumpKind::BrushSides,
        LumpKind::Models,
    ] {
        let count = lumps.count(lump);
        let required = matches!(
            lump,
            LumpKind::Planes | LumpKind::Nodes | LumpKind::Leafs | LumpKind::Models
        );
        if required && count == 0 {
            return Err(CmodelError::EmptyLump(lump));
        }
        if config.enforce_map_limits && count > lump.max_count() {
            return Err(CmodelError::TooMany {
                lump,
                count,
                max: lump.max_count(),
            });
        }
    }
    Ok(())
}

// ============================================================
// Lump loaders
// ============================================================

fn load_planes(lumps: &LumpData, config: &CmodelConfig) -> Vec<CPlane> {
    let planes: Vec<CPlane> = if config.use_parallel(lumps.planes.len()) {
        lumps.planes.par_iter().map(|p| CPlane::new(p.normal, p.dist)).collect()
    } else {
        lumps.planes.iter().map(|p| CPlane::new(p.normal, p.dist)).collect()
    };

    let odd = planes
        .iter()
        .filter(|p| (vector_length(&p.normal) - 1.0).abs() > NORMAL_LENGTH_TOLERANCE)
        .count();
    if odd > 0 {
        warn!("CM_LoadMap: {} planes with non-unit normals", odd);
    }
    planes
}

fn load_brush_sides(lumps: &LumpData, config: &CmodelConfig) -> Result<Vec<CBrushSide>, CmodelError> {
    let numplanes = lumps.planes.len();
    convert(&lumps.brushsides, config, |i, side| {
        let plane = side.planenum as usize;
        if plane >= numplanes {
            return Err(CmodelError::malformed(
                LumpKind::BrushSides,
                i,
                format!("plane {} out of range ({})", plane, numplanes),
            ));
        }
        Ok(CBrushSide {
            plane,
            surface_flags: side.surface_flags,
        })
    })
}

fn load_brushes(lumps: &LumpData, config: &CmodelConfig) -> Result<Vec<CBrush>, CmodelError> {
    let numsides = lumps.brushsides.len();
    convert(&lumps.brushes, config, |i, brush| {
        let (first_side, num_sides) = check_range(
            LumpKind::Brushes,
            i,
            brush.firstside as i64,
            brush.numsides as i64,
            numsides,
            "side",
        )?;
        Ok(CBrush {
            contents: brush.contents,
            first_side,
            num_sides,
        })
    })
}

fn load_leaf_brushes(lumps: &LumpData, config: &CmodelConfig) -> Result<Vec<usize>, CmodelError> {
    let numbrushes = lumps.brushes.len();
    convert(&lumps.leafbrushes, config, |i, &brush| {
        let brush = brush as usize;
        if brush >= numbrushes {
            return Err(CmodelError::malformed(
                LumpKind::LeafBrushes,
                i,
                format!("brush {} out of range ({})", brush, numbrushes),
            ));
        }
        Ok(brush)
    })
}

fn load_leafs(lumps: &LumpData, config: &CmodelConfig) -> Result<Vec<CLeaf>, CmodelError> {
    if config.require_solid_leaf_zero && lumps.leafs[0].contents != Contents::SOLID {
        return Err(CmodelError::malformed(
            LumpKind::Leafs,
            0,
            "leaf 0 is not CONTENTS_SOLID",
        ));
    }

    let numleafbrushes = lumps.leafbrushes.len();
    convert(&lumps.leafs, config, |i, leaf| {
        let (first_leafbrush, num_leafbrushes) = check_range(
            LumpKind::Leafs,
            i,
            leaf.firstleafbrush as i64,
            leaf.numleafbrushes as i64,
            numleafbrushes,
            "leafbrush",
        )?;
        Ok(CLeaf {
            contents: leaf.contents,
            cluster: leaf.cluster as i32,
            area: leaf.area as i32,
            first_leafbrush,
            num_leafbrushes,
        })
    })
}

/// Decodes and range-checks a child or head reference.
fn check_node_ref(
    lump: LumpKind,
    index: usize,
    raw: i32,
    numnodes: usize,
    numleafs: usize,
) -> Result<NodeRef, CmodelError> {
    let decoded = NodeRef::from_raw(raw);
    match decoded {
        NodeRef::Node(n) if n >= numnodes => Err(CmodelError::malformed(
            lump,
            index,
            format!("node {} out of range ({})", n, numnodes),
        )),
        NodeRef::Leaf(l) if l >= numleafs => Err(CmodelError::malformed(
            lump,
            index,
            format!("leaf {} out of range ({})", l, numleafs),
        )),
        _ => Ok(decoded),
    }
}

fn load_nodes(lumps: &LumpData, config: &CmodelConfig) -> Result<Vec<CNode>, CmodelError> {
    let numplanes = lumps.planes.len();
    let numnodes = lumps.nodes.len();
    let numleafs = lumps.leafs.len();

    convert(&lumps.nodes, config, |i, node| {
        if node.planenum < 0 || node.planenum as usize >= numplanes {
            return Err(CmodelError::malformed(
                LumpKind::Nodes,
                i,
                format!("plane {} out of range ({})", node.planenum, numplanes),
            ));
        }
        let mut children = [NodeRef::Leaf(0); 2];
        for (side, &raw) in node.children.iter().enumerate() {
            let child = check_node_ref(LumpKind::Nodes, i, raw, numnodes, numleafs)?;
            // nodes are emitted parent first, so a child always follows its
            // parent; anything else could loop
            if let NodeRef::Node(n) = child {
                if n <= i {
                    return Err(CmodelError::malformed(
                        LumpKind::Nodes,
                        i,
                        format!("child node {} does not follow its parent", n),
                    ));
                }
            }
            children[side] = child;
        }
        Ok(CNode {
            plane: node.planenum as usize,
            children,
        })
    })
}

fn load_submodels(lumps: &LumpData, config: &CmodelConfig) -> Result<Vec<SubModel>, CmodelError> {
    let numnodes = lumps.nodes.len();
    let numleafs = lumps.leafs.len();
    let spread = if config.spread_submodel_bounds { 1.0 } else { 0.0 };

    convert(&lumps.models, config, |i, model| {
        let headnode = check_node_ref(LumpKind::Models, i, model.headnode, numnodes, numleafs)?;
        let mut sub = SubModel {
            mins: model.mins,
            maxs: model.maxs,
            origin: model.origin,
            headnode,
        };
        // spread the mins / maxs by a unit
        for j in 0..3 {
            sub.mins[j] -= spread;
            sub.maxs[j] += spread;
        }
        Ok(sub)
    })
}
