// cmodel.rs — the immutable collision model and its point / leaf queries

use crc::{Crc, CRC_32_ISO_HDLC};
use qclip_common::q_shared::{
    box_on_plane_side, BoxPlaneSide, CPlane, Contents, SurfaceFlags, Vec3,
};
use qclip_common::qfiles::{DBrush, DBrushSide, DLeaf, DModel, DNode, DPlane, LumpData};

use crate::error::CmodelError;

// ============================================================
// Runtime structures
// ============================================================

/// A node child: either another node or a leaf.
///
/// Lumps encode leaves as `-1 - leaf`; [`NodeRef::from_raw`] is the only
/// place that convention is decoded.
///
/// Queries index the model with the reference directly. Refs built by hand
/// rather than taken from a [`SubModel`] should be checked with
/// [`CollisionModel::contains_node`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Node(usize),
    Leaf(usize),
}

impl NodeRef {
    pub fn from_raw(raw: i32) -> Self {
        if raw >= 0 {
            NodeRef::Node(raw as usize)
        } else {
            NodeRef::Leaf((-1 - raw as i64) as usize)
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            NodeRef::Node(n) => n as i32,
            NodeRef::Leaf(l) => (-1 - l as i64) as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CNode {
    pub plane: usize,
    /// [front, back]
    pub children: [NodeRef; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CBrushSide {
    pub plane: usize,
    pub surface_flags: SurfaceFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CLeaf {
    pub contents: Contents,
    pub cluster: i32,
    pub area: i32,
    pub first_leafbrush: usize,
    pub num_leafbrushes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CBrush {
    pub contents: Contents,
    pub first_side: usize,
    pub num_sides: usize,
}

/// A separately rooted subtree: the world (model 0) or a brush entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubModel {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub origin: Vec3,
    pub headnode: NodeRef,
}

/// Leaves touched by a box, from [`CollisionModel::box_leafnums`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxLeafs {
    pub leafs: Vec<usize>,
    /// First node whose plane splits the box, if any.
    pub topnode: Option<usize>,
    /// The leaf limit was reached before the walk finished.
    pub truncated: bool,
}

// ============================================================
// CollisionModel
// ============================================================

/// One map's collision geometry. Built once by
/// [`CollisionModel::build`] and read-only afterwards, so any number of
/// traces may run against it without coordination.
#[derive(Debug, Clone)]
pub struct CollisionModel {
    pub(crate) planes: Vec<CPlane>,
    pub(crate) nodes: Vec<CNode>,
    pub(crate) leafs: Vec<CLeaf>,
    pub(crate) leafbrushes: Vec<usize>,
    pub(crate) brushes: Vec<CBrush>,
    pub(crate) brushsides: Vec<CBrushSide>,
    pub(crate) submodels: Vec<SubModel>,
    pub(crate) numclusters: usize,
    pub(crate) checksum: u32,
}

const MODEL_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

impl CollisionModel {
    pub fn planes(&self) -> &[CPlane] {
        &self.planes
    }

    pub fn nodes(&self) -> &[CNode] {
        &self.nodes
    }

    pub fn leafs(&self) -> &[CLeaf] {
        &self.leafs
    }

    pub fn brushes(&self) -> &[CBrush] {
        &self.brushes
    }

    pub fn brushsides(&self) -> &[CBrushSide] {
        &self.brushsides
    }

    pub fn submodels(&self) -> &[SubModel] {
        &self.submodels
    }

    /// Brush indices that must be tested when a sweep reaches `leaf`.
    #[inline]
    pub fn leaf_brushes(&self, leaf: &CLeaf) -> &[usize] {
        &self.leafbrushes[leaf.first_leafbrush..leaf.first_leafbrush + leaf.num_leafbrushes]
    }

    #[inline]
    pub fn brush_sides(&self, brush: &CBrush) -> &[CBrushSide] {
        &self.brushsides[brush.first_side..brush.first_side + brush.num_sides]
    }

    /// Root of the static world tree (sub-model 0).
    pub fn world_headnode(&self) -> NodeRef {
        self.submodels[0].headnode
    }

    /// True if `node` names a node or leaf of this model.
    pub fn contains_node(&self, node: NodeRef) -> bool {
        match node {
            NodeRef::Node(n) => n < self.nodes.len(),
            NodeRef::Leaf(l) => l < self.leafs.len(),
        }
    }

    pub fn num_submodels(&self) -> usize {
        self.submodels.len()
    }

    pub fn submodel(&self, index: usize) -> Option<&SubModel> {
        self.submodels.get(index)
    }

    /// Looks up a brush entity model by its `*N` name. The world (`*0`)
    /// is not an inline model.
    pub fn inline_model(&self, name: &str) -> Result<&SubModel, CmodelError> {
        let bad = || CmodelError::BadInlineModel(name.to_string());
        let num: usize = name
            .strip_prefix('*')
            .ok_or_else(bad)?
            .parse()
            .map_err(|_| bad())?;
        if num < 1 || num >= self.submodels.len() {
            return Err(bad());
        }
        Ok(&self.submodels[num])
    }

    pub fn num_clusters(&self) -> usize {
        self.numclusters
    }

    pub fn leaf_contents(&self, leafnum: usize) -> Option<Contents> {
        self.leafs.get(leafnum).map(|l| l.contents)
    }

    pub fn leaf_cluster(&self, leafnum: usize) -> Option<i32> {
        self.leafs.get(leafnum).map(|l| l.cluster)
    }

    pub fn leaf_area(&self, leafnum: usize) -> Option<i32> {
        self.leafs.get(leafnum).map(|l| l.area)
    }

    /// CRC-32 of the model's canonical encoding, fixed at build time.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    // ============================================================
    // Point queries
    // ============================================================

    /// Leaf containing `p`, descending from `headnode`. Points exactly on a
    /// plane go to the front child.
    ///
    /// Panics if `headnode` is not [`contains_node`](Self::contains_node).
    pub fn point_leafnum(&self, p: &Vec3, headnode: NodeRef) -> usize {
        let mut num = headnode;
        loop {
            match num {
                NodeRef::Leaf(leaf) => return leaf,
                NodeRef::Node(n) => {
                    let node = &self.nodes[n];
                    let d = self.planes[node.plane].distance(p);
                    num = if d < 0.0 {
                        node.children[1]
                    } else {
                        node.children[0]
                    };
                }
            }
        }
    }

    /// Contents of the leaf containing `p`.
    pub fn point_contents(&self, p: &Vec3, headnode: NodeRef) -> Contents {
        let leaf = self.point_leafnum(p, headnode);
        self.leafs[leaf].contents
    }

    // ============================================================
    // Box leaf enumeration
    // ============================================================

    /// Collects up to `max_leafs` leaves touched by the absolute box
    /// `mins..maxs`.
    pub fn box_leafnums(
        &self,
        mins: &Vec3,
        maxs: &Vec3,
        headnode: NodeRef,
        max_leafs: usize,
    ) -> BoxLeafs {
        let mut out = BoxLeafs::default();
        self.box_leafnums_r(headnode, mins, maxs, max_leafs, &mut out);
        out
    }

    fn box_leafnums_r(
        &self,
        mut num: NodeRef,
        mins: &Vec3,
        maxs: &Vec3,
        max_leafs: usize,
        out: &mut BoxLeafs,
    ) {
        loop {
            let n = match num {
                NodeRef::Leaf(leaf) => {
                    if out.leafs.len() >= max_leafs {
                        out.truncated = true;
                        return;
                    }
                    out.leafs.push(leaf);
                    return;
                }
                NodeRef::Node(n) => n,
            };

            let node = &self.nodes[n];
            match box_on_plane_side(mins, maxs, &self.planes[node.plane]) {
                BoxPlaneSide::Front => num = node.children[0],
                BoxPlaneSide::Back => num = node.children[1],
                BoxPlaneSide::Cross => {
                    // go down both
                    if out.topnode.is_none() {
                        out.topnode = Some(n);
                    }
                    self.box_leafnums_r(node.children[0], mins, maxs, max_leafs, out);
                    num = node.children[1];
                }
            }
        }
    }

    // ============================================================
    // Lump export / checksum
    // ============================================================

    /// Re-encodes the model as lump records. Plane types are written as
    /// derived, and sub-model bounds as stored (already spread).
    ///
    /// The narrow fields are lossless: the builder reads every one of them
    /// from a lump field of the same width (`cluster`/`area` from `i16`,
    /// leaf-brush and side plane indices from `u16`), whatever
    /// `enforce_map_limits` says about lump counts.
    pub fn to_lumps(&self) -> LumpData {
        LumpData {
            planes: self
                .planes
                .iter()
                .map(|p| DPlane {
                    normal: p.normal,
                    dist: p.dist,
                    plane_type: p.plane_type as i32,
                })
                .collect(),
            nodes: self
                .nodes
                .iter()
                .map(|n| DNode {
                    planenum: n.plane as i32,
                    children: [n.children[0].to_raw(), n.children[1].to_raw()],
                })
                .collect(),
            leafs: self
                .leafs
                .iter()
                .map(|l| DLeaf {
                    contents: l.contents,
                    cluster: l.cluster as i16,
                    area: l.area as i16,
                    firstleafbrush: l.first_leafbrush as u16,
                    numleafbrushes: l.num_leafbrushes as u16,
                })
                .collect(),
            leafbrushes: self.leafbrushes.iter().map(|&b| b as u16).collect(),
            brushes: self
                .brushes
                .iter()
                .map(|b| DBrush {
                    firstside: b.first_side as i32,
                    numsides: b.num_sides as i32,
                    contents: b.contents,
                })
                .collect(),
            brushsides: self
                .brushsides
                .iter()
                .map(|s| DBrushSide {
                    planenum: s.plane as u16,
                    surface_flags: s.surface_flags,
                })
                .collect(),
            models: self
                .submodels
                .iter()
                .map(|m| DModel {
                    mins: m.mins,
                    maxs: m.maxs,
                    origin: m.origin,
                    headnode: m.headnode.to_raw(),
                })
                .collect(),
        }
    }

    pub(crate) fn compute_checksum(&self) -> u32 {
        fn put_f32(digest: &mut crc::Digest<'_, u32>, v: f32) {
            digest.update(&v.to_bits().to_le_bytes());
        }
        fn put_u32(digest: &mut crc::Digest<'_, u32>, v: u32) {
            digest.update(&v.to_le_bytes());
        }

        let mut digest = MODEL_CRC.digest();

        for plane in &self.planes {
            for &n in &plane.normal {
                put_f32(&mut digest, n);
            }
            put_f32(&mut digest, plane.dist);
        }
        for node in &self.nodes {
            put_u32(&mut digest, node.plane as u32);
            put_u32(&mut digest, node.children[0].to_raw() as u32);
            put_u32(&mut digest, node.children[1].to_raw() as u32);
        }
        for leaf in &self.leafs {
            put_u32(&mut digest, leaf.contents.bits() as u32);
            put_u32(&mut digest, leaf.cluster as u32);
            put_u32(&mut digest, leaf.area as u32);
            put_u32(&mut digest, leaf.first_leafbrush as u32);
            put_u32(&mut digest, leaf.num_leafbrushes as u32);
        }
        for &b in &self.leafbrushes {
            put_u32(&mut digest, b as u32);
        }
        for brush in &self.brushes {
            put_u32(&mut digest, brush.contents.bits() as u32);
            put_u32(&mut digest, brush.first_side as u32);
            put_u32(&mut digest, brush.num_sides as u32);
        }
        for side in &self.brushsides {
            put_u32(&mut digest, side.plane as u32);
            put_u32(&mut digest, side.surface_flags.bits() as u32);
        }
        for model in &self.submodels {
            for v in model.mins.iter().chain(&model.maxs).chain(&model.origin) {
                put_f32(&mut digest, *v);
            }
            put_u32(&mut digest, model.headnode.to_raw() as u32);
        }
        digest.finalize()
    }
}
