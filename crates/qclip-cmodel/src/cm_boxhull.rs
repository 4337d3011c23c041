// cm_boxhull.rs — a standalone collision model shaped like an axial box
//
// Entities without brush models (monsters, items, players) are clipped
// against their bounding box. Each BoxHull owns its own six-plane model,
// so any number of them can exist and be traced concurrently.

use qclip_common::q_shared::{CPlane, Contents, SurfaceFlags, Trace, Vec3, VEC3_ORIGIN};
use qclip_common::qfiles::LumpData;

use crate::cmodel::{CBrush, CBrushSide, CLeaf, CNode, CollisionModel, NodeRef, SubModel};

// leaf 0 is the solid placeholder every compiled map starts with
const EMPTY_LEAF: usize = 1;
const BOX_LEAF: usize = 2;

/// An axial box as a collision model: six chained nodes, three leaves and
/// one six-sided brush.
#[derive(Debug, Clone)]
pub struct BoxHull {
    model: CollisionModel,
}

impl BoxHull {
    /// A box whose brush carries `CONTENTS_MONSTER`.
    pub fn new(mins: &Vec3, maxs: &Vec3) -> Self {
        Self::with_contents(mins, maxs, Contents::MONSTER)
    }

    pub fn with_contents(mins: &Vec3, maxs: &Vec3, contents: Contents) -> Self {
        let mut planes = Vec::with_capacity(12);
        let mut nodes = Vec::with_capacity(6);
        let mut brushsides = Vec::with_capacity(6);

        for i in 0..6 {
            let axis = i >> 1;
            let side = i & 1;
            let dist = if side == 0 { maxs[axis] } else { mins[axis] };

            // planes
            let mut normal = [0.0f32; 3];
            normal[axis] = 1.0;
            planes.push(CPlane::new(normal, dist));
            normal[axis] = -1.0;
            planes.push(CPlane::new(normal, -dist));

            // brush sides
            brushsides.push(CBrushSide {
                plane: i * 2 + side,
                surface_flags: SurfaceFlags::empty(),
            });

            // nodes
            let mut children = [NodeRef::Leaf(EMPTY_LEAF); 2];
            children[side ^ 1] = if i == 5 {
                NodeRef::Leaf(BOX_LEAF)
            } else {
                NodeRef::Node(i + 1)
            };
            nodes.push(CNode {
                plane: i * 2,
                children,
            });
        }

        let leaf = |contents: Contents, num_leafbrushes: usize| CLeaf {
            contents,
            cluster: -1,
            area: 0,
            first_leafbrush: 0,
            num_leafbrushes,
        };
        let leafs = vec![
            leaf(Contents::SOLID, 0),
            leaf(Contents::empty(), 0),
            leaf(contents, 1),
        ];

        let mut model = CollisionModel {
            planes,
            nodes,
            leafs,
            leafbrushes: vec![0],
            brushes: vec![CBrush {
                contents,
                first_side: 0,
                num_sides: 6,
            }],
            brushsides,
            submodels: vec![SubModel {
                mins: *mins,
                maxs: *maxs,
                origin: VEC3_ORIGIN,
                headnode: NodeRef::Node(0),
            }],
            numclusters: 0,
            checksum: 0,
        };
        model.checksum = model.compute_checksum();
        Self { model }
    }

    pub fn model(&self) -> &CollisionModel {
        &self.model
    }

    pub fn headnode(&self) -> NodeRef {
        NodeRef::Node(0)
    }

    /// Sweeps a box against the hull, given in its own coordinates.
    pub fn trace(
        &self,
        start: &Vec3,
        end: &Vec3,
        mins: &Vec3,
        maxs: &Vec3,
        brushmask: Contents,
    ) -> Trace {
        self.model
            .box_trace(start, end, mins, maxs, self.headnode(), brushmask)
    }

    /// Sweeps against the hull placed at `origin`. Bounding boxes never
    /// rotate, so entity angles are not taken.
    pub fn trace_at(
        &self,
        start: &Vec3,
        end: &Vec3,
        mins: &Vec3,
        maxs: &Vec3,
        brushmask: Contents,
        origin: &Vec3,
    ) -> Trace {
        self.model.transformed_box_trace(
            start,
            end,
            mins,
            maxs,
            self.headnode(),
            brushmask,
            origin,
            &VEC3_ORIGIN,
        )
    }

    pub fn point_contents(&self, p: &Vec3) -> Contents {
        self.model.point_contents(p, self.headnode())
    }
}

/// Lump records describing the same model as [`BoxHull::with_contents`].
pub fn box_hull_lumps(mins: &Vec3, maxs: &Vec3, contents: Contents) -> LumpData {
    BoxHull::with_contents(mins, maxs, contents).model().to_lumps()
}
