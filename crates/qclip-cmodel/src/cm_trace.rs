// cm_trace.rs — box sweeps through the BSP tree (CM_BoxTrace and friends)
//
// A trace never mutates the model. Per-call state (the segment, the box,
// the brushes already clipped and the running result) lives in TraceWork.

use qclip_common::q_shared::{
    box_extents, dot_product, vector_lerp, CPlane, Contents, SurfaceFlags, Trace, Vec3,
};

use crate::cmodel::{CollisionModel, NodeRef};

/// Distance a blocked trace is backed off from the surface it hit, so a
/// trace restarted from `endpos` does not begin inside the brush.
pub const DIST_EPSILON: f32 = 0.03125; // 1/32 epsilon to keep floating point happy

/// Leaf limit for the zero-length position test.
const POSITION_TEST_MAX_LEAFS: usize = 1024;

// ============================================================
// Per-trace brush set
// ============================================================

/// Brushes already clipped during one trace. A brush listed in several
/// leaves is only tested once. Storage grows on first insert, so traces
/// that never reach a brush do not allocate.
#[derive(Debug, Clone, Default)]
pub(crate) struct BrushSet {
    bits: Vec<u64>,
}

impl BrushSet {
    /// Marks `brush` and returns true if it was not marked before.
    #[inline]
    pub(crate) fn insert(&mut self, brush: usize) -> bool {
        let index = brush / 64;
        if index >= self.bits.len() {
            self.bits.resize(index + 1, 0);
        }
        let word = &mut self.bits[index];
        let mask = 1u64 << (brush % 64);
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }
}

// ============================================================
// Trace state
// ============================================================

struct TraceWork<'a> {
    model: &'a CollisionModel,
    contents: Contents,
    start: Vec3,
    end: Vec3,
    mins: Vec3,
    maxs: Vec3,
    extents: Vec3,
    ispoint: bool,
    checked: BrushSet,
    trace: Trace,
}

impl<'a> TraceWork<'a> {
    fn new(
        model: &'a CollisionModel,
        start: &Vec3,
        end: &Vec3,
        mins: &Vec3,
        maxs: &Vec3,
        brushmask: Contents,
    ) -> Self {
        // a zero-size box is traced as a point: no corner offsets at all
        let ispoint = mins.iter().chain(maxs.iter()).all(|&v| v == 0.0);
        let extents = if ispoint {
            [0.0; 3]
        } else {
            box_extents(mins, maxs)
        };

        Self {
            model,
            contents: brushmask,
            start: *start,
            end: *end,
            mins: *mins,
            maxs: *maxs,
            extents,
            ispoint,
            checked: BrushSet::default(),
            trace: Trace::default(),
        }
    }

    /// Plane distance adjusted for the box corner nearest the plane.
    #[inline]
    fn side_dist(&self, plane: &CPlane) -> f32 {
        if self.ispoint {
            plane.dist
        } else {
            let ofs = plane.near_corner(&self.mins, &self.maxs);
            plane.dist - dot_product(&ofs, &plane.normal)
        }
    }

    // ============================================================
    // Brush tests
    // ============================================================

    fn clip_box_to_brush(&mut self, brush_idx: usize) {
        let model = self.model;
        let brush = &model.brushes[brush_idx];
        let sides = model.brush_sides(brush);
        if sides.is_empty() {
            return;
        }

        let mut enterfrac = -1.0f32;
        let mut leavefrac = 1.0f32;
        let mut lead: Option<(usize, SurfaceFlags)> = None;
        let mut getout = false;
        let mut startout = false;

        for side in sides {
            let plane = &model.planes[side.plane];
            let dist = self.side_dist(plane);
            let d1 = dot_product(&self.start, &plane.normal) - dist;
            let d2 = dot_product(&self.end, &plane.normal) - dist;

            // a segment lying in a face counts as outside that face
            if d1.abs() <= DIST_EPSILON && d2.abs() <= DIST_EPSILON {
                return;
            }

            if d2 > 0.0 {
                getout = true; // endpoint is not in solid
            }
            if d1 > 0.0 {
                startout = true;
            }

            // if completely in front of face, no intersection
            if d1 > 0.0 && d2 >= d1 {
                return;
            }
            if d1 <= 0.0 && d2 <= 0.0 {
                continue;
            }

            // crosses face
            if d1 > d2 {
                // enter
                let f = (d1 - DIST_EPSILON) / (d1 - d2);
                if f > enterfrac {
                    enterfrac = f;
                    lead = Some((side.plane, side.surface_flags));
                }
            } else {
                // leave
                let f = (d1 + DIST_EPSILON) / (d1 - d2);
                if f < leavefrac {
                    leavefrac = f;
                }
            }
        }

        if !startout {
            // start point was inside brush; fraction is zeroed once the
            // walk ends
            let trace = &mut self.trace;
            trace.startsolid = true;
            if !getout {
                trace.allsolid = true;
            }
            trace.contents = brush.contents;
            return;
        }

        if enterfrac < leavefrac && enterfrac > -1.0 && enterfrac < self.trace.fraction {
            if let Some((plane, surface_flags)) = lead {
                let trace = &mut self.trace;
                trace.fraction = enterfrac.max(0.0);
                trace.plane = Some(model.planes[plane]);
                trace.surface_flags = surface_flags;
                // contents of an embedding brush take precedence
                if !trace.startsolid {
                    trace.contents = brush.contents;
                }
            }
        }
    }

    fn test_box_in_brush(&mut self, brush_idx: usize) {
        let model = self.model;
        let brush = &model.brushes[brush_idx];
        let sides = model.brush_sides(brush);
        if sides.is_empty() {
            return;
        }

        for side in sides {
            let plane = &model.planes[side.plane];
            let ofs = plane.near_corner(&self.mins, &self.maxs);
            let dist = plane.dist - dot_product(&ofs, &plane.normal);
            let d1 = dot_product(&self.start, &plane.normal) - dist;

            // a face within DIST_EPSILON counts as outside, the same
            // margin a sweep from this start grazes with
            if d1 >= -DIST_EPSILON {
                return;
            }
        }

        // inside this brush
        let trace = &mut self.trace;
        trace.startsolid = true;
        trace.allsolid = true;
        trace.fraction = 0.0;
        trace.contents = brush.contents;
    }

    // ============================================================
    // Leaf visits
    // ============================================================

    /// Marks `brush` as visited and reports whether it still needs a test.
    #[inline]
    fn take_brush(&mut self, brush: usize) -> bool {
        self.checked.insert(brush) && self.model.brushes[brush].contents.intersects(self.contents)
    }

    fn trace_to_leaf(&mut self, leafnum: usize) {
        let model = self.model;
        let leaf = &model.leafs[leafnum];
        if !leaf.contents.intersects(self.contents) {
            return;
        }

        for &brush in model.leaf_brushes(leaf) {
            if !self.take_brush(brush) {
                continue;
            }
            self.clip_box_to_brush(brush);
            if self.trace.allsolid {
                return;
            }
        }
    }

    fn test_in_leaf(&mut self, leafnum: usize) {
        let model = self.model;
        let leaf = &model.leafs[leafnum];
        if !leaf.contents.intersects(self.contents) {
            return;
        }

        for &brush in model.leaf_brushes(leaf) {
            if !self.take_brush(brush) {
                continue;
            }
            self.test_box_in_brush(brush);
            if self.trace.allsolid {
                return;
            }
        }
    }

    // ============================================================
    // Tree walk
    // ============================================================

    fn recursive_hull_check(&mut self, num: NodeRef, p1f: f32, p2f: f32, p1: &Vec3, p2: &Vec3) {
        // already hit something nearer
        if self.trace.fraction <= p1f {
            return;
        }

        let n = match num {
            NodeRef::Leaf(leaf) => {
                self.trace_to_leaf(leaf);
                return;
            }
            NodeRef::Node(n) => n,
        };

        // find the point distances to the separating plane
        // and the offset for the size of the box
        let model = self.model;
        let node = &model.nodes[n];
        let plane = &model.planes[node.plane];

        let (t1, t2, offset) = if plane.plane_type < 3 {
            let axis = plane.plane_type as usize;
            (
                p1[axis] - plane.dist,
                p2[axis] - plane.dist,
                self.extents[axis],
            )
        } else {
            let offset = if self.ispoint {
                0.0
            } else {
                (self.extents[0] * plane.normal[0]).abs()
                    + (self.extents[1] * plane.normal[1]).abs()
                    + (self.extents[2] * plane.normal[2]).abs()
            };
            (
                dot_product(&plane.normal, p1) - plane.dist,
                dot_product(&plane.normal, p2) - plane.dist,
                offset,
            )
        };

        // see which sides we need to consider
        if t1 >= offset && t2 >= offset {
            self.recursive_hull_check(node.children[0], p1f, p2f, p1, p2);
            return;
        }
        if t1 < -offset && t2 < -offset {
            self.recursive_hull_check(node.children[1], p1f, p2f, p1, p2);
            return;
        }

        // put the crosspoint DIST_EPSILON pixels on the near side
        let (side, frac, frac2) = if t1 < t2 {
            let idist = 1.0 / (t1 - t2);
            (
                1,
                (t1 - offset + DIST_EPSILON) * idist,
                (t1 + offset + DIST_EPSILON) * idist,
            )
        } else if t1 > t2 {
            let idist = 1.0 / (t1 - t2);
            (
                0,
                (t1 + offset + DIST_EPSILON) * idist,
                (t1 - offset - DIST_EPSILON) * idist,
            )
        } else {
            (0, 1.0, 0.0)
        };

        // move up to the node
        let frac = frac.clamp(0.0, 1.0);
        let midf = p1f + (p2f - p1f) * frac;
        let mid = vector_lerp(p1, frac, p2);
        self.recursive_hull_check(node.children[side], p1f, midf, p1, &mid);

        // go past the node
        let frac2 = frac2.clamp(0.0, 1.0);
        let midf = p1f + (p2f - p1f) * frac2;
        let mid = vector_lerp(p1, frac2, p2);
        self.recursive_hull_check(node.children[side ^ 1], midf, p2f, &mid, p2);
    }

    // ============================================================
    // Entry points
    // ============================================================

    fn position_test(mut self, headnode: NodeRef) -> Trace {
        let mut c1 = [0.0f32; 3];
        let mut c2 = [0.0f32; 3];
        for i in 0..3 {
            c1[i] = self.start[i] + self.mins[i] - 1.0;
            c2[i] = self.start[i] + self.maxs[i] + 1.0;
        }

        let touched = self
            .model
            .box_leafnums(&c1, &c2, headnode, POSITION_TEST_MAX_LEAFS);
        for leaf in touched.leafs {
            self.test_in_leaf(leaf);
            if self.trace.allsolid {
                break;
            }
        }
        self.trace.endpos = self.start;
        self.trace
    }

    fn sweep(mut self, headnode: NodeRef) -> Trace {
        let (start, end) = (self.start, self.end);
        self.recursive_hull_check(headnode, 0.0, 1.0, &start, &end);

        if self.trace.startsolid {
            self.trace.fraction = 0.0;
            self.trace.plane = None;
            self.trace.surface_flags = SurfaceFlags::empty();
        }

        if self.trace.fraction == 1.0 {
            self.trace.endpos = end;
        } else {
            self.trace.endpos = vector_lerp(&start, self.trace.fraction, &end);
        }
        self.trace
    }
}

impl CollisionModel {
    /// Sweeps the box `mins..maxs` (offsets from the moving point) from
    /// `start` to `end` through the subtree at `headnode`, stopping at the
    /// first brush whose contents intersect `brushmask`.
    ///
    /// A zero-length sweep is a position test: it only reports whether the
    /// box is embedded, with no plane.
    ///
    /// # Panics
    ///
    /// `headnode` must belong to this model, as one taken from
    /// [`world_headnode`](Self::world_headnode) or a
    /// [`SubModel`](crate::cmodel::SubModel) does. Check hand-built refs
    /// with [`contains_node`](Self::contains_node).
    pub fn box_trace(
        &self,
        start: &Vec3,
        end: &Vec3,
        mins: &Vec3,
        maxs: &Vec3,
        headnode: NodeRef,
        brushmask: Contents,
    ) -> Trace {
        let work = TraceWork::new(self, start, end, mins, maxs, brushmask);
        if start == end {
            work.position_test(headnode)
        } else {
            work.sweep(headnode)
        }
    }

    /// [`box_trace`](Self::box_trace) against the static world.
    pub fn trace_world(
        &self,
        start: &Vec3,
        end: &Vec3,
        mins: &Vec3,
        maxs: &Vec3,
        brushmask: Contents,
    ) -> Trace {
        self.box_trace(start, end, mins, maxs, self.world_headnode(), brushmask)
    }
}
