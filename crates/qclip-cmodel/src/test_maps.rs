// test_maps.rs — small hand-built maps for the unit tests.
//
// `add_model` turns every box into one brush in its own leaf, reached
// through a chain of six axial nodes (the same layout the box hull uses).
// Several boxes are separated by x planes, so boxes must be given sorted
// along x with a gap between them. `add_split_model` instead lists many
// brushes per leaf, in the order given.

use qclip_common::q_shared::{Contents, SurfaceFlags, Vec3};
use qclip_common::qfiles::{DBrush, DBrushSide, DLeaf, DModel, DNode, DPlane, LumpData};

use crate::cmodel::CollisionModel;

/// Leaf shared by every region outside the boxes.
pub const EMPTY_LEAF: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub contents: Contents,
}

impl BoxShape {
    pub fn new(mins: Vec3, maxs: Vec3, contents: Contents) -> Self {
        Self { mins, maxs, contents }
    }
}

pub struct MapBuilder {
    lumps: LumpData,
    next_cluster: i16,
}

impl MapBuilder {
    /// Starts a map with the solid placeholder leaf 0 and the empty leaf 1.
    pub fn new() -> Self {
        let mut lumps = LumpData::default();
        lumps.leafs.push(DLeaf {
            contents: Contents::SOLID,
            cluster: -1,
            area: 0,
            firstleafbrush: 0,
            numleafbrushes: 0,
        });
        lumps.leafs.push(DLeaf {
            contents: Contents::empty(),
            cluster: 0,
            area: 1,
            firstleafbrush: 0,
            numleafbrushes: 0,
        });
        Self { lumps, next_cluster: 1 }
    }

    fn plane(&mut self, normal: Vec3, dist: f32) -> usize {
        self.lumps.planes.push(DPlane {
            normal,
            dist,
            plane_type: 0,
        });
        self.lumps.planes.len() - 1
    }

    /// Twelve planes, the positive one of each face followed by its
    /// outward-facing twin. Returns the index of the first.
    fn box_planes(&mut self, shape: &BoxShape) -> usize {
        let first = self.lumps.planes.len();
        for i in 0..6 {
            let axis = i >> 1;
            let dist = if i & 1 == 0 { shape.maxs[axis] } else { shape.mins[axis] };
            let mut normal = [0.0; 3];
            normal[axis] = 1.0;
            self.plane(normal, dist);
            normal[axis] = -1.0;
            self.plane(normal, -dist);
        }
        first
    }

    /// Adds the brush and its six sides. Returns the brush index.
    fn add_brush(&mut self, shape: &BoxShape, first_plane: usize) -> u16 {
        let firstside = self.lumps.brushsides.len() as i32;
        for i in 0..6 {
            self.lumps.brushsides.push(DBrushSide {
                planenum: (first_plane + i * 2 + (i & 1)) as u16,
                surface_flags: if i == 4 { SurfaceFlags::SKY } else { SurfaceFlags::empty() },
            });
        }
        self.lumps.brushes.push(DBrush {
            firstside,
            numsides: 6,
            contents: shape.contents,
        });
        (self.lumps.brushes.len() - 1) as u16
    }

    /// Adds a leaf listing `brushes`. Returns the leaf index.
    fn add_leaf(&mut self, contents: Contents, brushes: &[u16], clustered: bool) -> i32 {
        let firstleafbrush = self.lumps.leafbrushes.len() as u16;
        self.lumps.leafbrushes.extend_from_slice(brushes);

        let cluster = if clustered {
            self.next_cluster += 1;
            self.next_cluster - 1
        } else {
            -1
        };
        self.lumps.leafs.push(DLeaf {
            contents,
            cluster,
            area: if clustered { 1 } else { 0 },
            firstleafbrush,
            numleafbrushes: brushes.len() as u16,
        });
        (self.lumps.leafs.len() - 1) as i32
    }

    fn box_leaf(&mut self, shape: &BoxShape, first_plane: usize, clustered: bool) -> i32 {
        let brush = self.add_brush(shape, first_plane);
        self.add_leaf(shape.contents, &[brush], clustered)
    }

    /// Six chained axial nodes leading to the box leaf. Returns the head.
    fn box_chain(&mut self, shape: &BoxShape, clustered: bool) -> i32 {
        let first_plane = self.box_planes(shape);
        let leaf = self.box_leaf(shape, first_plane, clustered);
        let first_node = self.lumps.nodes.len() as i32;
        for i in 0..6 {
            let side = i & 1;
            let mut children = [0i32; 2];
            children[side] = -1 - EMPTY_LEAF;
            children[side ^ 1] = if i == 5 { -1 - leaf } else { first_node + i as i32 + 1 };
            self.lumps.nodes.push(DNode {
                planenum: (first_plane + i * 2) as i32,
                children,
            });
        }
        first_node
    }

    fn tree(&mut self, boxes: &[BoxShape], clustered: bool) -> i32 {
        if boxes.len() == 1 {
            return self.box_chain(&boxes[0], clustered);
        }
        let mid = boxes.len() / 2;
        assert!(
            boxes[mid - 1].maxs[0] < boxes[mid].mins[0],
            "boxes must be sorted and separated along x"
        );
        let sep = (boxes[mid - 1].maxs[0] + boxes[mid].mins[0]) * 0.5;
        let plane = self.plane([1.0, 0.0, 0.0], sep) as i32;

        let index = self.lumps.nodes.len();
        self.lumps.nodes.push(DNode {
            planenum: plane,
            children: [0, 0],
        });
        let back = self.tree(&boxes[..mid], clustered);
        let front = self.tree(&boxes[mid..], clustered);
        self.lumps.nodes[index].children = [front, back];
        index as i32
    }

    /// Adds a model made of `boxes`. The first model added is the world.
    pub fn add_model(&mut self, boxes: &[BoxShape], origin: Vec3) -> usize {
        assert!(!boxes.is_empty());
        let clustered = self.lumps.models.is_empty();
        let headnode = self.tree(boxes, clustered);
        self.push_model(boxes, origin, headnode)
    }

    /// Adds a model whose single node splits at `x = sep`. Each side is one
    /// leaf listing every brush that reaches into it, in the order given,
    /// so a brush crossing `sep` is listed in both leaves.
    pub fn add_split_model(&mut self, sep: f32, boxes: &[BoxShape]) -> usize {
        assert!(!boxes.is_empty());
        let clustered = self.lumps.models.is_empty();
        let brushes: Vec<u16> = boxes
            .iter()
            .map(|shape| {
                let first_plane = self.box_planes(shape);
                self.add_brush(shape, first_plane)
            })
            .collect();

        let mut side_leaf = |keep: &dyn Fn(&BoxShape) -> bool| {
            let mut contents = Contents::empty();
            let mut listed = Vec::new();
            for (shape, &brush) in boxes.iter().zip(&brushes) {
                if keep(shape) {
                    contents |= shape.contents;
                    listed.push(brush);
                }
            }
            self.add_leaf(contents, &listed, clustered)
        };
        let front = side_leaf(&|b: &BoxShape| b.maxs[0] > sep);
        let back = side_leaf(&|b: &BoxShape| b.mins[0] < sep);

        let plane = self.plane([1.0, 0.0, 0.0], sep) as i32;
        let headnode = self.lumps.nodes.len() as i32;
        self.lumps.nodes.push(DNode {
            planenum: plane,
            children: [-1 - front, -1 - back],
        });
        self.push_model(boxes, [0.0; 3], headnode)
    }

    fn push_model(&mut self, boxes: &[BoxShape], origin: Vec3, headnode: i32) -> usize {
        let mut mins = boxes[0].mins;
        let mut maxs = boxes[0].maxs;
        for b in &boxes[1..] {
            for j in 0..3 {
                mins[j] = mins[j].min(b.mins[j]);
                maxs[j] = maxs[j].max(b.maxs[j]);
            }
        }
        self.lumps.models.push(DModel {
            mins,
            maxs,
            origin,
            headnode,
        });
        self.lumps.models.len() - 1
    }

    pub fn finish(self) -> LumpData {
        self.lumps
    }
}

pub fn build(lumps: &LumpData) -> CollisionModel {
    CollisionModel::build(lumps).expect("test map should build")
}

/// A world holding a single box.
pub fn cube_lumps(mins: Vec3, maxs: Vec3, contents: Contents) -> LumpData {
    let mut builder = MapBuilder::new();
    builder.add_model(&[BoxShape::new(mins, maxs, contents)], [0.0; 3]);
    builder.finish()
}

/// A solid 64-unit cube centred on the origin.
pub fn cube_map() -> CollisionModel {
    build(&cube_lumps([-32.0; 3], [32.0; 3], Contents::SOLID))
}

/// The cube plus a taller wall further along +x, split at x = 48.
pub fn corridor_map() -> CollisionModel {
    let mut builder = MapBuilder::new();
    builder.add_model(
        &[
            BoxShape::new([-32.0; 3], [32.0; 3], Contents::SOLID),
            BoxShape::new([64.0, -32.0, -32.0], [96.0, 32.0, 64.0], Contents::SOLID),
        ],
        [0.0; 3],
    );
    build(&builder.finish())
}

/// A single oblique plane: water in front, empty behind, no brushes.
pub fn split_map() -> CollisionModel {
    let lumps = LumpData {
        planes: vec![DPlane {
            normal: [0.6, 0.8, 0.0],
            dist: 10.0,
            plane_type: 4,
        }],
        nodes: vec![DNode {
            planenum: 0,
            children: [-2, -3],
        }],
        leafs: vec![
            DLeaf {
                contents: Contents::SOLID,
                cluster: -1,
                area: 0,
                firstleafbrush: 0,
                numleafbrushes: 0,
            },
            DLeaf {
                contents: Contents::WATER,
                cluster: 0,
                area: 1,
                firstleafbrush: 0,
                numleafbrushes: 0,
            },
            DLeaf {
                contents: Contents::empty(),
                cluster: 1,
                area: 1,
                firstleafbrush: 0,
                numleafbrushes: 0,
            },
        ],
        models: vec![DModel {
            mins: [-4096.0; 3],
            maxs: [4096.0; 3],
            origin: [0.0; 3],
            headnode: 0,
        }],
        ..LumpData::default()
    };
    build(&lumps)
}

/// The cube world plus inline model 1: a door slab in the local box
/// `[0, 8] x [-32, 32] x [-32, 32]`.
pub fn door_map() -> CollisionModel {
    let mut builder = MapBuilder::new();
    builder.add_model(&[BoxShape::new([-32.0; 3], [32.0; 3], Contents::SOLID)], [0.0; 3]);
    builder.add_model(
        &[BoxShape::new([0.0, -32.0, -32.0], [8.0, 32.0, 32.0], Contents::SOLID)],
        [0.0; 3],
    );
    build(&builder.finish())
}

/// A world of one split node over `boxes`, see [`MapBuilder::add_split_model`].
pub fn split_brush_map(sep: f32, boxes: &[BoxShape]) -> CollisionModel {
    let mut builder = MapBuilder::new();
    builder.add_split_model(sep, boxes);
    build(&builder.finish())
}

/// `count` boxes of varying size and contents laid out along x. Returns
/// the boxes and the lumps of a world made of them.
pub fn many_boxes(count: usize) -> (Vec<BoxShape>, LumpData) {
    let kinds = [
        Contents::SOLID,
        Contents::WATER,
        Contents::WINDOW,
        Contents::SOLID,
        Contents::PLAYERCLIP,
        Contents::LAVA,
    ];
    let boxes: Vec<BoxShape> = (0..count)
        .map(|k| {
            let x = k as f32 * 96.0;
            let w = 16.0 + (k % 4) as f32 * 12.0;
            let y = ((k * 37) % 64) as f32 - 32.0;
            let z = ((k * 53) % 48) as f32 - 24.0;
            BoxShape::new(
                [x, y - w, z - 16.0],
                [x + w, y + w, z + 24.0 + (k % 3) as f32 * 8.0],
                kinds[k % kinds.len()],
            )
        })
        .collect();

    let mut builder = MapBuilder::new();
    builder.add_model(&boxes, [0.0; 3]);
    (boxes, builder.finish())
}
