// q_shared.rs — foundational types shared by the collision engine and its callers:
// vector math, planes, content/surface flags and the trace result.

// ============================================================
// Basic types
// ============================================================

pub type Vec3 = [f32; 3];

pub const VEC3_ORIGIN: Vec3 = [0.0, 0.0, 0.0];

// angle indexes
pub const PITCH: usize = 0; // up / down
pub const YAW: usize = 1; // left / right
pub const ROLL: usize = 2; // fall over

// ============================================================
// Content flags
// ============================================================

bitflags::bitflags! {
    /// Medium occupying a region or brush. Values are persisted in save
    /// files and demos and must not change.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Contents: i32 {
        const SOLID        = 1;
        const WINDOW       = 2;
        const AUX          = 4;
        const LAVA         = 8;
        const SLIME        = 16;
        const WATER        = 32;
        const MIST         = 64;

        const AREAPORTAL   = 0x8000;
        const PLAYERCLIP   = 0x10000;
        const MONSTERCLIP  = 0x20000;

        // currents can be added to any other contents, and may be mixed
        const CURRENT_0    = 0x40000;
        const CURRENT_90   = 0x80000;
        const CURRENT_180  = 0x100000;
        const CURRENT_270  = 0x200000;
        const CURRENT_UP   = 0x400000;
        const CURRENT_DOWN = 0x800000;

        const ORIGIN       = 0x1000000; // removed before bsping an entity
        const MONSTER      = 0x2000000; // should never be on a brush, only in game
        const DEADMONSTER  = 0x4000000;
        const DETAIL       = 0x8000000; // brushes to be added after vis leafs
        const TRANSLUCENT  = 0x10000000; // auto set if any surface has trans
        const LADDER       = 0x20000000;
    }
}

pub const LAST_VISIBLE_CONTENTS: Contents = Contents::MIST;

// ============================================================
// Surface flags
// ============================================================

bitflags::bitflags! {
    /// Per-side surface behaviour reported by traces.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SurfaceFlags: i32 {
        const LIGHT   = 0x1; // value will hold the light strength
        const SLICK   = 0x2; // effects game physics
        const SKY     = 0x4; // don't draw, but add to skybox
        const WARP    = 0x8; // turbulent water warp
        const TRANS33 = 0x10;
        const TRANS66 = 0x20;
        const FLOWING = 0x40; // scroll towards angle
        const NODRAW  = 0x80; // don't bother referencing the texture
    }
}

// ============================================================
// Content masks
// ============================================================

pub const MASK_ALL: Contents = Contents::from_bits_retain(-1);
pub const MASK_SOLID: Contents = Contents::SOLID.union(Contents::WINDOW);
pub const MASK_PLAYERSOLID: Contents = Contents::SOLID
    .union(Contents::PLAYERCLIP)
    .union(Contents::WINDOW)
    .union(Contents::MONSTER);
pub const MASK_DEADSOLID: Contents = Contents::SOLID
    .union(Contents::PLAYERCLIP)
    .union(Contents::WINDOW);
pub const MASK_MONSTERSOLID: Contents = Contents::SOLID
    .union(Contents::MONSTERCLIP)
    .union(Contents::WINDOW)
    .union(Contents::MONSTER);
pub const MASK_WATER: Contents = Contents::WATER
    .union(Contents::LAVA)
    .union(Contents::SLIME);
pub const MASK_OPAQUE: Contents = Contents::SOLID
    .union(Contents::SLIME)
    .union(Contents::LAVA);
pub const MASK_SHOT: Contents = Contents::SOLID
    .union(Contents::MONSTER)
    .union(Contents::WINDOW)
    .union(Contents::DEADMONSTER);
pub const MASK_CURRENT: Contents = Contents::CURRENT_0
    .union(Contents::CURRENT_90)
    .union(Contents::CURRENT_180)
    .union(Contents::CURRENT_270)
    .union(Contents::CURRENT_UP)
    .union(Contents::CURRENT_DOWN);

// ============================================================
// Plane
// ============================================================

// 0-2 are axial planes
pub const PLANE_X: u8 = 0;
pub const PLANE_Y: u8 = 1;
pub const PLANE_Z: u8 = 2;
// 3-5 are non-axial planes snapped to the nearest
pub const PLANE_ANYX: u8 = 3;
pub const PLANE_ANYY: u8 = 4;
pub const PLANE_ANYZ: u8 = 5;

/// A plane with the metadata box tests need: `plane_type` selects the
/// axial fast path and `signbits` has bit `j` set when `normal[j] < 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CPlane {
    pub normal: Vec3,
    pub dist: f32,
    pub plane_type: u8,
    pub signbits: u8,
}

impl Default for CPlane {
    fn default() -> Self {
        Self {
            normal: [0.0; 3],
            dist: 0.0,
            plane_type: PLANE_X,
            signbits: 0,
        }
    }
}

impl CPlane {
    /// Builds a plane, deriving its type and sign bits from the normal.
    pub fn new(normal: Vec3, dist: f32) -> Self {
        Self {
            normal,
            dist,
            plane_type: plane_type_for_normal(&normal),
            signbits: sign_bits_for_normal(&normal),
        }
    }

    /// Signed distance from `p` to the plane, using the axial fast path
    /// when available.
    #[inline]
    pub fn distance(&self, p: &Vec3) -> f32 {
        if self.plane_type < 3 {
            p[self.plane_type as usize] - self.dist
        } else {
            dot_product(&self.normal, p) - self.dist
        }
    }

    /// Box corner (as an offset from the box origin) that lies deepest
    /// behind the plane: `maxs` where the normal is negative, `mins` otherwise.
    #[inline]
    pub fn near_corner(&self, mins: &Vec3, maxs: &Vec3) -> Vec3 {
        let mut ofs = [0.0f32; 3];
        for j in 0..3 {
            ofs[j] = if self.signbits & (1 << j) != 0 {
                maxs[j]
            } else {
                mins[j]
            };
        }
        ofs
    }
}

/// Sign bits for a normal: bit `j` is set when `normal[j]` is negative.
pub fn sign_bits_for_normal(normal: &Vec3) -> u8 {
    let mut bits = 0u8;
    for (j, &n) in normal.iter().enumerate() {
        if n < 0.0 {
            bits |= 1 << j;
        }
    }
    bits
}

/// Axial type only when the normal points exactly along a positive axis,
/// otherwise the `PLANE_ANY*` type of the dominant axis.
pub fn plane_type_for_normal(normal: &Vec3) -> u8 {
    for axis in 0..3 {
        if normal[axis] == 1.0 {
            return axis as u8;
        }
    }
    let ax = normal[0].abs();
    let ay = normal[1].abs();
    let az = normal[2].abs();
    if ax >= ay && ax >= az {
        PLANE_ANYX
    } else if ay >= ax && ay >= az {
        PLANE_ANYY
    } else {
        PLANE_ANYZ
    }
}

/// Which side of a plane an absolute box lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxPlaneSide {
    Front,
    Back,
    Cross,
}

/// Classifies the box `emins..emaxs` against `p`.
pub fn box_on_plane_side(emins: &Vec3, emaxs: &Vec3, p: &CPlane) -> BoxPlaneSide {
    // fast axial cases
    if p.plane_type < 3 {
        let t = p.plane_type as usize;
        if p.dist <= emins[t] {
            return BoxPlaneSide::Front;
        }
        if p.dist >= emaxs[t] {
            return BoxPlaneSide::Back;
        }
        return BoxPlaneSide::Cross;
    }

    // general case: dist1 uses the corner furthest along the normal, dist2 the nearest
    let near = p.near_corner(emins, emaxs);
    let far = p.near_corner(emaxs, emins);
    let dist1 = dot_product(&p.normal, &far);
    let dist2 = dot_product(&p.normal, &near);

    match (dist1 >= p.dist, dist2 < p.dist) {
        (true, false) => BoxPlaneSide::Front,
        (false, true) => BoxPlaneSide::Back,
        _ => BoxPlaneSide::Cross,
    }
}

// ============================================================
// Trace
// ============================================================

/// Result of sweeping a box through a collision model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trace {
    /// if true, plane is not valid
    pub allsolid: bool,
    /// if true, the initial point was in a solid area
    pub startsolid: bool,
    /// time completed, 1.0 = didn't hit anything
    pub fraction: f32,
    /// final position
    pub endpos: Vec3,
    /// surface normal at impact
    pub plane: Option<CPlane>,
    pub surface_flags: SurfaceFlags,
    /// contents on other side of surface hit
    pub contents: Contents,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            allsolid: false,
            startsolid: false,
            fraction: 1.0,
            endpos: VEC3_ORIGIN,
            plane: None,
            surface_flags: SurfaceFlags::empty(),
            contents: Contents::empty(),
        }
    }
}

impl Trace {
    /// A trace that was not blocked and ended at `end`.
    pub fn clear(end: Vec3) -> Self {
        Self {
            endpos: end,
            ..Self::default()
        }
    }

    #[inline]
    pub fn hit_something(&self) -> bool {
        self.fraction < 1.0 || self.startsolid
    }
}

// ============================================================
// MATHLIB — Vector operations
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_subtract(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn vector_add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// veca + scale * vecb
#[inline]
pub fn vector_ma(veca: &Vec3, scale: f32, vecb: &Vec3) -> Vec3 {
    [
        veca[0] + scale * vecb[0],
        veca[1] + scale * vecb[1],
        veca[2] + scale * vecb[2],
    ]
}

/// Point at `frac` along `a -> b`, computed per axis as `a + frac * (b - a)`.
#[inline]
pub fn vector_lerp(a: &Vec3, frac: f32, b: &Vec3) -> Vec3 {
    [
        a[0] + frac * (b[0] - a[0]),
        a[1] + frac * (b[1] - a[1]),
        a[2] + frac * (b[2] - a[2]),
    ]
}

#[inline]
pub fn vector_length(v: &Vec3) -> f32 {
    dot_product(v, v).sqrt()
}

/// Largest absolute extent per axis of a box given as offsets from its origin.
#[inline]
pub fn box_extents(mins: &Vec3, maxs: &Vec3) -> Vec3 {
    [
        (-mins[0]).max(maxs[0]),
        (-mins[1]).max(maxs[1]),
        (-mins[2]).max(maxs[2]),
    ]
}

// ============================================================
// Angle functions
// ============================================================

/// Returns (forward, right, up) for pitch/yaw/roll angles in degrees.
pub fn angle_vectors(angles: &Vec3) -> (Vec3, Vec3, Vec3) {
    let (sy, cy) = angles[YAW].to_radians().sin_cos();
    let (sp, cp) = angles[PITCH].to_radians().sin_cos();
    let (sr, cr) = angles[ROLL].to_radians().sin_cos();

    let forward = [cp * cy, cp * sy, -sp];
    let right = [
        -sr * sp * cy + -cr * -sy,
        -sr * sp * sy + -cr * cy,
        -sr * cp,
    ];
    let up = [
        cr * sp * cy + -sr * -sy,
        cr * sp * sy + -sr * cy,
        cr * cp,
    ];
    (forward, right, up)
}

#[inline]
pub fn angles_are_zero(angles: &Vec3) -> bool {
    angles[0] == 0.0 && angles[1] == 0.0 && angles[2] == 0.0
}
