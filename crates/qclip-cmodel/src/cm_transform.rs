// cm_transform.rs — traces and point tests against moved / rotated sub-models
//
// Brush entities keep their geometry in model space. Queries move the
// segment into that space, run the ordinary tracer, then express the
// result back in world space.

use qclip_common::q_shared::{
    angle_vectors, angles_are_zero, dot_product, vector_lerp, vector_subtract, CPlane, Contents,
    Trace, Vec3,
};

use crate::cmodel::{CollisionModel, NodeRef};

/// Rows of the world-to-model rotation for `angles`: forward, left, up.
#[derive(Debug, Clone, Copy)]
struct Rotation {
    axis: [Vec3; 3],
}

impl Rotation {
    fn from_angles(angles: &Vec3) -> Self {
        let (forward, right, up) = angle_vectors(angles);
        let left = [-right[0], -right[1], -right[2]];
        Self {
            axis: [forward, left, up],
        }
    }

    #[inline]
    fn to_local(&self, v: &Vec3) -> Vec3 {
        [
            dot_product(v, &self.axis[0]),
            dot_product(v, &self.axis[1]),
            dot_product(v, &self.axis[2]),
        ]
    }

    /// Inverse of [`to_local`](Self::to_local); the axes are orthonormal.
    #[inline]
    fn to_world(&self, v: &Vec3) -> Vec3 {
        let mut out = [0.0f32; 3];
        for i in 0..3 {
            out[i] = self.axis[0][i] * v[0] + self.axis[1][i] * v[1] + self.axis[2][i] * v[2];
        }
        out
    }
}

/// Moves a world-space point into the space of a model placed at
/// `origin`, optionally rotated.
fn world_to_model(p: &Vec3, origin: &Vec3, rotation: Option<&Rotation>) -> Vec3 {
    let local = vector_subtract(p, origin);
    match rotation {
        Some(r) => r.to_local(&local),
        None => local,
    }
}

impl CollisionModel {
    /// [`box_trace`](Self::box_trace) against a sub-model placed at
    /// `origin` and rotated by `angles` (pitch, yaw, roll in degrees).
    ///
    /// The swept box itself is not rotated. The reported plane and
    /// `endpos` are in world space.
    #[allow(clippy::too_many_arguments)]
    pub fn transformed_box_trace(
        &self,
        start: &Vec3,
        end: &Vec3,
        mins: &Vec3,
        maxs: &Vec3,
        headnode: NodeRef,
        brushmask: Contents,
        origin: &Vec3,
        angles: &Vec3,
    ) -> Trace {
        let rotation = (!angles_are_zero(angles)).then(|| Rotation::from_angles(angles));

        // subtract origin offset
        let start_l = world_to_model(start, origin, rotation.as_ref());
        let end_l = world_to_model(end, origin, rotation.as_ref());

        let mut trace = self.box_trace(&start_l, &end_l, mins, maxs, headnode, brushmask);

        if let Some(plane) = trace.plane {
            let normal = match rotation {
                Some(ref r) => r.to_world(&plane.normal),
                None => plane.normal,
            };
            let dist = plane.dist + dot_product(&normal, origin);
            trace.plane = Some(CPlane::new(normal, dist));
        }

        trace.endpos = if trace.fraction == 1.0 {
            *end
        } else {
            vector_lerp(start, trace.fraction, end)
        };
        trace
    }

    /// [`point_contents`](Self::point_contents) for a sub-model placed at
    /// `origin` and rotated by `angles`.
    pub fn transformed_point_contents(
        &self,
        p: &Vec3,
        headnode: NodeRef,
        origin: &Vec3,
        angles: &Vec3,
    ) -> Contents {
        let rotation = (!angles_are_zero(angles)).then(|| Rotation::from_angles(angles));
        let p_l = world_to_model(p, origin, rotation.as_ref());
        self.point_contents(&p_l, headnode)
    }
}
