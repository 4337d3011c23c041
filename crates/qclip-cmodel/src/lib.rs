#![allow(clippy::needless_range_loop, clippy::float_cmp)]

pub mod cm_boxhull;
pub mod cm_load;
pub mod cm_slot;
pub mod cm_trace;
pub mod cm_transform;
pub mod cmodel;
pub mod config;
pub mod error;

#[cfg(test)]
mod test_maps;

pub use cm_boxhull::{box_hull_lumps, BoxHull};
pub use cm_slot::{LoadedMap, MapSlot};
pub use cm_trace::DIST_EPSILON;
pub use cmodel::{BoxLeafs, CollisionModel, NodeRef};
pub use config::CmodelConfig;
pub use error::CmodelError;
