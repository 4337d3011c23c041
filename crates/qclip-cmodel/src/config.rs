// config.rs — collision model build options
//
// Controls how strictly lump data is checked and when the builder hands
// large lumps to the rayon thread pool.

/// Build options for [`CollisionModel::build_with_config`](crate::cmodel::CollisionModel::build_with_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmodelConfig {
    /// Lumps with at least this many records are converted in parallel.
    /// Below it sequential conversion is faster.
    pub parallel_threshold: usize,
    /// Reject lumps larger than the engine's `MAX_MAP_*` limits.
    pub enforce_map_limits: bool,
    /// Require leaf 0 to be `CONTENTS_SOLID`, as in compiled maps.
    pub require_solid_leaf_zero: bool,
    /// Widen sub-model bounds by one unit on every side.
    pub spread_submodel_bounds: bool,
}

impl Default for CmodelConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 64,
            enforce_map_limits: true,
            require_solid_leaf_zero: false,
            spread_submodel_bounds: true,
        }
    }
}

impl CmodelConfig {
    /// Configuration matching the engine's map loader: solid leaf 0
    /// is mandatory.
    pub fn strict() -> Self {
        Self {
            require_solid_leaf_zero: true,
            ..Self::default()
        }
    }

    /// Whether a lump of `count` records should be processed in parallel.
    #[inline]
    pub fn use_parallel(&self, count: usize) -> bool {
        count >= self.parallel_threshold
    }
}
