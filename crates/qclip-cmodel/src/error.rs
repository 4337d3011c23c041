// error.rs — collision model build errors

use qclip_common::qfiles::LumpKind;
use thiserror::Error;

/// Reasons a map's collision data is refused at load time.
///
/// Queries against a built model never fail; every error is raised once,
/// while the model is being assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CmodelError {
    /// A lump that every map needs has no records.
    #[error("map has no {0}")]
    EmptyLump(LumpKind),

    /// A lump exceeds the engine's design limit.
    #[error("map has too many {lump} ({count}, max {max})")]
    TooMany {
        lump: LumpKind,
        count: usize,
        max: usize,
    },

    /// A record references something outside the model.
    #[error("malformed {lump} record {index}: {detail}")]
    MalformedGeometry {
        lump: LumpKind,
        index: usize,
        detail: String,
    },

    /// `inline_model` name was not `*N` with a valid N.
    #[error("bad inline model {0:?}")]
    BadInlineModel(String),
}

impl CmodelError {
    pub(crate) fn malformed(lump: LumpKind, index: usize, detail: impl Into<String>) -> Self {
        CmodelError::MalformedGeometry {
            lump,
            index,
            detail: detail.into(),
        }
    }
}
