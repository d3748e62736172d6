//! Error types for meshwarp

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for meshwarp operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Allocation failed")]
    Alloc,

    #[error("Null domain")]
    DomainNull,

    #[error("Invalid domain data: {0}")]
    DomainData(String),

    #[error("Unsupported object type: {0}")]
    ObjectType(String),

    #[error("Unsupported grey type: {0}")]
    GreyType(String),

    #[error("Unsupported interpolation type: {0}")]
    InterpolationType(String),

    #[error("Invalid parameter: {0}")]
    ParamData(String),

    #[error("Mesh element {element} is invalid: {kind}")]
    Mesh { element: usize, kind: MeshErrorKind },
}

/// What a mesh verification pass found wrong with an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshErrorKind {
    /// Element id does not match its storage slot
    ElemIndex,
    /// Element node index out of range, repeated or deleted
    ElemNode,
    /// Element is a zombie
    ElemZombie,
    /// Source area is not positive
    ElemCw,
    /// Displaced area is not positive
    DElemCw,
    /// Neighbour index out of range
    NElemIndex,
    /// Neighbour does not share the expected edge
    NElemNode,
    /// Neighbour does not link back
    NElemNotNbr,
    /// Neighbour is a zombie
    NElemZombie,
}

impl fmt::Display for MeshErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MeshErrorKind::ElemIndex => "element index mismatch",
            MeshErrorKind::ElemNode => "bad element node",
            MeshErrorKind::ElemZombie => "element is a zombie",
            MeshErrorKind::ElemCw => "source area non-positive",
            MeshErrorKind::DElemCw => "displaced area non-positive",
            MeshErrorKind::NElemIndex => "neighbour index out of range",
            MeshErrorKind::NElemNode => "neighbour does not share edge",
            MeshErrorKind::NElemNotNbr => "neighbour asymmetry",
            MeshErrorKind::NElemZombie => "neighbour is a zombie",
        };
        f.write_str(msg)
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::Alloc
    }
}

/// Result type alias for meshwarp operations
pub type Result<T> = std::result::Result<T, Error>;
