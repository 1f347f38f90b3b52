use thiserror::Error;

use super::{SemType, TypeClass};

/// Errors raised by the type system itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("{class} has no {width}-bit form")]
    InvalidWidth { class: TypeClass, width: u16 },

    #[error("operator '{op}' is not supported for {ty}")]
    UnsupportedOperation { op: &'static str, ty: SemType },
}
