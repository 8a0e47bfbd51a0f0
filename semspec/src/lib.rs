pub mod fit;
pub mod partable;
pub mod syntax;
pub mod types;

pub use fit::{FitRequest, SemEngine};
pub use syntax::{Coef, DefineLine, Line, ModelOp, ModelSyntax};
pub use types::*;
