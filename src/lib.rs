//! Twin-model structural specifications for multi-group SEM engines.
//!
//! Groups are resolved against a relatedness table, combined with a model
//! family template, and emitted as a [`spec::StructuralSpecification`] that
//! renders to lavaan syntax or a parameter table.

pub mod error;
pub mod logging;
pub mod types;

pub mod io;
pub mod parallel;

pub mod analysis;
pub mod builder;
pub mod decompose;
pub mod family;
pub mod group;
pub mod relatedness;
pub mod simulate;
pub mod spec;
pub mod summary;

pub use builder::{BuildOptions, SpecBuilder, build, build_from_labels};
pub use error::{Result, TwinSemError};
pub use family::Family;
pub use group::{GroupSet, resolve};
pub use spec::StructuralSpecification;
