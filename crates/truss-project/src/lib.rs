//! Project Descriptors: immutable snapshots of evaluated build state.

mod descriptor;
mod evaluate;

pub use descriptor::OutputKind;
pub use descriptor::ProjectDescriptor;
pub use descriptor::ReferenceSpec;
pub use descriptor::metadata;
pub use descriptor::properties;
pub use evaluate::EvaluateError;
pub use evaluate::RESOLVE_ASSEMBLY_REFERENCES;
pub use evaluate::TARGET_FRAMEWORK_PROPERTY;
