//! Solution orchestration: enumerate a solution's declared projects,
//! evaluate each through the build host, and drive the workspace through
//! the two-pass load (add every project first, then resolve
//! cross-project references once the full project set is present).

mod loader;
mod manifest;
mod sources;

pub use loader::load;
pub use loader::Evaluator;
pub use loader::HostEvaluator;
pub use loader::LoadReport;
pub use loader::ProjectFailure;
pub use loader::ReferenceError;
pub use manifest::JsonManifest;
pub use manifest::ManifestError;
pub use manifest::SolutionManifest;
pub use sources::enumerate_sources;
