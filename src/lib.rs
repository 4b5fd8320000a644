//! A transitive Maven POM dependency resolver.
//!
//! Given a [raw POM](raw_pom::RawPom) (already parsed from xml upstream; parsing itself is out of
//! scope here), [driver::Resolver::resolve] computes the fully resolved dependency graph: every
//! transitive artifact with its scope, classifier, optional flag, conflict-resolved version,
//! inherited parent dependencies, imported BOMs and evaluated `${...}` property placeholders.
//!
//! The resolver is a two-phase pipeline:
//! 1. a breadth-first [worker] drains a queue of [task::ResolutionTask]s, producing one
//!    [task::PartialModel] per task and enqueuing its child dependencies;
//! 2. a depth-first [assembler] walks the resulting task tree, producing the final
//!    [resolved::ResolvedPom], splicing in parent-inherited dependencies under conflict-resolved
//!    versions.
//!
//! See [driver] for the type that owns both passes.

pub mod cache;
pub mod coord;
pub mod downloader;
pub mod driver;
pub mod error;
pub mod exclusions;
pub mod license;
pub mod properties;
pub mod raw_pom;
pub mod repository;
pub mod resolved;
pub mod scope;
pub mod task;
pub mod version_table;

mod assembler;
mod worker;

pub use coord::{Coordinate, MavenCoord};
pub use downloader::Downloader;
pub use driver::{Resolver, ResolverConfig};
pub use error::ResolveError;
pub use resolved::{Dependency, ResolvedPom};
pub use scope::Scope;
