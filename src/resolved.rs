use std::collections::HashMap;
use crate::license::License;
use crate::repository::Repository;
use crate::scope::Scope;
use crate::task::ManagedDependency;

/// The output of the assembler: one fully resolved Maven coordinate and its resolved dependency
/// graph. Produced exactly once per [crate::task::PartialTreeKey] and memoized in
/// [crate::driver::Resolver]'s `resolved` table.
#[derive(Debug, Clone)]
pub struct ResolvedPom {
	pub group: String,
	pub artifact: String,
	pub version: String,
	/// The version with any `-<timestamp>-<buildnumber>` snapshot suffix folded to `-SNAPSHOT`.
	pub snapshot_version: String,

	pub parent: Option<Box<ResolvedPom>>,
	pub dependencies: Vec<Dependency>,
	pub dependency_management: Vec<ManagedDependency>,
	pub licenses: Vec<License>,
	pub repositories: Vec<Repository>,
	pub properties: HashMap<String, String>,
}

/// One edge in the resolved dependency graph.
#[derive(Debug, Clone)]
pub struct Dependency {
	pub scope: Scope,
	pub classifier: Option<String>,
	pub optional: bool,
	pub target: ResolvedPom,
	/// The version string as declared/requested before conflict resolution picked the final one
	/// reflected in `target.version`.
	pub requested_version: String,
	pub exclusion_patterns: Vec<(String, String)>,
}
