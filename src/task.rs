use std::hash::{Hash, Hasher};
use std::rc::Rc;
use crate::coord::MavenCoord;
use crate::exclusions::ExclusionSet;
use crate::raw_pom::RawPom;
use crate::repository::Repository;
use crate::scope::Scope;

/// A node identity in the BFS work queue.
///
/// Two tasks are the same node — and therefore processed only once — iff `(scope, raw_pom,
/// exclusions, optional, classifier, requested_version)` match; `repositories` and `seen_parents`
/// are carried along for processing but deliberately excluded from equality and hashing, matching
/// the invariant in §3 of the design notes.
///
/// `raw_pom` is compared (and hashed) by pointer identity, not structural equality: the same
/// downloaded pom is shared via `Rc` between every task it's the subject of, and reference
/// identity is what "the same raw POM" means here.
#[derive(Clone)]
pub struct ResolutionTask {
	pub scope: Scope,
	pub raw_pom: Rc<RawPom>,
	pub exclusions: ExclusionSet,
	pub optional: bool,
	pub classifier: Option<String>,
	pub requested_version: String,

	/// The repository list visible to this task's subtree, including everything inherited from
	/// the parent task. Not part of the task's identity.
	pub repositories: Vec<Repository>,
	/// Ancestor parent GAVs seen so far on this path, insertion-ordered, for cycle detection. Not
	/// part of the task's identity.
	pub seen_parents: Vec<String>,
}

impl ResolutionTask {
	pub fn root(raw_pom: Rc<RawPom>, scope: Scope, requested_version: String, repositories: Vec<Repository>) -> ResolutionTask {
		ResolutionTask {
			scope,
			raw_pom,
			exclusions: ExclusionSet::new(),
			optional: false,
			classifier: None,
			requested_version,
			repositories,
			seen_parents: Vec::new(),
		}
	}

	/// Whether `parent_gav` is already on this task's ancestor chain; used to detect a parent
	/// cycle before recursing into it.
	pub fn has_seen_parent(&self, parent_gav: &str) -> bool {
		self.seen_parents.iter().any(|gav| gav == parent_gav)
	}
}

impl PartialEq for ResolutionTask {
	fn eq(&self, other: &Self) -> bool {
		self.scope == other.scope
			&& Rc::ptr_eq(&self.raw_pom, &other.raw_pom)
			&& self.exclusions == other.exclusions
			&& self.optional == other.optional
			&& self.classifier == other.classifier
			&& self.requested_version == other.requested_version
	}
}

impl Eq for ResolutionTask {}

impl Hash for ResolutionTask {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.scope.hash(state);
		(Rc::as_ptr(&self.raw_pom) as usize).hash(state);
		self.exclusions.hash(state);
		self.optional.hash(state);
		self.classifier.hash(state);
		self.requested_version.hash(state);
	}
}

/// The unique key of a [crate::task::PartialModel] / [crate::resolved::ResolvedPom]: `(groupId,
/// artifactId, version)`, after property evaluation and parent inheritance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialTreeKey {
	pub group: String,
	pub artifact: String,
	pub version: String,
}

impl PartialTreeKey {
	pub fn from_coord(coord: &MavenCoord) -> PartialTreeKey {
		PartialTreeKey { group: coord.group.clone(), artifact: coord.artifact.clone(), version: coord.version.clone() }
	}
}

/// One managed (`dependencyManagement`) entry, either declared directly or carried in through an
/// imported BOM. See stage 4 of the resolution worker.
#[derive(Debug, Clone)]
pub enum ManagedDependency {
	Defined {
		coord: MavenCoord,
		scope: Option<Scope>,
		optional: Option<bool>,
	},
	/// A BOM imported via `type=pom, scope=import`; its own managed entries are hoisted in
	/// transitively, nested recursively if that BOM itself imports further BOMs.
	Imported {
		bom: MavenCoord,
		entries: Vec<ManagedDependency>,
	},
}

/// The first-pass (BFS) output for one [ResolutionTask]: everything that can be computed without
/// knowing the globally conflict-resolved version of any dependency.
#[derive(Clone)]
pub struct PartialModel {
	pub raw_pom: Rc<RawPom>,
	pub resolved_parent: Option<PartialTreeKey>,
	pub dependency_management: Vec<ManagedDependency>,
	pub children: Vec<ResolutionTask>,
	pub licenses: Vec<crate::license::License>,
	pub repositories: Vec<Repository>,
	pub properties: std::collections::HashMap<String, String>,
}
