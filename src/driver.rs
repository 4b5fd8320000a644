use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use anyhow::Result;
use async_recursion::async_recursion;
use log::{debug, trace};
use crate::coord::MavenCoord;
use crate::downloader::Downloader;
use crate::error::ResolveError;
use crate::raw_pom::RawPom;
use crate::repository::{self, Repository};
use crate::resolved::ResolvedPom;
use crate::scope::Scope;
use crate::task::{PartialModel, PartialTreeKey, ResolutionTask};
use crate::version_table::VersionSelectionTable;
use crate::{assembler, worker};

/// Configuration a [Resolver] is constructed with; see §6 of the design notes.
#[derive(Clone)]
pub struct ResolverConfig {
	/// Set on nested resolvers spawned for a parent pom or an imported BOM; a logging/metrics
	/// flag only, it changes no resolution semantics.
	pub for_parent: bool,
	/// Profiles already applied upstream by the parser; carried through only so nested resolvers
	/// (parent, BOM import) see the same active set.
	pub active_profiles: HashSet<String>,
	pub resolve_optional: bool,
	pub continue_on_error: bool,
	/// Called with every error that `continue_on_error` causes to be swallowed rather than
	/// propagated, so a caller can still observe/log them. `Rc` (not `Box`) so [Resolver::nested]
	/// can hand the same callback to nested resolvers without needing the callback itself to be
	/// `Clone`.
	pub on_error: Option<Rc<dyn Fn(&ResolveError)>>,
}

impl std::fmt::Debug for ResolverConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResolverConfig")
			.field("for_parent", &self.for_parent)
			.field("active_profiles", &self.active_profiles)
			.field("resolve_optional", &self.resolve_optional)
			.field("continue_on_error", &self.continue_on_error)
			.field("on_error", &self.on_error.as_ref().map(|_| "Fn(&ResolveError)"))
			.finish()
	}
}

impl Default for ResolverConfig {
	fn default() -> ResolverConfig {
		ResolverConfig {
			for_parent: false,
			active_profiles: HashSet::new(),
			resolve_optional: true,
			continue_on_error: true,
			on_error: None,
		}
	}
}

/// Owns the work queue, the partial-model and resolved-pom memo tables, and the version-selection
/// table for one top-level `resolve` call (and every nested resolver it spawns for parents and
/// imported BOMs). See §4.8 and §5 of the design notes: a [Resolver] is single-threaded and
/// cooperative, with no state shared outside of what's explicitly passed to a nested instance.
pub struct Resolver<'d, D: Downloader> {
	downloader: &'d D,
	config: ResolverConfig,
	queue: VecDeque<ResolutionTask>,
	partial_results: HashMap<ResolutionTask, PartialModel>,
	resolved: HashMap<PartialTreeKey, Option<ResolvedPom>>,
	version_table: VersionSelectionTable,
	/// Caches downloaded raw poms by coordinate so that two dependency edges pointing at the same
	/// GAV share the same `Rc<RawPom>` — required for [ResolutionTask] deduplication, which
	/// compares raw poms by pointer identity (see [crate::task::ResolutionTask]).
	pom_cache: HashMap<String, Rc<RawPom>>,
}

impl<'d, D: Downloader> Resolver<'d, D> {
	pub fn new(downloader: &'d D, config: ResolverConfig) -> Resolver<'d, D> {
		Resolver {
			downloader,
			config,
			queue: VecDeque::new(),
			partial_results: HashMap::new(),
			resolved: HashMap::new(),
			version_table: VersionSelectionTable::new(),
			pom_cache: HashMap::new(),
		}
	}

	/// Spawns a resolver for a parent pom or an imported BOM: fresh queue and memo tables, but
	/// sharing the downloader and `resolveOptional` flag, per §4.8.
	fn nested(&self) -> Resolver<'d, D> {
		Resolver::new(self.downloader, ResolverConfig {
			for_parent: true,
			active_profiles: self.config.active_profiles.clone(),
			resolve_optional: self.config.resolve_optional,
			continue_on_error: self.config.continue_on_error,
			on_error: self.config.on_error.clone(),
		})
	}

	pub(crate) fn config(&self) -> &ResolverConfig {
		&self.config
	}

	pub(crate) fn version_table_mut(&mut self) -> &mut VersionSelectionTable {
		&mut self.version_table
	}

	pub(crate) fn resolved_memo_mut(&mut self) -> &mut HashMap<PartialTreeKey, Option<ResolvedPom>> {
		&mut self.resolved
	}

	pub(crate) fn partial_results(&self) -> &HashMap<ResolutionTask, PartialModel> {
		&self.partial_results
	}

	/// Enqueues `task` unless an equal task is already queued or already processed.
	pub(crate) fn enqueue(&mut self, task: ResolutionTask) {
		if !self.partial_results.contains_key(&task) && !self.queue.contains(&task) {
			self.queue.push_back(task);
		}
	}

	/// Downloads (or reuses a cached) raw pom for `coord`, preserving `Rc` identity across calls
	/// with an equal coordinate.
	pub(crate) async fn get_or_download_pom(&mut self, repositories: &[Repository], coord: &MavenCoord) -> Result<Option<Rc<RawPom>>> {
		let cache_key = coord.to_string();
		if let Some(cached) = self.pom_cache.get(&cache_key) {
			return Ok(Some(cached.clone()));
		}

		match repository::try_get_pom_for(self.downloader, repositories, coord).await? {
			Some((_repository, raw_pom)) => {
				let rc = Rc::new(raw_pom);
				self.pom_cache.insert(cache_key, rc.clone());
				Ok(Some(rc))
			}
			None => Ok(None),
		}
	}

	/// Resolves a nested pom (parent or imported BOM) end to end: drains its own queue, then
	/// assembles its root task. Shares the downloader and `resolveOptional` with `self` but starts
	/// from fresh queue/memo state.
	#[async_recursion(?Send)]
	pub(crate) async fn resolve_nested(&self, raw_pom: Rc<RawPom>, repositories: Vec<Repository>, seen_parents: Vec<String>) -> Result<Option<ResolvedPom>, ResolveError> {
		let mut nested = self.nested();
		let mut root_task = ResolutionTask::root(raw_pom, Scope::None, String::new(), repositories);
		root_task.seen_parents = seen_parents;

		nested.enqueue(root_task.clone());
		nested.drain_queue().await?;

		let mut path = Vec::new();
		assembler::assemble_task(&mut nested, &root_task, &mut path).await
			.map_err(|source| to_parse_error(source, "assembling nested pom"))
	}

	async fn drain_queue(&mut self) -> Result<(), ResolveError> {
		while let Some(task) = self.queue.pop_front() {
			if self.partial_results.contains_key(&task) {
				continue;
			}

			trace!("processing task at scope {:?}", task.scope);
			match worker::process_task(self, &task).await {
				Ok(partial_model) => {
					self.partial_results.insert(task, partial_model);
				}
				Err(err) => {
					if self.config.continue_on_error {
						debug!("pruning task after error: {err:#}");
					} else {
						return Err(to_parse_error(err, "resolving task"));
					}
				}
			}
		}
		Ok(())
	}

	/// Resolves `raw_pom` to a [ResolvedPom]: drains the BFS queue starting from a root task over
	/// `raw_pom`, then runs the DFS assembler over the resulting partial models.
	pub async fn resolve(mut self, raw_pom: RawPom, repositories: Vec<Repository>) -> Result<ResolvedPom, ResolveError> {
		let version = raw_pom.version.clone().unwrap_or_default();
		let raw_pom = Rc::new(raw_pom);
		let root_task = ResolutionTask::root(raw_pom, Scope::None, version, repositories);

		self.enqueue(root_task.clone());
		self.drain_queue().await?;

		let mut path = Vec::new();
		assembler::assemble_task(&mut self, &root_task, &mut path).await
			.map_err(|source| to_parse_error(source, "assembling root pom"))?
			.ok_or_else(|| ResolveError::ParseError {
				context: "root pom".to_owned(),
				source: anyhow::anyhow!("root pom could not be assembled"),
			})
	}
}

pub(crate) fn to_parse_error(source: anyhow::Error, context: impl Into<String>) -> ResolveError {
	ResolveError::ParseError { context: context.into(), source }
}

/// End-to-end tests driving [Resolver::resolve] against an in-memory [Downloader], covering the six
/// scenarios of §8 of the design notes: a direct jar, a transitive nearer-wins conflict, scope
/// transitivity pruning, a BOM import, a parent cycle and property indirection through
/// `dependencyManagement`.
#[cfg(test)]
mod testing {
	use std::collections::HashMap;
	use std::error::Error;
	use pretty_assertions::assert_eq;
	use crate::coord::MavenCoord;
	use crate::driver::{Resolver, ResolverConfig};
	use crate::raw_pom::{RawDependencies, RawDependency, RawDependencyManagement, RawParent, RawPom};
	use crate::repository::Repository;
	use crate::scope::{ManagementScope, Scope};

	fn repo() -> Repository {
		Repository::new("test", "https://example.org")
	}

	fn leak(s: String) -> &'static str {
		Box::leak(s.into_boxed_str())
	}

	fn pom_url(coord: &MavenCoord) -> &'static str {
		leak(coord.make_pom_url(&repo()))
	}

	fn pom(group: &str, artifact: &str, version: &str) -> RawPom {
		RawPom {
			model_version: "4.0.0".to_owned(),
			group_id: Some(group.to_owned()),
			artifact_id: artifact.to_owned(),
			version: Some(version.to_owned()),
			..Default::default()
		}
	}

	fn dep(group: &str, artifact: &str, version: Option<&str>) -> RawDependency<Scope> {
		RawDependency {
			group_id: group.to_owned(),
			artifact_id: artifact.to_owned(),
			version: version.map(str::to_owned),
			type_: None,
			classifier: None,
			scope: None,
			optional: None,
			exclusions: None,
		}
	}

	fn dep_scoped(group: &str, artifact: &str, version: &str, scope: Scope) -> RawDependency<Scope> {
		RawDependency { scope: Some(scope), ..dep(group, artifact, Some(version)) }
	}

	fn managed_dep(group: &str, artifact: &str, version: &str, type_: Option<&str>, scope: Option<ManagementScope>) -> RawDependency<ManagementScope> {
		RawDependency {
			group_id: group.to_owned(),
			artifact_id: artifact.to_owned(),
			version: Some(version.to_owned()),
			type_: type_.map(str::to_owned),
			classifier: None,
			scope,
			optional: None,
			exclusions: None,
		}
	}

	/// Walks the `source()` chain of an error, concatenating every level's own message — used to
	/// check a deeply-wrapped cause (e.g. a [crate::error::ResolveError::ParentCycle] several
	/// `resolve_nested` calls deep) without depending on `anyhow`'s own alternate-display chaining.
	fn chain_to_string(err: &(dyn Error + 'static)) -> String {
		let mut s = err.to_string();
		let mut current = err.source();
		while let Some(cause) = current {
			s.push_str(" | ");
			s.push_str(&cause.to_string());
			current = cause.source();
		}
		s
	}

	#[tokio::test]
	async fn direct_jar_dependency_resolves() {
		let a = pom("com.example", "a", "1.0");
		let mut root = pom("com.example", "root", "1.0");
		root.dependencies = Some(RawDependencies { dependency: vec![dep("com.example", "a", Some("1.0"))] });

		let a_coord = MavenCoord::from_group_artifact_version("com.example", "a", "1.0");
		let downloader = HashMap::from([(pom_url(&a_coord), a)]);

		let resolver = Resolver::new(&downloader, ResolverConfig::default());
		let resolved = resolver.resolve(root, vec![repo()]).await.unwrap();

		assert_eq!(resolved.dependencies.len(), 1);
		assert_eq!(resolved.dependencies[0].scope, Scope::Compile);
		assert_eq!(resolved.dependencies[0].target.group, "com.example");
		assert_eq!(resolved.dependencies[0].target.artifact, "a");
		assert_eq!(resolved.dependencies[0].target.version, "1.0");
	}

	#[tokio::test]
	async fn transitive_conflict_nearer_wins() {
		// root declares both a:1.0 and b:1.0 directly; a:1.0 also pulls in b:2.0 transitively.
		// root's own (nearer) declaration of b must win, for both the direct edge and the one
		// reached through a.
		let b_1_0 = pom("com.example", "b", "1.0");

		let mut a = pom("com.example", "a", "1.0");
		a.dependencies = Some(RawDependencies { dependency: vec![dep("com.example", "b", Some("2.0"))] });

		let mut root = pom("com.example", "root", "1.0");
		root.dependencies = Some(RawDependencies { dependency: vec![
			dep("com.example", "a", Some("1.0")),
			dep("com.example", "b", Some("1.0")),
		] });

		let a_coord = MavenCoord::from_group_artifact_version("com.example", "a", "1.0");
		let b_coord = MavenCoord::from_group_artifact_version("com.example", "b", "1.0");
		let downloader = HashMap::from([
			(pom_url(&a_coord), a),
			(pom_url(&b_coord), b_1_0),
		]);

		let resolver = Resolver::new(&downloader, ResolverConfig::default());
		let resolved = resolver.resolve(root, vec![repo()]).await.unwrap();

		assert_eq!(resolved.dependencies.len(), 2);

		let b_direct = resolved.dependencies.iter().find(|d| d.target.artifact == "b").unwrap();
		assert_eq!(b_direct.target.version, "1.0");

		let a_dep = resolved.dependencies.iter().find(|d| d.target.artifact == "a").unwrap();
		assert_eq!(a_dep.target.dependencies.len(), 1);
		assert_eq!(a_dep.target.dependencies[0].target.version, "1.0");
	}

	#[tokio::test]
	async fn scope_transitivity_prunes_test_scope_dependency() {
		let mut a = pom("com.example", "a", "1.0");
		a.dependencies = Some(RawDependencies { dependency: vec![dep_scoped("com.example", "b", "1.0", Scope::Test)] });

		let mut root = pom("com.example", "root", "1.0");
		root.dependencies = Some(RawDependencies { dependency: vec![dep("com.example", "a", Some("1.0"))] });

		let a_coord = MavenCoord::from_group_artifact_version("com.example", "a", "1.0");
		let downloader = HashMap::from([(pom_url(&a_coord), a)]);

		let resolver = Resolver::new(&downloader, ResolverConfig::default());
		let resolved = resolver.resolve(root, vec![repo()]).await.unwrap();

		assert_eq!(resolved.dependencies.len(), 1);
		assert!(resolved.dependencies[0].target.dependencies.is_empty());
	}

	#[tokio::test]
	async fn bom_import_pins_managed_version() {
		let mut bom = pom("com.bom", "lib-bom", "1.0");
		bom.dependency_management = Some(RawDependencyManagement {
			dependencies: Some(RawDependencies { dependency: vec![managed_dep("com.example", "c", "3.0", None, None)] }),
		});
		let c = pom("com.example", "c", "3.0");

		let mut root = pom("com.example", "root", "1.0");
		root.dependency_management = Some(RawDependencyManagement {
			dependencies: Some(RawDependencies { dependency: vec![
				managed_dep("com.bom", "lib-bom", "1.0", Some("pom"), Some(ManagementScope::Import)),
			] }),
		});
		root.dependencies = Some(RawDependencies { dependency: vec![dep("com.example", "c", None)] });

		let bom_coord = MavenCoord::from_group_artifact_version("com.bom", "lib-bom", "1.0");
		let c_coord = MavenCoord::from_group_artifact_version("com.example", "c", "3.0");
		let downloader = HashMap::from([
			(pom_url(&bom_coord), bom),
			(pom_url(&c_coord), c),
		]);

		let resolver = Resolver::new(&downloader, ResolverConfig::default());
		let resolved = resolver.resolve(root, vec![repo()]).await.unwrap();

		assert_eq!(resolved.dependencies.len(), 1);
		assert_eq!(resolved.dependencies[0].target.artifact, "c");
		assert_eq!(resolved.dependencies[0].target.version, "3.0");
	}

	#[tokio::test]
	async fn parent_cycle_is_reported() {
		let pom_a = RawPom {
			model_version: "4.0.0".to_owned(),
			group_id: Some("com.x".to_owned()),
			artifact_id: "a".to_owned(),
			version: Some("1.0".to_owned()),
			parent: Some(RawParent { group_id: "com.x".to_owned(), artifact_id: "b".to_owned(), version: "1.0".to_owned(), relative_path: None }),
			..Default::default()
		};
		let pom_b = RawPom {
			model_version: "4.0.0".to_owned(),
			group_id: Some("com.x".to_owned()),
			artifact_id: "b".to_owned(),
			version: Some("1.0".to_owned()),
			parent: Some(RawParent { group_id: "com.x".to_owned(), artifact_id: "a".to_owned(), version: "1.0".to_owned(), relative_path: None }),
			..Default::default()
		};

		let a_coord = MavenCoord::from_group_artifact_version("com.x", "a", "1.0");
		let b_coord = MavenCoord::from_group_artifact_version("com.x", "b", "1.0");
		let downloader = HashMap::from([
			(pom_url(&a_coord), pom_a.clone()),
			(pom_url(&b_coord), pom_b),
		]);

		let config = ResolverConfig { continue_on_error: false, ..ResolverConfig::default() };
		let resolver = Resolver::new(&downloader, config);
		let err = resolver.resolve(pom_a, vec![repo()]).await.unwrap_err();

		let chain = chain_to_string(&err);
		assert!(chain.contains("parent cycle"), "chain was: {chain}");
		assert!(chain.contains("com.x:a:1.0"), "chain was: {chain}");
		assert!(chain.contains("com.x:b:1.0"), "chain was: {chain}");
	}

	#[tokio::test]
	async fn property_indirection_through_dependency_management() {
		let mut root = pom("com.example", "root", "1.0");
		root.properties = HashMap::from([("lib.version".to_owned(), "4.0".to_owned())]);
		root.dependency_management = Some(RawDependencyManagement {
			dependencies: Some(RawDependencies { dependency: vec![managed_dep("com.example", "d", "${lib.version}", None, None)] }),
		});
		root.dependencies = Some(RawDependencies { dependency: vec![dep("com.example", "d", None)] });

		let d = pom("com.example", "d", "4.0");
		let d_coord = MavenCoord::from_group_artifact_version("com.example", "d", "4.0");
		let downloader = HashMap::from([(pom_url(&d_coord), d)]);

		let resolver = Resolver::new(&downloader, ResolverConfig::default());
		let resolved = resolver.resolve(root, vec![repo()]).await.unwrap();

		assert_eq!(resolved.dependencies.len(), 1);
		assert_eq!(resolved.dependencies[0].target.artifact, "d");
		assert_eq!(resolved.dependencies[0].target.version, "4.0");
	}

	#[tokio::test]
	async fn inherited_dependency_through_multi_level_parent_chain_appears_once() {
		// grandparent g declares dependency z; parent p's parent is g; root c's parent is p.
		// z must be inherited exactly once, not once per level of the chain.
		let z = pom("com.example", "z", "1.0");

		let mut g = pom("com.example", "g", "1.0");
		g.dependencies = Some(RawDependencies { dependency: vec![dep("com.example", "z", Some("1.0"))] });

		let mut p = pom("com.example", "p", "1.0");
		p.parent = Some(RawParent { group_id: "com.example".to_owned(), artifact_id: "g".to_owned(), version: "1.0".to_owned(), relative_path: None });

		let mut c = pom("com.example", "c", "1.0");
		c.parent = Some(RawParent { group_id: "com.example".to_owned(), artifact_id: "p".to_owned(), version: "1.0".to_owned(), relative_path: None });

		let z_coord = MavenCoord::from_group_artifact_version("com.example", "z", "1.0");
		let g_coord = MavenCoord::from_group_artifact_version("com.example", "g", "1.0");
		let p_coord = MavenCoord::from_group_artifact_version("com.example", "p", "1.0");
		let downloader = HashMap::from([
			(pom_url(&z_coord), z),
			(pom_url(&g_coord), g),
			(pom_url(&p_coord), p),
		]);

		let resolver = Resolver::new(&downloader, ResolverConfig::default());
		let resolved = resolver.resolve(c, vec![repo()]).await.unwrap();

		let z_occurrences: Vec<_> = resolved.dependencies.iter().filter(|d| d.target.artifact == "z").collect();
		assert_eq!(z_occurrences.len(), 1, "z should be inherited exactly once, got {}", resolved.dependencies.len());
	}
}
