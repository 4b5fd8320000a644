use std::rc::Rc;
use anyhow::{anyhow, Context, Result};
use log::warn;
use crate::coord::{Coordinate, MavenCoord};
use crate::downloader::Downloader;
use crate::driver::{Resolver, ResolverConfig};
use crate::error::ResolveError;
use crate::license::canonicalize_license;
use crate::properties::{well_known_properties, PropertyEvaluator};
use crate::repository::Repository;
use crate::scope::Scope;
use crate::task::{ManagedDependency, PartialModel, PartialTreeKey, ResolutionTask};

fn validate_url(url: &str) -> bool {
	url.starts_with("http://") || url.starts_with("https://") || url.starts_with("file://")
}

/// Applies the §7 propagation policy to one atomic operation's failure: reported to the caller's
/// `on_error` callback (if any) and logged and swallowed when `continue_on_error`, re-thrown
/// (failing the whole task) otherwise.
fn on_error(config: &ResolverConfig, err: ResolveError) -> Result<()> {
	if let Some(callback) = &config.on_error {
		callback(&err);
	}
	if config.continue_on_error {
		warn!("{err}");
		Ok(())
	} else {
		Err(err.into())
	}
}

fn find_managed(managed: &[ManagedDependency], group: &str, artifact: &str) -> Option<MavenCoord> {
	for entry in managed {
		match entry {
			ManagedDependency::Defined { coord, .. } if coord.group == group && coord.artifact == artifact => return Some(coord.clone()),
			ManagedDependency::Imported { entries, .. } => {
				if let Some(found) = find_managed(entries, group, artifact) {
					return Some(found);
				}
			}
			_ => {}
		}
	}
	None
}

/// Resolves a dependency's effective version per §4.6 stage 6: managed entries take priority over
/// the dependency's own declaration (own `dependencyManagement` first, then the parent chain's),
/// falling back to the declared version only if neither pins one. Whatever is found is then
/// expanded against placeholders in a bounded fixed-point loop, since a managed version commonly
/// indirects through a property (see end-to-end scenario 6 in the design notes).
fn resolve_effective_version(
	declared: Option<&str>,
	managed_own: &[ManagedDependency],
	managed_parent: &[ManagedDependency],
	group: &str,
	artifact: &str,
	evaluator: &PropertyEvaluator,
) -> Option<String> {
	let initial = find_managed(managed_own, group, artifact)
		.or_else(|| find_managed(managed_parent, group, artifact))
		.map(|coord| coord.version)
		.or_else(|| declared.map(str::to_owned))?;

	let mut current = initial;
	for _ in 0..3 {
		let evaluated = evaluator.resolve(&current);
		if evaluated == current {
			break;
		}
		current = evaluated;
	}
	Some(current)
}

/// Processes one [ResolutionTask], producing its [PartialModel]. Implements the six BFS worker
/// stages of §4.6 of the design notes, in order.
pub(crate) async fn process_task<D: Downloader>(resolver: &mut Resolver<'_, D>, task: &ResolutionTask) -> Result<PartialModel> {
	let raw_pom = task.raw_pom.clone();
	let declaring_pom = format!("{}:{}", raw_pom.group_id.as_deref().unwrap_or("?"), raw_pom.artifact_id);

	// stage 1: properties
	let properties = raw_pom.properties.clone();

	// well-known project/pom identity placeholders, without the parent triple yet (the parent
	// isn't resolved until stage 3); repository urls rarely need it, so this is resolved first
	// with a conservative evaluator and rebuilt below once the parent is known.
	let preliminary_well_known = well_known_properties(
		raw_pom.group_id.as_deref().unwrap_or(""),
		&raw_pom.artifact_id,
		raw_pom.version.as_deref().unwrap_or(""),
		None,
	);
	let mut preliminary_evaluator = PropertyEvaluator::new(preliminary_well_known);
	preliminary_evaluator.push_layer(properties.clone());

	// stage 2: repositories
	let mut repositories = Vec::new();
	if let Some(raw_repositories) = &raw_pom.repositories {
		for raw_repository in &raw_repositories.repository {
			let url = preliminary_evaluator.resolve(&raw_repository.url);
			if validate_url(&url) {
				repositories.push(Repository::new(raw_repository.id.clone(), url));
			} else {
				warn!("skipping repository {:?} with malformed url {url:?}", raw_repository.id);
			}
		}
	}
	repositories.extend(task.repositories.iter().cloned());

	// stage 3: parent
	let mut resolved_parent = None;
	if let Some(parent_coord) = raw_pom.get_parent_coord() {
		let parent_gav = format!("{}:{}:{}", parent_coord.group, parent_coord.artifact, parent_coord.version);

		if task.has_seen_parent(&parent_gav) {
			let mut chain = task.seen_parents.clone();
			chain.push(parent_gav);
			return Err(anyhow::Error::from(ResolveError::ParentCycle { chain }));
		}

		let parent_key = PartialTreeKey::from_coord(&parent_coord);
		resolved_parent = if let Some(cached) = resolver.resolved_memo_mut().get(&parent_key) {
			cached.clone()
		} else {
			let parent_raw_pom = resolver.get_or_download_pom(&repositories, &parent_coord).await
				.with_context(|| anyhow!("downloading parent pom {parent_coord}"))?;

			let resolved = match parent_raw_pom {
				Some(parent_raw_pom) => {
					let mut seen_parents = task.seen_parents.clone();
					seen_parents.push(parent_gav);
					resolver.resolve_nested(parent_raw_pom, repositories.clone(), seen_parents).await
						.context("resolving parent pom")?
				}
				None => None,
			};

			resolver.resolved_memo_mut().insert(parent_key, resolved.clone());
			resolved
		};
	}

	// rebuild the evaluator now that the parent (and its properties/identity) is known
	let own_group = raw_pom.group_id.clone().or_else(|| resolved_parent.as_ref().map(|p| p.group.clone()));
	let own_version = raw_pom.version.clone().or_else(|| resolved_parent.as_ref().map(|p| p.version.clone()));
	let parent_triple = resolved_parent.as_ref().map(|p| (p.group.clone(), p.artifact.clone(), p.version.clone()));

	let well_known = well_known_properties(
		own_group.as_deref().unwrap_or(""),
		&raw_pom.artifact_id,
		own_version.as_deref().unwrap_or(""),
		parent_triple.as_ref().map(|(g, a, v)| (g.as_str(), a.as_str(), v.as_str())),
	);
	let mut evaluator = PropertyEvaluator::new(well_known);
	evaluator.push_layer(properties.clone());
	if let Some(parent) = &resolved_parent {
		evaluator.push_layer(parent.properties.clone());
	}

	// stage 4: dependency management
	let mut dependency_management = Vec::new();
	if let Some(raw_management) = &raw_pom.dependency_management {
		if let Some(raw_dependencies) = &raw_management.dependencies {
			for dep in &raw_dependencies.dependency {
				let group = evaluator.resolve(&dep.group_id);
				let artifact = evaluator.resolve(&dep.artifact_id);
				let is_import = dep.scope == Some(crate::scope::ManagementScope::Import) && dep.type_.as_deref() == Some("pom");

				let Some(version) = dep.version.as_deref().map(|v| evaluator.resolve(v)) else {
					on_error(resolver.config(), ResolveError::ManagedDependencyMissingVersion { coordinate: format!("{group}:{artifact}") })?;
					continue;
				};

				if is_import {
					let bom_coord = MavenCoord { group, artifact, version, classifier: None, type_: "pom".to_owned() };
					match resolver.get_or_download_pom(&repositories, &bom_coord).await {
						Ok(Some(bom_raw_pom)) => {
							match resolver.resolve_nested(bom_raw_pom, repositories.clone(), task.seen_parents.clone()).await {
								Ok(Some(bom)) => {
									// the BOM's own <properties> are visible to whatever it manages, e.g. a
									// managed version indirecting through a property only the BOM declares.
									evaluator.push_layer(bom.properties.clone());
									dependency_management.push(ManagedDependency::Imported { bom: bom_coord, entries: bom.dependency_management });
								}
								Ok(None) => on_error(resolver.config(), ResolveError::MissingArtifact { coordinate: bom_coord.to_string(), declaring_pom: declaring_pom.clone() })?,
								Err(e) => on_error(resolver.config(), e)?,
							}
						}
						Ok(None) => on_error(resolver.config(), ResolveError::MissingArtifact { coordinate: bom_coord.to_string(), declaring_pom: declaring_pom.clone() })?,
						Err(e) => on_error(resolver.config(), ResolveError::DownloaderIo { coordinate: bom_coord.to_string(), source: e })?,
					}
				} else {
					let coord = MavenCoord { group, artifact, version, classifier: dep.classifier.clone(), type_: dep.type_.clone().unwrap_or_else(|| "jar".to_owned()) };
					dependency_management.push(ManagedDependency::Defined { coord, scope: dep.scope.and_then(|s| s.into_scope()), optional: dep.optional });
				}
			}
		}
	}

	let parent_managed = resolved_parent.as_ref().map(|p| p.dependency_management.clone()).unwrap_or_default();

	// stage 5: licenses
	let licenses = raw_pom.licenses.iter()
		.flat_map(|raw_licenses| &raw_licenses.license)
		.map(|license| canonicalize_license(license.name.as_deref().unwrap_or("")))
		.collect();

	// stage 6: dependencies
	let mut children = Vec::new();
	if let Some(raw_dependencies) = &raw_pom.dependencies {
		'dependency: for dep in &raw_dependencies.dependency {
			if let Some(type_) = &dep.type_ {
				if type_ != "jar" {
					continue;
				}
			}
			if dep.optional == Some(true) && !resolver.config().resolve_optional {
				continue;
			}

			let group = evaluator.resolve(&dep.group_id);
			let artifact = evaluator.resolve(&dep.artifact_id);
			if group.is_empty() || group.contains("${") || artifact.is_empty() || artifact.contains("${") {
				on_error(resolver.config(), ResolveError::ParseError {
					context: format!("dependency {group}:{artifact} in {declaring_pom}"),
					source: anyhow!("groupId/artifactId still contains an unresolved property placeholder"),
				})?;
				continue;
			}

			if task.exclusions.matches(&group, &artifact) {
				continue;
			}

			let Some(version) = resolve_effective_version(dep.version.as_deref(), &dependency_management, &parent_managed, &group, &artifact, &evaluator) else {
				on_error(resolver.config(), ResolveError::ParseError {
					context: format!("dependency {group}:{artifact} in {declaring_pom}"),
					source: anyhow!("no resolvable version (not declared, not managed, not inherited)"),
				})?;
				continue;
			};

			let requested_scope = dep.scope.unwrap_or(Scope::Compile);
			let Some(effective_scope) = requested_scope.transitive_of(task.scope) else {
				continue; // pruned: provided/test/system beyond the root
			};

			let coordinate = Coordinate::new(group.clone(), artifact.clone());
			let selected = resolver.version_table_mut().select_version(effective_scope, &coordinate, &version);
			let final_version = selected.resolve().to_owned();

			let artifact_coord = MavenCoord { group, artifact, version: final_version.clone(), classifier: dep.classifier.clone(), type_: dep.type_.clone().unwrap_or_else(|| "jar".to_owned()) };

			let child_raw_pom = match resolver.get_or_download_pom(&repositories, &artifact_coord).await {
				Ok(Some(rc)) => rc,
				Ok(None) => {
					on_error(resolver.config(), ResolveError::MissingArtifact { coordinate: artifact_coord.to_string(), declaring_pom: declaring_pom.clone() })?;
					continue 'dependency;
				}
				Err(e) => {
					on_error(resolver.config(), ResolveError::DownloaderIo { coordinate: artifact_coord.to_string(), source: e })?;
					continue 'dependency;
				}
			};

			let child_task = ResolutionTask {
				scope: requested_scope,
				raw_pom: child_raw_pom,
				exclusions: task.exclusions.extended_with(dep.exclusions.as_ref()),
				optional: dep.optional.unwrap_or(false),
				classifier: dep.classifier.clone(),
				requested_version: final_version,
				repositories: repositories.clone(),
				seen_parents: task.seen_parents.clone(),
			};

			resolver.enqueue(child_task.clone());
			children.push(child_task);
		}
	}

	Ok(PartialModel {
		raw_pom: Rc::clone(&raw_pom),
		resolved_parent: resolved_parent.map(|p| PartialTreeKey { group: p.group.clone(), artifact: p.artifact.clone(), version: p.version.clone() }),
		dependency_management,
		children,
		licenses,
		repositories,
		properties,
	})
}
