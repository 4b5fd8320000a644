use anyhow::{Context, Result};
use async_recursion::async_recursion;
use log::{debug, warn};
use crate::coord::Coordinate;
use crate::downloader::Downloader;
use crate::driver::Resolver;
use crate::resolved::{Dependency, ResolvedPom};
use crate::task::{PartialTreeKey, ResolutionTask};

/// Depth-first second pass over the BFS-produced partial models, assembling a [ResolvedPom].
/// Implements §4.7 of the design notes: cycle cutting via a path stack, memoization via
/// `resolver`'s `resolved` table, and the "inheritance splice" that re-applies conflict resolution
/// to ancestor-declared dependencies under the current task's repository list.
#[async_recursion(?Send)]
pub(crate) async fn assemble_task<D: Downloader>(
	resolver: &mut Resolver<'_, D>,
	task: &ResolutionTask,
	path: &mut Vec<ResolutionTask>,
) -> Result<Option<ResolvedPom>> {
	if path.contains(task) {
		return Ok(None); // cycle cut
	}

	let Some(partial) = resolver.partial_results().get(task).cloned() else {
		return Ok(None);
	};

	let parent = match &partial.resolved_parent {
		Some(key) => resolver.resolved_memo_mut().get(key).cloned().flatten(),
		None => None,
	};

	let group = partial.raw_pom.group_id.clone()
		.or_else(|| parent.as_ref().map(|p| p.group.clone()))
		.unwrap_or_default();
	let artifact = partial.raw_pom.artifact_id.clone();
	let version = partial.raw_pom.version.clone()
		.or_else(|| parent.as_ref().map(|p| p.version.clone()))
		.unwrap_or_else(|| task.requested_version.clone());

	let key = PartialTreeKey { group: group.clone(), artifact: artifact.clone(), version: version.clone() };
	if let Some(cached) = resolver.resolved_memo_mut().get(&key) {
		return Ok(cached.clone());
	}

	path.push(task.clone());

	let mut dependencies = Vec::new();
	for child_task in &partial.children {
		if let Some(child_resolved) = assemble_task(resolver, child_task, path).await? {
			let optional = child_task.optional || path.iter().any(|ancestor| ancestor.optional);
			dependencies.push(Dependency {
				scope: child_task.scope,
				classifier: child_task.classifier.clone(),
				optional,
				target: child_resolved,
				requested_version: child_task.requested_version.clone(),
				exclusion_patterns: child_task.exclusions.patterns().to_vec(),
			});
		}
	}

	// inheritance splice: the immediate parent's `dependencies` is already the fully inherited set
	// from the rest of its own chain (its own `assemble_task` call already spliced its ancestors in),
	// so only this one level needs re-applying here, at whatever version the version-selection table
	// now says wins.
	if let Some(parent_pom) = parent.as_ref() {
		for inherited in &parent_pom.dependencies {
			let coordinate = Coordinate::new(inherited.target.group.clone(), inherited.target.artifact.clone());
			let selected = resolver.version_table_mut().select_version(inherited.scope, &coordinate, &inherited.requested_version);
			let final_version = selected.resolve().to_owned();

			if final_version == inherited.target.version {
				dependencies.push(inherited.clone());
				continue;
			}

			let spliced = resolve_conflict_corrected(resolver, &partial.repositories, &coordinate, &final_version, inherited).await;
			dependencies.push(spliced);
		}
	}

	let snapshot_version = crate::coord::to_snapshot_version(&version).into_owned();
	let resolved = ResolvedPom {
		group,
		artifact,
		version,
		snapshot_version,
		parent: parent.map(Box::new),
		dependencies,
		dependency_management: partial.dependency_management,
		licenses: partial.licenses,
		repositories: partial.repositories,
		properties: partial.properties,
	};

	path.pop();
	resolver.resolved_memo_mut().insert(key, Some(resolved.clone()));
	Ok(Some(resolved))
}

/// Re-resolves a single ancestor dependency at the version the version-selection table now
/// prefers. Falls back to the ancestor's original dependency, unchanged, if the corrected
/// coordinate can't be downloaded or assembled — inherited dependencies are never dropped.
async fn resolve_conflict_corrected<D: Downloader>(
	resolver: &mut Resolver<'_, D>,
	repositories: &[crate::repository::Repository],
	coordinate: &Coordinate,
	final_version: &str,
	original: &Dependency,
) -> Dependency {
	let corrected_coord = crate::coord::MavenCoord {
		group: coordinate.group.clone(),
		artifact: coordinate.artifact.clone(),
		version: final_version.to_owned(),
		classifier: original.classifier.clone(),
		type_: "jar".to_owned(),
	};

	let attempt: Result<Option<Dependency>> = async move {
		let Some(raw_pom) = resolver.get_or_download_pom(repositories, &corrected_coord).await.context("downloading conflict-corrected pom")? else {
			return Ok(None);
		};
		let resolved = resolver.resolve_nested(raw_pom, repositories.to_vec(), Vec::new()).await
			.map_err(|e| anyhow::anyhow!(e)).context("assembling conflict-corrected pom")?;
		Ok(resolved.map(|target| Dependency {
			scope: original.scope,
			classifier: original.classifier.clone(),
			optional: original.optional,
			target,
			requested_version: original.requested_version.clone(),
			exclusion_patterns: original.exclusion_patterns.clone(),
		}))
	}.await;

	match attempt {
		Ok(Some(dependency)) => dependency,
		Ok(None) => {
			debug!("conflict-corrected {corrected_coord} unavailable, keeping inherited {}", original.target.version);
			original.clone()
		}
		Err(e) => {
			warn!("failed to splice conflict-corrected dependency {corrected_coord}: {e:#}");
			original.clone()
		}
	}
}
