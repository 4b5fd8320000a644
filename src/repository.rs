use anyhow::{anyhow, bail, Context, Result};
use std::future::Future;
use log::trace;
use crate::coord::MavenCoord;
use crate::downloader::Downloader;
use crate::raw_pom::RawPom;

/// Represents a maven repository a task's subtree may download from.
///
/// Unlike the teacher's `Resolver<'a>` (a `Cow`-borrowed, mostly-`'static` constant), a
/// [Repository] is always owned: the property evaluator substitutes `${…}` placeholders into
/// repository URLs per task (see [crate::properties]), so the string data is frequently freshly
/// allocated rather than borrowed from the caller's initial repository list.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
	pub name: String,
	/// The url of the maven repo.
	///
	/// Note that this may or may not end with a `/`. Care must be taken when using this value.
	pub url: String,
}

impl Repository {
	pub fn new(name: impl Into<String>, url: impl Into<String>) -> Repository {
		Repository { name: name.into(), url: url.into() }
	}
}

/// Tries the given repositories in order until one returns `Some(_)`. `Ok(None)` means every
/// repository was asked and none had it; an `Err` means a downloader call itself failed (and is
/// never retried against the remaining repositories) — callers that need to tell "not found" apart
/// from "the downloader errored" (see [crate::error::ResolveError::DownloaderIo]) rely on this
/// distinction.
pub(crate) async fn try_repositories<'a, T, F: Future<Output = Result<Option<T>>>>(
	repositories: &'a [Repository],
	url_maker: impl Fn(&Repository) -> String,
	downloader: impl Fn(String) -> F, // with HKT we'd use &str here, and we wouldn't need the .clone() below...
) -> Result<Option<(&'a Repository, T)>> {
	for repository in repositories {
		let url = url_maker(repository);

		trace!("trying repository {:?} with {url:?}", repository.name);
		if let Some(x) = downloader(url.clone()).await.with_context(|| anyhow!("failed to get artifact from {url:?}"))? {
			trace!("success");
			return Ok(Some((repository, x)));
		} else {
			// try next repository
		}
	}
	Ok(None)
}

pub(crate) async fn try_get_pom_for<'a>(downloader: &impl Downloader, repositories: &'a [Repository], coord: &MavenCoord)
		-> Result<Option<(&'a Repository, RawPom)>> {
	try_repositories(
		repositories,
		|repository| coord.make_pom_url(repository),
		|url| async move {
			downloader.download_pom_at(&url).await?
				.map(|pom| {
					if pom.model_version == "4.0.0" {
						Ok(pom)
					} else {
						bail!("expected maven pom with `model_version=4.0.0`, got {:?}", pom.model_version)
					}
				})
				.transpose()
		}
	).await
}

pub(crate) async fn try_get_artifact_bytes_for(downloader: &impl Downloader, repositories: &[Repository], coord: &MavenCoord)
		-> Result<Option<bytes::Bytes>> {
	try_repositories(
		repositories,
		|repository| coord.make_url(repository),
		|url| async move { downloader.download_bytes_at(&url).await },
	).await.map(|found| found.map(|(_, bytes)| bytes))
}

#[cfg(test)]
mod testing {
	use crate::repository::Repository;

	#[test]
	fn repository_keeps_url_verbatim() {
		// note: unlike some implementations, this type does not normalize a missing trailing slash,
		// since `make_pom_url`/`make_url` already handle both cases.
		assert_eq!(Repository::new("test", "https://maven.example.org").url, "https://maven.example.org");
		assert_eq!(Repository::new("test", "https://maven.example.org/").url, "https://maven.example.org/");
	}
}
