use std::future::Future;
use anyhow::Result;
use crate::raw_pom::RawPom;

/// The contract the resolver calls to obtain raw poms and artifact bytes.
///
/// Implementations own all network I/O, HTTP/HTTPS fallback, mirror selection and authentication;
/// the resolver only ever calls through this trait. Implementations must be idempotent: calling a
/// method twice with the same url must either both succeed with equal results, or both fail/return
/// `None` (modulo transient I/O flakiness, which is the implementation's concern to retry).
///
/// A two-tier cache in front of an implementation of this trait is provided by
/// [crate::cache::CacheFacade]; it is not required, and the resolver does not know about it.
pub trait Downloader {
	/// Downloads and parses the pom at the given, already-built, url. Returns `Ok(None)` if no
	/// repository has a pom at this location.
	// note: can't rewrite with async, bc of `+ Send`
	#[allow(clippy::manual_async_fn)]
	fn download_pom_at(&self, url: &str) -> impl Future<Output = Result<Option<RawPom>>> + Send;

	/// Downloads the raw artifact bytes at the given, already-built, url. Returns `Ok(None)` if no
	/// repository has an artifact at this location.
	#[allow(clippy::manual_async_fn)]
	fn download_bytes_at(&self, url: &str) -> impl Future<Output = Result<Option<bytes::Bytes>>> + Send;

	/// Lists the versions published for a coordinate, read from `maven-metadata.xml`. Used only for
	/// resolving version-range requests (see [crate::version_table::RequestedVersion]); an
	/// implementation that does not support ranges may return an empty list, in which case range
	/// literals are treated as hard versions (see §4.4 of the design notes).
	#[allow(clippy::manual_async_fn)]
	fn find_versions(&self, url: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

#[cfg(test)]
pub(crate) mod testing {
	use std::collections::HashMap;
	use std::future::Future;
	use anyhow::{Context, Result};
	use crate::downloader::Downloader;
	use crate::raw_pom::RawPom;

	impl Downloader for HashMap<&'static str, RawPom> {
		#[allow(clippy::manual_async_fn)]
		fn download_pom_at(&self, url: &str) -> impl Future<Output = Result<Option<RawPom>>> + Send {
			async { Ok(self.get(url).cloned()) }
		}

		#[allow(clippy::manual_async_fn)]
		fn download_bytes_at(&self, _url: &str) -> impl Future<Output = Result<Option<bytes::Bytes>>> + Send {
			async { Ok(None) }
		}

		#[allow(clippy::manual_async_fn)]
		fn find_versions(&self, _url: &str) -> impl Future<Output = Result<Vec<String>>> + Send {
			async { Ok(vec![]) }
		}
	}

	impl Downloader for HashMap<&'static str, &'static str> {
		#[allow(clippy::manual_async_fn)]
		fn download_pom_at(&self, url: &str) -> impl Future<Output = Result<Option<RawPom>>> + Send {
			async { self.get(url).map(|xml| serde_xml_rs::from_str(xml).context("maven pom")).transpose() }
		}

		#[allow(clippy::manual_async_fn)]
		fn download_bytes_at(&self, _url: &str) -> impl Future<Output = Result<Option<bytes::Bytes>>> + Send {
			async { Ok(None) }
		}

		#[allow(clippy::manual_async_fn)]
		fn find_versions(&self, _url: &str) -> impl Future<Output = Result<Vec<String>>> + Send {
			async { Ok(vec![]) }
		}
	}
}
