use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use anyhow::{Context, Result};
use bytes::Bytes;
use log::debug;
use moka::sync::Cache;

const MEMORY_TIME_TO_LIVE: Duration = Duration::from_secs(600);

/// The key a cached artifact or versions-list is stored under.
///
/// Serialized as length-prefixed UTF-8 strings in the order (group, artifact, classifier,
/// extension, version), matching §6 of the design notes. Unlike the source format, field lengths
/// are 32-bit, not 16-bit: a 16-bit length caps a payload at 65 535 bytes, too small for many real
/// poms and jars (see the open questions in the design notes). The versions-list entry *count*
/// prefix is kept at 16-bit, since a coordinate with more than 65 535 published versions doesn't
/// occur in practice and there's no reason to diverge there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
	pub group: String,
	pub artifact: String,
	pub classifier: Option<String>,
	pub extension: String,
	pub version: String,
}

impl CacheKey {
	fn write_field(buf: &mut Vec<u8>, s: &str) {
		buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
		buf.extend_from_slice(s.as_bytes());
	}

	fn to_bytes(&self) -> Vec<u8> {
		let mut buf = Vec::new();
		CacheKey::write_field(&mut buf, &self.group);
		CacheKey::write_field(&mut buf, &self.artifact);
		CacheKey::write_field(&mut buf, self.classifier.as_deref().unwrap_or(""));
		CacheKey::write_field(&mut buf, &self.extension);
		CacheKey::write_field(&mut buf, &self.version);
		buf
	}
}

fn encode_versions(versions: &[String]) -> Vec<u8> {
	let mut buf = Vec::new();
	buf.extend_from_slice(&(versions.len() as u16).to_be_bytes());
	for version in versions {
		buf.extend_from_slice(&(version.len() as u32).to_be_bytes());
		buf.extend_from_slice(version.as_bytes());
	}
	buf
}

fn decode_versions(bytes: &[u8]) -> Result<Vec<String>> {
	let count_bytes: [u8; 2] = bytes.get(0..2).context("truncated versions count")?.try_into()?;
	let count = u16::from_be_bytes(count_bytes) as usize;

	let mut offset = 2;
	let mut versions = Vec::with_capacity(count);
	for _ in 0..count {
		let len_bytes: [u8; 4] = bytes.get(offset..offset + 4).context("truncated version length")?.try_into()?;
		let len = u32::from_be_bytes(len_bytes) as usize;
		offset += 4;

		let slice = bytes.get(offset..offset + len).context("truncated version bytes")?;
		versions.push(std::str::from_utf8(slice).context("version is not valid utf-8")?.to_owned());
		offset += len;
	}
	Ok(versions)
}

/// One sled database per distinct workspace filesystem path, shared process-wide.
///
/// Opening the same path twice (e.g. two independent resolver invocations against the same
/// workspace on different threads) must reuse the same handle, since sled refuses a second
/// concurrent open of the same path. See §5 of the design notes ("Resource acquisition").
static DB_REGISTRY: OnceLock<Mutex<HashMap<PathBuf, sled::Db>>> = OnceLock::new();

fn open_db(workspace: &Path) -> Result<sled::Db> {
	let registry = DB_REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
	let mut guard = registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

	if let Some(db) = guard.get(workspace) {
		return Ok(db.clone());
	}

	let db = sled::open(workspace).with_context(|| format!("opening sled db at {workspace:?}"))?;
	guard.insert(workspace.to_path_buf(), db.clone());
	Ok(db)
}

/// A two-tier cache in front of a [crate::downloader::Downloader]: a bounded in-memory tier keyed
/// by [CacheKey], backed by an unbounded, append-only disk tier. Negative results (the downloader
/// found nothing) are never stored here; see the per-resolve `resolved` memo in
/// [crate::driver::Resolver] for that.
///
/// This is an optional convenience the resolver core does not depend on: callers are free to wrap
/// their own `Downloader` impl with a `CacheFacade` in front, or not use one at all.
pub struct CacheFacade {
	memory: Cache<CacheKey, Bytes>,
	artifacts: sled::Tree,
	versions: sled::Tree,
}

impl CacheFacade {
	/// Opens (or reuses) the disk-backed store for `workspace` and builds the memory tier on top.
	pub fn open(workspace: &Path) -> Result<CacheFacade> {
		let db = open_db(workspace)?;
		let artifacts = db.open_tree("workspace.artifacts").context("opening workspace.artifacts tree")?;
		let versions = db.open_tree("workspace.disk").context("opening workspace.disk tree")?;
		let memory = Cache::builder().time_to_live(MEMORY_TIME_TO_LIVE).build();

		Ok(CacheFacade { memory, artifacts, versions })
	}

	pub fn lookup(&self, key: &CacheKey) -> Result<Option<Bytes>> {
		if let Some(bytes) = self.memory.get(key) {
			return Ok(Some(bytes));
		}

		let raw_key = key.to_bytes();
		match self.artifacts.get(raw_key).context("reading artifact from disk tier")? {
			Some(ivec) => {
				let bytes = Bytes::from(ivec.to_vec());
				self.memory.insert(key.clone(), bytes.clone());
				Ok(Some(bytes))
			}
			None => Ok(None),
		}
	}

	pub fn store(&self, key: &CacheKey, bytes: Bytes) -> Result<()> {
		self.memory.insert(key.clone(), bytes.clone());

		let raw_key = key.to_bytes();
		self.artifacts.insert(raw_key, bytes.to_vec()).context("writing artifact to disk tier")?;
		self.artifacts.flush().context("flushing artifacts tree")?;

		self.emit_size_gauges();
		Ok(())
	}

	pub fn lookup_versions(&self, key: &CacheKey) -> Result<Option<Vec<String>>> {
		let raw_key = key.to_bytes();
		match self.versions.get(raw_key).context("reading versions list from disk tier")? {
			Some(ivec) => decode_versions(&ivec).map(Some),
			None => Ok(None),
		}
	}

	pub fn store_versions(&self, key: &CacheKey, versions: &[String]) -> Result<()> {
		let raw_key = key.to_bytes();
		self.versions.insert(raw_key, encode_versions(versions)).context("writing versions list to disk tier")?;
		self.versions.flush().context("flushing versions tree")?;

		self.emit_size_gauges();
		Ok(())
	}

	fn emit_size_gauges(&self) {
		debug!(
			"cache sizes: memory={} disk.artifacts={} disk.versions={}",
			self.memory.entry_count(),
			self.artifacts.len(),
			self.versions.len(),
		);
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use bytes::Bytes;
	use super::{CacheFacade, CacheKey};

	fn key(version: &str) -> CacheKey {
		CacheKey { group: "com.example".to_owned(), artifact: "a".to_owned(), classifier: None, extension: "jar".to_owned(), version: version.to_owned() }
	}

	#[test]
	fn stores_and_looks_up_artifact_bytes() {
		let dir = tempfile::tempdir().unwrap();
		let cache = CacheFacade::open(dir.path()).unwrap();

		let k = key("1.0");
		assert!(cache.lookup(&k).unwrap().is_none());

		cache.store(&k, Bytes::from_static(b"hello")).unwrap();
		assert_eq!(cache.lookup(&k).unwrap(), Some(Bytes::from_static(b"hello")));
	}

	#[test]
	fn stores_and_looks_up_versions() {
		let dir = tempfile::tempdir().unwrap();
		let cache = CacheFacade::open(dir.path()).unwrap();

		let k = key("1.0");
		assert!(cache.lookup_versions(&k).unwrap().is_none());

		let versions = vec!["1.0".to_owned(), "1.1".to_owned(), "2.0".to_owned()];
		cache.store_versions(&k, &versions).unwrap();
		assert_eq!(cache.lookup_versions(&k).unwrap(), Some(versions));
	}

	#[test]
	fn reopening_the_same_workspace_path_shares_disk_state() {
		let dir = tempfile::tempdir().unwrap();
		let first = CacheFacade::open(dir.path()).unwrap();
		first.store(&key("1.0"), Bytes::from_static(b"payload")).unwrap();

		let second = CacheFacade::open(dir.path()).unwrap();
		assert_eq!(second.lookup(&key("1.0")).unwrap(), Some(Bytes::from_static(b"payload")));
	}
}
