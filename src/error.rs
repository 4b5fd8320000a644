use thiserror::Error;

/// The public error type returned at the boundary of [crate::driver::Resolver::resolve].
///
/// Internally, individual stages of the worker and assembler use `anyhow::Result` with
/// `.context(...)` chains (matching the teacher's style throughout this crate); a failure is
/// converted to one of these kinds only once it crosses into `onError` or the top-level return.
#[derive(Debug, Error)]
pub enum ResolveError {
	/// Malformed POM content, a malformed repository URL, or a property placeholder that is still
	/// unresolved at a use site requiring a concrete value.
	#[error("failed to parse {context}: {source}")]
	ParseError {
		context: String,
		#[source]
		source: anyhow::Error,
	},

	/// The downloader returned no artifact for a coordinate that some dependency or parent
	/// declaration required.
	#[error("missing artifact {coordinate} (declared in {declaring_pom})")]
	MissingArtifact {
		coordinate: String,
		declaring_pom: String,
	},

	/// A `dependencyManagement` entry declares no version and none could be inherited.
	#[error("managed dependency {coordinate} has no version")]
	ManagedDependencyMissingVersion {
		coordinate: String,
	},

	/// A parent GAV was already on the current resolution path.
	#[error("parent cycle: {}", chain.join(" -> "))]
	ParentCycle {
		chain: Vec<String>,
	},

	/// Propagated I/O failure from the downloader, attached to the coordinate being fetched.
	#[error("downloader failed for {coordinate}: {source}")]
	DownloaderIo {
		coordinate: String,
		#[source]
		source: anyhow::Error,
	},
}
