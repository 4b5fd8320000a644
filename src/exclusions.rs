use log::warn;
use regex::Regex;
use crate::raw_pom::RawExclusions;

/// A single compiled `group:artifact` exclusion pattern.
///
/// `*` in either half is a wildcard matching any sequence of characters (mapped to `.*`). A
/// pattern that fails to compile (e.g. contains other unescaped regex metacharacters that happen
/// to be invalid) is dropped at construction time rather than erroring the whole resolve — see
/// [crate::error::ResolveError] kind `InvalidExclusionPattern` in the design notes.
#[derive(Debug, Clone)]
pub(crate) struct CompiledExclusion {
	group: Regex,
	artifact: Regex,
}

fn glob_to_regex(pattern: &str) -> Option<Regex> {
	let escaped = regex::escape(pattern).replace(r"\*", ".*");
	let anchored = format!("^{escaped}$");
	match Regex::new(&anchored) {
		Ok(re) => Some(re),
		Err(e) => {
			warn!("invalid exclusion pattern {pattern:?}, ignoring: {e}");
			None
		}
	}
}

/// The exclusions accumulated along the path from the root task down to (and including) the
/// current one. Exclusions are never removed once inherited: a dependency declared anywhere on
/// the path may exclude a coordinate from anywhere further down the subtree.
///
/// `patterns` mirrors `compiled` as the original, uncompiled strings: [regex::Regex] has no
/// [PartialEq]/[Hash] impl, but [crate::task::ResolutionTask] needs both to use as a memoization
/// key, so equality and hashing are defined over the source patterns rather than the compiled form.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
	patterns: Vec<(String, String)>,
	compiled: Vec<CompiledExclusion>,
}

impl ExclusionSet {
	pub fn new() -> ExclusionSet {
		ExclusionSet::default()
	}

	/// Builds a new set that also includes the exclusions declared on one dependency edge.
	pub(crate) fn extended_with(&self, raw: Option<&RawExclusions>) -> ExclusionSet {
		let mut patterns = self.patterns.clone();
		let mut compiled = self.compiled.clone();

		if let Some(raw) = raw {
			for exclusion in &raw.exclusion {
				if let (Some(group), Some(artifact)) = (glob_to_regex(&exclusion.group_id), glob_to_regex(&exclusion.artifact_id)) {
					patterns.push((exclusion.group_id.clone(), exclusion.artifact_id.clone()));
					compiled.push(CompiledExclusion { group, artifact });
				}
				// else: one half failed to compile, skip this exclusion entirely
			}
		}

		ExclusionSet { patterns, compiled }
	}

	/// Whether a (group, artifact) pair is excluded by any pattern accumulated so far.
	pub fn matches(&self, group: &str, artifact: &str) -> bool {
		self.compiled.iter().any(|e| e.group.is_match(group) && e.artifact.is_match(artifact))
	}

	pub fn is_empty(&self) -> bool {
		self.compiled.is_empty()
	}

	/// The original, uncompiled `(group, artifact)` glob pairs, in accumulation order.
	pub fn patterns(&self) -> &[(String, String)] {
		&self.patterns
	}
}

impl PartialEq for ExclusionSet {
	fn eq(&self, other: &Self) -> bool {
		self.patterns == other.patterns
	}
}

impl Eq for ExclusionSet {}

impl std::hash::Hash for ExclusionSet {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.patterns.hash(state);
	}
}
