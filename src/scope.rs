use std::fmt::{Display, Formatter};
use std::str::FromStr;
use anyhow::{bail, Error};
use serde::{Deserialize, Serialize};

/// A scope for a dependency.
///
/// The ordering is load-bearing: it is used as the key of the [version selection
/// table](crate::version_table::VersionSelectionTable), where a "head map" query relies on `None`
/// being the broadest scope and `System` the narrowest. Note: this type supports round trips with
/// [Display] and [FromStr].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Scope {
	/// Sentinel used only for the root task of a resolve: a dependency's own declared scope is never
	/// rewritten against a `None` task scope, it is kept as-is. Never appears as the effective scope of
	/// a resolved dependency in the output.
	#[default]
	None,
	#[serde(rename = "compile")]
	Compile,
	#[serde(rename = "provided")]
	Provided,
	#[serde(rename = "runtime")]
	Runtime,
	#[serde(rename = "test")]
	Test,
	#[serde(rename = "system")]
	System,
}

impl Display for Scope {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(match self {
			Scope::None => "none",
			Scope::Compile => "compile",
			Scope::Provided => "provided",
			Scope::Runtime => "runtime",
			Scope::Test => "test",
			Scope::System => "system",
		}, f)
	}
}

impl FromStr for Scope {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"none" => Scope::None,
			"compile" => Scope::Compile,
			"provided" => Scope::Provided,
			"runtime" => Scope::Runtime,
			"test" => Scope::Test,
			"system" => Scope::System,
			scope => bail!("unknown scope {scope:?}, scope is one of \"compile\", \"provided\", \"runtime\", \"test\" and \"system\""),
		})
	}
}

impl Scope {
	/// Implements Maven's scope-in-subtree rules, see
	/// <https://maven.apache.org/guides/introduction/introduction-to-dependency-mechanism.html#dependency-scope>.
	///
	/// `self` is the scope this dependency was declared with in its own pom; `task_scope` is the
	/// scope of the [task](crate::task::ResolutionTask) that is currently being processed, i.e. the
	/// scope the including artifact is itself being pulled in with.
	///
	/// At the root of a resolve, `task_scope` is [Scope::None]: a project's own direct dependencies
	/// are never pruned or rewritten by this table, they keep the scope they were declared with.
	/// One level down (and below), the table applies: `compile` and `runtime` dependencies are
	/// carried forward (narrowed to the including scope), while `provided`, `test` and `system`
	/// dependencies are never transitive and this returns `None`.
	pub fn transitive_of(self, task_scope: Scope) -> Option<Scope> {
		if task_scope == Scope::None {
			return Some(self);
		}

		match self {
			Scope::None => Some(task_scope),
			Scope::Compile => Some(task_scope),
			Scope::Runtime => Some(match task_scope {
				Scope::Compile => Scope::Runtime,
				other => other,
			}),
			Scope::Provided | Scope::Test | Scope::System => None,
		}
	}
}

/// A copy of [Scope], but with [ManagementScope::Import].
///
/// Only meaningful inside `<dependencyManagement>`: a `pom` typed entry with `scope=import` pulls in
/// another pom's managed dependencies rather than becoming a managed dependency itself.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub enum ManagementScope {
	#[default]
	#[serde(rename = "compile")]
	Compile,
	#[serde(rename = "provided")]
	Provided,
	#[serde(rename = "runtime")]
	Runtime,
	#[serde(rename = "test")]
	Test,
	#[serde(rename = "system")]
	System,

	/// Only valid on dependencies of type `pom` in a `dependencyManagement` block.
	#[serde(rename = "import")]
	Import,
}

impl ManagementScope {
	/// Returns `None` for [ManagementScope::Import].
	pub fn into_scope(self) -> Option<Scope> {
		match self {
			ManagementScope::Compile => Some(Scope::Compile),
			ManagementScope::Provided => Some(Scope::Provided),
			ManagementScope::Runtime => Some(Scope::Runtime),
			ManagementScope::Test => Some(Scope::Test),
			ManagementScope::System => Some(Scope::System),
			ManagementScope::Import => None,
		}
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use super::Scope;

	#[test]
	fn ordering_is_none_first_system_last() {
		assert!(Scope::None < Scope::Compile);
		assert!(Scope::Compile < Scope::Provided);
		assert!(Scope::Provided < Scope::Runtime);
		assert!(Scope::Runtime < Scope::Test);
		assert!(Scope::Test < Scope::System);
	}

	#[test]
	fn root_level_keeps_declared_scope() {
		for declared in [Scope::Compile, Scope::Provided, Scope::Runtime, Scope::Test, Scope::System] {
			assert_eq!(declared.transitive_of(Scope::None), Some(declared));
		}
	}

	#[test]
	fn compile_in_compile_is_compile() {
		assert_eq!(Scope::Compile.transitive_of(Scope::Compile), Some(Scope::Compile));
	}

	#[test]
	fn compile_in_test_is_test() {
		assert_eq!(Scope::Compile.transitive_of(Scope::Test), Some(Scope::Test));
	}

	#[test]
	fn runtime_in_compile_is_runtime() {
		assert_eq!(Scope::Runtime.transitive_of(Scope::Compile), Some(Scope::Runtime));
	}

	#[test]
	fn test_in_anything_is_pruned() {
		for task_scope in [Scope::Compile, Scope::Provided, Scope::Runtime, Scope::Test, Scope::System] {
			assert_eq!(Scope::Test.transitive_of(task_scope), None);
		}
	}

	#[test]
	fn provided_beyond_root_is_pruned() {
		assert_eq!(Scope::Provided.transitive_of(Scope::Compile), None);
		assert_eq!(Scope::Provided.transitive_of(Scope::None), Some(Scope::Provided));
	}
}
