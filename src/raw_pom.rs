use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::coord::MavenCoord;
use crate::scope::{ManagementScope, Scope};

/// The corresponding struct to the `.pom` xml file, as produced by the (out of scope) XML parser.
///
/// See <https://maven.apache.org/xsd/maven-4.0.0.xsd> and
/// <https://github.com/apache/maven/blob/c0012c08aaad27473770fc39ab7e39026238c7e1/api/maven-api-model/src/main/mdo/maven.mdo>
/// for the specification of these fields.
///
/// `dependencies` and `properties` are assumed to already reflect profile activation: if the
/// upstream parser supports `<profiles>`, it has already merged the active ones in.
///
/// Some fields are `Option<bool>` (or similar) even though the default value is `false` (or
/// similar). This is necessary because without this we wouldn't know if a value is explicitly
/// overwritten or just the default. We couldn't distinguish between a default value of `false` and
/// an explicit overwrite of a `true` with a `false`. (In the first case we'd want the effective
/// value to be `true`, since that's inherited, and in the second case we'd want `false`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPom {
	#[serde(rename = "modelVersion")]
	pub model_version: String,
	pub parent: Option<RawParent>,

	#[serde(rename = "groupId")]
	pub group_id: Option<String>,
	#[serde(rename = "artifactId")]
	pub artifact_id: String,
	pub version: Option<String>,

	/// This doesn't get inherited.
	pub packaging: Option<String>,

	/// Active properties, already merged with any active profile's properties.
	#[serde(default)]
	pub properties: HashMap<String, String>,

	#[serde(rename = "dependencyManagement")]
	pub dependency_management: Option<RawDependencyManagement>,
	pub dependencies: Option<RawDependencies<Scope>>,

	pub repositories: Option<RawRepositories>,
	pub licenses: Option<RawLicenses>,
}

impl RawPom {
	pub(crate) fn get_parent_coord(&self) -> Option<MavenCoord> {
		self.parent.as_ref().map(|parent| MavenCoord {
			group: parent.group_id.clone(),
			artifact: parent.artifact_id.clone(),
			version: parent.version.clone(),
			classifier: None,
			type_: "pom".to_owned(),
		})
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawParent {
	#[serde(rename = "groupId")]
	pub group_id: String,
	#[serde(rename = "artifactId")]
	pub artifact_id: String,
	pub version: String,
	/// Hint for a downloader resolving parents from a multi-module checkout; not otherwise
	/// interpreted by the resolver.
	#[serde(rename = "relativePath")]
	pub relative_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDependencyManagement {
	pub dependencies: Option<RawDependencies<ManagementScope>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawDependencies<Scope> {
	pub dependency: Vec<RawDependency<Scope>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawDependency<Scope> {
	#[serde(rename = "groupId")]
	pub group_id: String,
	#[serde(rename = "artifactId")]
	pub artifact_id: String,
	/// May contain an unresolved `${…}` placeholder; may be a version range. Never inherited by
	/// this field alone, see [crate::properties].
	pub version: Option<String>,
	#[serde(rename = "type")]
	pub type_: Option<String>,
	pub classifier: Option<String>,

	pub scope: Option<Scope>,

	pub optional: Option<bool>,

	pub exclusions: Option<RawExclusions>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawExclusions {
	pub exclusion: Vec<RawExclusion>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawExclusion {
	#[serde(rename = "groupId")]
	pub group_id: String,
	#[serde(rename = "artifactId")]
	pub artifact_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRepositories {
	pub repository: Vec<RawRepository>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRepository {
	pub id: String,
	pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLicenses {
	pub license: Vec<RawLicense>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLicense {
	pub name: Option<String>,
	pub url: Option<String>,
}
