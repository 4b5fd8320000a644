use std::collections::HashMap;

/// Builds the well-known `project.*`/`pom.*` placeholders derived from a pom's own coordinate and
/// (if any) its parent's, which are always available regardless of what the pom's `<properties>`
/// block declares.
pub(crate) fn well_known_properties(
	group_id: &str,
	artifact_id: &str,
	version: &str,
	parent: Option<(&str, &str, &str)>,
) -> HashMap<String, String> {
	let mut map = HashMap::new();

	for prefix in ["project", "pom"] {
		map.insert(format!("{prefix}.groupId"), group_id.to_owned());
		map.insert(format!("{prefix}.artifactId"), artifact_id.to_owned());
		map.insert(format!("{prefix}.version"), version.to_owned());
	}

	if let Some((parent_group, parent_artifact, parent_version)) = parent {
		map.insert("project.parent.groupId".to_owned(), parent_group.to_owned());
		map.insert("project.parent.artifactId".to_owned(), parent_artifact.to_owned());
		map.insert("project.parent.version".to_owned(), parent_version.to_owned());
	}

	map
}

/// Resolves `${...}` placeholders in pom string fields (versions, repository urls, ...).
///
/// Lookup order for a placeholder's name, first match wins:
/// 1. The well-known `project.*`/`pom.*` identity properties of the active pom (and its parent).
/// 2. The active pom's own `<properties>` entries, then (if this evaluator was built for a merged
///    dependencyManagement entry) any properties carried in from the BOM that declared it.
/// 3. The properties of each ancestor in the parent chain, nearest first.
/// 4. The process environment (`env.FOO` maps to the `FOO` environment variable), since Maven
///    exposes `${env.*}` this way; looked up lazily, never cached.
///
/// Expansion is a bounded fixed-point: a property value may itself contain a placeholder (for
/// example `<revision>${parent.revision}-SNAPSHOT</revision>`), so substitution is repeated until
/// nothing changes or 3 passes have run, whichever comes first. A placeholder still unresolved
/// after that point is left in the output verbatim; it is not an error here; it only becomes one
/// if whatever consumes the resolved string requires a concrete value (e.g. a dependency version).
pub struct PropertyEvaluator {
	well_known: HashMap<String, String>,
	layers: Vec<HashMap<String, String>>,
}

impl PropertyEvaluator {
	pub fn new(well_known: HashMap<String, String>) -> PropertyEvaluator {
		PropertyEvaluator { well_known, layers: Vec::new() }
	}

	/// Adds a property layer, checked after all layers added so far (so call this nearest-pom properties
	/// first, then BOM properties, then each ancestor's properties in nearest-to-furthest order).
	pub fn push_layer(&mut self, layer: HashMap<String, String>) {
		self.layers.push(layer);
	}

	fn lookup(&self, key: &str) -> Option<String> {
		if let Some(v) = self.well_known.get(key) {
			return Some(v.clone());
		}
		for layer in &self.layers {
			if let Some(v) = layer.get(key) {
				return Some(v.clone());
			}
		}
		if let Some(env_key) = key.strip_prefix("env.") {
			if let Ok(v) = std::env::var(env_key) {
				return Some(v);
			}
		}
		None
	}

	/// Expands all `${...}` placeholders in `input`, see the type-level docs for the lookup order
	/// and the fixed-point bound.
	pub fn resolve(&self, input: &str) -> String {
		let mut current = input.to_owned();
		for _ in 0..3 {
			let (next, changed) = self.substitute_once(&current);
			if !changed {
				return next;
			}
			current = next;
		}
		current
	}

	fn substitute_once(&self, input: &str) -> (String, bool) {
		let mut output = String::with_capacity(input.len());
		let mut changed = false;
		let mut rest = input;

		while let Some(start) = rest.find("${") {
			let Some(end_offset) = rest[start..].find('}') else {
				// unterminated placeholder, leave the rest as-is
				output.push_str(rest);
				rest = "";
				break;
			};
			let end = start + end_offset;
			let key = &rest[start + 2..end];

			output.push_str(&rest[..start]);
			match self.lookup(key) {
				Some(value) => {
					output.push_str(&value);
					changed = true;
				}
				None => output.push_str(&rest[start..=end]),
			}
			rest = &rest[end + 1..];
		}
		output.push_str(rest);

		(output, changed)
	}
}

#[cfg(test)]
mod testing {
	use std::collections::HashMap;
	use pretty_assertions::assert_eq;
	use super::{well_known_properties, PropertyEvaluator};

	fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	#[test]
	fn resolves_own_property() {
		let mut eval = PropertyEvaluator::new(HashMap::new());
		eval.push_layer(props(&[("my.version", "1.2.3")]));
		assert_eq!(eval.resolve("${my.version}"), "1.2.3");
	}

	#[test]
	fn resolves_well_known_project_identity() {
		let well_known = well_known_properties("com.example", "lib", "2.0.0", None);
		let eval = PropertyEvaluator::new(well_known);
		assert_eq!(eval.resolve("${project.groupId}:${project.artifactId}:${project.version}"), "com.example:lib:2.0.0");
		assert_eq!(eval.resolve("${pom.version}"), "2.0.0");
	}

	#[test]
	fn resolves_parent_identity() {
		let well_known = well_known_properties("com.example", "child", "1.0.0", Some(("com.example", "parent", "1.0.0")));
		let eval = PropertyEvaluator::new(well_known);
		assert_eq!(eval.resolve("${project.parent.artifactId}"), "parent");
	}

	#[test]
	fn indirection_through_another_property_resolves_within_bound() {
		let mut eval = PropertyEvaluator::new(HashMap::new());
		eval.push_layer(props(&[("revision", "9.9.9"), ("full.version", "${revision}-final")]));
		assert_eq!(eval.resolve("${full.version}"), "9.9.9-final");
	}

	#[test]
	fn nearer_layer_wins_over_further_ancestor() {
		let mut eval = PropertyEvaluator::new(HashMap::new());
		eval.push_layer(props(&[("shared", "child")]));
		eval.push_layer(props(&[("shared", "ancestor")]));
		assert_eq!(eval.resolve("${shared}"), "child");
	}

	#[test]
	fn unresolved_placeholder_is_left_verbatim() {
		let eval = PropertyEvaluator::new(HashMap::new());
		assert_eq!(eval.resolve("${does.not.exist}"), "${does.not.exist}");
	}

	#[test]
	fn non_placeholder_text_is_untouched() {
		let eval = PropertyEvaluator::new(HashMap::new());
		assert_eq!(eval.resolve("no placeholders here"), "no placeholders here");
	}
}
