use std::collections::{BTreeMap, HashMap};
use crate::coord::Coordinate;
use crate::scope::Scope;

/// One coordinate's selected version, as recorded at a particular scope.
///
/// `nearer` points at the selection made at an equal-or-broader scope higher in the tree, if one
/// existed at the time this entry was created. [RequestedVersion::resolve] always prefers it: the
/// BFS visits the tree in nearest-first order, so whichever entry was created first for a given
/// (scope, coordinate) pair is definitionally the nearest declaration, and every later call for
/// the same key returns that first entry unchanged (see [VersionSelectionTable::select_version]).
#[derive(Debug, Clone)]
pub struct RequestedVersion {
	pub coordinate: Coordinate,
	nearer: Option<Box<RequestedVersion>>,
	version: String,
}

impl RequestedVersion {
	/// The concrete version string this entry resolves to.
	///
	/// A version range expression (anything starting with `[` or `(`, per the Maven range
	/// grammar) is not expanded here; this implementation does not resolve ranges against
	/// `maven-metadata.xml` and instead treats the range literal as a hard version, as permitted
	/// by §4.4 of the design notes for downloaders that don't support range listing.
	pub fn resolve(&self) -> &str {
		match &self.nearer {
			Some(nearer) => nearer.resolve(),
			None => &self.version,
		}
	}

	pub fn is_range(&self) -> bool {
		let v = self.version.trim();
		v.starts_with('[') || v.starts_with('(')
	}
}

/// Scope-ordered mapping answering "which ancestor scope already selected a version for this
/// coordinate?" (Maven's "nearer wins" rule).
///
/// Keyed by [Scope] in its total order (`None < Compile < Provided < Runtime < Test < System`);
/// a lookup at scope `s` considers every scope `<= s`, in ascending order, so a selection recorded
/// at a narrower-or-equal scope always takes precedence over one recorded only at a broader scope.
#[derive(Debug, Default)]
pub struct VersionSelectionTable {
	table: BTreeMap<Scope, HashMap<Coordinate, RequestedVersion>>,
}

impl VersionSelectionTable {
	pub fn new() -> VersionSelectionTable {
		VersionSelectionTable::default()
	}

	/// Records (or looks up) the selection for `coord` at `scope`.
	///
	/// The first call for a given (scope, coordinate) pair wins: later calls with a different
	/// `version` argument are ignored and the originally recorded entry is returned, which is what
	/// implements "nearer wins" (the BFS always visits the nearer declaration first).
	pub fn select_version(&mut self, scope: Scope, coord: &Coordinate, version: &str) -> RequestedVersion {
		let nearer = self.table.range(..=scope)
			.find_map(|(_, by_coord)| by_coord.get(coord))
			.cloned();

		self.table.entry(scope)
			.or_default()
			.entry(coord.clone())
			.or_insert_with(|| RequestedVersion { coordinate: coord.clone(), nearer: nearer.map(Box::new), version: version.to_owned() })
			.clone()
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::coord::Coordinate;
	use crate::scope::Scope;
	use super::VersionSelectionTable;

	#[test]
	fn first_selection_at_a_scope_is_recorded_verbatim() {
		let mut table = VersionSelectionTable::new();
		let coord = Coordinate::new("com.example", "a");
		let selected = table.select_version(Scope::Compile, &coord, "1.0");
		assert_eq!(selected.resolve(), "1.0");
	}

	#[test]
	fn same_scope_second_call_keeps_first_version() {
		let mut table = VersionSelectionTable::new();
		let coord = Coordinate::new("com.example", "a");
		table.select_version(Scope::Compile, &coord, "1.0");
		let second = table.select_version(Scope::Compile, &coord, "2.0");
		assert_eq!(second.resolve(), "1.0");
	}

	#[test]
	fn broader_scope_selection_wins_over_later_narrower_one() {
		let mut table = VersionSelectionTable::new();
		let coord = Coordinate::new("com.example", "a");
		table.select_version(Scope::Compile, &coord, "1.0");
		let nested = table.select_version(Scope::Test, &coord, "9.0");
		assert_eq!(nested.resolve(), "1.0");
	}

	#[test]
	fn unrelated_coordinates_do_not_interfere() {
		let mut table = VersionSelectionTable::new();
		let a = Coordinate::new("com.example", "a");
		let b = Coordinate::new("com.example", "b");
		table.select_version(Scope::Compile, &a, "1.0");
		let selected_b = table.select_version(Scope::Compile, &b, "2.0");
		assert_eq!(selected_b.resolve(), "2.0");
	}

	#[test]
	fn range_literal_is_detected() {
		let mut table = VersionSelectionTable::new();
		let coord = Coordinate::new("com.example", "a");
		let selected = table.select_version(Scope::Compile, &coord, "[1.0,2.0)");
		assert!(selected.is_range());
		assert_eq!(selected.resolve(), "[1.0,2.0)");
	}
}
