use std::fmt::{Display, Formatter};

/// A canonical, closed set of licenses a pom's free-text `<license><name>` is mapped onto.
///
/// Unrecognized names map to [License::Unknown] rather than failing resolution — a pom with a
/// typo'd or house-specific license name is still a perfectly resolvable dependency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum License {
	Apache2_0,
	Mit,
	Bsd2Clause,
	Bsd3Clause,
	Gpl2_0,
	Gpl3_0,
	Lgpl2_1,
	Lgpl3_0,
	Mpl2_0,
	Epl1_0,
	Epl2_0,
	Cddl1_0,
	Isc,
	Unlicense,
	PublicDomain,
	Unknown,
}

impl Display for License {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(match self {
			License::Apache2_0 => "Apache-2.0",
			License::Mit => "MIT",
			License::Bsd2Clause => "BSD-2-Clause",
			License::Bsd3Clause => "BSD-3-Clause",
			License::Gpl2_0 => "GPL-2.0",
			License::Gpl3_0 => "GPL-3.0",
			License::Lgpl2_1 => "LGPL-2.1",
			License::Lgpl3_0 => "LGPL-3.0",
			License::Mpl2_0 => "MPL-2.0",
			License::Epl1_0 => "EPL-1.0",
			License::Epl2_0 => "EPL-2.0",
			License::Cddl1_0 => "CDDL-1.0",
			License::Isc => "ISC",
			License::Unlicense => "Unlicense",
			License::PublicDomain => "Public Domain",
			License::Unknown => "Unknown",
		}, f)
	}
}

/// Maps a raw, free-text license name (as it appears in `<license><name>`) to its canonical
/// counterpart. The matching is deliberately loose (case-insensitive substring) since real poms
/// spell the same license a dozen different ways ("Apache License, Version 2.0", "Apache 2",
/// "The Apache Software License, Version 2.0", ...).
pub fn canonicalize_license(name: &str) -> License {
	let lower = name.to_lowercase();

	let contains_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
	// loose version check: accepts "2.0", "v2.0", "v 2.0", "- v 2.0", "2", all meaning major version 2
	let has_major_version = |major: &str| {
		lower.contains(&format!("{major}.")) || lower.contains(&format!("v{major}")) || lower.contains(&format!("v {major}"))
	};

	if lower.contains("apache") {
		License::Apache2_0
	} else if contains_any(&["mit license", "the mit license", "mit "]) || lower.trim() == "mit" {
		License::Mit
	} else if contains_any(&["bsd 3", "bsd-3", "new bsd", "3-clause bsd"]) {
		License::Bsd3Clause
	} else if contains_any(&["bsd 2", "bsd-2", "simplified bsd", "freebsd"]) {
		License::Bsd2Clause
	} else if lower.contains("lesser general public license") || lower.contains("lgpl") {
		if has_major_version("3") { License::Lgpl3_0 } else { License::Lgpl2_1 }
	} else if lower.contains("gnu general public license") || (lower.contains("gpl") && !lower.contains("lgpl")) {
		if has_major_version("3") { License::Gpl3_0 } else { License::Gpl2_0 }
	} else if contains_any(&["mpl-2", "mozilla public license"]) {
		License::Mpl2_0
	} else if lower.contains("eclipse public license") || lower.contains("epl") {
		if has_major_version("1") { License::Epl1_0 } else { License::Epl2_0 }
	} else if contains_any(&["cddl"]) {
		License::Cddl1_0
	} else if contains_any(&["isc license", "the isc license"]) || lower.trim() == "isc" {
		License::Isc
	} else if contains_any(&["unlicense"]) {
		License::Unlicense
	} else if contains_any(&["public domain"]) {
		License::PublicDomain
	} else {
		License::Unknown
	}
}
