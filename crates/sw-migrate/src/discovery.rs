//! Migration discovery.
//!
//! Lists a directory, parses each file name as `<version>_<description>`,
//! and returns the well-formed units ordered by version. Names that do not
//! parse are skipped with a warning; gaps and duplicates are left for
//! [`crate::validate_ordering`] to reject.

use crate::error::{MigrationError, MigrationResult};
use crate::unit::{MigrationUnit, ScriptSource};
use std::num::IntErrorKind;
use std::path::Path;

/// Separator between the numeric prefix and the description.
pub const SEPARATOR: char = '_';

/// Parse the ordinal version from a migration file name.
///
/// Returns 0 when the name has no separator or the prefix is not a
/// positive integer. A prefix of digits too large for `u64` also yields 0
/// and is reported separately.
pub fn parse_migration_version(name: &str) -> u64 {
    let Some((prefix, _)) = name.split_once(SEPARATOR) else {
        return 0;
    };
    match prefix.parse::<u64>() {
        Ok(version) => version,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
            log::warn!("Migration version out of range: {name}");
            0
        }
        Err(_) => 0,
    }
}

/// List `dir` and return its migration units ordered by version.
pub fn discover(dir: &Path) -> MigrationResult<Vec<MigrationUnit>> {
    let discovery_err = |source| MigrationError::Discovery {
        path: dir.display().to_string(),
        source,
    };

    let mut listing = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(discovery_err)? {
        let path = entry.map_err(discovery_err)?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            log::warn!("Skipping migration with non UTF-8 name: {}", path.display());
            continue;
        };
        if !path.is_file() {
            log::warn!("Skipping non-file migration entry: {name}");
            continue;
        }
        listing.push((name, ScriptSource::File(path)));
    }

    log::debug!("Found {} entries in {}", listing.len(), dir.display());
    Ok(collect_units(listing))
}

/// Turn a raw `(name, source)` listing into units ordered by version.
///
/// Units with equal versions stay adjacent, ordered by name, so duplicates
/// are reported deterministically.
pub fn collect_units<I>(listing: I) -> Vec<MigrationUnit>
where
    I: IntoIterator<Item = (String, ScriptSource)>,
{
    let mut units: Vec<MigrationUnit> = listing
        .into_iter()
        .filter_map(|(name, source)| {
            let version = parse_migration_version(&name);
            if version == 0 {
                log::warn!("Invalid migration filename: {name}");
                return None;
            }
            Some(MigrationUnit::new(version, name, source))
        })
        .collect();

    units.sort_by(|a, b| {
        a.version()
            .cmp(&b.version())
            .then_with(|| a.name().cmp(b.name()))
    });
    units
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
