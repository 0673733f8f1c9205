//! Narrated descriptions of changes.
//!
//! Each change kind has a fixed table of phrases; one is picked with the
//! caller's random source so output is reproducible under a seeded RNG.

use crate::diff::{ChangeEntry, ChangeKind};
use rand::Rng;
use rand::seq::IndexedRandom;

const CREATED: &[&str] = &[
    "something new appeared:",
    "a new presence:",
    "came into being:",
    "emerged:",
    "arrived quietly:",
];

const MODIFIED: &[&str] = &[
    "changed:",
    "was touched:",
    "shifted:",
    "became different:",
    "transformed:",
];

const DELETED: &[&str] = &[
    "departed:",
    "is gone now:",
    "was here, then wasn't:",
    "left no trace:",
    "faded:",
];

/// Phrase table for a kind.
#[must_use]
pub const fn phrases(kind: ChangeKind) -> &'static [&'static str] {
    match kind {
        ChangeKind::Created => CREATED,
        ChangeKind::Modified => MODIFIED,
        ChangeKind::Deleted => DELETED,
    }
}

/// Pick a phrase for `kind`.
pub fn phrase<R: Rng + ?Sized>(kind: ChangeKind, rng: &mut R) -> &'static str {
    phrases(kind).choose(rng).copied().unwrap_or_else(|| kind.name())
}

/// One narrated line, e.g. `  emerged: notes.txt`.
pub fn narrate<R: Rng + ?Sized>(entry: &ChangeEntry, rng: &mut R) -> String {
    format!("  {} {}", phrase(entry.kind, rng), entry.relative_path)
}

/// One plain line, e.g. `  + notes.txt`.
#[must_use]
pub fn plain(entry: &ChangeEntry) -> String {
    format!("  {} {}", entry.kind.symbol(), entry.relative_path)
}
