//! Display aliases for anonymous authors.
//!
//! Anonymous posts show a friendly label instead of the author's
//! pseudonym. The label is chosen deterministically from a fixed pool,
//! so an author keeps one alias across the site, while the alias itself
//! reveals nothing: many pseudonyms share each pool entry.

/// Pool of display aliases for anonymous authors.
///
/// Deliberately finite. Uniqueness lives in the pseudonym, never in
/// the alias, so collisions here are expected and harmless.
pub const ALIAS_POOL: &[&str] = &[
    "Anonymous Alpaca",
    "Anonymous Badger",
    "Anonymous Beaver",
    "Anonymous Bison",
    "Anonymous Chipmunk",
    "Anonymous Coyote",
    "Anonymous Crane",
    "Anonymous Dingo",
    "Anonymous Dolphin",
    "Anonymous Falcon",
    "Anonymous Ferret",
    "Anonymous Fox",
    "Anonymous Gazelle",
    "Anonymous Gecko",
    "Anonymous Heron",
    "Anonymous Hedgehog",
    "Anonymous Ibex",
    "Anonymous Iguana",
    "Anonymous Jackal",
    "Anonymous Jaguar",
    "Anonymous Kestrel",
    "Anonymous Koala",
    "Anonymous Lemur",
    "Anonymous Lynx",
    "Anonymous Magpie",
    "Anonymous Marmot",
    "Anonymous Meerkat",
    "Anonymous Moose",
    "Anonymous Narwhal",
    "Anonymous Ocelot",
    "Anonymous Osprey",
    "Anonymous Otter",
    "Anonymous Owl",
    "Anonymous Pelican",
    "Anonymous Penguin",
    "Anonymous Puffin",
    "Anonymous Quokka",
    "Anonymous Raccoon",
    "Anonymous Raven",
    "Anonymous Seal",
    "Anonymous Sloth",
    "Anonymous Stork",
    "Anonymous Tapir",
    "Anonymous Toucan",
    "Anonymous Walrus",
    "Anonymous Wombat",
    "Anonymous Wren",
    "Anonymous Yak",
];

/// Picks the display alias for a pseudonym.
///
/// Total and deterministic: every input maps to some pool entry, and
/// the same input always maps to the same entry.
#[must_use]
pub fn alias_for(pseudonym: &str) -> &'static str {
    let index = pseudonym
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b)));

    ALIAS_POOL[index % ALIAS_POOL.len()]
}
