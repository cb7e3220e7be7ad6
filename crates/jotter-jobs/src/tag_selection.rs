//! Choosing which model-suggested tags get attached to a note.
//!
//! Candidates are normalized and validated, then ordered so that tags the
//! user already has come before new vocabulary. This keeps a user's tag
//! namespace from fragmenting into near-duplicates.

use std::collections::HashSet;

/// A tag name accepted by the pipeline: one or more of `[a-z0-9]`.
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

fn lowered_set<I>(names: I) -> HashSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_lowercase())
        .collect()
}

/// Select up to `max_new` tags from model candidates.
///
/// 1. Lowercase and trim every candidate.
/// 2. Drop empty, invalid, or already-on-note candidates (and repeats).
/// 3. Split into catalog matches ("preferred") and the rest ("novel"),
///    each keeping the model's order.
/// 4. Return preferred then novel, truncated to `max_new`.
pub fn select_tags<C, E, N>(
    candidates: C,
    existing_user_tags: E,
    tags_on_note: N,
    max_new: usize,
) -> Vec<String>
where
    C: IntoIterator,
    C::Item: AsRef<str>,
    E: IntoIterator,
    E::Item: AsRef<str>,
    N: IntoIterator,
    N::Item: AsRef<str>,
{
    if max_new == 0 {
        return Vec::new();
    }

    let catalog = lowered_set(existing_user_tags);
    let on_note = lowered_set(tags_on_note);

    let mut seen = HashSet::new();
    let mut preferred = Vec::new();
    let mut novel = Vec::new();

    for candidate in candidates {
        let tag = candidate.as_ref().trim().to_lowercase();
        if !is_valid_tag(&tag) || on_note.contains(&tag) || !seen.insert(tag.clone()) {
            continue;
        }
        if catalog.contains(&tag) {
            preferred.push(tag);
        } else {
            novel.push(tag);
        }
    }

    preferred.extend(novel);
    preferred.truncate(max_new);
    preferred
}
