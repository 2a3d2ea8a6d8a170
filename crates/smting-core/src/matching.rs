use std::collections::BTreeSet;

use smting_types::models::{Profile, Tendency};

/// Compatibility of two role orientations, 0..=50. Complementary roles score
/// highest; a switch fits anyone reasonably; matching roles score lowest.
pub fn tendency_score(a: Tendency, b: Tendency) -> u32 {
    use Tendency::*;

    match (a, b) {
        (Dominant, Submissive) | (Submissive, Dominant) => 50,
        (Switch, _) | (_, Switch) => 35,
        (a, b) if a == b => 15,
        _ => 25,
    }
}

/// Jaccard overlap of the two tag sets scaled to 0..=50, rounded half up.
/// Returns the score and the number of shared tags.
pub fn tag_score(a: &BTreeSet<String>, b: &BTreeSet<String>) -> (u32, usize) {
    let shared = a.intersection(b).count();
    let universe = a.len() + b.len() - shared;
    if universe == 0 {
        return (0, 0);
    }
    let score = (shared * 100 + universe) / (universe * 2);
    (score as u32, shared)
}

fn shared_bonus(shared: usize) -> u32 {
    match shared {
        0 | 1 => 0,
        2 => 5,
        _ => 10,
    }
}

/// Match rate in percent between two users.
pub fn match_rate(
    tendency_a: Tendency,
    tendency_b: Tendency,
    tags_a: &BTreeSet<String>,
    tags_b: &BTreeSet<String>,
) -> u8 {
    let (tags, shared) = tag_score(tags_a, tags_b);
    let total = tendency_score(tendency_a, tendency_b) + tags + shared_bonus(shared);
    total.min(100) as u8
}

pub fn profile_match_rate(a: &Profile, b: &Profile) -> u8 {
    match_rate(a.tendency, b.tendency, &a.interest_tags, &b.interest_tags)
}
