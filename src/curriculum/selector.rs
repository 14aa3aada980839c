//! Batch selection
//!
//! Pure functions over a snapshot of a track's partitions. Nothing here
//! touches disk; the store applies the result.
//!
//! New words are chosen in two passes over `pending_words`:
//! 1. words in the preference pool, in pending order
//! 2. any remaining word, in pending order
//!
//! So pool words are exhausted before plain order is used, and no word is
//! chosen twice even when it would match in both passes.

use std::collections::{BTreeSet, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use super::words::{normalize_word, PreferencePool};

/// Words picked for the next batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub words: Vec<String>,
    /// Number of leading `words` that came from the preference pool
    pub from_pool: usize,
}

/// Pick up to `count` new words from `pending`.
pub fn select_batch(pending: &[String], count: usize, pool: Option<&PreferencePool>) -> Selection {
    let mut selection = Selection::default();
    if count == 0 {
        return selection;
    }

    let mut chosen: HashSet<String> = HashSet::with_capacity(count);

    if let Some(pool) = pool.filter(|p| !p.is_empty()) {
        for word in pending {
            if selection.words.len() >= count {
                break;
            }
            let Some(key) = normalize_word(word) else {
                continue;
            };
            if pool.contains(&key) && chosen.insert(key) {
                selection.words.push(word.clone());
            }
        }
        selection.from_pool = selection.words.len();
    }

    for word in pending {
        if selection.words.len() >= count {
            break;
        }
        let Some(key) = normalize_word(word) else {
            continue;
        };
        if chosen.insert(key) {
            selection.words.push(word.clone());
        }
    }

    selection
}

/// Draw up to `count` distinct learned words uniformly at random.
///
/// When fewer than `count` words are learned, all of them are returned.
pub fn sample_review<R: Rng + ?Sized>(
    learned: &BTreeSet<String>,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    if learned.len() <= count {
        return learned.iter().cloned().collect();
    }

    let candidates: Vec<&String> = learned.iter().collect();
    candidates
        .choose_multiple(rng, count)
        .map(|w| (*w).clone())
        .collect()
}
