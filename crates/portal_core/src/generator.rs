//! crates/portal_core/src/generator.rs
//!
//! Selects questions from a parsed bank into lettered paper sets.
//!
//! Every set covers the same units (the first [`MAX_UNITS`] of the bank) with one
//! section per unit: a primary question plus an "OR" alternative. Within a unit the
//! questions used least by earlier sets are preferred, with ties broken by a seeded
//! shuffle. No two sets share the same selection. When the preferred pick collides
//! with an earlier set, the selection space is walked in order and the first unused
//! selection is taken instead.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;

use crate::domain::{PaperSection, PaperSet, Question, UnitPools};

/// Units printed on one paper.
pub const MAX_UNITS: usize = 5;
/// Sets are lettered A to Z.
pub const MAX_SETS: usize = 26;
/// Marks carried by each unit section.
pub const UNIT_MARKS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("number of sets must be between 1 and {MAX_SETS}, got {0}")]
    InvalidSetCount(usize),
    #[error("the question bank contains no questions")]
    EmptyBank,
    #[error("the question pool only allows {available} distinct sets, {requested} requested")]
    PoolTooSmall { requested: usize, available: u128 },
}

/// Indices into one unit's pool: the primary and, if any, the alternative.
/// Stored with the lower index first so that swapped pairs compare equal.
type Pick = (usize, Option<usize>);

/// Generates `num_sets` distinct sets from `units`. The same seed gives the same sets.
pub fn generate_sets(
    units: &UnitPools,
    num_sets: usize,
    seed: u64,
) -> Result<Vec<PaperSet>, GenerationError> {
    if num_sets == 0 || num_sets > MAX_SETS {
        return Err(GenerationError::InvalidSetCount(num_sets));
    }

    let pools: Vec<(u32, &[Question])> = units
        .iter()
        .filter(|(_, questions)| !questions.is_empty())
        .take(MAX_UNITS)
        .map(|(unit, questions)| (*unit, questions.as_slice()))
        .collect();
    if pools.is_empty() {
        return Err(GenerationError::EmptyBank);
    }

    let sizes: Vec<usize> = pools.iter().map(|(_, qs)| qs.len()).collect();
    let available = selection_space(&sizes);
    if num_sets as u128 > available {
        return Err(GenerationError::PoolTooSmall {
            requested: num_sets,
            available,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut usage: Vec<Vec<u32>> = sizes.iter().map(|&n| vec![0; n]).collect();
    let mut seen: HashSet<Vec<Pick>> = HashSet::with_capacity(num_sets);
    let mut sets = Vec::with_capacity(num_sets);

    for letter in ('A'..='Z').take(num_sets) {
        let mut selection = spread_pick(&usage, &mut rng);
        if seen.contains(&selection) {
            selection = first_unused(&sizes, &seen);
        }

        for (counts, &(first, second)) in usage.iter_mut().zip(&selection) {
            counts[first] += 1;
            if let Some(second) = second {
                counts[second] += 1;
            }
        }

        sets.push(build_set(letter, &pools, &selection));
        seen.insert(selection);
    }

    Ok(sets)
}

/// Number of distinct selections: the product of `C(n, 2)` over units (1 for a lone question).
pub fn selection_space(sizes: &[usize]) -> u128 {
    sizes
        .iter()
        .map(|&n| pair_count(n).max(1))
        .fold(1u128, |acc, n| acc.saturating_mul(n))
}

fn pair_count(n: usize) -> u128 {
    let n = n as u128;
    n * n.saturating_sub(1) / 2
}

fn spread_pick(usage: &[Vec<u32>], rng: &mut StdRng) -> Vec<Pick> {
    usage
        .iter()
        .map(|counts| {
            let mut order: Vec<usize> = (0..counts.len()).collect();
            order.shuffle(rng);
            // Stable sort keeps the shuffled order among equally used questions.
            order.sort_by_key(|&i| counts[i]);
            normalize(order[0], order.get(1).copied())
        })
        .collect()
}

fn normalize(first: usize, second: Option<usize>) -> Pick {
    match second {
        Some(second) if second < first => (second, Some(first)),
        _ => (first, second),
    }
}

/// Walks the selection space in mixed-radix order and returns the first selection not in `seen`.
///
/// Callers guarantee `seen.len()` is below [`selection_space`], so the walk ends.
fn first_unused(sizes: &[usize], seen: &HashSet<Vec<Pick>>) -> Vec<Pick> {
    let mut rank: u128 = 0;
    loop {
        let candidate = unrank_selection(sizes, rank);
        if !seen.contains(&candidate) {
            return candidate;
        }
        rank += 1;
    }
}

fn unrank_selection(sizes: &[usize], mut rank: u128) -> Vec<Pick> {
    sizes
        .iter()
        .map(|&n| {
            let radix = pair_count(n).max(1);
            let digit = rank % radix;
            rank /= radix;
            unrank_pair(n, digit)
        })
        .collect()
}

/// Maps `0..C(n, 2)` onto `(i, j)` with `i < j`, in lexicographic order.
fn unrank_pair(n: usize, mut digit: u128) -> Pick {
    if n < 2 {
        return (0, None);
    }
    let mut first = 0usize;
    loop {
        let row = (n - 1 - first) as u128;
        if digit < row {
            return (first, Some(first + 1 + digit as usize));
        }
        digit -= row;
        first += 1;
    }
}

fn build_set(letter: char, pools: &[(u32, &[Question])], selection: &[Pick]) -> PaperSet {
    let sections = pools
        .iter()
        .zip(selection)
        .map(|(&(unit, questions), &(first, second))| PaperSection {
            unit,
            primary: questions[first].clone(),
            alternative: second.map(|i| questions[i].clone()),
        })
        .collect();
    PaperSet { letter, sections }
}

/// Maximum marks for a paper with `units` unit sections.
pub fn max_marks(units: usize) -> u32 {
    units as u32 * UNIT_MARKS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuestionMeta;

    fn bank(sizes: &[(u32, usize)]) -> UnitPools {
        sizes
            .iter()
            .map(|&(unit, n)| {
                let questions = (0..n)
                    .map(|i| Question {
                        unit,
                        number: Some(i as u32 + 1),
                        text: format!("U{unit} Q{i}"),
                        meta: QuestionMeta::default(),
                    })
                    .collect();
                (unit, questions)
            })
            .collect()
    }

    fn signature(set: &PaperSet) -> Vec<(String, Option<String>)> {
        set.sections
            .iter()
            .map(|s| {
                (
                    s.primary.text.clone(),
                    s.alternative.as_ref().map(|q| q.text.clone()),
                )
            })
            .collect()
    }

    #[test]
    fn sets_are_lettered_and_cover_the_same_units() {
        let units = bank(&[(1, 6), (2, 6), (3, 6), (4, 6), (5, 6)]);
        let sets = generate_sets(&units, 4, 7).unwrap();

        let labels: Vec<String> = sets.iter().map(PaperSet::label).collect();
        assert_eq!(labels, vec!["Set A", "Set B", "Set C", "Set D"]);
        for set in &sets {
            let covered: Vec<u32> = set.sections.iter().map(|s| s.unit).collect();
            assert_eq!(covered, vec![1, 2, 3, 4, 5]);
            for section in &set.sections {
                let alt = section.alternative.as_ref().unwrap();
                assert_ne!(section.primary, *alt);
                assert_eq!(section.primary.unit, section.unit);
            }
        }
    }

    #[test]
    fn no_two_sets_are_identical() {
        let units = bank(&[(1, 3), (2, 2)]);
        // C(3,2) * C(2,2) = 3 distinct selections.
        let sets = generate_sets(&units, 3, 42).unwrap();
        let unique: HashSet<_> = sets.iter().map(signature).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn least_used_questions_are_preferred() {
        let units = bank(&[(1, 4)]);
        let sets = generate_sets(&units, 2, 1).unwrap();
        let mut used: Vec<String> = sets
            .iter()
            .flat_map(|s| {
                let section = &s.sections[0];
                [
                    section.primary.text.clone(),
                    section.alternative.clone().unwrap().text,
                ]
            })
            .collect();
        used.sort();
        used.dedup();
        assert_eq!(used.len(), 4);
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let units = bank(&[(1, 8), (2, 8)]);
        let a = generate_sets(&units, 4, 99).unwrap();
        let b = generate_sets(&units, 4, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn only_the_first_five_units_are_used() {
        let units = bank(&[(1, 2), (2, 2), (3, 2), (4, 2), (5, 2), (6, 2)]);
        let sets = generate_sets(&units, 1, 0).unwrap();
        assert_eq!(sets[0].sections.len(), MAX_UNITS);
        assert!(sets[0].sections.iter().all(|s| s.unit <= 5));
    }

    #[test]
    fn single_question_unit_has_no_alternative() {
        let units = bank(&[(1, 1), (2, 3)]);
        let sets = generate_sets(&units, 2, 5).unwrap();
        for set in &sets {
            assert!(set.sections[0].alternative.is_none());
            assert!(set.sections[1].alternative.is_some());
        }
    }

    #[test]
    fn small_pool_is_rejected() {
        let units = bank(&[(1, 2), (2, 2)]);
        assert_eq!(
            generate_sets(&units, 2, 0),
            Err(GenerationError::PoolTooSmall {
                requested: 2,
                available: 1
            })
        );
    }

    #[test]
    fn set_count_is_bounded() {
        let units = bank(&[(1, 10)]);
        assert_eq!(
            generate_sets(&units, 0, 0),
            Err(GenerationError::InvalidSetCount(0))
        );
        assert_eq!(
            generate_sets(&units, 27, 0),
            Err(GenerationError::InvalidSetCount(27))
        );
    }

    #[test]
    fn empty_bank_is_rejected() {
        let mut units = UnitPools::new();
        units.insert(1, Vec::new());
        assert_eq!(generate_sets(&units, 1, 0), Err(GenerationError::EmptyBank));
    }

    #[test]
    fn fallback_returns_first_unused_selection() {
        let sizes = [3, 1];
        let mut seen = HashSet::new();
        seen.insert(vec![(0, Some(1)), (0, None)]);
        seen.insert(vec![(0, Some(2)), (0, None)]);
        assert_eq!(first_unused(&sizes, &seen), vec![(1, Some(2)), (0, None)]);
    }

    #[test]
    fn pairs_unrank_in_lexicographic_order() {
        let pairs: Vec<Pick> = (0..6).map(|d| unrank_pair(4, d)).collect();
        assert_eq!(
            pairs,
            vec![
                (0, Some(1)),
                (0, Some(2)),
                (0, Some(3)),
                (1, Some(2)),
                (1, Some(3)),
                (2, Some(3))
            ]
        );
    }

    #[test]
    fn selection_space_multiplies_pair_counts() {
        assert_eq!(selection_space(&[4, 3, 1]), 6 * 3);
        assert_eq!(max_marks(5), 60);
    }
}
