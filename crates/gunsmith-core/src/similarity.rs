//! Ratcliff/Obershelp string similarity.
//!
//! Search results are ranked by how closely the item name matches what the
//! user typed. The score is `2 * M / T`, where `M` is the number of characters
//! in matching blocks and `T` the combined length of both strings. Matching
//! blocks are found by taking the longest common substring and recursing on
//! both sides of it.

use std::collections::HashMap;

/// Similarity of `a` and `b` in `[0.0, 1.0]`. Comparison is case-sensitive.
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matches = matching_characters(&a, &b);
    2.0 * matches as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, ch) in b.iter().enumerate() {
        positions.entry(*ch).or_default().push(j);
    }

    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, &positions, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        total += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    total
}

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`, preferring the
/// earliest start in `a`, then in `b`.
fn longest_match(
    a: &[char],
    positions: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_lengths = HashMap::new();
        if let Some(js) = positions.get(ch) {
            for &j in js {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let previous = j
                    .checked_sub(1)
                    .and_then(|prev| run_lengths.get(&prev))
                    .copied()
                    .unwrap_or(0);
                let size = previous + 1;
                next_lengths.insert(j, size);
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
        }
        run_lengths = next_lengths;
    }

    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_strings() {
        assert!(approx(ratio("Fatebringer", "Fatebringer"), 1.0));
    }

    #[test]
    fn test_disjoint_strings() {
        assert!(approx(ratio("abc", "xyz"), 0.0));
    }

    #[test]
    fn test_empty_strings() {
        assert!(approx(ratio("", ""), 1.0));
        assert!(approx(ratio("abc", ""), 0.0));
    }

    #[test]
    fn test_known_values() {
        // "bcd" matches: 2 * 3 / 8
        assert!(approx(ratio("abcd", "bcde"), 0.75));
        // "Ram" matches: 2 * 3 / 10
        assert!(approx(ratio("Rampage", "Ram"), 0.6));
    }

    #[test]
    fn test_closer_name_scores_higher() {
        let query = "Outlaw";
        assert!(ratio("Outlaw", query) > ratio("Enhanced Outlaw", query));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(ratio("outlaw", "Outlaw") < 1.0);
    }
}
