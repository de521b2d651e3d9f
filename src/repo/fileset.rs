//! Set algebra over file sequences (component C, §4.C "Set algebra").
//!
//! Grounded on `metacat/db/dbobjects2.py`'s `DBFileSet.join`/`union`/
//! `subtract`: `join` is multi-way intersection by file ID, `union` is
//! first-seen-wins, `subtract` is left-minus-right. All three preserve the
//! order of their left-most (or only) input (§5 "Ordering guarantees").
//! Materializes only what it must: `subtract`'s right side and all but the
//! first operand of `join` are hashed into ID sets; everything else stays
//! a single streaming pass over the left operand.

use std::collections::HashSet;

use crate::model::File;

fn ids<'a>(files: impl IntoIterator<Item = &'a File>) -> HashSet<String> {
    files.into_iter().map(|f| f.fid.clone()).collect()
}

/// Intersection by file ID, order and duplicates of the first operand
/// preserved, requires at least one set.
pub fn join(sets: &[Vec<File>]) -> Vec<File> {
    let Some((first, rest)) = sets.split_first() else {
        return Vec::new();
    };
    let rest_ids: Vec<HashSet<String>> = rest.iter().map(|s| ids(s)).collect();
    first
        .iter()
        .filter(|f| rest_ids.iter().all(|set| set.contains(&f.fid)))
        .cloned()
        .collect()
}

/// First-seen-wins union by file ID, in input order across all sets.
pub fn union(sets: &[Vec<File>]) -> Vec<File> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for set in sets {
        for f in set {
            if seen.insert(f.fid.clone()) {
                out.push(f.clone());
            }
        }
    }
    out
}

/// Left-minus-right by file ID, left operand's order preserved.
pub fn subtract(left: &[File], right: &[File]) -> Vec<File> {
    let exclude = ids(right);
    left.iter().filter(|f| !exclude.contains(&f.fid)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(fid: &str) -> File {
        crate::model::File::new(Some(fid.to_string()), None, None).unwrap()
    }

    #[test]
    fn join_intersects_preserving_left_order() {
        let a = vec![file("1"), file("2"), file("3")];
        let b = vec![file("3"), file("1")];
        let result = join(&[a, b]);
        assert_eq!(result.iter().map(|f| f.fid.clone()).collect::<Vec<_>>(), vec!["1", "3"]);
    }

    #[test]
    fn join_with_three_sets_requires_all() {
        let a = vec![file("1"), file("2")];
        let b = vec![file("1")];
        let c = vec![file("2")];
        assert!(join(&[a, b, c]).is_empty());
    }

    #[test]
    fn union_is_first_seen_wins() {
        let a = vec![file("1"), file("2")];
        let b = vec![file("2"), file("3")];
        let result = union(&[a, b]);
        assert_eq!(result.iter().map(|f| f.fid.clone()).collect::<Vec<_>>(), vec!["1", "2", "3"]);
    }

    #[test]
    fn subtract_removes_right_members() {
        let left = vec![file("1"), file("2"), file("3")];
        let right = vec![file("2")];
        let result = subtract(&left, &right);
        assert_eq!(result.iter().map(|f| f.fid.clone()).collect::<Vec<_>>(), vec!["1", "3"]);
    }

    #[test]
    fn empty_join_input_is_empty() {
        assert!(join(&[]).is_empty());
    }
}
