//! Precedence-aware merge of key-sorted record collections.

use std::cmp::Ordering;

use crate::data::{Record, RecordCollection};

/// Merge two collections, each sorted ascending by `key`, into one sorted collection.
///
/// On equal keys the record from `first` wins and both sides advance. Duplicate
/// keys within a single input are kept. If either input is empty the other is
/// returned unchanged. Unsorted input yields unspecified order.
pub fn merge_collections(first: RecordCollection, second: RecordCollection) -> RecordCollection {
    if first.is_empty() {
        return second;
    }
    if second.is_empty() {
        return first;
    }

    let mut merged = Vec::with_capacity(first.len() + second.len());
    let mut left = first.into_iter().peekable();
    let mut right = second.into_iter().peekable();

    loop {
        let order = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.key.cmp(&r.key),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        let next: Option<Record> = match order {
            Ordering::Equal => {
                right.next();
                left.next()
            }
            Ordering::Less => left.next(),
            Ordering::Greater => right.next(),
        };
        merged.extend(next);
    }
    merged
}

/// Fold collections listed in precedence order (highest first) into one.
pub fn merge_by_precedence<I>(collections: I) -> RecordCollection
where
    I: IntoIterator<Item = RecordCollection>,
{
    collections
        .into_iter()
        .fold(Vec::new(), |merged, next| merge_collections(merged, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn record(key: &str, level: u8) -> Record {
        Record {
            key: key.to_string(),
            name: key.to_string(),
            level,
            ..Record::default()
        }
    }

    fn tagged(key: &str, origin: &str) -> Record {
        Record {
            key: key.to_string(),
            desc: origin.to_string(),
            ..Record::default()
        }
    }

    fn keys(records: &[Record]) -> Vec<&str> {
        records.iter().map(|record| record.key.as_str()).collect()
    }

    fn scenario() -> RecordCollection {
        vec![
            record("acid-arrow", 2),
            record("acid-splash", 0),
            record("cone-of-cold", 5),
            record("confusion", 4),
        ]
    }

    #[test]
    fn any_sorted_split_reassembles_in_key_order() {
        let all = scenario();
        let splits: [(&[usize], &[usize]); 5] = [
            (&[0, 1], &[2, 3]),
            (&[2, 3], &[0, 1]),
            (&[0, 2], &[1, 3]),
            (&[0, 3], &[1, 2]),
            (&[1], &[0, 2, 3]),
        ];
        for (left, right) in splits {
            let pick = |idx: &[usize]| idx.iter().map(|i| all[*i].clone()).collect::<Vec<_>>();
            let merged = merge_collections(pick(left), pick(right));
            assert_eq!(merged, all, "split {left:?} / {right:?}");
        }
        assert_eq!(
            keys(&all),
            vec!["acid-arrow", "acid-splash", "cone-of-cold", "confusion"]
        );
    }

    #[test]
    fn empty_input_is_identity() {
        assert_eq!(merge_collections(scenario(), Vec::new()), scenario());
        assert_eq!(merge_collections(Vec::new(), scenario()), scenario());
        assert!(merge_collections(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn first_collection_wins_conflicts() {
        let custom = vec![tagged("b", "custom"), tagged("d", "custom")];
        let remote = vec![tagged("a", "remote"), tagged("b", "remote"), tagged("c", "remote")];

        let merged = merge_collections(custom.clone(), remote.clone());
        assert_eq!(keys(&merged), vec!["a", "b", "c", "d"]);
        assert_eq!(merged[1].desc, "custom");

        let reversed = merge_collections(remote, custom);
        assert_eq!(keys(&reversed), keys(&merged));
        assert_eq!(reversed[1].desc, "remote");
    }

    #[test]
    fn size_is_distinct_keys_across_inputs() {
        let first = vec![record("a", 0), record("c", 0), record("e", 0)];
        let second = vec![record("b", 0), record("c", 0), record("f", 0), record("g", 0)];
        let distinct: BTreeSet<&str> = keys(&first).into_iter().chain(keys(&second)).collect();

        let merged = merge_collections(first.clone(), second.clone());
        assert_eq!(merged.len(), distinct.len());
        assert!(merged.windows(2).all(|pair| pair[0].key < pair[1].key));
    }

    #[test]
    fn duplicates_within_one_input_are_kept() {
        let first = vec![tagged("a", "one"), tagged("a", "two")];
        let second = vec![tagged("b", "remote")];
        let merged = merge_collections(first, second);
        assert_eq!(keys(&merged), vec!["a", "a", "b"]);
    }

    #[test]
    fn precedence_fold_applies_listed_order() {
        let custom = vec![tagged("b", "custom")];
        let homebrew = vec![tagged("b", "homebrew"), tagged("c", "homebrew")];
        let remote = vec![tagged("a", "remote"), tagged("b", "remote"), tagged("c", "remote")];

        let merged = merge_by_precedence([custom, homebrew, remote]);
        assert_eq!(keys(&merged), vec!["a", "b", "c"]);
        let origins: Vec<&str> = merged.iter().map(|record| record.desc.as_str()).collect();
        assert_eq!(origins, vec!["remote", "custom", "homebrew"]);
        assert!(merge_by_precedence(Vec::new()).is_empty());
    }
}
