//! Ordered up/down index over migration versions
//!
//! Built once while a source opens and read-only afterwards. Navigation is a
//! range query on a `BTreeMap`, so gaps in the version space are skipped and
//! `prev`/`next` also answer for versions that are not themselves indexed.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use crate::types::{Direction, Migration, Version};

#[derive(Debug, Clone, Default)]
struct Slot {
    up: Option<Migration>,
    down: Option<Migration>,
}

impl Slot {
    fn get(&self, direction: Direction) -> Option<&Migration> {
        match direction {
            Direction::Up => self.up.as_ref(),
            Direction::Down => self.down.as_ref(),
        }
    }

    fn get_mut(&mut self, direction: Direction) -> &mut Option<Migration> {
        match direction {
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Migrations {
    index: BTreeMap<Version, Slot>,
}

impl Migrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a migration. Returns `false`, leaving the index untouched, when the
    /// version already has a migration for that direction.
    pub fn insert(&mut self, migration: Migration) -> bool {
        if self.get(migration.version, migration.direction).is_some() {
            return false;
        }

        let direction = migration.direction;
        let slot = self.index.entry(migration.version).or_default();
        *slot.get_mut(direction) = Some(migration);
        true
    }

    /// The migration already holding `(version, direction)`, if any.
    pub fn get(&self, version: Version, direction: Direction) -> Option<&Migration> {
        self.index.get(&version).and_then(|slot| slot.get(direction))
    }

    pub fn first(&self) -> Option<Version> {
        self.index.keys().next().copied()
    }

    pub fn last(&self) -> Option<Version> {
        self.index.keys().next_back().copied()
    }

    /// Largest indexed version strictly below `version`.
    pub fn prev(&self, version: Version) -> Option<Version> {
        self.index.range(..version).next_back().map(|(v, _)| *v)
    }

    /// Smallest indexed version strictly above `version`.
    pub fn next(&self, version: Version) -> Option<Version> {
        self.index
            .range((Excluded(version), Unbounded))
            .next()
            .map(|(v, _)| *v)
    }

    pub fn up(&self, version: Version) -> Option<&Migration> {
        self.get(version, Direction::Up)
    }

    pub fn down(&self, version: Version) -> Option<&Migration> {
        self.get(version, Direction::Down)
    }

    pub fn contains(&self, version: Version) -> bool {
        self.index.contains_key(&version)
    }

    /// Number of distinct versions.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Distinct versions in ascending order.
    pub fn versions(&self) -> impl DoubleEndedIterator<Item = Version> + '_ {
        self.index.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn build(names: &[&str]) -> Migrations {
        let mut migrations = Migrations::new();
        for name in names {
            assert!(migrations.insert(parse(name).unwrap()), "duplicate {}", name);
        }
        migrations
    }

    #[test]
    fn test_empty_index() {
        let migrations = Migrations::new();
        assert!(migrations.is_empty());
        assert_eq!(migrations.first(), None);
        assert_eq!(migrations.last(), None);
        assert_eq!(migrations.next(0), None);
        assert_eq!(migrations.prev(10), None);
    }

    #[test]
    fn test_navigation_skips_gaps() {
        let migrations = build(&[
            "1_init.up.sql",
            "1_init.down.sql",
            "3_add_col.up.sql",
            "10_backfill.up.sql",
            "10_backfill.down.sql",
        ]);

        assert_eq!(migrations.len(), 3);
        assert_eq!(migrations.first(), Some(1));
        assert_eq!(migrations.last(), Some(10));
        assert_eq!(migrations.next(1), Some(3));
        assert_eq!(migrations.next(3), Some(10));
        assert_eq!(migrations.next(10), None);
        assert_eq!(migrations.prev(10), Some(3));
        assert_eq!(migrations.prev(3), Some(1));
        assert_eq!(migrations.prev(1), None);
    }

    #[test]
    fn test_navigation_from_unindexed_version() {
        let migrations = build(&["2_a.up.sql", "5_b.up.sql"]);

        assert_eq!(migrations.next(0), Some(2));
        assert_eq!(migrations.next(3), Some(5));
        assert_eq!(migrations.prev(4), Some(2));
        assert_eq!(migrations.prev(u64::MAX), Some(5));
        assert_eq!(migrations.next(u64::MAX), None);
    }

    #[test]
    fn test_first_counts_down_only_versions() {
        let migrations = build(&["7_drop.down.sql", "9_add.up.sql"]);
        assert_eq!(migrations.first(), Some(7));
        assert!(migrations.up(7).is_none());
        assert!(migrations.down(7).is_some());
    }

    #[test]
    fn test_duplicate_insert_is_rejected_without_mutation() {
        let mut migrations = build(&["1_init.up.sql", "2_next.down.sql"]);

        assert!(!migrations.insert(parse("1_other.up.sql").unwrap()));
        assert_eq!(migrations.up(1).unwrap().raw, "1_init.up.sql");
        assert!(migrations.down(1).is_none());
        assert_eq!(migrations.len(), 2);

        assert!(!migrations.insert(parse("2_again.down.sql").unwrap()));
        assert_eq!(migrations.down(2).unwrap().identifier, "next");

        // the other direction of an existing version is still free
        assert!(migrations.insert(parse("1_init.down.sql").unwrap()));
        assert_eq!(migrations.len(), 2);
    }

    #[test]
    fn test_insert_stores_under_its_own_direction() {
        let mut migrations = Migrations::new();

        assert!(migrations.insert(parse("4_seed.down.sql").unwrap()));
        assert!(migrations.up(4).is_none());
        assert_eq!(migrations.down(4).unwrap().raw, "4_seed.down.sql");

        assert!(migrations.insert(parse("4_seed.up.sql").unwrap()));
        assert_eq!(migrations.up(4).unwrap().raw, "4_seed.up.sql");
        assert_eq!(migrations.len(), 1);
    }

    #[test]
    fn test_up_and_down_lookup() {
        let migrations = build(&["1_init.up.sql", "1_init.down.sql", "3_add_col.up.sql"]);

        assert_eq!(migrations.up(1).unwrap().raw, "1_init.up.sql");
        assert_eq!(migrations.down(1).unwrap().raw, "1_init.down.sql");
        assert_eq!(migrations.up(3).unwrap().identifier, "add_col");
        assert!(migrations.down(3).is_none());
        assert!(migrations.up(2).is_none());
        assert!(!migrations.contains(2));
    }

    #[test]
    fn test_versions_iterate_in_order() {
        let migrations = build(&["30_c.up.sql", "1_a.up.sql", "20_b.down.sql", "1_a.down.sql"]);
        assert_eq!(migrations.versions().collect::<Vec<_>>(), vec![1, 20, 30]);
        assert_eq!(migrations.versions().rev().collect::<Vec<_>>(), vec![30, 20, 1]);
    }
}
