// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RosterDiff {
    pub joined: Vec<String>,
    pub left: Vec<String>,
}

impl RosterDiff {
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.left.is_empty()
    }

    /// Join lines first, then leave lines, each in roster order.
    pub fn log_lines(&self) -> Vec<String> {
        self.joined
            .iter()
            .map(|name| format!("{name} joined the game"))
            .chain(self.left.iter().map(|name| format!("{name} left the game")))
            .collect()
    }
}

pub fn diff(old: &[String], new: &[String]) -> RosterDiff {
    RosterDiff {
        joined: missing_from(new, old),
        left: missing_from(old, new),
    }
}

fn missing_from(source: &[String], other: &[String]) -> Vec<String> {
    let present = other.iter().map(String::as_str).collect::<HashSet<&str>>();
    let mut seen = HashSet::new();
    source
        .iter()
        .filter(|name| !present.contains(name.as_str()) && seen.insert(name.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RosterTracker {
    players: Vec<String>,
}

impl RosterTracker {
    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn contains(&self, name: &str) -> bool {
        self.players.iter().any(|player| player == name)
    }

    pub fn diff_against(&self, next: &[String]) -> RosterDiff {
        diff(&self.players, next)
    }

    pub fn commit(&mut self, next: Vec<String>) {
        self.players = next;
    }
}

#[cfg(test)]
mod tests {
    use super::{RosterDiff, RosterTracker, diff};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn unchanged_roster_yields_no_events() {
        for roster in [names(&[]), names(&["a"]), names(&["a", "b", "b", "c"])] {
            assert!(diff(&roster, &roster).is_empty());
        }
    }

    #[test]
    fn everyone_joins_an_empty_server() {
        assert_eq!(
            diff(&[], &names(&["a", "b"])),
            RosterDiff {
                joined: names(&["a", "b"]),
                left: vec![],
            }
        );
    }

    #[test]
    fn everyone_leaves_when_the_server_empties() {
        assert_eq!(
            diff(&names(&["a", "b"]), &[]),
            RosterDiff {
                joined: vec![],
                left: names(&["a", "b"]),
            }
        );
    }

    #[test]
    fn order_follows_each_side_and_duplicates_collapse() {
        let changes = diff(&names(&["x", "a", "y", "y"]), &names(&["c", "a", "b", "c"]));
        assert_eq!(changes.joined, names(&["c", "b"]));
        assert_eq!(changes.left, names(&["x", "y"]));
        assert!(
            changes
                .joined
                .iter()
                .all(|name| !changes.left.contains(name))
        );
    }

    #[test]
    fn log_lines_put_joins_before_leaves() {
        let changes = diff(&names(&["old"]), &names(&["new"]));
        assert_eq!(
            changes.log_lines(),
            vec!["new joined the game", "old left the game"]
        );
    }

    #[test]
    fn tracker_diffs_against_the_committed_roster() {
        let mut tracker = RosterTracker::default();
        let first = tracker.diff_against(&names(&["Steve", "Alex"]));
        assert_eq!(first.joined, names(&["Steve", "Alex"]));
        assert!(!tracker.contains("Alex"));

        tracker.commit(names(&["Steve", "Alex"]));
        assert!(tracker.contains("Alex"));

        let second = tracker.diff_against(&names(&["Alex"]));
        assert_eq!(second.left, names(&["Steve"]));
        assert!(second.joined.is_empty());
    }
}
