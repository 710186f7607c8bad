//! Fuzzy filtering of locations and actions against free-text input.

use std::ops::Range;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::domain::model::{Action, Location};

/// The single string an item is matched on.
pub trait MatchKey {
    fn match_key(&self) -> &str;
}

impl MatchKey for Location {
    fn match_key(&self) -> &str {
        &self.name
    }
}

impl MatchKey for Action {
    fn match_key(&self) -> &str {
        &self.name
    }
}

/// Indices of the items that survived a filter, best match first.
#[derive(Debug, Clone)]
pub enum Matches {
    /// Empty query: every item, in original order.
    All(Range<usize>),
    Ranked(std::vec::IntoIter<usize>),
}

impl Iterator for Matches {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            Matches::All(range) => range.next(),
            Matches::Ranked(ranked) => ranked.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Matches::All(range) => range.size_hint(),
            Matches::Ranked(ranked) => ranked.size_hint(),
        }
    }
}

impl ExactSizeIterator for Matches {}

/// Case-insensitive skim-style subsequence matcher.
pub struct FuzzyFilter {
    matcher: SkimMatcherV2,
}

impl Default for FuzzyFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FuzzyFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuzzyFilter").finish_non_exhaustive()
    }
}

impl FuzzyFilter {
    pub fn new() -> Self {
        Self {
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }

    /// Filter `items` by `query`.
    ///
    /// An empty query keeps everything in order. Otherwise only items whose key contains the
    /// query as a subsequence are kept, ordered by descending score; equal scores keep their
    /// original relative order.
    pub fn filter<T: MatchKey>(&self, query: &str, items: &[T]) -> Matches {
        if query.is_empty() {
            return Matches::All(0..items.len());
        }

        let mut scored: Vec<(usize, i64)> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                self.matcher
                    .fuzzy_match(item.match_key(), query)
                    .map(|score| (index, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        Matches::Ranked(
            scored
                .into_iter()
                .map(|(index, _)| index)
                .collect::<Vec<_>>()
                .into_iter(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(names: &[&str]) -> Vec<Action> {
        names.iter().map(|name| Action::new(*name, "")).collect()
    }

    #[test]
    fn empty_query_keeps_original_order() {
        let filter = FuzzyFilter::new();
        let items = actions(&["build", "test", "shell"]);
        let first: Vec<_> = filter.filter("", &items).collect();
        let second: Vec<_> = filter.filter("", &items).collect();
        assert_eq!(first, [0, 1, 2]);
        assert_eq!(first, second);
    }

    #[test]
    fn non_matching_items_are_excluded() {
        let filter = FuzzyFilter::new();
        let items = actions(&["build", "test", "shell"]);
        let matched: Vec<_> = filter.filter("sl", &items).collect();
        assert_eq!(matched, [2]);
        assert_eq!(filter.filter("xyz", &items).count(), 0);
    }

    #[test]
    fn matching_ignores_case() {
        let filter = FuzzyFilter::new();
        let items = actions(&["Build", "deploy"]);
        let matched: Vec<_> = filter.filter("BLD", &items).collect();
        assert_eq!(matched, [0]);
    }

    #[test]
    fn better_matches_rank_first() {
        let filter = FuzzyFilter::new();
        let items = actions(&["a-p-i-gateway", "api"]);
        let matched: Vec<_> = filter.filter("api", &items).collect();
        assert_eq!(matched, [1, 0]);
    }
}
