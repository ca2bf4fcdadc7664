//! Subsequence matching and edit distance for filtering candidate lists.

use serde::Serialize;

/// A string transformation applied to both the query and every haystack item
/// before matching.
pub trait Transform {
    fn apply(&self, s: &str) -> String;
}

impl<F> Transform for F
where
    F: Fn(&str) -> String,
{
    fn apply(&self, s: &str) -> String {
        self(s)
    }
}

/// Built-in transformers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Transformer {
    /// Lower-cases both sides for case-insensitive search.
    IgnoreCase,
    /// Strips surrounding whitespace.
    Trim,
    /// Trims and lower-cases.
    Normalize,
}

impl Transform for Transformer {
    fn apply(&self, s: &str) -> String {
        match self {
            Self::IgnoreCase => s.to_lowercase(),
            Self::Trim => s.trim().to_owned(),
            Self::Normalize => s.trim().to_lowercase(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchResult {
    pub item: String,
    /// Edit distance to the query, present only for ranked searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<usize>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SearchResults {
    /// The haystack as given, returned for an empty query.
    Unfiltered(Vec<String>),
    Matches(Vec<MatchResult>),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            Self::Unfiltered(items) => items.len(),
            Self::Matches(matches) => matches.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens the results into display strings.
    pub fn into_items(self) -> Vec<String> {
        match self {
            Self::Unfiltered(items) => items,
            Self::Matches(matches) => matches.into_iter().map(|m| m.item).collect(),
        }
    }

    /// Converts the results into [`MatchResult`]s, unfiltered items having no
    /// score.
    pub fn into_matches(self) -> Vec<MatchResult> {
        match self {
            Self::Unfiltered(items) => items
                .into_iter()
                .map(|item| MatchResult { item, score: None })
                .collect(),
            Self::Matches(matches) => matches,
        }
    }
}

/// Returns `true` if `needle` is an ordered subsequence of `haystack_item`.
pub fn matches(haystack_item: &str, needle: &str) -> bool {
    let hlen = haystack_item.chars().count();
    let nlen = needle.chars().count();
    if nlen > hlen {
        return false;
    }
    if nlen == hlen {
        return haystack_item == needle;
    }
    // Greedy scan, the haystack iterator is never rewound.
    let mut hay = haystack_item.chars();
    needle.chars().all(|ch| hay.any(|h| h == ch))
}

/// Computes the Levenshtein distance between two strings.
pub fn distance(haystack_item: &str, needle: &str) -> usize {
    if haystack_item == needle {
        return 0;
    }
    let mut a = haystack_item.chars().collect::<Vec<_>>();
    let mut b = needle.chars().collect::<Vec<_>>();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    // Rows follow the shorter string.
    if b.len() > a.len() {
        std::mem::swap(&mut a, &mut b);
    }

    let cols = a.len() + 1;
    let mut matrix = vec![0usize; (b.len() + 1) * cols];
    for (j, cell) in matrix.iter_mut().take(cols).enumerate() {
        *cell = j;
    }
    for i in 1..=b.len() {
        matrix[i * cols] = i;
        for j in 1..=a.len() {
            let cost = usize::from(b[i - 1] != a[j - 1]);
            let substitute = matrix[(i - 1) * cols + j - 1] + cost;
            let delete = matrix[(i - 1) * cols + j] + 1;
            let insert = matrix[i * cols + j - 1] + 1;
            matrix[i * cols + j] = substitute.min(delete).min(insert);
        }
    }
    matrix[b.len() * cols + a.len()]
}

/// Filters `haystack` down to the items `query` matches, optionally ranked by
/// edit distance.
///
/// An empty query short-circuits to the unmodified haystack. When a
/// transform is given, matched items are reported in their transformed form.
pub fn search<S>(
    haystack: &[S],
    query: &str,
    rank: bool,
    transform: Option<&dyn Transform>,
) -> SearchResults
where
    S: AsRef<str>,
{
    if query.is_empty() {
        return SearchResults::Unfiltered(
            haystack.iter().map(|s| s.as_ref().to_owned()).collect(),
        );
    }

    let apply = |s: &str| match transform {
        Some(t) => t.apply(s),
        None => s.to_owned(),
    };
    let query = apply(query);

    let mut results = haystack
        .iter()
        .map(|s| apply(s.as_ref()))
        .filter(|item| matches(item, &query))
        .map(|item| {
            let score = rank.then(|| distance(&item, &query));
            MatchResult { item, score }
        })
        .collect::<Vec<_>>();
    if rank {
        // Stable, so ties keep haystack order.
        results.sort_by_key(|m| m.score);
    }
    SearchResults::Matches(results)
}
