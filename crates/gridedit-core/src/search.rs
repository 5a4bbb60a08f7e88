use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::columns::IncludedColumns;
use crate::state::{CellPosition, SelectionRange};
use crate::store::{CellChange, GridStore};

/// Which columns a search scans
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnScope {
    /// Every included column
    #[default]
    Included,
    /// One column; yields nothing if that column is not included
    Single(usize),
}

/// Options for finding cells in the grid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// The search pattern (literal text or regex)
    pub pattern: String,
    #[serde(default)]
    pub case_sensitive: bool,
    /// Match whole words only; ignored in regex mode
    #[serde(default)]
    pub whole_word: bool,
    #[serde(default)]
    pub use_regex: bool,
    #[serde(default)]
    pub column_scope: ColumnScope,
    /// Restrict the scan to a selection rectangle
    #[serde(default)]
    pub within: Option<SelectionRange>,
}

impl SearchOptions {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn case_sensitive(mut self, on: bool) -> Self {
        self.case_sensitive = on;
        self
    }

    pub fn whole_word(mut self, on: bool) -> Self {
        self.whole_word = on;
        self
    }

    pub fn regex(mut self, on: bool) -> Self {
        self.use_regex = on;
        self
    }

    pub fn scope(mut self, scope: ColumnScope) -> Self {
        self.column_scope = scope;
        self
    }

    pub fn within(mut self, range: SelectionRange) -> Self {
        self.within = Some(range);
        self
    }

    /// Whether matches are bounded to whole words. Regex mode ignores the
    /// toggle.
    pub fn matches_whole_words(&self) -> bool {
        self.whole_word && !self.use_regex
    }
}

/// Options for replacing text in cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOptions {
    #[serde(flatten)]
    pub search: SearchOptions,
    /// Replacement text; `$1`/`${name}` refer to captures in regex mode
    pub replacement: String,
}

impl ReplaceOptions {
    pub fn new(search: SearchOptions, replacement: impl Into<String>) -> Self {
        Self {
            search,
            replacement: replacement.into(),
        }
    }
}

/// Errors that can occur during search/replace operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    InvalidPattern(String),
}

impl SearchError {
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::InvalidPattern(_) => "INVALID_PATTERN",
        }
    }
}

/// Outcome of a find or replace, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SearchStatus {
    Matches(usize),
    NoMatches,
    InvalidPattern(String),
}

impl SearchStatus {
    pub fn from_result<T>(result: &Result<Vec<T>, SearchError>) -> Self {
        match result {
            Ok(items) if items.is_empty() => SearchStatus::NoMatches,
            Ok(items) => SearchStatus::Matches(items.len()),
            Err(SearchError::InvalidPattern(msg)) => SearchStatus::InvalidPattern(msg.clone()),
        }
    }
}

/// Matcher trait for different matching strategies
trait Matcher {
    fn is_match(&self, text: &str) -> bool;
    fn replace_all(&self, text: &str, replacement: &str) -> String;
}

/// Exact substring matcher
struct SubstringMatcher {
    needle: String,
}

impl Matcher for SubstringMatcher {
    fn is_match(&self, text: &str) -> bool {
        text.contains(&self.needle)
    }

    fn replace_all(&self, text: &str, replacement: &str) -> String {
        text.replace(&self.needle, replacement)
    }
}

/// Regex matcher, also used for case-folded and whole-word literals
struct RegexMatcher {
    regex: Regex,
    /// Expand `$n` in replacements (true regex mode only)
    expand: bool,
}

impl Matcher for RegexMatcher {
    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    fn replace_all(&self, text: &str, replacement: &str) -> String {
        if self.expand {
            self.regex.replace_all(text, replacement).into_owned()
        } else {
            self.regex.replace_all(text, NoExpand(replacement)).into_owned()
        }
    }
}

/// Search engine for finding and replacing text in the grid
pub struct SearchEngine;

impl SearchEngine {
    /// Positions of matching cells, row-major
    pub fn find(
        store: &GridStore,
        included: &IncludedColumns,
        options: &SearchOptions,
    ) -> Result<Vec<CellPosition>, SearchError> {
        let Some(matcher) = Self::build_matcher(options)? else {
            return Ok(Vec::new());
        };

        Ok(Self::scan(store, included, options)
            .filter(|pos| matcher.is_match(store.value_at(pos.row, pos.col)))
            .collect())
    }

    /// Changes a replace-all would make. Cells whose value would not change
    /// are left out.
    pub fn replace_all(
        store: &GridStore,
        included: &IncludedColumns,
        options: &ReplaceOptions,
    ) -> Result<Vec<CellChange>, SearchError> {
        let Some(matcher) = Self::build_matcher(&options.search)? else {
            return Ok(Vec::new());
        };

        let mut changes = Vec::new();
        for pos in Self::scan(store, included, &options.search) {
            let old = store.value_at(pos.row, pos.col);
            if !matcher.is_match(old) {
                continue;
            }
            let new = matcher.replace_all(old, &options.replacement);
            if new != old {
                changes.push(CellChange::new(pos.row, pos.col, old, new));
            }
        }

        tracing::debug!(
            pattern = %options.search.pattern,
            changes = changes.len(),
            "replace-all computed"
        );
        Ok(changes)
    }

    /// Check a pattern without scanning
    pub fn validate(options: &SearchOptions) -> Result<(), SearchError> {
        Self::build_matcher(options).map(|_| ())
    }

    /// Build a matcher from search options. `None` for an empty pattern,
    /// which matches nothing.
    fn build_matcher(options: &SearchOptions) -> Result<Option<Box<dyn Matcher>>, SearchError> {
        if options.pattern.is_empty() {
            return Ok(None);
        }

        let (source, expand) = if options.matches_whole_words() {
            (format!(r"\b{}\b", regex::escape(&options.pattern)), false)
        } else if options.use_regex {
            (options.pattern.clone(), true)
        } else if options.case_sensitive {
            return Ok(Some(Box::new(SubstringMatcher {
                needle: options.pattern.clone(),
            })));
        } else {
            (regex::escape(&options.pattern), false)
        };

        let regex = RegexBuilder::new(&source)
            .case_insensitive(!options.case_sensitive)
            .build()
            .map_err(|e| SearchError::InvalidPattern(e.to_string()))?;

        Ok(Some(Box::new(RegexMatcher { regex, expand })))
    }

    /// Cells in scope, row-major
    fn scan<'a>(
        store: &GridStore,
        included: &'a IncludedColumns,
        options: &SearchOptions,
    ) -> impl Iterator<Item = CellPosition> + 'a {
        let (mut row_lo, mut row_hi) = (0, store.row_count());
        let (mut col_lo, mut col_hi) = (0, usize::MAX);
        if let Some(range) = options.within {
            let normalized = range.normalize();
            row_lo = normalized.start.row;
            row_hi = row_hi.min(normalized.end.row + 1);
            col_lo = normalized.start.col;
            col_hi = normalized.end.col;
        }

        let cols: &'a [usize] = match options.column_scope {
            ColumnScope::Included => included.in_range(col_lo, col_hi),
            ColumnScope::Single(col) => {
                let slice = included.in_range(col, col);
                if col >= col_lo && col <= col_hi {
                    slice
                } else {
                    &[]
                }
            }
        };

        (row_lo..row_hi).flat_map(move |row| cols.iter().map(move |&col| CellPosition::new(row, col)))
    }
}
