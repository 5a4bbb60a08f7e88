use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Destination mapping for one source column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub id: String,
    pub include: bool,
}

impl ColumnMapping {
    pub fn new(id: impl Into<String>, include: bool) -> Self {
        Self {
            id: id.into(),
            include,
        }
    }
}

/// The ordered set of source column ordinals that are part of the active
/// mapping. Always sorted ascending and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<usize>", into = "Vec<usize>")]
pub struct IncludedColumns {
    cols: Vec<usize>,
}

impl From<Vec<usize>> for IncludedColumns {
    fn from(cols: Vec<usize>) -> Self {
        Self::new(cols)
    }
}

impl From<IncludedColumns> for Vec<usize> {
    fn from(included: IncludedColumns) -> Self {
        included.cols
    }
}

impl IncludedColumns {
    pub fn new(cols: impl IntoIterator<Item = usize>) -> Self {
        let mut cols: Vec<usize> = cols.into_iter().collect();
        cols.sort_unstable();
        cols.dedup();
        Self { cols }
    }

    /// Derive the included set from a column mapping
    pub fn from_mapping(mapping: &BTreeMap<usize, ColumnMapping>) -> Self {
        Self {
            cols: mapping
                .iter()
                .filter(|(_, m)| m.include)
                .map(|(&col, _)| col)
                .collect(),
        }
    }

    pub fn contains(&self, col: usize) -> bool {
        self.cols.binary_search(&col).is_ok()
    }

    /// Index of `col` within the included sequence
    pub fn position_of(&self, col: usize) -> Option<usize> {
        self.cols.binary_search(&col).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cols.len()
    }

    pub fn first(&self) -> Option<usize> {
        self.cols.first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.cols.last().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.cols
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.cols.iter().copied()
    }

    /// First included column strictly to the right of `col`
    pub fn next_after(&self, col: usize) -> Option<usize> {
        let idx = self.cols.partition_point(|&c| c <= col);
        self.cols.get(idx).copied()
    }

    /// Last included column strictly to the left of `col`
    pub fn prev_before(&self, col: usize) -> Option<usize> {
        let idx = self.cols.partition_point(|&c| c < col);
        idx.checked_sub(1).map(|i| self.cols[i])
    }

    /// Included columns within `lo..=hi`
    pub fn in_range(&self, lo: usize, hi: usize) -> &[usize] {
        if lo > hi {
            return &[];
        }
        let start = self.cols.partition_point(|&c| c < lo);
        let end = self.cols.partition_point(|&c| c <= hi);
        &self.cols[start..end]
    }

    /// Nearest included column to `col`, preferring the left side on ties
    pub fn nearest(&self, col: usize) -> Option<usize> {
        if self.contains(col) {
            return Some(col);
        }
        match (self.prev_before(col), self.next_after(col)) {
            (Some(l), Some(r)) => Some(if col - l <= r - col { l } else { r }),
            (l, r) => l.or(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_and_dedups() {
        let cols = IncludedColumns::new(vec![4, 1, 4, 0]);
        assert_eq!(cols.as_slice(), &[0, 1, 4]);
        assert_eq!(cols.len(), 3);
    }

    #[test]
    fn test_from_mapping() {
        let mut mapping = BTreeMap::new();
        mapping.insert(0, ColumnMapping::new("name", true));
        mapping.insert(1, ColumnMapping::new("notes", false));
        mapping.insert(3, ColumnMapping::new("email", true));

        let cols = IncludedColumns::from_mapping(&mapping);
        assert_eq!(cols.as_slice(), &[0, 3]);
        assert!(cols.contains(3));
        assert!(!cols.contains(1));
    }

    #[test]
    fn test_stepping() {
        let cols = IncludedColumns::new(vec![0, 2, 5]);
        assert_eq!(cols.next_after(0), Some(2));
        assert_eq!(cols.next_after(3), Some(5));
        assert_eq!(cols.next_after(5), None);
        assert_eq!(cols.prev_before(5), Some(2));
        assert_eq!(cols.prev_before(1), Some(0));
        assert_eq!(cols.prev_before(0), None);
    }

    #[test]
    fn test_in_range() {
        let cols = IncludedColumns::new(vec![0, 2, 5, 7]);
        assert_eq!(cols.in_range(1, 5), &[2, 5]);
        assert_eq!(cols.in_range(3, 4), &[] as &[usize]);
        assert_eq!(cols.in_range(5, 1), &[] as &[usize]);
    }

    #[test]
    fn test_nearest() {
        let cols = IncludedColumns::new(vec![1, 6]);
        assert_eq!(cols.nearest(1), Some(1));
        assert_eq!(cols.nearest(3), Some(1));
        assert_eq!(cols.nearest(5), Some(6));
        assert_eq!(cols.nearest(9), Some(6));
        assert_eq!(IncludedColumns::default().nearest(0), None);
    }

    #[test]
    fn test_serialization() {
        let cols = IncludedColumns::new(vec![3, 1]);
        let json = serde_json::to_string(&cols).unwrap();
        assert_eq!(json, "[1,3]");
        let back: IncludedColumns = serde_json::from_str("[3,1,1]").unwrap();
        assert_eq!(back, cols);
    }
}
