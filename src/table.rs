//! The sparse table model.
//!
//! [`FlexTable`] is an ordered sequence of heterogeneous rows. Each row is
//! an insertion-ordered map from column name to text value, and rows need
//! not share key sets. The table tracks the union of all columns observed
//! across its rows, in first-seen order.
//!
//! ## Why IndexMap?
//!
//! Rows use [`IndexMap`] instead of `HashMap` so that column order is
//! deterministic: dialect writers emit columns in first-seen order, and the
//! column union is reproducible across runs.
//!
//! ## Equality and hashing
//!
//! Two tables are equal iff they have the same length and, position by
//! position, equal sets of `(column, value)` pairs — row order matters,
//! per-row column order does not. Hashing is additionally insensitive to
//! *meaningless* columns (columns empty in every row), so a table gains no
//! new hash by acquiring an always-empty column.
//!
//! ## Examples
//!
//! ```rust
//! use tabcase::{row, FlexTable};
//!
//! let mut table = FlexTable::new();
//! table.append(row! {"col1" => "value1", "col2" => "2"});
//! assert_eq!(table.columns(), vec!["col1", "col2"]);
//! assert!(table.contains(&row! {"col2" => "> 1"}));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::query::RowQuery;

/// A single table row: an insertion-ordered mapping from column name to
/// text value.
pub type Row = IndexMap<String, String>;

/// An ordered collection of heterogeneous rows.
#[derive(Debug, Clone, Default)]
pub struct FlexTable {
    rows: Vec<Row>,
}

impl FlexTable {
    /// Creates an empty table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabcase::FlexTable;
    ///
    /// let table = FlexTable::new();
    /// assert_eq!(table.len(), 0);
    /// assert!(table.columns().is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        FlexTable::default()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The ordered union of all columns observed across rows, first-seen
    /// order.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// The rows as a slice.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// A single row by index.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// A mutable reference to a single row.
    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    /// Replaces the row at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set_row(&mut self, index: usize, row: Row) {
        self.rows[index] = row;
    }

    /// A new table holding the rows of the given range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabcase::{row, FlexTable};
    ///
    /// let table = FlexTable::from(vec![row! {"a" => "1"}, row! {"a" => "2"}]);
    /// assert_eq!(table.slice(0..1).len(), 1);
    /// ```
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> FlexTable {
        FlexTable {
            rows: self.rows[range].to_vec(),
        }
    }

    /// The values of one column, row by row; rows lacking the column yield
    /// an empty string.
    #[must_use]
    pub fn column(&self, name: &str) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(name).cloned().unwrap_or_default())
            .collect()
    }

    /// Assigns per-row values to a column. Values beyond the row count are
    /// ignored; rows beyond the value count keep their current cell.
    pub fn set_column<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(name.to_string(), value.into());
        }
    }

    /// Assigns one value to a column in every row.
    pub fn fill_column(&mut self, name: &str, value: &str) {
        for row in &mut self.rows {
            row.insert(name.to_string(), value.to_string());
        }
    }

    /// Deletes a column from every row; rows lacking it are untouched.
    pub fn remove_column(&mut self, name: &str) {
        for row in &mut self.rows {
            row.shift_remove(name);
        }
    }

    /// Appends a row.
    pub fn append(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Inserts a row at `index`, shifting later rows.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, row: Row) {
        self.rows.insert(index, row);
    }

    /// Removes and returns the last row.
    pub fn pop(&mut self) -> Option<Row> {
        self.rows.pop()
    }

    /// Removes and returns the row at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_row(&mut self, index: usize) -> Row {
        self.rows.remove(index)
    }

    /// Removes the first row equal to the given one. Returns `false` if no
    /// row matched.
    pub fn remove(&mut self, row: &Row) -> bool {
        match self.rows.iter().position(|r| r == row) {
            Some(index) => {
                self.rows.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Tests whether any row matches the partial-row pattern.
    ///
    /// Pattern values are parsed as query strings, so `"> 1"` is a
    /// comparison and a bare value is an equality test.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabcase::{row, FlexTable};
    ///
    /// let table = FlexTable::from(vec![row! {"col1" => "value1", "col2" => "2"}]);
    /// assert!(table.contains(&row! {"col1" => "value1"}));
    /// assert!(table.contains(&row! {"col1" => "< value2"}));
    /// assert!(!table.contains(&row! {"col1" => "> value2"}));
    /// ```
    #[must_use]
    pub fn contains(&self, pattern: &Row) -> bool {
        self.contains_where(&RowQuery::from_pattern(pattern))
    }

    /// Tests whether any row matches an explicit [`RowQuery`].
    #[must_use]
    pub fn contains_where(&self, query: &RowQuery) -> bool {
        self.rows.iter().any(|row| query.matches(row))
    }

    /// Counts the rows matching the partial-row pattern.
    #[must_use]
    pub fn count(&self, pattern: &Row) -> usize {
        self.count_where(&RowQuery::from_pattern(pattern))
    }

    /// Counts the rows matching an explicit [`RowQuery`].
    #[must_use]
    pub fn count_where(&self, query: &RowQuery) -> usize {
        self.rows.iter().filter(|row| query.matches(row)).count()
    }

    /// Index of the first row matching the partial-row pattern.
    #[must_use]
    pub fn index_of(&self, pattern: &Row) -> Option<usize> {
        self.index_where(&RowQuery::from_pattern(pattern))
    }

    /// Index of the first row matching an explicit [`RowQuery`].
    #[must_use]
    pub fn index_where(&self, query: &RowQuery) -> Option<usize> {
        self.rows.iter().position(|row| query.matches(row))
    }

    /// A new table with the rows matching the pattern, in order.
    #[must_use]
    pub fn filter(&self, pattern: &Row) -> FlexTable {
        let query = RowQuery::from_pattern(pattern);
        FlexTable {
            rows: self
                .rows
                .iter()
                .filter(|row| query.matches(row))
                .cloned()
                .collect(),
        }
    }

    /// A new table with rows sorted by the given key, stable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabcase::{row, FlexTable};
    ///
    /// let table = FlexTable::from(vec![
    ///     row! {"Action" => "Trade"},
    ///     row! {"Action" => "Quote"},
    /// ]);
    /// let sorted = table.sorted_by_key(|row| row.get("Action").cloned());
    /// assert_eq!(sorted.row(0).unwrap()["Action"], "Quote");
    /// ```
    #[must_use]
    pub fn sorted_by_key<K, F>(&self, mut key: F) -> FlexTable
    where
        K: Ord,
        F: FnMut(&Row) -> K,
    {
        let mut rows = self.rows.clone();
        rows.sort_by_key(|row| key(row));
        FlexTable { rows }
    }

    /// A new table with the rows in reverse order.
    #[must_use]
    pub fn reversed(&self) -> FlexTable {
        FlexTable {
            rows: self.rows.iter().rev().cloned().collect(),
        }
    }

    /// Iterates over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl PartialEq for FlexTable {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap equality is order-independent, so per-row column order
        // never matters here while row order always does.
        self.rows == other.rows
    }
}

impl Eq for FlexTable {}

impl Hash for FlexTable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rows.len().hash(state);
        for row in &self.rows {
            // Commutative per-row combination keeps the hash independent of
            // column order; skipping empty cells keeps it independent of
            // columns that carry no value anywhere.
            let mut acc: u64 = 0;
            for (column, value) in row {
                if value.is_empty() {
                    continue;
                }
                let mut pair = DefaultHasher::new();
                column.hash(&mut pair);
                value.hash(&mut pair);
                acc = acc.wrapping_add(pair.finish());
            }
            acc.hash(state);
        }
    }
}

impl From<Vec<Row>> for FlexTable {
    fn from(rows: Vec<Row>) -> Self {
        FlexTable { rows }
    }
}

impl FromIterator<Row> for FlexTable {
    fn from_iter<T: IntoIterator<Item = Row>>(iter: T) -> Self {
        FlexTable {
            rows: iter.into_iter().collect(),
        }
    }
}

impl Extend<Row> for FlexTable {
    fn extend<T: IntoIterator<Item = Row>>(&mut self, iter: T) {
        self.rows.extend(iter);
    }
}

impl IntoIterator for FlexTable {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlexTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl Serialize for FlexTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for FlexTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(FlexTable {
            rows: Vec::<Row>::deserialize(deserializer)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn hash_of(table: &FlexTable) -> u64 {
        let mut hasher = DefaultHasher::new();
        table.hash(&mut hasher);
        hasher.finish()
    }

    fn big_table() -> FlexTable {
        (0..100)
            .map(|i| row! {"col1" => format!("value{i}"), "col2" => i.to_string()})
            .collect()
    }

    #[test]
    fn test_initialization() {
        let table = FlexTable::new();
        assert_eq!(table.len(), 0);
        assert!(table.columns().is_empty());
    }

    #[test]
    fn test_append_row() {
        let mut table = FlexTable::new();
        table.append(row! {"col1" => "value1", "col2" => "2"});
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns(), vec!["col1", "col2"]);
    }

    #[test]
    fn test_extend_rows() {
        let mut table = FlexTable::new();
        table.extend(vec![row! {"col1" => "value1"}, row! {"col2" => "2"}]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), vec!["col1", "col2"]);
    }

    #[test]
    fn test_set_row_redefines_columns() {
        let mut table = FlexTable::from(vec![row! {"col1" => "value1", "col2" => "2"}]);
        table.set_row(0, Row::new());
        table.fill_column("col11", "value11");
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns(), vec!["col11"]);
    }

    #[test]
    fn test_row_and_column_access() {
        let table = FlexTable::from(vec![row! {"col1" => "value1", "col2" => "2"}]);
        assert_eq!(table.row(0), Some(&row! {"col1" => "value1", "col2" => "2"}));
        assert_eq!(table.slice(0..1), table);
        assert_eq!(table.column("col1"), vec!["value1"]);
        assert_eq!(table.column("absent"), vec![String::new()]);
    }

    #[test]
    fn test_query_lookup() {
        let table = big_table();
        let result = table.filter(&row! {"col2" => "> 50", "col1" => "<= value70"});
        assert_eq!(result.len(), 20);
        for row in &result {
            assert!(row["col2"].parse::<i64>().unwrap() > 50);
            assert!(row["col1"].as_str() <= "value70");
        }
    }

    #[test]
    fn test_remove_column() {
        let mut table = FlexTable::from(vec![row! {"col1" => "value1", "col2" => "2"}]);
        table.remove_column("col1");
        assert_eq!(table.columns(), vec!["col2"]);
    }

    #[test]
    fn test_remove_row() {
        let mut table = FlexTable::from(vec![row! {"col1" => "value1"}]);
        table.remove_row(0);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_contains() {
        let table = FlexTable::from(vec![row! {"col1" => "value1", "col2" => "2"}]);
        assert!(table.contains(&row! {"col1" => "value1", "col2" => "2"}));
        assert!(!table.contains(&row! {"col1" => "value2", "col2" => "3"}));
        assert!(table.contains(&row! {"col1" => "value1"}));
        assert!(!table.contains(&row! {"col1" => "> value2"}));
        assert!(table.contains(&row! {"col1" => "< value2"}));
        assert!(table.contains(&row! {"col2" => "> 1"}));
    }

    #[test]
    fn test_count() {
        let table = FlexTable::from(vec![
            row! {"Action" => "Quote"},
            row! {"Action" => "Trade"},
            row! {"Action" => "Quote"},
        ]);
        assert_eq!(table.count(&row! {"Action" => "Quote"}), 2);
        assert_eq!(table.count(&row! {"Action" => "Trade"}), 1);
        assert_eq!(table.count(&row! {"Action" => "Nonexistent"}), 0);
    }

    #[test]
    fn test_index_of() {
        let table = FlexTable::from(vec![
            row! {"Action" => "Quote"},
            row! {"Action" => "Trade"},
            row! {"Action" => "Quote"},
        ]);
        assert_eq!(table.index_of(&row! {"Action" => "Quote"}), Some(0));
        assert_eq!(table.index_of(&row! {"Action" => "Trade"}), Some(1));
        assert_eq!(table.index_of(&row! {"Action" => "Nonexistent"}), None);
    }

    #[test]
    fn test_pop_and_remove() {
        let mut table = FlexTable::from(vec![
            row! {"Action" => "Quote"},
            row! {"Action" => "Trade"},
            row! {"Action" => "Quote"},
        ]);
        assert_eq!(table.remove_row(1), row! {"Action" => "Trade"});
        assert_eq!(table.pop(), Some(row! {"Action" => "Quote"}));
        assert_eq!(table.len(), 1);

        let mut table = FlexTable::from(vec![
            row! {"Action" => "Quote"},
            row! {"Action" => "Trade"},
            row! {"Action" => "Quote"},
        ]);
        assert!(table.remove(&row! {"Action" => "Quote"}));
        assert_eq!(table.len(), 2);
        assert_eq!(table.row(0), Some(&row! {"Action" => "Trade"}));
        assert!(!table.remove(&row! {"Action" => "Nonexistent"}));
    }

    #[test]
    fn test_clear() {
        let mut table = big_table();
        table.clear();
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_sort() {
        let empty = FlexTable::new();
        assert_eq!(empty.sorted_by_key(|r| r.len()), empty);

        let table = FlexTable::from(vec![
            row! {"Action" => "Trade"},
            row! {"Action" => "Quote"},
            row! {"Action" => "Quote"},
        ]);
        let sorted = table.sorted_by_key(|row| row.get("Action").cloned());
        assert_eq!(
            sorted,
            FlexTable::from(vec![
                row! {"Action" => "Quote"},
                row! {"Action" => "Quote"},
                row! {"Action" => "Trade"},
            ])
        );
    }

    #[test]
    fn test_reverse() {
        let table = FlexTable::from(vec![
            row! {"Action" => "Quote"},
            row! {"Action" => "Trade"},
        ]);
        let reversed = table.reversed();
        assert_eq!(reversed.row(0), Some(&row! {"Action" => "Trade"}));
        assert_eq!(reversed.row(1), Some(&row! {"Action" => "Quote"}));
    }

    #[test]
    fn test_equality() {
        let table1 = FlexTable::from(vec![row! {"col1" => "value1"}]);
        let table2 = FlexTable::from(vec![row! {"col1" => "value1"}]);
        assert_eq!(table1, table2);

        let table3 = FlexTable::from(vec![row! {"col2" => "value2"}]);
        assert_ne!(table1, table3);
    }

    #[test]
    fn test_equality_ignores_column_order() {
        let table1 = FlexTable::from(vec![row! {"a" => "1", "b" => "2"}]);
        let table2 = FlexTable::from(vec![row! {"b" => "2", "a" => "1"}]);
        assert_eq!(table1, table2);
    }

    #[test]
    fn test_equality_respects_row_order() {
        let table1 = FlexTable::from(vec![row! {"a" => "1"}, row! {"a" => "2"}]);
        let table2 = FlexTable::from(vec![row! {"a" => "2"}, row! {"a" => "1"}]);
        assert_ne!(table1, table2);
    }

    #[test]
    fn test_hash_stable_for_same_table() {
        let table = big_table();
        assert_eq!(hash_of(&table), hash_of(&table.clone()));
    }

    #[test]
    fn test_hash_ignores_meaningless_column() {
        let table = big_table();
        let mut with_meaningless = table.clone();
        with_meaningless.fill_column("meaningless", "");
        assert_eq!(hash_of(&table), hash_of(&with_meaningless));
    }

    #[test]
    fn test_hash_ignores_column_order() {
        let table = big_table();
        let mut swapped = table.clone();
        swapped.set_row(0, row! {"col2" => "0", "col1" => "value0"});
        assert_eq!(hash_of(&table), hash_of(&swapped));
    }

    #[test]
    fn test_hash_differs_for_different_content() {
        let table = big_table();
        let mut changed = table.clone();
        changed.row_mut(0).unwrap().insert("col1".into(), "other".into());
        assert_ne!(hash_of(&table), hash_of(&changed));

        let mut reordered = table.clone();
        let first = reordered.remove_row(0);
        reordered.append(first);
        assert_ne!(hash_of(&table), hash_of(&reordered));
    }

    #[test]
    fn test_serde_round_trip() {
        let table = FlexTable::from(vec![row! {"a" => "1", "b" => ""}, row! {"c" => "3"}]);
        let json = serde_json::to_string(&table).unwrap();
        let back: FlexTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, back);
    }
}
