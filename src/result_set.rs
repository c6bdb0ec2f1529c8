//! Cursor over fetched rows handed to `on_result` callbacks

use crate::database::types::SqlValue;
use indexmap::IndexMap;
use std::fmt;

/// One fetched row, columns in result order
pub type Row = IndexMap<String, SqlValue>;

/// Where the cursor currently points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorPosition {
    #[default]
    BeforeFirst,
    At(usize),
    AfterLast,
}

/// Rows returned by a SELECT (or row-returning custom statement)
///
/// The cursor starts before the first row. `next*` methods advance one row,
/// `for_each*` methods consume the remaining rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<Row>,
    position: CursorPosition,
}

impl ResultSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            position: CursorPosition::BeforeFirst,
        }
    }

    fn advance(&mut self) -> Option<usize> {
        let next = match self.position {
            CursorPosition::BeforeFirst => 0,
            CursorPosition::At(i) => i + 1,
            CursorPosition::AfterLast => return None,
        };
        if next < self.rows.len() {
            self.position = CursorPosition::At(next);
            Some(next)
        } else {
            self.position = CursorPosition::AfterLast;
            None
        }
    }

    /// Advance one row and hand it to `consumer`. Returns false at the end.
    pub fn next<F>(&mut self, consumer: F) -> bool
    where
        F: FnOnce(&Row),
    {
        match self.advance() {
            Some(i) => {
                consumer(&self.rows[i]);
                true
            }
            None => false,
        }
    }

    /// Like [`next`](Self::next), calling `empty` when no row is left
    pub fn next_or_else<F, E>(&mut self, consumer: F, empty: E) -> bool
    where
        F: FnOnce(&Row),
        E: FnOnce(),
    {
        let found = self.next(consumer);
        if !found {
            empty();
        }
        found
    }

    /// Advance one row with a fallible consumer; its error goes to `on_error`
    pub fn try_next<F, H, Err>(&mut self, consumer: F, on_error: H) -> bool
    where
        F: FnOnce(&Row) -> std::result::Result<(), Err>,
        H: FnOnce(Err),
    {
        match self.advance() {
            Some(i) => {
                if let Err(err) = consumer(&self.rows[i]) {
                    on_error(err);
                }
                true
            }
            None => false,
        }
    }

    /// Hand every remaining row to `consumer`, returning how many were seen
    pub fn for_each<F>(&mut self, mut consumer: F) -> usize
    where
        F: FnMut(&Row),
    {
        let mut seen = 0;
        while let Some(i) = self.advance() {
            consumer(&self.rows[i]);
            seen += 1;
        }
        seen
    }

    /// Like [`for_each`](Self::for_each); `empty` fires only when no row was seen
    pub fn for_each_or_else<F, E>(&mut self, consumer: F, empty: E) -> usize
    where
        F: FnMut(&Row),
        E: FnOnce(),
    {
        let seen = self.for_each(consumer);
        if seen == 0 {
            empty();
        }
        seen
    }

    /// Iterate with a fallible consumer, logging each error and continuing
    pub fn try_for_each<F, Err>(&mut self, consumer: F) -> usize
    where
        F: FnMut(&Row) -> std::result::Result<(), Err>,
        Err: fmt::Display,
    {
        self.try_for_each_with(consumer, |err| {
            log::warn!("Result row consumer failed: {}", err);
        })
    }

    /// Iterate with a fallible consumer, routing errors to `on_error`
    pub fn try_for_each_with<F, H, Err>(&mut self, mut consumer: F, mut on_error: H) -> usize
    where
        F: FnMut(&Row) -> std::result::Result<(), Err>,
        H: FnMut(Err),
    {
        let mut seen = 0;
        while let Some(i) = self.advance() {
            if let Err(err) = consumer(&self.rows[i]) {
                on_error(err);
            }
            seen += 1;
        }
        seen
    }

    /// Whether the set holds no row; the cursor is left where it was
    pub fn is_empty(&mut self) -> bool {
        let saved = self.position;
        self.position = CursorPosition::BeforeFirst;
        let empty = self.advance().is_none();
        self.position = saved;
        empty
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    /// Rewind so the next `next` returns the first row
    pub fn before_first(&mut self) {
        self.position = CursorPosition::BeforeFirst;
    }

    /// Move to the first row and return it
    pub fn first(&mut self) -> Option<&Row> {
        self.before_first();
        let i = self.advance()?;
        self.rows.get(i)
    }

    pub fn current(&self) -> Option<&Row> {
        match self.position {
            CursorPosition::At(i) => self.rows.get(i),
            _ => None,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl From<Vec<Row>> for ResultSet {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: i32) -> ResultSet {
        ResultSet::new(
            (1..=n)
                .map(|i| {
                    let mut row = Row::new();
                    row.insert("id".to_string(), SqlValue::Int(i));
                    row
                })
                .collect(),
        )
    }

    fn id(row: &Row) -> i64 {
        row.get("id").and_then(SqlValue::as_i64).unwrap()
    }

    #[test]
    fn test_next_walks_the_cursor() {
        let mut set = rows(2);
        let mut seen = Vec::new();
        assert!(set.next(|row| seen.push(id(row))));
        assert_eq!(set.position(), CursorPosition::At(0));
        assert!(set.next(|row| seen.push(id(row))));
        assert!(!set.next(|row| seen.push(id(row))));
        assert_eq!(set.position(), CursorPosition::AfterLast);
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_for_each_or_else_empty_fires_once() {
        let mut empty_calls = 0;
        let seen = ResultSet::default().for_each_or_else(|_| {}, || empty_calls += 1);
        assert_eq!(seen, 0);
        assert_eq!(empty_calls, 1);

        let mut set = rows(3);
        let mut ids = Vec::new();
        let seen = set.for_each_or_else(|row| ids.push(id(row)), || panic!("not empty"));
        assert_eq!(seen, 3);
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_next_or_else() {
        let mut set = ResultSet::default();
        let mut empty = false;
        assert!(!set.next_or_else(|_| {}, || empty = true));
        assert!(empty);
    }

    #[test]
    fn test_try_variants_route_errors() {
        let mut set = rows(3);
        let mut errors = Vec::new();
        let seen = set.try_for_each_with(
            |row| if id(row) == 2 { Err("bad row") } else { Ok(()) },
            |err| errors.push(err),
        );
        assert_eq!(seen, 3);
        assert_eq!(errors, vec!["bad row"]);

        set.before_first();
        let mut failed = false;
        assert!(set.try_next(|_| Err(()), |_| failed = true));
        assert!(failed);

        set.before_first();
        assert_eq!(set.try_for_each(|_| Err::<(), _>("logged")), 3);
    }

    #[test]
    fn test_is_empty_restores_position() {
        let mut set = rows(2);
        set.next(|_| {});
        assert!(!set.is_empty());
        assert_eq!(set.position(), CursorPosition::At(0));
        assert!(ResultSet::default().is_empty());
    }

    #[test]
    fn test_first_and_current() {
        let mut set = rows(2);
        assert!(set.current().is_none());
        set.for_each(|_| {});
        assert_eq!(set.first().map(id), Some(1));
        assert_eq!(set.current().map(id), Some(1));
        assert_eq!(set.len(), 2);
        assert_eq!(set.into_rows().len(), 2);
    }
}
