//! A small query builder over one table.
//!
//! Column names are `&'static str` so only identifiers written in source
//! reach SQL text. Every value is a bound parameter.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::StoreError;
use crate::value::{SqlParam, encode_json};

/// Sort direction for [`Select::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

impl Direction {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Compare {
        column: &'static str,
        operator: &'static str,
        value: Value,
    },
    IsNull(&'static str),
    NotNull(&'static str),
    LikeAny {
        columns: Vec<&'static str>,
        pattern: String,
    },
}

/// A conjunction of predicates.
///
/// # Examples
/// ```
/// use stalela_store::Filter;
///
/// let filter = Filter::new().eq("source", "yep").not_null("latitude");
/// assert_eq!(filter.to_sql().0, " WHERE source = ? AND latitude IS NOT NULL");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// An empty filter matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn compare(mut self, column: &'static str, operator: &'static str, value: &impl SqlParam) -> Self {
        self.predicates.push(Predicate::Compare {
            column,
            operator,
            value: value.to_sql_value(),
        });
        self
    }

    /// `column = value`.
    #[must_use]
    pub fn eq(self, column: &'static str, value: impl SqlParam) -> Self {
        self.compare(column, "=", &value)
    }

    /// `column <> value`.
    #[must_use]
    pub fn neq(self, column: &'static str, value: impl SqlParam) -> Self {
        self.compare(column, "<>", &value)
    }

    /// `column >= value`.
    #[must_use]
    pub fn gte(self, column: &'static str, value: impl SqlParam) -> Self {
        self.compare(column, ">=", &value)
    }

    /// `column <= value`.
    #[must_use]
    pub fn lte(self, column: &'static str, value: impl SqlParam) -> Self {
        self.compare(column, "<=", &value)
    }

    /// `column IS NULL`.
    #[must_use]
    pub fn is_null(mut self, column: &'static str) -> Self {
        self.predicates.push(Predicate::IsNull(column));
        self
    }

    /// `column IS NOT NULL`.
    #[must_use]
    pub fn not_null(mut self, column: &'static str) -> Self {
        self.predicates.push(Predicate::NotNull(column));
        self
    }

    /// Case-insensitive substring match on any of `columns`.
    ///
    /// `%`, `_` and `\` in `needle` match literally.
    #[must_use]
    pub fn ilike_any(mut self, columns: &[&'static str], needle: &str) -> Self {
        self.predicates.push(Predicate::LikeAny {
            columns: columns.to_vec(),
            pattern: format!("%{}%", escape_like(needle)),
        });
        self
    }

    /// `column = value` when `value` is present, nothing otherwise.
    #[must_use]
    pub fn eq_opt<T: SqlParam>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    /// `column >= value` when `value` is present.
    #[must_use]
    pub fn gte_opt<T: SqlParam>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.gte(column, value),
            None => self,
        }
    }

    /// `column <= value` when `value` is present.
    #[must_use]
    pub fn lte_opt<T: SqlParam>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.lte(column, value),
            None => self,
        }
    }

    /// Whether no predicates were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Render as a ` WHERE ...` clause (empty when unfiltered) plus its
    /// parameters in binding order.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        if self.predicates.is_empty() {
            return (String::new(), params);
        }
        let clauses: Vec<String> = self
            .predicates
            .iter()
            .map(|predicate| match predicate {
                Predicate::Compare {
                    column,
                    operator,
                    value,
                } => {
                    params.push(value.clone());
                    format!("{column} {operator} ?")
                }
                Predicate::IsNull(column) => format!("{column} IS NULL"),
                Predicate::NotNull(column) => format!("{column} IS NOT NULL"),
                Predicate::LikeAny { columns, pattern } => {
                    let alternatives: Vec<String> = columns
                        .iter()
                        .map(|column| {
                            params.push(Value::Text(pattern.clone()));
                            format!("{column} LIKE ? ESCAPE '\\'")
                        })
                        .collect();
                    format!("({})", alternatives.join(" OR "))
                }
            })
            .collect();
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// SQLite reads `LIMIT` and `OFFSET` as signed 64-bit integers; larger
/// counts mean "no bound" and are rendered as `i64::MAX`.
fn sql_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// A `SELECT` against one table.
///
/// # Examples
/// ```
/// use stalela_store::{Direction, Filter, Select};
///
/// let select = Select::from("companies")
///     .columns(&["id", "name"])
///     .filter(Filter::new().eq("city", "Durban"))
///     .order_by("name", Direction::Ascending)
///     .limit(10);
/// let (sql, params) = select.to_sql();
/// assert_eq!(
///     sql,
///     "SELECT id, name FROM companies WHERE city = ? ORDER BY name ASC LIMIT 10"
/// );
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: &'static str,
    columns: Option<Vec<&'static str>>,
    distinct: bool,
    filter: Filter,
    order: Vec<(&'static str, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    /// Select every column of `table`.
    #[must_use]
    pub const fn from(table: &'static str) -> Self {
        Self {
            table,
            columns: None,
            distinct: false,
            filter: Filter {
                predicates: Vec::new(),
            },
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Table being queried.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// Restrict the projection to `columns`.
    #[must_use]
    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns = Some(columns.to_vec());
        self
    }

    /// Return each distinct projected row once.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Replace the filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Append a sort key. Earlier keys take precedence.
    #[must_use]
    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order.push((column, direction));
        self
    }

    /// Return at most `limit` rows.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` rows.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render the statement and its parameters.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let (filter_sql, params) = self.filter.to_sql();
        let projection = self
            .columns
            .as_ref()
            .map_or_else(|| String::from("*"), |columns| columns.join(", "));
        let mut sql = format!(
            "SELECT {}{projection} FROM {}{filter_sql}",
            if self.distinct { "DISTINCT " } else { "" },
            self.table,
        );
        if !self.order.is_empty() {
            let keys: Vec<String> = self
                .order
                .iter()
                .map(|(column, direction)| format!("{column} {}", direction.keyword()))
                .collect();
            sql.push_str(&format!(" ORDER BY {}", keys.join(", ")));
        }
        match (self.limit.map(sql_count), self.offset.map(sql_count)) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            (Some(limit), None) => {
                sql.push_str(&format!(" LIMIT {limit}"));
            }
            (None, Some(offset)) => {
                sql.push_str(&format!(" LIMIT -1 OFFSET {offset}"));
            }
            (None, None) => {}
        }
        (sql, params)
    }

    /// Render `SELECT COUNT(*)` over the filtered rows, ignoring
    /// projection, order, limit and offset.
    #[must_use]
    pub fn to_count_sql(&self) -> (String, Vec<Value>) {
        let (filter_sql, params) = self.filter.to_sql();
        (
            format!("SELECT COUNT(*) FROM {}{filter_sql}", self.table),
            params,
        )
    }
}

/// Column assignments for `INSERT`, `UPDATE` and upserts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    pairs: Vec<(&'static str, Value)>,
}

impl Changes {
    /// No assignments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to `column`, replacing any earlier assignment.
    #[must_use]
    pub fn set(mut self, column: &'static str, value: impl SqlParam) -> Self {
        self.put(column, value.to_sql_value());
        self
    }

    /// Assign `value` when present; leave `column` untouched otherwise.
    #[must_use]
    pub fn set_opt<T: SqlParam>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    /// Assign `value` serialised as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] when serialisation fails.
    pub fn set_json<T>(mut self, column: &'static str, value: &T) -> Result<Self, StoreError>
    where
        T: Serialize + ?Sized,
    {
        self.put(column, encode_json(column, value)?);
        Ok(self)
    }

    /// Assign `value` serialised as JSON when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] when serialisation fails.
    pub fn set_json_opt<T: Serialize>(
        self,
        column: &'static str,
        value: Option<&T>,
    ) -> Result<Self, StoreError> {
        match value {
            Some(value) => self.set_json(column, value),
            None => Ok(self),
        }
    }

    /// Assign `value` as JSON, or SQL `NULL` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] when serialisation fails.
    pub fn set_json_or_null<T: Serialize>(
        mut self,
        column: &'static str,
        value: Option<&T>,
    ) -> Result<Self, StoreError> {
        match value {
            Some(value) => self.set_json(column, value),
            None => {
                self.put(column, Value::Null);
                Ok(self)
            }
        }
    }

    /// Patch a nullable JSON column: the outer `None` leaves it untouched,
    /// `Some(None)` clears it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] when serialisation fails.
    pub fn patch_json<T: Serialize>(
        self,
        column: &'static str,
        value: Option<Option<&T>>,
    ) -> Result<Self, StoreError> {
        match value {
            Some(value) => self.set_json_or_null(column, value),
            None => Ok(self),
        }
    }

    fn put(&mut self, column: &'static str, value: Value) {
        match self.pairs.iter_mut().find(|(existing, _)| *existing == column) {
            Some((_, slot)) => *slot = value,
            None => self.pairs.push((column, value)),
        }
    }

    /// Whether no columns are assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Whether `column` is assigned.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.pairs.iter().any(|(existing, _)| *existing == column)
    }

    pub(crate) fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs.iter().map(|(column, _)| *column)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.pairs.iter().map(|(_, value)| value)
    }
}

/// A page of results plus the number of rows matching the filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows in this page.
    pub items: Vec<T>,
    /// Rows matching the filters, ignoring limit and offset.
    pub total: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}
