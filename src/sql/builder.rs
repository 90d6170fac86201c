//! Builds parameterized SELECT, INSERT and UPDATE statements from filter and patch objects.

use crate::sql::BindValue;

/// Table descriptor: name, selectable columns and primary key.
#[derive(Clone, Copy, Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub primary_key: &'static str,
}

/// One condition of a filter. All conditions of a filter are AND-ed.
#[derive(Clone, Debug)]
pub enum Condition {
    Eq(&'static str, BindValue),
    /// Column IS NOT NULL.
    Exists(&'static str),
    /// Column IS NULL.
    Missing(&'static str),
    /// Array column contains the value.
    Contains(&'static str, BindValue),
    /// Column equals any element of the bound array.
    AnyOf(&'static str, BindValue),
}

#[derive(Clone, Debug, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<BindValue>) -> Self {
        self.conditions.push(Condition::Eq(column, value.into()));
        self
    }

    pub fn exists(mut self, column: &'static str) -> Self {
        self.conditions.push(Condition::Exists(column));
        self
    }

    pub fn missing(mut self, column: &'static str) -> Self {
        self.conditions.push(Condition::Missing(column));
        self
    }

    pub fn contains(mut self, column: &'static str, value: impl Into<BindValue>) -> Self {
        self.conditions.push(Condition::Contains(column, value.into()));
        self
    }

    pub fn any_of(mut self, column: &'static str, values: impl Into<BindValue>) -> Self {
        self.conditions.push(Condition::AnyOf(column, values.into()));
        self
    }
}

/// One change of a patch.
#[derive(Clone, Debug)]
pub enum Change {
    Set(&'static str, BindValue),
    /// Set the column to NULL.
    Unset(&'static str),
    /// Append to an array column unless already present.
    AddToSet(&'static str, BindValue),
    /// Remove every occurrence from an array column.
    Pull(&'static str, BindValue),
}

#[derive(Clone, Debug, Default)]
pub struct Patch {
    changes: Vec<Change>,
}

impl Patch {
    pub fn new() -> Self {
        Patch::default()
    }

    pub fn set(mut self, column: &'static str, value: impl Into<BindValue>) -> Self {
        self.changes.push(Change::Set(column, value.into()));
        self
    }

    pub fn set_opt<V: Into<BindValue>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn unset(mut self, column: &'static str) -> Self {
        self.changes.push(Change::Unset(column));
        self
    }

    pub fn add_to_set(mut self, column: &'static str, value: impl Into<BindValue>) -> Self {
        self.changes.push(Change::AddToSet(column, value.into()));
        self
    }

    pub fn pull(mut self, column: &'static str, value: impl Into<BindValue>) -> Self {
        self.changes.push(Change::Pull(column, value.into()));
        self
    }
}

/// Quote identifier for PostgreSQL (identifiers only come from code, never from requests).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn column_list(table: &Table) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(c))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: BindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// WHERE clause (without the keyword) for the filter; "TRUE" when empty.
fn where_clause(filter: &Filter, q: &mut QueryBuf) -> String {
    if filter.conditions.is_empty() {
        return "TRUE".into();
    }
    filter
        .conditions
        .iter()
        .map(|c| match c {
            Condition::Eq(col, v) => {
                let n = q.push_param(v.clone());
                format!("{} = ${}", quoted(col), n)
            }
            Condition::Exists(col) => format!("{} IS NOT NULL", quoted(col)),
            Condition::Missing(col) => format!("{} IS NULL", quoted(col)),
            Condition::Contains(col, v) => {
                let n = q.push_param(v.clone());
                format!("${} = ANY({})", n, quoted(col))
            }
            Condition::AnyOf(col, v) => {
                let n = q.push_param(v.clone());
                format!("{} = ANY(${})", quoted(col), n)
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn set_clause(patch: &Patch, q: &mut QueryBuf) -> String {
    let mut sets: Vec<String> = patch
        .changes
        .iter()
        .map(|c| match c {
            Change::Set(col, v) => {
                let n = q.push_param(v.clone());
                format!("{} = ${}", quoted(col), n)
            }
            Change::Unset(col) => format!("{} = NULL", quoted(col)),
            Change::AddToSet(col, v) => {
                let n = q.push_param(v.clone());
                format!(
                    "{c} = CASE WHEN ${n} = ANY({c}) THEN {c} ELSE array_append({c}, ${n}) END",
                    c = quoted(col),
                    n = n
                )
            }
            Change::Pull(col, v) => {
                let n = q.push_param(v.clone());
                format!("{c} = array_remove({c}, ${n})", c = quoted(col), n = n)
            }
        })
        .collect();
    sets.push(format!("{} = NOW()", quoted("updated_at")));
    sets.join(", ")
}

/// SELECT matching rows, optionally ordered (`column DESC` style, from code) and limited.
pub fn select(table: &Table, filter: &Filter, order_by: Option<&str>, limit: Option<u32>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cond = where_clause(filter, &mut q);
    let mut sql = format!(
        "SELECT {} FROM {} WHERE {}",
        column_list(table),
        quoted(table.name),
        cond
    );
    if let Some(order) = order_by {
        sql.push_str(&format!(" ORDER BY {}", order));
    }
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    q.sql = sql;
    q
}

/// INSERT one row from (column, value) pairs; returns the created row.
pub fn insert(table: &Table, values: &[(&'static str, BindValue)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cols: Vec<String> = values.iter().map(|(c, _)| quoted(c)).collect();
    let placeholders: Vec<String> = values
        .iter()
        .map(|(_, v)| format!("${}", q.push_param(v.clone())))
        .collect();
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(table.name),
        cols.join(", "),
        placeholders.join(", "),
        column_list(table)
    );
    q
}

/// UPDATE the first row matching the filter; returns the updated row.
/// The inner SELECT locks the row so a concurrent update waits for this one.
pub fn update_one(table: &Table, filter: &Filter, patch: &Patch) -> QueryBuf {
    let mut q = QueryBuf::new();
    let sets = set_clause(patch, &mut q);
    let cond = where_clause(filter, &mut q);
    let pk = quoted(table.primary_key);
    let name = quoted(table.name);
    q.sql = format!(
        "UPDATE {name} SET {sets} WHERE {pk} = (SELECT {pk} FROM {name} WHERE {cond} LIMIT 1 FOR UPDATE) RETURNING {cols}",
        name = name,
        sets = sets,
        pk = pk,
        cond = cond,
        cols = column_list(table)
    );
    q
}
