//! Table declarations.
//!
//! A table is plain `const` data: a name plus an ordered list of columns.
//! Nothing here touches a database; [`crate::store::Store`] renders the
//! declarations into DDL and SQLite enforces the constraints on write.

mod registry;

pub use registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    /// Text limited to `max_len` characters.
    String { max_len: usize },
}

impl ColumnType {
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::String { max_len } => format!("VARCHAR({})", max_len),
        }
    }

    pub fn max_len(&self) -> Option<usize> {
        match self {
            ColumnType::Integer => None,
            ColumnType::String { max_len } => Some(*max_len),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub index: bool,
    pub unique: bool,
    pub nullable: bool,
}

impl Column {
    /// Auto-assigned integer id. Indexed, never nullable.
    pub const fn primary_key(name: &'static str) -> Self {
        Self {
            name,
            ty: ColumnType::Integer,
            primary_key: true,
            index: true,
            unique: false,
            nullable: false,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            ty: ColumnType::Integer,
            primary_key: false,
            index: false,
            unique: false,
            nullable: true,
        }
    }

    pub const fn string(name: &'static str, max_len: usize) -> Self {
        Self {
            name,
            ty: ColumnType::String { max_len },
            primary_key: false,
            index: false,
            unique: false,
            nullable: true,
        }
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Whether `value` is within this column's character limit.
    ///
    /// SQLite's `length()` stops at the first NUL, so the rendered CHECK alone
    /// does not bound strings with embedded NULs; writers call this first.
    pub fn fits(&self, value: &str) -> bool {
        self.ty.max_len().map_or(true, |max_len| value.chars().count() <= max_len)
    }

    /// Column clause for `CREATE TABLE`.
    pub fn definition_sql(&self) -> String {
        if self.primary_key {
            // AUTOINCREMENT keeps ids monotonic and never reuses a deleted id.
            return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", self.name);
        }

        let mut sql = format!("{} {}", self.name, self.ty.sql_type());
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(max_len) = self.ty.max_len() {
            sql.push_str(&format!(" CHECK (length({}) <= {})", self.name, max_len));
        }
        sql
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TableDef {
    name: &'static str,
    columns: &'static [Column],
}

impl TableDef {
    pub const fn new(name: &'static str, columns: &'static [Column]) -> Self {
        Self { name, columns }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Non-key column names in declaration order, as used by INSERT/UPDATE.
    pub fn data_columns(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().filter(|c| !c.primary_key).map(|c| c.name)
    }

    pub fn create_table_sql(&self) -> String {
        let body = self
            .columns
            .iter()
            .map(Column::definition_sql)
            .collect::<Vec<_>>()
            .join(",\n    ");
        format!("CREATE TABLE IF NOT EXISTS {} (\n    {}\n)", self.name, body)
    }

    pub fn create_index_sql(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.index)
            .map(|c| {
                format!(
                    "CREATE INDEX IF NOT EXISTS ix_{table}_{col} ON {table} ({col})",
                    table = self.name,
                    col = c.name
                )
            })
            .collect()
    }
}

/// A record type backed by a declared table.
pub trait Model {
    const TABLE: &'static TableDef;
}
