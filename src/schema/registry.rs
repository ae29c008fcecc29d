use super::{Model, TableDef};

/// The set of tables a store creates and serves.
///
/// Built once at startup and handed to [`crate::store::Store::open`].
#[derive(Debug, Default, Clone)]
pub struct Registry {
    tables: Vec<&'static TableDef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `M`'s table. A table name that is already present is ignored.
    pub fn register<M: Model>(mut self) -> Self {
        self.add(M::TABLE);
        self
    }

    pub fn add(&mut self, table: &'static TableDef) {
        if self.table(table.name()).is_none() {
            self.tables.push(table);
        }
    }

    pub fn tables(&self) -> &[&'static TableDef] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&'static TableDef> {
        self.tables.iter().copied().find(|t| t.name() == name)
    }

    /// Every CREATE TABLE / CREATE INDEX statement, in registration order.
    pub fn create_all_sql(&self) -> Vec<String> {
        self.tables
            .iter()
            .flat_map(|t| std::iter::once(t.create_table_sql()).chain(t.create_index_sql()))
            .collect()
    }
}
