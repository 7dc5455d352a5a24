use serde::{Deserialize, Serialize};

/// Metadata for a single table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub columns: Vec<Column>,
}

/// Metadata for a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub type_name: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub ordinal_position: i32,
}

/// The shape of a relationship between two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Many-to-one: the source table carries the foreign key.
    M2o,
    /// One-to-many: mirror of `M2o`, seen from the referenced table.
    O2m,
    /// One-to-one: a foreign key whose columns are covered by a unique key.
    O2o,
    /// Many-to-many via a junction table.
    M2m,
}

/// The junction table backing an `m2m` relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub schema: String,
    pub table: String,
    /// Junction columns referencing the source side.
    pub source_columns: Vec<String>,
    /// Junction columns referencing the target side.
    pub target_columns: Vec<String>,
    /// Constraint name of the junction FK pointing at the source.
    pub source_constraint: String,
    /// Constraint name of the junction FK pointing at the target.
    pub target_constraint: String,
}

/// A directed relationship from a source table to a target table.
///
/// Source and target column lists are paired by position when building join
/// conditions. `junction` is present exactly when `cardinality` is `M2m`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub constraint: String,
    pub source_schema: String,
    pub source_table: String,
    pub source_columns: Vec<String>,
    pub target_schema: String,
    pub target_table: String,
    pub target_columns: Vec<String>,
    pub cardinality: Cardinality,
    pub junction: Option<Junction>,
}

impl Relationship {
    /// True when `hint` names this relationship's constraint, one of its
    /// join columns, or one of its junction constraints.
    pub fn matches_hint(&self, hint: &str) -> bool {
        if self.constraint == hint {
            return true;
        }
        if self.source_columns.iter().any(|c| c == hint)
            || self.target_columns.iter().any(|c| c == hint)
        {
            return true;
        }
        match &self.junction {
            Some(j) => j.source_constraint == hint || j.target_constraint == hint,
            None => false,
        }
    }
}
