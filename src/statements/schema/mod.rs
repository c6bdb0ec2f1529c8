//! Column and constraint model used by the DDL providers

pub mod column;
pub mod constraint;

pub use column::{Column, ColumnType, DataType, DataTypeParameter};
pub(crate) use column::KeyPlacement;
pub use constraint::{ConstraintKind, ForeignKey, ReferentialAction, TableConstraint};
