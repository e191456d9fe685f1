//! Geometry over positioned tokens: grouping words into visual rows and
//! locating the day-of-month header columns.

pub mod columns;
pub mod rows;

pub use columns::{detect_day_columns, DayColumnMap};
pub use rows::{cluster_rows, ClusterMode, Row};
