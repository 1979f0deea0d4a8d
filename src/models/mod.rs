pub mod cycle;
pub mod table;

pub use cycle::{CycleDefinition, LearningCycle, PositionColumns, UnknownSelector};
pub use table::{CellValue, Row, ShiurId, Table, TableName};
