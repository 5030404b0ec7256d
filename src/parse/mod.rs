pub mod due_date;
pub mod task_input;

pub use due_date::{parse_iso_date, resolve_due_date};
pub use task_input::{ParseError, ParsedTask, parse_task_input};
