pub mod icons;
pub mod summary;

pub use summary::{print_report, print_task_list};
