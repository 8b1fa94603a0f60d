pub mod config;
mod check_data;
mod fix;
mod rewrite;

pub use check_data::check_data;
pub use fix::{FixRequest, fix, prepare_work_dir, run};
pub use rewrite::rewrite;
