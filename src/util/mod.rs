#[macro_use]
pub mod run_all;
