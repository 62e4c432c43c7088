pub mod check_queue;
pub mod test_runs;
pub mod uploaders;
