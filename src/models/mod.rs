pub mod check_queue;
pub mod test_run;
pub mod uploader;

pub use check_queue::CheckQueueItem;
pub use test_run::{NewTestRun, TestRun};
pub use uploader::Uploader;
