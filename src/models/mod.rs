pub mod monthly;
pub mod scan;

pub use monthly::{MonthBucket, MonthKey, MonthlyMap};
pub use scan::{PageResult, ScanRequest, ScanState};
