//! merge raw OBC logs of free running submarine models into full scale STD records

pub mod calibration;
pub mod codes;
pub mod config;
pub mod consistency;
pub mod datareader;
pub mod merge;
pub mod stdfile;

mod error;
pub use error::Error;

pub use calibration::CalibrationStore;
pub use config::Config;
pub use merge::{merge, merge_files, MergeOutput, MergeStats};
pub use stdfile::RunRecord;
