pub mod attempt;
pub mod resume;

pub use attempt::{AttemptRecord, ParseStatus, ParsedData};
pub use resume::ResumeRecord;
