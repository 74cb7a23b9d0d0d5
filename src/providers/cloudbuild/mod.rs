mod client;
mod parse;
mod types;

pub use client::{BuildRequest, CloudBuild};
pub use parse::{JobId, SubmissionReceipt};
pub use types::{BuildJob, JobStatus};
