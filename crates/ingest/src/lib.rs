mod parser;
mod paths;
mod pipeline;
mod types;

pub use parser::{bucket_records_from_reader, job_records_from_reader};
pub use paths::{
    AUDIT_DIR_NAME, AUDIT_FILE_PREFIX, UTILIZATION_DIR_NAME, default_data_root, is_audit_file,
    resolve_audit_dir, resolve_utilization_file,
};
pub use pipeline::{load_bucket_records, load_job_records, load_report_inputs};
pub use types::{
    BucketLoad, IngestError, IngestIssue, JobLoad, LoadStats, ParsedBuckets, ReportInputs, Result,
};
