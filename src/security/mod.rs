//! Security utilities.
//!
//! The uploader holds exactly one secret, the SAS token, and it travels in
//! every request URL. This module keeps it out of logs.

pub mod redact;

pub use redact::{redact_sas, safe_error_message};
