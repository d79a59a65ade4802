// src/job/mod.rs

//! Job data model: requests (with their secret), summaries and certificates.

pub mod certificate;
pub mod request;

pub use certificate::{Certificate, CertificateStatus};
pub use request::{Credential, JobRequest, JobSummary};
