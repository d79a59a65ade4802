// src/job/certificate.rs

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::JobSummary;
use crate::types::WipeMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CertificateStatus {
    Success,
    Failed,
}

/// Terminal record of a job: journaled and sent as the `done` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<WipeMethod>,
    pub status: CertificateStatus,
    /// UTC instant, RFC 3339 with millisecond precision.
    pub timestamp: String,
}

impl Certificate {
    /// Issue a certificate stamped with the current time.
    pub fn issue(summary: &JobSummary, status: CertificateStatus) -> Self {
        Self {
            mode: summary.kind.mode_label().to_string(),
            device: summary.device.clone(),
            method: summary.method,
            status,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn with_status(mut self, status: CertificateStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == CertificateStatus::Success
    }
}
