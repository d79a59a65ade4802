// src/job/request.rs

use std::fmt;

use secrecy::zeroize::Zeroizing;
use secrecy::{ExposeSecret, SecretString};

use crate::errors::JobError;
use crate::types::{JobKind, WipeMethod};

/// Elevation secret handed to the privileged process on its first stdin line.
///
/// Never logged: `Debug` is redacted, and the backing memory is zeroed when
/// the value is dropped (right after it has been written to the process).
pub struct Credential(SecretString);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(SecretString::from(secret.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// Consume the credential into the newline-terminated line written to
    /// the process. The buffer is zeroed when dropped.
    pub fn into_stdin_line(self) -> Zeroizing<Vec<u8>> {
        let secret = self.0.expose_secret().as_bytes();
        let mut line = Zeroizing::new(Vec::with_capacity(secret.len() + 1));
        line.extend_from_slice(secret);
        line.push(b'\n');
        line
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Everything about a job that may be logged and written to a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub kind: JobKind,
    pub device: Option<String>,
    pub method: Option<WipeMethod>,
}

/// A submitted job as it sits in its slot until a subscriber attaches.
#[derive(Debug)]
pub struct JobRequest {
    pub kind: JobKind,
    /// Device name without the `/dev/` prefix, e.g. `sdb`. Wipe only.
    pub target: Option<String>,
    /// Wipe only.
    pub method: Option<WipeMethod>,
    pub credential: Option<Credential>,
}

impl JobRequest {
    pub fn wipe(target: impl Into<String>, method: WipeMethod, credential: Credential) -> Self {
        Self {
            kind: JobKind::Wipe,
            target: Some(target.into()),
            method: Some(method),
            credential: Some(credential),
        }
    }

    pub fn factory_reset(credential: Credential) -> Self {
        Self {
            kind: JobKind::FactoryReset,
            target: None,
            method: None,
            credential: Some(credential),
        }
    }

    /// Check that the fields required by `kind` are present and non-empty.
    pub fn validate(&self) -> Result<(), JobError> {
        let has_credential = self.credential.as_ref().is_some_and(|c| !c.is_empty());

        match self.kind {
            JobKind::Wipe => {
                let has_target = self.target.as_deref().is_some_and(|t| !t.trim().is_empty());
                if !has_target || self.method.is_none() || !has_credential {
                    return Err(JobError::InvalidRequest("Missing fields".to_string()));
                }
                if self.target.as_deref().is_some_and(|t| t.contains('/')) {
                    return Err(JobError::InvalidRequest(
                        "device must be a bare device name such as \"sdb\"".to_string(),
                    ));
                }
            }
            JobKind::FactoryReset => {
                if !has_credential {
                    return Err(JobError::InvalidRequest("Missing sudoPassword".to_string()));
                }
            }
        }
        Ok(())
    }

    /// Split into the loggable summary and the secret.
    pub fn into_parts(self) -> (JobSummary, Option<Credential>) {
        let summary = JobSummary {
            kind: self.kind,
            device: self.target,
            method: match self.kind {
                JobKind::Wipe => self.method,
                JobKind::FactoryReset => None,
            },
        };
        (summary, self.credential)
    }
}
