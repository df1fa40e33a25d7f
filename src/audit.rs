//! Tamper-evident audit trail of gateway decisions.
//!
//! Every gated action appends one entry to `.journal/audit.jsonl`. Each
//! entry carries the SHA-256 hash of its predecessor, so editing or removing
//! a line breaks the chain and [`AuditLogger::verify`] reports where.
//!
//! # Example
//!
//! ```rust,no_run
//! use journal_authz::audit::{AuditLogger, AuditOutcome};
//! use std::path::PathBuf;
//!
//! let logger = AuditLogger::new(PathBuf::from("."))?;
//! logger.log_decision(
//!     "ada@example.org",
//!     "article.update",
//!     "article.UPDATE",
//!     Some("art-1"),
//!     AuditOutcome::Allowed,
//!     None,
//! )?;
//! assert!(logger.verify()?.is_valid);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// Directory (relative to the data dir) holding journal state.
pub const JOURNAL_DIR: &str = ".journal";

/// How a gated action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The checker allowed the action and the store applied it.
    Allowed,
    /// The checker denied the action.
    Denied,
    /// The action was allowed (or not yet checked) but rejected by a guard,
    /// e.g. resource not found or deletion of an assigned role.
    Rejected,
    /// An unexpected error aborted the action.
    Failed,
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Allowed => "allowed",
            Self::Denied => "denied",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One line of the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    /// Email of the acting user, or `anonymous`.
    pub actor: String,
    /// Gateway action name, e.g. `article.update`.
    pub action: String,
    /// Permission key the action was checked against.
    pub permission: String,
    pub resource_id: Option<String>,
    pub outcome: AuditOutcome,
    /// Denial reason or error summary.
    pub detail: Option<String>,
    /// Hash of the previous entry, or of the genesis marker for the first.
    pub previous_hash: String,
    /// Hash over every other field.
    pub hash: String,
}

impl AuditEntry {
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sequence.to_le_bytes());
        hasher.update(self.timestamp.to_rfc3339().as_bytes());
        hasher.update(self.actor.as_bytes());
        hasher.update(self.action.as_bytes());
        hasher.update(self.permission.as_bytes());
        hasher.update(self.resource_id.as_deref().unwrap_or_default().as_bytes());
        hasher.update(self.outcome.to_string().as_bytes());
        hasher.update(self.detail.as_deref().unwrap_or_default().as_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hex::encode(hasher.finalize())
    }

    #[must_use]
    pub fn verify_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// Size-based rotation of the audit file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationConfig {
    /// Rotate once the live file reaches this size (default: 10MB).
    pub max_size_bytes: u64,
    /// Rotated files to keep (default: 10).
    pub max_files: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 10 * 1024 * 1024,
            max_files: 10,
        }
    }
}

/// Result of verifying the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_valid: bool,
    pub entries_verified: u64,
    pub first_invalid_entry: Option<u64>,
    pub error_description: Option<String>,
}

impl VerificationResult {
    #[must_use]
    pub fn valid(entries_verified: u64) -> Self {
        Self {
            is_valid: true,
            entries_verified,
            first_invalid_entry: None,
            error_description: None,
        }
    }

    #[must_use]
    pub fn invalid(entries_verified: u64, invalid_entry: u64, error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            entries_verified,
            first_invalid_entry: Some(invalid_entry),
            error_description: Some(error.into()),
        }
    }
}

const GENESIS_MARKER: &str = "journal-authz-audit-genesis-v1";

/// Append-only, hash-chained audit logger.
#[derive(Debug)]
pub struct AuditLogger {
    data_dir: PathBuf,
    rotation_config: RotationConfig,
}

impl AuditLogger {
    /// Create a logger rooted at `data_dir`, creating `.journal/` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the audit directory cannot be created.
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        Self::with_rotation(data_dir, RotationConfig::default())
    }

    /// # Errors
    ///
    /// Returns an error if the audit directory cannot be created.
    pub fn with_rotation(data_dir: PathBuf, rotation_config: RotationConfig) -> Result<Self> {
        let logger = Self {
            data_dir,
            rotation_config,
        };
        logger.ensure_dir()?;
        Ok(logger)
    }

    /// Path of the live audit file.
    pub fn audit_file(&self) -> PathBuf {
        self.audit_dir().join("audit.jsonl")
    }

    fn audit_dir(&self) -> PathBuf {
        self.data_dir.join(JOURNAL_DIR)
    }

    fn ensure_dir(&self) -> Result<()> {
        let dir = self.audit_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).context("Failed to create audit directory")?;
        }
        Ok(())
    }

    /// Append an entry for one gateway decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read, rotated or written.
    pub fn log_decision(
        &self,
        actor: &str,
        action: &str,
        permission: &str,
        resource_id: Option<&str>,
        outcome: AuditOutcome,
        detail: Option<&str>,
    ) -> Result<AuditEntry> {
        self.maybe_rotate()?;

        let last = self.read_entries()?.pop();
        let sequence = last.as_ref().map(|e| e.sequence + 1).unwrap_or(0);
        let previous_hash = last.map(|e| e.hash).unwrap_or_else(compute_genesis_hash);

        let mut entry = AuditEntry {
            sequence,
            timestamp: Utc::now(),
            actor: actor.to_string(),
            action: action.to_string(),
            permission: permission.to_string(),
            resource_id: resource_id.map(str::to_string),
            outcome,
            detail: detail.map(str::to_string),
            previous_hash,
            hash: String::new(),
        };
        entry.hash = entry.compute_hash();

        self.write_entry(&entry)?;
        Ok(entry)
    }

    fn write_entry(&self, entry: &AuditEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.audit_file())
            .context("Failed to open audit file")?;

        let json = serde_json::to_string(entry).context("Failed to serialize audit entry")?;
        writeln!(file, "{}", json).context("Failed to write audit entry")?;
        Ok(())
    }

    /// Read every entry of the live file.
    ///
    /// # Errors
    ///
    /// Returns an error if the audit file cannot be read or parsed.
    pub fn read_entries(&self) -> Result<Vec<AuditEntry>> {
        let file_path = self.audit_file();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path).context("Failed to open audit file")?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from audit file")?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse audit entry at line {}", line_num + 1))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// The last `n` entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the audit log cannot be read.
    pub fn tail(&self, n: usize) -> Result<Vec<AuditEntry>> {
        let entries = self.read_entries()?;
        let skip = entries.len().saturating_sub(n);
        Ok(entries.into_iter().skip(skip).collect())
    }

    /// Entries with the given outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the audit log cannot be read.
    pub fn entries_with_outcome(&self, outcome: AuditOutcome) -> Result<Vec<AuditEntry>> {
        Ok(self
            .read_entries()?
            .into_iter()
            .filter(|e| e.outcome == outcome)
            .collect())
    }

    /// Verify sequence numbers, entry hashes and the chain links.
    ///
    /// # Errors
    ///
    /// Returns an error if the audit log cannot be read.
    pub fn verify(&self) -> Result<VerificationResult> {
        let entries = self.read_entries()?;
        let genesis = compute_genesis_hash();

        for (i, entry) in entries.iter().enumerate() {
            if entry.sequence != i as u64 {
                return Ok(VerificationResult::invalid(
                    i as u64,
                    entry.sequence,
                    format!("Sequence mismatch: expected {}, got {}", i, entry.sequence),
                ));
            }

            if !entry.verify_hash() {
                return Ok(VerificationResult::invalid(
                    i as u64,
                    entry.sequence,
                    "Entry hash verification failed",
                ));
            }

            let expected_previous = if i == 0 { &genesis } else { &entries[i - 1].hash };
            if entry.previous_hash != *expected_previous {
                return Ok(VerificationResult::invalid(
                    i as u64,
                    entry.sequence,
                    "Chain hash mismatch: previous_hash doesn't match",
                ));
            }
        }

        Ok(VerificationResult::valid(entries.len() as u64))
    }

    fn maybe_rotate(&self) -> Result<()> {
        let file_path = self.audit_file();
        if !file_path.exists() {
            return Ok(());
        }
        if fs::metadata(&file_path)?.len() >= self.rotation_config.max_size_bytes {
            self.rotate()?;
        }
        Ok(())
    }

    /// Move the live file aside and prune old rotations.
    ///
    /// The next entry starts a fresh chain from the genesis hash.
    ///
    /// # Errors
    ///
    /// Returns an error if rotation fails.
    pub fn rotate(&self) -> Result<()> {
        let file_path = self.audit_file();
        if !file_path.exists() {
            return Ok(());
        }

        let rotated_name = format!("audit_{}.jsonl", Utc::now().format("%Y%m%d_%H%M%S%.3f"));
        fs::rename(&file_path, self.audit_dir().join(rotated_name))
            .context("Failed to rotate audit file")?;

        self.cleanup_old_files()
    }

    fn rotated_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(self.audit_dir())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("audit_") && n.ends_with(".jsonl"))
                    .unwrap_or(false)
            })
            .collect();
        // Newest first.
        files.sort_by(|a, b| b.cmp(a));
        Ok(files)
    }

    fn cleanup_old_files(&self) -> Result<()> {
        for path in self
            .rotated_files()?
            .iter()
            .skip(self.rotation_config.max_files as usize)
        {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the audit log cannot be read.
    pub fn entry_count(&self) -> Result<u64> {
        Ok(self.read_entries()?.len() as u64)
    }
}

fn compute_genesis_hash() -> String {
    let mut hasher = Sha256::new();
    hasher.update(GENESIS_MARKER.as_bytes());
    hex::encode(hasher.finalize())
}
