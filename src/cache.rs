//! Persistence of reference profiles.
//!
//! Rebuilding a profile costs far more than aligning one query, so the
//! realized profile can be written to a cache file and reused across runs.
//! The cache is a single JSON document with an explicit format marker and
//! version, the source alignment (ordered sequences), its weights, the
//! profile columns, and a fingerprint of the alignment content.
//!
//! Serialization triggers any outstanding profile computation first, so a
//! written cache always reflects a fully realized profile. Deserialization is
//! a pure parse and never recomputes anything; loading a cache never needs
//! the original FASTA. A cache is refused when its fingerprint does not match
//! the alignment it is attached to, so a stale or foreign profile can never
//! be used silently.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::alignment::{Alignment, AlignmentFingerprint};
use crate::common::ProfalnError;
use crate::profile::{ProfileColumn, SequenceProfile};

/// Marker identifying profile cache files.
pub const CACHE_FORMAT: &str = "profaln-profile-cache";

/// Current cache format version. Incompatible future formats bump this and
/// old readers fail fast instead of misreading.
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheSequence {
    name: String,
    residues: String,
}

/// The parsed form of a profile cache: the source alignment, its weights and
/// realized profile, and the identity fingerprint they were derived from.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheRecord {
    format: String,
    version: u32,
    fingerprint: AlignmentFingerprint,
    sequences: Vec<CacheSequence>,
    weights: Vec<f64>,
    columns: Vec<ProfileColumn>,
}

impl CacheRecord {
    /// The identity token of the alignment this cache was built from.
    pub fn fingerprint(&self) -> AlignmentFingerprint {
        self.fingerprint
    }

    /// Consume the record, yielding the identity token and the profile.
    pub fn into_parts(self) -> (AlignmentFingerprint, SequenceProfile) {
        (
            self.fingerprint,
            SequenceProfile::from_columns(self.columns),
        )
    }

    /// Rebuild the source alignment with the cached weights and profile
    /// attached.
    pub fn into_alignment(self) -> Result<Alignment, ProfalnError> {
        let alignment = Alignment::from_records(
            self.sequences
                .into_iter()
                .map(|s| (s.name, s.residues)),
        )
        .map_err(|err| ProfalnError::CorruptCache(err.to_string()))?;
        if alignment.fingerprint() != self.fingerprint {
            return Err(ProfalnError::CacheMismatch(
                "stored fingerprint does not match the stored sequences".to_string(),
            ));
        }
        alignment.install_weights(self.weights);
        alignment.install_profile(SequenceProfile::from_columns(self.columns))?;
        Ok(alignment)
    }

    /// Attach the cached weights and profile to an existing alignment.
    ///
    /// Fails with [`ProfalnError::CacheMismatch`] when the fingerprint does
    /// not match the target alignment.
    pub fn attach_to(self, alignment: &Alignment) -> Result<(), ProfalnError> {
        if alignment.fingerprint() != self.fingerprint {
            return Err(ProfalnError::CacheMismatch(format!(
                "cache was built from {} sequences x {} columns (digest {:016x}), \
                 the target alignment differs",
                self.fingerprint.sequence_count,
                self.fingerprint.column_count,
                self.fingerprint.digest,
            )));
        }
        alignment.install_weights(self.weights);
        alignment.install_profile(SequenceProfile::from_columns(self.columns))
    }
}

/// Serialize an alignment and its profile to cache text, building the
/// weights and profile first if they have not been computed yet.
pub fn serialize_alignment(alignment: &Alignment) -> Result<String, ProfalnError> {
    let record = CacheRecord {
        format: CACHE_FORMAT.to_string(),
        version: CACHE_VERSION,
        fingerprint: alignment.fingerprint(),
        sequences: alignment
            .to_records()
            .into_iter()
            .map(|(name, residues)| CacheSequence { name, residues })
            .collect(),
        weights: alignment.weights().to_vec(),
        columns: alignment.profile().columns().to_vec(),
    };
    serde_json::to_string(&record)
        .map_err(|err| ProfalnError::CorruptCache(format!("could not serialize: {err}")))
}

/// Parse cache text into a [`CacheRecord`] without any recomputation.
pub fn deserialize(text: &str) -> Result<CacheRecord, ProfalnError> {
    let record: CacheRecord = serde_json::from_str(text)
        .map_err(|err| ProfalnError::CorruptCache(err.to_string()))?;
    if record.format != CACHE_FORMAT {
        return Err(ProfalnError::CorruptCache(format!(
            "unrecognized format marker: {}",
            record.format
        )));
    }
    if record.version != CACHE_VERSION {
        return Err(ProfalnError::CacheVersionMismatch {
            found: record.version,
            expected: CACHE_VERSION,
        });
    }
    if record.weights.len() != record.sequences.len()
        || record.fingerprint.sequence_count != record.sequences.len()
    {
        return Err(ProfalnError::CorruptCache(
            "sequence, weight and fingerprint counts disagree".to_string(),
        ));
    }
    if record.columns.len() != record.fingerprint.column_count {
        return Err(ProfalnError::CorruptCache(
            "profile column count does not match the fingerprint".to_string(),
        ));
    }
    Ok(record)
}

impl Alignment {
    /// The alignment and its realized profile as cache text.
    pub fn to_cache_string(&self) -> Result<String, ProfalnError> {
        serialize_alignment(self)
    }

    /// Write the alignment and its realized profile to a cache file.
    pub fn to_cache_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ProfalnError> {
        let text = self.to_cache_string()?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Rebuild an alignment, with profile attached, from cache text.
    pub fn from_cache_str(text: &str) -> Result<Self, ProfalnError> {
        deserialize(text)?.into_alignment()
    }

    /// Rebuild an alignment, with profile attached, from a cache file.
    pub fn from_cache_file<P: AsRef<Path>>(path: P) -> Result<Self, ProfalnError> {
        Self::from_cache_str(&fs::read_to_string(path)?)
    }
}
