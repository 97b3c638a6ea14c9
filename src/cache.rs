//! Conversion cache for incremental runs.
//!
//! Quantizing a full-size photo under CIE2000 is the slow part of a run.
//! This module lets [`process`](crate::process) skip a conversion when the
//! source image and the conversion parameters haven't changed since the last
//! run into the same output directory.
//!
//! ## Manifest layout
//!
//! `<output_dir>/.c64image-cache.json` holds one record per source image,
//! keyed by its path relative to the scanned source:
//!
//! ```text
//! {
//!   "version": 2,
//!   "sources": {
//!     "trips/rome.png": {
//!       "hash": "<sha256 of rome.png>",
//!       "variants": {
//!         "rgb":     { "params_hash": "<sha256>", "output": "trips/c64_rome_RGB.png" },
//!         "cie2000": { "params_hash": "<sha256>", "output": "trips/c64_rome_CIE2000.png" }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! `params_hash` covers the metric, compatibility mode, output width and
//! palette (see [`hash_conversion_params`]).
//!
//! ## Lookup
//!
//! A variant is [`CacheLookup::Fresh`] when its source record has the same
//! content hash, the same `params_hash`, and the recorded output is the one
//! wanted and still on disk. If the same conversion exists under another
//! output path (prefix changed, source renamed or moved) the lookup returns
//! [`CacheLookup::Elsewhere`] and the caller copies the file. Everything else
//! is a [`CacheLookup::Miss`].
//!
//! Each output path belongs to at most one source record. Recording a
//! variant takes the path over from whichever record held it before.

use crate::color::{Compatibility, Metric};
use crate::imaging::calculations::TARGET_WIDTH;
use crate::palette::Palette;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const MANIFEST_FILENAME: &str = ".c64image-cache.json";

/// Bumped whenever the layout or a hash input changes; older manifests are
/// discarded on load.
const MANIFEST_VERSION: u32 = 2;

/// One metric's output for a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub params_hash: String,
    /// Output path relative to the output directory, `/`-separated.
    pub output: String,
}

/// Everything recorded about one source image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// SHA-256 of the source file when its variants were written.
    pub hash: String,
    pub variants: BTreeMap<Metric, VariantRecord>,
}

/// Identifies one metric's conversion of one source.
#[derive(Debug, Clone, Copy)]
pub struct Conversion<'a> {
    /// Source path relative to the scan root, `/`-separated.
    pub source: &'a str,
    pub source_hash: &'a str,
    pub metric: Metric,
    pub params_hash: &'a str,
}

impl Conversion<'_> {
    fn matches<'r>(&self, record: &'r SourceRecord) -> Option<&'r VariantRecord> {
        if record.hash != self.source_hash {
            return None;
        }
        record
            .variants
            .get(&self.metric)
            .filter(|variant| variant.params_hash == self.params_hash)
    }
}

/// Result of [`CacheManifest::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// The wanted output already holds this conversion.
    Fresh,
    /// The same conversion was written to this other output path.
    Elsewhere(String),
    Miss,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub sources: BTreeMap<String, SourceRecord>,
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            sources: BTreeMap::new(),
        }
    }

    /// Read the manifest from `output_dir`.
    ///
    /// A missing, unreadable or outdated manifest yields an empty one: the
    /// cache only ever saves work, so losing it is never an error.
    pub fn load(output_dir: &Path) -> Self {
        let path = manifest_path(output_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(manifest) if manifest.version == MANIFEST_VERSION => manifest,
            Ok(manifest) => {
                debug!(found = manifest.version, "discarding outdated cache manifest");
                Self::empty()
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "discarding unreadable cache manifest");
                Self::empty()
            }
        }
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Decide whether `conversion` has to run to produce `output`.
    ///
    /// The source's own record is consulted first; any other record with the
    /// same content hash (a renamed or moved source) is the fallback.
    pub fn lookup(&self, conversion: &Conversion, output: &str, output_dir: &Path) -> CacheLookup {
        let own = self
            .sources
            .get(conversion.source)
            .and_then(|record| conversion.matches(record));
        let others = self
            .sources
            .iter()
            .filter(|(source, _)| source.as_str() != conversion.source)
            .filter_map(|(_, record)| conversion.matches(record));

        for variant in own.into_iter().chain(others) {
            if !output_dir.join(&variant.output).is_file() {
                continue;
            }
            return if variant.output == output {
                CacheLookup::Fresh
            } else {
                CacheLookup::Elsewhere(variant.output.clone())
            };
        }
        CacheLookup::Miss
    }

    /// Note that `output` now holds `conversion`.
    ///
    /// A changed source hash drops the source's other variants, since they
    /// were made from the old content.
    pub fn record(&mut self, conversion: &Conversion, output: String) {
        for (source, record) in self.sources.iter_mut() {
            if source != conversion.source {
                record.variants.retain(|_, variant| variant.output != output);
            }
        }
        self.sources.retain(|_, record| !record.variants.is_empty());

        let record = self.sources.entry(conversion.source.to_string()).or_default();
        if record.hash != conversion.source_hash {
            record.hash = conversion.source_hash.to_string();
            record.variants.clear();
        }
        record.variants.insert(
            conversion.metric,
            VariantRecord {
                params_hash: conversion.params_hash.to_string(),
                output,
            },
        );
    }

    /// Forget variants whose output file has been deleted.
    pub fn prune(&mut self, output_dir: &Path) {
        for record in self.sources.values_mut() {
            record
                .variants
                .retain(|_, variant| output_dir.join(&variant.output).is_file());
        }
        self.sources.retain(|_, record| !record.variants.is_empty());
    }
}

/// SHA-256 of a file's contents as lowercase hex, streamed from disk.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 hash of the parameters that determine one converted image.
///
/// Covers the metric, the compatibility mode, the output width, and every
/// palette color, so editing any of them invalidates earlier outputs.
pub fn hash_conversion_params(
    metric: Metric,
    compatibility: Compatibility,
    palette: &Palette,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"c64\0");
    hasher.update(metric.name().as_bytes());
    hasher.update(b"\0");
    hasher.update(compatibility.name().as_bytes());
    hasher.update(b"\0");
    hasher.update(TARGET_WIDTH.to_le_bytes());
    for index in 0..palette.len() {
        hasher.update(palette.color(index).to_array());
    }
    format!("{:x}", hasher.finalize())
}

/// Per-run counts of how each variant was produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.hits, "cached"),
            (self.copies, "copied"),
            (self.misses, "converted"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{n} {label}"))
        .collect();

        match parts.as_slice() {
            [] => f.write_str("nothing to convert"),
            [single] => f.write_str(single),
            _ => write!(f, "{} ({} total)", parts.join(", "), self.total()),
        }
    }
}

/// Path of the cache manifest inside an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}
