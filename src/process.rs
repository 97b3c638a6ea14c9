//! Batch conversion.
//!
//! Takes the images found by [`scan`](crate::scan) and writes one C64
//! image per selected metric for each of them.
//!
//! ## Output Structure
//!
//! ```text
//! out/
//! ├── .c64image-cache.json         # Cache manifest (see crate::cache)
//! ├── c64_dawn_RGB.png
//! ├── c64_dawn_CIE76.png
//! ├── c64_dawn_CIE94.png
//! ├── c64_dawn_CIE2000.png
//! └── trips/                       # recursive scans mirror the source tree
//!     └── c64_rome_CIE2000.png
//! ```
//!
//! ## Per-image flow
//!
//! 1. Hash the source file and look every variant up in the cache.
//! 2. If anything is missing, decode the source once.
//! 3. Quantize under all missing metrics in parallel
//!    ([`quantize_all`]), then encode each result.
//! 4. Record the new outputs in the cache manifest.
//!
//! A failing image does not stop the batch: it is reported as
//! [`ProcessEvent::ImageFailed`] and listed in [`ProcessResult::failures`].
//! That includes an image whose output names an earlier image in the batch
//! already claimed ([`ProcessError::OutputCollision`]).

use crate::cache::{self, CacheLookup, CacheManifest, CacheStats, Conversion};
use crate::color::{Compatibility, Metric};
use crate::config::Config;
use crate::imaging::calculations::Geometry;
use crate::imaging::{BackendError, ImageBackend, RustBackend};
use crate::naming;
use crate::palette::c64;
use crate::quantize::{QuantizeError, quantize_all};
use crate::scan::SourceImage;
use rayon::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Conversion failed: {0}")]
    Quantize(#[from] QuantizeError),
    #[error("Output names collide with {}", .0.display())]
    OutputCollision(PathBuf),
}

/// Settings for a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOptions {
    pub metrics: Vec<Metric>,
    pub compatibility: Compatibility,
    pub prefix: String,
    /// Consult and update the cache manifest.
    pub use_cache: bool,
}

impl ProcessOptions {
    /// Build options from config values, with the cache enabled.
    pub fn from_config(config: &Config) -> Self {
        Self {
            metrics: config.conversion.metrics.clone(),
            compatibility: config.conversion.compatibility,
            prefix: config.output.prefix.clone(),
            use_cache: true,
        }
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// How one output file was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    /// Already on disk under the expected name.
    Cached,
    /// Copied from a cached output under another name.
    Copied,
    /// Freshly converted.
    Converted,
}

/// One output file of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInfo {
    pub metric: Metric,
    /// Path relative to the output directory.
    pub output: String,
    pub status: VariantStatus,
    /// Distinct palette colors in the result; only known when converted.
    pub colors_used: Option<usize>,
}

/// Progress event emitted during a batch run.
///
/// Sent through an optional channel so the caller can display progress as
/// images complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Started {
        image_count: usize,
        metrics: Vec<Metric>,
    },
    ImageConverted {
        /// 1-based position in the batch.
        index: usize,
        source_path: String,
        source_dimensions: (u32, u32),
        target_dimensions: (u32, u32),
        variants: Vec<VariantInfo>,
    },
    ImageFailed {
        index: usize,
        source_path: String,
        error: String,
    },
}

/// An image that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    pub source: PathBuf,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct ProcessResult {
    /// Output paths (relative to the output directory) of every variant
    /// that is now on disk, in batch order.
    pub outputs: Vec<String>,
    pub failures: Vec<ImageFailure>,
    pub cache_stats: CacheStats,
}

impl ProcessResult {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Convert `images` into `output_dir` with the `image`-crate backend.
pub fn process(
    images: &[SourceImage],
    output_dir: &Path,
    options: &ProcessOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    process_with_backend(&RustBackend::new(), images, output_dir, options, events)
}

/// Convert images using a specific backend (allows testing with mock).
///
/// Only failures that affect the whole batch (creating the output directory,
/// writing the cache manifest) are returned as errors.
pub fn process_with_backend(
    backend: &impl ImageBackend,
    images: &[SourceImage],
    output_dir: &Path,
    options: &ProcessOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    std::fs::create_dir_all(output_dir)?;

    let mut manifest = if options.use_cache {
        CacheManifest::load(output_dir)
    } else {
        CacheManifest::empty()
    };

    let params_hashes: Vec<(Metric, String)> = options
        .metrics
        .iter()
        .map(|&m| (m, cache::hash_conversion_params(m, options.compatibility, c64())))
        .collect();

    let send = |event: ProcessEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    send(ProcessEvent::Started {
        image_count: images.len(),
        metrics: options.metrics.clone(),
    });

    let mut result = ProcessResult::default();
    // Output stem (relative dir + stem) → first source that claimed it
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();

    for (i, image) in images.iter().enumerate() {
        let index = i + 1;
        let source_path = image.relative_path().to_string_lossy().into_owned();

        let converted = match claimed.entry(image.relative_dir.join(&image.stem)) {
            Entry::Occupied(first) => {
                Err(ProcessError::OutputCollision(first.get().to_path_buf()))
            }
            Entry::Vacant(slot) => {
                slot.insert(&image.path);
                convert_image(
                    backend,
                    image,
                    output_dir,
                    options,
                    &params_hashes,
                    &mut manifest,
                    &mut result.cache_stats,
                )
            }
        };

        match converted {
            Ok(image_result) => {
                result
                    .outputs
                    .extend(image_result.variants.iter().map(|v| v.output.clone()));
                send(ProcessEvent::ImageConverted {
                    index,
                    source_path,
                    source_dimensions: image_result.source_dimensions,
                    target_dimensions: image_result.target_dimensions,
                    variants: image_result.variants,
                });
            }
            Err(e) => {
                warn!(source = %image.path.display(), error = %e, "image failed");
                result.failures.push(ImageFailure {
                    source: image.path.clone(),
                    error: e.to_string(),
                });
                send(ProcessEvent::ImageFailed {
                    index,
                    source_path,
                    error: e.to_string(),
                });
            }
        }
    }

    manifest.prune(output_dir);
    manifest.save(output_dir)?;
    info!(stats = %result.cache_stats, "conversion finished");

    Ok(result)
}

struct ImageResult {
    source_dimensions: (u32, u32),
    target_dimensions: (u32, u32),
    variants: Vec<VariantInfo>,
}

/// Bring every variant of one image up to date.
fn convert_image(
    backend: &impl ImageBackend,
    image: &SourceImage,
    output_dir: &Path,
    options: &ProcessOptions,
    params_hashes: &[(Metric, String)],
    manifest: &mut CacheManifest,
    stats: &mut CacheStats,
) -> Result<ImageResult, ProcessError> {
    let dims = backend.identify(&image.path)?;
    let geometry = Geometry::new(dims.width, dims.height)?;
    let source_hash = cache::hash_file(&image.path)?;
    let source_key = output_key(&image.relative_path());

    std::fs::create_dir_all(output_dir.join(&image.relative_dir))?;

    // Resolve what the cache already has; `None` marks work to do.
    let mut planned: Vec<(Conversion, String, Option<VariantStatus>)> = Vec::new();
    for (metric, params_hash) in params_hashes {
        let conversion = Conversion {
            source: &source_key,
            source_hash: &source_hash,
            metric: *metric,
            params_hash,
        };
        let output = output_key(&naming::output_relative_path(
            &image.relative_dir,
            &options.prefix,
            &image.stem,
            *metric,
        ));
        let status = match manifest.lookup(&conversion, &output, output_dir) {
            CacheLookup::Fresh => Some(VariantStatus::Cached),
            CacheLookup::Elsewhere(stored) => {
                std::fs::copy(output_dir.join(&stored), output_dir.join(&output))?;
                Some(VariantStatus::Copied)
            }
            CacheLookup::Miss => None,
        };
        planned.push((conversion, output, status));
    }

    let pending: Vec<(Metric, PathBuf)> = planned
        .iter()
        .filter(|(_, _, status)| status.is_none())
        .map(|(conversion, output, _)| (conversion.metric, output_dir.join(output)))
        .collect();

    let mut colors_used: Vec<(Metric, usize)> = Vec::new();
    if !pending.is_empty() {
        let grid = backend.decode(&image.path)?;
        let metrics: Vec<Metric> = pending.iter().map(|(metric, _)| *metric).collect();
        let started = Instant::now();
        let results = quantize_all(&grid, c64(), &metrics, options.compatibility);
        debug!(
            source = %image.path.display(),
            metrics = metrics.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "quantized"
        );

        let mut converted = Vec::with_capacity(results.len());
        for ((metric, quantized), (_, path)) in results.into_iter().zip(&pending) {
            converted.push((metric, quantized?, path));
        }

        converted
            .par_iter()
            .try_for_each(|(_, quantized, path)| backend.encode(&quantized.image, path))?;

        colors_used = converted
            .iter()
            .map(|(metric, quantized, _)| (*metric, quantized.colors_used()))
            .collect();
    }

    let mut variants = Vec::with_capacity(planned.len());
    for (conversion, output, status) in planned {
        let status = status.unwrap_or(VariantStatus::Converted);
        match status {
            VariantStatus::Cached => stats.hits += 1,
            VariantStatus::Copied => stats.copies += 1,
            VariantStatus::Converted => stats.misses += 1,
        }
        if status != VariantStatus::Cached {
            manifest.record(&conversion, output.clone());
        }
        let metric = conversion.metric;
        variants.push(VariantInfo {
            metric,
            output,
            status,
            colors_used: colors_used
                .iter()
                .find(|(m, _)| *m == metric)
                .map(|(_, n)| *n),
        });
    }

    Ok(ImageResult {
        source_dimensions: (dims.width, dims.height),
        target_dimensions: geometry.target_dimensions(),
        variants,
    })
}

/// Cache keys and reported paths always use forward slashes.
fn output_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Result of validating one source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedImage {
    pub source_path: String,
    pub outcome: Result<Geometry, String>,
}

/// Decode every image and compute its conversion geometry without writing
/// anything.
pub fn check(images: &[SourceImage]) -> Vec<CheckedImage> {
    check_with_backend(&RustBackend::new(), images)
}

/// [`check`] with a specific backend (allows testing with mock).
pub fn check_with_backend(backend: &impl ImageBackend, images: &[SourceImage]) -> Vec<CheckedImage> {
    images
        .par_iter()
        .map(|image| {
            let outcome = backend
                .decode(&image.path)
                .map_err(ProcessError::from)
                .and_then(|grid| {
                    Geometry::new(grid.width(), grid.height()).map_err(ProcessError::from)
                })
                .map_err(|e| e.to_string());
            CheckedImage {
                source_path: image.relative_path().to_string_lossy().into_owned(),
                outcome,
            }
        })
        .collect()
}
