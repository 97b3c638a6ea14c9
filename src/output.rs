//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! Converting 2 images (rgb, cie2000)
//!     001 dawn.jpg (1024x768 → 320x240)
//!         RGB: converted, 9 colors → c64_dawn_RGB.png
//!         CIE2000: cached → c64_dawn_CIE2000.png
//!     002 broken.png
//!         FAILED: Failed to decode broken.png: ...
//!
//! Wrote 2 files to out/
//! Cache: 1 cached, 1 converted (2 total)
//! 1 image failed
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 dawn.jpg
//!     1024x768 → 320x240, blocks 6x3
//! 002 broken.png
//!     FAILED: Failed to decode broken.png: ...
//!
//! 1 ok, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability. Format functions are pure: no I/O, no side effects. The CLI
//! prints them, for conversions from a printer thread fed by
//! [`ProcessEvent`]s.

use crate::process::{CheckedImage, ProcessEvent, ProcessResult, VariantStatus};
use crate::scan::SourceImage;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_size((width, height): (u32, u32)) -> String {
    format!("{width}x{height}")
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// List the discovered source images.
pub fn format_scan_output(images: &[SourceImage], source: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Found {} in {}",
        plural(images.len(), "image"),
        source.display()
    )];
    for (i, image) in images.iter().enumerate() {
        lines.push(format!(
            "{}{} {}",
            indent(1),
            format_index(i + 1),
            image.relative_path().display()
        ));
    }
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(images: &[SourceImage], source: &Path) {
    for line in format_scan_output(images, source) {
        println!("{}", line);
    }
}

// ============================================================================
// Convert output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started {
            image_count,
            metrics,
        } => {
            let names: Vec<&str> = metrics.iter().map(|m| m.name()).collect();
            vec![format!(
                "Converting {} ({})",
                plural(*image_count, "image"),
                names.join(", ")
            )]
        }
        ProcessEvent::ImageConverted {
            index,
            source_path,
            source_dimensions,
            target_dimensions,
            variants,
        } => {
            let mut lines = vec![format!(
                "{}{} {} ({} \u{2192} {})",
                indent(1),
                format_index(*index),
                source_path,
                format_size(*source_dimensions),
                format_size(*target_dimensions)
            )];
            for variant in variants {
                let status = match variant.status {
                    VariantStatus::Cached => "cached".to_string(),
                    VariantStatus::Copied => "copied".to_string(),
                    VariantStatus::Converted => match variant.colors_used {
                        Some(n) => format!("converted, {}", plural(n, "color")),
                        None => "converted".to_string(),
                    },
                };
                lines.push(format!(
                    "{}{}: {} \u{2192} {}",
                    indent(2),
                    variant.metric.label(),
                    status,
                    variant.output
                ));
            }
            lines
        }
        ProcessEvent::ImageFailed {
            index,
            source_path,
            error,
        } => vec![
            format!("{}{} {}", indent(1), format_index(*index), source_path),
            format!("{}FAILED: {}", indent(2), error),
        ],
    }
}

/// Closing summary of a conversion run.
pub fn format_process_summary(result: &ProcessResult, output_dir: &Path) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Wrote {} to {}",
            plural(result.outputs.len(), "file"),
            output_dir.display()
        ),
        format!("Cache: {}", result.cache_stats),
    ];
    if !result.failures.is_empty() {
        lines.push(format!("{} failed", plural(result.failures.len(), "image")));
    }
    lines
}

// ============================================================================
// Check output
// ============================================================================

/// Per-image validation results with the conversion geometry.
pub fn format_check_output(report: &[CheckedImage]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut failed = 0;
    for (i, checked) in report.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), checked.source_path));
        match &checked.outcome {
            Ok(geometry) => lines.push(format!(
                "{}{} \u{2192} {}, blocks {}x{}",
                indent(1),
                format_size((geometry.source_width, geometry.source_height)),
                format_size(geometry.target_dimensions()),
                geometry.block_width,
                geometry.block_height
            )),
            Err(error) => {
                failed += 1;
                lines.push(format!("{}FAILED: {}", indent(1), error));
            }
        }
    }
    lines.push(String::new());
    lines.push(format!("{} ok, {} failed", report.len() - failed, failed));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &[CheckedImage]) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::color::Metric;
    use crate::imaging::calculations::Geometry;
    use crate::process::{ImageFailure, VariantInfo};
    use std::path::PathBuf;

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn index_is_zero_padded() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(1), "    ");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(0, "image"), "0 images");
        assert_eq!(plural(1, "image"), "1 image");
        assert_eq!(plural(7, "color"), "7 colors");
    }

    // =========================================================================
    // Scan
    // =========================================================================

    #[test]
    fn scan_lists_relative_paths() {
        let images = vec![
            SourceImage {
                path: PathBuf::from("/photos/dawn.jpg"),
                relative_dir: PathBuf::new(),
                stem: "dawn".to_string(),
            },
            SourceImage {
                path: PathBuf::from("/photos/trips/rome.png"),
                relative_dir: PathBuf::from("trips"),
                stem: "rome".to_string(),
            },
        ];
        let lines = format_scan_output(&images, Path::new("/photos"));
        assert_eq!(
            lines,
            vec![
                "Found 2 images in /photos",
                "    001 dawn.jpg",
                "    002 trips/rome.png",
            ]
        );
    }

    // =========================================================================
    // Process events
    // =========================================================================

    #[test]
    fn format_started() {
        let event = ProcessEvent::Started {
            image_count: 3,
            metrics: vec![Metric::Rgb, Metric::Cie2000],
        };
        assert_eq!(
            format_process_event(&event),
            vec!["Converting 3 images (rgb, cie2000)"]
        );
    }

    #[test]
    fn format_image_converted() {
        let event = ProcessEvent::ImageConverted {
            index: 1,
            source_path: "dawn.jpg".to_string(),
            source_dimensions: (1024, 768),
            target_dimensions: (320, 240),
            variants: vec![
                VariantInfo {
                    metric: Metric::Rgb,
                    output: "c64_dawn_RGB.png".to_string(),
                    status: VariantStatus::Converted,
                    colors_used: Some(9),
                },
                VariantInfo {
                    metric: Metric::Cie94,
                    output: "c64_dawn_CIE94.png".to_string(),
                    status: VariantStatus::Copied,
                    colors_used: None,
                },
                VariantInfo {
                    metric: Metric::Cie2000,
                    output: "c64_dawn_CIE2000.png".to_string(),
                    status: VariantStatus::Cached,
                    colors_used: None,
                },
            ],
        };
        let lines = format_process_event(&event);
        assert_eq!(lines[0], "    001 dawn.jpg (1024x768 \u{2192} 320x240)");
        assert_eq!(
            lines[1],
            "        RGB: converted, 9 colors \u{2192} c64_dawn_RGB.png"
        );
        assert_eq!(lines[2], "        CIE94: copied \u{2192} c64_dawn_CIE94.png");
        assert_eq!(
            lines[3],
            "        CIE2000: cached \u{2192} c64_dawn_CIE2000.png"
        );
    }

    #[test]
    fn format_image_failed() {
        let event = ProcessEvent::ImageFailed {
            index: 12,
            source_path: "broken.png".to_string(),
            error: "bad header".to_string(),
        };
        assert_eq!(
            format_process_event(&event),
            vec!["    012 broken.png", "        FAILED: bad header"]
        );
    }

    #[test]
    fn summary_without_failures() {
        let result = ProcessResult {
            outputs: vec!["a_RGB.png".to_string()],
            failures: Vec::new(),
            cache_stats: CacheStats {
                hits: 0,
                copies: 0,
                misses: 1,
            },
        };
        let lines = format_process_summary(&result, Path::new("out"));
        assert_eq!(lines, vec!["", "Wrote 1 file to out", "Cache: 1 converted"]);
    }

    #[test]
    fn summary_counts_failures() {
        let result = ProcessResult {
            outputs: Vec::new(),
            failures: vec![
                ImageFailure {
                    source: PathBuf::from("a.png"),
                    error: "x".to_string(),
                },
                ImageFailure {
                    source: PathBuf::from("b.png"),
                    error: "y".to_string(),
                },
            ],
            cache_stats: CacheStats::default(),
        };
        let lines = format_process_summary(&result, Path::new("out"));
        assert_eq!(lines.last().unwrap(), "2 images failed");
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_output_shows_geometry_and_failures() {
        let report = vec![
            CheckedImage {
                source_path: "dawn.jpg".to_string(),
                outcome: Ok(Geometry::new(1024, 768).unwrap()),
            },
            CheckedImage {
                source_path: "broken.png".to_string(),
                outcome: Err("bad header".to_string()),
            },
        ];
        let lines = format_check_output(&report);
        assert_eq!(
            lines,
            vec![
                "001 dawn.jpg",
                "    1024x768 \u{2192} 320x240, blocks 6x3",
                "002 broken.png",
                "    FAILED: bad header",
                "",
                "1 ok, 1 failed",
            ]
        );
    }
}
