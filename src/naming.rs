//! Centralized naming of converted images.
//!
//! Every output follows one pattern: the configured prefix, the source
//! file's stem, an underscore, and the metric label.
//!
//! - `dawn.jpg` under CIE2000 → `c64_dawn_CIE2000.png`
//! - `my_photo.png` under RGB → `c64_my_photo_RGB.png`
//!
//! The same module parses names back, so the scanner can recognise (and
//! skip) images it produced itself when the output directory lives inside
//! the source tree.

use crate::color::Metric;
use std::path::{Path, PathBuf};

/// Extension of every converted image.
pub const OUTPUT_EXTENSION: &str = "png";

/// File name of the image converted from `stem` under `metric`.
pub fn output_file_name(prefix: &str, stem: &str, metric: Metric) -> String {
    format!("{prefix}{stem}_{}.{OUTPUT_EXTENSION}", metric.label())
}

/// Output path relative to the output directory.
///
/// `source_dir` is the source's directory relative to the scan root; it is
/// mirrored so that equally named files in different folders don't collide.
pub fn output_relative_path(source_dir: &Path, prefix: &str, stem: &str, metric: Metric) -> PathBuf {
    source_dir.join(output_file_name(prefix, stem, metric))
}

/// Result of parsing a converted image's file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutputName {
    pub stem: String,
    pub metric: Metric,
}

/// Parse a file name produced by [`output_file_name`].
///
/// Returns `None` for anything that doesn't match: wrong prefix, wrong
/// extension, no `_LABEL` suffix, or an empty stem.
pub fn parse_output_name(prefix: &str, file_name: &str) -> Option<ParsedOutputName> {
    let rest = file_name.strip_prefix(prefix)?;
    let (base, ext) = rest.rsplit_once('.')?;
    if !ext.eq_ignore_ascii_case(OUTPUT_EXTENSION) {
        return None;
    }
    let (stem, label) = base.rsplit_once('_')?;
    if stem.is_empty() {
        return None;
    }
    let metric = Metric::ALL.into_iter().find(|m| m.label() == label)?;
    Some(ParsedOutputName {
        stem: stem.to_string(),
        metric,
    })
}

/// Whether `file_name` looks like one of our converted images.
pub fn is_output_name(prefix: &str, file_name: &str) -> bool {
    parse_output_name(prefix, file_name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_per_metric() {
        assert_eq!(output_file_name("c64_", "dawn", Metric::Rgb), "c64_dawn_RGB.png");
        assert_eq!(output_file_name("c64_", "dawn", Metric::Cie76), "c64_dawn_CIE76.png");
        assert_eq!(output_file_name("c64_", "dawn", Metric::Cie94), "c64_dawn_CIE94.png");
        assert_eq!(
            output_file_name("c64_", "dawn", Metric::Cie2000),
            "c64_dawn_CIE2000.png"
        );
    }

    #[test]
    fn empty_prefix() {
        assert_eq!(output_file_name("", "x", Metric::Rgb), "x_RGB.png");
    }

    #[test]
    fn relative_path_mirrors_source_dir() {
        let path = output_relative_path(Path::new("trips/rome"), "c64_", "forum", Metric::Cie94);
        assert_eq!(path, Path::new("trips/rome/c64_forum_CIE94.png"));

        let flat = output_relative_path(Path::new(""), "c64_", "forum", Metric::Cie94);
        assert_eq!(flat, Path::new("c64_forum_CIE94.png"));
    }

    #[test]
    fn parse_round_trips_every_metric() {
        for metric in Metric::ALL {
            let name = output_file_name("c64_", "my_photo", metric);
            let parsed = parse_output_name("c64_", &name).unwrap();
            assert_eq!(parsed.stem, "my_photo");
            assert_eq!(parsed.metric, metric);
        }
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        assert_eq!(parse_output_name("c64_", "dawn_RGB.png"), None);
    }

    #[test]
    fn parse_rejects_unknown_label() {
        assert_eq!(parse_output_name("c64_", "c64_dawn_HSV.png"), None);
        assert_eq!(parse_output_name("c64_", "c64_dawn_rgb.png"), None);
    }

    #[test]
    fn parse_rejects_other_extensions() {
        assert_eq!(parse_output_name("c64_", "c64_dawn_RGB.jpg"), None);
        assert_eq!(parse_output_name("c64_", "c64_dawn_RGB"), None);
    }

    #[test]
    fn parse_accepts_uppercase_extension() {
        assert!(is_output_name("c64_", "c64_dawn_RGB.PNG"));
    }

    #[test]
    fn parse_rejects_empty_stem() {
        assert_eq!(parse_output_name("c64_", "c64__RGB.png"), None);
        assert!(!is_output_name("c64_", "c64_RGB.png"));
    }

    #[test]
    fn source_photo_is_not_output() {
        assert!(!is_output_name("c64_", "dawn.png"));
        assert!(!is_output_name("", "holiday_2024.png"));
    }
}
