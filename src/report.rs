//! JSON and plain-text run reports.

use crate::config::Config;
use crate::constants::MARKER_COUNT;
use crate::detector::FrameResult;
use crate::statistics::{IdentityStatistics, RunStatistics};
use crate::video::FrameSink;
use crate::Result;
use log::info;
use opencv::core::Mat;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File names written into the output directory
pub const RESULTS_FILE: &str = "results.json";
pub const SUMMARY_FILE: &str = "summary.json";
pub const REPORT_FILE: &str = "report.txt";

/// Description of the run stored with the results
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub video: String,
    pub mode: String,
    pub extractors: Vec<String>,
    pub filter: String,
    pub expected_markers: usize,
    pub total_frames: usize,
    /// Seconds since the Unix epoch
    pub generated_at: u64,
}

impl RunMetadata {
    #[must_use]
    pub fn new(video: &str, config: &Config, total_frames: usize) -> Self {
        Self {
            video: video.to_string(),
            mode: format!("{:?}", config.geometry.mode).to_lowercase(),
            extractors: config.extraction.extractors.clone(),
            filter: config.smoothing.filter.clone(),
            expected_markers: MARKER_COUNT,
            total_frames,
            generated_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}

#[derive(Serialize)]
struct ResultsDocument<'a> {
    metadata: &'a RunMetadata,
    statistics: &'a RunStatistics,
    frame_results: &'a [FrameResult],
}

/// Write the full per-frame results with metadata and statistics
///
/// # Errors
///
/// Returns an error if serialization or the write fails
pub fn write_results<P: AsRef<Path>>(
    path: P,
    metadata: &RunMetadata,
    statistics: &RunStatistics,
    frame_results: &[FrameResult],
) -> Result<()> {
    let document = ResultsDocument {
        metadata,
        statistics,
        frame_results,
    };
    std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
    Ok(())
}

/// Write only the statistics
///
/// # Errors
///
/// Returns an error if serialization or the write fails
pub fn write_summary<P: AsRef<Path>>(path: P, statistics: &RunStatistics) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(statistics)?)?;
    Ok(())
}

fn quality_label(success_rate: f64) -> &'static str {
    match success_rate {
        r if r >= 0.99 => "excellent",
        r if r >= 0.95 => "very good",
        r if r >= 0.90 => "good",
        _ => "needs improvement",
    }
}

fn write_identity(out: &mut String, identity: &IdentityStatistics) {
    let _ = writeln!(out, "Marker {}:", identity.id + 1);
    let _ = writeln!(
        out,
        "  Frames detected (outliers removed): {}  rejected: {}",
        identity.detected_frames, identity.rejected_outliers
    );

    let (Some((mean_x, mean_y)), Some(x), Some(y)) = (identity.mean_position, identity.x, identity.y) else {
        let _ = writeln!(out, "  No valid centers detected\n");
        return;
    };

    let _ = writeln!(out, "  Mean position: ({mean_x:.2}, {mean_y:.2}) px");
    if let Some(std) = identity.std_deviation {
        let _ = writeln!(out, "  Std deviation (radial): {std:.4} px");
    }
    let _ = writeln!(out, "  Std deviation x/y: {:.4} / {:.4} px", x.std_dev, y.std_dev);
    let _ = writeln!(out, "  Range x: {:.2} px [{:.2}, {:.2}]", x.range, x.min, x.max);
    let _ = writeln!(out, "  Range y: {:.2} px [{:.2}, {:.2}]", y.range, y.min, y.max);
    if let Some(jitter) = identity.jitter {
        let _ = writeln!(
            out,
            "  Jitter: mean {:.3} px, std {:.3} px, max {:.3} px",
            jitter.mean, jitter.std_dev, jitter.max
        );
    }
    out.push('\n');
}

/// Render the human-readable report
#[must_use]
pub fn render_text_report(video: &str, statistics: &RunStatistics) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}\nMARKER CENTER DETECTION REPORT\n{rule}\n");
    let _ = writeln!(out, "Video: {video}");
    let _ = writeln!(out, "Frames processed: {}", statistics.total_frames);
    let _ = writeln!(out, "Successful frames: {}", statistics.successful_frames);
    let _ = writeln!(out, "Success rate: {:.2}%\n", statistics.success_rate * 100.0);

    if let Some(geometry) = &statistics.geometry {
        let _ = writeln!(
            out,
            "Collinearity error: mean {:.3} px, max {:.3} px",
            geometry.collinearity_mean, geometry.collinearity_max
        );
        let _ = writeln!(
            out,
            "Spacing ratio: mean {:.4}, std {:.4}\n",
            geometry.spacing_ratio_mean, geometry.spacing_ratio_std
        );
    }

    let _ = writeln!(out, "{rule}\nCENTER ESTIMATION ERROR\n{rule}\n");
    for identity in &statistics.identities {
        write_identity(&mut out, identity);
    }

    let _ = writeln!(out, "{rule}\nQUALITY\n{rule}\n");
    let _ = writeln!(
        out,
        "Success rate {:.2}%: {}",
        statistics.success_rate * 100.0,
        quality_label(statistics.success_rate)
    );

    out
}

/// Collects frame results and writes every report at the end of the run
pub struct ReportSink {
    directory: PathBuf,
    video: String,
    config: Config,
    results: Vec<FrameResult>,
}

impl ReportSink {
    /// Create the sink and its output directory
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created
    pub fn new<P: AsRef<Path>>(directory: P, video: &str, config: &Config) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            video: video.to_string(),
            config: config.clone(),
            results: Vec::new(),
        })
    }

    #[must_use]
    pub fn results(&self) -> &[FrameResult] {
        &self.results
    }
}

impl FrameSink for ReportSink {
    fn consume(&mut self, _frame: &Mat, result: &FrameResult) -> Result<()> {
        self.results.push(result.clone());
        Ok(())
    }

    fn finish(&mut self, statistics: &RunStatistics) -> Result<()> {
        let metadata = RunMetadata::new(&self.video, &self.config, self.results.len());

        let results_path = self.directory.join(RESULTS_FILE);
        write_results(&results_path, &metadata, statistics, &self.results)?;
        info!("Results: {}", results_path.display());

        let summary_path = self.directory.join(SUMMARY_FILE);
        write_summary(&summary_path, statistics)?;
        info!("Summary: {}", summary_path.display());

        let report_path = self.directory.join(REPORT_FILE);
        std::fs::write(&report_path, render_text_report(&self.video, statistics))?;
        info!("Report: {}", report_path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Detection;
    use crate::statistics::StatisticsCollector;

    fn successful_frame(index: u64) -> FrameResult {
        FrameResult {
            frame_index: index,
            timestamp: 0.0,
            detections: (0..MARKER_COUNT)
                .map(|id| Detection {
                    id,
                    x: 100.0 * (id as f64 + 1.0),
                    y: 50.0,
                    confidence: 0.8,
                })
                .collect(),
            success: true,
            geometry_error: 0.2,
            spacing_ratio: 1.01,
            extrapolated: Vec::new(),
        }
    }

    #[test]
    fn test_text_report_mentions_every_marker() {
        let mut collector = StatisticsCollector::new();
        collector.record(&successful_frame(0));
        collector.record(&successful_frame(1));
        let report = render_text_report("clip.mp4", &collector.summarize(3.0));

        assert!(report.contains("Video: clip.mp4"));
        assert!(report.contains("Success rate: 100.00%"));
        for id in 1..=MARKER_COUNT {
            assert!(report.contains(&format!("Marker {id}:")));
        }
        assert!(report.contains("excellent"));
    }

    #[test]
    fn test_empty_run_report() {
        let report = render_text_report("clip.mp4", &StatisticsCollector::new().summarize(3.0));
        assert!(report.contains("No valid centers detected"));
        assert!(report.contains("needs improvement"));
    }

    #[test]
    fn test_report_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ReportSink::new(dir.path(), "clip.mp4", &Config::default()).unwrap();
        let frame = Mat::default();

        let mut collector = StatisticsCollector::new();
        let mut failed = successful_frame(1);
        failed.success = false;
        failed.detections.clear();
        failed.geometry_error = f64::INFINITY;
        for result in [successful_frame(0), failed] {
            sink.consume(&frame, &result).unwrap();
            collector.record(&result);
        }
        sink.finish(&collector.summarize(3.0)).unwrap();

        let results: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap()).unwrap();
        assert_eq!(results["metadata"]["total_frames"], 2);
        assert_eq!(results["metadata"]["mode"], "fusion");
        assert_eq!(results["frame_results"].as_array().unwrap().len(), 2);
        // Non-finite geometry serializes as null
        assert!(results["frame_results"][1]["geometry_error"].is_null());

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary["successful_frames"], 1);
        assert!(dir.path().join(REPORT_FILE).exists());
    }
}
