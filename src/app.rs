//! Main application module: drives a frame source through the detector.

use crate::{
    config::Config,
    detector::MarkerDetector,
    error::Result,
    report::ReportSink,
    statistics::RunStatistics,
    video::{FrameImageSink, FrameSink, FrameSource, OverlayVideoSink, PreviewSink, VideoFileSource},
};
use log::{info, warn};
use std::path::Path;
use std::time::Instant;

/// Progress is logged every this many frames
const PROGRESS_INTERVAL: u64 = 30;

/// Preview window title
const PREVIEW_WINDOW: &str = "IR Marker Tracker";

/// Main application struct
pub struct TrackerApp {
    detector: MarkerDetector,
    source: Box<dyn FrameSource>,
    sinks: Vec<Box<dyn FrameSink>>,
    max_frames: Option<u64>,
}

impl TrackerApp {
    /// Open a video file and build the sinks the configuration asks for
    ///
    /// # Errors
    ///
    /// Returns an error if the video cannot be opened, the configuration is
    /// invalid, or an output cannot be created
    pub fn new<P: AsRef<Path>>(config: Config, video: P, max_frames: Option<u64>) -> Result<Self> {
        info!("Initializing IR marker tracker");
        let video = video.as_ref();
        let source = VideoFileSource::open(video)?;

        let fps = source.frame_rate().unwrap_or_else(|| {
            warn!(
                "Video reports no frame rate, assuming {} fps",
                config.output.fallback_fps
            );
            config.output.fallback_fps
        });
        info!(
            "Frames: {}, FPS: {fps:.2}",
            source
                .frame_count()
                .map_or_else(|| "unknown".to_string(), |count| count.to_string())
        );

        let output = config.output.clone();
        let mut sinks: Vec<Box<dyn FrameSink>> = vec![Box::new(ReportSink::new(
            &output.directory,
            &video.to_string_lossy(),
            &config,
        )?)];
        if output.save_frames {
            sinks.push(Box::new(FrameImageSink::new(output.directory.join("frames"))?));
        }
        if let Some(path) = &output.overlay_video {
            sinks.push(Box::new(OverlayVideoSink::new(path, fps)));
        }
        if output.display {
            sinks.push(Box::new(PreviewSink::new(PREVIEW_WINDOW)?));
        }

        let mut detector = MarkerDetector::new(config)?;
        detector.set_frame_rate(fps)?;

        Ok(Self::with_parts(detector, Box::new(source), sinks, max_frames))
    }

    /// Assemble an application from already constructed parts
    #[must_use]
    pub fn with_parts(
        detector: MarkerDetector,
        source: Box<dyn FrameSource>,
        sinks: Vec<Box<dyn FrameSink>>,
        max_frames: Option<u64>,
    ) -> Self {
        Self {
            detector,
            source,
            sinks,
            max_frames,
        }
    }

    #[must_use]
    pub fn detector(&self) -> &MarkerDetector {
        &self.detector
    }

    /// Run until the source is exhausted, the frame limit is hit or a sink
    /// asks to stop
    ///
    /// # Errors
    ///
    /// Returns the first detector, source or sink error
    pub fn run(&mut self) -> Result<RunStatistics> {
        info!("Starting main processing loop");
        let start_time = Instant::now();
        let mut successful: u64 = 0;

        loop {
            let processed = self.detector.frames_processed();
            if self.max_frames.is_some_and(|limit| processed >= limit) {
                info!("Frame limit of {processed} reached");
                break;
            }

            let Some(frame) = self.source.next_frame()? else {
                info!("End of video reached");
                break;
            };

            let result = self.detector.detect(&frame)?;
            if result.success {
                successful += 1;
            }

            for sink in &mut self.sinks {
                sink.consume(&frame, &result)?;
            }

            let processed = processed + 1;
            if processed % PROGRESS_INTERVAL == 0 {
                #[allow(clippy::cast_precision_loss)]
                let rate = successful as f64 / processed as f64 * 100.0;
                info!("Frame {processed}: success {rate:.1}% ({successful}/{processed})");
            }

            if self.sinks.iter().any(|sink| sink.stop_requested()) {
                break;
            }
        }

        let statistics = self.detector.statistics();
        for sink in &mut self.sinks {
            sink.finish(&statistics)?;
        }

        let elapsed = start_time.elapsed().as_secs_f64();
        #[allow(clippy::cast_precision_loss)]
        let throughput = if elapsed > 0.0 {
            statistics.total_frames as f64 / elapsed
        } else {
            0.0
        };
        info!(
            "Processed {} frames ({} successful, {:.2}%) at {throughput:.1} fps",
            statistics.total_frames,
            statistics.successful_frames,
            statistics.success_rate * 100.0
        );

        Ok(statistics)
    }
}
