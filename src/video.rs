//! Frame sources and sinks around the detector.

use crate::detector::FrameResult;
use crate::overlay::draw_overlay;
use crate::statistics::RunStatistics;
use crate::{Error, Result};
use log::{info, warn};
use opencv::core::{Mat, Size, Vector};
use opencv::prelude::*;
use opencv::{highgui, imgcodecs, videoio};
use std::path::{Path, PathBuf};

/// A producer of frames in presentation order
pub trait FrameSource {
    /// Next frame, `None` at the end of the stream
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails
    fn next_frame(&mut self) -> Result<Option<Mat>>;

    /// Frames per second reported by the source, if known
    fn frame_rate(&self) -> Option<f64>;

    /// Total frame count reported by the source, if known
    fn frame_count(&self) -> Option<u64> {
        None
    }
}

/// Decodes a video file with `OpenCV`
pub struct VideoFileSource {
    capture: videoio::VideoCapture,
    path: PathBuf,
}

impl VideoFileSource {
    /// Open a video file
    ///
    /// # Errors
    ///
    /// Returns `Error::VideoSource` if the file cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(Error::VideoSource(format!("Video not found: {}", path.display())));
        }

        let capture = videoio::VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::VideoSource(format!("Cannot open video: {}", path.display())));
        }

        info!("Opened video file: {}", path.display());
        Ok(Self { capture, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn frame_rate(&self) -> Option<f64> {
        self.capture
            .get(videoio::CAP_PROP_FPS)
            .ok()
            .filter(|fps| fps.is_finite() && *fps > 0.0)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn frame_count(&self) -> Option<u64> {
        self.capture
            .get(videoio::CAP_PROP_FRAME_COUNT)
            .ok()
            .filter(|count| count.is_finite() && *count > 0.0)
            .map(|count| count as u64)
    }
}

/// A consumer of processed frames
pub trait FrameSink {
    /// Handle one frame and its result
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot write its output
    fn consume(&mut self, frame: &Mat, result: &FrameResult) -> Result<()>;

    /// Flush outputs once the run is over
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot write its output
    fn finish(&mut self, _statistics: &RunStatistics) -> Result<()> {
        Ok(())
    }

    /// Whether the user asked to end the run
    fn stop_requested(&self) -> bool {
        false
    }
}

/// Writes annotated frames to a video file
pub struct OverlayVideoSink {
    path: PathBuf,
    fps: f64,
    writer: Option<videoio::VideoWriter>,
}

impl OverlayVideoSink {
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P, fps: f64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            fps,
            writer: None,
        }
    }

    fn open_writer(&self, size: Size) -> Result<videoio::VideoWriter> {
        let fourcc = videoio::VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = videoio::VideoWriter::new(&self.path.to_string_lossy(), fourcc, self.fps, size, true)?;
        if !writer.is_opened()? {
            return Err(Error::VideoSource(format!(
                "Cannot create video writer: {}",
                self.path.display()
            )));
        }
        info!("Writing overlay video to {}", self.path.display());
        Ok(writer)
    }
}

impl FrameSink for OverlayVideoSink {
    fn consume(&mut self, frame: &Mat, result: &FrameResult) -> Result<()> {
        let canvas = draw_overlay(frame, result)?;
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open_writer(canvas.size()?)?,
        };
        self.writer.insert(writer).write(&canvas)?;
        Ok(())
    }

    fn finish(&mut self, _statistics: &RunStatistics) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.release()?;
        }
        Ok(())
    }
}

/// Saves every annotated frame as a numbered image
pub struct FrameImageSink {
    directory: PathBuf,
}

impl FrameImageSink {
    /// Create the sink and its output directory
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    #[must_use]
    pub fn frame_path(&self, frame_index: u64) -> PathBuf {
        self.directory.join(format!("frame_{frame_index:06}.jpg"))
    }
}

impl FrameSink for FrameImageSink {
    fn consume(&mut self, frame: &Mat, result: &FrameResult) -> Result<()> {
        let canvas = draw_overlay(frame, result)?;
        let path = self.frame_path(result.frame_index);
        if !imgcodecs::imwrite(&path.to_string_lossy(), &canvas, &Vector::new())? {
            return Err(Error::Io(std::io::Error::other(format!(
                "Failed to write {}",
                path.display()
            ))));
        }
        Ok(())
    }
}

/// Shows annotated frames in a window; `q` or Esc stops the run
pub struct PreviewSink {
    window: String,
    stop: bool,
}

impl PreviewSink {
    /// Open the preview window
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created
    pub fn new(window: &str) -> Result<Self> {
        highgui::named_window(window, highgui::WINDOW_NORMAL)?;
        Ok(Self {
            window: window.to_string(),
            stop: false,
        })
    }
}

impl FrameSink for PreviewSink {
    fn consume(&mut self, frame: &Mat, result: &FrameResult) -> Result<()> {
        let canvas = draw_overlay(frame, result)?;
        highgui::imshow(&self.window, &canvas)?;

        let key = highgui::wait_key(1)?;
        if key == 27 || key == i32::from(b'q') {
            info!("Exit requested by user");
            self.stop = true;
        }
        Ok(())
    }

    fn finish(&mut self, _statistics: &RunStatistics) -> Result<()> {
        if let Err(e) = highgui::destroy_window(&self.window) {
            warn!("Failed to close preview window: {e}");
        }
        Ok(())
    }

    fn stop_requested(&self) -> bool {
        self.stop
    }
}
