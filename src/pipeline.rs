//! Capture → detection → speller wiring.
//!
//! Two threads share a single-slot channel and a [`StopFlag`]. The capture
//! thread owns the camera, the landmark model and the finger extractor; each
//! sample it publishes carries the finger states computed from that very
//! detection. The speller thread drains at most one sample per tick.

pub mod capture;
pub mod shutdown;
pub mod speller_loop;

use anyhow::{Result, anyhow};
use log::info;
use std::{sync::mpsc, thread, time::Duration};

use crate::config::Profile;
use crate::display::DisplaySink;
use crate::error::{CaptureError, ModelError};
use crate::fingers::{FingerExtractor, FingerStates};
use crate::geometry::DEFAULT_BEND_THRESHOLD_DEG;
use crate::landmarks::{DetectionResult, Frame};
use crate::speller::{DEFAULT_INITIAL_CHAR, DEFAULT_RUN_LENGTH, Speller};

pub use shutdown::{StopFlag, Ticker};

/// Camera-like producer of frames.
pub trait FrameSource: Send + 'static {
    fn read(&mut self) -> Result<Frame, CaptureError>;

    /// Give the device back. Called once, after both loops have exited.
    fn release(self);
}

/// Hand landmark inference, treated as a black box.
pub trait LandmarkModel: Send + 'static {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOptions {
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

/// The message handed from capture to speller.
#[derive(Debug, Clone)]
pub struct Sample {
    pub frame: Frame,
    pub detection: DetectionResult,
    pub fingers: FingerStates,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub tick: Duration,
    pub run_length: u32,
    pub initial_char: char,
    pub bend_threshold_deg: f64,
    pub reset_on_missed_detection: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(750),
            run_length: DEFAULT_RUN_LENGTH,
            initial_char: DEFAULT_INITIAL_CHAR,
            bend_threshold_deg: DEFAULT_BEND_THRESHOLD_DEG,
            reset_on_missed_detection: false,
        }
    }
}

impl PipelineSettings {
    pub fn from_profile(p: &Profile) -> Self {
        Self {
            tick: Duration::from_millis(p.thresholds.tick_ms),
            run_length: p.thresholds.run_length,
            initial_char: p.behavior.initial_char,
            bend_threshold_deg: p.thresholds.bend_angle_deg,
            reset_on_missed_detection: p.behavior.reset_on_missed_detection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub sentence: String,
    pub frames: u64,
    pub samples: u64,
}

/// Runtime context for one capture session.
pub struct Pipeline {
    settings: PipelineSettings,
    stop: StopFlag,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            stop: StopFlag::new(),
        }
    }

    /// Handle for raising stop from outside (signals, UI close).
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Run both loops to completion, then release the source.
    pub fn run<S, M, D>(&self, source: S, model: M, sink: D) -> Result<RunReport>
    where
        S: FrameSource,
        M: LandmarkModel,
        D: DisplaySink,
    {
        let s = &self.settings;
        let (tx, rx) = mpsc::sync_channel::<Sample>(1);

        let extractor = FingerExtractor::new(s.bend_threshold_deg);
        let reset = s.reset_on_missed_detection;
        let stop = self.stop.clone();
        let capture = thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                let mut source = source;
                let frames = capture::run_capture(&mut source, model, extractor, reset, tx, &stop);
                (source, frames)
            })?;

        let speller = Speller::new(s.initial_char, s.run_length);
        let ticker = Ticker::new(s.tick);
        let stop = self.stop.clone();
        let spelling = match thread::Builder::new()
            .name("speller".into())
            .spawn(move || speller_loop::run_speller(rx, speller, sink, ticker, &stop))
        {
            Ok(h) => h,
            Err(e) => {
                self.stop.raise();
                if let Ok((source, _)) = capture.join() {
                    source.release();
                }
                return Err(anyhow!("failed to spawn speller thread: {e}"));
            }
        };

        let spelled = spelling.join();
        let captured = capture.join();

        // release before reporting a panic on either side
        let frames = captured.map(|(source, frames)| {
            source.release();
            frames
        });
        let (speller, samples) = spelled.map_err(|_| anyhow!("speller thread panicked"))?;
        let frames = frames.map_err(|_| anyhow!("capture thread panicked"))?;
        info!("pipeline stopped after {frames} frames, {samples} samples");

        Ok(RunReport {
            sentence: speller.sentence().to_string(),
            frames,
            samples,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::landmarks::Handedness;
    use crate::landmarks::tests::pose;
    use crate::speller::SpellUpdate;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    pub(crate) struct CountingSource {
        pub next: u64,
        pub limit: Option<u64>,
        pub released: Arc<AtomicUsize>,
    }

    impl CountingSource {
        pub fn new(limit: Option<u64>) -> (Self, Arc<AtomicUsize>) {
            let released = Arc::new(AtomicUsize::new(0));
            let src = Self {
                next: 0,
                limit,
                released: released.clone(),
            };
            (src, released)
        }
    }

    impl FrameSource for CountingSource {
        fn read(&mut self) -> Result<Frame, CaptureError> {
            if self.limit.is_some_and(|l| self.next >= l) {
                return Err(CaptureError::EndOfStream(self.next));
            }
            let f = Frame::metadata_only(self.next, 640, 480);
            self.next += 1;
            Ok(f)
        }

        fn release(self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Both hands, every finger straight.
    pub(crate) struct OpenHands;

    impl LandmarkModel for OpenHands {
        fn detect(&mut self, _frame: &Frame) -> Result<DetectionResult, ModelError> {
            Ok(DetectionResult {
                hands: vec![pose(Handedness::Left, &[]), pose(Handedness::Right, &[])],
            })
        }
    }

    #[derive(Clone, Default)]
    pub(crate) struct Recorder(pub Arc<Mutex<Vec<SpellUpdate>>>);

    impl DisplaySink for Recorder {
        fn update(&mut self, update: &SpellUpdate) -> anyhow::Result<()> {
            if let Ok(mut v) = self.0.lock() {
                v.push(update.clone());
            }
            Ok(())
        }
    }

    fn fast() -> PipelineSettings {
        PipelineSettings {
            tick: Duration::from_millis(2),
            ..PipelineSettings::default()
        }
    }

    #[test]
    fn spells_from_finite_source() {
        let (src, released) = CountingSource::new(Some(7));
        let rec = Recorder::default();
        let report = Pipeline::new(fast()).run(src, OpenHands, rec.clone()).unwrap();

        assert_eq!(report.frames, 7);
        assert_eq!(report.samples, 7);
        assert_eq!(report.sentence, "\u{ff}\u{ff}");
        assert_eq!(rec.0.lock().unwrap().len(), 7);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    struct PanickingSink;

    impl DisplaySink for PanickingSink {
        fn update(&mut self, _update: &SpellUpdate) -> anyhow::Result<()> {
            panic!("display backend crashed");
        }
    }

    #[test]
    fn panicking_display_still_releases_source() {
        let (src, released) = CountingSource::new(Some(5));
        let err = Pipeline::new(fast()).run(src, OpenHands, PanickingSink).unwrap_err();

        assert!(err.to_string().contains("speller thread panicked"));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_flag_ends_both_loops() {
        let (src, released) = CountingSource::new(None);
        let pipeline = Pipeline::new(fast());
        let stop = pipeline.stop_flag();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            stop.raise();
        });

        let report = pipeline.run(src, OpenHands, Recorder::default()).unwrap();
        stopper.join().unwrap();

        assert!(report.samples > 0);
        assert!(report.frames >= report.samples);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
