//! Recorded detections played back as camera + model.
//!
//! A recording is JSON lines, one frame per line:
//!
//! ```text
//! {"width":640,"height":480,"hands":[{"label":"Left","score":0.93,"landmarks":[[0.41,0.82],...]}]}
//! ```
//!
//! `hands` may be omitted for an empty frame and `score` defaults to 1.0.

use log::{info, warn};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{CaptureError, ModelError, ReplayError};
use crate::landmarks::{DetectionResult, Frame, HandLandmarks, Handedness, Landmark, index};
use crate::pipeline::{FrameSource, LandmarkModel, ModelOptions};

fn full_confidence() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
struct RecordedHand {
    label: String,
    #[serde(default = "full_confidence")]
    score: f32,
    landmarks: Vec<[f32; 2]>,
}

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    width: u32,
    height: u32,
    #[serde(default)]
    hands: Vec<RecordedHand>,
}

#[derive(Debug, Clone)]
struct Entry {
    width: u32,
    height: u32,
    detection: DetectionResult,
}

#[derive(Debug, Clone, Default)]
pub struct Recording {
    entries: Vec<Entry>,
}

impl Recording {
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let txt = fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rec = Self::parse(&txt)?;
        info!("loaded {} recorded frames from {}", rec.len(), path.display());
        Ok(rec)
    }

    pub fn parse(txt: &str) -> Result<Self, ReplayError> {
        let mut entries = Vec::new();
        for (i, raw) in txt.lines().enumerate() {
            let line = i + 1;
            if raw.trim().is_empty() {
                continue;
            }
            let rf: RecordedFrame =
                serde_json::from_str(raw).map_err(|source| ReplayError::Parse { line, source })?;
            if rf.width == 0 || rf.height == 0 {
                return Err(ReplayError::EmptyFrame { line });
            }

            let mut hands = Vec::with_capacity(rf.hands.len());
            for h in rf.hands {
                let handedness = Handedness::from_label(&h.label).ok_or_else(|| {
                    ReplayError::UnknownHandedness {
                        line,
                        label: h.label.clone(),
                    }
                })?;
                if h.landmarks.len() != index::COUNT {
                    warn!(
                        "line {line}: {} hand has {} landmarks, expected {}",
                        h.label,
                        h.landmarks.len(),
                        index::COUNT
                    );
                }
                hands.push(HandLandmarks {
                    handedness,
                    score: h.score,
                    landmarks: h.landmarks.iter().map(|&[x, y]| Landmark { x, y }).collect(),
                });
            }

            entries.push(Entry {
                width: rf.width,
                height: rf.height,
                detection: DetectionResult { hands },
            });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn into_parts(self, options: ModelOptions) -> (ReplayCamera, ReplayModel) {
        let dims = self.entries.iter().map(|e| (e.width, e.height)).collect();
        let detections = self.entries.into_iter().map(|e| e.detection).collect();
        (
            ReplayCamera { dims, next: 0 },
            ReplayModel {
                detections,
                options,
                tracked: Vec::new(),
            },
        )
    }
}

/// Emits one pixel-less frame per recorded line, then fails.
#[derive(Debug)]
pub struct ReplayCamera {
    dims: Vec<(u32, u32)>,
    next: u64,
}

impl FrameSource for ReplayCamera {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        let (w, h) = self
            .dims
            .get(self.next as usize)
            .copied()
            .ok_or(CaptureError::EndOfStream(self.next))?;
        let f = Frame::metadata_only(self.next, w, h);
        self.next += 1;
        Ok(f)
    }

    fn release(self) {
        info!("replay camera released after {} frames", self.next);
    }
}

/// Looks up the recorded detection for a frame's sequence number and applies
/// the confidence gates: a label seen on the previous frame is held to the
/// tracking threshold, a new one to the detection threshold.
#[derive(Debug)]
pub struct ReplayModel {
    detections: Vec<DetectionResult>,
    options: ModelOptions,
    tracked: Vec<Handedness>,
}

impl LandmarkModel for ReplayModel {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, ModelError> {
        let recorded = self
            .detections
            .get(frame.sequence as usize)
            .ok_or(ModelError::MissingFrame(frame.sequence))?;

        let opts = self.options;
        let tracked = &self.tracked;
        let hands: Vec<HandLandmarks> = recorded
            .hands
            .iter()
            .filter(|h| {
                let min = if tracked.contains(&h.handedness) {
                    opts.min_tracking_confidence
                } else {
                    opts.min_detection_confidence
                };
                h.score >= min
            })
            .cloned()
            .collect();

        self.tracked = hands.iter().map(|h| h.handedness).collect();
        Ok(DetectionResult { hands })
    }
}
