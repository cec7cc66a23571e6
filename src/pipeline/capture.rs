use log::{debug, error, info, warn};
use std::sync::mpsc::SyncSender;

use super::{FrameSource, LandmarkModel, Sample, StopFlag};
use crate::fingers::FingerExtractor;

/// Read, detect, extract and publish until stopped or something fails.
/// Returns the number of samples handed to the speller.
///
/// A read or model failure ends the loop; the speller notices the closed
/// channel once it has drained the slot. A closed receiver raises stop.
pub fn run_capture<S: FrameSource, M: LandmarkModel>(
    source: &mut S,
    mut model: M,
    mut extractor: FingerExtractor,
    reset_on_miss: bool,
    tx: SyncSender<Sample>,
    stop: &StopFlag,
) -> u64 {
    let mut published = 0u64;
    info!("capture: started");

    while !stop.is_raised() {
        let frame = match source.read() {
            Ok(f) => f,
            Err(e) => {
                error!("capture: {e}");
                break;
            }
        };

        let detection = match model.detect(&frame.to_rgb()) {
            Ok(d) => d,
            Err(e) => {
                error!("capture: {e}");
                break;
            }
        };

        let frame = frame.mirrored();
        let fingers = extractor.observe(&frame, &detection, reset_on_miss);
        debug!(
            "capture: frame {} hands={} bits={:08b}",
            frame.sequence,
            detection.hands.len(),
            fingers.bits()
        );

        // blocks while the speller still holds the previous sample
        let sample = Sample {
            frame,
            detection,
            fingers,
        };
        if tx.send(sample).is_err() {
            if stop.is_raised() {
                info!("capture: speller stopped");
            } else {
                warn!("capture: speller went away, stopping");
                stop.raise();
            }
            break;
        }
        published += 1;
    }

    info!("capture: exiting after {published} samples");
    published
}
