use log::{info, warn};
use std::sync::mpsc::{Receiver, TryRecvError};

use super::{Sample, StopFlag, Ticker};
use crate::display::DisplaySink;
use crate::speller::Speller;

/// Consume at most one sample per tick and publish the speller output.
/// Ticks with an empty slot change nothing. Ends on stop, or once the
/// capture side has hung up and the slot is empty.
pub fn run_speller<D: DisplaySink>(
    rx: Receiver<Sample>,
    mut speller: Speller,
    mut sink: D,
    mut ticker: Ticker,
    stop: &StopFlag,
) -> (Speller, u64) {
    let mut samples = 0u64;
    info!("speller: started");

    while ticker.wait(stop) {
        let sample = match rx.try_recv() {
            Ok(s) => s,
            Err(TryRecvError::Empty) => continue,
            Err(TryRecvError::Disconnected) => {
                info!("speller: capture ended");
                stop.raise();
                break;
            }
        };
        samples += 1;

        let update = speller.tick(&sample);
        if let Err(e) = sink.update(&update) {
            warn!("speller: display update failed: {e}");
        }
    }

    info!("speller: exiting, sentence {:?}", speller.sentence());
    (speller, samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingers::FingerStates;
    use crate::landmarks::{DetectionResult, Frame};
    use crate::pipeline::tests::Recorder;
    use std::{sync::mpsc, thread, time::Duration};

    fn sample(seq: u64, ch: u8) -> Sample {
        Sample {
            frame: Frame::metadata_only(seq, 640, 480),
            detection: DetectionResult::default(),
            fingers: FingerStates::from_bits(ch),
        }
    }

    #[test]
    fn empty_ticks_change_nothing() {
        let (tx, rx) = mpsc::sync_channel(1);
        let stop = StopFlag::new();
        let rec = Recorder::default();
        let sink = rec.clone();
        let s = stop.clone();
        let h = thread::spawn(move || {
            run_speller(rx, Speller::default(), sink, Ticker::new(Duration::from_millis(2)), &s)
        });

        // let several ticks pass with nothing queued
        thread::sleep(Duration::from_millis(30));
        assert!(rec.0.lock().unwrap().is_empty());

        tx.send(sample(0, b'A')).unwrap();
        drop(tx);
        let (speller, n) = h.join().unwrap();
        assert_eq!(n, 1);
        assert_eq!(speller.counter(), 1);
        assert_eq!(rec.0.lock().unwrap().len(), 1);
        assert!(stop.is_raised());
    }

    #[test]
    fn failing_sink_does_not_stop_spelling() {
        struct Broken;
        impl DisplaySink for Broken {
            fn update(&mut self, _: &crate::speller::SpellUpdate) -> anyhow::Result<()> {
                Err(anyhow::anyhow!("window closed"))
            }
        }

        let (tx, rx) = mpsc::sync_channel(1);
        let stop = StopFlag::new();
        let s = stop.clone();
        let h = thread::spawn(move || {
            run_speller(rx, Speller::default(), Broken, Ticker::new(Duration::from_millis(1)), &s)
        });
        for i in 0..3 {
            tx.send(sample(i, b'A')).unwrap();
        }
        drop(tx);
        let (speller, n) = h.join().unwrap();
        assert_eq!(n, 3);
        // no wrists in an empty detection
        assert_eq!(speller.sentence(), "");
        assert_eq!(speller.counter(), 3);
    }
}
