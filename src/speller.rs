use log::{debug, info};
use serde::Serialize;

use crate::fingers::encode;
use crate::pipeline::Sample;

pub const DEFAULT_RUN_LENGTH: u32 = 3;
pub const DEFAULT_INITIAL_CHAR: char = 'A';

/// What the display shows after a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpellUpdate {
    pub sentence: String,
    pub current: char,
    pub committed: Option<char>,
}

/// Debounces sampled characters into a sentence. A character is appended
/// once it has repeated `run_length` times in a row with both wrists in view.
#[derive(Debug, Clone)]
pub struct Speller {
    prev: char,
    counter: u32,
    sentence: String,
    current: Option<char>,
    run_length: u32,
}

impl Default for Speller {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CHAR, DEFAULT_RUN_LENGTH)
    }
}

impl Speller {
    pub fn new(initial: char, run_length: u32) -> Self {
        Self {
            prev: initial,
            counter: 0,
            sentence: String::new(),
            current: None,
            run_length,
        }
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn current(&self) -> Option<char> {
        self.current
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Advance with one sampled character.
    pub fn step(&mut self, ch: char, wrists_visible: bool) -> SpellUpdate {
        if ch == self.prev {
            self.counter += 1;
        } else {
            self.counter = 0;
        }

        let mut committed = None;
        // exact match: a counter already past the run length never commits
        if wrists_visible && self.counter == self.run_length {
            self.sentence.push(ch);
            self.counter = 0;
            committed = Some(ch);
            info!("committed {:?}, sentence now {:?}", ch, self.sentence);
        }

        self.current = Some(ch);
        self.prev = ch;
        debug!(
            "tick: char={:?} counter={} wrists={}",
            ch, self.counter, wrists_visible
        );

        SpellUpdate {
            sentence: self.sentence.clone(),
            current: ch,
            committed,
        }
    }

    /// Advance with the finger states and detection carried by a sample.
    pub fn tick(&mut self, sample: &Sample) -> SpellUpdate {
        let ch = encode(&sample.fingers);
        let visible = sample.detection.both_wrists_visible(&sample.frame);
        self.step(ch, visible)
    }
}
