//! Per-finger bend tracking and the 8-bit character code.

use anyhow::{Result, anyhow};

use crate::geometry::{DEFAULT_BEND_THRESHOLD_DEG, is_bent};
use crate::landmarks::{DetectionResult, Frame, Hand, index};

/// Extended (`true`) / bent (`false`) for 8 fingers. Slots 0-3 belong to the
/// left hand, 4-7 to the right hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerStates(pub [bool; 8]);

impl FingerStates {
    pub fn from_bits(bits: u8) -> Self {
        let mut s = [false; 8];
        for (i, slot) in s.iter_mut().enumerate() {
            *slot = bits & (1 << i) != 0;
        }
        Self(s)
    }

    /// Slot i contributes 2^i.
    pub fn bits(&self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(0u8, |acc, (i, _)| acc | (1 << i))
    }

    /// Parse eight `0`/`1` characters, slot 0 first.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != 8 {
            return Err(anyhow!("expected 8 binary digits, got '{s}'"));
        }
        let mut out = [false; 8];
        for (slot, ch) in out.iter_mut().zip(s.chars()) {
            *slot = match ch {
                '0' => false,
                '1' => true,
                other => return Err(anyhow!("invalid finger digit '{other}' in '{s}'")),
            };
        }
        Ok(Self(out))
    }

    pub fn clear(&mut self) {
        self.0 = [false; 8];
    }
}

/// Character at the code point spelled by the finger bits.
pub fn encode(states: &FingerStates) -> char {
    char::from(states.bits())
}

/// (slot, tip, mid joint, base joint)
type FingerJoints = (usize, usize, usize, usize);

const RIGHT_HAND: [FingerJoints; 4] = [
    (4, index::INDEX_TIP, index::INDEX_PIP, index::INDEX_MCP),
    (5, index::MIDDLE_TIP, index::MIDDLE_PIP, index::MIDDLE_MCP),
    (6, index::RING_TIP, index::RING_PIP, index::RING_MCP),
    (7, index::PINKY_TIP, index::PINKY_PIP, index::PINKY_MCP),
];

// mirrored order: the left index finger lands in slot 3
const LEFT_HAND: [FingerJoints; 4] = [
    (3, index::INDEX_TIP, index::INDEX_PIP, index::INDEX_MCP),
    (2, index::MIDDLE_TIP, index::MIDDLE_PIP, index::MIDDLE_MCP),
    (1, index::RING_TIP, index::RING_PIP, index::RING_MCP),
    (0, index::PINKY_TIP, index::PINKY_PIP, index::PINKY_MCP),
];

/// Holds the finger vector across frames; a slot changes only when its hand
/// is processed.
#[derive(Debug, Clone)]
pub struct FingerExtractor {
    states: FingerStates,
    threshold_deg: f64,
}

impl Default for FingerExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_BEND_THRESHOLD_DEG)
    }
}

impl FingerExtractor {
    pub fn new(threshold_deg: f64) -> Self {
        Self {
            states: FingerStates::default(),
            threshold_deg,
        }
    }

    pub fn states(&self) -> FingerStates {
        self.states
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    fn update_hand(
        &mut self,
        hand: Hand,
        joints: &[FingerJoints; 4],
        frame: &Frame,
        detection: &DetectionResult,
    ) {
        for &(slot, tip, mid, base) in joints {
            self.states.0[slot] =
                !is_bent(tip, mid, base, frame, hand, detection, self.threshold_deg);
        }
    }

    pub fn update_right_hand(&mut self, frame: &Frame, detection: &DetectionResult) {
        self.update_hand(Hand::Right, &RIGHT_HAND, frame, detection);
    }

    pub fn update_left_hand(&mut self, frame: &Frame, detection: &DetectionResult) {
        self.update_hand(Hand::Left, &LEFT_HAND, frame, detection);
    }

    /// Process one detection. Returns the vector after the update.
    pub fn observe(
        &mut self,
        frame: &Frame,
        detection: &DetectionResult,
        reset_on_miss: bool,
    ) -> FingerStates {
        if detection.has_hands() {
            self.update_right_hand(frame, detection);
            self.update_left_hand(frame, detection);
        } else if reset_on_miss {
            self.clear();
        }
        self.states
    }
}
