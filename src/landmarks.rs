//! Frames, hand detections and landmark lookup.

/// Indices into the 21-point hand skeleton.
pub mod index {
    pub const WRIST: usize = 0;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;

    pub const COUNT: usize = 21;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bgr,
    Rgb,
}

/// One captured image. `pixels` is packed 8-bit, 3 channels, row-major, and
/// may be empty for frames that only carry dimensions.
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(sequence: u64, width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Self {
        Self {
            sequence,
            width,
            height,
            format,
            pixels,
        }
    }

    pub fn metadata_only(sequence: u64, width: u32, height: u32) -> Self {
        Self::new(sequence, width, height, PixelFormat::Bgr, Vec::new())
    }

    fn has_pixels(&self) -> bool {
        !self.pixels.is_empty() && self.pixels.len() == self.width as usize * self.height as usize * 3
    }

    /// Copy of this frame in RGB channel order.
    pub fn to_rgb(&self) -> Frame {
        let mut out = self.clone();
        if self.format == PixelFormat::Bgr && self.has_pixels() {
            for px in out.pixels.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            out.format = PixelFormat::Rgb;
        }
        out
    }

    /// Flip left/right so the preview reads like a mirror.
    pub fn mirrored(mut self) -> Frame {
        if self.has_pixels() {
            let stride = self.width as usize * 3;
            for row in self.pixels.chunks_exact_mut(stride) {
                let (mut l, mut r) = (0usize, self.width as usize - 1);
                while l < r {
                    for c in 0..3 {
                        row.swap(l * 3 + c, r * 3 + c);
                    }
                    l += 1;
                    r -= 1;
                }
            }
        }
        self
    }
}

/// Handedness label as classified by the landmark model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Left" => Some(Self::Left),
            "Right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Hand selector used by the finger extractor. Selector 0 reads the hand the
/// model labels "Right", selector 1 the one labelled "Left".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Right = 0,
    Left = 1,
}

impl Hand {
    pub fn label(self) -> Handedness {
        match self {
            Hand::Right => Handedness::Right,
            Hand::Left => Handedness::Left,
        }
    }
}

/// Normalized image coordinate, both axes in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct HandLandmarks {
    pub handedness: Handedness,
    pub score: f32,
    pub landmarks: Vec<Landmark>,
}

#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    pub hands: Vec<HandLandmarks>,
}

impl DetectionResult {
    pub fn has_hands(&self) -> bool {
        !self.hands.is_empty()
    }

    pub fn wrist_visible(&self, frame: &Frame, hand: Hand) -> bool {
        coordinate_of(index::WRIST, frame, hand, self).is_some()
    }

    pub fn both_wrists_visible(&self, frame: &Frame) -> bool {
        self.wrist_visible(frame, Hand::Right) && self.wrist_visible(frame, Hand::Left)
    }
}

/// Pixel position inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Pixel coordinate of `landmark` on the first hand whose label matches
/// `hand`. Hands with too few landmarks are skipped.
pub fn coordinate_of(
    landmark: usize,
    frame: &Frame,
    hand: Hand,
    detection: &DetectionResult,
) -> Option<Point> {
    let want = hand.label();
    detection
        .hands
        .iter()
        .filter(|h| h.handedness == want)
        .find_map(|h| h.landmarks.get(landmark))
        .map(|lm| {
            Point::new(
                (f64::from(lm.x) * f64::from(frame.width)) as i32,
                (f64::from(lm.y) * f64::from(frame.height)) as i32,
            )
        })
}
