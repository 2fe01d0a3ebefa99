//! Sources of pulse frames for the decoder.

use std::collections::VecDeque;

use bytes::Bytes;

/// Sequential access to the frames of one multipart pulse message.
pub trait FrameSource {
    /// Next frame of the current message, `None` once it is exhausted.
    fn next_frame(&mut self) -> Option<Bytes>;

    /// Whether another frame of the current message follows.
    fn has_more(&self) -> bool;

    /// Discard the remaining frames of the current message. Returns how many were dropped.
    fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.has_more() {
            if self.next_frame().is_none() {
                break;
            }
            dropped += 1;
        }
        dropped
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Option<Bytes> {
        (**self).next_frame()
    }

    fn has_more(&self) -> bool {
        (**self).has_more()
    }
}

/// A fully received pulse message held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseFrames {
    frames: VecDeque<Bytes>,
}

impl PulseFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: impl Into<Bytes>) {
        self.frames.push_back(frame.into());
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Mutable access, e.g. to corrupt a frame in tests.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Bytes> {
        self.frames.get_mut(index)
    }

    pub fn into_vec(self) -> Vec<Bytes> {
        self.frames.into()
    }
}

impl FrameSource for PulseFrames {
    fn next_frame(&mut self) -> Option<Bytes> {
        self.frames.pop_front()
    }

    fn has_more(&self) -> bool {
        !self.frames.is_empty()
    }
}

impl From<Vec<Bytes>> for PulseFrames {
    fn from(frames: Vec<Bytes>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl FromIterator<Bytes> for PulseFrames {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}
