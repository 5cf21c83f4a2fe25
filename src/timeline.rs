//! Movie clip timelines: frames, labels, and the playhead state machine.
//!
//! Frame numbers are 1-based at every public boundary; the frame list is
//! stored 0-based. The label index is updated in step with every insert,
//! replace and removal. Removing a frame drops its label for good, even when
//! an older frame carried the same label.
//!
//! `next_frame` is evaluated once per render pass while the clip plays:
//!
//! 1. A frame with `pause_frames = N` counts up to `N`, holding the playhead
//!    on each count, then resets the counter to zero and releases.
//! 2. A frame with `goto_frame` jumps there once any pause has released.
//! 3. Otherwise the playhead advances, wrapping from the last frame to 1.
//!
//! Numeric frame targets are never clamped. A playhead outside
//! `1..=total_frames` shows no frame content and `next_frame` reports it.

#[cfg(test)]
#[path = "timeline_test.rs"]
mod timeline_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::StageError;
use crate::tree::NodeId;

/// A frame reference: a 1-based frame number or a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameRef {
    Number(usize),
    Label(String),
}

impl From<usize> for FrameRef {
    fn from(number: usize) -> Self {
        Self::Number(number)
    }
}

impl From<&str> for FrameRef {
    fn from(label: &str) -> Self {
        Self::Label(label.to_owned())
    }
}

impl From<String> for FrameRef {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

/// One step of a timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    /// Label, unique within the clip.
    pub label: Option<String>,
    /// Display node shown while this frame is current.
    pub display: Option<NodeId>,
    /// Hold the playhead here for this many passes. `0` behaves like `None`.
    pub pause_frames: Option<u32>,
    /// Stop the clip when this frame is rendered.
    pub stop: bool,
    /// Jump here instead of advancing.
    pub goto_frame: Option<FrameRef>,
}

impl Frame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: NodeId) -> Self {
        self.display = Some(display);
        self
    }

    #[must_use]
    pub fn with_pause_frames(mut self, count: u32) -> Self {
        self.pause_frames = Some(count);
        self
    }

    #[must_use]
    pub fn with_stop(mut self) -> Self {
        self.stop = true;
        self
    }

    #[must_use]
    pub fn with_goto(mut self, target: impl Into<FrameRef>) -> Self {
        self.goto_frame = Some(target.into());
        self
    }

    fn pause_threshold(&self) -> Option<u32> {
        self.pause_frames.filter(|count| *count > 0)
    }
}

/// Frames to append: one frame, or an arbitrarily nested list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FrameInput {
    Many(Vec<FrameInput>),
    One(Frame),
}

impl FrameInput {
    /// Parse a frame object or nested array of frame objects.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Descriptor`] if `json` is neither.
    pub fn from_json(json: &str) -> Result<Self, StageError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flatten into frames in depth-first order.
    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<Frame>) {
        match self {
            Self::One(frame) => out.push(frame),
            Self::Many(inputs) => {
                for input in inputs {
                    input.flatten_into(out);
                }
            }
        }
    }
}

impl From<Frame> for FrameInput {
    fn from(frame: Frame) -> Self {
        Self::One(frame)
    }
}

impl From<Vec<Frame>> for FrameInput {
    fn from(frames: Vec<Frame>) -> Self {
        Self::Many(frames.into_iter().map(Self::One).collect())
    }
}

/// Playhead state over an ordered frame list.
#[derive(Debug, Clone)]
pub struct Timeline {
    frames: Vec<Frame>,
    labels: HashMap<String, usize>,
    current: usize,
    pause_counter: u32,
    paused: bool,
    /// Frame display node currently attached to the owning clip.
    pub(crate) shown: Option<NodeId>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            labels: HashMap::new(),
            current: 1,
            pause_counter: 0,
            paused: false,
            shown: None,
        }
    }
}

impl Timeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A playing timeline positioned on frame 1 of `input`.
    #[must_use]
    pub fn with_frames(input: impl Into<FrameInput>) -> Self {
        let mut timeline = Self::new();
        timeline.add_frame(input);
        timeline
    }

    // --- Frame list ---

    /// Append one frame or a nested list of frames. A label already in use
    /// moves to the newest frame carrying it.
    pub fn add_frame(&mut self, input: impl Into<FrameInput>) {
        for frame in input.into().into_frames() {
            self.index_label(&frame, self.frames.len());
            self.frames.push(frame);
        }
    }

    /// Insert `frame` so that it becomes frame number `index + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::FrameOutOfRange`] if `index > total_frames()`.
    pub fn add_frame_at(&mut self, frame: Frame, index: usize) -> Result<(), StageError> {
        if index > self.frames.len() {
            return Err(StageError::FrameOutOfRange(index));
        }
        for position in self.labels.values_mut() {
            if *position >= index {
                *position += 1;
            }
        }
        self.index_label(&frame, index);
        self.frames.insert(index, frame);
        Ok(())
    }

    /// Replace frame `number`, or append when `number == total_frames() + 1`.
    /// The replaced frame's label goes with it.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::FrameOutOfRange`] for any other number.
    pub fn set_frame(&mut self, number: usize, frame: Frame) -> Result<(), StageError> {
        let len = self.frames.len();
        match number {
            n if n >= 1 && n <= len => {
                self.labels.retain(|_, position| *position != n - 1);
                self.index_label(&frame, n - 1);
                self.frames[n - 1] = frame;
            }
            n if n == len + 1 => {
                self.index_label(&frame, len);
                self.frames.push(frame);
            }
            n => return Err(StageError::FrameOutOfRange(n)),
        }
        Ok(())
    }

    /// Remove a frame by number or label. Its label is dropped from the index
    /// even if another frame carries the same label.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::UnknownLabel`] or [`StageError::FrameOutOfRange`]
    /// when the target does not name an existing frame.
    pub fn remove_frame(&mut self, target: impl Into<FrameRef>) -> Result<Frame, StageError> {
        let number = self.resolve(&target.into())?;
        if !self.in_range(number) {
            return Err(StageError::FrameOutOfRange(number));
        }
        let index = number - 1;
        let frame = self.frames.remove(index);
        if let Some(label) = &frame.label {
            self.labels.remove(label);
        }
        self.labels.retain(|_, position| *position != index);
        for position in self.labels.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        Ok(frame)
    }

    fn index_label(&mut self, frame: &Frame, index: usize) {
        if let Some(label) = &frame.label {
            self.labels.insert(label.clone(), index);
        }
    }

    // --- Lookup ---

    /// Resolve a frame reference to a 1-based number.
    ///
    /// Numbers pass through unchanged, even when out of range. Labels resolve
    /// through the label index; `None` means no frame carries the label.
    #[must_use]
    pub fn frame_number(&self, target: &FrameRef) -> Option<usize> {
        match target {
            FrameRef::Number(number) => Some(*number),
            FrameRef::Label(label) => self.labels.get(label).map(|index| index + 1),
        }
    }

    /// Position of the first frame equal to `frame`.
    #[must_use]
    pub fn frame_number_of(&self, frame: &Frame) -> Option<usize> {
        self.frames.iter().position(|f| f == frame).map(|index| index + 1)
    }

    /// The frame a reference points at, if any.
    #[must_use]
    pub fn frame(&self, target: &FrameRef) -> Option<&Frame> {
        let number = self.frame_number(target)?;
        self.frame_at(number)
    }

    fn frame_at(&self, number: usize) -> Option<&Frame> {
        number.checked_sub(1).and_then(|index| self.frames.get(index))
    }

    fn in_range(&self, number: usize) -> bool {
        number >= 1 && number <= self.frames.len()
    }

    fn resolve(&self, target: &FrameRef) -> Result<usize, StageError> {
        self.frame_number(target).ok_or_else(|| match target {
            FrameRef::Label(label) => StageError::UnknownLabel(label.clone()),
            FrameRef::Number(number) => StageError::FrameOutOfRange(*number),
        })
    }

    /// The frame under the playhead, if the playhead is in range.
    #[must_use]
    pub fn current(&self) -> Option<&Frame> {
        self.frame_at(self.current)
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Progress toward the current frame's pause threshold.
    #[must_use]
    pub fn pause_counter(&self) -> u32 {
        self.pause_counter
    }

    // --- Playhead ---

    /// Advance the playhead by one render pass and return the new frame number.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::FrameOutOfRange`] if the playhead is not on a frame,
    /// or [`StageError::UnknownLabel`] if the frame redirects to a missing label.
    /// The playhead is left where it was in both cases.
    pub fn next_frame(&mut self) -> Result<usize, StageError> {
        let frame = self.current().ok_or(StageError::FrameOutOfRange(self.current))?;
        let threshold = frame.pause_threshold();
        let redirect = frame.goto_frame.clone();

        if let Some(threshold) = threshold {
            if self.pause_counter < threshold {
                self.pause_counter += 1;
            } else {
                self.pause_counter = 0;
            }
        }

        if let Some(target) = redirect {
            if threshold.is_none() || self.pause_counter == 0 {
                self.current = self.resolve(&target)?;
                return Ok(self.current);
            }
        }

        if threshold.is_some() && self.pause_counter > 0 {
            return Ok(self.current);
        }

        self.current = if self.current >= self.frames.len() { 1 } else { self.current + 1 };
        Ok(self.current)
    }

    pub fn play(&mut self) {
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.paused = true;
    }

    /// Move the playhead and stop.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::UnknownLabel`] for a missing label; the playhead
    /// and paused state are unchanged.
    pub fn goto_and_stop(&mut self, target: impl Into<FrameRef>) -> Result<(), StageError> {
        self.current = self.resolve(&target.into())?;
        self.paused = true;
        Ok(())
    }

    /// Move the playhead and play.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::UnknownLabel`] for a missing label; the playhead
    /// and paused state are unchanged.
    pub fn goto_and_play(&mut self, target: impl Into<FrameRef>) -> Result<(), StageError> {
        self.current = self.resolve(&target.into())?;
        self.paused = false;
        Ok(())
    }
}
