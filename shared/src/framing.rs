//! Incremental frame extraction from a continuous byte stream
//!
//! Every application message travels as `FRAME_START + payload + FRAME_END`.
//! TCP gives no message boundaries, so a single read may carry half a frame,
//! several frames, or a frame whose sentinels are split across reads. The
//! [`FrameBuffer`] accumulates raw bytes and hands out complete payloads in
//! arrival order, keeping any unterminated tail for the next read.
//!
//! A payload that itself contains `FRAME_END` is cut short at that point.
//! The protocol has no escaping, so this cannot be detected here.

use crate::error::FramingError;
use crate::{FRAME_END, FRAME_START};

/// Growable receive buffer with a resumable sentinel scanner
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    /// Offset of the start sentinel of the frame currently being assembled
    frame_start: Option<usize>,
    /// Everything before this offset has already been searched
    scan_from: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly received bytes to the buffer
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet emitted as part of a frame
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Extracts the next complete payload, if one is buffered
    ///
    /// Returns `None` when no complete frame is available yet. Bytes that
    /// precede a start sentinel belong to no frame and are discarded, except
    /// for a short tail that could be the beginning of a split sentinel.
    pub fn next_frame(&mut self) -> Option<Result<String, FramingError>> {
        let start = match self.frame_start {
            Some(start) => start,
            None => match find(&self.buf[self.scan_from..], FRAME_START.as_bytes()) {
                Some(offset) => {
                    let start = self.scan_from + offset;
                    self.frame_start = Some(start);
                    self.scan_from = start + FRAME_START.len();
                    start
                }
                None => {
                    let keep = FRAME_START.len() - 1;
                    let junk = self.buf.len().saturating_sub(keep);
                    self.buf.drain(..junk);
                    self.scan_from = 0;
                    return None;
                }
            },
        };

        let body_start = start + FRAME_START.len();
        let end = match find(&self.buf[self.scan_from..], FRAME_END.as_bytes()) {
            Some(offset) => self.scan_from + offset,
            None => {
                let resume = self.buf.len().saturating_sub(FRAME_END.len() - 1);
                self.scan_from = resume.max(body_start);
                return None;
            }
        };

        let payload = self.buf[body_start..end].to_vec();
        self.buf.drain(..end + FRAME_END.len());
        self.frame_start = None;
        self.scan_from = 0;

        Some(String::from_utf8(payload).map_err(|e| FramingError::InvalidUtf8 {
            len: e.as_bytes().len(),
        }))
    }

    /// Lazily yields every complete payload currently buffered
    ///
    /// The iterator stops at the first incomplete frame; pushing more data
    /// and calling `frames` again resumes where it left off.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames { buffer: self }
    }
}

/// Iterator over the complete frames in a [`FrameBuffer`]
pub struct Frames<'a> {
    buffer: &'a mut FrameBuffer,
}

impl Iterator for Frames<'_> {
    type Item = Result<String, FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.next_frame()
    }
}

/// Wraps a payload in the frame sentinels
pub fn wrap(payload: &str) -> String {
    let mut framed = String::with_capacity(FRAME_START.len() + payload.len() + FRAME_END.len());
    framed.push_str(FRAME_START);
    framed.push_str(payload);
    framed.push_str(FRAME_END);
    framed
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
