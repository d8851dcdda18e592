//! Audio sources the software visualizer samples from.

use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::encoding::downmix_to_mono;

/// Mono audio behind an output session.
///
/// Called from the capture thread once per tick.
pub trait SampleSource: Send {
    /// Take exactly `count` mono frames in `[-1.0, 1.0]`, or `None` if that
    /// many are not available yet.
    fn read_frames(&mut self, count: usize) -> Option<Vec<f32>>;
}

/// Endless sine generator.
#[derive(Debug, Clone)]
pub struct ToneSource {
    pub frequency_hz: f64,
    pub sample_rate: f64,
    pub amplitude: f32,
    phase: f64,
}

impl ToneSource {
    pub fn new(frequency_hz: f64, sample_rate: f64, amplitude: f32) -> Self {
        Self {
            frequency_hz,
            sample_rate,
            amplitude,
            phase: 0.0,
        }
    }
}

impl SampleSource for ToneSource {
    fn read_frames(&mut self, count: usize) -> Option<Vec<f32>> {
        let step = TAU * self.frequency_hz / self.sample_rate;
        let frames = (0..count)
            .map(|_| {
                let sample = self.phase.sin() as f32 * self.amplitude;
                self.phase = (self.phase + step) % TAU;
                sample
            })
            .collect();
        Some(frames)
    }
}

/// Bounded FIFO of mono frames, fed by a player and drained by the visualizer.
///
/// Cloning yields another handle to the same queue. When full, the oldest
/// frames are dropped.
#[derive(Debug, Clone)]
pub struct PcmFeed {
    inner: Arc<Mutex<FeedBuffer>>,
}

#[derive(Debug)]
struct FeedBuffer {
    frames: VecDeque<f32>,
    capacity: usize,
}

impl PcmFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedBuffer {
                frames: VecDeque::with_capacity(capacity),
                capacity,
            })),
        }
    }

    /// Queue interleaved samples, downmixing to mono first.
    pub fn push_interleaved(&self, samples: &[f32], channels: u16) {
        let mono = downmix_to_mono(samples, channels as usize);
        self.push(&mono);
    }

    /// Queue mono frames.
    pub fn push(&self, frames: &[f32]) {
        let mut buf = self.inner.lock();
        if buf.capacity == 0 || frames.is_empty() {
            return;
        }

        let frames = if frames.len() > buf.capacity {
            &frames[frames.len() - buf.capacity..]
        } else {
            frames
        };

        let overflow = (buf.frames.len() + frames.len()).saturating_sub(buf.capacity);
        buf.frames.drain(..overflow);
        buf.frames.extend(frames.iter().copied());
    }

    /// Frames currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().frames.is_empty()
    }

    /// Drop every queued frame.
    pub fn clear(&self) {
        self.inner.lock().frames.clear();
    }
}

impl SampleSource for PcmFeed {
    fn read_frames(&mut self, count: usize) -> Option<Vec<f32>> {
        let mut buf = self.inner.lock();
        if count == 0 || buf.frames.len() < count {
            return None;
        }
        Some(buf.frames.drain(..count).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_returns_frames_in_order() {
        let mut feed = PcmFeed::new(10);
        feed.push(&[0.1, 0.2, 0.3, 0.4]);

        assert_eq!(feed.read_frames(3), Some(vec![0.1, 0.2, 0.3]));
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn feed_withholds_short_reads() {
        let mut feed = PcmFeed::new(10);
        feed.push(&[0.1, 0.2]);

        assert_eq!(feed.read_frames(4), None);
        assert_eq!(feed.len(), 2); // nothing consumed
    }

    #[test]
    fn feed_overflow_drops_oldest() {
        let mut feed = PcmFeed::new(4);
        feed.push(&[1.0, 2.0, 3.0, 4.0]);
        feed.push(&[5.0, 6.0]);

        assert_eq!(feed.read_frames(4), Some(vec![3.0, 4.0, 5.0, 6.0]));
    }

    #[test]
    fn feed_keeps_tail_of_oversized_push() {
        let mut feed = PcmFeed::new(3);
        feed.push(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(feed.read_frames(3), Some(vec![3.0, 4.0, 5.0]));
    }

    #[test]
    fn feed_downmixes_interleaved_input() {
        let mut feed = PcmFeed::new(8);
        feed.push_interleaved(&[0.2, 0.4, -0.5, 0.5], 2);

        let frames = feed.read_frames(2).unwrap();
        assert!((frames[0] - 0.3).abs() < 1e-6);
        assert!(frames[1].abs() < 1e-6);
    }

    #[test]
    fn clones_share_the_queue() {
        let feed = PcmFeed::new(8);
        let mut reader = feed.clone();
        feed.push(&[0.5, 0.5]);

        assert_eq!(reader.read_frames(2), Some(vec![0.5, 0.5]));
        assert!(feed.is_empty());
    }

    #[test]
    fn cleared_feed_withholds_reads_until_refilled() {
        let mut feed = PcmFeed::new(8);
        feed.push(&[0.1, 0.2, 0.3]);

        feed.clear();
        assert!(feed.is_empty());
        assert_eq!(feed.read_frames(1), None);

        feed.push(&[0.4]);
        assert_eq!(feed.read_frames(1), Some(vec![0.4]));
    }

    #[test]
    fn tone_is_continuous_across_reads() {
        let mut tone = ToneSource::new(1000.0, 48000.0, 1.0);
        let first = tone.read_frames(48).unwrap();
        let second = tone.read_frames(48).unwrap();

        // 48 samples at 1 kHz / 48 kHz is one full period.
        assert!(first[0].abs() < 1e-4);
        assert!(second[0].abs() < 1e-3);
        assert!((first[12] - 1.0).abs() < 1e-3);
    }
}
