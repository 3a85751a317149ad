//! Bounded drop-oldest ring buffer for audio frames.
//!
//! One producer (the payload path) appends decoded frames and one consumer
//! (the sink) drains them. Neither side ever waits on the other for longer
//! than a bounded copy: a full buffer overwrites its oldest frames and an
//! empty buffer returns short.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pcmplay_core::AudioFrame;

/// Result of a [`PlaybackBuffer::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushOutcome {
    /// Frames accepted into the buffer.
    pub written: usize,
    /// Unplayed frames discarded to make room, oldest first.
    pub dropped: usize,
}

/// Result of a [`PlaybackBuffer::pop`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Popped {
    pub frames: Vec<AudioFrame>,
    /// Fewer frames were available than requested.
    pub underrun: bool,
}

struct Ring {
    slots: Box<[AudioFrame]>,
    head: usize,
    len: usize,
}

impl Ring {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Copy `frames` in at the tail. Caller guarantees they fit.
    fn write_tail(&mut self, frames: &[AudioFrame]) {
        let capacity = self.capacity();
        let start = (self.head + self.len) % capacity;
        let first = frames.len().min(capacity - start);
        self.slots[start..start + first].copy_from_slice(&frames[..first]);
        self.slots[..frames.len() - first].copy_from_slice(&frames[first..]);
        self.len += frames.len();
    }

    fn read_head(&mut self, out: &mut [AudioFrame]) -> usize {
        let capacity = self.capacity();
        let count = out.len().min(self.len);
        let first = count.min(capacity - self.head);
        out[..first].copy_from_slice(&self.slots[self.head..self.head + first]);
        out[first..count].copy_from_slice(&self.slots[..count - first]);
        self.head = (self.head + count) % capacity;
        self.len -= count;
        count
    }
}

/// Bounded FIFO of frames awaiting playback.
///
/// Capacity is fixed at construction. `push` never blocks: when the new
/// frames do not fit, the oldest unplayed frames are overwritten. `pop` never
/// blocks: it returns whatever is buffered and flags the shortfall.
pub struct PlaybackBuffer {
    ring: Mutex<Ring>,
    /// Total frames overwritten since construction.
    dropped_total: AtomicU64,
    /// Number of pops that came back short.
    underruns_total: AtomicU64,
}

impl PlaybackBuffer {
    /// Create a buffer holding up to `capacity` frames (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(Ring {
                slots: vec![AudioFrame::default(); capacity].into_boxed_slice(),
                head: 0,
                len: 0,
            }),
            dropped_total: AtomicU64::new(0),
            underruns_total: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    /// Number of frames waiting to be played.
    pub fn len(&self) -> usize {
        self.ring.lock().len
    }

    /// Number of frames that can be pushed without overwriting.
    pub fn free(&self) -> usize {
        let ring = self.ring.lock();
        ring.capacity() - ring.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    /// Append frames, overwriting the oldest on overflow.
    pub fn push<I>(&self, frames: I) -> PushOutcome
    where
        I: IntoIterator<Item = AudioFrame>,
    {
        let frames: Vec<AudioFrame> = frames.into_iter().collect();
        self.push_slice(&frames)
    }

    /// Append a slice of frames, overwriting the oldest on overflow.
    pub fn push_slice(&self, frames: &[AudioFrame]) -> PushOutcome {
        if frames.is_empty() {
            return PushOutcome::default();
        }

        let mut ring = self.ring.lock();
        let capacity = ring.capacity();

        let dropped = if frames.len() >= capacity {
            // Only the newest `capacity` frames survive.
            let dropped = ring.len + (frames.len() - capacity);
            ring.head = 0;
            ring.len = 0;
            ring.write_tail(&frames[frames.len() - capacity..]);
            dropped
        } else {
            let overflow = (ring.len + frames.len()).saturating_sub(capacity);
            ring.head = (ring.head + overflow) % capacity;
            ring.len -= overflow;
            ring.write_tail(frames);
            overflow
        };
        drop(ring);

        if dropped > 0 {
            self.dropped_total
                .fetch_add(dropped as u64, Ordering::Relaxed);
        }

        PushOutcome {
            written: frames.len(),
            dropped,
        }
    }

    /// Remove up to `count` frames from the head.
    pub fn pop(&self, count: usize) -> Popped {
        let mut frames = vec![AudioFrame::default(); count];
        let (read, underrun) = self.pop_into(&mut frames);
        frames.truncate(read);
        Popped { frames, underrun }
    }

    /// Fill `out` from the head without allocating.
    ///
    /// Returns the number of frames written and whether the buffer ran short.
    /// Slots past the returned count are left untouched.
    pub fn pop_into(&self, out: &mut [AudioFrame]) -> (usize, bool) {
        let read = self.ring.lock().read_head(out);
        let underrun = read < out.len();
        if underrun {
            self.underruns_total.fetch_add(1, Ordering::Relaxed);
        }
        (read, underrun)
    }

    /// Discard every buffered frame.
    pub fn clear(&self) {
        let mut ring = self.ring.lock();
        ring.head = 0;
        ring.len = 0;
    }

    /// Total frames overwritten by overflowing pushes.
    pub fn dropped_total(&self) -> u64 {
        self.dropped_total.load(Ordering::Relaxed)
    }

    /// Total pops that returned fewer frames than requested.
    pub fn underruns_total(&self) -> u64 {
        self.underruns_total.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for PlaybackBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ring = self.ring.lock();
        f.debug_struct("PlaybackBuffer")
            .field("capacity", &ring.capacity())
            .field("len", &ring.len)
            .finish_non_exhaustive()
    }
}

/// Thread-safe reference to a playback buffer.
pub type SharedPlaybackBuffer = Arc<PlaybackBuffer>;

/// Create a new shared playback buffer.
pub fn shared_playback_buffer(capacity: usize) -> SharedPlaybackBuffer {
    Arc::new(PlaybackBuffer::new(capacity))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use proptest::prelude::*;

    fn mono(samples: &[i16]) -> Vec<AudioFrame> {
        samples.iter().copied().map(AudioFrame::mono).collect()
    }

    fn values(frames: &[AudioFrame]) -> Vec<i16> {
        frames.iter().map(AudioFrame::first).collect()
    }

    #[test]
    fn test_basic_push_pop() {
        let buffer = PlaybackBuffer::new(1024);

        let outcome = buffer.push(mono(&[1, 2, 3, 4, 5]));
        assert_eq!(outcome, PushOutcome { written: 5, dropped: 0 });
        assert_eq!(buffer.len(), 5);

        let popped = buffer.pop(5);
        assert_eq!(values(&popped.frames), vec![1, 2, 3, 4, 5]);
        assert!(!popped.underrun);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_wraparound() {
        let buffer = PlaybackBuffer::new(8);

        buffer.push(mono(&[1; 6]));
        assert_eq!(buffer.pop(4).frames.len(), 4);

        // Wraps past the end of the slot array
        buffer.push(mono(&[2; 5]));
        let popped = buffer.pop(7);
        assert_eq!(values(&popped.frames), vec![1, 1, 2, 2, 2, 2, 2]);
        assert!(!popped.underrun);
    }

    #[test]
    fn test_full_buffer_overwrites_oldest() {
        let buffer = PlaybackBuffer::new(4);

        buffer.push(mono(&[1, 2, 3, 4]));
        assert!(buffer.is_full());

        let outcome = buffer.push(mono(&[5]));
        assert_eq!(outcome, PushOutcome { written: 1, dropped: 1 });
        assert_eq!(values(&buffer.pop(4).frames), vec![2, 3, 4, 5]);
        assert_eq!(buffer.dropped_total(), 1);
    }

    #[test]
    fn test_oversized_push_keeps_newest() {
        let buffer = PlaybackBuffer::new(3);
        buffer.push(mono(&[9, 9]));

        let outcome = buffer.push(mono(&[1, 2, 3, 4, 5]));
        assert_eq!(outcome.dropped, 4);
        assert_eq!(values(&buffer.pop(10).frames), vec![3, 4, 5]);
    }

    #[test]
    fn test_underrun() {
        let buffer = PlaybackBuffer::new(16);
        buffer.push(mono(&[1, 2]));

        let popped = buffer.pop(5);
        assert_eq!(values(&popped.frames), vec![1, 2]);
        assert!(popped.underrun);

        let popped = buffer.pop(5);
        assert!(popped.frames.is_empty());
        assert!(popped.underrun);
        assert_eq!(buffer.underruns_total(), 2);
    }

    #[test]
    fn test_pop_into_leaves_tail_untouched() {
        let buffer = PlaybackBuffer::new(16);
        buffer.push(mono(&[7]));

        let mut out = [AudioFrame::mono(-1); 3];
        assert_eq!(buffer.pop_into(&mut out), (1, true));
        assert_eq!(values(&out), vec![7, -1, -1]);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let buffer = PlaybackBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.push(mono(&[1, 2]));
        assert_eq!(values(&buffer.pop(1).frames), vec![2]);
    }

    #[test]
    fn test_clear() {
        let buffer = PlaybackBuffer::new(16);
        buffer.push(mono(&[1; 10]));
        assert_eq!(buffer.len(), 10);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.free(), 16);
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let buffer = shared_playback_buffer(1024);
        let writer_buffer = buffer.clone();
        let reader_buffer = buffer;

        let writer = thread::spawn(move || {
            let mut next = 0i16;
            for _ in 0..100 {
                while writer_buffer.free() < 100 {
                    thread::yield_now();
                }
                let chunk: Vec<_> = (0..100)
                    .map(|_| {
                        next = next.wrapping_add(1);
                        AudioFrame::mono(next)
                    })
                    .collect();
                writer_buffer.push_slice(&chunk);
            }
        });

        let reader = thread::spawn(move || {
            let mut out = [AudioFrame::default(); 64];
            let mut received = Vec::with_capacity(10_000);
            while received.len() < 10_000 {
                let (read, _) = reader_buffer.pop_into(&mut out);
                received.extend(out[..read].iter().map(AudioFrame::first));
                if read == 0 {
                    thread::yield_now();
                }
            }
            received
        });

        writer.join().unwrap();
        let received = reader.join().unwrap();

        // Writer never overflowed, so every frame arrives in order.
        let expected: Vec<i16> = (1..=10_000).map(|n| n as i16).collect();
        assert_eq!(received, expected);
    }

    proptest! {
        #[test]
        fn prop_drop_oldest_keeps_last_capacity(
            capacity in 1usize..64,
            samples in proptest::collection::vec(any::<i16>(), 0..256),
            chunk in 1usize..32,
        ) {
            let buffer = PlaybackBuffer::new(capacity);
            for piece in samples.chunks(chunk) {
                buffer.push(mono(piece));
            }

            let kept = samples.len().min(capacity);
            let popped = buffer.pop(capacity);
            prop_assert_eq!(values(&popped.frames), samples[samples.len() - kept..].to_vec());
            prop_assert_eq!(buffer.dropped_total() as usize, samples.len() - kept);
        }
    }
}
