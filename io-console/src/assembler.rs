//! Serial receive path: byte handoff and line assembly.
//!
//! The receive interrupt does nothing but push each byte into a
//! [`ByteQueue`] (bounded, never blocks) and count faults in [`RxStats`].
//! A normal-priority task drains the queue into a [`LineAssembler`], which
//! hands every completed line to the command interpreter.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};
use heapless::Vec;

use crate::config::{LINE_CAPACITY, RX_QUEUE_CAPACITY};
use crate::error::{Fatal, RxError};
use crate::hal::SerialReceiver;

/// Line terminator.
pub const CR: u8 = b'\r';
/// Backspace as sent by terminals.
pub const DEL: u8 = 0x7F;

/// Payload bytes a line can hold; the last slot of the buffer is kept for
/// the terminator.
pub const LINE_PAYLOAD: usize = LINE_CAPACITY - 1;

pub type ByteQueue = Queue<u8, RX_QUEUE_CAPACITY>;
pub type ByteProducer<'a> = Producer<'a, u8, RX_QUEUE_CAPACITY>;
pub type ByteConsumer<'a> = Consumer<'a, u8, RX_QUEUE_CAPACITY>;

/// A completed line, terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    bytes: Vec<u8, LINE_PAYLOAD>,
    truncated: bool,
}

impl Line {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes were dropped because the line outgrew the buffer.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Result of feeding one byte to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    /// Appended to the current line.
    Stored,
    /// Backspace removed the last byte.
    Erased,
    /// Backspace on an empty line.
    Ignored,
    /// The buffer is full; the byte was discarded.
    Dropped,
    /// Terminator seen; the buffer is empty again.
    Line(Line),
}

/// Reassembles lines from single bytes.
///
/// There is one state: accumulating. A terminator dispatches the buffered
/// bytes and restarts with an empty buffer. Overflowing bytes are dropped
/// and the line is marked truncated; the terminator is still recognised.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: Vec<u8, LINE_PAYLOAD>,
    truncated: bool,
}

impl LineAssembler {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            truncated: false,
        }
    }

    pub fn push(&mut self, byte: u8) -> Feed {
        match byte {
            CR => {
                let line = Line {
                    bytes: self.buf.clone(),
                    truncated: self.truncated,
                };
                self.reset();
                Feed::Line(line)
            }
            DEL => match self.buf.pop() {
                Some(_) => Feed::Erased,
                None => Feed::Ignored,
            },
            byte => match self.buf.push(byte) {
                Ok(()) => Feed::Stored,
                Err(_) => {
                    self.truncated = true;
                    Feed::Dropped
                }
            },
        }
    }

    /// Bytes buffered for the line in progress.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The line in progress.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Abandons the line in progress.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.truncated = false;
    }
}

/// Hands one received byte to the assembler's queue. Bounded, non-blocking.
pub fn deliver_byte(producer: &mut ByteProducer<'_>, byte: u8, stats: &RxStats) -> Result<(), RxError> {
    producer.enqueue(byte).map_err(|_| {
        stats.record(RxError::QueueFull);
        RxError::QueueFull
    })
}

/// Re-enables a receiver the transport switched off. If that fails the
/// command channel is gone for good, which the caller must treat as fatal.
pub fn recover_receiver<R: SerialReceiver>(receiver: &mut R) -> Result<(), Fatal> {
    receiver.rearm()?;
    Ok(())
}

/// Receive fault counters, shared between the interrupt and task context.
#[derive(Debug, Default)]
pub struct RxStats {
    queue_full: AtomicU32,
    overrun: AtomicU32,
    framing: AtomicU32,
    noise: AtomicU32,
    parity: AtomicU32,
    rearmed: AtomicU32,
}

/// Counts taken out of [`RxStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RxCounts {
    pub queue_full: u32,
    pub overrun: u32,
    pub framing: u32,
    pub noise: u32,
    pub parity: u32,
    pub rearmed: u32,
}

impl RxCounts {
    pub fn is_clean(&self) -> bool {
        *self == RxCounts::default()
    }
}

impl RxStats {
    pub const fn new() -> Self {
        Self {
            queue_full: AtomicU32::new(0),
            overrun: AtomicU32::new(0),
            framing: AtomicU32::new(0),
            noise: AtomicU32::new(0),
            parity: AtomicU32::new(0),
            rearmed: AtomicU32::new(0),
        }
    }

    pub fn record(&self, error: RxError) {
        let counter = match error {
            RxError::QueueFull => &self.queue_full,
            RxError::Overrun => &self.overrun,
            RxError::Framing => &self.framing,
            RxError::Noise => &self.noise,
            RxError::Parity => &self.parity,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rearm(&self) {
        self.rearmed.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the counts since the last call and zeroes them.
    pub fn take(&self) -> RxCounts {
        RxCounts {
            queue_full: self.queue_full.swap(0, Ordering::Relaxed),
            overrun: self.overrun.swap(0, Ordering::Relaxed),
            framing: self.framing.swap(0, Ordering::Relaxed),
            noise: self.noise.swap(0, Ordering::Relaxed),
            parity: self.parity.swap(0, Ordering::Relaxed),
            rearmed: self.rearmed.swap(0, Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RearmError;

    fn feed(assembler: &mut LineAssembler, bytes: &[u8]) -> Option<Line> {
        let mut last = None;
        for &b in bytes {
            if let Feed::Line(line) = assembler.push(b) {
                last = Some(line);
            }
        }
        last
    }

    #[test]
    fn terminator_dispatches_and_resets() {
        let mut assembler = LineAssembler::new();
        let line = feed(&mut assembler, b"/a\r").unwrap();
        assert_eq!(line.as_bytes(), b"/a");
        assert!(!line.is_truncated());
        assert!(assembler.is_empty());

        let line = feed(&mut assembler, b"/b1\r").unwrap();
        assert_eq!(line.as_bytes(), b"/b1");
    }

    #[test]
    fn backspace_erases_last_byte() {
        let mut assembler = LineAssembler::new();
        assert_eq!(assembler.push(b'/'), Feed::Stored);
        assert_eq!(assembler.push(b'x'), Feed::Stored);
        assert_eq!(assembler.push(DEL), Feed::Erased);
        assert_eq!(assembler.pending(), b"/");
        let line = feed(&mut assembler, b"a\r").unwrap();
        assert_eq!(line.as_bytes(), b"/a");
    }

    #[test]
    fn backspace_on_empty_line_is_a_no_op() {
        let mut assembler = LineAssembler::new();
        assert_eq!(assembler.push(DEL), Feed::Ignored);
        assert_eq!(assembler.push(DEL), Feed::Ignored);
        assert_eq!(assembler.len(), 0);
        let line = feed(&mut assembler, b"/a\r").unwrap();
        assert_eq!(line.as_bytes(), b"/a");
    }

    #[test]
    fn overflow_truncates_and_still_sees_terminator() {
        let mut assembler = LineAssembler::new();
        for _ in 0..LINE_PAYLOAD {
            assert_eq!(assembler.push(b'x'), Feed::Stored);
        }
        assert_eq!(assembler.push(b'y'), Feed::Dropped);
        assert_eq!(assembler.push(b'z'), Feed::Dropped);
        assert_eq!(assembler.len(), LINE_PAYLOAD);

        let line = feed(&mut assembler, b"\r").unwrap();
        assert!(line.is_truncated());
        assert_eq!(line.as_bytes().len(), LINE_PAYLOAD);
        assert!(line.as_bytes().iter().all(|&b| b == b'x'));

        // the next line starts clean
        let line = feed(&mut assembler, b"/a\r").unwrap();
        assert!(!line.is_truncated());
        assert_eq!(line.as_bytes(), b"/a");
    }

    #[test]
    fn empty_line_is_still_dispatched() {
        let mut assembler = LineAssembler::new();
        let line = feed(&mut assembler, b"\r").unwrap();
        assert!(line.as_bytes().is_empty());
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let mut queue = ByteQueue::new();
        let (mut producer, mut consumer) = queue.split();
        let stats = RxStats::new();

        for i in 0..(RX_QUEUE_CAPACITY - 1) {
            assert_eq!(deliver_byte(&mut producer, i as u8, &stats), Ok(()));
        }
        assert_eq!(deliver_byte(&mut producer, 0xAA, &stats), Err(RxError::QueueFull));
        assert_eq!(stats.take().queue_full, 1);
        assert!(stats.take().is_clean());

        assert_eq!(consumer.dequeue(), Some(0));
    }

    struct Flaky {
        works: bool,
    }

    impl SerialReceiver for Flaky {
        fn rearm(&mut self) -> Result<(), RearmError> {
            if self.works {
                Ok(())
            } else {
                Err(RearmError)
            }
        }
    }

    #[test]
    fn failed_rearm_is_fatal() {
        assert_eq!(recover_receiver(&mut Flaky { works: true }), Ok(()));
        assert_eq!(
            recover_receiver(&mut Flaky { works: false }),
            Err(Fatal::ReceiverLost)
        );
    }
}
