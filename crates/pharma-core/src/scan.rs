//! # Barcode Scan Buffer
//!
//! Reassembles the keystroke burst of a USB barcode scanner into one code.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            push(c)                       push(c): deadline reset        │
//! │   ┌──────┐ ───────► ┌──────────────┐ ◄──────────────┐                   │
//! │   │ Idle │          │ Accumulating │ ───────────────┘                   │
//! │   └──────┘ ◄─┐      └──────┬───────┘                                    │
//! │      ▲       │             │ poll() past deadline                       │
//! │      │       │             │ terminate() / paste()                      │
//! │      │       │             ▼                                            │
//! │      │       │   decode + duplicate check                               │
//! │      │       │      │            │                                      │
//! │      │       └──────┘ Empty /    │ Code                                 │
//! │      │         Suppressed        ▼                                      │
//! │      │                    ┌───────────┐                                 │
//! │      └─────── resolved() ─│ Resolving │  (caller looks the code up)     │
//! │       (or Accumulating    └───────────┘                                 │
//! │        if keys arrived meanwhile)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Time is read through [`Clock`], so tests drive the buffer with a
//! [`ManualClock`] and never sleep.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Idle gap after which an accumulated buffer is considered complete.
pub const SCAN_IDLE_MS: u64 = 80;

/// Window in which an identical code is treated as a scanner double-fire.
pub const DUPLICATE_WINDOW_MS: u64 = 800;

// =============================================================================
// Keyboard Layout Decoding
// =============================================================================

/// AZERTY number row without Shift: what the scanner "types" for 1..0.
const AZERTY_DIGITS: [(char, char); 10] = [
    ('&', '1'),
    ('é', '2'),
    ('"', '3'),
    ('\'', '4'),
    ('(', '5'),
    ('-', '6'),
    ('è', '7'),
    ('_', '8'),
    ('ç', '9'),
    ('à', '0'),
];

/// Undoes the AZERTY digit remapping.
///
/// Characters outside the map pass through unchanged.
///
/// ## Example
/// ```rust
/// use pharma_core::scan::decode_scanned;
///
/// assert_eq!(decode_scanned("&é\"'(-è_çà"), "1234567890");
/// assert_eq!(decode_scanned("é5X"), "25X");
/// ```
pub fn decode_scanned(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            AZERTY_DIGITS
                .iter()
                .find(|(symbol, _)| *symbol == c)
                .map(|(_, digit)| *digit)
                .unwrap_or(c)
        })
        .collect()
}

// =============================================================================
// Clock
// =============================================================================

/// Source of monotonic time for the buffer.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle while the
/// buffer owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            origin: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Moves time forward.
    pub fn advance(&self, ms: u64) {
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Timing knobs of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTiming {
    pub idle_ms: u64,
    pub duplicate_window_ms: u64,
}

impl Default for ScanTiming {
    fn default() -> Self {
        ScanTiming {
            idle_ms: SCAN_IDLE_MS,
            duplicate_window_ms: DUPLICATE_WINDOW_MS,
        }
    }
}

// =============================================================================
// Scan Buffer
// =============================================================================

/// Where the buffer is in a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Accumulating { deadline: Instant },
    Resolving,
}

/// What a completed buffer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanSignal {
    /// A decoded code to look up. The buffer waits in `Resolving`.
    Code(String),
    /// Same code as the previous scan, inside the duplicate window.
    Suppressed(String),
    /// Nothing left after trimming.
    Empty,
}

/// Accumulates scanner keystrokes into codes.
#[derive(Debug)]
pub struct ScanBuffer<C: Clock> {
    clock: C,
    timing: ScanTiming,
    state: ScanState,
    buffer: String,
    last_key_at: Option<Instant>,
    last_resolved: Option<(String, Instant)>,
}

impl<C: Clock> ScanBuffer<C> {
    pub fn new(clock: C, timing: ScanTiming) -> Self {
        ScanBuffer {
            clock,
            timing,
            state: ScanState::Idle,
            buffer: String::new(),
            last_key_at: None,
            last_resolved: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Raw characters received so far.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// When the driver should call [`poll`](Self::poll) next.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ScanState::Accumulating { deadline } => Some(deadline),
            _ => None,
        }
    }

    fn idle(&self) -> Duration {
        Duration::from_millis(self.timing.idle_ms)
    }

    /// Appends one character and restarts the idle timer.
    ///
    /// Keys arriving while a code is being resolved are kept for the next
    /// session.
    pub fn push(&mut self, c: char) {
        let now = self.clock.now();
        self.buffer.push(c);
        self.last_key_at = Some(now);
        if self.state != ScanState::Resolving {
            self.state = ScanState::Accumulating {
                deadline: now + self.idle(),
            };
        }
    }

    /// Completes the buffer if the idle timer has elapsed.
    pub fn poll(&mut self) -> Option<ScanSignal> {
        match self.state {
            ScanState::Accumulating { deadline } if self.clock.now() >= deadline => {
                Some(self.complete())
            }
            _ => None,
        }
    }

    /// Terminator key: completes the buffer now.
    pub fn terminate(&mut self) -> Option<ScanSignal> {
        match self.state {
            ScanState::Resolving => None,
            ScanState::Idle if self.buffer.is_empty() => Some(ScanSignal::Empty),
            _ => Some(self.complete()),
        }
    }

    /// Paste: the pasted text replaces the buffer and completes at once.
    pub fn paste(&mut self, text: &str) -> Option<ScanSignal> {
        if self.state == ScanState::Resolving {
            return None;
        }
        self.buffer = text.to_string();
        Some(self.complete())
    }

    /// Marks the current code as handled.
    pub fn resolved(&mut self) {
        if self.state != ScanState::Resolving {
            return;
        }
        self.state = match (self.buffer.is_empty(), self.last_key_at) {
            (false, Some(at)) => ScanState::Accumulating {
                deadline: at + self.idle(),
            },
            _ => ScanState::Idle,
        };
    }

    fn complete(&mut self) -> ScanSignal {
        let now = self.clock.now();
        let raw = std::mem::take(&mut self.buffer);
        let code = decode_scanned(raw.trim());

        if code.is_empty() {
            self.state = ScanState::Idle;
            return ScanSignal::Empty;
        }

        let window = Duration::from_millis(self.timing.duplicate_window_ms);
        if let Some((last_code, at)) = &self.last_resolved {
            if *last_code == code && now.duration_since(*at) < window {
                self.state = ScanState::Idle;
                return ScanSignal::Suppressed(code);
            }
        }

        self.last_resolved = Some((code.clone(), now));
        self.state = ScanState::Resolving;
        ScanSignal::Code(code)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> (ManualClock, ScanBuffer<ManualClock>) {
        let clock = ManualClock::new();
        (clock.clone(), ScanBuffer::new(clock, ScanTiming::default()))
    }

    fn type_str(buf: &mut ScanBuffer<ManualClock>, clock: &ManualClock, s: &str) {
        for c in s.chars() {
            buf.push(c);
            clock.advance(5);
        }
    }

    #[test]
    fn test_decode_every_symbol() {
        for (symbol, digit) in AZERTY_DIGITS {
            assert_eq!(decode_scanned(&symbol.to_string()), digit.to_string());
        }
    }

    #[test]
    fn test_decode_keeps_positions() {
        assert_eq!(decode_scanned("é5"), "25");
        assert_eq!(decode_scanned("AB&Z"), "AB1Z");
        assert_eq!(decode_scanned(""), "");
    }

    #[test]
    fn test_idle_timer_completes_buffer() {
        let (clock, mut buf) = buffer();
        type_str(&mut buf, &clock, "&éé");

        assert!(matches!(buf.state(), ScanState::Accumulating { .. }));
        assert_eq!(buf.poll(), None);

        clock.advance(SCAN_IDLE_MS);
        assert_eq!(buf.poll(), Some(ScanSignal::Code("122".to_string())));
        assert_eq!(buf.state(), ScanState::Resolving);

        buf.resolved();
        assert_eq!(buf.state(), ScanState::Idle);
    }

    #[test]
    fn test_each_key_resets_timer() {
        let (clock, mut buf) = buffer();
        buf.push('1');
        clock.advance(70);
        buf.push('2');
        clock.advance(70);
        assert_eq!(buf.poll(), None);
        clock.advance(10);
        assert_eq!(buf.poll(), Some(ScanSignal::Code("12".to_string())));
    }

    #[test]
    fn test_terminator_resolves_immediately() {
        let (clock, mut buf) = buffer();
        type_str(&mut buf, &clock, "à12");
        assert_eq!(buf.terminate(), Some(ScanSignal::Code("012".to_string())));
        assert_eq!(buf.deadline(), None);
    }

    #[test]
    fn test_raw_buffer_is_trimmed() {
        let (_clock, mut buf) = buffer();
        assert_eq!(buf.paste("  123 \t"), Some(ScanSignal::Code("123".to_string())));
    }

    #[test]
    fn test_empty_buffer_is_noop() {
        let (clock, mut buf) = buffer();
        assert_eq!(buf.terminate(), Some(ScanSignal::Empty));
        type_str(&mut buf, &clock, "   ");
        assert_eq!(buf.terminate(), Some(ScanSignal::Empty));
        assert_eq!(buf.state(), ScanState::Idle);
    }

    #[test]
    fn test_duplicate_within_window_is_suppressed() {
        let (clock, mut buf) = buffer();
        assert_eq!(buf.paste("123"), Some(ScanSignal::Code("123".to_string())));
        buf.resolved();

        clock.advance(DUPLICATE_WINDOW_MS - 1);
        assert_eq!(buf.paste("123"), Some(ScanSignal::Suppressed("123".to_string())));
        assert_eq!(buf.state(), ScanState::Idle);
    }

    #[test]
    fn test_duplicate_after_window_goes_through() {
        let (clock, mut buf) = buffer();
        buf.paste("123");
        buf.resolved();

        clock.advance(DUPLICATE_WINDOW_MS);
        assert_eq!(buf.paste("123"), Some(ScanSignal::Code("123".to_string())));
    }

    #[test]
    fn test_different_code_is_not_suppressed() {
        let (_clock, mut buf) = buffer();
        buf.paste("123");
        buf.resolved();
        assert_eq!(buf.paste("124"), Some(ScanSignal::Code("124".to_string())));
    }

    #[test]
    fn test_keys_during_resolution_start_next_session() {
        let (clock, mut buf) = buffer();
        buf.paste("111");
        buf.push('2');
        assert_eq!(buf.state(), ScanState::Resolving);
        assert_eq!(buf.terminate(), None);

        buf.resolved();
        assert!(matches!(buf.state(), ScanState::Accumulating { .. }));
        clock.advance(SCAN_IDLE_MS);
        assert_eq!(buf.poll(), Some(ScanSignal::Code("2".to_string())));
    }
}
