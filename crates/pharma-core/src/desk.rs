//! # Sales Desk
//!
//! Glue between the scan buffer, the catalog and the cart: everything the
//! sales screen does with the keyboard.
//!
//! ## Resolution
//! ```text
//! ScanSignal::Code("6111245590012")
//!      │
//!      ▼
//! catalog entries with that code
//!      │
//!      ├── 0 ──► NotFound            (cart untouched)
//!      ├── 1 ──► cart.add()          → Added
//!      └── n ──► Ambiguous(n lines)  (cart untouched until select(i))
//! ```
//!
//! ## Keys
//! | Key        | Effect                                  |
//! |------------|-----------------------------------------|
//! | character  | appended to the scan buffer             |
//! | Enter      | completes the buffer now                |
//! | paste      | replaces the buffer and completes it    |
//! | ArrowUp    | +1 on the last cart line                |
//! | ArrowDown  | −1 on the last cart line (0 removes it) |
//! | Delete     | removes the last cart line              |

use crate::cart::Cart;
use crate::error::CoreResult;
use crate::scan::{Clock, ScanBuffer, ScanSignal, ScanState, ScanTiming};
use crate::types::{Medicine, MedicineId};

/// A keyboard event from the scan field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanKey {
    Char(char),
    Enter,
    Paste(String),
    ArrowUp,
    ArrowDown,
    Delete,
}

/// What a key (or a timer tick) did.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Nothing to report yet (still accumulating).
    Pending,
    /// Buffer completed with nothing in it.
    Empty,
    /// Double-fire of the previous code; dropped.
    Suppressed { code: String },
    /// No catalog entry has this code.
    NotFound { code: String },
    /// Several stock lines share the code; operator must pick one.
    Ambiguous { code: String, candidates: Vec<Medicine> },
    /// A line was added or incremented.
    Added { medicine_id: MedicineId, name: String, quantity: i64 },
    /// Arrow key changed the last line.
    Adjusted { medicine_id: MedicineId, quantity: i64 },
    /// Last line removed.
    Removed { medicine_id: MedicineId },
    /// Arrow / Delete with an empty cart.
    NoLine,
}

/// Sales screen state minus the cart (which lives in shared state).
#[derive(Debug)]
pub struct SalesDesk<C: Clock> {
    scanner: ScanBuffer<C>,
    catalog: Vec<Medicine>,
    candidates: Option<Vec<Medicine>>,
}

impl<C: Clock> SalesDesk<C> {
    /// Creates a desk over a catalog.
    ///
    /// Entries without a code can't be scanned and are dropped.
    pub fn new(clock: C, timing: ScanTiming, catalog: Vec<Medicine>) -> Self {
        let mut desk = SalesDesk {
            scanner: ScanBuffer::new(clock, timing),
            catalog: Vec::new(),
            candidates: None,
        };
        desk.set_catalog(catalog);
        desk
    }

    /// Replaces the catalog (after a refresh from the backend).
    pub fn set_catalog(&mut self, catalog: Vec<Medicine>) {
        self.catalog = catalog
            .into_iter()
            .filter(|m| !m.code.trim().is_empty())
            .collect();
    }

    pub fn catalog(&self) -> &[Medicine] {
        &self.catalog
    }

    pub fn scan_state(&self) -> ScanState {
        self.scanner.state()
    }

    /// When the driver should call [`tick`](Self::tick).
    pub fn deadline(&self) -> Option<std::time::Instant> {
        self.scanner.deadline()
    }

    /// Candidates awaiting a [`select`](Self::select).
    pub fn candidates(&self) -> Option<&[Medicine]> {
        self.candidates.as_deref()
    }

    /// Handles one key from the scan field.
    pub fn key(&mut self, key: ScanKey, cart: &mut Cart) -> CoreResult<ScanOutcome> {
        match key {
            ScanKey::Char(c) => {
                self.scanner.push(c);
                Ok(ScanOutcome::Pending)
            }
            ScanKey::Enter => match self.scanner.terminate() {
                Some(signal) => self.resolve(signal, cart),
                None => Ok(ScanOutcome::Pending),
            },
            ScanKey::Paste(text) => match self.scanner.paste(&text) {
                Some(signal) => self.resolve(signal, cart),
                None => Ok(ScanOutcome::Pending),
            },
            ScanKey::ArrowUp => Self::adjust_last(cart, 1),
            ScanKey::ArrowDown => Self::adjust_last(cart, -1),
            ScanKey::Delete => match cart.last_id() {
                Some(id) => {
                    cart.remove(id)?;
                    Ok(ScanOutcome::Removed { medicine_id: id })
                }
                None => Ok(ScanOutcome::NoLine),
            },
        }
    }

    /// Idle timer check; call at or after [`deadline`](Self::deadline).
    pub fn tick(&mut self, cart: &mut Cart) -> CoreResult<ScanOutcome> {
        match self.scanner.poll() {
            Some(signal) => self.resolve(signal, cart),
            None => Ok(ScanOutcome::Pending),
        }
    }

    /// Picks one of the ambiguous candidates (0-based).
    ///
    /// Returns `Ok(None)` when there is nothing to pick or the index is out
    /// of range; the candidate list stays open in the latter case.
    pub fn select(&mut self, index: usize, cart: &mut Cart) -> CoreResult<Option<ScanOutcome>> {
        let chosen = match self.candidates.as_ref().and_then(|c| c.get(index)) {
            Some(medicine) => medicine.clone(),
            None => return Ok(None),
        };
        self.candidates = None;
        let quantity = cart.add(&chosen)?;
        Ok(Some(ScanOutcome::Added {
            medicine_id: chosen.id,
            name: chosen.name,
            quantity,
        }))
    }

    /// Closes the candidate list without adding anything.
    pub fn dismiss(&mut self) {
        self.candidates = None;
    }

    fn resolve(&mut self, signal: ScanSignal, cart: &mut Cart) -> CoreResult<ScanOutcome> {
        let code = match signal {
            ScanSignal::Empty => return Ok(ScanOutcome::Empty),
            ScanSignal::Suppressed(code) => return Ok(ScanOutcome::Suppressed { code }),
            ScanSignal::Code(code) => code,
        };

        let mut matches: Vec<Medicine> = self
            .catalog
            .iter()
            .filter(|m| m.code.trim() == code)
            .cloned()
            .collect();

        let outcome = match matches.len() {
            0 => Ok(ScanOutcome::NotFound { code }),
            1 => {
                let medicine = matches.remove(0);
                self.candidates = None;
                cart.add(&medicine).map(|quantity| ScanOutcome::Added {
                    medicine_id: medicine.id,
                    name: medicine.name,
                    quantity,
                })
            }
            _ => {
                self.candidates = Some(matches.clone());
                Ok(ScanOutcome::Ambiguous {
                    code,
                    candidates: matches,
                })
            }
        };

        self.scanner.resolved();
        outcome
    }

    fn adjust_last(cart: &mut Cart, delta: i64) -> CoreResult<ScanOutcome> {
        match cart.last_id() {
            Some(id) => {
                let quantity = cart.adjust(id, delta)?;
                if quantity == 0 {
                    Ok(ScanOutcome::Removed { medicine_id: id })
                } else {
                    Ok(ScanOutcome::Adjusted {
                        medicine_id: id,
                        quantity,
                    })
                }
            }
            None => Ok(ScanOutcome::NoLine),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
