//! Event window: partitions a transaction's event log between its calls.
//!
//! Events are kept in chronological order and tagged with the index of
//! the call that owns them (initially the root). A forward cursor and a
//! scope end delimit the events still available to the call being
//! visited. Claims never move the cursor backwards, so every event is
//! scanned a bounded number of times and ends up with exactly one owner.

use std::ops::Range;

use unnest_core::models::EventRecord;

use crate::utils::EventName;

/// Rule selecting the events a call owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Every remaining event of the enclosing scope.
    All,
    /// Events up to, excluding, the first `event` found at or after
    /// `offset` positions past the cursor.
    Named { event: EventName, offset: usize },
}

impl Boundary {
    pub fn named(event: EventName, offset: usize) -> Self {
        Self::Named { event, offset }
    }
}

/// Scope saved by [`Correlator::claim`] and restored by [`Correlator::release`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Claim {
    parent_end: usize,
    resume_at: Option<usize>,
}

/// Event bookkeeping strategy used by the tree walk.
pub(crate) trait Correlator<'t> {
    /// Whether claims attribute events to calls.
    const ATTRIBUTES: bool;

    /// Events an extractor may inspect for the call being visited.
    fn visible(&self) -> &'t [EventRecord];

    /// Apply `boundary` for call `owner` and narrow the scope for its children.
    fn claim(&mut self, owner: usize, boundary: Option<&Boundary>) -> Claim;

    /// Leave the scope opened by `claim`.
    fn release(&mut self, claim: Claim);
}

// =============================================================================
// Scope cursor
// =============================================================================

/// Forward cursor and scope end shared by both bookkeeping strategies.
#[derive(Debug)]
struct Scope<'t> {
    events: &'t [EventRecord],
    pointer: usize,
    scope_end: usize,
}

impl<'t> Scope<'t> {
    fn new(events: &'t [EventRecord]) -> Self {
        Self {
            events,
            pointer: 0,
            scope_end: events.len(),
        }
    }

    fn visible(&self) -> &'t [EventRecord] {
        &self.events[self.pointer..self.scope_end]
    }

    /// Narrow the scope for `boundary` and return the claimed event range.
    fn claim(&mut self, boundary: Option<&Boundary>) -> (Claim, Range<usize>) {
        let parent_end = self.scope_end;
        let unclaimed = Claim {
            parent_end,
            resume_at: None,
        };

        match boundary {
            None => {
                self.scope_end = self.pointer;
                (unclaimed, self.pointer..self.pointer)
            }
            Some(Boundary::All) => (unclaimed, self.pointer..self.scope_end),
            Some(Boundary::Named { event, offset }) => {
                let from = self.pointer.saturating_add(*offset).min(self.scope_end);
                let found = (from..self.scope_end).find(|&i| event.matches(&self.events[i]));

                match found {
                    Some(end) => {
                        let claimed = self.pointer..end;
                        self.scope_end = end;
                        let claim = Claim {
                            parent_end,
                            resume_at: Some(end + 1),
                        };
                        (claim, claimed)
                    }
                    None => {
                        self.scope_end = self.pointer;
                        (unclaimed, self.pointer..self.pointer)
                    }
                }
            }
        }
    }

    fn release(&mut self, claim: Claim) {
        self.scope_end = claim.parent_end;
        if let Some(resume_at) = claim.resume_at {
            self.pointer = resume_at.min(self.scope_end);
        }
    }
}

// =============================================================================
// Correlated window
// =============================================================================

/// Cursor over a chronological event log, tagging each event with its owner.
#[derive(Debug)]
pub struct EventWindow<'t> {
    scope: Scope<'t>,
    owners: Vec<usize>,
}

impl<'t> EventWindow<'t> {
    pub fn new(events: &'t [EventRecord]) -> Self {
        Self {
            scope: Scope::new(events),
            owners: vec![0; events.len()],
        }
    }

    pub fn pointer(&self) -> usize {
        self.scope.pointer
    }

    /// Owner call index of each event, in log order.
    pub fn into_owners(self) -> Vec<usize> {
        self.owners
    }
}

impl<'t> Correlator<'t> for EventWindow<'t> {
    const ATTRIBUTES: bool = true;

    fn visible(&self) -> &'t [EventRecord] {
        self.scope.visible()
    }

    fn claim(&mut self, owner: usize, boundary: Option<&Boundary>) -> Claim {
        let (claim, claimed) = self.scope.claim(boundary);
        self.owners[claimed].fill(owner);
        claim
    }

    fn release(&mut self, claim: Claim) {
        self.scope.release(claim);
    }
}

// =============================================================================
// Unattributed (basic mode)
// =============================================================================

/// Moves through scopes like [`EventWindow`] without recording owners, so
/// extractors see the same events in both modes.
#[derive(Debug)]
pub(crate) struct Unattributed<'t> {
    scope: Scope<'t>,
}

impl<'t> Unattributed<'t> {
    pub(crate) fn new(events: &'t [EventRecord]) -> Self {
        Self {
            scope: Scope::new(events),
        }
    }
}

impl<'t> Correlator<'t> for Unattributed<'t> {
    const ATTRIBUTES: bool = false;

    fn visible(&self) -> &'t [EventRecord] {
        self.scope.visible()
    }

    fn claim(&mut self, _owner: usize, boundary: Option<&Boundary>) -> Claim {
        self.scope.claim(boundary).0
    }

    fn release(&mut self, claim: Claim) {
        self.scope.release(claim);
    }
}
