//! Per-item event groups of the `utility` batch calls.
//!
//! Each batch item ends with an `ItemCompleted` or `ItemFailed` event.
//! Items that are themselves batches emit their own item terminators
//! first, so raw groups are reconciled against the item calls until there
//! is one group per item.

use unnest_core::models::{Call, EventRecord};

use super::nested_calls;
use crate::registry::{CallKind, ExtractorRegistry};
use crate::utils::EventName;
use crate::utils::events::{
    BATCH_COMPLETED, BATCH_COMPLETED_WITH_ERRORS, BATCH_INTERRUPTED, ITEM_COMPLETED, ITEM_FAILED,
};

/// Events `start..=end` of one item, `end` being its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Group {
    pub start: usize,
    pub end: usize,
    /// Terminated by `ItemFailed`.
    pub failed: bool,
}

impl Group {
    pub fn terminator(&self) -> EventName {
        if self.failed { ITEM_FAILED } else { ITEM_COMPLETED }
    }

    /// Terminator position relative to the group start.
    pub fn offset(&self) -> usize {
        self.end - self.start
    }

    fn merge(self, next: Group) -> Group {
        Group {
            start: self.start,
            end: next.end,
            failed: next.failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Grouping {
    pub groups: Vec<Group>,
    /// Start of the events following the last terminator.
    pub rest: usize,
}

impl Grouping {
    /// Split `events` after every item terminator.
    pub fn split(events: &[EventRecord]) -> Self {
        let mut groups = Vec::new();
        let mut start = 0;

        for (i, event) in events.iter().enumerate() {
            let failed = ITEM_FAILED.matches(event);
            if failed || ITEM_COMPLETED.matches(event) {
                groups.push(Group { start, end: i, failed });
                start = i + 1;
            }
        }

        Self { groups, rest: start }
    }

    /// Bring the group count down to `calls.len()`.
    ///
    /// The structural pass counts the terminators each call should emit;
    /// when that does not add up, groups holding a nested batch outcome
    /// are merged into their predecessor.
    pub fn reconcile(
        &mut self,
        events: &[EventRecord],
        calls: &[Call],
        registry: &ExtractorRegistry,
        max_depth: usize,
    ) {
        if self.groups.len() <= calls.len() {
            return;
        }

        let expected: Vec<usize> = calls
            .iter()
            .map(|call| 1 + inner_terminators(call, registry, max_depth))
            .collect();

        if expected.iter().sum::<usize>() == self.groups.len() {
            let mut raw = self.groups.iter().copied();
            self.groups = expected
                .iter()
                .filter_map(|&count| {
                    let first = raw.next()?;
                    Some((1..count).filter_map(|_| raw.next()).fold(first, Group::merge))
                })
                .collect();
            return;
        }

        while self.groups.len() > calls.len() {
            let candidate = (1..self.groups.len()).find(|&i| {
                let group = self.groups[i];
                events[group.start..=group.end].iter().any(is_batch_outcome)
            });
            let Some(i) = candidate else {
                break;
            };
            let next = self.groups.remove(i);
            self.groups[i - 1] = self.groups[i - 1].merge(next);
        }
    }
}

/// Item terminators emitted inside `call`, following wrappers.
fn inner_terminators(call: &Call, registry: &ExtractorRegistry, depth: usize) -> usize {
    if depth == 0 {
        return 0;
    }
    match registry.resolve(&call.module, &call.method) {
        CallKind::Leaf => 0,
        CallKind::Composite(kind) if kind.is_batch() => nested_calls(kind, call)
            .into_iter()
            .map(|item| 1 + inner_terminators(item, registry, depth - 1))
            .sum(),
        CallKind::Composite(kind) => nested_calls(kind, call)
            .into_iter()
            .map(|inner| inner_terminators(inner, registry, depth - 1))
            .sum(),
    }
}

fn is_batch_outcome(event: &EventRecord) -> bool {
    BATCH_COMPLETED.matches(event)
        || BATCH_INTERRUPTED.matches(event)
        || BATCH_COMPLETED_WITH_ERRORS.matches(event)
}
