//! `utility` pallet: batches, `asDerivative` and `dispatchAs`.

use unnest_core::error::{FlattenError, FlattenResult};
use unnest_core::models::{Call, DispatchError, EventRecord};

use super::grouping::{Group, Grouping};
use super::{Child, ExtractContext};
use crate::config::BatchAllEvents;
use crate::utils::events::{BATCH_COMPLETED, BATCH_INTERRUPTED, DISPATCHED_AS};
use crate::utils::{
    dispatch_error, dispatch_result, event_field, find_event, inner_call, parse_u64,
    positional_call, positional_calls, rfind_event,
};
use crate::window::Boundary;

// =============================================================================
// Batches
// =============================================================================

/// How a batch ended, read from the events after its last item.
#[derive(Debug, Clone, PartialEq)]
enum BatchOutcome {
    Completed,
    Interrupted { index: usize, error: DispatchError },
    /// `BatchCompletedWithErrors`, or no outcome event at all.
    Other,
}

impl BatchOutcome {
    fn read(events: &[EventRecord]) -> FlattenResult<Self> {
        let completed = find_event(events, BATCH_COMPLETED);
        let interrupted = find_event(events, BATCH_INTERRUPTED);

        match (interrupted, completed) {
            (Some(i), c) if c.is_none_or(|c| i < c) => {
                let event = &events[i];
                let index = parse_u64(event_field(event, "index")?).ok_or_else(|| {
                    FlattenError::MissingEventField {
                        event: event.name(),
                        field: "index".to_string(),
                    }
                })?;
                Ok(Self::Interrupted {
                    index: usize::try_from(index).unwrap_or(usize::MAX),
                    error: dispatch_error(event, "error")?,
                })
            }
            (_, Some(_)) => Ok(Self::Completed),
            _ => Ok(Self::Other),
        }
    }
}

/// Item calls of a batch, bounded by `max_batch_size`.
fn batch_items<'t>(ctx: &ExtractContext<'t>) -> FlattenResult<&'t [Call]> {
    let calls = positional_calls(ctx.call, 0)?;
    if calls.len() > ctx.config.max_batch_size {
        return Err(FlattenError::BatchTooLarge {
            count: calls.len(),
            limit: ctx.config.max_batch_size,
        });
    }
    Ok(calls)
}

fn grouped(ctx: &ExtractContext<'_>, calls: &[Call]) -> Grouping {
    let mut grouping = Grouping::split(ctx.events);
    grouping.reconcile(ctx.events, calls, ctx.registry, ctx.config.max_depth);
    grouping
}

fn bounded<'t>(child: Child<'t>, group: Option<&Group>) -> Child<'t> {
    match group {
        Some(group) => child.bounded(Boundary::named(group.terminator(), group.offset())),
        None => child,
    }
}

/// `utility.batch`: stops at the first failing item.
pub(super) fn batch<'t>(ctx: &ExtractContext<'t>) -> FlattenResult<Vec<Child<'t>>> {
    let calls = batch_items(ctx)?;
    let mut grouping = Grouping::split(ctx.events);
    let outcome = BatchOutcome::read(&ctx.events[grouping.rest..])?;

    match outcome {
        BatchOutcome::Interrupted { index, error } => {
            let executed = &calls[..index.min(calls.len())];
            grouping.reconcile(ctx.events, executed, ctx.registry, ctx.config.max_depth);

            Ok(calls
                .iter()
                .enumerate()
                .map(|(i, call)| {
                    if i < executed.len() {
                        bounded(Child::new(call), grouping.groups.get(i))
                    } else {
                        Child::new(call).failed(Some(error.clone()))
                    }
                })
                .collect())
        }
        _ => {
            grouping.reconcile(ctx.events, calls, ctx.registry, ctx.config.max_depth);
            Ok(calls
                .iter()
                .enumerate()
                .map(|(i, call)| bounded(Child::new(call), grouping.groups.get(i)))
                .collect())
        }
    }
}

/// `utility.batchAll`: all items succeed or the whole call is reverted.
pub(super) fn batch_all<'t>(ctx: &ExtractContext<'t>) -> FlattenResult<Vec<Child<'t>>> {
    let calls = batch_items(ctx)?;
    let ungrouped =
        ctx.dispatch_error.is_some() || ctx.config.batch_all_events == BatchAllEvents::None;
    if ungrouped {
        return Ok(calls.iter().map(Child::new).collect());
    }

    let grouping = grouped(ctx, calls);
    Ok(calls
        .iter()
        .enumerate()
        .map(|(i, call)| bounded(Child::new(call), grouping.groups.get(i)))
        .collect())
}

/// `utility.forceBatch`: every item runs, failures are reported per item.
pub(super) fn force_batch<'t>(ctx: &ExtractContext<'t>) -> FlattenResult<Vec<Child<'t>>> {
    let calls = batch_items(ctx)?;
    let grouping = grouped(ctx, calls);
    let all_succeeded =
        BatchOutcome::read(&ctx.events[grouping.rest..])? == BatchOutcome::Completed;

    calls
        .iter()
        .enumerate()
        .map(|(i, call)| {
            let group = grouping.groups.get(i);
            let error = match group {
                Some(group) if group.failed && !all_succeeded => {
                    Some(dispatch_error(&ctx.events[group.end], "error")?)
                }
                _ => None,
            };
            Ok(bounded(Child::new(call), group).failed(error))
        })
        .collect()
}

// =============================================================================
// Wrappers
// =============================================================================

/// `utility.asDerivative(index, call)`.
pub(super) fn as_derivative<'t>(ctx: &ExtractContext<'t>) -> FlattenResult<Vec<Child<'t>>> {
    let child = Child::new(positional_call(ctx.call, 1)?);
    Ok(vec![child.bounded(Boundary::All)])
}

/// `utility.dispatchAs(as_origin, call)`.
pub(super) fn dispatch_as<'t>(ctx: &ExtractContext<'t>) -> FlattenResult<Vec<Child<'t>>> {
    let child = Child::new(inner_call(ctx.call, "call")?);
    match rfind_event(ctx.events, DISPATCHED_AS) {
        Some(position) => {
            let error = dispatch_result(&ctx.events[position], "result")?;
            Ok(vec![child
                .bounded(Boundary::named(DISPATCHED_AS, position))
                .failed(error)])
        }
        None => Ok(vec![child.bounded(Boundary::All)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::utils::events::{ITEM_COMPLETED, ITEM_FAILED};
    use serde_json::json;

    fn boundaries(children: &[Child<'_>]) -> Vec<Option<Boundary>> {
        children.iter().map(|c| c.boundary).collect()
    }

    #[test]
    fn test_batch_completed() {
        let env = ExtractEnv::new();
        let call = batch_call("batch", vec![transfer(), remark()]);
        let events = log(vec![
            transferred(),
            item_completed(),
            remarked(),
            item_completed(),
            batch_completed(),
        ]);

        let children = batch(&env.ctx(&call, &events)).unwrap();
        assert_eq!(
            boundaries(&children),
            vec![
                Some(Boundary::named(ITEM_COMPLETED, 1)),
                Some(Boundary::named(ITEM_COMPLETED, 1)),
            ]
        );
        assert!(children.iter().all(|c| c.dispatch_error.is_none()));
    }

    // Test critique: après une interruption, les appels restants portent l'erreur
    #[test]
    fn test_batch_interrupted() {
        let env = ExtractEnv::new();
        let call = batch_call("batch", vec![remark(), transfer(), remark()]);
        let events = log(vec![
            remarked(),
            item_completed(),
            batch_interrupted(1, "InsufficientBalance"),
        ]);

        let children = batch(&env.ctx(&call, &events)).unwrap();
        let expected = Some(DispatchError(json!({ "InsufficientBalance": null })));

        assert_eq!(children[0].boundary, Some(Boundary::named(ITEM_COMPLETED, 1)));
        assert_eq!(children[0].dispatch_error, None);
        for child in &children[1..] {
            assert_eq!(child.boundary, None);
            assert_eq!(child.dispatch_error, expected);
        }
    }

    #[test]
    fn test_batch_too_large() {
        let env = ExtractEnv::new();
        let call = batch_call("batch", vec![remark(); 51]);

        assert_eq!(
            batch(&env.ctx(&call, &[])).unwrap_err(),
            FlattenError::BatchTooLarge {
                count: 51,
                limit: 50
            }
        );
        let ok = batch_call("batch", vec![remark(); 50]);
        assert_eq!(batch(&env.ctx(&ok, &[])).unwrap().len(), 50);
    }

    #[test]
    fn test_batch_all_failed_children_own_nothing() {
        let env = ExtractEnv::new();
        let call = batch_call("batch_all", vec![remark(), transfer()]);
        let events = log(vec![event("system", "ExtrinsicFailed", json!({}))]);
        let mut ctx = env.ctx(&call, &events);
        ctx.dispatch_error = Some(DispatchError(json!({ "Token": "FundsUnavailable" })));

        let children = batch_all(&ctx).unwrap();
        assert_eq!(boundaries(&children), vec![None, None]);
        assert!(children.iter().all(|c| c.dispatch_error.is_none()));
    }

    #[test]
    fn test_batch_all_event_modes() {
        let mut env = ExtractEnv::new();
        let call = batch_call("batch_all", vec![remark(), remark()]);
        let events = log(vec![
            remarked(),
            item_completed(),
            remarked(),
            item_completed(),
            batch_completed(),
        ]);

        let grouped = batch_all(&env.ctx(&call, &events)).unwrap();
        assert!(grouped.iter().all(|c| c.boundary.is_some()));

        env.config.batch_all_events = BatchAllEvents::None;
        let ungrouped = batch_all(&env.ctx(&call, &events)).unwrap();
        assert_eq!(boundaries(&ungrouped), vec![None, None]);
    }

    #[test]
    fn test_force_batch_with_errors() {
        let env = ExtractEnv::new();
        let call = batch_call("force_batch", vec![transfer(), remark()]);
        let events = log(vec![
            item_failed("BadOrigin"),
            remarked(),
            item_completed(),
            event("utility", "BatchCompletedWithErrors", json!({})),
        ]);

        let children = force_batch(&env.ctx(&call, &events)).unwrap();
        assert_eq!(
            boundaries(&children),
            vec![
                Some(Boundary::named(ITEM_FAILED, 0)),
                Some(Boundary::named(ITEM_COMPLETED, 1)),
            ]
        );
        assert_eq!(
            children[0].dispatch_error,
            Some(DispatchError(json!({ "BadOrigin": null })))
        );
        assert_eq!(children[1].dispatch_error, None);
    }

    #[test]
    fn test_as_derivative_uses_second_positional_argument() {
        let env = ExtractEnv::new();
        let call = Call::new("utility", "as_derivative")
            .with_arg("index", json!(3))
            .with_arg("call", transfer());

        let children = as_derivative(&env.ctx(&call, &[])).unwrap();
        assert_eq!(children[0].call, &transfer());
        assert_eq!(children[0].boundary, Some(Boundary::All));
        assert_eq!(children[0].delegation, None);
    }

    #[test]
    fn test_dispatch_as() {
        let env = ExtractEnv::new();
        let call = Call::new("utility", "dispatch_as")
            .with_arg("as_origin", json!({ "system": { "Root": null } }))
            .with_arg("call", remark());

        let events = log(vec![remarked(), event("utility", "DispatchedAs", err("BadOrigin"))]);
        let children = dispatch_as(&env.ctx(&call, &events)).unwrap();
        assert_eq!(children[0].boundary, Some(Boundary::named(DISPATCHED_AS, 1)));
        assert!(children[0].dispatch_error.is_some());

        let quiet = log(vec![remarked()]);
        let children = dispatch_as(&env.ctx(&call, &quiet)).unwrap();
        assert_eq!(children[0].boundary, Some(Boundary::All));
    }
}
