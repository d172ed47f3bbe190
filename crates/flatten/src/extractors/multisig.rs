//! `multisig.asMulti` and `multisig.asMultiThreshold1`.

use unnest_core::error::{FlattenError, FlattenResult};
use unnest_core::models::{AccountId, DelegationLink};

use super::{Child, ExtractContext};
use crate::utils::events::MULTISIG_EXECUTED;
use crate::utils::{accounts_arg, dispatch_result, inner_call, rfind_event, u16_arg};
use crate::window::Boundary;

/// `asMulti` only dispatches its call once the threshold is reached.
pub(super) fn as_multi<'t>(ctx: &ExtractContext<'t>) -> FlattenResult<Vec<Child<'t>>> {
    let Some(position) = rfind_event(ctx.events, MULTISIG_EXECUTED) else {
        return Ok(Vec::new());
    };

    let inner = inner_call(ctx.call, "call")?;
    let threshold = u16_arg(ctx.call, "threshold")?;
    let acting = multisig_account(ctx, threshold)?;
    let child = Child::new(inner).delegated(DelegationLink::multisig(acting));

    let error = dispatch_result(&ctx.events[position], "result")?;
    Ok(vec![child
        .bounded(Boundary::named(MULTISIG_EXECUTED, position))
        .failed(error)])
}

pub(super) fn as_multi_threshold_1<'t>(ctx: &ExtractContext<'t>) -> FlattenResult<Vec<Child<'t>>> {
    let inner = inner_call(ctx.call, "call")?;
    let acting = multisig_account(ctx, 1)?;
    let child = Child::new(inner).delegated(DelegationLink::multisig(acting));

    Ok(vec![child.bounded(Boundary::All)])
}

/// Multisig account for `other_signatories` plus the acting origin.
fn multisig_account(ctx: &ExtractContext<'_>, threshold: u16) -> FlattenResult<AccountId> {
    let mut signatories = accounts_arg(ctx.call, "other_signatories")?;
    let origin = ctx
        .origin
        .clone()
        .ok_or_else(|| FlattenError::MissingArgument {
            call: ctx.call.signature(),
            argument: "signer".to_string(),
        })?;
    signatories.push(origin);
    Ok(ctx.deriver.derive(&signatories, threshold))
}
