//! `proxy.proxy` and `proxy.proxyAnnounced`.

use unnest_core::error::FlattenResult;
use unnest_core::models::DelegationLink;

use super::{Child, ExtractContext};
use crate::utils::events::PROXY_EXECUTED;
use crate::utils::{account_arg, dispatch_result, inner_call, rfind_event};
use crate::window::Boundary;

pub(super) fn extract<'t>(ctx: &ExtractContext<'t>) -> FlattenResult<Vec<Child<'t>>> {
    let inner = inner_call(ctx.call, "call")?;
    let real = account_arg(ctx.call, "real")?;
    let child = Child::new(inner).delegated(DelegationLink::proxied(real));

    // Without ProxyExecuted the wrapped call is still exposed, with no events
    let Some(position) = rfind_event(ctx.events, PROXY_EXECUTED) else {
        return Ok(vec![child]);
    };
    let error = dispatch_result(&ctx.events[position], "result")?;

    Ok(vec![child
        .bounded(Boundary::named(PROXY_EXECUTED, position))
        .failed(error)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use serde_json::json;
    use unnest_core::error::FlattenError;
    use unnest_core::models::{Call, DispatchError, EventRecord};

    type Outcome = (Option<Boundary>, Option<DispatchError>);

    fn run(call: &Call, events: &[EventRecord]) -> FlattenResult<Vec<Outcome>> {
        let env = ExtractEnv::new();
        Ok(extract(&env.ctx(call, events))?
            .into_iter()
            .map(|child| {
                assert_eq!(child.delegation, Some(DelegationLink::proxied(account(0xaa))));
                (child.boundary, child.dispatch_error)
            })
            .collect())
    }

    #[test]
    fn test_boundary_and_error_from_proxy_executed() {
        let events = log(vec![remarked(), event("proxy", "ProxyExecuted", err("BadOrigin"))]);
        let children = run(&proxy_call(0xaa, remark()), &events).unwrap();
        assert_eq!(
            children,
            vec![(
                Some(Boundary::named(PROXY_EXECUTED, 1)),
                Some(DispatchError(json!({ "BadOrigin": null })))
            )]
        );
    }

    // Test critique: sans ProxyExecuted, l'appel interne est exposé sans événements
    #[test]
    fn test_missing_proxy_executed_exposes_child_without_events() {
        let events = log(vec![event("system", "ExtrinsicFailed", json!({}))]);
        assert_eq!(run(&proxy_call(0xaa, remark()), &events).unwrap(), vec![(None, None)]);
    }

    #[test]
    fn test_positional_event_data_is_rejected() {
        let events = log(vec![event("proxy", "ProxyExecuted", json!([{ "Ok": null }]))]);
        assert_eq!(
            run(&proxy_call(0xaa, remark()), &events).unwrap_err(),
            FlattenError::NoNamedFields("proxy.ProxyExecuted".into())
        );
    }

    #[test]
    fn test_missing_real_argument() {
        let call = Call::new("proxy", "proxy").with_arg("call", remark());
        assert!(matches!(
            run(&call, &[]),
            Err(FlattenError::MissingArgument { argument, .. }) if argument == "real"
        ));
    }
}
