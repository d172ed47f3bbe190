//! Extractors: expose the inner calls of composite calls.
//!
//! Each extractor inspects the call arguments and the events visible to
//! the call, and returns its children in order with
//! the boundary, dispatch error and delegation link each one inherits.

mod grouping;
mod multisig;
mod proxy;
mod utility;

use unnest_core::error::FlattenResult;
use unnest_core::models::{AccountId, Call, DelegationLink, DispatchError, EventRecord};

use crate::address::MultisigDeriver;
use crate::config::FlattenerConfig;
use crate::registry::{CompositeKind, ExtractorRegistry};
use crate::window::Boundary;

/// Everything an extractor may look at.
pub struct ExtractContext<'t> {
    /// The composite call being unwrapped.
    pub call: &'t Call,
    /// Account the call is dispatched as: the last delegate, else the signer.
    pub origin: Option<AccountId>,
    /// Dispatch error already attributed to the composite call.
    pub dispatch_error: Option<DispatchError>,
    /// Events not yet claimed within the call's scope.
    pub events: &'t [EventRecord],
    pub config: &'t FlattenerConfig,
    pub registry: &'t ExtractorRegistry,
    pub deriver: &'t dyn MultisigDeriver,
}

/// One inner call and what it inherits from its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Child<'t> {
    pub call: &'t Call,
    pub boundary: Option<Boundary>,
    pub dispatch_error: Option<DispatchError>,
    pub delegation: Option<DelegationLink>,
}

impl<'t> Child<'t> {
    pub fn new(call: &'t Call) -> Self {
        Self {
            call,
            boundary: None,
            dispatch_error: None,
            delegation: None,
        }
    }

    pub fn bounded(mut self, boundary: Boundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub fn failed(mut self, error: Option<DispatchError>) -> Self {
        self.dispatch_error = error;
        self
    }

    pub fn delegated(mut self, link: DelegationLink) -> Self {
        self.delegation = Some(link);
        self
    }
}

/// Run the extractor for `kind`.
pub fn extract<'t>(kind: CompositeKind, ctx: &ExtractContext<'t>) -> FlattenResult<Vec<Child<'t>>> {
    match kind {
        CompositeKind::Proxy | CompositeKind::ProxyAnnounced => proxy::extract(ctx),
        CompositeKind::AsMulti => multisig::as_multi(ctx),
        CompositeKind::AsMultiThreshold1 => multisig::as_multi_threshold_1(ctx),
        CompositeKind::Batch => utility::batch(ctx),
        CompositeKind::BatchAll => utility::batch_all(ctx),
        CompositeKind::ForceBatch => utility::force_batch(ctx),
        CompositeKind::AsDerivative => utility::as_derivative(ctx),
        CompositeKind::DispatchAs => utility::dispatch_as(ctx),
    }
}

/// Inner calls of `call` read from arguments only, ignoring events.
///
/// Missing or malformed arguments yield no calls; the real walk reports
/// them.
pub(crate) fn nested_calls(kind: CompositeKind, call: &Call) -> Vec<&Call> {
    match kind {
        CompositeKind::Proxy
        | CompositeKind::ProxyAnnounced
        | CompositeKind::AsMulti
        | CompositeKind::AsMultiThreshold1
        | CompositeKind::DispatchAs => call
            .args
            .get("call")
            .and_then(|value| value.as_call())
            .into_iter()
            .collect(),
        CompositeKind::AsDerivative => call
            .args
            .positional(1)
            .and_then(|arg| arg.value.as_call())
            .into_iter()
            .collect(),
        CompositeKind::Batch | CompositeKind::BatchAll | CompositeKind::ForceBatch => call
            .args
            .positional(0)
            .and_then(|arg| arg.value.as_calls())
            .map(|calls| calls.iter().collect())
            .unwrap_or_default(),
    }
}
