//! Transaction flattener.
//!
//! Walks the call tree of one transaction depth-first, producing one
//! [`CallRecord`] per call in pre-order, and partitions the event log
//! between the produced records.

use tracing::{debug, warn};

use unnest_core::error::{FlattenError, FlattenResult};
use unnest_core::models::{
    Call, CallEvent, CallRecord, DelegationLink, DispatchError, LevelId, Transaction,
};
use unnest_core::ports::{Attribution, CallFlattener, FlattenOutput};

use crate::address::{MultisigDeriver, SubstrateMultisig};
use crate::config::{FlattenMode, FlattenerConfig};
use crate::extractors::{self, ExtractContext};
use crate::registry::{CallKind, ExtractorRegistry};
use crate::window::{Boundary, Correlator, EventWindow, Unattributed};

// =============================================================================
// Per-transaction flattener
// =============================================================================

/// Flattener for a single transaction.
///
/// The first call to [`Flattener::flatten`] computes the records; later
/// calls return the same records.
pub struct Flattener<'t> {
    tx: &'t Transaction,
    registry: &'t ExtractorRegistry,
    config: &'t FlattenerConfig,
    deriver: &'t dyn MultisigDeriver,
    output: Option<FlattenOutput>,
}

impl<'t> Flattener<'t> {
    pub fn new(
        tx: &'t Transaction,
        registry: &'t ExtractorRegistry,
        config: &'t FlattenerConfig,
        deriver: &'t dyn MultisigDeriver,
    ) -> Self {
        Self {
            tx,
            registry,
            config,
            deriver,
            output: None,
        }
    }

    /// Flatten the transaction into its ordered call records.
    pub fn flatten(&mut self) -> FlattenResult<&[CallRecord]> {
        if self.output.is_none() {
            self.output = Some(self.run()?);
        }
        Ok(self.flattened_calls())
    }

    /// Records produced by the last successful [`Flattener::flatten`].
    pub fn flattened_calls(&self) -> &[CallRecord] {
        self.output
            .as_ref()
            .map(|output| output.calls.as_slice())
            .unwrap_or(&[])
    }

    /// How events were attributed, once flattened.
    pub fn attribution(&self) -> Option<Attribution> {
        self.output.as_ref().map(|output| output.attribution)
    }

    pub fn into_output(mut self) -> FlattenResult<FlattenOutput> {
        match self.output.take() {
            Some(output) => Ok(output),
            None => self.run(),
        }
    }

    fn run(&self) -> FlattenResult<FlattenOutput> {
        match self.config.mode {
            FlattenMode::Correlated => self.correlated(),
            FlattenMode::Basic => self.basic(),
            FlattenMode::Auto => match self.correlated() {
                Err(e) if e.is_recoverable() => {
                    warn!(
                        extrinsic = %self.tx.extrinsic_id(),
                        error = %e,
                        "⚠️ Falling back to basic flattening"
                    );
                    self.basic()
                }
                other => other,
            },
        }
    }

    fn walker<C: Correlator<'t>>(&self, correlator: C) -> Walker<'t, C> {
        Walker {
            tx: self.tx,
            registry: self.registry,
            config: self.config,
            deriver: self.deriver,
            correlator,
            records: Vec::new(),
        }
    }

    fn correlated(&self) -> FlattenResult<FlattenOutput> {
        let count = self.tx.events.len();
        if count > self.config.max_events {
            return Err(FlattenError::EventLimitExceeded {
                count,
                limit: self.config.max_events,
            });
        }

        let tx = self.tx;
        let mut walker = self.walker(EventWindow::new(&tx.events));
        walker.walk_root()?;

        let Walker {
            correlator,
            mut records,
            ..
        } = walker;
        for (event, owner) in self.tx.events.iter().zip(correlator.into_owners()) {
            records[owner].events.push(CallEvent {
                id: self.tx.event_id(event),
                event: event.clone(),
            });
        }

        Ok(FlattenOutput {
            calls: records,
            attribution: Attribution::Correlated,
        })
    }

    fn basic(&self) -> FlattenResult<FlattenOutput> {
        let tx = self.tx;
        let mut walker = self.walker(Unattributed::new(&tx.events));
        walker.walk_root()?;

        let mut records = walker.records;
        if let Some(root) = records.first_mut() {
            root.events = self
                .tx
                .events
                .iter()
                .map(|event| CallEvent {
                    id: self.tx.event_id(event),
                    event: event.clone(),
                })
                .collect();
        }

        Ok(FlattenOutput {
            calls: records,
            attribution: Attribution::Basic,
        })
    }
}

// =============================================================================
// Tree walk
// =============================================================================

/// Depth-first walk accumulating records, generic over event bookkeeping.
struct Walker<'t, C> {
    tx: &'t Transaction,
    registry: &'t ExtractorRegistry,
    config: &'t FlattenerConfig,
    deriver: &'t dyn MultisigDeriver,
    correlator: C,
    records: Vec<CallRecord>,
}

impl<'t, C: Correlator<'t>> Walker<'t, C> {
    fn walk_root(&mut self) -> FlattenResult<()> {
        let tx = self.tx;
        self.visit(
            &tx.call,
            LevelId::root(),
            Some(&Boundary::All),
            tx.dispatch_error.clone(),
            Vec::new(),
        )
    }

    fn visit(
        &mut self,
        call: &'t Call,
        level_id: LevelId,
        boundary: Option<&Boundary>,
        dispatch_error: Option<DispatchError>,
        delegation: Vec<DelegationLink>,
    ) -> FlattenResult<()> {
        if level_id.depth() > self.config.max_depth {
            return Err(FlattenError::NestingTooDeep {
                level_id: level_id.to_string(),
                limit: self.config.max_depth,
            });
        }

        let owner = self.records.len();
        let record = self.record(call, &level_id, &dispatch_error, &delegation);
        self.records.push(record);

        let claim = self.correlator.claim(owner, boundary);
        self.expand(call, &level_id, dispatch_error, &delegation)?;
        self.correlator.release(claim);
        Ok(())
    }

    fn expand(
        &mut self,
        call: &'t Call,
        level_id: &LevelId,
        dispatch_error: Option<DispatchError>,
        delegation: &[DelegationLink],
    ) -> FlattenResult<()> {
        let CallKind::Composite(kind) = self.registry.resolve(&call.module, &call.method) else {
            return Ok(());
        };

        let origin = delegation
            .last()
            .map(|link| link.acting_address.clone())
            .or_else(|| self.tx.signer.clone());
        let ctx = ExtractContext {
            call,
            origin,
            dispatch_error,
            events: self.correlator.visible(),
            config: self.config,
            registry: self.registry,
            deriver: self.deriver,
        };
        let children = extractors::extract(kind, &ctx)?;

        debug!(
            extrinsic = %self.tx.extrinsic_id(),
            level = %level_id,
            call = %call.signature(),
            children = children.len(),
            events = ctx.events.len(),
            "Unwrapped composite call"
        );

        for (i, child) in children.into_iter().enumerate() {
            let mut chain = delegation.to_vec();
            chain.extend(child.delegation);
            self.visit(
                child.call,
                level_id.child(i),
                child.boundary.as_ref(),
                child.dispatch_error,
                chain,
            )?;
        }
        Ok(())
    }

    fn record(
        &self,
        call: &Call,
        level_id: &LevelId,
        dispatch_error: &Option<DispatchError>,
        delegation: &[DelegationLink],
    ) -> CallRecord {
        let is_root = level_id.depth() == 0;
        CallRecord {
            extrinsic_id: self.tx.extrinsic_id(),
            block_number: self.tx.block_number,
            block_hash: self.tx.block_hash.clone(),
            timestamp: self.tx.timestamp,
            level_id: level_id.clone(),
            module: call.module.clone(),
            method: call.method.clone(),
            args: call.args.clone(),
            signer: self.tx.signer.clone(),
            // Without attribution only the root reports an error
            dispatch_error: if is_root || C::ATTRIBUTES {
                dispatch_error.clone()
            } else {
                None
            },
            dispatch_info: if is_root { self.tx.dispatch_info.clone() } else { None },
            events: Vec::new(),
            delegation: delegation.to_vec(),
        }
    }
}

// =============================================================================
// Reusable flattener
// =============================================================================

/// Shared flattener configuration, building one [`Flattener`] per transaction.
pub struct Decomposer {
    registry: ExtractorRegistry,
    config: FlattenerConfig,
    deriver: Box<dyn MultisigDeriver>,
}

impl Decomposer {
    pub fn new(config: FlattenerConfig) -> Self {
        Self::with_registry(config, ExtractorRegistry::with_defaults())
    }

    pub fn with_registry(config: FlattenerConfig, registry: ExtractorRegistry) -> Self {
        Self {
            registry,
            config,
            deriver: Box::new(SubstrateMultisig),
        }
    }

    /// Replace the multisig address derivation.
    pub fn with_deriver(mut self, deriver: impl MultisigDeriver + 'static) -> Self {
        self.deriver = Box::new(deriver);
        self
    }

    pub fn config(&self) -> &FlattenerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub fn flattener<'t>(&'t self, tx: &'t Transaction) -> Flattener<'t> {
        Flattener::new(tx, &self.registry, &self.config, self.deriver.as_ref())
    }
}

impl Default for Decomposer {
    fn default() -> Self {
        Self::new(FlattenerConfig::default())
    }
}

impl CallFlattener for Decomposer {
    fn flatten(&self, tx: &Transaction) -> FlattenResult<FlattenOutput> {
        self.flattener(tx).into_output()
    }
}
