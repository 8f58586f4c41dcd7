//! Precompile provider that routes calls to registered extra precompiles.

use alloy_primitives::{Address, Bytes, U256};
use ev_precompiles::{
    run_precompiled_contract_with_context, ContractError, ExtraPrecompiles, PrecompileCall,
};
use reth_revm::revm::{
    context::{Cfg, ContextTr, LocalContextTr},
    handler::{EthPrecompiles, PrecompileProvider},
    interpreter::{CallInput, CallInputs, Gas, InstructionResult, InterpreterResult},
    precompile::PrecompileError,
};
use std::{fmt, sync::Arc};
use tracing::warn;

/// Wraps a [`PrecompileProvider`] and gives registered extra precompiles priority over it.
///
/// Extra precompiles receive the revm context itself as their execution context, together
/// with the caller, the call value and whether the call is static.
///
/// Activation is decided once, for the block the EVM is built for. Below the activation
/// height the extras are invisible: they are neither routed, reported by
/// [`PrecompileProvider::contains`] nor warmed, so every call goes to the inner provider
/// untouched.
pub struct ExtraPrecompileProvider<CTX, P = EthPrecompiles> {
    inner: P,
    extras: Arc<ExtraPrecompiles<CTX>>,
    active: bool,
}

impl<CTX, P> ExtraPrecompileProvider<CTX, P> {
    /// Creates a provider layering `extras` over `inner` for an EVM executing
    /// `block_number`.
    pub fn new(inner: P, extras: Arc<ExtraPrecompiles<CTX>>, block_number: u64) -> Self {
        let active = extras.config().is_active(block_number);
        Self {
            inner,
            extras,
            active,
        }
    }

    /// Returns the inner provider.
    pub const fn inner(&self) -> &P {
        &self.inner
    }

    /// Returns the extra precompile registry.
    pub const fn extras(&self) -> &Arc<ExtraPrecompiles<CTX>> {
        &self.extras
    }

    /// Returns true if the extras are active at the provider's block.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns true if a call to `address` is served by an extra precompile.
    pub fn is_routed(&self, address: &Address) -> bool {
        self.active && self.extras.contains(address)
    }

    /// Consumes the provider and returns the inner one.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<CTX, P> ExtraPrecompileProvider<CTX, P>
where
    CTX: ContextTr,
{
    /// Runs the extra precompile registered at `address`.
    ///
    /// Returns `Ok(None)` if nothing is registered there. A fatal precompile error is
    /// returned as `Err` so the host aborts the transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &self,
        context: &mut CTX,
        address: &Address,
        input: &[u8],
        caller: Address,
        value: U256,
        gas_limit: u64,
        is_static: bool,
    ) -> Result<Option<InterpreterResult>, String> {
        let Some(contract) = self.extras.contract(address) else {
            return Ok(None);
        };
        let call = run_precompiled_contract_with_context(
            context, contract, caller, input, value, gas_limit, is_static,
        );
        into_interpreter_result(call, gas_limit).map(Some)
    }
}

impl<CTX, P> PrecompileProvider<CTX> for ExtraPrecompileProvider<CTX, P>
where
    CTX: ContextTr,
    P: PrecompileProvider<CTX, Output = InterpreterResult>,
{
    type Output = InterpreterResult;

    fn set_spec(&mut self, spec: <CTX::Cfg as Cfg>::Spec) -> bool {
        self.inner.set_spec(spec)
    }

    fn run(
        &mut self,
        context: &mut CTX,
        inputs: &CallInputs,
    ) -> Result<Option<Self::Output>, String> {
        if !self.is_routed(&inputs.bytecode_address) {
            return self.inner.run(context, inputs);
        }

        let input = call_input_bytes(context, &inputs.input)?;
        self.execute(
            context,
            &inputs.bytecode_address,
            &input,
            inputs.caller,
            inputs.call_value(),
            inputs.gas_limit,
            inputs.is_static,
        )
    }

    fn warm_addresses(&self) -> Box<impl Iterator<Item = Address>> {
        let extras = if self.active {
            self.extras.addresses().to_vec()
        } else {
            Vec::new()
        };
        Box::new(extras.into_iter().chain(self.inner.warm_addresses()))
    }

    fn contains(&self, address: &Address) -> bool {
        self.is_routed(address) || self.inner.contains(address)
    }
}

impl<CTX, P: Clone> Clone for ExtraPrecompileProvider<CTX, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            extras: Arc::clone(&self.extras),
            active: self.active,
        }
    }
}

impl<CTX, P: fmt::Debug> fmt::Debug for ExtraPrecompileProvider<CTX, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtraPrecompileProvider")
            .field("inner", &self.inner)
            .field("extras", &self.extras)
            .field("active", &self.active)
            .finish()
    }
}

/// Copies the call input out of the shared memory buffer if needed.
///
/// A range outside the buffer is a host error.
fn call_input_bytes<CTX: ContextTr>(context: &CTX, input: &CallInput) -> Result<Bytes, String> {
    match input {
        CallInput::SharedBuffer(range) => context
            .local()
            .shared_memory_buffer_slice(range.clone())
            .map(|slice| Bytes::copy_from_slice(&slice))
            .ok_or_else(|| {
                warn!(target: "extra_precompiles", ?range, "call input outside shared memory");
                format!("call input range {range:?} outside shared memory")
            }),
        CallInput::Bytes(bytes) => Ok(bytes.clone()),
    }
}

/// Translates a dispatch outcome into the interpreter's result for the call frame.
fn into_interpreter_result(
    call: PrecompileCall,
    gas_limit: u64,
) -> Result<InterpreterResult, String> {
    let mut result = InterpreterResult {
        result: InstructionResult::Return,
        gas: Gas::new(gas_limit),
        output: Bytes::new(),
    };
    let spent = gas_limit.saturating_sub(call.gas_remaining);

    match call.result {
        Ok(output) => {
            record_cost(&mut result.gas, spent);
            result.output = output;
        }
        Err(ContractError::Reverted(data)) => {
            record_cost(&mut result.gas, spent);
            result.result = InstructionResult::Revert;
            result.output = data;
        }
        Err(ContractError::Precompile(PrecompileError::Fatal(err))) => {
            warn!(target: "extra_precompiles", %err, "fatal extra precompile error");
            return Err(err);
        }
        Err(err) if err.is_out_of_gas() => {
            result.gas.spend_all();
            result.result = InstructionResult::PrecompileOOG;
        }
        Err(_) => {
            record_cost(&mut result.gas, spent);
            result.result = InstructionResult::PrecompileError;
        }
    }

    Ok(result)
}

fn record_cost(gas: &mut Gas, spent: u64) {
    let recorded = gas.record_cost(spent);
    debug_assert!(recorded, "spent gas never exceeds the call's gas limit");
}
