//! Base precompile interface and its gas-metered dispatch path.
//!
//! Every precompile the host knows about satisfies [`PrecompiledContract`]. The base
//! dispatch function [`run_precompiled_contract`] charges the flat cost reported by the
//! contract before running it; extended contracts reuse the same accounting through
//! [`crate::extra::run_precompiled_contract_with_context`].

use alloy_primitives::Bytes;
use revm::precompile::PrecompileError;
use std::fmt;
use thiserror::Error;

/// Result of a single precompile execution.
pub type ContractResult = Result<Bytes, ContractError>;

/// Failures surfaced by a precompile call.
#[derive(Debug, Error)]
pub enum ContractError {
    /// Failure from the base precompile error set, including [`PrecompileError::OutOfGas`].
    #[error(transparent)]
    Precompile(#[from] PrecompileError),
    /// The contract reverted and returned the given payload.
    #[error("execution reverted")]
    Reverted(Bytes),
}

impl ContractError {
    /// Returns true if the call was rejected for insufficient gas.
    pub const fn is_out_of_gas(&self) -> bool {
        matches!(self, Self::Precompile(PrecompileError::OutOfGas))
    }

    /// Returns true if the failure must abort the enclosing transaction.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Precompile(PrecompileError::Fatal(_)))
    }
}

/// Outcome of a metered precompile call.
///
/// Output bytes are present exactly when `result` is `Ok`. On out-of-gas `gas_remaining`
/// is zero; on any other failure it holds what was left after charging the flat cost.
#[derive(Debug)]
#[must_use]
pub struct PrecompileCall {
    /// Gas left over after the contract's cost was charged.
    pub gas_remaining: u64,
    /// Output of the contract, or the reason it failed.
    pub result: ContractResult,
}

impl PrecompileCall {
    /// Creates a new call outcome.
    pub const fn new(gas_remaining: u64, result: ContractResult) -> Self {
        Self {
            gas_remaining,
            result,
        }
    }

    /// The outcome reported when the supplied gas does not cover the contract's cost.
    pub fn out_of_gas() -> Self {
        Self::new(0, Err(PrecompileError::OutOfGas.into()))
    }

    /// Returns the output bytes of a successful call.
    pub fn output(&self) -> Option<&Bytes> {
        self.result.as_ref().ok()
    }

    /// Returns the failure, if any.
    pub fn error(&self) -> Option<&ContractError> {
        self.result.as_ref().err()
    }

    /// Returns true if the contract ran to completion.
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Splits the outcome into `(output, gas_remaining, error)`.
    pub fn into_parts(self) -> (Option<Bytes>, u64, Option<ContractError>) {
        match self.result {
            Ok(output) => (Some(output), self.gas_remaining, None),
            Err(err) => (None, self.gas_remaining, Some(err)),
        }
    }
}

/// A natively implemented contract invoked with its input only.
pub trait PrecompiledContract: Send + Sync + fmt::Debug {
    /// Flat gas cost of running the contract over `input`.
    fn required_gas(&self, input: &[u8]) -> u64;

    /// Runs the contract.
    fn run(&self, input: &[u8]) -> ContractResult;
}

/// Runs a base precompile, charging its cost from `supplied_gas` first.
///
/// The contract is not run at all when `supplied_gas` cannot cover its cost.
pub fn run_precompiled_contract<C>(contract: &C, input: &[u8], supplied_gas: u64) -> PrecompileCall
where
    C: PrecompiledContract + ?Sized,
{
    let gas_cost = contract.required_gas(input);
    let Some(gas_remaining) = supplied_gas.checked_sub(gas_cost) else {
        return PrecompileCall::out_of_gas();
    };
    PrecompileCall::new(gas_remaining, contract.run(input))
}
