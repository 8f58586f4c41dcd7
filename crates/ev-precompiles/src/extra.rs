//! Extra precompiles that see the execution context of the call.
//!
//! A base [`PrecompiledContract`] is run with its input only. An [`ExtraPrecompile`]
//! additionally receives the host execution context, the caller, the transferred value and
//! whether the call is read-only. The host hands either kind to
//! [`run_precompiled_contract_with_context`] as a [`Contract`], and the variant decides which
//! path runs.

use crate::contract::{
    run_precompiled_contract, ContractResult, PrecompileCall, PrecompiledContract,
};
use alloy_primitives::{Address, U256};
use std::{fmt, sync::Arc};
use tracing::{debug, trace};

/// A precompile whose run function needs more than its input.
///
/// `CTX` is the host's execution context. It is passed through untouched by the dispatch
/// layer.
pub trait ExtraPrecompile<CTX>: Send + Sync + fmt::Debug {
    /// Address the precompile is reachable at.
    fn address(&self) -> Address;

    /// Flat gas cost of running the precompile over `input`.
    fn required_gas(&self, input: &[u8]) -> u64;

    /// Runs the precompile.
    fn run(
        &self,
        ctx: &mut CTX,
        caller: Address,
        input: &[u8],
        value: U256,
        read_only: bool,
    ) -> ContractResult;
}

/// Registry-held wrapper around an [`ExtraPrecompile`].
///
/// Exposes the gas function like a base contract does, but deliberately offers no
/// input-only run: the only way to execute it is through
/// [`run_precompiled_contract_with_context`].
pub struct ExtraContract<CTX> {
    precompile: Arc<dyn ExtraPrecompile<CTX>>,
}

impl<CTX> ExtraContract<CTX> {
    /// Wraps the given precompile.
    pub const fn new(precompile: Arc<dyn ExtraPrecompile<CTX>>) -> Self {
        Self { precompile }
    }

    /// Address of the wrapped precompile.
    pub fn address(&self) -> Address {
        self.precompile.address()
    }

    /// Gas cost of the wrapped precompile over `input`.
    pub fn required_gas(&self, input: &[u8]) -> u64 {
        self.precompile.required_gas(input)
    }

    /// Returns the wrapped precompile.
    pub const fn precompile(&self) -> &Arc<dyn ExtraPrecompile<CTX>> {
        &self.precompile
    }

    fn run(
        &self,
        ctx: &mut CTX,
        caller: Address,
        input: &[u8],
        value: U256,
        read_only: bool,
    ) -> ContractResult {
        self.precompile.run(ctx, caller, input, value, read_only)
    }
}

impl<CTX> Clone for ExtraContract<CTX> {
    fn clone(&self) -> Self {
        Self {
            precompile: Arc::clone(&self.precompile),
        }
    }
}

impl<CTX> fmt::Debug for ExtraContract<CTX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtraContract")
            .field("precompile", &self.precompile)
            .finish()
    }
}

/// A contract resolved by the host, ready for dispatch.
pub enum Contract<'a, CTX> {
    /// A base precompile run with its input only.
    Legacy(&'a dyn PrecompiledContract),
    /// A registered extra precompile.
    Extra(&'a ExtraContract<CTX>),
}

impl<CTX> Contract<'_, CTX> {
    /// Gas cost of the contract over `input`.
    pub fn required_gas(&self, input: &[u8]) -> u64 {
        match self {
            Self::Legacy(contract) => contract.required_gas(input),
            Self::Extra(contract) => contract.required_gas(input),
        }
    }

    /// Returns true for registered extra precompiles.
    pub const fn is_extra(&self) -> bool {
        matches!(self, Self::Extra(_))
    }
}

impl<CTX> Clone for Contract<'_, CTX> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<CTX> Copy for Contract<'_, CTX> {}

impl<CTX> fmt::Debug for Contract<'_, CTX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy(contract) => f.debug_tuple("Legacy").field(contract).finish(),
            Self::Extra(contract) => f.debug_tuple("Extra").field(contract).finish(),
        }
    }
}

impl<'a, CTX> From<&'a ExtraContract<CTX>> for Contract<'a, CTX> {
    fn from(contract: &'a ExtraContract<CTX>) -> Self {
        Self::Extra(contract)
    }
}

impl<'a, CTX> From<&'a dyn PrecompiledContract> for Contract<'a, CTX> {
    fn from(contract: &'a dyn PrecompiledContract) -> Self {
        Self::Legacy(contract)
    }
}

/// Runs a resolved contract with the full call context.
///
/// Legacy contracts go through [`run_precompiled_contract`] unchanged. Extra precompiles are
/// charged their cost first and only run if `supplied_gas` covers it; their result is
/// returned as-is alongside the gas left after the charge.
pub fn run_precompiled_contract_with_context<CTX>(
    ctx: &mut CTX,
    contract: Contract<'_, CTX>,
    caller: Address,
    input: &[u8],
    value: U256,
    supplied_gas: u64,
    read_only: bool,
) -> PrecompileCall {
    let extra = match contract {
        Contract::Legacy(legacy) => return run_precompiled_contract(legacy, input, supplied_gas),
        Contract::Extra(extra) => extra,
    };

    let gas_cost = extra.required_gas(input);
    let Some(gas_remaining) = supplied_gas.checked_sub(gas_cost) else {
        debug!(
            target: "extra_precompiles",
            address = %extra.address(),
            gas_cost,
            supplied_gas,
            "insufficient gas for extra precompile"
        );
        return PrecompileCall::out_of_gas();
    };

    trace!(
        target: "extra_precompiles",
        address = %extra.address(),
        %caller,
        %value,
        read_only,
        gas_cost,
        "running extra precompile"
    );
    let result = extra.run(ctx, caller, input, value, read_only);
    PrecompileCall::new(gas_remaining, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractError;
    use alloy_primitives::{address, Bytes};
    use revm::precompile::PrecompileError;

    /// Records the context it was called with into the execution context.
    #[derive(Debug)]
    struct Recorder;

    #[derive(Debug, Default)]
    struct Journal {
        seen: Vec<(Address, Vec<u8>, U256, bool)>,
    }

    impl ExtraPrecompile<Journal> for Recorder {
        fn address(&self) -> Address {
            address!("0x0000000000000000000000000000000000000100")
        }

        fn required_gas(&self, input: &[u8]) -> u64 {
            10 * input.len() as u64
        }

        fn run(
            &self,
            ctx: &mut Journal,
            caller: Address,
            input: &[u8],
            value: U256,
            read_only: bool,
        ) -> ContractResult {
            ctx.seen.push((caller, input.to_vec(), value, read_only));
            if read_only && !value.is_zero() {
                return Err(PrecompileError::Other("value transfer in static call".into()).into());
            }
            Ok(Bytes::from_static(b"ok"))
        }
    }

    #[derive(Debug)]
    struct Flat;

    impl PrecompiledContract for Flat {
        fn required_gas(&self, _input: &[u8]) -> u64 {
            7
        }

        fn run(&self, input: &[u8]) -> ContractResult {
            Ok(Bytes::copy_from_slice(input))
        }
    }

    fn caller() -> Address {
        address!("0x00000000000000000000000000000000000000ca")
    }

    #[test]
    fn extra_path_passes_full_context() {
        let contract = ExtraContract::new(Arc::new(Recorder));
        let mut journal = Journal::default();

        let call = run_precompiled_contract_with_context(
            &mut journal,
            Contract::from(&contract),
            caller(),
            &[1, 2, 3],
            U256::from(5),
            100,
            false,
        );

        assert_eq!(call.gas_remaining, 70);
        assert_eq!(call.output().map(|out| out.as_ref()), Some(&b"ok"[..]));
        assert_eq!(journal.seen, vec![(caller(), vec![1, 2, 3], U256::from(5), false)]);
    }

    #[test]
    fn extra_path_rejects_before_running() {
        let contract = ExtraContract::new(Arc::new(Recorder));
        let mut journal = Journal::default();

        let call = run_precompiled_contract_with_context(
            &mut journal,
            Contract::from(&contract),
            caller(),
            &[1, 2, 3],
            U256::ZERO,
            29,
            true,
        );

        assert_eq!(call.gas_remaining, 0);
        assert!(call.error().is_some_and(ContractError::is_out_of_gas));
        assert!(journal.seen.is_empty());
    }

    #[test]
    fn run_failure_keeps_remaining_gas() {
        let contract = ExtraContract::new(Arc::new(Recorder));
        let mut journal = Journal::default();

        let call = run_precompiled_contract_with_context(
            &mut journal,
            Contract::from(&contract),
            caller(),
            &[9],
            U256::from(1),
            50,
            true,
        );

        assert_eq!(call.gas_remaining, 40);
        match call.error() {
            Some(ContractError::Precompile(PrecompileError::Other(msg))) => {
                assert_eq!(msg.to_string(), "value transfer in static call")
            }
            other => panic!("expected run failure, got {other:?}"),
        }
    }

    #[test]
    fn legacy_path_ignores_context() {
        let mut journal = Journal::default();
        let legacy: &dyn PrecompiledContract = &Flat;

        let call = run_precompiled_contract_with_context(
            &mut journal,
            Contract::from(legacy),
            caller(),
            b"hi",
            U256::from(1),
            10,
            true,
        );

        assert_eq!(call.gas_remaining, 3);
        assert_eq!(call.output().map(|out| out.as_ref()), Some(&b"hi"[..]));
        assert!(journal.seen.is_empty());
    }

    #[test]
    fn contract_reports_gas_for_both_kinds() {
        let extra = ExtraContract::new(Arc::new(Recorder));
        let legacy: &dyn PrecompiledContract = &Flat;

        let extra: Contract<'_, Journal> = Contract::from(&extra);
        let legacy: Contract<'_, Journal> = Contract::from(legacy);

        assert!(extra.is_extra());
        assert!(!legacy.is_extra());
        assert_eq!(extra.required_gas(&[0; 4]), 40);
        assert_eq!(legacy.required_gas(&[0; 4]), 7);
    }
}
