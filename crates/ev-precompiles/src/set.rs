//! Host-side precompile table layering extra precompiles over a base set.

use crate::{
    contract::{PrecompileCall, PrecompiledContract},
    extra::{run_precompiled_contract_with_context, Contract},
    registry::ExtraPrecompiles,
};
use alloy_primitives::{Address, U256};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Base precompiles plus the extra precompiles registered on top of them.
///
/// Extra precompiles take priority over a base precompile at the same address, so
/// extensions can be layered without touching the base table.
pub struct PrecompileSet<CTX> {
    base: BTreeMap<Address, Arc<dyn PrecompiledContract>>,
    extras: ExtraPrecompiles<CTX>,
}

impl<CTX> PrecompileSet<CTX> {
    /// Creates a set with no base precompiles on top of the given registry.
    pub const fn new(extras: ExtraPrecompiles<CTX>) -> Self {
        Self {
            base: BTreeMap::new(),
            extras,
        }
    }

    /// Adds a base precompile, returning the one previously stored at `address`.
    pub fn insert_base(
        &mut self,
        address: Address,
        contract: Arc<dyn PrecompiledContract>,
    ) -> Option<Arc<dyn PrecompiledContract>> {
        self.base.insert(address, contract)
    }

    /// Returns the extra precompile registry.
    pub const fn extras(&self) -> &ExtraPrecompiles<CTX> {
        &self.extras
    }

    /// Returns the extra precompile registry for start-up registration.
    pub fn extras_mut(&mut self) -> &mut ExtraPrecompiles<CTX> {
        &mut self.extras
    }

    /// Resolves `address` to a contract, preferring extra precompiles.
    pub fn resolve(&self, address: &Address) -> Option<Contract<'_, CTX>> {
        self.extras.contract(address).or_else(|| {
            self.base
                .get(address)
                .map(|contract| Contract::Legacy(contract.as_ref()))
        })
    }

    /// Returns true if `address` is a base or extra precompile.
    pub fn is_precompile(&self, address: &Address) -> bool {
        self.extras.contains(address) || self.base.contains_key(address)
    }

    /// Base addresses in ascending order followed by the extra address list.
    pub fn addresses(&self) -> Vec<Address> {
        self.base
            .keys()
            .copied()
            .chain(self.extras.addresses().iter().copied())
            .collect()
    }

    /// Resolves `address` and runs it.
    ///
    /// Returns `None` if nothing is registered at `address`.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        ctx: &mut CTX,
        address: &Address,
        caller: Address,
        input: &[u8],
        value: U256,
        supplied_gas: u64,
        read_only: bool,
    ) -> Option<PrecompileCall> {
        let contract = self.resolve(address)?;
        Some(run_precompiled_contract_with_context(
            ctx,
            contract,
            caller,
            input,
            value,
            supplied_gas,
            read_only,
        ))
    }
}

impl<CTX> Default for PrecompileSet<CTX> {
    fn default() -> Self {
        Self::new(ExtraPrecompiles::new())
    }
}

impl<CTX> fmt::Debug for PrecompileSet<CTX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrecompileSet")
            .field("base", &self.base.keys().collect::<Vec<_>>())
            .field("extras", &self.extras)
            .finish()
    }
}
