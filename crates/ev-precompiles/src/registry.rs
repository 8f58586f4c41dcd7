//! Start-up registry of extra precompiles.

use crate::{
    config::ExtraPrecompilesConfig,
    extra::{Contract, ExtraContract, ExtraPrecompile},
};
use alloy_primitives::Address;
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::{debug, warn};

/// Table of extra precompiles keyed by address.
///
/// Built once during start-up through `&mut self` and then shared read-only, usually behind
/// an [`Arc`], with every call frame that dispatches into it.
///
/// Registering a second precompile at an address replaces the first one. The address list
/// returned by [`Self::addresses`] is append-only and keeps such duplicates, in registration
/// order.
pub struct ExtraPrecompiles<CTX> {
    contracts: HashMap<Address, ExtraContract<CTX>>,
    addresses: Vec<Address>,
    config: ExtraPrecompilesConfig,
}

impl<CTX> ExtraPrecompiles<CTX> {
    /// Creates an empty registry that admits every extra precompile.
    pub fn new() -> Self {
        Self::with_config(ExtraPrecompilesConfig::new())
    }

    /// Creates an empty registry governed by `config`.
    pub fn with_config(config: ExtraPrecompilesConfig) -> Self {
        Self {
            contracts: HashMap::new(),
            addresses: Vec::new(),
            config,
        }
    }

    /// Returns the registry configuration.
    pub const fn config(&self) -> &ExtraPrecompilesConfig {
        &self.config
    }

    /// Registers the given precompiles in order.
    ///
    /// Precompiles whose address is not enabled by the configuration are skipped.
    pub fn register<I>(&mut self, precompiles: I)
    where
        I: IntoIterator<Item = Arc<dyn ExtraPrecompile<CTX>>>,
    {
        for precompile in precompiles {
            let address = precompile.address();
            if !self.config.is_enabled(&address) {
                warn!(target: "extra_precompiles", %address, "extra precompile not enabled, skipping");
                continue;
            }

            let replaced = self
                .contracts
                .insert(address, ExtraContract::new(precompile))
                .is_some();
            self.addresses.push(address);
            debug!(target: "extra_precompiles", %address, replaced, "registered extra precompile");
        }
    }

    /// Registers a single precompile.
    pub fn add<P>(&mut self, precompile: P) -> &mut Self
    where
        P: ExtraPrecompile<CTX> + 'static,
    {
        self.register([Arc::new(precompile) as Arc<dyn ExtraPrecompile<CTX>>]);
        self
    }

    /// Returns the wrapper registered at `address`.
    pub fn get(&self, address: &Address) -> Option<&ExtraContract<CTX>> {
        self.contracts.get(address)
    }

    /// Returns the contract registered at `address`, ready for dispatch.
    pub fn contract(&self, address: &Address) -> Option<Contract<'_, CTX>> {
        self.get(address).map(Contract::Extra)
    }

    /// Returns true if an extra precompile is registered at `address`.
    pub fn contains(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    /// Addresses in registration order, duplicates included.
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Number of distinct registered addresses.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl<CTX> Default for ExtraPrecompiles<CTX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<CTX> Clone for ExtraPrecompiles<CTX> {
    fn clone(&self) -> Self {
        Self {
            contracts: self.contracts.clone(),
            addresses: self.addresses.clone(),
            config: self.config.clone(),
        }
    }
}

impl<CTX> fmt::Debug for ExtraPrecompiles<CTX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtraPrecompiles")
            .field("addresses", &self.addresses)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractResult;
    use alloy_primitives::{address, Bytes, U256};

    const ADDR: Address = address!("0x0000000000000000000000000000000000000009");
    const OTHER: Address = address!("0x000000000000000000000000000000000000000b");

    #[derive(Debug)]
    struct Tagged {
        address: Address,
        tag: &'static [u8],
    }

    impl ExtraPrecompile<()> for Tagged {
        fn address(&self) -> Address {
            self.address
        }

        fn required_gas(&self, _input: &[u8]) -> u64 {
            self.tag.len() as u64
        }

        fn run(
            &self,
            _ctx: &mut (),
            _caller: Address,
            _input: &[u8],
            _value: U256,
            _read_only: bool,
        ) -> ContractResult {
            Ok(Bytes::from_static(self.tag))
        }
    }

    fn tagged(address: Address, tag: &'static [u8]) -> Arc<dyn ExtraPrecompile<()>> {
        Arc::new(Tagged { address, tag })
    }

    #[test]
    fn registers_in_order() {
        let mut registry = ExtraPrecompiles::new();
        registry.register([tagged(OTHER, b"b"), tagged(ADDR, b"a")]);

        assert_eq!(registry.addresses(), &[OTHER, ADDR]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&ADDR));
        assert!(!registry.contains(&Address::ZERO));
        assert_eq!(registry.get(&ADDR).map(ExtraContract::address), Some(ADDR));
    }

    #[test]
    fn later_registration_wins() {
        let mut registry = ExtraPrecompiles::new();
        registry.register([tagged(ADDR, b"first")]);
        registry.register([tagged(ADDR, b"second!")]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.addresses(), &[ADDR, ADDR]);
        let contract = registry.get(&ADDR).expect("registered");
        assert_eq!(contract.required_gas(&[]), 7);
    }

    #[test]
    fn add_chains() {
        let mut registry = ExtraPrecompiles::default();
        registry
            .add(Tagged {
                address: ADDR,
                tag: b"x",
            })
            .add(Tagged {
                address: OTHER,
                tag: b"y",
            });

        assert_eq!(registry.addresses(), &[ADDR, OTHER]);
        assert!(registry.contract(&OTHER).is_some_and(|c| c.is_extra()));
    }

    #[test]
    fn skips_addresses_not_enabled() {
        let config = ExtraPrecompilesConfig::new().with_enabled([ADDR]);
        let mut registry = ExtraPrecompiles::with_config(config);
        registry.register([tagged(OTHER, b"b"), tagged(ADDR, b"a")]);

        assert_eq!(registry.addresses(), &[ADDR]);
        assert!(!registry.contains(&OTHER));
    }

    #[test]
    fn empty_registry() {
        let registry = ExtraPrecompiles::<()>::new();
        assert!(registry.is_empty());
        assert!(registry.addresses().is_empty());
        assert!(registry.contract(&ADDR).is_none());
    }
}
