//! # Extra EVM Precompiles
//!
//! This crate lets a node extend its fixed-address precompile set at start-up with
//! precompiles that see the full call context: the host execution context, the caller,
//! the transferred value and the read-only flag.
//!
//! ## Components
//!
//! | Item | Role |
//! |------|------|
//! | [`PrecompiledContract`] | Base interface: gas function plus an input-only run |
//! | [`run_precompiled_contract`] | Base dispatch path |
//! | [`ExtraPrecompile`] | Extended interface carrying the call context |
//! | [`ExtraPrecompiles`] | Start-up registry keyed by address |
//! | [`run_precompiled_contract_with_context`] | Dispatch for both kinds of contract |
//! | [`PrecompileSet`] | Host table layering extras over a base set |
//!
//! ## Gas Accounting
//!
//! Both paths charge the flat cost reported by the contract before running it. If the
//! supplied gas cannot cover it, the call fails with
//! [`PrecompileError::OutOfGas`](revm::precompile::PrecompileError::OutOfGas), no gas is
//! left over and the contract is never run. Failures reported by the contract itself are
//! returned unchanged together with the gas remaining after the charge.
//!
//! ## Usage
//!
//! ```ignore
//! use ev_precompiles::{ExtraPrecompiles, run_precompiled_contract_with_context};
//! use std::sync::Arc;
//!
//! let mut registry = ExtraPrecompiles::new();
//! registry.add(MyPrecompile::default());
//! let registry = Arc::new(registry);
//!
//! if let Some(contract) = registry.contract(&address) {
//!     let call = run_precompiled_contract_with_context(
//!         &mut ctx, contract, caller, &input, value, gas, is_static,
//!     );
//! }
//! ```

pub mod config;
pub mod contract;
pub mod extra;
pub mod registry;
pub mod set;

pub use config::{ConfigError, ExtraPrecompilesConfig};
pub use contract::{
    run_precompiled_contract, ContractError, ContractResult, PrecompileCall, PrecompiledContract,
};
pub use extra::{run_precompiled_contract_with_context, Contract, ExtraContract, ExtraPrecompile};
pub use registry::ExtraPrecompiles;
pub use set::PrecompileSet;
