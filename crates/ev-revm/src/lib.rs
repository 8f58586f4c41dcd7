//! Revm integration for extra precompiles.

pub mod provider;

pub use provider::ExtraPrecompileProvider;
