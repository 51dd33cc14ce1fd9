//! Provider contract, registries and agent lifecycle for Deepcision.
//!
//! This crate defines the "ports" (provider, config source, role source,
//! tokenizer traits) that the infrastructure layer implements. It depends
//! only on `deepcision-types` -- never on `deepcision-infra` or any HTTP crate.

pub mod agent;
pub mod llm;
pub mod tokenizer;
