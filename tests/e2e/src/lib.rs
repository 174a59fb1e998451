//! Shared scaffolding for end-to-end scenarios over a full
//! [`graphzep_core::Engine`] (spec §8).

pub mod harness;
