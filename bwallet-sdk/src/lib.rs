//! Shared wire types for the brand wallet deposit service.
//!
//! Everything in this crate is plain data: the enums and bodies exchanged
//! between the wallet view, the payment rails, and the ledger feed. No I/O
//! happens here.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod objects;
pub mod reference;
