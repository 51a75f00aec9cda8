#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod entities;
pub mod events;
pub mod fees;
pub mod flow;
pub mod framework;
pub mod pending;
pub mod processors;
pub mod rails;
pub mod utils;
pub mod wallet;
