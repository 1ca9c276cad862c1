// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

mod config;
mod error;
mod records;
mod retry;
mod rpc;

pub use config::*;
pub use error::*;
pub use records::*;
pub use retry::*;
pub use rpc::*;
