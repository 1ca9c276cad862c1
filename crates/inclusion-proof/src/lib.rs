// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

mod builder;
mod codec;
mod error;
mod hardfork;
mod header;
mod source;
mod trie;
mod types;
mod verify;
mod witness;

pub use builder::*;
pub use codec::*;
pub use error::*;
pub use hardfork::*;
pub use header::*;
pub use source::*;
pub use trie::*;
pub use types::*;
pub use verify::*;
pub use witness::*;
