//! It exposes all common structs, errors and host helpers shared by the
//! auction contracts.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{constants::*, errors::*, nft::*, types::*};
use concordium_cis1::*;
use concordium_std::*;

pub mod test;

mod constants;
mod errors;
mod nft;
mod types;
