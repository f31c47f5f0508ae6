//! Single-asset English auction.
//!
//! The beneficiary escrows one CIS-1 token with the contract on `start`.
//! Accounts outbid each other with CCD until the end time, after which the
//! beneficiary calls `end`: the token goes to the highest bidder and the
//! winning bid to the beneficiary. Outbid deposits are never pushed back,
//! their owners claim them with `withdraw`.
#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod state;
