use commons::AssetRef;
use concordium_std::*;

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct InitParams {
    /// Token put up for auction. Must be held by the account creating the
    /// instance.
    pub asset: AssetRef,
    /// Smallest amount the first bid has to exceed.
    pub reserve: Amount,
    /// Auction length counted from `start`. Seven days if not given.
    pub duration: Option<Duration>,
}

/// Public snapshot of the auction returned by the `view` entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct AuctionView {
    pub asset: AssetRef,
    pub beneficiary: AccountAddress,
    pub reserve: Amount,
    pub duration: Duration,
    pub started: bool,
    pub ended: bool,
    /// Only known once the auction has been started.
    pub end_time: Option<Timestamp>,
    pub highest_bidder: Option<AccountAddress>,
    /// Zero until the first bid.
    pub highest_bid: Amount,
}
