use commons::{AssetRef, BIDING_TAG, END_TAG, START_TAG, WITHDRAW_TAG};
use concordium_std::*;

/// Auction start event data.
#[derive(Debug, Serial)]
pub struct StartEvent<'a> {
    /// Escrowed token.
    pub asset: &'a AssetRef,
    /// Time from which the auction can be ended.
    pub end_time: Timestamp,
}

/// Bid event data.
#[derive(Debug, Serial)]
pub struct BidEvent<'a> {
    /// Bidder account address.
    pub bidder: &'a AccountAddress,
    /// Bid amount.
    pub amount: Amount,
}

/// Auction end event data.
#[derive(Debug, Serial)]
pub struct EndEvent<'a> {
    /// Auction winner, `None` if the token went back unsold.
    pub winner: Option<&'a AccountAddress>,
    /// Amount paid to the beneficiary.
    pub price: Amount,
}

/// Refund withdrawal event data.
#[derive(Debug, Serial)]
pub struct WithdrawEvent<'a> {
    /// Account that got its deposits back.
    pub account: &'a AccountAddress,
    /// Refunded amount.
    pub amount: Amount,
}

/// Tagged Custom event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvents<'a> {
    Start(StartEvent<'a>),
    Bid(BidEvent<'a>),
    End(EndEvent<'a>),
    Withdraw(WithdrawEvent<'a>),
}

impl<'a> AuctionEvents<'a> {
    pub fn start(asset: &'a AssetRef, end_time: Timestamp) -> Self {
        Self::Start(StartEvent { asset, end_time })
    }

    pub fn bid(bidder: &'a AccountAddress, amount: Amount) -> Self {
        Self::Bid(BidEvent { bidder, amount })
    }

    pub fn end(winner: Option<&'a AccountAddress>, price: Amount) -> Self {
        Self::End(EndEvent { winner, price })
    }

    pub fn withdraw(account: &'a AccountAddress, amount: Amount) -> Self {
        Self::Withdraw(WithdrawEvent { account, amount })
    }
}

impl<'a> Serial for AuctionEvents<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvents::Start(event) => {
                out.write_u8(START_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Bid(event) => {
                out.write_u8(BIDING_TAG)?;
                event.serial(out)
            }
            AuctionEvents::End(event) => {
                out.write_u8(END_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Withdraw(event) => {
                out.write_u8(WITHDRAW_TAG)?;
                event.serial(out)
            }
        }
    }
}
