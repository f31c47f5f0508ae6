/// Tag for the auction Start event.
pub const START_TAG: u8 = u8::MAX - 1;

/// Tag for the Custom Biding event.
pub const BIDING_TAG: u8 = u8::MAX - 2;

/// Tag for the auction End event.
pub const END_TAG: u8 = u8::MAX - 3;

/// Tag for the refund Withdraw event.
pub const WITHDRAW_TAG: u8 = u8::MAX - 4;

/// Default length of an auction once started.
pub const DEFAULT_AUCTION_DURATION_DAYS: u64 = 7;
