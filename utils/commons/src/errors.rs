use super::*;

/// The custom errors the auction contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Only the beneficiary may perform this action (Error code: -4).
    Unauthorized,
    /// Only account addresses can bid or withdraw (Error code: -5).
    OnlyAccountAddress,
    /// This function must only be called by a contract (Error code: -6).
    ContractOnly,
    /// Unknown token (Error code: -7).
    UnknownToken,
    /// Unsupported token amount or sender (Error code: -8).
    Unsupported,
    /// Auction was already started (Error code: -9).
    AlreadyStarted,
    /// Auction has not been started yet (Error code: -10).
    NotStarted,
    /// Auction has ended or its bidding window has closed (Error code: -11).
    AlreadyEnded,
    /// Raised if bid is not higher than the highest bid or reserve
    /// (Error code: -12).
    BidTooLow,
    /// The current highest bidder may not outbid themselves (Error code: -13).
    AlreadyHighestBidder,
    /// Raised if there is an attempt to end the auction before its end time
    /// (Error code: -14).
    TooEarly,
    /// The registry refused to move the auctioned token (Error code: -15).
    CustodyTransferRejected,
    /// Transferring CCD out of the contract failed (Error code: -16).
    PayoutFailed,
    /// Duration overflows the timestamp range (Error code: -17).
    InvalidDuration,
    /// Token received while no `start` was waiting for it (Error code: -18).
    UnexpectedTransfer,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}
