use commons::{AssetRef, ContractResult, CustomContractError};
use concordium_std::*;

use crate::external::AuctionView;

/// Lifecycle of the auction. Transitions only ever go forward:
/// `Created -> Receiving -> Started -> Ended`. `Receiving` only exists while
/// `start` waits for the registry to hand over the token, and falls back to
/// `Created` if the hand-over fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum Phase {
    /// Token is still with the beneficiary.
    Created,
    /// Custody transfer in flight. The receive hook accepts the token only
    /// in this phase.
    Receiving,
    /// Token is escrowed. Bids are accepted until the contained end time.
    Started(Timestamp),
    /// Auction is settled. Only refund withdrawals remain.
    Ended(Timestamp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct Bid {
    pub account: AccountAddress,
    pub amount: Amount,
}

/// What `end` has to carry out before the auction can be marked as ended.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum Settlement {
    /// Token goes to the bidder, the bid amount to the beneficiary.
    Winner(Bid),
    /// No bids were placed. Token goes back to the beneficiary.
    Unsold,
}

/// The contract state.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Auctioned token.
    pub asset: AssetRef,
    /// Seller. Starts and ends the auction and receives the winning bid.
    pub beneficiary: AccountAddress,
    /// First bid must be strictly above this amount.
    pub reserve: Amount,
    /// Time between `start` and the earliest possible `end`.
    pub duration: Duration,
    pub phase: Phase,
    /// Current leader and the amount it has deposited.
    pub highest_bid: Option<Bid>,
    /// Deposits of outbid accounts waiting to be withdrawn.
    pub pending_refunds: StateMap<AccountAddress, Amount, S>,
}

impl<S: HasStateApi> State<S> {
    pub fn new(
        state_builder: &mut StateBuilder<S>,
        asset: AssetRef,
        beneficiary: AccountAddress,
        reserve: Amount,
        duration: Duration,
    ) -> Self {
        Self {
            asset,
            beneficiary,
            reserve,
            duration,
            phase: Phase::Created,
            highest_bid: None,
            pending_refunds: state_builder.new_map(),
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self.phase, Phase::Started(_) | Phase::Ended(_))
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended(_))
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        match self.phase {
            Phase::Created | Phase::Receiving => None,
            Phase::Started(end_time) | Phase::Ended(end_time) => Some(end_time),
        }
    }

    /// Leading amount, zero before the first bid.
    pub fn highest_amount(&self) -> Amount {
        self.highest_bid
            .map(|bid| bid.amount)
            .unwrap_or_else(Amount::zero)
    }

    pub fn pending_refund(&self, account: &AccountAddress) -> Amount {
        self.pending_refunds
            .get(account)
            .map(|owed| *owed)
            .unwrap_or_else(Amount::zero)
    }

    pub fn ensure_startable(&self) -> ContractResult<()> {
        ensure_eq!(
            self.phase,
            Phase::Created,
            CustomContractError::AlreadyStarted
        );
        Ok(())
    }

    /// Open the window in which the token may be received.
    pub fn begin_custody(&mut self) -> ContractResult<()> {
        self.ensure_startable()?;
        self.phase = Phase::Receiving;
        Ok(())
    }

    /// Close the receiving window after a failed hand-over.
    pub fn cancel_custody(&mut self) {
        if self.phase == Phase::Receiving {
            self.phase = Phase::Created;
        }
    }

    /// Move to `Started` and fix the end time. Must only be called once the
    /// token is in the contract's custody.
    pub fn start(&mut self, slot_time: Timestamp) -> ContractResult<Timestamp> {
        match self.phase {
            Phase::Receiving => (),
            Phase::Created => bail!(CustomContractError::CustodyTransferRejected),
            Phase::Started(_) | Phase::Ended(_) => {
                bail!(CustomContractError::AlreadyStarted)
            }
        }
        let end_time = slot_time
            .checked_add(self.duration)
            .ok_or(CustomContractError::InvalidDuration)?;
        self.phase = Phase::Started(end_time);
        Ok(end_time)
    }

    /// Record a new leading bid. The deposit of the replaced leader is
    /// credited to its refund entry, which is also returned.
    pub fn bid(
        &mut self,
        slot_time: Timestamp,
        bidder: AccountAddress,
        amount: Amount,
    ) -> ContractResult<Option<Bid>> {
        let end_time = match self.phase {
            Phase::Created | Phase::Receiving => bail!(CustomContractError::NotStarted),
            Phase::Started(end_time) => end_time,
            Phase::Ended(_) => bail!(CustomContractError::AlreadyEnded),
        };

        // Bidding closes at the end time even if `end` was not called yet
        ensure!(slot_time < end_time, CustomContractError::AlreadyEnded);

        if let Some(leader) = &self.highest_bid {
            ensure!(
                leader.account != bidder,
                CustomContractError::AlreadyHighestBidder
            );
        }

        let minimum = self
            .highest_bid
            .map(|bid| bid.amount)
            .unwrap_or(self.reserve);
        ensure!(amount > minimum, CustomContractError::BidTooLow);

        let previous = self.highest_bid.replace(Bid {
            account: bidder,
            amount,
        });
        if let Some(outbid) = previous {
            let owed = self.pending_refund(&outbid.account);
            self.pending_refunds.insert(outbid.account, owed + outbid.amount);
        }

        Ok(previous)
    }

    /// Check whether the auction can be ended at `slot_time` and describe the
    /// settlement. Nothing is changed: the caller marks the auction as ended
    /// with [`State::mark_ended`] once the settlement went through.
    pub fn settle(&self, slot_time: Timestamp) -> ContractResult<Settlement> {
        let (end_time, ended) = match self.phase {
            Phase::Created | Phase::Receiving => bail!(CustomContractError::NotStarted),
            Phase::Started(end_time) => (end_time, false),
            Phase::Ended(end_time) => (end_time, true),
        };
        ensure!(slot_time >= end_time, CustomContractError::TooEarly);
        ensure!(!ended, CustomContractError::AlreadyEnded);

        Ok(match self.highest_bid {
            Some(bid) => Settlement::Winner(bid),
            None => Settlement::Unsold,
        })
    }

    pub fn mark_ended(&mut self) {
        if let Phase::Started(end_time) = self.phase {
            self.phase = Phase::Ended(end_time);
        }
    }

    /// Remove the refund entry of `account` and return what it was owed.
    /// Zero means there is nothing to withdraw.
    pub fn take_refund(&mut self, account: &AccountAddress) -> Amount {
        self.pending_refunds
            .remove_and_get(account)
            .unwrap_or_else(Amount::zero)
    }

    pub fn view(&self) -> AuctionView {
        AuctionView {
            asset: self.asset.clone(),
            beneficiary: self.beneficiary,
            reserve: self.reserve,
            duration: self.duration,
            started: self.is_started(),
            ended: self.is_ended(),
            end_time: self.end_time(),
            highest_bidder: self.highest_bid.map(|bid| bid.account),
            highest_bid: self.highest_amount(),
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_cis1::TokenIdVec;
    use test_infrastructure::*;

    const NFT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    const SELLER: AccountAddress = AccountAddress([1; 32]);
    const ALICE: AccountAddress = AccountAddress([16; 32]);
    const BOB: AccountAddress = AccountAddress([17; 32]);

    fn start_time() -> Timestamp {
        Timestamp::from_timestamp_millis(1_000)
    }

    fn end_time() -> Timestamp {
        start_time()
            .checked_add(Duration::from_days(7))
            .expect_report("End time overflow")
    }

    fn new_state(reserve: Amount) -> State<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        State::new(
            &mut state_builder,
            AssetRef {
                contract: NFT,
                id: TokenIdVec(vec![0, 1]),
            },
            SELLER,
            reserve,
            Duration::from_days(7),
        )
    }

    fn started_state(reserve: Amount) -> State<TestStateApi> {
        let mut state = new_state(reserve);
        claim_eq!(state.begin_custody(), Ok(()));
        let result = state.start(start_time());
        claim_eq!(result, Ok(end_time()));
        state
    }

    #[concordium_test]
    fn test_new_state_is_created() {
        let state = new_state(Amount::zero());

        claim_eq!(state.phase, Phase::Created);
        claim!(!state.is_started());
        claim!(!state.is_ended());
        claim_eq!(state.end_time(), None);
        claim_eq!(state.highest_amount(), Amount::zero());
        claim_eq!(state.pending_refund(&ALICE), Amount::zero());
    }

    #[concordium_test]
    fn test_start_only_once() {
        let mut state = started_state(Amount::zero());

        claim!(state.is_started());
        claim_eq!(state.end_time(), Some(end_time()));

        // End time is never moved by a second start
        let later = end_time();
        claim_eq!(
            state.start(later),
            Err(CustomContractError::AlreadyStarted)
        );
        claim_eq!(state.end_time(), Some(end_time()));
    }

    #[concordium_test]
    fn test_start_requires_custody_window() {
        let mut state = new_state(Amount::zero());

        claim_eq!(
            state.start(start_time()),
            Err(CustomContractError::CustodyTransferRejected)
        );

        claim_eq!(state.begin_custody(), Ok(()));
        claim_eq!(state.phase, Phase::Receiving);
        claim!(!state.is_started());
        claim_eq!(state.end_time(), None);
        claim_eq!(
            state.bid(start_time(), ALICE, Amount::from_micro_ccd(100)),
            Err(CustomContractError::NotStarted)
        );
        claim_eq!(
            state.begin_custody(),
            Err(CustomContractError::AlreadyStarted)
        );

        state.cancel_custody();
        claim_eq!(state.phase, Phase::Created);
        claim_eq!(
            state.start(start_time()),
            Err(CustomContractError::CustodyTransferRejected)
        );
    }

    #[concordium_test]
    fn test_bid_before_start() {
        let mut state = new_state(Amount::zero());

        let result = state.bid(start_time(), ALICE, Amount::from_micro_ccd(100));
        claim_eq!(result, Err(CustomContractError::NotStarted));
        claim_eq!(state.highest_bid, None);
    }

    #[concordium_test]
    fn test_bid_must_exceed_reserve() {
        let mut state = started_state(Amount::from_micro_ccd(50));

        let result = state.bid(start_time(), ALICE, Amount::from_micro_ccd(50));
        claim_eq!(result, Err(CustomContractError::BidTooLow));

        let result = state.bid(start_time(), ALICE, Amount::from_micro_ccd(51));
        claim_eq!(result, Ok(None));
        claim_eq!(state.highest_amount(), Amount::from_micro_ccd(51));
    }

    #[concordium_test]
    fn test_bid_zero_with_zero_reserve() {
        let mut state = started_state(Amount::zero());

        let result = state.bid(start_time(), ALICE, Amount::zero());
        claim_eq!(result, Err(CustomContractError::BidTooLow));
    }

    #[concordium_test]
    fn test_leader_cannot_outbid_itself() {
        let mut state = started_state(Amount::zero());

        claim!(state
            .bid(start_time(), ALICE, Amount::from_micro_ccd(100))
            .is_ok());
        let result = state.bid(start_time(), ALICE, Amount::from_micro_ccd(100));
        claim_eq!(result, Err(CustomContractError::AlreadyHighestBidder));
        let result = state.bid(start_time(), ALICE, Amount::from_micro_ccd(500));
        claim_eq!(result, Err(CustomContractError::AlreadyHighestBidder));

        claim_eq!(state.highest_amount(), Amount::from_micro_ccd(100));
        claim_eq!(state.pending_refund(&ALICE), Amount::zero());
    }

    #[concordium_test]
    fn test_outbid_refunds_accumulate() {
        let mut state = started_state(Amount::zero());

        claim_eq!(
            state.bid(start_time(), ALICE, Amount::from_micro_ccd(100)),
            Ok(None)
        );
        claim_eq!(
            state.bid(start_time(), BOB, Amount::from_micro_ccd(200)),
            Ok(Some(Bid {
                account: ALICE,
                amount: Amount::from_micro_ccd(100),
            }))
        );
        claim!(state
            .bid(start_time(), ALICE, Amount::from_micro_ccd(300))
            .is_ok());
        claim!(state
            .bid(start_time(), BOB, Amount::from_micro_ccd(400))
            .is_ok());

        // Alice was outbid twice, Bob once
        claim_eq!(state.pending_refund(&ALICE), Amount::from_micro_ccd(400));
        claim_eq!(state.pending_refund(&BOB), Amount::from_micro_ccd(200));
        claim_eq!(
            state.highest_bid,
            Some(Bid {
                account: BOB,
                amount: Amount::from_micro_ccd(400),
            })
        );
    }

    #[concordium_test]
    fn test_late_bid_rejected() {
        let mut state = started_state(Amount::zero());

        let result = state.bid(end_time(), ALICE, Amount::from_micro_ccd(100));
        claim_eq!(result, Err(CustomContractError::AlreadyEnded));
        claim_eq!(state.highest_bid, None);
    }

    #[concordium_test]
    fn test_settle_transitions() {
        let mut state = new_state(Amount::zero());
        claim_eq!(
            state.settle(end_time()),
            Err(CustomContractError::NotStarted)
        );

        claim!(state.begin_custody().is_ok());
        claim!(state.start(start_time()).is_ok());
        claim_eq!(state.settle(start_time()), Err(CustomContractError::TooEarly));
        claim_eq!(state.settle(end_time()), Ok(Settlement::Unsold));

        // `settle` alone does not end the auction
        claim!(!state.is_ended());

        state.mark_ended();
        claim!(state.is_ended());
        claim_eq!(state.end_time(), Some(end_time()));
        claim_eq!(
            state.settle(end_time()),
            Err(CustomContractError::AlreadyEnded)
        );
        claim_eq!(
            state.bid(start_time(), ALICE, Amount::from_micro_ccd(1)),
            Err(CustomContractError::AlreadyEnded)
        );
    }

    #[concordium_test]
    fn test_settle_with_winner() {
        let mut state = started_state(Amount::zero());
        claim!(state
            .bid(start_time(), ALICE, Amount::from_micro_ccd(100))
            .is_ok());

        claim_eq!(
            state.settle(end_time()),
            Ok(Settlement::Winner(Bid {
                account: ALICE,
                amount: Amount::from_micro_ccd(100),
            }))
        );
    }

    #[concordium_test]
    fn test_take_refund_is_idempotent() {
        let mut state = started_state(Amount::zero());
        claim!(state
            .bid(start_time(), ALICE, Amount::from_micro_ccd(100))
            .is_ok());
        claim!(state
            .bid(start_time(), BOB, Amount::from_micro_ccd(200))
            .is_ok());

        claim_eq!(state.take_refund(&ALICE), Amount::from_micro_ccd(100));
        claim_eq!(state.pending_refund(&ALICE), Amount::zero());
        claim_eq!(state.take_refund(&ALICE), Amount::zero());

        // The leader has nothing to take back
        claim_eq!(state.take_refund(&BOB), Amount::zero());
    }

    #[concordium_test]
    fn test_view() {
        let mut state = started_state(Amount::from_micro_ccd(10));
        claim!(state
            .bid(start_time(), ALICE, Amount::from_micro_ccd(100))
            .is_ok());

        let view = state.view();
        claim_eq!(view.beneficiary, SELLER);
        claim_eq!(view.reserve, Amount::from_micro_ccd(10));
        claim!(view.started);
        claim!(!view.ended);
        claim_eq!(view.end_time, Some(end_time()));
        claim_eq!(view.highest_bidder, Some(ALICE));
        claim_eq!(view.highest_bid, Amount::from_micro_ccd(100));
    }
}
