use commons::{CustomContractError, HostNftExt, DEFAULT_AUCTION_DURATION_DAYS};
use concordium_cis1::{OnReceivingCis1Params, Receiver, TokenIdVec};
use concordium_std::*;

use crate::events::AuctionEvents;
use crate::external::*;
use crate::state::{Phase, Settlement, State};

/// Registry callback invoked when the token is moved into this contract.
const ON_RECEIVING_CIS1: &str = "BictoryEnglishAuction.onReceivingCIS1";

/// Create the auction for a single token. The account creating the instance
/// becomes the beneficiary and is expected to hold the token.
#[init(contract = "BictoryEnglishAuction", parameter = "InitParams")]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params =
        InitParams::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;
    let duration = params
        .duration
        .unwrap_or_else(|| Duration::from_days(DEFAULT_AUCTION_DURATION_DAYS));

    Ok(State::new(
        state_builder,
        params.asset,
        ctx.init_origin(),
        params.reserve,
        duration,
    ))
}

/// Start the auction by taking custody of the token.
///
/// The beneficiary has to make this contract an operator on the registry
/// beforehand.
///
/// It rejects if:
/// - The auction was already started.
/// - Sender is not the beneficiary.
/// - The registry refuses the transfer.
/// - Fails to log `Start` event.
#[receive(
    mutable,
    contract = "BictoryEnglishAuction",
    name = "start",
    enable_logger
)]
fn contract_start<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    host.state().ensure_startable()?;

    let beneficiary = host.state().beneficiary;
    ensure!(
        ctx.sender().matches_account(&beneficiary),
        CustomContractError::Unauthorized.into()
    );

    let asset = host.state().asset.clone();
    host.state_mut().begin_custody()?;
    let custody = host.nft_transfer(
        &asset,
        Address::Account(beneficiary),
        Receiver::Contract(
            ctx.self_address(),
            OwnedReceiveName::new_unchecked(String::from(ON_RECEIVING_CIS1)),
        ),
    );
    if custody.is_err() {
        host.state_mut().cancel_custody();
        bail!(CustomContractError::CustodyTransferRejected.into());
    }

    let end_time = host.state_mut().start(ctx.metadata().slot_time())?;

    logger.log(&AuctionEvents::start(&asset, end_time))?;

    Ok(())
}

/// Place a bid with the attached CCD. The amount stays in the contract: it is
/// either the winning payment or later withdrawn by the bidder.
///
/// It rejects if:
/// - Sender is a contract.
/// - The auction is not started, ended or past its end time.
/// - Sender already holds the highest bid.
/// - The amount does not exceed the highest bid or reserve.
/// - Fails to log `Bid` event.
#[receive(
    mutable,
    payable,
    contract = "BictoryEnglishAuction",
    name = "bid",
    enable_logger
)]
fn contract_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let bidder = if let Address::Account(bidder) = ctx.sender() {
        bidder
    } else {
        bail!(CustomContractError::OnlyAccountAddress.into());
    };

    host.state_mut()
        .bid(ctx.metadata().slot_time(), bidder, amount)?;

    logger.log(&AuctionEvents::bid(&bidder, amount))?;

    Ok(())
}

/// End the auction. The token goes to the highest bidder and the winning bid
/// to the beneficiary, or the token returns to the beneficiary if nobody bid.
///
/// The auction is marked as ended only after both legs succeeded.
///
/// It rejects if:
/// - Sender is not the beneficiary.
/// - The auction is not started, its end time is not reached or it already
///   ended.
/// - The registry refuses the token transfer.
/// - Paying the beneficiary fails.
/// - Fails to log `End` event.
#[receive(
    mutable,
    contract = "BictoryEnglishAuction",
    name = "end",
    enable_logger
)]
fn contract_end<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let beneficiary = host.state().beneficiary;
    ensure!(
        ctx.sender().matches_account(&beneficiary),
        CustomContractError::Unauthorized.into()
    );

    let settlement = host.state().settle(ctx.metadata().slot_time())?;
    let asset = host.state().asset.clone();
    let custodian = Address::Contract(ctx.self_address());

    match settlement {
        Settlement::Winner(bid) => {
            host.nft_transfer(&asset, custodian, Receiver::Account(bid.account))
                .map_err(|_| CustomContractError::CustodyTransferRejected)?;
            host.invoke_transfer(&beneficiary, bid.amount)
                .map_err(|_| CustomContractError::PayoutFailed)?;

            host.state_mut().mark_ended();
            logger.log(&AuctionEvents::end(Some(&bid.account), bid.amount))?;
        }
        Settlement::Unsold => {
            host.nft_transfer(&asset, custodian, Receiver::Account(beneficiary))
                .map_err(|_| CustomContractError::CustodyTransferRejected)?;

            host.state_mut().mark_ended();
            logger.log(&AuctionEvents::end(None, Amount::zero()))?;
        }
    }

    Ok(())
}

/// Withdraw the deposits of every bid the sender got outbid on. Returns the
/// refunded amount, zero when there was nothing to withdraw.
///
/// The refund entry is cleared before the payout and is not restored if the
/// payout fails.
///
/// It rejects if:
/// - Sender is a contract.
/// - The payout fails.
/// - Fails to log `Withdraw` event.
#[receive(
    mutable,
    contract = "BictoryEnglishAuction",
    name = "withdraw",
    return_value = "Amount",
    enable_logger
)]
fn contract_withdraw<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<Amount> {
    let account = if let Address::Account(account) = ctx.sender() {
        account
    } else {
        bail!(CustomContractError::OnlyAccountAddress.into());
    };

    let owed = host.state_mut().take_refund(&account);
    if owed == Amount::zero() {
        return Ok(owed);
    }

    host.invoke_transfer(&account, owed)
        .map_err(|_| CustomContractError::PayoutFailed)?;

    logger.log(&AuctionEvents::withdraw(&account, owed))?;

    Ok(owed)
}

/// CIS-1 receive hook. Only accepts the auctioned token, sent by its
/// registry from the beneficiary while `start` is taking custody of it.
#[receive(
    contract = "BictoryEnglishAuction",
    name = "onReceivingCIS1",
    parameter = "OnReceivingCis1Params<TokenIdVec>"
)]
fn contract_on_receiving_cis1<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    let params = OnReceivingCis1Params::<TokenIdVec>::deserial(&mut ctx.parameter_cursor())?;

    let registry = if let Address::Contract(registry) = ctx.sender() {
        registry
    } else {
        bail!(CustomContractError::ContractOnly.into());
    };

    let state = host.state();
    ensure_eq!(
        registry,
        state.asset.contract,
        CustomContractError::UnknownToken.into()
    );
    ensure_eq!(
        params.token_id,
        state.asset.id,
        CustomContractError::UnknownToken.into()
    );
    ensure!(params.amount == 1, CustomContractError::Unsupported.into());
    ensure_eq!(
        params.from,
        Address::Account(state.beneficiary),
        CustomContractError::Unsupported.into()
    );

    match state.phase {
        Phase::Receiving => Ok(()),
        Phase::Created => bail!(CustomContractError::UnexpectedTransfer.into()),
        Phase::Started(_) | Phase::Ended(_) => {
            bail!(CustomContractError::AlreadyStarted.into())
        }
    }
}

#[receive(
    contract = "BictoryEnglishAuction",
    name = "view",
    return_value = "AuctionView"
)]
fn contract_view<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<AuctionView> {
    Ok(host.state().view())
}

/// Amount the given account can currently withdraw.
#[receive(
    contract = "BictoryEnglishAuction",
    name = "pendingRefund",
    parameter = "AccountAddress",
    return_value = "Amount"
)]
fn contract_pending_refund<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Amount> {
    let account = AccountAddress::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().pending_refund(&account))
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::test::*;
    use commons::AssetRef;
    use concordium_cis1::AdditionalData;
    use test_infrastructure::*;

    const AUCTION: ContractAddress = ContractAddress {
        index: 10,
        subindex: 0,
    };
    const NFT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    const SELLER: AccountAddress = AccountAddress([1; 32]);
    const BIDDER_1: AccountAddress = AccountAddress([16; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([17; 32]);
    const BIDDER_3: AccountAddress = AccountAddress([18; 32]);

    fn token_0() -> TokenIdVec {
        TokenIdVec(vec![0, 1])
    }

    fn asset() -> AssetRef {
        AssetRef {
            contract: NFT,
            id: token_0(),
        }
    }

    fn start_time() -> Timestamp {
        Timestamp::from_timestamp_millis(1_000_000)
    }

    fn end_time() -> Timestamp {
        start_time()
            .checked_add(Duration::from_days(7))
            .expect_report("End time overflow")
    }

    fn receive_ctx<'a>(sender: Address, slot_time: Timestamp) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(sender)
            .set_self_address(AUCTION)
            .set_metadata_slot_time(slot_time);
        ctx
    }

    /// Auction over `token_0` created by `SELLER`, who holds the token.
    fn default_host(reserve: Amount) -> (TestHost<State<TestStateApi>>, FakeRegistry) {
        let mut ctx = TestInitContext::empty();
        let params = InitParams {
            asset: asset(),
            reserve,
            duration: None,
        };
        let bytes = to_bytes(&params);
        ctx.set_init_origin(SELLER).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();

        let state = contract_init(&ctx, &mut state_builder)
            .expect_report("Failed during init_BictoryEnglishAuction");

        let mut host = TestHost::new(state, state_builder);

        let registry = FakeRegistry::new(AUCTION);
        registry.mint(&token_0(), Address::Account(SELLER));
        host.setup_mock_entrypoint(
            NFT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            registry.transfer_mock(),
        );

        (host, registry)
    }

    /// Default host where the seller approved the auction and started it.
    fn started_host(reserve: Amount) -> (TestHost<State<TestStateApi>>, FakeRegistry) {
        let (mut host, registry) = default_host(reserve);
        registry.add_operator(Address::Account(SELLER), Address::Contract(AUCTION));

        let ctx = receive_ctx(Address::Account(SELLER), start_time());
        let mut logger = TestLogger::init();
        let result = contract_start(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));

        (host, registry)
    }

    /// Bid and, like the chain does, keep the attached CCD in the contract
    /// balance when the bid is accepted.
    fn place_bid(
        host: &mut TestHost<State<TestStateApi>>,
        bidder: AccountAddress,
        amount: Amount,
        slot_time: Timestamp,
    ) -> ReceiveResult<()> {
        let ctx = receive_ctx(Address::Account(bidder), slot_time);
        let mut logger = TestLogger::init();
        let result = contract_bid(&ctx, host, amount, &mut logger);
        if result.is_ok() {
            let balance = host.self_balance() + amount;
            host.set_self_balance(balance);
        }
        result
    }

    fn end(host: &mut TestHost<State<TestStateApi>>, slot_time: Timestamp) -> ReceiveResult<()> {
        let ctx = receive_ctx(Address::Account(SELLER), slot_time);
        let mut logger = TestLogger::init();
        contract_end(&ctx, host, &mut logger)
    }

    fn withdraw(
        host: &mut TestHost<State<TestStateApi>>,
        account: AccountAddress,
    ) -> ReceiveResult<Amount> {
        let ctx = receive_ctx(Address::Account(account), end_time());
        let mut logger = TestLogger::init();
        contract_withdraw(&ctx, host, &mut logger)
    }

    fn pending_refund(host: &TestHost<State<TestStateApi>>, account: AccountAddress) -> Amount {
        let bytes = to_bytes(&account);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_parameter(&bytes);
        contract_pending_refund(&ctx, host).expect_report("pendingRefund should not fail")
    }

    fn view(host: &TestHost<State<TestStateApi>>) -> AuctionView {
        let ctx = TestReceiveContext::empty();
        contract_view(&ctx, host).expect_report("view should not fail")
    }

    /// The three bids of the reference scenario: 5, 10 and 200 CCD.
    fn place_scenario_bids(host: &mut TestHost<State<TestStateApi>>) {
        claim_eq!(
            place_bid(host, BIDDER_1, Amount::from_ccd(5), start_time()),
            Ok(())
        );
        claim_eq!(
            place_bid(host, BIDDER_2, Amount::from_ccd(10), start_time()),
            Ok(())
        );
        claim_eq!(
            place_bid(host, BIDDER_3, Amount::from_ccd(200), start_time()),
            Ok(())
        );
    }

    #[concordium_test]
    fn test_init() {
        let (host, registry) = default_host(Amount::zero());

        let view = view(&host);
        claim_eq!(view.asset, asset());
        claim_eq!(view.beneficiary, SELLER);
        claim_eq!(view.reserve, Amount::zero());
        claim_eq!(view.duration, Duration::from_days(7));
        claim!(!view.started);
        claim!(!view.ended);
        claim_eq!(view.end_time, None);
        claim_eq!(view.highest_bidder, None);
        claim_eq!(view.highest_bid, Amount::zero());

        claim_eq!(registry.owner_of(&token_0()), Some(Address::Account(SELLER)));
    }

    #[concordium_test]
    fn test_init_custom_duration() {
        let mut ctx = TestInitContext::empty();
        let params = InitParams {
            asset: asset(),
            reserve: Amount::from_ccd(1),
            duration: Some(Duration::from_hours(1)),
        };
        let bytes = to_bytes(&params);
        ctx.set_init_origin(SELLER).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();

        let state = contract_init(&ctx, &mut state_builder)
            .expect_report("Failed during init_BictoryEnglishAuction");

        claim_eq!(state.duration, Duration::from_hours(1));
        claim_eq!(state.reserve, Amount::from_ccd(1));
    }

    #[concordium_test]
    fn test_start() {
        let (mut host, registry) = default_host(Amount::zero());
        registry.add_operator(Address::Account(SELLER), Address::Contract(AUCTION));

        let ctx = receive_ctx(Address::Account(SELLER), start_time());
        let mut logger = TestLogger::init();
        let result = contract_start(&ctx, &mut host, &mut logger);

        claim_eq!(result, Ok(()));
        claim!(view(&host).started);
        claim_eq!(view(&host).end_time, Some(end_time()));
        // Token is escrowed by the auction
        claim_eq!(
            registry.owner_of(&token_0()),
            Some(Address::Contract(AUCTION))
        );
        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvents::start(&asset(), end_time()))]
        );
    }

    #[concordium_test]
    fn test_start_twice() {
        let (mut host, _registry) = started_host(Amount::zero());

        let ctx = receive_ctx(Address::Account(SELLER), end_time());
        let mut logger = TestLogger::init();
        let result = contract_start(&ctx, &mut host, &mut logger);

        claim_eq!(result, Err(CustomContractError::AlreadyStarted.into()));
        claim_eq!(view(&host).end_time, Some(end_time()));
        claim!(logger.logs.is_empty());
    }

    #[concordium_test]
    fn test_start_not_beneficiary() {
        let (mut host, registry) = default_host(Amount::zero());
        registry.add_operator(Address::Account(SELLER), Address::Contract(AUCTION));

        let ctx = receive_ctx(Address::Account(BIDDER_1), start_time());
        let mut logger = TestLogger::init();
        let result = contract_start(&ctx, &mut host, &mut logger);

        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));
        claim!(!view(&host).started);
        claim_eq!(registry.owner_of(&token_0()), Some(Address::Account(SELLER)));
    }

    #[concordium_test]
    fn test_start_without_approval() {
        let (mut host, registry) = default_host(Amount::zero());

        let ctx = receive_ctx(Address::Account(SELLER), start_time());
        let mut logger = TestLogger::init();
        let result = contract_start(&ctx, &mut host, &mut logger);

        claim_eq!(
            result,
            Err(CustomContractError::CustodyTransferRejected.into())
        );
        claim!(!view(&host).started);
        claim_eq!(view(&host).end_time, None);
        claim_eq!(registry.owner_of(&token_0()), Some(Address::Account(SELLER)));
    }

    #[concordium_test]
    fn test_start_token_not_held_by_seller() {
        let (mut host, registry) = default_host(Amount::zero());
        registry.add_operator(Address::Account(SELLER), Address::Contract(AUCTION));
        registry.mint(&token_0(), Address::Account(BIDDER_1));

        let ctx = receive_ctx(Address::Account(SELLER), start_time());
        let mut logger = TestLogger::init();
        let result = contract_start(&ctx, &mut host, &mut logger);

        claim_eq!(
            result,
            Err(CustomContractError::CustodyTransferRejected.into())
        );
        claim!(!view(&host).started);
    }

    #[concordium_test]
    fn test_start_after_operator_revoked() {
        let (mut host, registry) = default_host(Amount::zero());
        registry.add_operator(Address::Account(SELLER), Address::Contract(AUCTION));
        registry.remove_operator(Address::Account(SELLER), Address::Contract(AUCTION));

        let ctx = receive_ctx(Address::Account(SELLER), start_time());
        let mut logger = TestLogger::init();
        let result = contract_start(&ctx, &mut host, &mut logger);

        claim_eq!(
            result,
            Err(CustomContractError::CustodyTransferRejected.into())
        );
        claim_eq!(host.state().phase, Phase::Created);
        claim_eq!(registry.owner_of(&token_0()), Some(Address::Account(SELLER)));

        // Approving again lets the seller start
        registry.add_operator(Address::Account(SELLER), Address::Contract(AUCTION));
        let result = contract_start(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
    }

    #[concordium_test]
    fn test_bid_not_started() {
        let (mut host, _registry) = default_host(Amount::zero());

        let result = place_bid(
            &mut host,
            BIDDER_1,
            Amount::from_micro_ccd(100),
            start_time(),
        );

        claim_eq!(result, Err(CustomContractError::NotStarted.into()));
        claim_eq!(view(&host).highest_bid, Amount::zero());
        claim_eq!(view(&host).highest_bidder, None);
    }

    #[concordium_test]
    fn test_bid() {
        let (mut host, _registry) = started_host(Amount::zero());

        let amount = Amount::from_micro_ccd(100);
        let ctx = receive_ctx(Address::Account(BIDDER_1), start_time());
        let mut logger = TestLogger::init();
        let result = contract_bid(&ctx, &mut host, amount, &mut logger);

        claim_eq!(result, Ok(()));
        claim_eq!(view(&host).highest_bid, amount);
        claim_eq!(view(&host).highest_bidder, Some(BIDDER_1));
        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvents::bid(&BIDDER_1, amount))]
        );
    }

    #[concordium_test]
    fn test_bid_twice() {
        let (mut host, _registry) = started_host(Amount::zero());

        let amount = Amount::from_micro_ccd(100);
        claim_eq!(place_bid(&mut host, BIDDER_1, amount, start_time()), Ok(()));
        let result = place_bid(&mut host, BIDDER_1, amount, start_time());

        claim_eq!(
            result,
            Err(CustomContractError::AlreadyHighestBidder.into())
        );
        claim_eq!(view(&host).highest_bid, amount);
    }

    #[concordium_test]
    fn test_bid_too_low() {
        let (mut host, _registry) = started_host(Amount::from_micro_ccd(100));

        // Reserve itself is not enough
        let result = place_bid(
            &mut host,
            BIDDER_1,
            Amount::from_micro_ccd(100),
            start_time(),
        );
        claim_eq!(result, Err(CustomContractError::BidTooLow.into()));

        claim_eq!(
            place_bid(
                &mut host,
                BIDDER_1,
                Amount::from_micro_ccd(150),
                start_time()
            ),
            Ok(())
        );
        // Matching the highest bid is not enough
        let result = place_bid(
            &mut host,
            BIDDER_2,
            Amount::from_micro_ccd(150),
            start_time(),
        );
        claim_eq!(result, Err(CustomContractError::BidTooLow.into()));
        claim_eq!(pending_refund(&host, BIDDER_1), Amount::zero());
    }

    #[concordium_test]
    fn test_bid_from_contract() {
        let (mut host, _registry) = started_host(Amount::zero());

        let ctx = receive_ctx(Address::Contract(NFT), start_time());
        let mut logger = TestLogger::init();
        let result = contract_bid(&ctx, &mut host, Amount::from_ccd(1), &mut logger);

        claim_eq!(result, Err(CustomContractError::OnlyAccountAddress.into()));
    }

    #[concordium_test]
    fn test_bid_after_end_time() {
        let (mut host, _registry) = started_host(Amount::zero());

        let result = place_bid(&mut host, BIDDER_1, Amount::from_ccd(1), end_time());

        claim_eq!(result, Err(CustomContractError::AlreadyEnded.into()));
        claim_eq!(view(&host).highest_bidder, None);
    }

    #[concordium_test]
    fn test_outbid_credits_refunds() {
        let (mut host, _registry) = started_host(Amount::zero());

        claim_eq!(
            place_bid(&mut host, BIDDER_1, Amount::from_ccd(1), start_time()),
            Ok(())
        );
        claim_eq!(
            place_bid(&mut host, BIDDER_2, Amount::from_ccd(2), start_time()),
            Ok(())
        );
        claim_eq!(pending_refund(&host, BIDDER_1), Amount::from_ccd(1));

        claim_eq!(
            place_bid(&mut host, BIDDER_1, Amount::from_ccd(3), start_time()),
            Ok(())
        );
        claim_eq!(
            place_bid(&mut host, BIDDER_2, Amount::from_ccd(4), start_time()),
            Ok(())
        );

        claim_eq!(pending_refund(&host, BIDDER_1), Amount::from_ccd(4));
        claim_eq!(pending_refund(&host, BIDDER_2), Amount::from_ccd(2));
        claim_eq!(view(&host).highest_bid, Amount::from_ccd(4));

        // Every deposit is either owed back or the leading bid
        claim_eq!(
            host.self_balance(),
            pending_refund(&host, BIDDER_1)
                + pending_refund(&host, BIDDER_2)
                + view(&host).highest_bid
        );
    }

    #[concordium_test]
    fn test_end_too_early() {
        let (mut host, registry) = started_host(Amount::zero());
        claim_eq!(
            place_bid(
                &mut host,
                BIDDER_1,
                Amount::from_micro_ccd(100),
                start_time()
            ),
            Ok(())
        );

        let result = end(&mut host, start_time());

        claim_eq!(result, Err(CustomContractError::TooEarly.into()));
        claim!(!view(&host).ended);
        claim_eq!(
            registry.owner_of(&token_0()),
            Some(Address::Contract(AUCTION))
        );
    }

    #[concordium_test]
    fn test_end_not_started() {
        let (mut host, _registry) = default_host(Amount::zero());

        let result = end(&mut host, end_time());

        claim_eq!(result, Err(CustomContractError::NotStarted.into()));
    }

    #[concordium_test]
    fn test_end_not_beneficiary() {
        let (mut host, _registry) = started_host(Amount::zero());

        let ctx = receive_ctx(Address::Account(BIDDER_1), end_time());
        let mut logger = TestLogger::init();
        let result = contract_end(&ctx, &mut host, &mut logger);

        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));
        claim!(!view(&host).ended);
    }

    #[concordium_test]
    fn test_end_auction() {
        let (mut host, registry) = started_host(Amount::zero());
        place_scenario_bids(&mut host);

        let ctx = receive_ctx(Address::Account(SELLER), end_time());
        let mut logger = TestLogger::init();
        let result = contract_end(&ctx, &mut host, &mut logger);

        claim_eq!(result, Ok(()));
        claim!(view(&host).ended);
        claim_eq!(
            registry.owner_of(&token_0()),
            Some(Address::Account(BIDDER_3))
        );
        claim!(host.transfer_occurred(&SELLER, Amount::from_ccd(200)));
        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvents::end(
                Some(&BIDDER_3),
                Amount::from_ccd(200)
            ))]
        );
        // Only the outbid deposits are left in the contract
        claim_eq!(host.self_balance(), Amount::from_ccd(15));
    }

    #[concordium_test]
    fn test_end_twice() {
        let (mut host, _registry) = started_host(Amount::zero());
        place_scenario_bids(&mut host);

        claim_eq!(end(&mut host, end_time()), Ok(()));
        let result = end(&mut host, end_time());

        claim_eq!(result, Err(CustomContractError::AlreadyEnded.into()));
        claim!(view(&host).ended);
    }

    #[concordium_test]
    fn test_end_without_bids() {
        let (mut host, registry) = started_host(Amount::zero());

        let ctx = receive_ctx(Address::Account(SELLER), end_time());
        let mut logger = TestLogger::init();
        let result = contract_end(&ctx, &mut host, &mut logger);

        claim_eq!(result, Ok(()));
        claim!(view(&host).ended);
        claim_eq!(registry.owner_of(&token_0()), Some(Address::Account(SELLER)));
        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvents::end(None, Amount::zero()))]
        );
    }

    #[concordium_test]
    fn test_end_unsold_custody_rejected() {
        let (mut host, registry) = started_host(Amount::zero());
        registry.mint(&token_0(), Address::Account(BIDDER_1));

        let result = end(&mut host, end_time());

        claim_eq!(
            result,
            Err(CustomContractError::CustodyTransferRejected.into())
        );
        claim!(!view(&host).ended);
        claim_eq!(
            registry.owner_of(&token_0()),
            Some(Address::Account(BIDDER_1))
        );
    }

    #[concordium_test]
    fn test_end_custody_rejected() {
        let (mut host, registry) = started_host(Amount::zero());
        place_scenario_bids(&mut host);

        // Token was moved out of the auction behind its back
        registry.mint(&token_0(), Address::Account(SELLER));

        let result = end(&mut host, end_time());

        claim_eq!(
            result,
            Err(CustomContractError::CustodyTransferRejected.into())
        );
        claim!(!view(&host).ended);
        claim!(!host.transfer_occurred(&SELLER, Amount::from_ccd(200)));
    }

    #[concordium_test]
    fn test_end_payout_failed() {
        let (mut host, registry) = started_host(Amount::zero());
        place_scenario_bids(&mut host);
        host.set_self_balance(Amount::zero());

        let result = end(&mut host, end_time());

        claim_eq!(result, Err(CustomContractError::PayoutFailed.into()));
        claim!(!view(&host).ended);
        // The test host keeps the registry leg of a rejected call
        claim_eq!(
            registry.owner_of(&token_0()),
            Some(Address::Account(BIDDER_3))
        );
        claim!(!host.transfer_occurred(&SELLER, Amount::from_ccd(200)));
    }

    #[concordium_test]
    fn test_withdraw() {
        let (mut host, _registry) = started_host(Amount::zero());
        place_scenario_bids(&mut host);
        claim_eq!(end(&mut host, end_time()), Ok(()));

        // Winner was never outbid
        claim_eq!(withdraw(&mut host, BIDDER_3), Ok(Amount::zero()));
        claim_eq!(pending_refund(&host, BIDDER_3), Amount::zero());

        let ctx = receive_ctx(Address::Account(BIDDER_1), end_time());
        let mut logger = TestLogger::init();
        let result = contract_withdraw(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(Amount::from_ccd(5)));
        claim!(host.transfer_occurred(&BIDDER_1, Amount::from_ccd(5)));
        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvents::withdraw(
                &BIDDER_1,
                Amount::from_ccd(5)
            ))]
        );

        claim_eq!(withdraw(&mut host, BIDDER_2), Ok(Amount::from_ccd(10)));
        claim!(host.transfer_occurred(&BIDDER_2, Amount::from_ccd(10)));

        claim_eq!(pending_refund(&host, BIDDER_1), Amount::zero());
        claim_eq!(pending_refund(&host, BIDDER_2), Amount::zero());
        claim_eq!(host.self_balance(), Amount::zero());

        // Repeated calls are no-ops
        claim_eq!(withdraw(&mut host, BIDDER_1), Ok(Amount::zero()));
        claim_eq!(withdraw(&mut host, BIDDER_2), Ok(Amount::zero()));
    }

    #[concordium_test]
    fn test_withdraw_during_auction() {
        let (mut host, _registry) = started_host(Amount::zero());
        place_scenario_bids(&mut host);

        claim_eq!(withdraw(&mut host, BIDDER_1), Ok(Amount::from_ccd(5)));
        claim_eq!(
            host.self_balance(),
            pending_refund(&host, BIDDER_2) + view(&host).highest_bid
        );
    }

    #[concordium_test]
    fn test_withdraw_payout_failed() {
        let (mut host, _registry) = started_host(Amount::zero());
        place_scenario_bids(&mut host);
        host.set_self_balance(Amount::zero());

        let result = withdraw(&mut host, BIDDER_1);

        // Distinct from the nothing-to-withdraw case, and the entry stays cleared
        claim_eq!(result, Err(CustomContractError::PayoutFailed.into()));
        claim_eq!(pending_refund(&host, BIDDER_1), Amount::zero());
    }

    #[concordium_test]
    fn test_withdraw_from_contract() {
        let (mut host, _registry) = started_host(Amount::zero());

        let ctx = receive_ctx(Address::Contract(NFT), end_time());
        let mut logger = TestLogger::init();
        let result = contract_withdraw(&ctx, &mut host, &mut logger);

        claim_eq!(result, Err(CustomContractError::OnlyAccountAddress.into()));
    }

    fn on_receiving_params(
        token_id: TokenIdVec,
        from: Address,
    ) -> OnReceivingCis1Params<TokenIdVec> {
        OnReceivingCis1Params {
            token_id,
            amount: 1,
            from,
            contract_name: OwnedContractName::new_unchecked(String::from("init_BictoryNft")),
            data: AdditionalData::empty(),
        }
    }

    #[concordium_test]
    fn test_on_receiving_auctioned_token() {
        let (mut host, _registry) = default_host(Amount::zero());
        host.state_mut().phase = Phase::Receiving;

        let bytes = to_bytes(&on_receiving_params(token_0(), Address::Account(SELLER)));
        let mut ctx = receive_ctx(Address::Contract(NFT), start_time());
        ctx.set_parameter(&bytes);

        claim_eq!(contract_on_receiving_cis1(&ctx, &host), Ok(()));
    }

    #[concordium_test]
    fn test_on_receiving_outside_start() {
        let (host, registry) = default_host(Amount::zero());

        // Seller sends the token directly instead of calling `start`
        let bytes = to_bytes(&on_receiving_params(token_0(), Address::Account(SELLER)));
        let mut ctx = receive_ctx(Address::Contract(NFT), start_time());
        ctx.set_parameter(&bytes);

        claim_eq!(
            contract_on_receiving_cis1(&ctx, &host),
            Err(CustomContractError::UnexpectedTransfer.into())
        );
        claim!(!view(&host).started);
        claim_eq!(registry.owner_of(&token_0()), Some(Address::Account(SELLER)));
    }

    #[concordium_test]
    fn test_on_receiving_after_start() {
        let (host, _registry) = started_host(Amount::zero());

        let bytes = to_bytes(&on_receiving_params(token_0(), Address::Account(SELLER)));
        let mut ctx = receive_ctx(Address::Contract(NFT), end_time());
        ctx.set_parameter(&bytes);

        claim_eq!(
            contract_on_receiving_cis1(&ctx, &host),
            Err(CustomContractError::AlreadyStarted.into())
        );
    }

    #[concordium_test]
    fn test_on_receiving_rejects_unknown_tokens() {
        let (host, _registry) = default_host(Amount::zero());

        // Different token id
        let bytes = to_bytes(&on_receiving_params(
            TokenIdVec(vec![9]),
            Address::Account(SELLER),
        ));
        let mut ctx = receive_ctx(Address::Contract(NFT), start_time());
        ctx.set_parameter(&bytes);
        claim_eq!(
            contract_on_receiving_cis1(&ctx, &host),
            Err(CustomContractError::UnknownToken.into())
        );

        // Different registry
        let bytes = to_bytes(&on_receiving_params(token_0(), Address::Account(SELLER)));
        let mut ctx = receive_ctx(Address::Contract(AUCTION), start_time());
        ctx.set_parameter(&bytes);
        claim_eq!(
            contract_on_receiving_cis1(&ctx, &host),
            Err(CustomContractError::UnknownToken.into())
        );

        // Not sent from the beneficiary
        let bytes = to_bytes(&on_receiving_params(token_0(), Address::Account(BIDDER_1)));
        let mut ctx = receive_ctx(Address::Contract(NFT), start_time());
        ctx.set_parameter(&bytes);
        claim_eq!(
            contract_on_receiving_cis1(&ctx, &host),
            Err(CustomContractError::Unsupported.into())
        );

        // Accounts cannot call the hook
        let bytes = to_bytes(&on_receiving_params(token_0(), Address::Account(SELLER)));
        let mut ctx = receive_ctx(Address::Account(SELLER), start_time());
        ctx.set_parameter(&bytes);
        claim_eq!(
            contract_on_receiving_cis1(&ctx, &host),
            Err(CustomContractError::ContractOnly.into())
        );
    }
}
