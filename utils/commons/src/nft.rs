use super::*;

/// Asset registry capability of the host: moving CIS-1 tokens on behalf of
/// the calling contract.
pub trait HostNftExt<S>: HasHost<S> {
    /// Ask the registry to move exactly one unit of `asset` from `from` to
    /// `to`. The registry authorizes the call, so this contract must either
    /// hold the token or be an operator of `from`.
    fn nft_transfer(
        &mut self,
        asset: &AssetRef,
        from: Address,
        to: Receiver,
    ) -> Result<(), CallContractError<Self::ReturnValueType>> {
        let parameter: TransferParameter = TransferParams(vec![Transfer {
            token_id: asset.id.clone(),
            amount: 1,
            from,
            to,
            data: AdditionalData::empty(),
        }]);

        self.invoke_contract(
            &asset.contract,
            &parameter,
            EntrypointName::new_unchecked("transfer"),
            Amount::zero(),
        )?;

        Ok(())
    }
}

impl<S, H: HasHost<S>> HostNftExt<S> for H {}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::test::*;
    use test_infrastructure::*;

    const NFT_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    const AUCTION: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };

    const USER_1: AccountAddress = AccountAddress([1; 32]);
    const USER_2: AccountAddress = AccountAddress([2; 32]);

    fn asset() -> AssetRef {
        AssetRef {
            contract: NFT_CONTRACT,
            id: TokenIdVec([1; 32].into()),
        }
    }

    #[concordium_test]
    fn test_transfer_serializes_single_unit() {
        let mut host = TestHost::new((), TestStateBuilder::new());

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParameter, _>(
                |TransferParams(transfers)| {
                    transfers.len() == 1
                        && transfers[0].amount == 1
                        && transfers[0].from == Address::Account(USER_1)
                        && transfers[0].to.address() == Address::Account(USER_2)
                },
                (),
            ),
        );

        let response = host.nft_transfer(
            &asset(),
            Address::Account(USER_1),
            Receiver::Account(USER_2),
        );

        claim!(response.is_ok());
    }

    #[concordium_test]
    fn test_transfer_moves_ownership_in_fake_registry() {
        let mut host = TestHost::new((), TestStateBuilder::new());
        let registry = FakeRegistry::new(AUCTION);
        registry.mint(&asset().id, Address::Account(USER_1));

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            registry.transfer_mock(),
        );

        // Caller is neither holder nor operator
        let response = host.nft_transfer(
            &asset(),
            Address::Account(USER_1),
            Receiver::Account(USER_2),
        );
        claim!(response.is_err());
        claim_eq!(registry.owner_of(&asset().id), Some(Address::Account(USER_1)));

        registry.add_operator(Address::Account(USER_1), Address::Contract(AUCTION));
        let response = host.nft_transfer(
            &asset(),
            Address::Account(USER_1),
            Receiver::Account(USER_2),
        );
        claim!(response.is_ok());
        claim_eq!(registry.owner_of(&asset().id), Some(Address::Account(USER_2)));
    }
}
