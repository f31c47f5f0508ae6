use super::*;

pub type ContractResult<A> = Result<A, CustomContractError>;

/// Contract token ID type.
pub type ContractTokenId = TokenIdVec;

/// Parameter type for the CIS-1 function `transfer` specialized to the token
/// IDs used by the auctioned registries.
pub type TransferParameter = TransferParams<ContractTokenId>;

/// Reference to the single auctioned token: the registry contract holding it
/// and its id within that registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct AssetRef {
    /// CIS-1 registry contract address.
    pub contract: ContractAddress,
    /// Token identifier within the registry.
    pub id: ContractTokenId,
}
