use concordium_std::concordium_cfg_test;

#[concordium_cfg_test]
pub use inner::*;

#[concordium_cfg_test]
mod inner {
    extern crate alloc;

    use crate::{ContractTokenId, TransferParameter};
    use alloc::{collections::BTreeMap, rc::Rc};
    use concordium_cis1::*;
    use concordium_std::test_infrastructure::MockFn;
    use concordium_std::*;
    use core::cell::RefCell;

    pub fn parse_and_check_mock<D: Deserial, S>(
        check: impl Fn(&D) -> bool + 'static,
        return_value: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        MockFn::new_v1(move |parameter, _, _, _state| {
            let value = D::deserial(&mut Cursor::new(parameter.as_ref()))
                .map_err(|_| CallContractError::Trap)?;
            if !check(&value) {
                return Err(CallContractError::Trap);
            };
            Ok((false, return_value.clone()))
        })
    }

    #[derive(Default)]
    struct Ledger {
        owners: BTreeMap<Vec<u8>, Address>,
        operators: Vec<(Address, Address)>,
    }

    impl Ledger {
        fn is_authorized(&self, caller: &Address, from: &Address) -> bool {
            caller == from || self.operators.contains(&(*from, *caller))
        }

        fn apply(&mut self, caller: &Address, transfer: &Transfer<ContractTokenId>) -> bool {
            match transfer.amount {
                0 => return true,
                1 => (),
                _ => return false,
            }
            let owner = match self.owners.get(&transfer.token_id.0) {
                Some(owner) => *owner,
                None => return false,
            };
            if owner != transfer.from || !self.is_authorized(caller, &transfer.from) {
                return false;
            }
            self.owners
                .insert(transfer.token_id.0.clone(), transfer.to.address());
            true
        }
    }

    /// In-memory CIS-1 registry standing in for the token contract.
    ///
    /// Only the contract passed to [`FakeRegistry::new`] ever invokes the mock, so
    /// that address is treated as the sender of every `transfer`. Clones share
    /// the same ledger, which lets a test keep a handle while the host owns the
    /// mock.
    #[derive(Clone)]
    pub struct FakeRegistry {
        caller: Address,
        ledger: Rc<RefCell<Ledger>>,
    }

    impl FakeRegistry {
        pub fn new(caller: ContractAddress) -> Self {
            Self {
                caller: Address::Contract(caller),
                ledger: Rc::new(RefCell::new(Ledger::default())),
            }
        }

        pub fn mint(&self, token_id: &ContractTokenId, owner: Address) {
            self.ledger
                .borrow_mut()
                .owners
                .insert(token_id.0.clone(), owner);
        }

        /// Equivalent of `updateOperator(Add)` sent by `owner`.
        pub fn add_operator(&self, owner: Address, operator: Address) {
            self.ledger.borrow_mut().operators.push((owner, operator));
        }

        pub fn remove_operator(&self, owner: Address, operator: Address) {
            self.ledger
                .borrow_mut()
                .operators
                .retain(|entry| *entry != (owner, operator));
        }

        pub fn owner_of(&self, token_id: &ContractTokenId) -> Option<Address> {
            self.ledger.borrow().owners.get(&token_id.0).copied()
        }

        /// Mock for the `transfer` entrypoint. A batch is applied only if every
        /// transfer in it is valid.
        pub fn transfer_mock<S>(&self) -> MockFn<S> {
            let caller = self.caller;
            let ledger = Rc::clone(&self.ledger);
            MockFn::new_v1(move |parameter, _, _, _state| {
                let TransferParams(transfers) =
                    TransferParameter::deserial(&mut Cursor::new(parameter.as_ref()))
                        .map_err(|_| CallContractError::Trap)?;

                let mut staged = Ledger {
                    owners: ledger.borrow().owners.clone(),
                    operators: ledger.borrow().operators.clone(),
                };
                for transfer in transfers.iter() {
                    if !staged.apply(&caller, transfer) {
                        return Err(CallContractError::Trap);
                    }
                }
                ledger.borrow_mut().owners = staged.owners;

                Ok((false, ()))
            })
        }
    }
}
