//! The single piece of mutable client state.

use crate::crypto::hashing::derive_citizen_id;
use crate::domain::contract::ContractHandle;
use crate::domain::types::{Address, CitizenId, NetworkId};

/// Account, network, identity and contract of the current wallet session.
///
/// The citizen identifier is only ever produced from the current account, so it cannot
/// outlive an account change. The contract handle is dropped whenever the network changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    account: Option<Address>,
    network: Option<NetworkId>,
    citizen: Option<CitizenId>,
    contract: Option<ContractHandle>,
}

impl Session {
    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn network(&self) -> Option<NetworkId> {
        self.network
    }

    pub fn citizen(&self) -> Option<CitizenId> {
        self.citizen
    }

    pub fn contract(&self) -> Option<&ContractHandle> {
        self.contract.as_ref()
    }

    /// Records a newly bound account. Any identity derived for a previous account is dropped.
    pub fn bind_account(&mut self, account: Address, network: NetworkId) {
        if self.account != Some(account) {
            self.citizen = None;
        }
        self.account = Some(account);
        self.set_network(network);
    }

    /// Derives and stores the citizen identifier for the current account.
    pub fn bind_identity(&mut self) -> Option<CitizenId> {
        self.citizen = self.account.as_ref().map(derive_citizen_id);
        self.citizen
    }

    /// Applies an account switch from the wallet. An established identity is re-derived for
    /// the new account, or cleared when no account remains.
    pub fn apply_account_change(&mut self, account: Option<Address>) {
        let had_identity = self.citizen.is_some();
        self.account = account;
        self.citizen = None;
        if had_identity {
            self.bind_identity();
        }
    }

    /// A different network invalidates the resolved contract.
    pub fn set_network(&mut self, network: NetworkId) {
        if self.network != Some(network) {
            self.contract = None;
        }
        self.network = Some(network);
    }

    /// Stores a handle resolved for the current network.
    pub fn set_contract(&mut self, handle: ContractHandle) {
        self.contract = Some(handle);
    }

    /// The current handle, if it was resolved for the current network.
    pub fn current_contract(&self) -> Option<&ContractHandle> {
        match (&self.contract, self.network) {
            (Some(handle), Some(network)) if handle.network == network => Some(handle),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{AbiDescriptor, ContractHandle};

    #[test]
    fn identity_requires_an_account() {
        let mut session = Session::default();
        assert_eq!(session.bind_identity(), None);

        session.bind_account(Address::repeat_byte(0xaa), NetworkId(1337));
        let id = session.bind_identity().unwrap();
        assert_eq!(id, derive_citizen_id(&Address::repeat_byte(0xaa)));
    }

    #[test]
    fn account_change_rederives_identity() {
        let mut session = Session::default();
        session.bind_account(Address::repeat_byte(0xaa), NetworkId(1337));
        session.bind_identity();

        session.apply_account_change(Some(Address::repeat_byte(0xbb)));
        assert_eq!(session.citizen(), Some(derive_citizen_id(&Address::repeat_byte(0xbb))));

        session.apply_account_change(None);
        assert_eq!(session.account(), None);
        assert_eq!(session.citizen(), None);
    }

    #[test]
    fn account_change_without_identity_does_not_create_one() {
        let mut session = Session::default();
        session.bind_account(Address::repeat_byte(0xaa), NetworkId(1337));
        session.apply_account_change(Some(Address::repeat_byte(0xbb)));
        assert_eq!(session.citizen(), None);
    }

    #[test]
    fn network_switch_drops_contract() {
        let mut session = Session::default();
        session.bind_account(Address::repeat_byte(0xaa), NetworkId(1337));
        session.set_contract(ContractHandle::full(
            NetworkId(1337),
            Address::repeat_byte(1),
            AbiDescriptor::default(),
        ));
        assert!(session.current_contract().is_some());

        session.set_network(NetworkId(1337));
        assert!(session.contract().is_some());

        session.set_network(NetworkId(5777));
        assert!(session.contract().is_none());
        assert!(session.current_contract().is_none());
    }
}
