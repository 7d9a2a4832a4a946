// Keccak256 helpers: citizen identifier derivation and ABI function selectors.

use primitive_types::H256;
use sha3::{Digest, Keccak256};

use crate::domain::types::{format_address, Address, CitizenId};

/// Salt appended to the account before hashing. Changing it re-keys every citizen.
pub const CITIZEN_SALT: &[u8] = b"civic_pulse_salt";

pub fn keccak256(data: &[u8]) -> H256 {
    H256::from_slice(&Keccak256::digest(data))
}

/// Derives the citizen identifier for an account.
///
/// The account is hashed in its lowercase `0x` hex form followed by [`CITIZEN_SALT`], so the
/// identifier matches what a browser wallet session computes for the same address.
pub fn derive_citizen_id(account: &Address) -> CitizenId {
    let mut hasher = Keccak256::new();
    hasher.update(format_address(account).as_bytes());
    hasher.update(CITIZEN_SALT);
    H256::from_slice(&hasher.finalize())
}

/// First four bytes of the keccak256 of a canonical function signature.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&digest[..4]);
    selector
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use std::collections::HashSet;

    #[test]
    fn keccak_matches_known_vector() {
        assert_eq!(
            hex::encode(keccak256(b"").as_bytes()),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn selectors_match_well_known_erc20_methods() {
        assert_eq!(function_selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(function_selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn citizen_id_is_salted_hash_of_lowercase_account() {
        let account = Address::repeat_byte(0xaa);
        let expected = keccak256(
            format!("0x{}civic_pulse_salt", "aa".repeat(20)).as_bytes(),
        );
        assert_eq!(derive_citizen_id(&account), expected);
        assert_ne!(derive_citizen_id(&account), keccak256(format_address(&account).as_bytes()));
    }

    #[test]
    fn derivation_is_deterministic_and_collision_free_over_samples() {
        let mut rng = rand::thread_rng();
        let mut seen = HashSet::new();
        for _ in 0..512 {
            let mut bytes = [0u8; 20];
            rng.fill_bytes(&mut bytes);
            let account = Address::from(bytes);
            let id = derive_citizen_id(&account);
            assert_eq!(id, derive_citizen_id(&account));
            seen.insert((account, id));
        }
        let ids: HashSet<_> = seen.iter().map(|(_, id)| *id).collect();
        assert_eq!(ids.len(), seen.len());
    }
}
