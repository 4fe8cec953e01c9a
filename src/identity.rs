//! Relaying identity and the authorization signer set
//!
//! Keys come from one BIP-39 mnemonic along the standard Ethereum path
//! `m/44'/60'/0'/0/{index}`. The relaying identity pays for and sends
//! transactions; the authorization identities sign mint authorizations.
//!
//! The authorization set is sorted ascending by address exactly once, here.
//! The minter contract checks signatures against that order, so nothing
//! downstream may reorder it.

use alloy::primitives::Address;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use eyre::{eyre, Result, WrapErr};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// One derived key: an address with signing capability
#[derive(Clone)]
pub struct SignerIdentity {
    signer: PrivateKeySigner,
    index: Option<u32>,
}

impl SignerIdentity {
    /// Wrap an existing key (no derivation index)
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self {
            signer,
            index: None,
        }
    }

    /// Derive the key at `index` from `mnemonic`
    pub fn from_mnemonic(mnemonic: &str, index: u32) -> Result<Self> {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(mnemonic)
            .index(index)
            .map_err(|e| eyre!("Invalid derivation index {}: {}", index, e))?
            .build()
            .map_err(|e| eyre!("Failed to derive key at index {}: {}", index, e))?;

        Ok(Self {
            signer,
            index: Some(index),
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Derivation index, when derived from a mnemonic
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

/// Keys never appear in debug output.
impl fmt::Debug for SignerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerIdentity")
            .field("address", &self.address())
            .field("index", &self.index)
            .finish()
    }
}

/// Authorization signers in ascending address order
#[derive(Debug, Clone)]
pub struct AuthorizationSet {
    identities: Arc<[SignerIdentity]>,
}

impl AuthorizationSet {
    /// Sort `identities` ascending by address and freeze the order.
    ///
    /// Duplicate addresses are rejected: the verifier requires a strictly
    /// ascending signer list.
    pub fn new(mut identities: Vec<SignerIdentity>) -> Result<Self> {
        identities.sort_by_key(|identity| identity.address());

        if let Some(pair) = identities
            .windows(2)
            .find(|pair| pair[0].address() == pair[1].address())
        {
            return Err(eyre!(
                "Duplicate authorization signer {}",
                pair[0].address()
            ));
        }

        Ok(Self {
            identities: identities.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignerIdentity> {
        self.identities.iter()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.identities.iter().map(|i| i.address()).collect()
    }
}

/// The relaying identity plus the authorization set, built once at startup
#[derive(Debug, Clone)]
pub struct SignerIdentitySet {
    relayer: SignerIdentity,
    authorization: AuthorizationSet,
}

impl SignerIdentitySet {
    pub fn new(relayer: SignerIdentity, signers: Vec<SignerIdentity>) -> Result<Self> {
        let authorization = AuthorizationSet::new(signers)?;
        Ok(Self {
            relayer,
            authorization,
        })
    }

    /// Derive the relaying identity and every authorization signer from one mnemonic
    pub fn from_mnemonic(mnemonic: &str, relayer_index: u32, signer_indexes: &[u32]) -> Result<Self> {
        let relayer = SignerIdentity::from_mnemonic(mnemonic, relayer_index)
            .wrap_err("Failed to derive relaying identity")?;

        let signers = signer_indexes
            .iter()
            .map(|&index| SignerIdentity::from_mnemonic(mnemonic, index))
            .collect::<Result<Vec<_>>>()
            .wrap_err("Failed to derive authorization signers")?;

        let set = Self::new(relayer, signers)?;

        info!(
            relayer = %set.relayer.address(),
            signers = set.authorization.len(),
            "Signer identities derived"
        );

        Ok(set)
    }

    pub fn relayer(&self) -> &SignerIdentity {
        &self.relayer
    }

    pub fn relayer_address(&self) -> Address {
        self.relayer.address()
    }

    pub fn authorization(&self) -> &AuthorizationSet {
        &self.authorization
    }

    /// Every identity holding a key, relayer first
    pub fn all(&self) -> impl Iterator<Item = &SignerIdentity> {
        std::iter::once(&self.relayer).chain(self.authorization.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TEST_MNEMONIC;
    use alloy::primitives::address;

    #[test]
    fn test_derivation_matches_well_known_accounts() {
        let identity = SignerIdentity::from_mnemonic(TEST_MNEMONIC, 0).unwrap();
        assert_eq!(
            identity.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(identity.index(), Some(0));

        let identity = SignerIdentity::from_mnemonic(TEST_MNEMONIC, 1).unwrap();
        assert_eq!(
            identity.address(),
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }

    #[test]
    fn test_authorization_set_sorted_ascending() {
        let set = SignerIdentitySet::from_mnemonic(TEST_MNEMONIC, 0, &[3, 1, 2]).unwrap();

        assert_eq!(
            set.authorization().addresses(),
            vec![
                address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
                address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
                address!("90F79bf6EB2c4f870365E785982E1f101E93b906"),
            ]
        );
        assert_eq!(
            set.relayer_address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(set.all().count(), 4);
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let a = SignerIdentitySet::from_mnemonic(TEST_MNEMONIC, 0, &[1, 2, 3]).unwrap();
        let b = SignerIdentitySet::from_mnemonic(TEST_MNEMONIC, 0, &[2, 3, 1]).unwrap();
        assert_eq!(a.authorization().addresses(), b.authorization().addresses());
    }

    #[test]
    fn test_duplicate_signer_rejected() {
        let result = SignerIdentitySet::from_mnemonic(TEST_MNEMONIC, 0, &[1, 1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let identity = SignerIdentity::from_mnemonic(TEST_MNEMONIC, 0).unwrap();
        let debug = format!("{:?}", identity);
        assert!(debug.contains("address"));
        assert!(!debug.contains("ac0974bec39a17e36ba4a6b4d238ff944bacb478"));
    }
}
