use alloy_primitives::{address, Address, U160};

/// Transaction type of the custom EIP-712 envelope.
pub const EIP712_TX_TYPE: u8 = 0x71;

/// Transaction type the node reports for L1 priority operations.
pub const PRIORITY_OPERATION_L2_TX_TYPE: u8 = 0xff;

pub const EIP712_DOMAIN_NAME: &str = "zkSync";
pub const EIP712_DOMAIN_VERSION: &str = "2";

/// Gas per pubdata byte used for L2 transactions when none is supplied.
pub const DEFAULT_GAS_PER_PUBDATA_LIMIT: u64 = 50_000;

/// Gas per pubdata byte the bridgehub requires from L1->L2 transactions.
pub const REQUIRED_L1_TO_L2_GAS_PER_PUBDATA_LIMIT: u64 = 800;

/// Address the contracts use to denote ETH.
pub const ETH_ADDRESS_IN_CONTRACTS: Address = address!("0000000000000000000000000000000000000001");

/// Address that older clients use to denote ETH.
pub const LEGACY_ETH_ADDRESS: Address = Address::ZERO;

pub const BOOTLOADER_FORMAL_ADDRESS: Address = address!("0000000000000000000000000000000000008001");
pub const L1_MESSENGER_ADDRESS: Address = address!("0000000000000000000000000000000000008008");
pub const L2_BASE_TOKEN_ADDRESS: Address = address!("000000000000000000000000000000000000800a");

/// Offset added to L1 contract addresses when they act on L2.
pub const L1_TO_L2_ALIAS_OFFSET: Address = address!("1111000000000000000000000000000000001111");

pub const L1_RECOMMENDED_MIN_ERC20_DEPOSIT_GAS_LIMIT: u64 = 400_000;
pub const L1_RECOMMENDED_MIN_ETH_DEPOSIT_GAS_LIMIT: u64 = 200_000;

/// Polling interval used by the correlator and receipt waiters when the
/// configuration does not specify one.
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 500;

/// Returns `true` for both the legacy and the in-contract ETH address.
pub fn is_eth(token: Address) -> bool {
    token == LEGACY_ETH_ADDRESS || token == ETH_ADDRESS_IN_CONTRACTS
}

/// Maps the legacy ETH address onto the one used by the contracts.
pub fn normalize_token(token: Address) -> Address {
    if token == LEGACY_ETH_ADDRESS {
        ETH_ADDRESS_IN_CONTRACTS
    } else {
        token
    }
}

/// Converts the address of an L1 contract into the address it has when it
/// sends a transaction on L2.
pub fn apply_l1_to_l2_alias(address: Address) -> Address {
    let aliased = U160::from_be_bytes(address.0 .0)
        .wrapping_add(U160::from_be_bytes(L1_TO_L2_ALIAS_OFFSET.0 .0));
    let bytes: [u8; 20] = aliased.to_be_bytes();
    Address::from(bytes)
}

/// Inverse of [`apply_l1_to_l2_alias`].
pub fn undo_l1_to_l2_alias(address: Address) -> Address {
    let original = U160::from_be_bytes(address.0 .0)
        .wrapping_sub(U160::from_be_bytes(L1_TO_L2_ALIAS_OFFSET.0 .0));
    let bytes: [u8; 20] = original.to_be_bytes();
    Address::from(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_round_trip() {
        let l1 = address!("702942b8205e5dede7dd06fdec2d60ab91d3e1c1");
        let l2 = apply_l1_to_l2_alias(l1);
        assert_eq!(l2, address!("813a42b8205e5dede7dd06fdec2d60ab91d3f2d2"));
        assert_eq!(undo_l1_to_l2_alias(l2), l1);
    }

    #[test]
    fn test_alias_wraps_around() {
        let l1 = address!("ffffffffffffffffffffffffffffffffffffffff");
        let l2 = apply_l1_to_l2_alias(l1);
        assert_eq!(l2, address!("1111000000000000000000000000000000001110"));
        assert_eq!(undo_l1_to_l2_alias(l2), l1);
    }

    #[test]
    fn test_normalize_legacy_eth() {
        assert_eq!(normalize_token(LEGACY_ETH_ADDRESS), ETH_ADDRESS_IN_CONTRACTS);
        assert!(is_eth(LEGACY_ETH_ADDRESS));
        assert!(!is_eth(L2_BASE_TOKEN_ADDRESS));
    }
}
