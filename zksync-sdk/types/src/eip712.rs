use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_signer::SignerSync;
use alloy_sol_types::{eip712_domain, sol, Eip712Domain, SolStruct};
use serde::Serialize;

use crate::{
    constants::{EIP712_DOMAIN_NAME, EIP712_DOMAIN_VERSION, EIP712_TX_TYPE},
    envelope::Eip712Transaction,
};

sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq, Serialize)]
    struct Transaction {
        uint256 txType;
        uint256 from;
        uint256 to;
        uint256 gasLimit;
        uint256 gasPerPubdataByteLimit;
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
        uint256 paymaster;
        uint256 nonce;
        uint256 value;
        bytes data;
        bytes32[] factoryDeps;
        bytes paymasterInput;
    }
}

pub fn eip712_domain_for_chain(chain_id: u64) -> Eip712Domain {
    eip712_domain! {
        name: EIP712_DOMAIN_NAME,
        version: EIP712_DOMAIN_VERSION,
        chain_id: chain_id,
    }
}

fn address_to_uint(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice())
}

/// Typed-data view of an envelope: the domain it is signed under and the
/// struct whose signing hash is signed.
pub fn build_typed_data(tx: &Eip712Transaction) -> (Eip712Domain, Transaction) {
    let (paymaster, paymaster_input) = match tx.paymaster_params() {
        Some(params) => (params.paymaster, params.paymaster_input.clone()),
        None => (Address::ZERO, Bytes::new()),
    };

    let typed = Transaction {
        txType: U256::from(EIP712_TX_TYPE),
        from: address_to_uint(tx.from()),
        to: tx.to().map(address_to_uint).unwrap_or_default(),
        gasLimit: tx.gas_limit(),
        gasPerPubdataByteLimit: tx.gas_per_pubdata(),
        maxFeePerGas: tx.max_fee_per_gas(),
        maxPriorityFeePerGas: tx.max_priority_fee_per_gas(),
        paymaster: address_to_uint(paymaster),
        nonce: tx.nonce(),
        value: tx.value(),
        data: tx.data().clone(),
        factoryDeps: tx.factory_dep_hashes().to_vec(),
        paymasterInput: paymaster_input,
    };

    (eip712_domain_for_chain(tx.chain_id()), typed)
}

pub fn signing_hash(tx: &Eip712Transaction) -> B256 {
    let (domain, typed) = build_typed_data(tx);
    typed.eip712_signing_hash(&domain)
}

/// Signs the envelope and stores the 65-byte signature as its custom signature.
pub fn sign_transaction<S>(tx: Eip712Transaction, signer: &S) -> alloy_signer::Result<Eip712Transaction>
where
    S: SignerSync + ?Sized,
{
    let signature = signer.sign_hash_sync(&signing_hash(&tx))?;
    Ok(tx.with_signature(Bytes::copy_from_slice(&signature.as_bytes())))
}
