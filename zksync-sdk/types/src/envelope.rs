use alloy_consensus::TxEnvelope;
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{keccak256, Address, Bytes, TxKind, B256, U256};
use alloy_rlp::{Decodable, Encodable, Header};

use crate::{
    bytecode::hash_bytecode,
    constants::{DEFAULT_GAS_PER_PUBDATA_LIMIT, EIP712_TX_TYPE},
    eip712,
    error::CodecError,
    paymaster::PaymasterParams,
};

/// RLP portion of the [`Eip712Transaction`]:
///
/// ```text
/// rlp([
///     nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit, to, value, data,
///     chainId, "", "",
///     chainId, from, gasPerPubdata, [factoryDeps], customSignature,
///     paymasterParams
/// ])
/// ```
#[derive(Debug, Clone, alloy_rlp::RlpDecodable, alloy_rlp::RlpEncodable)]
pub(crate) struct RlpEip712Transaction {
    pub nonce: U256,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub gas_limit: U256,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub legacy_v: U256,
    pub legacy_r: Bytes,
    pub legacy_s: Bytes,
    pub chain_id: u64,
    pub from: Address,
    pub gas_per_pubdata: U256,
    pub factory_deps: Vec<Bytes>,
    pub custom_signature: Bytes,
    pub paymaster_params: RlpPaymasterParams,
}

/// `[]` when absent, `[paymaster, paymasterInput]` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RlpPaymasterParams(Option<PaymasterParams>);

impl Encodable for RlpPaymasterParams {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        match &self.0 {
            Some(params) => {
                let fields: [&dyn Encodable; 2] = [&params.paymaster, &params.paymaster_input];
                alloy_rlp::encode_list::<_, dyn Encodable>(&fields, out);
            }
            None => Header { list: true, payload_length: 0 }.encode(out),
        }
    }

    fn length(&self) -> usize {
        match &self.0 {
            Some(params) => {
                let payload_length = params.paymaster.length() + params.paymaster_input.length();
                payload_length + alloy_rlp::length_of_length(payload_length)
            }
            None => 1,
        }
    }
}

impl Decodable for RlpPaymasterParams {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        if header.payload_length == 0 {
            return Ok(Self(None));
        }

        let started_len = buf.len();
        let paymaster = Address::decode(buf)?;
        let paymaster_input = Bytes::decode(buf)?;
        if started_len - buf.len() != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: started_len - buf.len(),
            });
        }

        Ok(Self(Some(PaymasterParams {
            paymaster,
            paymaster_input,
        })))
    }
}

/// Transaction envelope of type `0x71`. Fields are only settable through
/// [`Eip712TransactionBuilder`]; the custom signature is attached once with
/// [`Eip712Transaction::with_signature`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eip712Transaction {
    chain_id: u64,
    nonce: U256,
    from: Address,
    to: Option<Address>,
    gas_limit: U256,
    gas_per_pubdata: U256,
    max_fee_per_gas: U256,
    max_priority_fee_per_gas: U256,
    value: U256,
    data: Bytes,
    factory_deps: Vec<Bytes>,
    factory_dep_hashes: Vec<B256>,
    paymaster_params: Option<PaymasterParams>,
    custom_signature: Option<Bytes>,
}

impl Eip712Transaction {
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn from(&self) -> Address {
        self.from
    }

    pub fn to(&self) -> Option<Address> {
        self.to
    }

    pub fn gas_limit(&self) -> U256 {
        self.gas_limit
    }

    pub fn gas_per_pubdata(&self) -> U256 {
        self.gas_per_pubdata
    }

    pub fn max_fee_per_gas(&self) -> U256 {
        self.max_fee_per_gas
    }

    pub fn max_priority_fee_per_gas(&self) -> U256 {
        self.max_priority_fee_per_gas
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn factory_deps(&self) -> &[Bytes] {
        &self.factory_deps
    }

    /// Bytecode hashes of the factory dependencies, in order.
    pub fn factory_dep_hashes(&self) -> &[B256] {
        &self.factory_dep_hashes
    }

    pub fn paymaster_params(&self) -> Option<&PaymasterParams> {
        self.paymaster_params.as_ref()
    }

    pub fn custom_signature(&self) -> Option<&Bytes> {
        self.custom_signature.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.custom_signature.is_some()
    }

    /// Attaches the custom signature. An empty signature leaves the envelope
    /// unsigned.
    pub fn with_signature(mut self, signature: Bytes) -> Self {
        self.custom_signature = (!signature.is_empty()).then_some(signature);
        self
    }

    pub fn signing_hash(&self) -> B256 {
        eip712::signing_hash(self)
    }

    /// `keccak256(signingHash || keccak256(customSignature))`.
    pub fn tx_hash(&self) -> Result<B256, CodecError> {
        let signature = self.custom_signature.as_ref().ok_or(CodecError::NotSigned)?;

        let mut preimage = [0u8; 64];
        preimage[..32].copy_from_slice(self.signing_hash().as_slice());
        preimage[32..].copy_from_slice(keccak256(signature).as_slice());
        Ok(keccak256(preimage))
    }

    fn to_rlp(&self) -> RlpEip712Transaction {
        RlpEip712Transaction {
            nonce: self.nonce,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            gas_limit: self.gas_limit,
            to: self.to.map(TxKind::Call).unwrap_or(TxKind::Create),
            value: self.value,
            data: self.data.clone(),
            legacy_v: U256::from(self.chain_id),
            legacy_r: Bytes::new(),
            legacy_s: Bytes::new(),
            chain_id: self.chain_id,
            from: self.from,
            gas_per_pubdata: self.gas_per_pubdata,
            factory_deps: self.factory_deps.clone(),
            custom_signature: self.custom_signature.clone().unwrap_or_default(),
            paymaster_params: RlpPaymasterParams(self.paymaster_params.clone()),
        }
    }

    /// `0x71 || rlp(...)`.
    pub fn encode(&self) -> Bytes {
        let rlp = self.to_rlp();
        let mut out = Vec::with_capacity(1 + rlp.length());
        out.push(EIP712_TX_TYPE);
        rlp.encode(&mut out);
        out.into()
    }

    pub fn decode(tx_bytes: &[u8]) -> Result<Self, CodecError> {
        let (&tx_type, mut rlp_bytes) = tx_bytes.split_first().ok_or(CodecError::InvalidLength)?;
        if tx_type != EIP712_TX_TYPE {
            return Err(CodecError::UnexpectedTxType(tx_type));
        }

        let rlp = RlpEip712Transaction::decode(&mut rlp_bytes)?;
        if !rlp_bytes.is_empty() {
            return Err(CodecError::InvalidLength);
        }

        let factory_dep_hashes = hash_factory_deps(&rlp.factory_deps)?;

        Ok(Self {
            chain_id: rlp.chain_id,
            nonce: rlp.nonce,
            from: rlp.from,
            to: rlp.to.to().copied(),
            gas_limit: rlp.gas_limit,
            gas_per_pubdata: rlp.gas_per_pubdata,
            max_fee_per_gas: rlp.max_fee_per_gas,
            max_priority_fee_per_gas: rlp.max_priority_fee_per_gas,
            value: rlp.value,
            data: rlp.data,
            factory_deps: rlp.factory_deps,
            factory_dep_hashes,
            paymaster_params: rlp.paymaster_params.0,
            custom_signature: (!rlp.custom_signature.is_empty()).then_some(rlp.custom_signature),
        })
    }
}

fn hash_factory_deps(factory_deps: &[Bytes]) -> Result<Vec<B256>, CodecError> {
    factory_deps
        .iter()
        .enumerate()
        .map(|(index, dep)| hash_bytecode(dep).map_err(|err| CodecError::InvalidFactoryDep { index, err }))
        .collect()
}

/// Result of [`parse_transaction`].
#[derive(Debug, Clone)]
pub enum ParsedTransaction {
    Eip712(Eip712Transaction),
    Standard(TxEnvelope),
}

impl ParsedTransaction {
    pub fn tx_type(&self) -> u8 {
        match self {
            Self::Eip712(_) => EIP712_TX_TYPE,
            Self::Standard(tx) => u8::from(tx.tx_type()),
        }
    }
}

/// Decodes raw transaction bytes of any type: envelopes of type `0x71` are
/// decoded here, everything else goes through the EIP-2718 decoder.
pub fn parse_transaction(tx_bytes: &[u8]) -> Result<ParsedTransaction, CodecError> {
    match tx_bytes.first() {
        None => Err(CodecError::InvalidLength),
        Some(&EIP712_TX_TYPE) => Eip712Transaction::decode(tx_bytes).map(ParsedTransaction::Eip712),
        Some(_) => {
            let mut buf = tx_bytes;
            let tx = TxEnvelope::decode_2718(&mut buf)?;
            Ok(ParsedTransaction::Standard(tx))
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Eip712TransactionBuilderError {
    #[error("eip712 tx builder error: {0} is required")]
    MissingField(&'static str),
    #[error("eip712 tx builder error: {0}")]
    Codec(#[from] CodecError),
}

#[derive(Debug, Default, Clone)]
pub struct Eip712TransactionBuilder {
    chain_id: Option<u64>,
    nonce: Option<U256>,
    from: Option<Address>,
    to: Option<Address>,
    gas_limit: Option<U256>,
    gas_per_pubdata: Option<U256>,
    max_fee_per_gas: Option<U256>,
    max_priority_fee_per_gas: Option<U256>,
    value: Option<U256>,
    data: Option<Bytes>,
    factory_deps: Vec<Bytes>,
    paymaster_params: Option<PaymasterParams>,
    custom_signature: Option<Bytes>,
}

impl Eip712TransactionBuilder {
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn gas_limit(mut self, gas_limit: U256) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn gas_per_pubdata(mut self, gas_per_pubdata: U256) -> Self {
        self.gas_per_pubdata = Some(gas_per_pubdata);
        self
    }

    pub fn max_fee_per_gas(mut self, max_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self
    }

    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: U256) -> Self {
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    pub fn factory_deps(mut self, factory_deps: Vec<Bytes>) -> Self {
        self.factory_deps = factory_deps;
        self
    }

    pub fn paymaster_params(mut self, paymaster_params: PaymasterParams) -> Self {
        self.paymaster_params = Some(paymaster_params);
        self
    }

    pub fn custom_signature(mut self, custom_signature: Bytes) -> Self {
        self.custom_signature = Some(custom_signature);
        self
    }

    pub fn build(self) -> Result<Eip712Transaction, Eip712TransactionBuilderError> {
        let chain_id = self
            .chain_id
            .ok_or(Eip712TransactionBuilderError::MissingField("chain_id"))?;
        let nonce = self
            .nonce
            .ok_or(Eip712TransactionBuilderError::MissingField("nonce"))?;
        let from = self
            .from
            .ok_or(Eip712TransactionBuilderError::MissingField("from"))?;
        let gas_limit = self
            .gas_limit
            .ok_or(Eip712TransactionBuilderError::MissingField("gas_limit"))?;
        let max_fee_per_gas = self
            .max_fee_per_gas
            .ok_or(Eip712TransactionBuilderError::MissingField("max_fee_per_gas"))?;

        if matches!(&self.custom_signature, Some(signature) if signature.is_empty()) {
            return Err(CodecError::EmptyCustomSignature.into());
        }

        let factory_dep_hashes = hash_factory_deps(&self.factory_deps)?;

        Ok(Eip712Transaction {
            chain_id,
            nonce,
            from,
            to: self.to,
            gas_limit,
            gas_per_pubdata: self
                .gas_per_pubdata
                .unwrap_or(U256::from(DEFAULT_GAS_PER_PUBDATA_LIMIT)),
            max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas.unwrap_or(max_fee_per_gas),
            value: self.value.unwrap_or_default(),
            data: self.data.unwrap_or_default(),
            factory_deps: self.factory_deps,
            factory_dep_hashes,
            paymaster_params: self.paymaster_params,
            custom_signature: self.custom_signature,
        })
    }
}
