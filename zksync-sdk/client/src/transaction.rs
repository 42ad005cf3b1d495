use std::time::Duration;

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::{eip2718::Encodable2718, BlockNumberOrTag};
use alloy_primitives::{Address, Bytes, TxKind, B256, U256, U64};
use alloy_signer::SignerSync;
use tracing::{debug, info, instrument};
use zksync_sdk_types::{
    rpc::{CallRequest, Eip712Meta, L2TransactionReceipt},
    sign_transaction, CodecError, Eip712Transaction, Eip712TransactionBuilder, DEFAULT_GAS_PER_PUBDATA_LIMIT,
    EIP712_TX_TYPE,
};

use crate::{error::SdkResult, provider::RollupProvider};

/// A fully populated L2 transaction, ready to be signed.
#[derive(Debug, Clone, PartialEq)]
pub enum PopulatedTransaction {
    Eip712(Eip712Transaction),
    Eip1559(TxEip1559),
}

/// Requests carrying network-specific fields, or explicitly typed `0x71`, go
/// through the custom envelope. Everything else is a plain EIP-1559
/// transaction.
pub fn is_eip712_request(request: &CallRequest) -> bool {
    request.eip712_meta.is_some() || request.transaction_type == Some(U64::from(EIP712_TX_TYPE))
}

pub(crate) fn narrow<T: TryFrom<U256>>(value: U256, field_name: &'static str) -> Result<T, CodecError> {
    T::try_from(value).map_err(|_| CodecError::InvalidField {
        field_name,
        reason: "value out of range",
    })
}

/// Fills in sender, chain id, nonce, fees and gas limit of `request`.
#[instrument(skip_all, fields(%from))]
pub async fn populate_transaction(
    provider: &RollupProvider,
    from: Address,
    mut request: CallRequest,
) -> SdkResult<PopulatedTransaction> {
    request.from = Some(from);

    let chain_id = match request.chain_id {
        Some(chain_id) => chain_id.to::<u64>(),
        None => provider.chain_id().await?,
    };
    let nonce = match request.nonce {
        Some(nonce) => nonce,
        None => {
            provider
                .get_transaction_count(from, BlockNumberOrTag::Pending)
                .await?
        }
    };
    let max_fee_per_gas = match request.max_fee_per_gas.or(request.gas_price) {
        Some(fee) => fee,
        None => provider.gas_price().await?,
    };
    let max_priority_fee_per_gas = request.max_priority_fee_per_gas.unwrap_or(max_fee_per_gas);

    let eip712 = is_eip712_request(&request);
    if eip712 {
        request.transaction_type = Some(U64::from(EIP712_TX_TYPE));
        request.eip712_meta.get_or_insert_with(|| Eip712Meta {
            gas_per_pubdata: U256::from(DEFAULT_GAS_PER_PUBDATA_LIMIT),
            ..Default::default()
        });
    }

    let gas_limit = match request.gas_limit {
        Some(gas_limit) => gas_limit,
        None => {
            let estimate = CallRequest {
                chain_id: Some(U64::from(chain_id)),
                nonce: Some(nonce),
                ..request.clone()
            };
            provider.estimate_gas(estimate).await?
        }
    };
    debug!(chain_id, %nonce, %gas_limit, %max_fee_per_gas, eip712, "Populated transaction");

    let value = request.value.unwrap_or_default();
    let data = request.data.unwrap_or_default();

    if let Some(meta) = request.eip712_meta {
        let mut builder = Eip712TransactionBuilder::default()
            .chain_id(chain_id)
            .nonce(nonce)
            .from(from)
            .gas_limit(gas_limit)
            .gas_per_pubdata(meta.gas_per_pubdata)
            .max_fee_per_gas(max_fee_per_gas)
            .max_priority_fee_per_gas(max_priority_fee_per_gas)
            .value(value)
            .data(data)
            .factory_deps(meta.factory_deps.into_iter().map(Bytes::from).collect());
        if let Some(to) = request.to {
            builder = builder.to(to);
        }
        if let Some(paymaster_params) = meta.paymaster_params {
            builder = builder.paymaster_params(paymaster_params);
        }
        if let Some(custom_signature) = meta.custom_signature {
            builder = builder.custom_signature(custom_signature);
        }
        return Ok(PopulatedTransaction::Eip712(builder.build()?));
    }

    Ok(PopulatedTransaction::Eip1559(TxEip1559 {
        chain_id,
        nonce: narrow(nonce, "nonce")?,
        gas_limit: narrow(gas_limit, "gas_limit")?,
        max_fee_per_gas: narrow(max_fee_per_gas, "max_fee_per_gas")?,
        max_priority_fee_per_gas: narrow(max_priority_fee_per_gas, "max_priority_fee_per_gas")?,
        to: request.to.map_or(TxKind::Create, TxKind::Call),
        value,
        access_list: Default::default(),
        input: data,
    }))
}

/// Signs `tx` and returns its network encoding.
pub fn sign_populated_transaction<S>(tx: PopulatedTransaction, signer: &S) -> SdkResult<Bytes>
where
    S: SignerSync + ?Sized,
{
    match tx {
        PopulatedTransaction::Eip712(tx) => Ok(sign_transaction(tx, signer)?.encode()),
        PopulatedTransaction::Eip1559(tx) => {
            let signature = signer.sign_hash_sync(&tx.signature_hash())?;
            let envelope = TxEnvelope::from(tx.into_signed(signature));
            Ok(envelope.encoded_2718().into())
        }
    }
}

/// Broadcasts signed transaction bytes.
pub async fn send_signed_transaction(provider: &RollupProvider, tx_bytes: Bytes) -> SdkResult<PendingL2Transaction<'_>> {
    let tx_hash = provider.send_raw_transaction(tx_bytes).await?;
    info!(%tx_hash, "Sent L2 transaction");
    Ok(PendingL2Transaction::new(provider, tx_hash))
}

/// A submitted L2 transaction.
pub struct PendingL2Transaction<'a> {
    provider: &'a RollupProvider,
    tx_hash: B256,
}

impl<'a> PendingL2Transaction<'a> {
    pub fn new(provider: &'a RollupProvider, tx_hash: B256) -> Self {
        Self { provider, tx_hash }
    }

    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    /// Polls until the transaction is mined and `confirmations` blocks
    /// (including its own) exist.
    pub async fn wait(&self, confirmations: u64) -> SdkResult<L2TransactionReceipt> {
        let polling_interval: Duration = self.provider.polling_interval();
        loop {
            metrics::counter!("zksync_sdk_polling_iterations_total", "loop" => "l2_receipt").increment(1);

            if let Some(receipt) = self.provider.get_transaction_receipt(self.tx_hash).await? {
                if let Some(block_number) = receipt.block_number {
                    let target = block_number.to::<u64>() + confirmations.saturating_sub(1);
                    if self.provider.block_number().await? >= target {
                        return Ok(receipt);
                    }
                }
            }

            debug!(tx_hash = %self.tx_hash, "L2 transaction not confirmed yet");
            tokio::time::sleep(polling_interval).await;
        }
    }
}
