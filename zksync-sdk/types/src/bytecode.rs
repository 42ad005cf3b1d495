use alloy_primitives::B256;
use sha2::{Digest, Sha256};

use crate::error::BytecodeError;

const BYTECODE_HASH_VERSION: u8 = 1;
const MAX_BYTECODE_LEN_WORDS: usize = (1 << 16) - 1;

/// Hash of a contract bytecode as the network stores it:
/// `[version, 0, len_in_words (u16 BE), sha256(bytecode)[4..]]`.
pub fn hash_bytecode(bytecode: &[u8]) -> Result<B256, BytecodeError> {
    if bytecode.len() % 32 != 0 {
        return Err(BytecodeError::NotWordAligned);
    }

    let len_in_words = bytecode.len() / 32;
    if len_in_words > MAX_BYTECODE_LEN_WORDS {
        return Err(BytecodeError::TooLong(len_in_words));
    }
    if len_in_words % 2 == 0 {
        return Err(BytecodeError::EvenWordCount);
    }

    let mut hash: [u8; 32] = Sha256::digest(bytecode).into();
    hash[0] = BYTECODE_HASH_VERSION;
    hash[1] = 0;
    hash[2..4].copy_from_slice(&(len_in_words as u16).to_be_bytes());

    Ok(B256::from(hash))
}
