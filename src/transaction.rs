//! Sponsored transaction decoding and verification.
//!
//! The sponsor returns BCS-encoded `TransactionData::V1`:
//!
//! ```text
//! 0x00 (V1) || kind || sender (32) || gas_data || expiration
//! ```
//!
//! `kind` is exactly the gas-free bytes we built, so a sponsored transaction
//! is accepted only if it begins with our kind and sender and the remainder
//! parses as gas data and an expiration with nothing left over.

use crate::types::{Result, SuiChatError, ADDRESS_SIZE};

const TRANSACTION_DATA_V1: u8 = 0x00;
const OBJECT_DIGEST_SIZE: usize = 32;

/// Parse a `0x`-prefixed Sui address, left-padding short forms to 32 bytes.
pub fn parse_address(address: &str) -> Result<[u8; ADDRESS_SIZE]> {
    let digits = address
        .strip_prefix("0x")
        .ok_or_else(|| SuiChatError::InvalidAddress(format!("missing 0x prefix: {}", address)))?;

    if digits.is_empty() || digits.len() > ADDRESS_SIZE * 2 {
        return Err(SuiChatError::InvalidAddress(format!(
            "expected 1 to 64 hex digits, got {}",
            digits.len()
        )));
    }

    let padded = format!("{:0>64}", digits);
    let bytes = hex::decode(&padded)
        .map_err(|e| SuiChatError::InvalidAddress(format!("{}: {}", address, e)))?;

    let mut out = [0u8; ADDRESS_SIZE];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Format an address in canonical long form.
pub fn format_address(address: &[u8; ADDRESS_SIZE]) -> String {
    format!("0x{}", hex::encode(address))
}

/// Reference to an owned object used as gas payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub object_id: [u8; ADDRESS_SIZE],
    pub version: u64,
    pub digest: [u8; OBJECT_DIGEST_SIZE],
}

/// Gas payment attached by the sponsor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasData {
    pub payment: Vec<ObjectRef>,
    pub owner: [u8; ADDRESS_SIZE],
    pub price: u64,
    pub budget: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionExpiration {
    None,
    Epoch(u64),
}

/// Decoded `TransactionData::V1` with the kind kept as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionData {
    /// BCS-encoded transaction kind, exactly as built by the sender.
    pub kind: Vec<u8>,
    pub sender: [u8; ADDRESS_SIZE],
    pub gas_data: GasData,
    pub expiration: TransactionExpiration,
}

impl TransactionData {
    /// Encode to BCS.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(1 + self.kind.len() + ADDRESS_SIZE + 128);
        data.push(TRANSACTION_DATA_V1);
        data.extend_from_slice(&self.kind);
        data.extend_from_slice(&self.sender);

        write_uleb128(&mut data, self.gas_data.payment.len());
        for object in &self.gas_data.payment {
            data.extend_from_slice(&object.object_id);
            data.extend_from_slice(&object.version.to_le_bytes());
            write_uleb128(&mut data, OBJECT_DIGEST_SIZE);
            data.extend_from_slice(&object.digest);
        }
        data.extend_from_slice(&self.gas_data.owner);
        data.extend_from_slice(&self.gas_data.price.to_le_bytes());
        data.extend_from_slice(&self.gas_data.budget.to_le_bytes());

        match self.expiration {
            TransactionExpiration::None => data.push(0),
            TransactionExpiration::Epoch(epoch) => {
                data.push(1);
                data.extend_from_slice(&epoch.to_le_bytes());
            }
        }
        data
    }
}

/// Check that sponsor-returned bytes carry exactly the kind and sender we
/// built, and decode the sponsor's gas choice.
///
/// Gas owned by the sender is rejected: the sponsor must pay.
pub fn verify_sponsored_transaction(
    transaction_bytes: &[u8],
    expected_kind: &[u8],
    expected_sender: &[u8; ADDRESS_SIZE],
) -> Result<TransactionData> {
    let mut reader = Reader::new(transaction_bytes);

    let tag = reader.u8()?;
    if tag != TRANSACTION_DATA_V1 {
        return Err(SuiChatError::MalformedTransaction(format!(
            "unsupported TransactionData variant {}",
            tag
        )));
    }

    let kind = reader.take(expected_kind.len())?;
    if kind != expected_kind {
        return Err(SuiChatError::TransactionMismatch(
            "transaction kind differs from the one built".to_string(),
        ));
    }

    let sender = reader.array::<ADDRESS_SIZE>()?;
    if &sender != expected_sender {
        return Err(SuiChatError::TransactionMismatch(format!(
            "sender {} does not match {}",
            format_address(&sender),
            format_address(expected_sender)
        )));
    }

    let gas_data = reader.gas_data()?;
    if &gas_data.owner == expected_sender {
        return Err(SuiChatError::TransactionMismatch(
            "gas is paid by the sender, not the sponsor".to_string(),
        ));
    }
    let expiration = reader.expiration()?;

    if !reader.is_empty() {
        return Err(SuiChatError::TransactionMismatch(format!(
            "{} unexpected trailing bytes",
            reader.remaining()
        )));
    }

    Ok(TransactionData {
        kind: kind.to_vec(),
        sender,
        gas_data,
        expiration,
    })
}

fn write_uleb128(data: &mut Vec<u8>, mut value: usize) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            data.push(byte);
            return;
        }
        data.push(byte | 0x80);
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(SuiChatError::MalformedTransaction(format!(
                "truncated at offset {}: need {} bytes, have {}",
                self.offset,
                len,
                self.remaining()
            )));
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array::<8>()?))
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn uleb128(&mut self) -> Result<usize> {
        let mut value: u64 = 0;
        for shift in (0..32).step_by(7) {
            let byte = self.u8()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return usize::try_from(value)
                    .map_err(|_| SuiChatError::MalformedTransaction("length overflow".to_string()));
            }
        }
        Err(SuiChatError::MalformedTransaction(
            "ULEB128 length too long".to_string(),
        ))
    }

    fn gas_data(&mut self) -> Result<GasData> {
        let count = self.uleb128()?;
        let mut payment = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            let object_id = self.array::<ADDRESS_SIZE>()?;
            let version = self.u64()?;
            let digest_len = self.uleb128()?;
            if digest_len != OBJECT_DIGEST_SIZE {
                return Err(SuiChatError::MalformedTransaction(format!(
                    "object digest length {}",
                    digest_len
                )));
            }
            let digest = self.array::<OBJECT_DIGEST_SIZE>()?;
            payment.push(ObjectRef {
                object_id,
                version,
                digest,
            });
        }

        Ok(GasData {
            payment,
            owner: self.array::<ADDRESS_SIZE>()?,
            price: self.u64()?,
            budget: self.u64()?,
        })
    }

    fn expiration(&mut self) -> Result<TransactionExpiration> {
        match self.uleb128()? {
            0 => Ok(TransactionExpiration::None),
            1 => Ok(TransactionExpiration::Epoch(self.u64()?)),
            other => Err(SuiChatError::MalformedTransaction(format!(
                "unsupported expiration variant {}",
                other
            ))),
        }
    }
}
