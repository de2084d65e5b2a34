// External imports
use ethers::core::types::{TransactionReceipt, H256, U256, U64};

// Third party imports
use serde::{Deserialize, Serialize};

// Internal imports
use crate::error::EnforcementError;

/// Trạng thái giao dịch enforcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Đã xác nhận (status = 1)
    Confirmed,
    /// Đã mine nhưng thất bại (status = 0)
    Failed,
}

/// Tóm tắt receipt của một giao dịch freeze/unfreeze
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementReceipt {
    /// Hash giao dịch
    pub tx_hash: H256,
    /// Trạng thái
    pub status: TransactionStatus,
    /// Gas đã sử dụng
    pub gas_used: Option<U256>,
    /// Block chứa giao dịch
    pub block_number: Option<U64>,
}

impl EnforcementReceipt {
    /// Tạo từ receipt của node
    pub fn from_receipt(receipt: &TransactionReceipt) -> Self {
        let status = match receipt.status {
            Some(status) if status.as_u64() == 0 => TransactionStatus::Failed,
            _ => TransactionStatus::Confirmed,
        };
        Self {
            tx_hash: receipt.transaction_hash,
            status,
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
        }
    }

    /// Kiểm tra giao dịch đã thành công
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Confirmed
    }

    /// Hash dạng `0x...` để hiển thị
    pub fn tx_hash_hex(&self) -> String {
        format!("{:#x}", self.tx_hash)
    }
}

/// Kết quả chờ receipt: `None` nghĩa là giao dịch bị drop khỏi mempool
pub fn receipt_outcome(
    tx_hash: H256,
    receipt: Option<TransactionReceipt>,
) -> Result<EnforcementReceipt, EnforcementError> {
    let receipt =
        receipt.ok_or_else(|| EnforcementError::MissingReceipt(format!("{:#x}", tx_hash)))?;
    let summary = EnforcementReceipt::from_receipt(&receipt);
    if summary.is_success() {
        Ok(summary)
    } else {
        Err(EnforcementError::Reverted(format!(
            "giao dịch {} có status 0",
            summary.tx_hash_hex()
        )))
    }
}
