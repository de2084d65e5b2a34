use thiserror::Error;

/// Lỗi khi tương tác với contract enforcement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnforcementError {
    #[error("Sai mạng: cần chain id {expected}, node trả về {actual}")]
    WrongChain { expected: u64, actual: u64 },

    #[error("Địa chỉ ví không hợp lệ: {0}")]
    InvalidAddress(String),

    #[error("Transaction id không hợp lệ: {0}")]
    InvalidTransactionId(String),

    #[error("Lỗi gas không đủ: {0}")]
    InsufficientGas(String),

    #[error("Lỗi kết nối blockchain: {0}")]
    Connection(String),

    #[error("Giao dịch bị revert: {0}")]
    Reverted(String),

    #[error("Không nhận được receipt sau {0} giây")]
    ReceiptTimeout(u64),

    #[error("Giao dịch {0} bị drop, không có receipt")]
    MissingReceipt(String),

    #[error("Lỗi contract: {0}")]
    Contract(String),

    #[error("Lỗi không xác định: {0}")]
    Unknown(String),
}

impl EnforcementError {
    /// Lỗi có thể do mạng chập chờn, người gọi có thể thử lại thủ công
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EnforcementError::Connection(_) | EnforcementError::ReceiptTimeout(_)
        )
    }
}

impl From<fraudguard_common::CommonError> for EnforcementError {
    fn from(err: fraudguard_common::CommonError) -> Self {
        match err {
            fraudguard_common::CommonError::InvalidTransactionId(t) => {
                EnforcementError::InvalidTransactionId(t)
            }
            other => EnforcementError::Unknown(other.to_string()),
        }
    }
}

// Phân loại lỗi từ chuỗi lỗi của provider/contract
pub fn classify_blockchain_error(error_msg: &str) -> EnforcementError {
    let error_lowercase = error_msg.to_lowercase();

    if error_lowercase.contains("gas")
        && (error_lowercase.contains("low")
            || error_lowercase.contains("insufficient")
            || error_lowercase.contains("intrinsic"))
    {
        EnforcementError::InsufficientGas(error_msg.to_string())
    } else if error_lowercase.contains("insufficient funds") {
        EnforcementError::InsufficientGas(error_msg.to_string())
    } else if error_lowercase.contains("revert") {
        EnforcementError::Reverted(error_msg.to_string())
    } else if error_lowercase.contains("checksum") || error_lowercase.contains("invalid address") {
        EnforcementError::InvalidAddress(error_msg.to_string())
    } else if error_lowercase.contains("connect")
        || error_lowercase.contains("rpc")
        || error_lowercase.contains("timeout")
        || error_lowercase.contains("timed out")
        || error_lowercase.contains("unavailable")
        || error_lowercase.contains("dns")
    {
        EnforcementError::Connection(error_msg.to_string())
    } else if error_lowercase.contains("abi") || error_lowercase.contains("decode") {
        EnforcementError::Contract(error_msg.to_string())
    } else {
        EnforcementError::Unknown(error_msg.to_string())
    }
}
