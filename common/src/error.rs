// Third party imports
use thiserror::Error;

/// Lỗi chung
#[derive(Debug, Error)]
pub enum CommonError {
    /// Transaction id không đúng 32 byte hex
    #[error("Invalid transaction id: {0}")]
    InvalidTransactionId(String),
    /// Lỗi cấu hình
    #[error("Config error: {0}")]
    Config(String),
}

/// Kiểu kết quả chung
pub type CommonResult<T> = Result<T, CommonError>;
