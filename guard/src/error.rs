use thiserror::Error;

use fraudguard_blockchain::EnforcementError;

/// Lỗi của tầng dịch vụ
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Địa chỉ ví không hợp lệ: {0}")]
    InvalidAddress(String),

    #[error("Lỗi enforcement: {0}")]
    Enforcement(#[from] EnforcementError),

    #[error("Enforcement chưa được cấu hình")]
    EnforcementDisabled,
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
