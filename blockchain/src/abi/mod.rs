// Standard library imports
use std::{fs, path::Path};

// Third party imports
use anyhow::{Context, Result};
use ethers::abi::{parse_abi, Abi};
use once_cell::sync::Lazy;
use tracing::{debug, info};

/// Tên các hàm của contract FraudGuard
pub const LOG_FRAUD: &str = "logFraud";
pub const UNFREEZE_WALLET: &str = "unfreezeWallet";
pub const IS_WALLET_FROZEN: &str = "isWalletFrozen";

/// ABI mặc định của contract FraudGuard (human-readable)
pub static FRAUD_GUARD_ABI: Lazy<Abi> = Lazy::new(|| {
    parse_abi(&[
        "function logFraud(bytes32 txId, uint256 riskScore, address wallet)",
        "function unfreezeWallet(address wallet)",
        "function isWalletFrozen(address wallet) view returns (bool)",
    ])
    .expect("ABI FraudGuard hợp lệ")
});

// Hàm tiện ích để đọc ABI từ file
pub fn read_abi_from_file(file_path: &Path) -> Result<Abi> {
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Không thể đọc file ABI: {}", file_path.display()))?;
    let abi = serde_json::from_str(&content)
        .with_context(|| format!("Không thể parse ABI từ file {}", file_path.display()))?;
    Ok(abi)
}

/// ABI từ file nếu được cấu hình và tồn tại, nếu không dùng ABI mặc định
pub fn load_contract_abi(path: Option<&Path>) -> Result<Abi> {
    match path {
        Some(path) if path.exists() => {
            let abi = read_abi_from_file(path)?;
            ensure_fraud_guard_functions(&abi)?;
            info!("Đã load ABI contract từ {}", path.display());
            Ok(abi)
        }
        Some(path) => {
            debug!("Không tìm thấy {}, dùng ABI mặc định", path.display());
            Ok(FRAUD_GUARD_ABI.clone())
        }
        None => Ok(FRAUD_GUARD_ABI.clone()),
    }
}

/// Kiểm tra ABI có đủ các hàm enforcement cần dùng
pub fn ensure_fraud_guard_functions(abi: &Abi) -> Result<()> {
    for name in [LOG_FRAUD, UNFREEZE_WALLET, IS_WALLET_FROZEN] {
        abi.function(name)
            .with_context(|| format!("ABI thiếu hàm {}", name))?;
    }
    Ok(())
}
