// Standard library imports
use std::time::{SystemTime, UNIX_EPOCH};

// Third party imports
use sha2::{Digest, Sha256};

// Internal imports
use crate::error::{CommonError, CommonResult};

/// Độ dài hex của một giá trị bytes32
const BYTES32_HEX_LEN: usize = 64;

/// Lấy thời gian hiện tại (giây)
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// SHA-256 hex (chữ thường) của chuỗi.
///
/// Dùng như nguồn giả ngẫu nhiên tất định cho các heuristic địa chỉ,
/// không mang ý nghĩa bảo mật.
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// Transaction id: digest của `wallet ++ amount ++ timestamp`, không có dấu phân cách.
///
/// Vì ghép chuỗi không có cấu trúc nên các input khác nhau có thể trùng id
/// (`("a1", 2.0, t)` và `("a", 12.0, t)`).
///
/// `amount` được in theo `Display` ngắn nhất của `f64`: `1000.0` thành
/// `"1000"`, không phải `"1000.0"`. Vì vậy id của số tiền nguyên khác với id
/// mà bản form Python cũ tạo ra cho cùng input.
pub fn transaction_id(wallet_address: &str, amount: f64, timestamp: i64) -> String {
    sha256_hex(&format!("{}{}{}", wallet_address, amount, timestamp))
}

/// Chuẩn hóa transaction id thành khóa bytes32 dạng `0x` + 64 ký tự hex
pub fn to_bytes32_hex(transaction_id: &str) -> String {
    let raw: String = transaction_id.chars().take(BYTES32_HEX_LEN).collect();
    format!("0x{:0<width$}", raw, width = BYTES32_HEX_LEN)
}

/// Parse khóa bytes32 (có hoặc không có tiền tố `0x`)
pub fn parse_bytes32(value: &str) -> CommonResult<[u8; 32]> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(stripped)
        .map_err(|e| CommonError::InvalidTransactionId(format!("{}: {}", value, e)))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| {
            CommonError::InvalidTransactionId(format!("expected 32 bytes, got {}", b.len()))
        })
}
