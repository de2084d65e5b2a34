// External imports
use ethers::{types::Address, utils::to_checksum};

// Standard library imports
use std::str::FromStr;

// Internal imports
use crate::error::EnforcementError;

/// Parse địa chỉ ví EVM.
///
/// Chấp nhận `0x` + 40 ký tự hex. Địa chỉ viết hoa/thường lẫn lộn phải đúng
/// checksum EIP-55; địa chỉ toàn chữ thường hoặc toàn chữ hoa được chấp nhận.
pub fn parse_wallet_address(value: &str) -> Result<Address, EnforcementError> {
    let value = value.trim();
    let body = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| EnforcementError::InvalidAddress(value.to_string()))?;

    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EnforcementError::InvalidAddress(value.to_string()));
    }

    let address = Address::from_str(body)
        .map_err(|_| EnforcementError::InvalidAddress(value.to_string()))?;

    let is_mixed_case = body.chars().any(|c| c.is_ascii_lowercase())
        && body.chars().any(|c| c.is_ascii_uppercase());
    if is_mixed_case && to_checksum(&address, None)[2..] != *body {
        return Err(EnforcementError::InvalidAddress(format!(
            "{} (sai checksum EIP-55)",
            value
        )));
    }

    Ok(address)
}

/// Kiểm tra nhanh địa chỉ có hợp lệ không
pub fn is_valid_address(value: &str) -> bool {
    parse_wallet_address(value).is_ok()
}
