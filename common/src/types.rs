use serde::{Deserialize, Serialize};

/// Ngưỡng dưới của mức rủi ro trung bình
pub const MEDIUM_RISK_FLOOR: u8 = 50;

/// Dữ liệu giao dịch đầu vào cho bộ chấm điểm.
///
/// Mọi trường đều có giá trị mặc định, nên `{}` là một input hợp lệ.
/// Các trường lạ (ví dụ `suspicious_time` từ form cũ) bị bỏ qua.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionInput {
    /// Số tiền giao dịch
    pub amount: f64,
    /// Địa chỉ ví, không kiểm tra định dạng
    pub wallet_address: String,
    /// Unix timestamp (giây), `None` nghĩa là "bây giờ"
    pub timestamp: Option<i64>,
    /// Các giao dịch gần đây, chỉ độ dài là có ý nghĩa
    pub recent_transactions: Vec<serde_json::Value>,
}

impl TransactionInput {
    pub fn new(amount: f64, wallet_address: impl Into<String>) -> Self {
        Self {
            amount,
            wallet_address: wallet_address.into(),
            ..Default::default()
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Tạo `count` marker giả cho lịch sử giao dịch gần đây
    pub fn with_recent_count(mut self, count: usize) -> Self {
        self.recent_transactions = (0..count).map(serde_json::Value::from).collect();
        self
    }
}

/// Điểm thành phần của từng yếu tố rủi ro, mỗi giá trị trong [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub amount_risk: f64,
    pub frequency_risk: f64,
    pub time_risk: f64,
    pub address_risk: f64,
    pub network_risk: f64,
}

/// Kết quả chấm điểm một giao dịch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// SHA-256 hex của `wallet ++ amount ++ timestamp`
    pub transaction_id: String,
    /// Điểm rủi ro 0-100
    pub risk_score: u8,
    /// `risk_score >= FRAUD_THRESHOLD`
    pub is_fraud: bool,
    /// `risk_score / 100`
    pub confidence: f64,
    pub risk_breakdown: RiskBreakdown,
}

/// Mức độ rủi ro hiển thị
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Phân loại điểm theo ngưỡng cấu hình: High từ `threshold`, Medium từ 50
    pub fn classify(risk_score: u8, threshold: u8) -> Self {
        if risk_score >= threshold {
            RiskLevel::High
        } else if risk_score >= MEDIUM_RISK_FLOOR {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        f.write_str(label)
    }
}

/// Module tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_input_defaults_from_empty_json() {
        let input: TransactionInput = serde_json::from_str("{}").unwrap();
        assert_eq!(input.amount, 0.0);
        assert_eq!(input.wallet_address, "");
        assert!(input.timestamp.is_none());
        assert!(input.recent_transactions.is_empty());
    }

    #[test]
    fn test_transaction_input_ignores_unknown_fields() {
        let input: TransactionInput = serde_json::from_str(
            r#"{"amount": 7500, "wallet_address": "0xabc", "timestamp": 1700000000,
                "recent_transactions": [1, 2, 3], "suspicious_time": true}"#,
        )
        .unwrap();
        assert_eq!(input.amount, 7500.0);
        assert_eq!(input.timestamp, Some(1_700_000_000));
        assert_eq!(input.recent_transactions.len(), 3);
    }

    #[test]
    fn test_with_recent_count() {
        let input = TransactionInput::new(10.0, "0xabc").with_recent_count(4);
        assert_eq!(input.recent_transactions.len(), 4);
    }

    #[test]
    fn test_risk_level_classify() {
        assert_eq!(RiskLevel::classify(95, 80), RiskLevel::High);
        assert_eq!(RiskLevel::classify(80, 80), RiskLevel::High);
        assert_eq!(RiskLevel::classify(79, 80), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify(50, 80), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify(49, 80), RiskLevel::Low);
        // Ngưỡng thấp hơn 50 thì High thắng
        assert_eq!(RiskLevel::classify(40, 30), RiskLevel::High);
    }

    #[test]
    fn test_breakdown_serializes_five_keys() {
        let breakdown = RiskBreakdown {
            amount_risk: 0.7,
            frequency_risk: 0.7,
            time_risk: 0.2,
            address_risk: 0.2,
            network_risk: 0.3,
        };
        let value = serde_json::to_value(breakdown).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), 5);
        for key in ["amount_risk", "frequency_risk", "time_risk", "address_risk", "network_risk"] {
            assert!(map.contains_key(key), "missing {}", key);
        }
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"MEDIUM\"");
    }
}
