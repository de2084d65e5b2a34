// Third party imports
use serde::{Deserialize, Serialize};
use tracing::debug;

// Internal imports
use crate::types::{RiskAssessment, RiskBreakdown, TransactionInput};
use crate::utils::{current_timestamp, sha256_hex, transaction_id};

/// Ngưỡng cố định để gắn cờ `is_fraud`, độc lập với ngưỡng enforcement
pub const FRAUD_THRESHOLD: u8 = 80;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;

/// Số ký tự hex khác nhau tối thiểu để digest không bị coi là "entropy thấp"
const MIN_DIGEST_ENTROPY: usize = 10;

/// Risk analyzer trait
pub trait RiskAnalyzer: Send + Sync + 'static {
    /// Chấm điểm rủi ro một giao dịch
    fn assess(&self, input: &TransactionInput) -> RiskAssessment;
}

/// Bảng trọng số của năm yếu tố rủi ro
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    pub amount_anomaly: f64,
    pub frequency_anomaly: f64,
    pub time_anomaly: f64,
    pub address_reputation: f64,
    pub network_risk: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            amount_anomaly: 0.30,
            frequency_anomaly: 0.25,
            time_anomaly: 0.20,
            address_reputation: 0.15,
            network_risk: 0.10,
        }
    }
}

impl RiskWeights {
    /// Tổng trọng số
    pub fn total(&self) -> f64 {
        self.amount_anomaly
            + self.frequency_anomaly
            + self.time_anomaly
            + self.address_reputation
            + self.network_risk
    }

    /// Tổng có trọng số của các điểm thành phần
    pub fn weighted_sum(&self, breakdown: &RiskBreakdown) -> f64 {
        breakdown.amount_risk * self.amount_anomaly
            + breakdown.frequency_risk * self.frequency_anomaly
            + breakdown.time_risk * self.time_anomaly
            + breakdown.address_risk * self.address_reputation
            + breakdown.network_risk * self.network_risk
    }
}

/// Rủi ro theo số tiền
pub fn amount_risk(amount: f64) -> f64 {
    if amount > 10_000.0 {
        0.9
    } else if amount > 5_000.0 {
        0.7
    } else if amount > 1_000.0 {
        0.4
    } else {
        0.1
    }
}

/// Rủi ro theo số giao dịch gần đây
pub fn frequency_risk(recent_count: usize) -> f64 {
    if recent_count > 10 {
        0.9
    } else if recent_count > 5 {
        0.7
    } else if recent_count > 2 {
        0.4
    } else {
        0.1
    }
}

/// Giờ trong ngày (0-23) của timestamp, không chuẩn hóa múi giờ
pub fn hour_of_day(timestamp: i64) -> i64 {
    timestamp.rem_euclid(SECONDS_PER_DAY) / SECONDS_PER_HOUR
}

/// Rủi ro theo giờ: 2h-5h sáng (bao gồm hai đầu) là bất thường
pub fn time_risk(timestamp: i64) -> f64 {
    if (2..=5).contains(&hour_of_day(timestamp)) {
        0.7
    } else {
        0.2
    }
}

/// Giả lập "uy tín" địa chỉ từ digest của chuỗi địa chỉ.
///
/// Placeholder cho việc tra cứu lịch sử gian lận thật: chỉ phụ thuộc vào
/// chuỗi địa chỉ, không có nguồn dữ liệu ngoài.
pub fn address_risk(address: &str) -> f64 {
    digest_address_risk(&sha256_hex(address))
}

/// Giả lập rủi ro mạng: digest ít ký tự khác nhau thì đáng ngờ
pub fn network_risk(address: &str) -> f64 {
    digest_network_risk(&sha256_hex(address))
}

fn digest_address_risk(digest: &str) -> f64 {
    if ["00", "ff", "aa"].iter().any(|p| digest.starts_with(p)) {
        0.8
    } else if ["0", "1", "2"].iter().any(|p| digest.starts_with(p)) {
        0.5
    } else {
        0.2
    }
}

fn digest_network_risk(digest: &str) -> f64 {
    let mut seen = [false; 16];
    for c in digest.chars() {
        if let Some(d) = c.to_digit(16) {
            seen[d as usize] = true;
        }
    }
    if seen.iter().filter(|s| **s).count() < MIN_DIGEST_ENTROPY {
        0.6
    } else {
        0.3
    }
}

/// Bộ chấm điểm rủi ro tất định dựa trên luật
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    weights: RiskWeights,
}

impl RiskScorer {
    /// Tạo scorer với bảng trọng số mặc định
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: RiskWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RiskWeights {
        &self.weights
    }

    /// Tính các điểm thành phần cho một timestamp đã xác định
    pub fn breakdown(&self, input: &TransactionInput, timestamp: i64) -> RiskBreakdown {
        let digest = sha256_hex(&input.wallet_address);
        RiskBreakdown {
            amount_risk: amount_risk(input.amount),
            frequency_risk: frequency_risk(input.recent_transactions.len()),
            time_risk: time_risk(timestamp),
            address_risk: digest_address_risk(&digest),
            network_risk: digest_network_risk(&digest),
        }
    }

    /// Điểm rủi ro 0-100, dùng đồng hồ hệ thống khi thiếu timestamp
    pub fn calculate_risk_score(&self, input: &TransactionInput) -> u8 {
        let timestamp = input.timestamp.unwrap_or_else(current_timestamp);
        self.risk_score_from(&self.breakdown(input, timestamp))
    }

    /// Chấm điểm đầy đủ, dùng đồng hồ hệ thống khi thiếu timestamp
    pub fn score(&self, input: &TransactionInput) -> RiskAssessment {
        self.score_at(input, current_timestamp())
    }

    /// Chấm điểm với `now` làm timestamp mặc định.
    ///
    /// Timestamp được xác định một lần và dùng chung cho yếu tố thời gian
    /// và transaction id.
    pub fn score_at(&self, input: &TransactionInput, now: i64) -> RiskAssessment {
        let timestamp = input.timestamp.unwrap_or(now);
        let breakdown = self.breakdown(input, timestamp);
        let risk_score = self.risk_score_from(&breakdown);

        debug!(
            wallet = %input.wallet_address,
            risk_score,
            ?breakdown,
            "Đã chấm điểm giao dịch"
        );

        RiskAssessment {
            transaction_id: transaction_id(&input.wallet_address, input.amount, timestamp),
            risk_score,
            is_fraud: risk_score >= FRAUD_THRESHOLD,
            confidence: (f64::from(risk_score) / 100.0).min(1.0),
            risk_breakdown: breakdown,
        }
    }

    fn risk_score_from(&self, breakdown: &RiskBreakdown) -> u8 {
        let total = self.weights.weighted_sum(breakdown);
        (total * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

impl RiskAnalyzer for RiskScorer {
    fn assess(&self, input: &TransactionInput) -> RiskAssessment {
        self.score(input)
    }
}
