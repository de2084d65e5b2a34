//! Bộ chấm điểm ngẫu nhiên chỉ dùng cho demo.
//!
//! Kết quả phụ thuộc nguồn ngẫu nhiên nên không dùng cho định danh, audit
//! hay bất kỳ quyết định enforcement nào. Tách biệt hoàn toàn khỏi
//! [`RiskScorer`](crate::risk_analyzer::RiskScorer).

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Nhiễu cộng thêm vào điểm, bao gồm hai đầu
pub const NOISE_RANGE: std::ops::RangeInclusive<i32> = -10..=15;

/// Điểm cơ sở trước khi cộng nhiễu
pub fn base_mock_score(
    amount: f64,
    wallet_address: &str,
    transaction_count: u32,
    is_suspicious_time: bool,
) -> i32 {
    let mut base = 0;

    base += if amount > 10_000.0 {
        40
    } else if amount > 5_000.0 {
        30
    } else if amount > 1_000.0 {
        15
    } else {
        5
    };

    base += if transaction_count > 10 {
        35
    } else if transaction_count > 5 {
        25
    } else if transaction_count > 2 {
        15
    } else {
        5
    };

    if is_suspicious_time {
        base += 20;
    }

    if !wallet_address.is_empty() {
        let code_sum: u32 = wallet_address.chars().take(5).map(u32::from).sum();
        base += (code_sum % 30) as i32;
    }

    base
}

/// Mock scorer sở hữu nguồn ngẫu nhiên riêng
#[derive(Debug, Clone)]
pub struct MockRiskScorer<R: Rng = StdRng> {
    rng: R,
}

impl MockRiskScorer<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Seed cố định, dùng cho test
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MockRiskScorer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Điểm demo 0-100, có nhiễu
    pub fn score(
        &mut self,
        amount: f64,
        wallet_address: &str,
        transaction_count: u32,
        is_suspicious_time: bool,
    ) -> u8 {
        let base = base_mock_score(amount, wallet_address, transaction_count, is_suspicious_time);
        let noise = self.rng.gen_range(NOISE_RANGE);
        (base + noise).clamp(0, 100) as u8
    }
}
