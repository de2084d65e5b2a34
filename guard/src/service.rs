// Standard library imports
use std::sync::Arc;

// Third party imports
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// Internal imports
use fraudguard_blockchain::{parse_wallet_address, ChainEnforcer, EnforcementError};
use fraudguard_common::{
    utils::{current_timestamp, parse_bytes32, to_bytes32_hex},
    MockRiskScorer, RiskAnalyzer, RiskAssessment, RiskLevel, RiskScorer, TransactionInput,
};

use crate::config::{Config, DEMO_HIGH_RISK_SCORE};
use crate::error::{ServiceError, ServiceResult};
use crate::state::{FrozenWallet, SessionState, SessionStats, TransactionRecord};

pub const DEMO_REASON: &str = "Demo Mode: Simulated high-risk fraud pattern";
pub const DEFAULT_REASON: &str = "Suspicious activity detected";

/// Yêu cầu phân tích một giao dịch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub wallet_address: String,
    pub amount: f64,
    #[serde(default)]
    pub recent_count: usize,
    /// Chỉ được ghi log, bộ chấm điểm tự tính giờ từ timestamp
    #[serde(default)]
    pub suspicious_time: bool,
}

/// Kết quả phân tích trả về cho client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub assessment: RiskAssessment,
    /// Điểm cuối cùng, bị ghi đè bởi demo mode
    pub risk_score: u8,
    pub level: RiskLevel,
    pub reason: String,
    /// Khóa bytes32 dạng `0x...` dùng cho `logFraud`
    pub tx_id_hex: String,
    /// Hash giao dịch freeze nếu ví bị đóng băng
    pub tx_hash: Option<String>,
}

/// Yêu cầu cho bộ chấm điểm demo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockScoreRequest {
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default)]
    pub transaction_count: u32,
    #[serde(default)]
    pub is_suspicious_time: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    #[serde(flatten)]
    pub session: SessionStats,
    pub risk_threshold: u8,
    pub demo_high_risk: bool,
    pub enforcement_enabled: bool,
    pub contract_address: Option<String>,
}

/// Tham số vận hành của dịch vụ
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub risk_threshold: u8,
    pub demo_high_risk: bool,
    pub history_limit: usize,
    pub contract_address: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&Config::new())
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            risk_threshold: config.risk_threshold,
            demo_high_risk: config.demo_high_risk,
            history_limit: config.history_limit,
            contract_address: config.chain.as_ref().map(|c| c.contract_address.clone()),
        }
    }
}

/// Ghép bộ chấm điểm, enforcer và trạng thái phiên
pub struct FraudGuardService {
    analyzer: Arc<dyn RiskAnalyzer>,
    enforcer: Option<Arc<dyn ChainEnforcer>>,
    state: Arc<SessionState>,
    mock_scorer: Mutex<MockRiskScorer>,
    settings: ServiceSettings,
}

impl FraudGuardService {
    pub fn new(settings: ServiceSettings, enforcer: Option<Arc<dyn ChainEnforcer>>) -> Self {
        Self::with_analyzer(settings, Arc::new(RiskScorer::new()), enforcer)
    }

    pub fn with_analyzer(
        settings: ServiceSettings,
        analyzer: Arc<dyn RiskAnalyzer>,
        enforcer: Option<Arc<dyn ChainEnforcer>>,
    ) -> Self {
        Self {
            analyzer,
            enforcer,
            state: Arc::new(SessionState::new()),
            mock_scorer: Mutex::new(MockRiskScorer::from_entropy()),
            settings,
        }
    }

    /// Thay bộ chấm điểm demo (seed cố định cho test)
    pub fn with_mock_scorer(mut self, scorer: MockRiskScorer) -> Self {
        self.mock_scorer = Mutex::new(scorer);
        self
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn enforcement_enabled(&self) -> bool {
        self.enforcer.is_some()
    }

    pub fn state(&self) -> Arc<SessionState> {
        self.state.clone()
    }

    fn enforcer(&self) -> ServiceResult<&Arc<dyn ChainEnforcer>> {
        self.enforcer.as_ref().ok_or(ServiceError::EnforcementDisabled)
    }

    /// Chấm điểm giao dịch, đóng băng ví nếu vượt ngưỡng rồi ghi vào lịch sử.
    ///
    /// Freeze thất bại không làm hỏng phân tích: lỗi được log và `tx_hash`
    /// để trống.
    pub async fn analyze(&self, request: AnalyzeRequest) -> ServiceResult<AnalysisOutcome> {
        let wallet = parse_wallet_address(&request.wallet_address)
            .map_err(|_| ServiceError::InvalidAddress(request.wallet_address.clone()))?;
        // Lịch sử, map đóng băng và digest đều dùng đúng chuỗi đã parse
        let wallet_address = request.wallet_address.trim();

        debug!(
            "Phân tích ví {} amount={} recent={} suspicious_time={}",
            wallet_address, request.amount, request.recent_count, request.suspicious_time
        );

        let input = TransactionInput::new(request.amount, wallet_address)
            .with_timestamp(current_timestamp())
            .with_recent_count(request.recent_count);
        let assessment = self.analyzer.assess(&input);

        let (risk_score, reason) = if self.settings.demo_high_risk {
            (DEMO_HIGH_RISK_SCORE, DEMO_REASON)
        } else {
            (assessment.risk_score, DEFAULT_REASON)
        };
        let level = RiskLevel::classify(risk_score, self.settings.risk_threshold);

        let tx_id_hex = to_bytes32_hex(&assessment.transaction_id);
        let tx_id = parse_bytes32(&tx_id_hex).map_err(EnforcementError::from)?;

        let mut tx_hash = None;
        if risk_score >= self.settings.risk_threshold {
            match &self.enforcer {
                Some(enforcer) => match enforcer.freeze_wallet(wallet, tx_id, risk_score).await {
                    Ok(receipt) => {
                        let hash = receipt.tx_hash_hex();
                        info!(
                            "Đã đóng băng ví {} (score {}), tx {}",
                            wallet_address, risk_score, hash
                        );
                        self.state.mark_frozen(wallet_address, hash.clone()).await;
                        tx_hash = Some(hash);
                    }
                    Err(e) => {
                        error!("Không thể đóng băng ví {}: {}", wallet_address, e);
                    }
                },
                None => {
                    warn!(
                        "Ví {} vượt ngưỡng ({} >= {}) nhưng enforcement chưa được cấu hình",
                        wallet_address, risk_score, self.settings.risk_threshold
                    );
                }
            }
        }

        self.state
            .record(TransactionRecord {
                id: Uuid::new_v4(),
                wallet: wallet_address.to_string(),
                amount: request.amount,
                risk_score,
                level,
                reason: reason.to_string(),
                timestamp: Utc::now(),
                tx_hash: tx_hash.clone(),
            })
            .await;

        Ok(AnalysisOutcome {
            assessment,
            risk_score,
            level,
            reason: reason.to_string(),
            tx_id_hex,
            tx_hash,
        })
    }

    /// Trạng thái đóng băng on-chain
    pub async fn check_status(&self, wallet_address: &str) -> ServiceResult<bool> {
        let wallet = parse_wallet_address(wallet_address)
            .map_err(|_| ServiceError::InvalidAddress(wallet_address.to_string()))?;
        let frozen = self.enforcer()?.is_wallet_frozen(wallet).await?;
        debug!("Ví {} frozen={}", wallet_address, frozen);
        Ok(frozen)
    }

    /// Gỡ đóng băng, trả về hash giao dịch
    pub async fn unfreeze(&self, wallet_address: &str) -> ServiceResult<String> {
        let wallet = parse_wallet_address(wallet_address)
            .map_err(|_| ServiceError::InvalidAddress(wallet_address.to_string()))?;
        let receipt = self.enforcer()?.unfreeze_wallet(wallet).await.map_err(|e| {
            error!("Không thể gỡ đóng băng ví {}: {}", wallet_address, e);
            e
        })?;

        let hash = receipt.tx_hash_hex();
        self.state.unmark_frozen(wallet_address.trim()).await;
        info!("Đã gỡ đóng băng ví {}, tx {}", wallet_address, hash);
        Ok(hash)
    }

    pub async fn recent_transactions(&self) -> Vec<TransactionRecord> {
        self.state.recent(self.settings.history_limit).await
    }

    pub async fn frozen_wallets(&self) -> Vec<FrozenWallet> {
        self.state.frozen_wallets().await
    }

    pub async fn stats(&self) -> ServiceStats {
        ServiceStats {
            session: self.state.stats().await,
            risk_threshold: self.settings.risk_threshold,
            demo_high_risk: self.settings.demo_high_risk,
            enforcement_enabled: self.enforcement_enabled(),
            contract_address: self.settings.contract_address.clone(),
        }
    }

    /// Điểm ngẫu nhiên cho demo, không bao giờ dùng cho enforcement
    pub async fn mock_score(&self, request: &MockScoreRequest) -> u8 {
        self.mock_scorer.lock().await.score(
            request.amount,
            &request.wallet_address,
            request.transaction_count,
            request.is_suspicious_time,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

    fn request(amount: f64) -> AnalyzeRequest {
        AnalyzeRequest {
            wallet_address: WALLET.to_string(),
            amount,
            recent_count: 0,
            suspicious_time: false,
        }
    }

    #[tokio::test]
    async fn test_analyze_without_enforcer_records() {
        let service = FraudGuardService::new(ServiceSettings::default(), None);
        let outcome = service.analyze(request(500.0)).await.unwrap();

        assert_eq!(outcome.reason, DEFAULT_REASON);
        assert_eq!(outcome.risk_score, outcome.assessment.risk_score);
        assert!(outcome.tx_hash.is_none());
        assert!(outcome.tx_id_hex.starts_with("0x"));
        assert_eq!(outcome.tx_id_hex.len(), 66);
        assert_eq!(&outcome.tx_id_hex[2..], outcome.assessment.transaction_id);

        let history = service.recent_transactions().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].wallet, WALLET);
    }

    #[tokio::test]
    async fn test_analyze_records_trimmed_address() {
        let service = FraudGuardService::new(ServiceSettings::default(), None);
        let mut req = request(500.0);
        req.wallet_address = format!("  {}\n", WALLET);

        let outcome = service.analyze(req).await.unwrap();
        let history = service.recent_transactions().await;
        assert_eq!(history[0].wallet, WALLET);

        // Digest tính trên địa chỉ đã trim nên trùng với input sạch
        let clean = TransactionInput::new(500.0, WALLET);
        let expected = RiskScorer::new().breakdown(&clean, 0);
        assert_eq!(
            outcome.assessment.risk_breakdown.address_risk,
            expected.address_risk
        );
        assert_eq!(
            outcome.assessment.risk_breakdown.network_risk,
            expected.network_risk
        );
    }

    #[tokio::test]
    async fn test_demo_mode_overrides_score() {
        let settings = ServiceSettings {
            demo_high_risk: true,
            ..ServiceSettings::default()
        };
        let service = FraudGuardService::new(settings, None);
        let outcome = service.analyze(request(10.0)).await.unwrap();

        assert_eq!(outcome.risk_score, 95);
        assert_eq!(outcome.level, RiskLevel::High);
        assert_eq!(outcome.reason, DEMO_REASON);
        // Không có enforcer nên không freeze được
        assert!(outcome.tx_hash.is_none());
        assert!(service.frozen_wallets().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_address_rejected() {
        let service = FraudGuardService::new(ServiceSettings::default(), None);
        let mut req = request(100.0);
        req.wallet_address = "not-an-address".to_string();

        let err = service.analyze(req).await.unwrap_err();
        assert_eq!(err, ServiceError::InvalidAddress("not-an-address".to_string()));
        assert_eq!(service.stats().await.session.analyzed, 0);
    }

    #[tokio::test]
    async fn test_enforcement_disabled_errors() {
        let service = FraudGuardService::new(ServiceSettings::default(), None);
        assert_eq!(
            service.check_status(WALLET).await.unwrap_err(),
            ServiceError::EnforcementDisabled
        );
        assert_eq!(
            service.unfreeze(WALLET).await.unwrap_err(),
            ServiceError::EnforcementDisabled
        );
        assert!(matches!(
            service.unfreeze("0x123").await.unwrap_err(),
            ServiceError::InvalidAddress(_)
        ));
    }

    #[tokio::test]
    async fn test_mock_score_seeded() {
        let request = MockScoreRequest {
            amount: 6_000.0,
            wallet_address: String::new(),
            transaction_count: 6,
            is_suspicious_time: false,
        };
        let a = FraudGuardService::new(ServiceSettings::default(), None)
            .with_mock_scorer(MockRiskScorer::seeded(3));
        let b = FraudGuardService::new(ServiceSettings::default(), None)
            .with_mock_scorer(MockRiskScorer::seeded(3));

        let score = a.mock_score(&request).await;
        assert_eq!(score, b.mock_score(&request).await);
        assert!((45..=70).contains(&score));
        // Không ghi vào lịch sử
        assert_eq!(a.stats().await.session.analyzed, 0);
    }

    #[tokio::test]
    async fn test_stats_reports_settings() {
        let settings = ServiceSettings {
            contract_address: Some("0xcontract".to_string()),
            ..ServiceSettings::default()
        };
        let service = FraudGuardService::new(settings, None);
        let stats = service.stats().await;
        assert_eq!(stats.risk_threshold, 80);
        assert!(!stats.enforcement_enabled);
        assert_eq!(stats.contract_address.as_deref(), Some("0xcontract"));
    }
}
