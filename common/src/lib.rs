pub mod error;
pub mod logger;
pub mod mock_scorer;
pub mod risk_analyzer;
pub mod types;
pub mod utils;

// Re-exports
pub use error::{CommonError, CommonResult};
pub use logger::{init_logging, LogConfig};
pub use mock_scorer::MockRiskScorer;
pub use risk_analyzer::{RiskAnalyzer, RiskScorer, RiskWeights, FRAUD_THRESHOLD};
pub use types::{RiskAssessment, RiskBreakdown, RiskLevel, TransactionInput};
