// Internal imports
pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod state;

// Re-export các module chính
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use service::{AnalysisOutcome, AnalyzeRequest, FraudGuardService, ServiceSettings};
pub use state::{SessionState, TransactionRecord};
