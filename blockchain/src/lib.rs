// Internal imports
pub mod abi;
pub mod ledger;
pub mod error;

// Re-export các module chính
pub use abi::{load_contract_abi, FRAUD_GUARD_ABI};
pub use ledger::*;
pub use error::{classify_blockchain_error, EnforcementError};
