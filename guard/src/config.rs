use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenv::dotenv;
use zeroize::Zeroize;

use fraudguard_blockchain::{
    EnforcerParams, GasSettings, DEFAULT_RECEIPT_TIMEOUT_SECS, QIE_TESTNET_CHAIN_ID,
};
use fraudguard_common::{CommonError, LogConfig, FRAUD_THRESHOLD};

/// Điểm giả lập khi bật demo high-risk mode
pub const DEMO_HIGH_RISK_SCORE: u8 = 95;

/// Private key của deployer, xóa khỏi bộ nhớ khi drop
#[derive(Clone)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        // Xóa dữ liệu nhạy cảm khi đối tượng bị hủy
        self.0.zeroize();
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Cấu hình kết nối chain, chỉ có khi đủ RPC URL, private key và địa chỉ contract
#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub rpc_url: String,
    pub private_key: PrivateKey,
    pub contract_address: String,
    pub deployer_wallet: Option<String>,
    pub chain_id: u64,
    pub gas: GasSettings,
    pub receipt_timeout: Duration,
    pub contract_abi_path: Option<PathBuf>,
}

impl ChainSettings {
    /// Tham số cho enforcer, kèm ABI đã load
    pub fn enforcer_params(&self, abi: ethers::abi::Abi) -> EnforcerParams {
        EnforcerParams {
            rpc_url: self.rpc_url.clone(),
            private_key: self.private_key.expose().to_string(),
            contract_address: self.contract_address.clone(),
            deployer_wallet: self.deployer_wallet.clone(),
            chain_id: self.chain_id,
            gas: self.gas,
            receipt_timeout: self.receipt_timeout,
            abi,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Blockchain, None nghĩa là tắt enforcement
    pub chain: Option<ChainSettings>,

    // Ngưỡng freeze, độc lập với FRAUD_THRESHOLD của scorer
    pub risk_threshold: u8,
    pub demo_high_risk: bool,

    // API
    pub api_host: String,
    pub api_port: u16,

    // Số giao dịch hiển thị trong lịch sử
    pub history_limit: usize,

    // Logging
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            chain: None,
            risk_threshold: FRAUD_THRESHOLD,
            demo_high_risk: false,
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            history_limit: 5,
            log_dir: PathBuf::from("logs"),
            log_level: "info".to_string(),
        }
    }

    /// Đọc `.env` rồi biến môi trường
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Dựng cấu hình từ một hàm tra cứu biến (dễ test hơn `env::var`)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::new();

        let chain = match (get("QIE_RPC_URL"), get("QIE_PRIVATE_KEY"), get("CONTRACT_ADDRESS")) {
            (Some(rpc_url), Some(private_key), Some(contract_address)) => Some(ChainSettings {
                rpc_url,
                private_key: PrivateKey::new(private_key),
                contract_address,
                deployer_wallet: get("DEPLOYER_WALLET"),
                chain_id: parse_or(&get, "CHAIN_ID", QIE_TESTNET_CHAIN_ID)?,
                gas: GasSettings {
                    freeze_gas_limit: parse_or(
                        &get,
                        "FREEZE_GAS_LIMIT",
                        GasSettings::default().freeze_gas_limit,
                    )?,
                    unfreeze_gas_limit: parse_or(
                        &get,
                        "UNFREEZE_GAS_LIMIT",
                        GasSettings::default().unfreeze_gas_limit,
                    )?,
                },
                receipt_timeout: Duration::from_secs(parse_or(
                    &get,
                    "RECEIPT_TIMEOUT_SECS",
                    DEFAULT_RECEIPT_TIMEOUT_SECS,
                )?),
                contract_abi_path: Some(PathBuf::from(
                    get("CONTRACT_ABI_PATH").unwrap_or_else(|| "contract_abi.json".to_string()),
                )),
            }),
            _ => None,
        };

        let risk_threshold: u8 = parse_or(&get, "RISK_THRESHOLD", defaults.risk_threshold)?;

        Ok(Config {
            chain,
            // Giống slider cũ: 1..=100
            risk_threshold: risk_threshold.clamp(1, 100),
            demo_high_risk: get("DEMO_HIGH_RISK")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(defaults.demo_high_risk),
            api_host: get("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_or(&get, "API_PORT", defaults.api_port)?,
            history_limit: parse_or(&get, "HISTORY_LIMIT", defaults.history_limit)?,
            log_dir: get("LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    pub fn enforcement_enabled(&self) -> bool {
        self.chain.is_some()
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.log_dir.clone(),
            default_level: self.log_level.clone(),
            ..LogConfig::default()
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| CommonError::Config(format!("{}={}: {}", key, raw, e)))
            .with_context(|| format!("Biến môi trường {} không hợp lệ", key)),
        None => Ok(default),
    }
}
