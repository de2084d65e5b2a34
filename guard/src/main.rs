use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use fraudguard::api;
use fraudguard::config::Config;
use fraudguard::service::{FraudGuardService, ServiceSettings};
use fraudguard_blockchain::{load_contract_abi, ChainEnforcer, LedgerEnforcer};
use fraudguard_common::init_logging;

/// Kết nối enforcer nếu cấu hình chain đầy đủ
async fn connect_enforcer(config: &Config) -> Result<Option<Arc<dyn ChainEnforcer>>> {
    let chain = match &config.chain {
        Some(chain) => chain,
        None => {
            warn!(
                "Thiếu QIE_RPC_URL, QIE_PRIVATE_KEY hoặc CONTRACT_ADDRESS: \
                 tắt enforcement, chỉ chấm điểm"
            );
            return Ok(None);
        }
    };

    let abi = load_contract_abi(chain.contract_abi_path.as_deref())?;
    let enforcer = LedgerEnforcer::connect(&chain.enforcer_params(abi))
        .await
        .with_context(|| format!("Không thể kết nối ledger tại {}", chain.rpc_url))?;

    info!(
        "Đã kết nối chain {} với ví {:#x}, contract {:#x}",
        chain.chain_id,
        enforcer.sender(),
        enforcer.contract_address()
    );
    let enforcer: Arc<dyn ChainEnforcer> = Arc::new(enforcer);
    Ok(Some(enforcer))
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Nhận tín hiệu dừng, đang tắt server..."),
        Err(e) => error!("Không thể lắng nghe tín hiệu dừng: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Tải cấu hình trước để biết thư mục log.
    // Biến thiếu lấy giá trị mặc định, biến sai định dạng thì dừng.
    let config = Config::from_env().context("Cấu hình môi trường không hợp lệ")?;

    let _guard = init_logging(&config.log_config())?;

    info!("Khởi động FraudGuard...");

    // Sai chain id thì dừng hẳn
    let enforcer = connect_enforcer(&config).await?;

    let service = Arc::new(FraudGuardService::new(ServiceSettings::from(&config), enforcer));
    info!(
        "Ngưỡng freeze {}, demo high-risk {}",
        config.risk_threshold, config.demo_high_risk
    );

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Địa chỉ API không hợp lệ: {}", config.bind_address()))?;

    api::serve(service, addr, shutdown_signal()).await?;

    info!("FraudGuard đã dừng");
    Ok(())
}
