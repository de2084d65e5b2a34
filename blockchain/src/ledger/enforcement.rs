// External imports
use ethers::{
    abi::Abi,
    contract::Contract,
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, BlockNumber, H256, U256},
};

// Standard library imports
use std::{str::FromStr, sync::Arc, time::Duration};

// Third party imports
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

// Internal imports
use crate::abi::{IS_WALLET_FROZEN, LOG_FRAUD, UNFREEZE_WALLET};
use crate::ledger::address::parse_wallet_address;
use crate::ledger::transaction::{receipt_outcome, EnforcementReceipt};
use crate::error::{classify_blockchain_error, EnforcementError};

/// Chain id của QIE testnet
pub const QIE_TESTNET_CHAIN_ID: u64 = 1983;

/// Thời gian chờ receipt mặc định (giây)
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;

/// Trait thực thi freeze/unfreeze trên ledger
#[async_trait]
pub trait ChainEnforcer: Send + Sync + 'static {
    /// Ghi nhận gian lận và đóng băng ví (`logFraud`)
    async fn freeze_wallet(
        &self,
        wallet: Address,
        tx_id: [u8; 32],
        risk_score: u8,
    ) -> Result<EnforcementReceipt, EnforcementError>;

    /// Gỡ đóng băng ví (`unfreezeWallet`)
    async fn unfreeze_wallet(&self, wallet: Address)
        -> Result<EnforcementReceipt, EnforcementError>;

    /// Đọc trạng thái đóng băng (`isWalletFrozen`)
    async fn is_wallet_frozen(&self, wallet: Address) -> Result<bool, EnforcementError>;
}

/// Gas limit cho từng loại giao dịch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasSettings {
    pub freeze_gas_limit: u64,
    pub unfreeze_gas_limit: u64,
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            freeze_gas_limit: 200_000,
            unfreeze_gas_limit: 100_000,
        }
    }
}

/// Tham số kết nối ledger
#[derive(Clone)]
pub struct EnforcerParams {
    pub rpc_url: String,
    pub private_key: String,
    pub contract_address: String,
    /// Ví deployer mong đợi, chỉ dùng để cảnh báo khi khác ví ký
    pub deployer_wallet: Option<String>,
    pub chain_id: u64,
    pub gas: GasSettings,
    pub receipt_timeout: Duration,
    pub abi: Abi,
}

impl std::fmt::Debug for EnforcerParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnforcerParams")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("contract_address", &self.contract_address)
            .field("deployer_wallet", &self.deployer_wallet)
            .field("chain_id", &self.chain_id)
            .field("gas", &self.gas)
            .field("receipt_timeout", &self.receipt_timeout)
            .finish()
    }
}

/// Client ký giao dịch bằng private key của deployer
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Enforcer gọi contract FraudGuard qua một middleware ethers.
///
/// Mỗi lệnh ghi chỉ gửi một lần: lấy nonce pending, lấy gas price, build
/// giao dịch legacy, ký, broadcast rồi chờ đúng một receipt. Không retry,
/// không hàng đợi.
pub struct LedgerEnforcer<M: Middleware> {
    contract: Contract<M>,
    client: Arc<M>,
    sender: Address,
    gas: GasSettings,
    receipt_timeout: Duration,
}

impl<M: Middleware + 'static> LedgerEnforcer<M> {
    pub fn new(
        client: Arc<M>,
        contract_address: Address,
        abi: Abi,
        sender: Address,
        gas: GasSettings,
        receipt_timeout: Duration,
    ) -> Self {
        let contract = Contract::new(contract_address, abi, client.clone());
        Self {
            contract,
            client,
            sender,
            gas,
            receipt_timeout,
        }
    }

    /// Địa chỉ ví ký giao dịch
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Địa chỉ contract
    pub fn contract_address(&self) -> Address {
        self.contract.address()
    }

    async fn pending_nonce(&self) -> Result<U256, EnforcementError> {
        let nonce = self
            .client
            .get_transaction_count(self.sender, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| classify_blockchain_error(&e.to_string()))?;
        debug!("Nonce pending của {:?}: {}", self.sender, nonce);
        Ok(nonce)
    }

    async fn gas_price(&self) -> Result<U256, EnforcementError> {
        self.client
            .get_gas_price()
            .await
            .map_err(|e| classify_blockchain_error(&e.to_string()))
    }

    /// Build, ký, broadcast một lệnh ghi và chờ receipt
    async fn send_write<T>(
        &self,
        function: &str,
        args: T,
        gas_limit: u64,
    ) -> Result<EnforcementReceipt, EnforcementError>
    where
        T: ethers::abi::Tokenize,
    {
        let nonce = self.pending_nonce().await?;
        let gas_price = self.gas_price().await?;

        let call = self
            .contract
            .method::<_, ()>(function, args)
            .map_err(|e| EnforcementError::Contract(e.to_string()))?
            .legacy()
            .from(self.sender)
            .nonce(nonce)
            .gas(gas_limit)
            .gas_price(gas_price);

        let pending = call.send().await.map_err(|e| {
            let err = classify_blockchain_error(&e.to_string());
            error!("Không thể gửi giao dịch {}: {}", function, err);
            err
        })?;
        let tx_hash: H256 = *pending;
        info!("Đã broadcast {} với hash {:#x}, đang chờ receipt", function, tx_hash);

        let receipt = match timeout(self.receipt_timeout, pending).await {
            Ok(result) => result.map_err(|e| classify_blockchain_error(&e.to_string()))?,
            Err(_) => {
                warn!(
                    "Giao dịch {:#x} không được xác nhận sau {} giây",
                    tx_hash,
                    self.receipt_timeout.as_secs()
                );
                return Err(EnforcementError::ReceiptTimeout(self.receipt_timeout.as_secs()));
            }
        };

        let summary = receipt_outcome(tx_hash, receipt)?;
        info!(
            "Giao dịch {} {} đã xác nhận tại block {:?}",
            function,
            summary.tx_hash_hex(),
            summary.block_number
        );
        Ok(summary)
    }
}

impl LedgerEnforcer<SignerClient> {
    /// Kết nối RPC, kiểm tra chain id và tạo signer từ private key
    pub async fn connect(params: &EnforcerParams) -> Result<Self, EnforcementError> {
        let provider = Provider::<Http>::try_from(params.rpc_url.as_str())
            .map_err(|e| EnforcementError::Connection(format!("{}: {}", params.rpc_url, e)))?;

        let actual = provider
            .get_chainid()
            .await
            .map_err(|e| classify_blockchain_error(&e.to_string()))?
            .as_u64();
        if actual != params.chain_id {
            error!("Sai mạng! Cần chain id {}, node trả về {}", params.chain_id, actual);
            return Err(EnforcementError::WrongChain {
                expected: params.chain_id,
                actual,
            });
        }
        info!("Đã kết nối chain id {} qua {}", actual, params.rpc_url);

        let wallet = LocalWallet::from_str(params.private_key.trim_start_matches("0x"))
            .map_err(|_| EnforcementError::Unknown("private key không hợp lệ".to_string()))?
            .with_chain_id(params.chain_id);
        let sender = wallet.address();

        if let Some(deployer) = params.deployer_wallet.as_deref() {
            match parse_wallet_address(deployer) {
                Ok(expected) if expected != sender => warn!(
                    "DEPLOYER_WALLET {:?} khác ví ký {:?}, giao dịch sẽ được gửi từ ví ký",
                    expected, sender
                ),
                Ok(_) => {}
                Err(e) => warn!("DEPLOYER_WALLET bị bỏ qua: {}", e),
            }
        }

        let contract_address = parse_wallet_address(&params.contract_address)?;
        let client = Arc::new(SignerMiddleware::new(provider, wallet));

        Ok(Self::new(
            client,
            contract_address,
            params.abi.clone(),
            sender,
            params.gas,
            params.receipt_timeout,
        ))
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainEnforcer for LedgerEnforcer<M> {
    async fn freeze_wallet(
        &self,
        wallet: Address,
        tx_id: [u8; 32],
        risk_score: u8,
    ) -> Result<EnforcementReceipt, EnforcementError> {
        info!("Freeze ví {:?} với risk score {}", wallet, risk_score);
        self.send_write(
            LOG_FRAUD,
            (H256::from(tx_id), U256::from(risk_score), wallet),
            self.gas.freeze_gas_limit,
        )
        .await
    }

    async fn unfreeze_wallet(
        &self,
        wallet: Address,
    ) -> Result<EnforcementReceipt, EnforcementError> {
        info!("Unfreeze ví {:?}", wallet);
        self.send_write(UNFREEZE_WALLET, wallet, self.gas.unfreeze_gas_limit)
            .await
    }

    async fn is_wallet_frozen(&self, wallet: Address) -> Result<bool, EnforcementError> {
        let frozen = self
            .contract
            .method::<_, bool>(IS_WALLET_FROZEN, wallet)
            .map_err(|e| EnforcementError::Contract(e.to_string()))?
            .call()
            .await
            .map_err(|e| {
                let err = classify_blockchain_error(&e.to_string());
                error!("Không thể kiểm tra trạng thái ví {:?}: {}", wallet, err);
                err
            })?;
        debug!("Ví {:?} frozen = {}", wallet, frozen);
        Ok(frozen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::FRAUD_GUARD_ABI;
    use crate::ledger::transaction::TransactionStatus;
    use ethers::{
        abi::{encode, Token},
        providers::MockProvider,
        types::{Bytes, Transaction, TransactionReceipt, U64},
    };

    fn mocked_enforcer() -> (LedgerEnforcer<Provider<MockProvider>>, MockProvider) {
        mocked_enforcer_with_timeout(Duration::from_secs(5))
    }

    // Poll receipt mỗi 10ms để test ghi không phải chờ 7 giây mặc định
    fn mocked_enforcer_with_timeout(
        receipt_timeout: Duration,
    ) -> (LedgerEnforcer<Provider<MockProvider>>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        let provider = provider.interval(Duration::from_millis(10));
        let enforcer = LedgerEnforcer::new(
            Arc::new(provider),
            Address::repeat_byte(0xcc),
            FRAUD_GUARD_ABI.clone(),
            Address::repeat_byte(0xaa),
            GasSettings::default(),
            receipt_timeout,
        );
        (enforcer, mock)
    }

    fn mined_tx(hash: H256) -> Transaction {
        Transaction {
            hash,
            block_number: Some(U64::from(7u64)),
            ..Default::default()
        }
    }

    fn receipt_with_status(hash: H256, status: u64) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: hash,
            status: Some(U64::from(status)),
            block_number: Some(U64::from(7u64)),
            gas_used: Some(U256::from(48_000u64)),
            ..Default::default()
        }
    }

    /// Nạp phản hồi cho một lệnh ghi. MockProvider trả theo thứ tự LIFO nên
    /// phản hồi được đẩy ngược: receipt, tx, hash, gas price, nonce.
    fn push_write_responses(mock: &MockProvider, hash: H256, receipt: Option<TransactionReceipt>) {
        mock.push::<Option<TransactionReceipt>, _>(receipt).unwrap();
        mock.push::<Transaction, _>(mined_tx(hash)).unwrap();
        mock.push::<H256, _>(hash).unwrap();
        mock.push::<U256, _>(U256::from(1_000_000_000u64)).unwrap();
        mock.push::<U256, _>(U256::from(3u64)).unwrap();
    }

    #[test]
    fn test_gas_settings_default() {
        let gas = GasSettings::default();
        assert_eq!(gas.freeze_gas_limit, 200_000);
        assert_eq!(gas.unfreeze_gas_limit, 100_000);
    }

    #[test]
    fn test_enforcer_params_debug_redacts_key() {
        let params = EnforcerParams {
            rpc_url: "http://localhost:8545".to_string(),
            private_key: "deadbeef".to_string(),
            contract_address: format!("{:?}", Address::repeat_byte(0xcc)),
            deployer_wallet: None,
            chain_id: QIE_TESTNET_CHAIN_ID,
            gas: GasSettings::default(),
            receipt_timeout: Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
            abi: FRAUD_GUARD_ABI.clone(),
        };
        let debug = format!("{:?}", params);
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_is_wallet_frozen_true() {
        let (enforcer, mock) = mocked_enforcer();
        let output = Bytes::from(encode(&[Token::Bool(true)]));
        mock.push::<Bytes, _>(output).unwrap();

        let frozen = enforcer.is_wallet_frozen(Address::repeat_byte(0x01)).await.unwrap();
        assert!(frozen);
    }

    #[tokio::test]
    async fn test_is_wallet_frozen_false() {
        let (enforcer, mock) = mocked_enforcer();
        let output = Bytes::from(encode(&[Token::Bool(false)]));
        mock.push::<Bytes, _>(output).unwrap();

        assert!(!enforcer.is_wallet_frozen(Address::repeat_byte(0x01)).await.unwrap());
    }

    #[tokio::test]
    async fn test_freeze_wallet_confirmed() {
        let (enforcer, mock) = mocked_enforcer();
        let hash = H256::repeat_byte(0x42);
        push_write_responses(&mock, hash, Some(receipt_with_status(hash, 1)));

        let receipt = enforcer
            .freeze_wallet(Address::repeat_byte(0x01), [0x11; 32], 95)
            .await
            .unwrap();

        assert_eq!(receipt.tx_hash, hash);
        assert_eq!(receipt.status, TransactionStatus::Confirmed);
        assert_eq!(receipt.block_number, Some(U64::from(7u64)));
        assert_eq!(receipt.gas_used, Some(U256::from(48_000u64)));

        // Nonce lấy từ block pending của ví ký, rồi tới gas price
        mock.assert_request(
            "eth_getTransactionCount",
            [
                serde_json::to_value(Address::repeat_byte(0xaa)).unwrap(),
                serde_json::json!("pending"),
            ],
        )
        .unwrap();
        mock.assert_request("eth_gasPrice", ()).unwrap();
    }

    #[tokio::test]
    async fn test_unfreeze_wallet_reverted() {
        let (enforcer, mock) = mocked_enforcer();
        let hash = H256::repeat_byte(0x43);
        push_write_responses(&mock, hash, Some(receipt_with_status(hash, 0)));

        let err = enforcer
            .unfreeze_wallet(Address::repeat_byte(0x01))
            .await
            .unwrap_err();
        assert!(matches!(err, EnforcementError::Reverted(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_freeze_wallet_receipt_timeout() {
        let (enforcer, mock) = mocked_enforcer_with_timeout(Duration::from_millis(100));
        let hash = H256::repeat_byte(0x44);
        // Receipt chưa có, các lần poll sau không còn phản hồi nên cứ chờ tiếp
        push_write_responses(&mock, hash, None);

        let err = enforcer
            .freeze_wallet(Address::repeat_byte(0x01), [0x22; 32], 90)
            .await
            .unwrap_err();
        assert!(matches!(err, EnforcementError::ReceiptTimeout(_)), "got {:?}", err);
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_nonce_failure_stops_before_broadcast() {
        // Không nạp phản hồi nào: eth_getTransactionCount lỗi
        let (enforcer, mock) = mocked_enforcer();

        assert!(enforcer
            .unfreeze_wallet(Address::repeat_byte(0x01))
            .await
            .is_err());

        mock.assert_request(
            "eth_getTransactionCount",
            [
                serde_json::to_value(Address::repeat_byte(0xaa)).unwrap(),
                serde_json::json!("pending"),
            ],
        )
        .unwrap();
        // Không có eth_gasPrice hay eth_sendTransaction nào được gửi
        assert!(mock.assert_request("eth_gasPrice", ()).is_err());
    }

    #[tokio::test]
    async fn test_accessors() {
        let (enforcer, _mock) = mocked_enforcer();
        assert_eq!(enforcer.sender(), Address::repeat_byte(0xaa));
        assert_eq!(enforcer.contract_address(), Address::repeat_byte(0xcc));
    }

    #[tokio::test]
    #[ignore] // Bỏ qua trong CI vì cần kết nối internet
    async fn test_connect_rejects_wrong_chain() {
        let params = EnforcerParams {
            rpc_url: "https://rpc.sepolia.org".to_string(),
            private_key: "0x0123456789012345678901234567890123456789012345678901234567890123"
                .to_string(),
            contract_address: format!("{:?}", Address::repeat_byte(0xcc)),
            deployer_wallet: None,
            chain_id: QIE_TESTNET_CHAIN_ID,
            gas: GasSettings::default(),
            receipt_timeout: Duration::from_secs(30),
            abi: FRAUD_GUARD_ABI.clone(),
        };
        let err = LedgerEnforcer::connect(&params)
            .await
            .err()
            .expect("Sepolia không phải chain 1983");
        assert!(matches!(err, EnforcementError::WrongChain { expected: 1983, .. }));
    }
}
