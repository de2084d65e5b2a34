use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use fraudguard_common::RiskLevel;

/// Một giao dịch đã được phân tích trong phiên hiện tại
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub wallet: String,
    pub amount: f64,
    pub risk_score: u8,
    pub level: RiskLevel,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    /// Hash giao dịch freeze, `None` nếu không freeze hoặc freeze thất bại
    pub tx_hash: Option<String>,
}

/// Ví đang bị đóng băng theo ghi nhận của phiên
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenWallet {
    pub wallet: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub analyzed: usize,
    pub frozen: usize,
}

#[derive(Debug, Default)]
struct Inner {
    transactions: Vec<TransactionRecord>,
    frozen: HashMap<String, String>,
}

/// Trạng thái phiên trong bộ nhớ, rỗng khi khởi động và không lưu xuống đĩa.
///
/// Khóa ví trong map đóng băng được chuẩn hóa về chữ thường để địa chỉ
/// checksum và địa chỉ thường trỏ về cùng một ví.
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<Inner>,
}

fn wallet_key(wallet: &str) -> String {
    wallet.to_lowercase()
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, record: TransactionRecord) {
        self.inner.write().await.transactions.push(record);
    }

    pub async fn mark_frozen(&self, wallet: &str, tx_hash: impl Into<String>) {
        self.inner
            .write()
            .await
            .frozen
            .insert(wallet_key(wallet), tx_hash.into());
    }

    /// Trả về `true` nếu ví có trong map trước đó
    pub async fn unmark_frozen(&self, wallet: &str) -> bool {
        self.inner
            .write()
            .await
            .frozen
            .remove(&wallet_key(wallet))
            .is_some()
    }

    pub async fn is_marked_frozen(&self, wallet: &str) -> bool {
        self.inner.read().await.frozen.contains_key(&wallet_key(wallet))
    }

    /// `limit` giao dịch gần nhất, cũ nhất trước
    pub async fn recent(&self, limit: usize) -> Vec<TransactionRecord> {
        let inner = self.inner.read().await;
        let start = inner.transactions.len().saturating_sub(limit);
        inner.transactions[start..].to_vec()
    }

    pub async fn frozen_wallets(&self) -> Vec<FrozenWallet> {
        let inner = self.inner.read().await;
        let mut wallets: Vec<FrozenWallet> = inner
            .frozen
            .iter()
            .map(|(wallet, tx_hash)| FrozenWallet {
                wallet: wallet.clone(),
                tx_hash: tx_hash.clone(),
            })
            .collect();
        wallets.sort_by(|a, b| a.wallet.cmp(&b.wallet));
        wallets
    }

    pub async fn stats(&self) -> SessionStats {
        let inner = self.inner.read().await;
        SessionStats {
            analyzed: inner.transactions.len(),
            frozen: inner.frozen.len(),
        }
    }
}
