// Standard library imports
use std::path::PathBuf;

// Third party imports
use anyhow::{Context, Result};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

/// Cấu hình logger
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Thư mục chứa file log
    pub log_dir: PathBuf,
    /// Tên file log (xoay vòng theo ngày)
    pub file_name: String,
    /// Mức log mặc định khi không có `RUST_LOG`
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            file_name: "fraudguard.log".to_string(),
            default_level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Filter từ `RUST_LOG`, fallback về mức mặc định
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_level))
    }
}

/// Thiết lập tracing: stderr có màu và file log xoay vòng hằng ngày.
///
/// Guard trả về phải được giữ sống đến khi tiến trình kết thúc, nếu không
/// log trong file sẽ bị mất.
pub fn init_logging(config: &LogConfig) -> Result<WorkerGuard> {
    if !config.log_dir.exists() {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Không thể tạo thư mục log: {}", config.log_dir.display())
        })?;
    }

    let file_appender =
        RollingFileAppender::new(Rotation::DAILY, &config.log_dir, &config.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(
            fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(
            fmt::Layer::new()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE),
        )
        .try_init()
        .context("Logger đã được khởi tạo")?;

    Ok(guard)
}
