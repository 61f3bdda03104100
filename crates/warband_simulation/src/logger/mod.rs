//! Logging: tracing subscriber для headless запуска и тестов
//!
//! Библиотечный код пишет только через tracing макросы (debug!/info!/warn!).
//! Подписчика ставит host (или `init_logger` для headless/тестов).

use tracing_subscriber::EnvFilter;

/// Фильтр по умолчанию если RUST_LOG не задан
pub const DEFAULT_FILTER: &str = "warband_simulation=info";

/// Устанавливает fmt subscriber с EnvFilter (RUST_LOG)
///
/// Идемпотентно: повторный вызов (тесты, binary) молча игнорируется.
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
