//! Order notifications - best-effort relay of accepted orders to a chat sink
//!
//! - **Sink** (`sink`) - `OrderNotifier` trait, no-op sink, error type
//! - **Message** (`message`) - human-readable order summary (Telegram Markdown)
//! - **Telegram** (`telegram`) - Bot API `sendMessage` webhook client
//!
//! # Configuration
//!
//! Set `INTAKE_TELEGRAM_BOT_TOKEN` and `INTAKE_TELEGRAM_CHAT_ID` to enable
//! delivery. With neither set, `from_config` returns the no-op sink.
//!
//! ```text
//! accepted Order → render_order_summary → TelegramNotifier → POST /bot<token>/sendMessage
//! ```

use std::sync::Arc;

use intake_core::config::NotifierConfig;

pub mod message;
pub mod sink;
pub mod telegram;

pub use message::render_order_summary;
pub use sink::{NoopNotifier, NotifyError, OrderNotifier};
pub use telegram::TelegramNotifier;

/// Picks the sink for the configured target.
pub fn from_config(config: &NotifierConfig) -> Result<Arc<dyn OrderNotifier>, NotifyError> {
    match TelegramNotifier::from_config(config)? {
        Some(telegram) => Ok(Arc::new(telegram)),
        None => Ok(Arc::new(NoopNotifier)),
    }
}
