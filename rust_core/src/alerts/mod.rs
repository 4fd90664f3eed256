//! Alert decisions and delivery

pub mod evaluator;

use async_trait::async_trait;

use crate::error::NotifyError;

pub use evaluator::{decide, trigger, Trigger};

/// Delivers an alert message to a recipient (e-mail, chat, ...)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, body: &str, subject: &str, recipient: &str) -> Result<(), NotifyError>;
}
