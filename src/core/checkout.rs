use crate::config::toml_config::PaymentConfig;
use crate::core::cart::Cart;
use crate::domain::model::{OrderReceipt, ReceiptLine};
use crate::utils::error::{PharmacyError, Result};
use std::time::Duration;

/// Simulated payment: waits a moment, then issues a receipt. No money moves.
#[derive(Debug, Clone)]
pub struct PaymentProcessor {
    delay: Duration,
    currency: String,
}

impl PaymentProcessor {
    pub fn new(delay: Duration, currency: impl Into<String>) -> Self {
        Self {
            delay,
            currency: currency.into(),
        }
    }

    pub fn from_config(config: &PaymentConfig) -> Self {
        Self::new(
            Duration::from_millis(config.simulated_delay_ms),
            config.currency.clone(),
        )
    }

    pub async fn pay(&self, cart: &Cart<'_>) -> Result<OrderReceipt> {
        if cart.is_empty() {
            return Err(PharmacyError::EmptyCart);
        }

        tracing::info!(
            "Processing simulated payment for {} items ({:.2} {})",
            cart.total_items(),
            cart.total_price(),
            self.currency
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let paid_at = chrono::Utc::now();
        let lines = cart
            .lines()
            .iter()
            .map(|line| ReceiptLine {
                medicine_id: line.medicine.id.clone(),
                name: line.medicine.name.clone(),
                unit_price: line.medicine.price,
                quantity: line.quantity,
                subtotal: line.subtotal(),
            })
            .collect();

        let receipt = OrderReceipt {
            order_id: format!("ORD-{}", paid_at.format("%Y%m%d%H%M%S%3f")),
            lines,
            total_items: cart.total_items(),
            total_amount: cart.total_price(),
            currency: self.currency.clone(),
            paid_at,
        };

        tracing::info!("✅ Payment successful, order {} placed", receipt.order_id);
        Ok(receipt)
    }
}

impl Default for PaymentProcessor {
    fn default() -> Self {
        Self::from_config(&PaymentConfig::default())
    }
}
