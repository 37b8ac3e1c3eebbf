use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::models::{
    CustomerInfo, NewOrder, NewOrderLine, OrderConfirmation, OrderDetails, OrderStatus,
    ServiceError, ServiceResult, Validate,
};
use crate::repositories::OrderRepository;
use crate::services::{CartStore, PricingConverter};

/// Order submission service.
///
/// Checkout validates the customer details, converts the cart total into the
/// display currency, persists the order header and its lines in one
/// transaction, and clears the session's ledger only once the write has
/// succeeded. A failed write leaves the ledger untouched so the caller can
/// retry; retries are never automatic.
pub struct OrderService {
    store: Arc<CartStore>,
    order_repository: Arc<dyn OrderRepository>,
    pricing: PricingConverter,
}

impl OrderService {
    /// Create a new OrderService
    pub fn new(
        store: Arc<CartStore>,
        order_repository: Arc<dyn OrderRepository>,
        pricing: PricingConverter,
    ) -> Self {
        Self {
            store,
            order_repository,
            pricing,
        }
    }

    /// Submit the session's cart as an order
    #[instrument(skip(self, customer), fields(session_id = %session_id))]
    pub async fn submit(
        &self,
        session_id: &str,
        customer: CustomerInfo,
    ) -> ServiceResult<OrderConfirmation> {
        info!("Submitting order");

        if session_id.trim().is_empty() {
            return Err(ServiceError::Validation {
                message: "Session ID cannot be empty".to_string(),
            });
        }

        // No writes happen unless every required field is present.
        customer.validate()?;

        let ledger = self.store.snapshot(session_id).await;
        let total_amount = self.pricing.convert(ledger.total_amount());

        let order = NewOrder {
            customer_name: customer.name.trim().to_string(),
            customer_email: customer.email.trim().to_string(),
            customer_phone: customer.phone.trim().to_string(),
            delivery_address: customer.address.trim().to_string(),
            total_amount,
            status: OrderStatus::Pending,
        };

        // Unit prices are snapshotted in display currency at submission
        // time; later menu edits must not move placed orders.
        let lines: Vec<NewOrderLine> = ledger
            .entries()
            .map(|entry| NewOrderLine {
                menu_item_id: entry.item.id,
                quantity: i32::try_from(entry.quantity).unwrap_or(i32::MAX),
                unit_price: self.pricing.convert(entry.item.price),
            })
            .collect();

        let order_id = match self.order_repository.create_order(&order, &lines).await {
            Ok(order_id) => order_id,
            Err(source) => {
                // Ledger stays intact for retry.
                error!(error = %source, "Order persistence failed, cart preserved");
                return Err(ServiceError::OrderPersistence { source });
            }
        };

        self.store.clear(session_id).await;

        info!(order_id, line_count = lines.len(), "Order submitted");
        Ok(OrderConfirmation {
            order_id,
            status: OrderStatus::Pending,
            total_amount,
            display_total: self.pricing.format(total_amount),
        })
    }

    /// Fetch a persisted order with its lines
    #[instrument(skip(self), fields(order_id = id))]
    pub async fn get_order(&self, id: i64) -> ServiceResult<OrderDetails> {
        match self.order_repository.find_order(id).await? {
            Some(order) => {
                let lines = self.order_repository.find_order_lines(id).await?;
                Ok(OrderDetails { order, lines })
            }
            None => Err(ServiceError::OrderNotFound { id }),
        }
    }
}
