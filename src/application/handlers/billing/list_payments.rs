//! ListPaymentsHandler - Query handler for a centre's payment history.
//!
//! Backs the invoice listing: completed payments only, newest first.

use std::sync::Arc;

use crate::domain::billing::{PaymentRecord, PaymentStatus};
use crate::domain::foundation::{CentreId, DomainError};
use crate::ports::LedgerStore;

/// Query for a centre's completed payments.
#[derive(Debug, Clone)]
pub struct ListPaymentsQuery {
    pub centre_id: CentreId,
}

/// Handler for the payment history query.
pub struct ListPaymentsHandler {
    store: Arc<dyn LedgerStore>,
}

impl ListPaymentsHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: ListPaymentsQuery,
    ) -> Result<Vec<PaymentRecord>, DomainError> {
        let payments = self.store.list_payments(&query.centre_id).await?;
        Ok(payments
            .into_iter()
            .filter(|p| p.status == PaymentStatus::Completed)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedgerStore;
    use crate::domain::billing::{CentreSubscription, PlanId};
    use crate::domain::foundation::{Money, Timestamp};

    #[tokio::test]
    async fn returns_only_completed_payments() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let centre = CentreSubscription::fresh(CentreId::new(), Timestamp::now());
        store.seed_centre(centre.clone()).await;

        let completed = PaymentRecord::completed(
            centre.centre_id,
            Money::from_minor_units(69_900),
            PlanId::Monthly,
            Some("pay_1".to_string()),
            Some("sub_1".to_string()),
            Timestamp::now(),
        );
        store.record_charge(&centre, &completed).await.unwrap();

        let cancelled = PaymentRecord::completed(
            centre.centre_id,
            Money::from_minor_units(69_900),
            PlanId::Monthly,
            Some("pay_2".to_string()),
            Some("sub_2".to_string()),
            Timestamp::now(),
        );
        store.record_charge(&centre, &cancelled).await.unwrap();
        store.cancel_latest_payment("sub_2").await.unwrap();

        let handler = ListPaymentsHandler::new(store);
        let payments = handler
            .handle(ListPaymentsQuery {
                centre_id: centre.centre_id,
            })
            .await
            .unwrap();

        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].external_payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn empty_ledger_yields_empty_list() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let handler = ListPaymentsHandler::new(store);

        let payments = handler
            .handle(ListPaymentsQuery {
                centre_id: CentreId::new(),
            })
            .await
            .unwrap();
        assert!(payments.is_empty());
    }
}
