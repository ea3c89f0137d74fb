// libs/billing-cell/src/services/settlement.rs
//
// Payment settlement: the counter desk lists unpaid stubs and settles them
// with a real amount and method. Settlement is one-way; a paid payment never
// goes back to unpaid.

use chrono::Local;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use shared_config::AppConfig;
use shared_database::postgrest::StoreClient;

use crate::models::{BillingError, PayRequest, Payment, PaymentMethod, UnpaidPayment};

const UNPAID_SELECT: &str = "payment_id,amount,status,\
appointment:appointment(appointment_id,appointment_date,appointment_time),\
patient:patient(patient_id,first_name,last_name)";

pub struct PaymentSettlementService {
    store: Arc<StoreClient>,
}

impl PaymentSettlementService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
        }
    }

    /// Settle one payment: positive amount, a supported method, dated today.
    pub async fn pay(&self, payment_id: i64, request: PayRequest) -> Result<Payment, BillingError> {
        let amount = request
            .amount
            .ok_or_else(|| BillingError::ValidationError("amount is required".to_string()))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(BillingError::ValidationError(
                "amount must be greater than 0".to_string(),
            ));
        }
        let method: PaymentMethod = request
            .payment_method
            .as_deref()
            .unwrap_or("cash")
            .parse()?;

        let path = format!("/rest/v1/payment?payment_id=eq.{}", payment_id);
        let patch = json!({
            "amount": amount,
            "payment_method": method.to_string(),
            "payment_date": Local::now().date_naive().to_string(),
            "status": "paid",
        });
        let updated: Vec<Payment> = self
            .store
            .request_returning(Method::PATCH, &path, Some(patch))
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;

        let payment = updated
            .into_iter()
            .next()
            .ok_or(BillingError::NotFound("Payment"))?;
        info!(
            "Payment {} settled: {:.2} via {}",
            payment_id, amount, method
        );
        Ok(payment)
    }

    /// Unpaid stubs with their appointment and patient, oldest visit first.
    pub async fn list_unpaid(&self) -> Result<Vec<UnpaidPayment>, BillingError> {
        let path = format!("/rest/v1/payment?status=eq.unpaid&select={}", UNPAID_SELECT);
        let mut rows: Vec<UnpaidPayment> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;

        rows.sort_by_key(|p| (p.appointment.appointment_date, p.appointment.appointment_time));
        Ok(rows)
    }
}
