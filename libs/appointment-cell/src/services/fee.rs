use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_database::SchedulingStore;

use crate::models::BookingError;

/// Reads a professional's current consultation fee. No caching: the value
/// read here is the one frozen into the appointment.
pub struct FeeResolver {
    store: Arc<dyn SchedulingStore>,
}

impl FeeResolver {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, professional_id: Uuid) -> Result<f64, BookingError> {
        let row = self
            .store
            .consultation_fee(professional_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("professional {} not found", professional_id)))?;

        match row.consultation_fee {
            Some(fee) if fee.is_finite() && fee > 0.0 => {
                debug!("Consultation fee for {} is {:.2}", professional_id, fee);
                Ok(fee)
            }
            _ => Err(BookingError::Validation(
                "professional has no fee configured".to_string(),
            )),
        }
    }

    /// True when the professional exists, fee or not.
    pub async fn professional_exists(&self, professional_id: Uuid) -> Result<bool, BookingError> {
        Ok(self.store.consultation_fee(professional_id).await?.is_some())
    }
}
