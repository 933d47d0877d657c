//! Period reports over recorded sales.

use chrono::{DateTime, Utc};
use tracing::info;

use grox_core::dto::RevenueSummary;
use grox_core::{Actor, Capability, CoreError, ValidationError};
use grox_db::Database;

use crate::error::ServiceResult;

#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        ReportService { db }
    }

    /// Revenue and gross margin of stock-affecting sales created in
    /// `[from, to)`. Pending and cancelled sales are left out; returns against
    /// the period's sales come off `net_total` and `gross_margin`.
    pub async fn revenue_summary(
        &self,
        actor: &Actor,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<RevenueSummary> {
        actor.require(Capability::ViewReports)?;

        if from >= to {
            return Err(CoreError::from(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: "start must be before end".to_string(),
            })
            .into());
        }

        let summary = self.db.sales().revenue_between(from, to).await?;

        info!(
            from = %from,
            to = %to,
            sales = summary.sale_count,
            total = summary.total,
            net_total = summary.net_total,
            "Revenue summary computed"
        );

        Ok(summary)
    }
}
