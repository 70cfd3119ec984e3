use parking_core::{LedgerResult, RequestContext};
use std::collections::HashMap;
use uuid::Uuid;

use crate::ledger::ReservationLedger;
use crate::models::LotUsage;

impl ReservationLedger {
    /// Reservations the caller has made, grouped per lot, most used first.
    /// Open reservations count towards `reservations` but not `total_spent`.
    pub async fn usage_summary(&self, ctx: &RequestContext) -> LedgerResult<Vec<LotUsage>> {
        let history = self
            .repos
            .reservations
            .list_by_user(ctx.actor.user_id)
            .await?;

        let mut per_lot: HashMap<Uuid, (usize, f64)> = HashMap::new();
        for reservation in &history {
            let entry = per_lot.entry(reservation.lot_id).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += reservation.total_cost.unwrap_or(0.0);
        }

        let mut usage = Vec::with_capacity(per_lot.len());
        for (lot_id, (reservations, spent)) in per_lot {
            let location = self.repos.lots.get_lot(lot_id).await?.map(|lot| lot.location);
            usage.push(LotUsage {
                lot_id,
                location,
                reservations,
                total_spent: self.pricing.round(spent),
            });
        }
        usage.sort_by(|a, b| {
            b.reservations
                .cmp(&a.reservations)
                .then_with(|| a.location.cmp(&b.location))
        });

        Ok(usage)
    }
}
