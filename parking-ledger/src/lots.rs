use parking_catalog::{validate_draft, Occupancy, ResizePlan};
use parking_core::{LedgerError, LedgerResult, RequestContext};
use parking_shared::models::events::{LedgerEvent, LotDeletedEvent, LotResizedEvent};
use parking_shared::{LotDraft, ParkingLot, ParkingSpot};
use tracing::{info, warn};
use uuid::Uuid;

use crate::ledger::ReservationLedger;
use crate::models::{ResizeOutcome, SpotDetails};

impl ReservationLedger {
    /// Create a lot and `draft.capacity` Available spots numbered from 1.
    pub async fn create_lot(&self, ctx: &RequestContext, draft: LotDraft) -> LedgerResult<ParkingLot> {
        ctx.require_admin()?;
        let lot = ParkingLot::new(validate_draft(draft)?, ctx.now);
        self.repos.lots.insert_lot(&lot).await?;

        let spots: Vec<ParkingSpot> = (1..=lot.capacity)
            .map(|number| ParkingSpot::new(lot.id, number))
            .collect();
        self.repos.spots.insert_spots(&spots).await?;

        info!("Parking lot {} created at {} with {} spots", lot.id, lot.location, spots.len());
        Ok(lot)
    }

    /// Edit a lot's details and rate, then resize it to `draft.capacity`.
    pub async fn update_lot(
        &self,
        ctx: &RequestContext,
        lot_id: Uuid,
        draft: LotDraft,
    ) -> LedgerResult<ResizeOutcome> {
        ctx.require_admin()?;
        let draft = validate_draft(draft)?;

        let mut lot = self.load_lot(lot_id).await?;
        lot.apply_details(&draft, ctx.now);
        self.repos.lots.update_lot(&lot).await?;

        self.resize_lot(ctx, lot_id, draft.capacity).await
    }

    /// Grow by adding Available spots, or shrink by removing Available spots only.
    ///
    /// A shrink that runs out of Available spots stops short: the remaining
    /// removals are reported as `shortfall` and the lot's capacity is set to the
    /// number of spots it actually has.
    pub async fn resize_lot(
        &self,
        ctx: &RequestContext,
        lot_id: Uuid,
        new_capacity: i32,
    ) -> LedgerResult<ResizeOutcome> {
        ctx.require_admin()?;
        let mut lot = self.load_lot(lot_id).await?;
        let spots = self.repos.spots.list_spots(lot.id).await?;
        let plan = ResizePlan::compute(&spots, new_capacity)?;

        let previous_spots = spots.len() as i32;
        let created: Vec<ParkingSpot> = plan
            .to_create
            .iter()
            .map(|number| ParkingSpot::new(lot.id, *number))
            .collect();
        if !created.is_empty() {
            self.repos.spots.insert_spots(&created).await?;
        }
        if !plan.to_remove.is_empty() {
            self.repos.reservations.delete_by_spots(&plan.to_remove).await?;
            self.repos.spots.delete_spots(&plan.to_remove).await?;
        }

        let removed = plan.to_remove.len() as i32;
        let current_spots = previous_spots + created.len() as i32 - removed;
        if lot.capacity != current_spots {
            lot.capacity = current_spots;
            lot.updated_at = ctx.now;
            self.repos.lots.update_lot(&lot).await?;
        }

        if plan.shortfall > 0 {
            warn!(
                "Lot {} shrink to {} stopped at {} spots: {} occupied spots kept",
                lot.id, new_capacity, current_spots, plan.shortfall
            );
        }
        if !plan.is_noop() {
            info!("Lot {} resized from {} to {} spots", lot.id, previous_spots, current_spots);
            self.emit(LedgerEvent::LotResized(LotResizedEvent {
                lot_id: lot.id,
                previous_spots,
                current_spots,
                shortfall: plan.shortfall,
                timestamp: ctx.now.timestamp(),
            }))
            .await;
        }

        Ok(ResizeOutcome {
            lot,
            previous_spots,
            created: created.len() as i32,
            removed,
            shortfall: plan.shortfall,
        })
    }

    /// Delete a lot with its spots and their reservation history.
    /// Refused while any spot is occupied. Returns the number of spots removed.
    pub async fn delete_lot(&self, ctx: &RequestContext, lot_id: Uuid) -> LedgerResult<u64> {
        ctx.require_admin()?;
        let lot = self.load_lot(lot_id).await?;
        let spots = self.repos.spots.list_spots(lot.id).await?;

        if spots.iter().any(|s| s.is_occupied()) {
            return Err(LedgerError::LotOccupiedCannotDelete(lot.id));
        }

        let spot_ids: Vec<Uuid> = spots.iter().map(|s| s.id).collect();
        let history = self.repos.reservations.delete_by_spots(&spot_ids).await?;
        let removed = self.repos.spots.delete_spots(&spot_ids).await?;
        self.repos.lots.delete_lot(lot.id).await?;

        info!(
            "Parking lot {} deleted with {} spots and {} reservations",
            lot.id, removed, history
        );
        self.emit(LedgerEvent::LotDeleted(LotDeletedEvent {
            lot_id: lot.id,
            spots_removed: removed as i32,
            timestamp: ctx.now.timestamp(),
        }))
        .await;

        Ok(removed)
    }

    /// Delete a single Available spot and its history; the lot's capacity follows.
    pub async fn delete_spot(&self, ctx: &RequestContext, spot_id: Uuid) -> LedgerResult<()> {
        ctx.require_admin()?;
        let spot = self.load_spot(spot_id).await?;
        if spot.is_occupied() {
            return Err(LedgerError::SpotOccupied(spot.id));
        }

        self.repos.reservations.delete_by_spots(&[spot.id]).await?;
        self.repos.spots.delete_spots(&[spot.id]).await?;

        let mut lot = self.load_lot(spot.lot_id).await?;
        lot.capacity = self.repos.spots.list_spots(lot.id).await?.len() as i32;
        lot.updated_at = ctx.now;
        self.repos.lots.update_lot(&lot).await?;

        info!("Spot {} removed from lot {}", spot.number, lot.id);
        Ok(())
    }

    pub async fn spot_details(&self, ctx: &RequestContext, spot_id: Uuid) -> LedgerResult<SpotDetails> {
        ctx.require_admin()?;
        let spot = self.load_spot(spot_id).await?;
        let open_reservation = if spot.is_occupied() {
            self.repos.reservations.find_open_by_spot(spot.id).await?
        } else {
            None
        };

        Ok(SpotDetails {
            spot,
            open_reservation,
        })
    }

    pub async fn lot_occupancy(&self, lot_id: Uuid) -> LedgerResult<Occupancy> {
        let lot = self.load_lot(lot_id).await?;
        let spots = self.repos.spots.list_spots(lot.id).await?;
        Ok(Occupancy::from_spots(lot.id, &spots))
    }

    pub async fn list_lots(&self) -> LedgerResult<Vec<ParkingLot>> {
        Ok(self.repos.lots.list_lots().await?)
    }

    /// Lots whose location or postal code contains `query`, ignoring case
    pub async fn search_lots(&self, query: &str) -> LedgerResult<Vec<ParkingLot>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repos.lots.search_lots(query).await?)
    }

    async fn load_spot(&self, spot_id: Uuid) -> LedgerResult<ParkingSpot> {
        self.repos
            .spots
            .get_spot(spot_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Parking spot", spot_id))
    }
}
