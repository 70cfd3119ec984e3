use async_trait::async_trait;
use parking_core::{
    LotRepository, RepoResult, Repositories, ReservationRepository, SpotRepository,
    UserRepository,
};
use parking_shared::{ParkingLot, ParkingSpot, Reservation, SpotStatus, User};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local storage behind the repository ports. Backs tests and
/// single-process deployments; nothing survives a restart.
#[derive(Default)]
pub struct InMemoryStore {
    lots: RwLock<HashMap<Uuid, ParkingLot>>,
    spots: RwLock<HashMap<Uuid, ParkingSpot>>,
    reservations: RwLock<HashMap<Uuid, Reservation>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryStore {
    pub fn repositories(store: &Arc<Self>) -> Repositories {
        Repositories {
            lots: store.clone(),
            spots: store.clone(),
            reservations: store.clone(),
            users: store.clone(),
        }
    }
}

#[async_trait]
impl LotRepository for InMemoryStore {
    async fn insert_lot(&self, lot: &ParkingLot) -> RepoResult<()> {
        self.lots.write().await.insert(lot.id, lot.clone());
        Ok(())
    }

    async fn get_lot(&self, id: Uuid) -> RepoResult<Option<ParkingLot>> {
        Ok(self.lots.read().await.get(&id).cloned())
    }

    async fn list_lots(&self) -> RepoResult<Vec<ParkingLot>> {
        let mut lots: Vec<ParkingLot> = self.lots.read().await.values().cloned().collect();
        lots.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.location.cmp(&b.location))
        });
        Ok(lots)
    }

    async fn search_lots(&self, needle: &str) -> RepoResult<Vec<ParkingLot>> {
        Ok(self
            .list_lots()
            .await?
            .into_iter()
            .filter(|l| l.matches(needle))
            .collect())
    }

    async fn update_lot(&self, lot: &ParkingLot) -> RepoResult<()> {
        match self.lots.write().await.get_mut(&lot.id) {
            Some(stored) => {
                *stored = lot.clone();
                Ok(())
            }
            None => Err(format!("Parking lot not found: {}", lot.id).into()),
        }
    }

    async fn delete_lot(&self, id: Uuid) -> RepoResult<()> {
        self.lots.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SpotRepository for InMemoryStore {
    async fn insert_spots(&self, spots: &[ParkingSpot]) -> RepoResult<()> {
        let mut stored = self.spots.write().await;
        for spot in spots {
            stored.insert(spot.id, spot.clone());
        }
        Ok(())
    }

    async fn get_spot(&self, id: Uuid) -> RepoResult<Option<ParkingSpot>> {
        Ok(self.spots.read().await.get(&id).cloned())
    }

    async fn list_spots(&self, lot_id: Uuid) -> RepoResult<Vec<ParkingSpot>> {
        let mut spots: Vec<ParkingSpot> = self
            .spots
            .read()
            .await
            .values()
            .filter(|s| s.lot_id == lot_id)
            .cloned()
            .collect();
        spots.sort_by_key(|s| s.number);
        Ok(spots)
    }

    async fn transition_status(
        &self,
        spot_id: Uuid,
        from: SpotStatus,
        to: SpotStatus,
    ) -> RepoResult<bool> {
        // Check and set under one write lock
        let mut spots = self.spots.write().await;
        match spots.get_mut(&spot_id) {
            Some(spot) if spot.status == from => {
                spot.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_spots(&self, ids: &[Uuid]) -> RepoResult<u64> {
        let mut spots = self.spots.write().await;
        Ok(ids.iter().filter(|id| spots.remove(*id).is_some()).count() as u64)
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn insert_reservation(&self, reservation: &Reservation) -> RepoResult<()> {
        let mut reservations = self.reservations.write().await;
        let clash = reservations.values().any(|r| {
            r.is_open() && (r.spot_id == reservation.spot_id || r.vehicle_id == reservation.vehicle_id)
        });
        if reservation.is_open() && clash {
            return Err(format!(
                "Open reservation already exists for spot {} or vehicle {}",
                reservation.spot_id, reservation.vehicle_id
            )
            .into());
        }
        reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn get_reservation(&self, id: Uuid) -> RepoResult<Option<Reservation>> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }

    async fn close_reservation(&self, reservation: &Reservation) -> RepoResult<bool> {
        match self.reservations.write().await.get_mut(&reservation.id) {
            Some(stored) if stored.is_open() => {
                stored.ended_at = reservation.ended_at;
                stored.total_cost = reservation.total_cost;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(format!("Reservation not found: {}", reservation.id).into()),
        }
    }

    async fn find_open_by_vehicle(&self, vehicle_id: &str) -> RepoResult<Option<Reservation>> {
        Ok(self
            .reservations
            .read()
            .await
            .values()
            .find(|r| r.is_open() && r.vehicle_id == vehicle_id)
            .cloned())
    }

    async fn find_open_by_spot(&self, spot_id: Uuid) -> RepoResult<Option<Reservation>> {
        Ok(self
            .reservations
            .read()
            .await
            .values()
            .find(|r| r.is_open() && r.spot_id == spot_id)
            .cloned())
    }

    async fn list_open_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Reservation>> {
        Ok(self
            .list_by_user(user_id)
            .await?
            .into_iter()
            .filter(|r| r.is_open())
            .collect())
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Reservation>> {
        let mut history: Vec<Reservation> = self
            .reservations
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by_key(|r| r.started_at);
        Ok(history)
    }

    async fn delete_by_spots(&self, spot_ids: &[Uuid]) -> RepoResult<u64> {
        let mut reservations = self.reservations.write().await;
        let before = reservations.len();
        reservations.retain(|_, r| !spot_ids.contains(&r.spot_id));
        Ok((before - reservations.len()) as u64)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(format!("Email already registered: {}", user.email).into());
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> RepoResult<()> {
        match self.users.write().await.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(format!("User not found: {}", user.id).into()),
        }
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let store = InMemoryStore::default();
        let spot = ParkingSpot::new(Uuid::new_v4(), 1);
        store.insert_spots(&[spot.clone()]).await.unwrap();

        assert!(store
            .transition_status(spot.id, SpotStatus::Available, SpotStatus::Occupied)
            .await
            .unwrap());
        // Second claim loses
        assert!(!store
            .transition_status(spot.id, SpotStatus::Available, SpotStatus::Occupied)
            .await
            .unwrap());
        assert!(!store
            .transition_status(Uuid::new_v4(), SpotStatus::Available, SpotStatus::Occupied)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_open_reservation_uniqueness() {
        let store = InMemoryStore::default();
        let spot_id = Uuid::new_v4();
        let lot_id = Uuid::new_v4();
        let first = Reservation::open(spot_id, lot_id, Uuid::new_v4(), "CAR-1".into(), Utc::now());
        store.insert_reservation(&first).await.unwrap();

        let same_spot = Reservation::open(spot_id, lot_id, Uuid::new_v4(), "CAR-2".into(), Utc::now());
        assert!(store.insert_reservation(&same_spot).await.is_err());

        let same_vehicle =
            Reservation::open(Uuid::new_v4(), lot_id, Uuid::new_v4(), "CAR-1".into(), Utc::now());
        assert!(store.insert_reservation(&same_vehicle).await.is_err());

        let mut closed = first.clone();
        closed.close(Utc::now(), 1.5);
        assert!(store.close_reservation(&closed).await.unwrap());
        store.insert_reservation(&same_spot).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_only_once() {
        let store = InMemoryStore::default();
        let mut reservation =
            Reservation::open(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), "CAR-1".into(), Utc::now());
        store.insert_reservation(&reservation).await.unwrap();

        reservation.close(Utc::now(), 4.0);
        assert!(store.close_reservation(&reservation).await.unwrap());

        // A second close must not overwrite the first bill
        let mut late = reservation.clone();
        late.total_cost = Some(9.0);
        assert!(!store.close_reservation(&late).await.unwrap());
        let stored = store.get_reservation(reservation.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cost, Some(4.0));
    }

    #[tokio::test]
    async fn test_delete_by_spots_counts_rows() {
        let store = InMemoryStore::default();
        let lot_id = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        for (spot, vehicle) in [(a, "CAR-1"), (b, "CAR-2")] {
            let r = Reservation::open(spot, lot_id, Uuid::new_v4(), vehicle.into(), Utc::now());
            store.insert_reservation(&r).await.unwrap();
        }

        assert_eq!(store.delete_by_spots(&[a]).await.unwrap(), 1);
        assert!(store.find_open_by_spot(a).await.unwrap().is_none());
        assert!(store.find_open_by_spot(b).await.unwrap().is_some());
    }
}
