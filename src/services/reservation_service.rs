use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ReservationError;
use crate::helpers::fixtures::Fixtures;
use crate::models::item::Item;
use crate::models::plateau::Plateau;
use crate::models::reservation::{NewReservation, Reservation, TimeRange};
use crate::repositories::{InsertOutcome, ReservationStore};

pub type ServiceResult<T> = Result<T, ReservationError>;

/// Validates and books reservations against a [`ReservationStore`].
///
/// Built once at start-up and shared behind an `Arc`.
pub struct ReservationService {
    store: Arc<dyn ReservationStore>,
    fixtures: Fixtures,
}

impl ReservationService {
    pub fn new(store: Arc<dyn ReservationStore>, fixtures: Fixtures) -> Self {
        Self { store, fixtures }
    }

    /// Seeds items and plateaus from fixtures into empty collections.
    pub async fn populate_db(&self) -> ServiceResult<()> {
        let (items, plateaus) = futures::try_join!(
            self.store.populate_items(self.fixtures.items.clone()),
            self.store.populate_plateaus(self.fixtures.plateaus.clone()),
        )?;
        info!("Seeded {} items and {} plateaus from fixtures", items, plateaus);
        Ok(())
    }

    /// Wipes every collection and reseeds the reference data in one store step.
    pub async fn reset_database(&self) -> ServiceResult<()> {
        warn!("Resetting reservation database");
        let (items, plateaus) = self
            .store
            .reseed(self.fixtures.items.clone(), self.fixtures.plateaus.clone())
            .await?;
        info!("Reseeded {} items and {} plateaus from fixtures", items, plateaus);
        Ok(())
    }

    pub async fn get_all_items(&self) -> ServiceResult<Vec<Item>> {
        Ok(self.store.list_items().await?)
    }

    pub async fn get_item_by_id(&self, item_id: &str) -> ServiceResult<Item> {
        self.store
            .find_item(item_id)
            .await?
            .ok_or_else(|| ReservationError::ItemNotFound(item_id.to_string()))
    }

    pub async fn get_all_plateaus(&self) -> ServiceResult<Vec<Plateau>> {
        Ok(self.store.list_plateaus().await?)
    }

    pub async fn get_plateau_by_id(&self, plateau_id: &str) -> ServiceResult<Plateau> {
        self.store
            .find_plateau(plateau_id)
            .await?
            .ok_or_else(|| ReservationError::PlateauNotFound(plateau_id.to_string()))
    }

    /// True iff no reservation on the plateau intersects `[start, end)`.
    pub async fn check_plateau_availability(
        &self,
        plateau_id: &str,
        range: &TimeRange,
    ) -> ServiceResult<bool> {
        Ok(self.store.find_overlapping(plateau_id, range).await?.is_empty())
    }

    pub async fn get_all_reservations(&self) -> ServiceResult<Vec<Reservation>> {
        Ok(self.store.list_reservations().await?)
    }

    pub async fn get_reservation_by_id(&self, reservation_id: &str) -> ServiceResult<Reservation> {
        self.store
            .find_reservation(reservation_id)
            .await?
            .ok_or_else(|| ReservationError::ReservationNotFound(reservation_id.to_string()))
    }

    pub async fn get_reservations_for_plateau(&self, plateau_id: &str) -> ServiceResult<Vec<Reservation>> {
        // 404 for unknown plateaus rather than an empty list
        self.get_plateau_by_id(plateau_id).await?;
        Ok(self.store.list_reservations_for_plateau(plateau_id).await?)
    }

    pub async fn create_reservation(&self, request: NewReservation) -> ServiceResult<Reservation> {
        let plateau = self.get_plateau_by_id(&request.plateau_id).await?;

        let disallowed = plateau.disallowed_items(&request.item_ids);
        if !disallowed.is_empty() {
            return Err(ReservationError::InvalidItems {
                plateau_id: plateau.id,
                items: disallowed,
            });
        }

        let range = TimeRange::new(request.start_time, request.end_time)
            .ok_or(ReservationError::InvalidTimeRange)?;

        let client_name = request.client_name.trim();
        if client_name.is_empty() {
            return Err(ReservationError::InvalidClientName);
        }

        if !self.check_plateau_availability(&plateau.id, &range).await? {
            return Err(ReservationError::SlotUnavailable);
        }

        let now = OffsetDateTime::now_utc();
        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            plateau_id: plateau.id,
            plateau_name: plateau.name,
            client_name: client_name.to_string(),
            start_time: range.start,
            end_time: range.end,
            item_ids: request.item_ids,
            // timestamptz keeps microseconds; stay at millisecond precision
            created_at: now.replace_millisecond(now.millisecond()).unwrap_or(now),
        };

        // The availability check above can race; the store's guarded insert decides.
        match self.store.insert_if_available(&reservation).await? {
            InsertOutcome::Inserted => {
                info!(
                    "Reservation {} booked on plateau {} for {}",
                    reservation.id, reservation.plateau_id, reservation.client_name
                );
                Ok(reservation)
            }
            InsertOutcome::Conflict => Err(ReservationError::SlotUnavailable),
            InsertOutcome::UnknownPlateau => Err(ReservationError::PlateauNotFound(reservation.plateau_id)),
        }
    }

    pub async fn delete_reservation(&self, reservation_id: &str) -> ServiceResult<()> {
        if !self.store.delete_reservation(reservation_id).await? {
            return Err(ReservationError::ReservationNotFound(reservation_id.to_string()));
        }
        info!("Reservation {} cancelled", reservation_id);
        Ok(())
    }
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::repositories::in_memory_repo::InMemoryRepo;

    /// Plateau `P` allows items `A` and `B`; plateau `Q` allows nothing.
    pub fn sample_fixtures() -> Fixtures {
        Fixtures {
            items: vec![
                Item { id: "A".into(), name: "Item A".into() },
                Item { id: "B".into(), name: "Item B".into() },
                Item { id: "C".into(), name: "Item C".into() },
            ],
            plateaus: vec![
                Plateau {
                    id: "P".into(),
                    name: "Plateau P".into(),
                    description: "Main court".into(),
                    max_capacity: 10,
                    allowed_items: vec!["A".into(), "B".into()],
                },
                Plateau {
                    id: "Q".into(),
                    name: "Plateau Q".into(),
                    description: String::new(),
                    max_capacity: 2,
                    allowed_items: vec![],
                },
            ],
        }
    }

    pub async fn seeded_service() -> ReservationService {
        let service = ReservationService::new(Arc::new(InMemoryRepo::new()), sample_fixtures());
        service.populate_db().await.unwrap();
        service
    }

    pub fn request(plateau_id: &str, start: OffsetDateTime, end: OffsetDateTime) -> NewReservation {
        NewReservation {
            plateau_id: plateau_id.into(),
            item_ids: vec![],
            start_time: start,
            end_time: end,
            client_name: "Ana".into(),
        }
    }
}
