use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::item::Item;
use crate::models::plateau::Plateau;
use crate::models::reservation::{Reservation, TimeRange};
use crate::repositories::{InsertOutcome, ReservationStore};

#[derive(Default)]
struct Collections {
    items: Vec<Item>,
    plateaus: Vec<Plateau>,
    reservations: HashMap<String, Reservation>,
}

impl Collections {
    fn overlapping(&self, plateau_id: &str, range: &TimeRange) -> Vec<Reservation> {
        let mut found: Vec<Reservation> = self
            .reservations
            .values()
            .filter(|r| r.plateau_id == plateau_id && r.time_range().overlaps(range))
            .cloned()
            .collect();
        sort_by_start(&mut found);
        found
    }
}

/// Process-local store. Every write takes the single write lock, so the
/// overlap check and insert in `insert_if_available` cannot interleave with
/// another writer.
#[derive(Default)]
pub struct InMemoryRepo {
    collections: RwLock<Collections>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_by_start(reservations: &mut [Reservation]) {
    reservations.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl ReservationStore for InMemoryRepo {
    async fn populate_items(&self, items: Vec<Item>) -> anyhow::Result<usize> {
        let mut collections = self.collections.write().await;
        if !collections.items.is_empty() {
            return Ok(0);
        }
        let count = items.len();
        collections.items = items;
        Ok(count)
    }

    async fn populate_plateaus(&self, plateaus: Vec<Plateau>) -> anyhow::Result<usize> {
        let mut collections = self.collections.write().await;
        if !collections.plateaus.is_empty() {
            return Ok(0);
        }
        let count = plateaus.len();
        collections.plateaus = plateaus;
        Ok(count)
    }

    async fn list_items(&self) -> anyhow::Result<Vec<Item>> {
        Ok(self.collections.read().await.items.clone())
    }

    async fn find_item(&self, item_id: &str) -> anyhow::Result<Option<Item>> {
        let collections = self.collections.read().await;
        Ok(collections.items.iter().find(|item| item.id == item_id).cloned())
    }

    async fn list_plateaus(&self) -> anyhow::Result<Vec<Plateau>> {
        Ok(self.collections.read().await.plateaus.clone())
    }

    async fn find_plateau(&self, plateau_id: &str) -> anyhow::Result<Option<Plateau>> {
        let collections = self.collections.read().await;
        Ok(collections.plateaus.iter().find(|p| p.id == plateau_id).cloned())
    }

    async fn list_reservations(&self) -> anyhow::Result<Vec<Reservation>> {
        let mut reservations: Vec<Reservation> =
            self.collections.read().await.reservations.values().cloned().collect();
        sort_by_start(&mut reservations);
        Ok(reservations)
    }

    async fn find_reservation(&self, reservation_id: &str) -> anyhow::Result<Option<Reservation>> {
        Ok(self.collections.read().await.reservations.get(reservation_id).cloned())
    }

    async fn list_reservations_for_plateau(&self, plateau_id: &str) -> anyhow::Result<Vec<Reservation>> {
        let mut reservations: Vec<Reservation> = self
            .collections
            .read()
            .await
            .reservations
            .values()
            .filter(|r| r.plateau_id == plateau_id)
            .cloned()
            .collect();
        sort_by_start(&mut reservations);
        Ok(reservations)
    }

    async fn find_overlapping(
        &self,
        plateau_id: &str,
        range: &TimeRange,
    ) -> anyhow::Result<Vec<Reservation>> {
        Ok(self.collections.read().await.overlapping(plateau_id, range))
    }

    async fn insert_if_available(&self, reservation: &Reservation) -> anyhow::Result<InsertOutcome> {
        let mut collections = self.collections.write().await;
        if !collections.plateaus.iter().any(|p| p.id == reservation.plateau_id) {
            return Ok(InsertOutcome::UnknownPlateau);
        }
        if !collections
            .overlapping(&reservation.plateau_id, &reservation.time_range())
            .is_empty()
        {
            return Ok(InsertOutcome::Conflict);
        }
        collections
            .reservations
            .insert(reservation.id.clone(), reservation.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn delete_reservation(&self, reservation_id: &str) -> anyhow::Result<bool> {
        Ok(self
            .collections
            .write()
            .await
            .reservations
            .remove(reservation_id)
            .is_some())
    }

    async fn reseed(
        &self,
        items: Vec<Item>,
        plateaus: Vec<Plateau>,
    ) -> anyhow::Result<(usize, usize)> {
        let counts = (items.len(), plateaus.len());
        *self.collections.write().await = Collections {
            items,
            plateaus,
            reservations: HashMap::new(),
        };
        Ok(counts)
    }
}
