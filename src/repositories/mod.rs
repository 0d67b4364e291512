use async_trait::async_trait;

use crate::models::item::Item;
use crate::models::plateau::Plateau;
use crate::models::reservation::{Reservation, TimeRange};

pub mod in_memory_repo;
pub mod postgres_repo;

/// Result of a guarded reservation insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another reservation on the plateau intersects the requested slot.
    Conflict,
    /// The plateau disappeared between validation and insert.
    UnknownPlateau,
}

/// Persistent collections backing the reservation service.
///
/// `insert_if_available` must check for overlapping reservations and insert
/// as one atomic step; every other operation is a plain read or delete.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Bulk-inserts `items` only when the collection is empty. Returns the
    /// number of rows written.
    async fn populate_items(&self, items: Vec<Item>) -> anyhow::Result<usize>;

    /// Bulk-inserts `plateaus` only when the collection is empty.
    async fn populate_plateaus(&self, plateaus: Vec<Plateau>) -> anyhow::Result<usize>;

    async fn list_items(&self) -> anyhow::Result<Vec<Item>>;

    async fn find_item(&self, item_id: &str) -> anyhow::Result<Option<Item>>;

    async fn list_plateaus(&self) -> anyhow::Result<Vec<Plateau>>;

    async fn find_plateau(&self, plateau_id: &str) -> anyhow::Result<Option<Plateau>>;

    /// All reservations ordered by start time.
    async fn list_reservations(&self) -> anyhow::Result<Vec<Reservation>>;

    async fn find_reservation(&self, reservation_id: &str) -> anyhow::Result<Option<Reservation>>;

    async fn list_reservations_for_plateau(&self, plateau_id: &str) -> anyhow::Result<Vec<Reservation>>;

    async fn find_overlapping(
        &self,
        plateau_id: &str,
        range: &TimeRange,
    ) -> anyhow::Result<Vec<Reservation>>;

    async fn insert_if_available(&self, reservation: &Reservation) -> anyhow::Result<InsertOutcome>;

    /// Returns whether a reservation was removed.
    async fn delete_reservation(&self, reservation_id: &str) -> anyhow::Result<bool>;

    /// Drops every reservation and replaces items and plateaus, as one step
    /// no other operation can observe half-done. Returns the seeded counts.
    async fn reseed(
        &self,
        items: Vec<Item>,
        plateaus: Vec<Plateau>,
    ) -> anyhow::Result<(usize, usize)>;
}
