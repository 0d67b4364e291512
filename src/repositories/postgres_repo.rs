use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bb8_postgres::bb8::{Pool, PooledConnection};
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::types::ToSql;
use bb8_postgres::tokio_postgres::{NoTls, Row, Transaction};
use tracing::{info, warn};
use crate::models::item::Item;
use crate::models::plateau::Plateau;
use crate::models::reservation::{Reservation, TimeRange};
use crate::repositories::{InsertOutcome, ReservationStore};

pub const RETRY_LIMIT: usize = 5;

const SCHEMA: &str = include_str!("schema.sql");

const RESERVATION_COLUMNS: &str =
    "id, plateau_id, plateau_name, client_name, start_time, end_time, item_ids, created_at";

pub type PostgresPool = Pool<PostgresConnectionManager<NoTls>>;

pub async fn connect_pool(
    database_url: &str,
    pool_size: u32,
) -> anyhow::Result<PostgresPool> {
    let manager = PostgresConnectionManager::new_from_stringlike(database_url, NoTls)
        .context("Invalid postgres connection string")?;

    Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .await
        .context("Failed to build postgres connection pool")
}

pub struct PostgresConnectionRepo {
    postgres_connection: PostgresPool,
}

impl PostgresConnectionRepo {
    pub fn new(
        postgres_connection: PostgresPool,
    ) -> Self {
        Self {
            postgres_connection
        }
    }

    async fn get_postgres_connection(
        &self,
    ) -> anyhow::Result<PooledConnection<'_, PostgresConnectionManager<NoTls>>> {
        for _ in 0..RETRY_LIMIT {
            match self.postgres_connection.get().await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    warn!("Failed to retrieve postgres connection due to: {}, retrying in 3s", e);
                    tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
                    continue;
                }
            }
        }

        Err(anyhow!("Failed to retrieve a valid connection from postgres pool, BAILING"))
    }

    /// Creates the tables and indexes if they do not exist yet.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        let conn = self.get_postgres_connection().await?;
        conn.batch_execute(SCHEMA)
            .await
            .context("Failed to create reservation schema")?;
        info!("Postgres schema is up to date");
        Ok(())
    }

    async fn query_reservations(
        &self,
        stmt: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> anyhow::Result<Vec<Reservation>> {
        let conn = self.get_postgres_connection().await?;
        let rows = conn
            .query(stmt, params)
            .await
            .context("Failed to query reservations")?;

        Ok(rows.iter().map(parse_row_into_reservation).collect())
    }
}

#[async_trait]
impl ReservationStore for PostgresConnectionRepo {
    async fn populate_items(
        &self,
        items: Vec<Item>,
    ) -> anyhow::Result<usize> {
        let mut conn = self.get_postgres_connection().await?;
        let tx = conn.transaction().await?;

        let has_rows: bool = tx
            .query_one("SELECT EXISTS (SELECT 1 FROM items);", &[])
            .await
            .context("Failed to check items collection")?
            .get(0);
        if has_rows {
            return Ok(0);
        }

        let inserted = insert_items(&tx, &items).await?;
        tx.commit().await.context("Failed to seed items")?;

        Ok(inserted)
    }

    async fn populate_plateaus(
        &self,
        plateaus: Vec<Plateau>,
    ) -> anyhow::Result<usize> {
        let mut conn = self.get_postgres_connection().await?;
        let tx = conn.transaction().await?;

        let has_rows: bool = tx
            .query_one("SELECT EXISTS (SELECT 1 FROM plateaus);", &[])
            .await
            .context("Failed to check plateaus collection")?
            .get(0);
        if has_rows {
            return Ok(0);
        }

        let inserted = insert_plateaus(&tx, &plateaus).await?;
        tx.commit().await.context("Failed to seed plateaus")?;

        Ok(inserted)
    }

    async fn list_items(&self) -> anyhow::Result<Vec<Item>> {
        let conn = self.get_postgres_connection().await?;
        let rows = conn
            .query("SELECT id, name FROM items ORDER BY id;", &[])
            .await
            .context("Failed to retrieve items")?;

        Ok(rows.iter().map(parse_row_into_item).collect())
    }

    async fn find_item(
        &self,
        item_id: &str,
    ) -> anyhow::Result<Option<Item>> {
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_opt("SELECT id, name FROM items WHERE id = $1;", &[&item_id])
            .await
            .with_context(|| format!("Failed to retrieve item with id: {}", item_id))?;

        Ok(row.as_ref().map(parse_row_into_item))
    }

    async fn list_plateaus(&self) -> anyhow::Result<Vec<Plateau>> {
        let conn = self.get_postgres_connection().await?;
        let rows = conn
            .query(
                "SELECT id, name, description, max_capacity, allowed_items FROM plateaus ORDER BY id;",
                &[],
            )
            .await
            .context("Failed to retrieve plateaus")?;

        Ok(rows.iter().map(parse_row_into_plateau).collect())
    }

    async fn find_plateau(
        &self,
        plateau_id: &str,
    ) -> anyhow::Result<Option<Plateau>> {
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_opt(
                "SELECT id, name, description, max_capacity, allowed_items FROM plateaus WHERE id = $1;",
                &[&plateau_id],
            )
            .await
            .with_context(|| format!("Failed to retrieve plateau with id: {}", plateau_id))?;

        Ok(row.as_ref().map(parse_row_into_plateau))
    }

    async fn list_reservations(&self) -> anyhow::Result<Vec<Reservation>> {
        let stmt = format!(
            "SELECT {} FROM reservations ORDER BY start_time, id;",
            RESERVATION_COLUMNS
        );
        self.query_reservations(&stmt, &[]).await
    }

    async fn find_reservation(
        &self,
        reservation_id: &str,
    ) -> anyhow::Result<Option<Reservation>> {
        let stmt = format!("SELECT {} FROM reservations WHERE id = $1;", RESERVATION_COLUMNS);
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_opt(&stmt, &[&reservation_id])
            .await
            .with_context(|| format!("Failed to retrieve reservation with id: {}", reservation_id))?;

        Ok(row.as_ref().map(parse_row_into_reservation))
    }

    async fn list_reservations_for_plateau(
        &self,
        plateau_id: &str,
    ) -> anyhow::Result<Vec<Reservation>> {
        let stmt = format!(
            "SELECT {} FROM reservations WHERE plateau_id = $1 ORDER BY start_time, id;",
            RESERVATION_COLUMNS
        );
        self.query_reservations(&stmt, &[&plateau_id]).await
    }

    async fn find_overlapping(
        &self,
        plateau_id: &str,
        range: &TimeRange,
    ) -> anyhow::Result<Vec<Reservation>> {
        let stmt = format!(
            "SELECT {} FROM reservations \
            WHERE plateau_id = $1 AND NOT (end_time <= $2 OR start_time >= $3) \
            ORDER BY start_time, id;",
            RESERVATION_COLUMNS
        );
        self.query_reservations(&stmt, &[&plateau_id, &range.start, &range.end]).await
    }

    async fn insert_if_available(
        &self,
        reservation: &Reservation,
    ) -> anyhow::Result<InsertOutcome> {
        let mut conn = self.get_postgres_connection().await?;
        let tx = conn.transaction().await?;

        // Row lock on the plateau serialises concurrent bookings for it.
        let plateau = tx
            .query_opt(
                "SELECT id FROM plateaus WHERE id = $1 FOR UPDATE;",
                &[&reservation.plateau_id],
            )
            .await
            .context("Failed to lock plateau")?;
        if plateau.is_none() {
            return Ok(InsertOutcome::UnknownPlateau);
        }

        let taken: bool = tx
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM reservations \
                WHERE plateau_id = $1 AND NOT (end_time <= $2 OR start_time >= $3));",
                &[&reservation.plateau_id, &reservation.start_time, &reservation.end_time],
            )
            .await
            .context("Failed to check plateau availability")?
            .get(0);
        if taken {
            return Ok(InsertOutcome::Conflict);
        }

        let stmt = format!(
            "INSERT INTO reservations ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8);",
            RESERVATION_COLUMNS
        );
        tx.execute(
            &stmt,
            &[
                &reservation.id,
                &reservation.plateau_id,
                &reservation.plateau_name,
                &reservation.client_name,
                &reservation.start_time,
                &reservation.end_time,
                &reservation.item_ids,
                &reservation.created_at,
            ],
        )
        .await
        .with_context(|| format!("Failed to add reservation for client: {}", reservation.client_name))?;
        tx.commit().await.context("Failed to commit reservation")?;

        Ok(InsertOutcome::Inserted)
    }

    async fn delete_reservation(
        &self,
        reservation_id: &str,
    ) -> anyhow::Result<bool> {
        let conn = self.get_postgres_connection().await?;
        let removed = conn
            .execute("DELETE FROM reservations WHERE id = $1;", &[&reservation_id])
            .await
            .with_context(|| format!("Failed to remove reservation with id: {}", reservation_id))?;

        Ok(removed > 0)
    }

    async fn reseed(
        &self,
        items: Vec<Item>,
        plateaus: Vec<Plateau>,
    ) -> anyhow::Result<(usize, usize)> {
        let mut conn = self.get_postgres_connection().await?;
        let tx = conn.transaction().await?;

        // TRUNCATE takes ACCESS EXCLUSIVE, so readers and bookings wait for the commit
        tx.batch_execute("TRUNCATE reservations, plateaus, items;")
            .await
            .context("Failed to clear collections")?;
        let seeded_items = insert_items(&tx, &items).await?;
        let seeded_plateaus = insert_plateaus(&tx, &plateaus).await?;
        tx.commit().await.context("Failed to reseed collections")?;

        Ok((seeded_items, seeded_plateaus))
    }
}

async fn insert_items(
    tx: &Transaction<'_>,
    items: &[Item],
) -> anyhow::Result<usize> {
    let stmt = tx
        .prepare("INSERT INTO items (id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING;")
        .await?;
    let mut inserted = 0;
    for item in items {
        inserted += tx.execute(&stmt, &[&item.id, &item.name]).await? as usize;
    }
    Ok(inserted)
}

async fn insert_plateaus(
    tx: &Transaction<'_>,
    plateaus: &[Plateau],
) -> anyhow::Result<usize> {
    let stmt = tx
        .prepare(
            "INSERT INTO plateaus (id, name, description, max_capacity, allowed_items) \
            VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING;",
        )
        .await?;
    let mut inserted = 0;
    for plateau in plateaus {
        inserted += tx
            .execute(
                &stmt,
                &[
                    &plateau.id,
                    &plateau.name,
                    &plateau.description,
                    &plateau.max_capacity,
                    &plateau.allowed_items,
                ],
            )
            .await? as usize;
    }
    Ok(inserted)
}

fn parse_row_into_item(
    row: &Row,
) -> Item {
    Item {
        id: row.get("id"),
        name: row.get("name"),
    }
}

fn parse_row_into_plateau(
    row: &Row,
) -> Plateau {
    Plateau {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        max_capacity: row.get::<&str, i32>("max_capacity"),
        allowed_items: row.get::<&str, Vec<String>>("allowed_items"),
    }
}

fn parse_row_into_reservation(
    row: &Row,
) -> Reservation {
    Reservation {
        id: row.get("id"),
        plateau_id: row.get("plateau_id"),
        plateau_name: row.get("plateau_name"),
        client_name: row.get("client_name"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        item_ids: row.get::<&str, Vec<String>>("item_ids"),
        created_at: row.get("created_at"),
    }
}
