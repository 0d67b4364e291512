use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::models::item::Item;
use crate::models::plateau::Plateau;

pub const ITEMS_FILE: &str = "items.json";
pub const PLATEAUS_FILE: &str = "plateaus.json";

#[derive(Deserialize)]
struct ItemsFile {
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct PlateausFile {
    plateaus: Vec<Plateau>,
}

/// Reference data seeded into empty collections at start-up and on reset.
#[derive(Clone, Debug, Default)]
pub struct Fixtures {
    pub items: Vec<Item>,
    pub plateaus: Vec<Plateau>,
}

impl Fixtures {
    pub async fn load(dir: &Path) -> anyhow::Result<Self> {
        let items_path = dir.join(ITEMS_FILE);
        let plateaus_path = dir.join(PLATEAUS_FILE);

        let (items_json, plateaus_json) = futures::try_join!(
            tokio::fs::read_to_string(&items_path),
            tokio::fs::read_to_string(&plateaus_path),
        )
        .with_context(|| format!("Failed to read fixtures from {}", dir.display()))?;

        Self::from_json(&items_json, &plateaus_json)
    }

    pub fn from_json(items_json: &str, plateaus_json: &str) -> anyhow::Result<Self> {
        let items: ItemsFile = serde_json::from_str(items_json).context("Malformed items fixture")?;
        let plateaus: PlateausFile =
            serde_json::from_str(plateaus_json).context("Malformed plateaus fixture")?;

        Ok(Self {
            items: items.items,
            plateaus: plateaus.plateaus,
        })
    }
}
