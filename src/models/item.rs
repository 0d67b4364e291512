use serde::{Deserialize, Serialize};

/// Equipment that can be booked alongside a plateau.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
}
