use serde::{Deserialize, Serialize};

/// A bookable venue. Loaded from fixtures and never modified afterwards.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Plateau {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_capacity: i32,
    #[serde(default)]
    pub allowed_items: Vec<String>,
}

impl Plateau {
    pub fn allows(&self, item_id: &str) -> bool {
        self.allowed_items.iter().any(|allowed| allowed == item_id)
    }

    /// Returns the requested ids this plateau does not allow, in request order.
    pub fn disallowed_items(&self, item_ids: &[String]) -> Vec<String> {
        item_ids
            .iter()
            .filter(|item_id| !self.allows(item_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn court() -> Plateau {
        Plateau {
            id: "p1".into(),
            name: "Court 1".into(),
            description: String::new(),
            max_capacity: 4,
            allowed_items: vec!["A".into(), "B".into()],
        }
    }

    #[test]
    fn disallowed_items_is_empty_for_subset() {
        let plateau = court();
        assert!(plateau.disallowed_items(&[]).is_empty());
        assert!(plateau.disallowed_items(&["B".to_string(), "A".to_string()]).is_empty());
    }

    #[test]
    fn disallowed_items_lists_offenders_in_order() {
        let plateau = court();
        let requested = vec!["C".to_string(), "A".to_string(), "D".to_string()];
        assert_eq!(plateau.disallowed_items(&requested), vec!["C", "D"]);
    }

    #[test]
    fn deserializes_fixture_shape() {
        let plateau: Plateau = serde_json::from_str(
            r#"{"id":"p1","name":"Court 1","maxCapacity":4,"allowedItems":["A"]}"#,
        )
        .unwrap();
        assert_eq!(plateau.max_capacity, 4);
        assert_eq!(plateau.description, "");
        assert!(plateau.allows("A"));
        assert!(!plateau.allows("B"));
    }
}
