use serde::{Deserialize, Serialize};

/// User-chosen display order of fridges.
///
/// Serializes as `{"fridgeIds": [...]}`, which is also the body sent to the
/// remote order endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FridgeOrder {
    pub fridge_ids: Vec<String>,
}

impl FridgeOrder {
    pub fn new(fridge_ids: Vec<String>) -> Self {
        Self { fridge_ids }
    }

    pub fn is_empty(&self) -> bool {
        self.fridge_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let order = FridgeOrder::new(vec!["a".into(), "b".into()]);
        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(json, r#"{"fridgeIds":["a","b"]}"#);
    }
}
