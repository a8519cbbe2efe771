//! Knowledge store records and entity search shaping

use serde::{Deserialize, Deserializer, Serialize};

/// Default number of entities requested when the caller gives no limit
pub const DEFAULT_ENTITY_LIMIT: u32 = 20;

/// Type filter value meaning "every type"
pub const ALL_TYPES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "type")]
    pub relation_type: String,
    pub target_id: String,
}

/// Entity extracted by the backend's knowledge graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<Relation>>,
}

/// Summary produced by the backend's summarizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source_count: u32,
    #[serde(default)]
    pub created_at: String,
}

/// Entity search as accepted by the gateway (`/memory/entities`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EntityQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(rename = "type", default)]
    pub entity_type: Option<String>,
    /// Blank or non-numeric values count as unset
    #[serde(default, deserialize_with = "lenient_limit")]
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLimit {
    Number(u32),
    Text(String),
}

fn lenient_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(match Option::<RawLimit>::deserialize(deserializer)? {
        Some(RawLimit::Number(limit)) => Some(limit),
        Some(RawLimit::Text(raw)) => raw.trim().parse().ok(),
        None => None,
    })
}

impl EntityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn of_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn text_filter(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    fn type_filter(&self) -> Option<&str> {
        self.entity_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != ALL_TYPES)
    }

    fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_ENTITY_LIMIT)
    }

    /// Query string sent by the dashboard to the gateway
    pub fn gateway_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(3);
        if let Some(q) = self.text_filter() {
            params.push(("q", q.to_string()));
        }
        if let Some(t) = self.type_filter() {
            params.push(("type", t.to_string()));
        }
        params.push(("limit", self.effective_limit().to_string()));
        params
    }

    /// Query string forwarded by the gateway to the backend.
    ///
    /// The `all` type is never forwarded and the limit defaults to 20.
    pub fn backend_params(&self, user_id: &str) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(4);
        params.push(("user_id", user_id.to_string()));
        if let Some(q) = self.text_filter() {
            params.push(("q", q.to_string()));
        }
        if let Some(t) = self.type_filter() {
            params.push(("ent_type", t.to_string()));
        }
        params.push(("limit", self.effective_limit().to_string()));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(params: &[(&'static str, String)]) -> Vec<&'static str> {
        params.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn all_type_is_not_forwarded() {
        let params = EntityQuery::new().of_type("all").backend_params("local");
        assert_eq!(keys(&params), vec!["user_id", "limit"]);
    }

    #[test]
    fn limit_defaults_to_twenty() {
        let params = EntityQuery::new().backend_params("local");
        assert_eq!(params.last(), Some(&("limit", "20".to_string())));
    }

    #[test]
    fn filters_are_forwarded_when_set() {
        let params = EntityQuery::new()
            .text("acme")
            .of_type("organization")
            .limit(5)
            .backend_params("local");

        assert_eq!(
            params,
            vec![
                ("user_id", "local".to_string()),
                ("q", "acme".to_string()),
                ("ent_type", "organization".to_string()),
                ("limit", "5".to_string()),
            ]
        );
    }

    #[test]
    fn blank_text_is_dropped() {
        let params = EntityQuery::new().text("   ").gateway_params();
        assert_eq!(keys(&params), vec!["limit"]);
    }

    #[test]
    fn empty_limit_falls_back_to_default() {
        let query: EntityQuery =
            serde_json::from_value(serde_json::json!({ "q": "", "type": "", "limit": "" })).unwrap();
        assert_eq!(query.limit, None);
        assert_eq!(keys(&query.backend_params("local")), vec!["user_id", "limit"]);

        let query: EntityQuery = serde_json::from_value(serde_json::json!({ "limit": "7" })).unwrap();
        assert_eq!(query.limit, Some(7));

        let query: EntityQuery = serde_json::from_value(serde_json::json!({ "limit": 5 })).unwrap();
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn entity_wire_names_use_type() {
        let entity: Entity = serde_json::from_value(serde_json::json!({
            "id": "ent-1",
            "type": "person",
            "name": "Ada",
            "relations": [{ "type": "works_at", "target_id": "ent-2" }]
        }))
        .unwrap();

        assert_eq!(entity.entity_type, "person");
        assert_eq!(entity.relations.unwrap()[0].relation_type, "works_at");
    }
}
