//! Resolves a display name to a portrait URL via entity search and claims lookup.
//!
//! The first search hit is taken as-is. Lookup failures of any kind are folded
//! into `Resolution::NotFound` so a single bad entity never stops a batch.

use log::debug;
use serde_json::Value;

use crate::config::LookupConfig;
use crate::http_transport::HttpTransport;
use crate::protocol::{NotFoundReason, ResolvedImage, Resolution};

pub struct EntityResolver<'a> {
    transport: &'a dyn HttpTransport,
    lookup: &'a LookupConfig,
}

impl<'a> EntityResolver<'a> {
    pub fn new(transport: &'a dyn HttpTransport, lookup: &'a LookupConfig) -> Self {
        Self { transport, lookup }
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}?action=wbsearchentities&search={}&language={}&format=json",
            self.lookup.search_api_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.lookup.language)
        )
    }

    pub fn entity_data_url(&self, entity_id: &str) -> String {
        format!(
            "{}/{}.json",
            self.lookup.entity_data_url.trim_end_matches('/'),
            urlencoding::encode(entity_id)
        )
    }

    /// Media URL for a claim's file name; spaces become underscores.
    pub fn media_url(&self, file_name: &str) -> String {
        let underscored = file_name.trim().replace(' ', "_");
        format!(
            "{}/{}",
            self.lookup.media_file_path_url.trim_end_matches('/'),
            urlencoding::encode(&underscored)
        )
    }

    /// Never fails: every error path ends in `Resolution::NotFound`.
    pub fn resolve(&self, display_name: &str) -> Resolution {
        let resolution = self
            .try_resolve(display_name)
            .unwrap_or_else(|message| Resolution::NotFound(NotFoundReason::LookupFailed(message)));
        if let Resolution::NotFound(reason) = &resolution {
            debug!("Resolve['{}']: no image ({})", display_name, reason);
        }
        resolution
    }

    fn try_resolve(&self, display_name: &str) -> Result<Resolution, String> {
        let search_url = self.search_url(display_name);
        debug!("Resolve['{}']: searching {}", display_name, search_url);
        let search = self
            .transport
            .get_json(&search_url)
            .map_err(|failure| format!("search request failed: {failure}"))?;
        let Some(entity_id) = Self::first_search_result_id(&search)? else {
            return Ok(Resolution::NotFound(NotFoundReason::NoSearchResult));
        };

        let entity_url = self.entity_data_url(&entity_id);
        debug!(
            "Resolve['{}']: first result {} -> {}",
            display_name, entity_id, entity_url
        );
        let record = self
            .transport
            .get_json(&entity_url)
            .map_err(|failure| format!("entity request for {entity_id} failed: {failure}"))?;
        let claims = Self::entity_claims(&record, &entity_id)?;

        let Some(file_name) = self.image_file_name(claims)? else {
            return Ok(Resolution::NotFound(NotFoundReason::NoImageClaim { entity_id }));
        };
        let url = self.media_url(&file_name);
        debug!("Resolve['{}']: image '{}' -> {}", display_name, file_name, url);
        Ok(Resolution::Found(ResolvedImage { url }))
    }

    fn first_search_result_id(search: &Value) -> Result<Option<String>, String> {
        let results = search["search"]
            .as_array()
            .ok_or_else(|| "search response has no 'search' array".to_string())?;
        let Some(first) = results.first() else {
            return Ok(None);
        };
        first["id"]
            .as_str()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| Some(id.to_string()))
            .ok_or_else(|| "first search result has no id".to_string())
    }

    fn entity_claims<'v>(record: &'v Value, entity_id: &str) -> Result<&'v Value, String> {
        let entities = record["entities"]
            .as_object()
            .ok_or_else(|| format!("entity record for {entity_id} has no 'entities' map"))?;
        // Redirected ids come back keyed by their merge target.
        let entity = entities.get(entity_id).or_else(|| {
            (entities.len() == 1)
                .then(|| entities.values().next())
                .flatten()
        });
        let claims = entity
            .map(|entity| &entity["claims"])
            .ok_or_else(|| format!("entity record does not contain {entity_id}"))?;
        if !claims.is_object() {
            return Err(format!("entity {entity_id} has no claims map"));
        }
        Ok(claims)
    }

    fn image_file_name(&self, claims: &Value) -> Result<Option<String>, String> {
        let Some(statements) = claims[self.lookup.image_property.as_str()].as_array() else {
            return Ok(None);
        };
        let Some(first) = statements.first() else {
            return Ok(None);
        };
        first["mainsnak"]["datavalue"]["value"]
            .as_str()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Some(value.to_string()))
            .ok_or_else(|| {
                format!(
                    "{} claim has no string value",
                    self.lookup.image_property
                )
            })
    }
}

#[cfg(test)]
pub mod test_fixtures {
    use serde_json::{json, Value};

    pub fn search_response(ids: &[&str]) -> Value {
        let results: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "id": id, "label": "label", "concepturi": format!("http://www.wikidata.org/entity/{id}") }))
            .collect();
        json!({ "searchinfo": { "search": "query" }, "search": results, "success": 1 })
    }

    pub fn entity_record_with_image(entity_id: &str, file_name: &str) -> Value {
        entity_record_with_images(entity_id, &[file_name])
    }

    /// Record carrying one `P18` statement per file name, in the given order.
    pub fn entity_record_with_images(entity_id: &str, file_names: &[&str]) -> Value {
        let statements: Vec<Value> = file_names
            .iter()
            .map(|file_name| {
                json!({
                    "mainsnak": {
                        "snaktype": "value",
                        "property": "P18",
                        "datavalue": { "value": file_name, "type": "string" }
                    },
                    "rank": "normal"
                })
            })
            .collect();
        json!({
            "entities": {
                entity_id: {
                    "id": entity_id,
                    "claims": { "P18": statements }
                }
            }
        })
    }

    pub fn entity_record_without_image(entity_id: &str) -> Value {
        json!({
            "entities": {
                entity_id: {
                    "id": entity_id,
                    "claims": {
                        "P31": [ { "mainsnak": { "datavalue": { "value": { "id": "Q5" } } } } ]
                    }
                }
            }
        })
    }
}
