//! OpenSearch query and script builders.
//!
//! Pure functions producing the JSON bodies the client sends: document
//! filters, painless scripts for merges and flag flips, scan pages, and
//! the per-index interactive search/suggest/aggregate bodies.

use serde_json::{json, Map, Value};

use crate::interfaces::{
    DocumentFilter, DocumentPatch, DocumentScript, SearchOptions, SuggestOptions,
};
use search_sync_shared::EntityType;

/// The single place the merge semantics live: set every key in
/// `params.fields`, then drop every name in `params.removals`.
const MERGE_SCRIPT: &str = "for (k in params.fields.keySet()) { ctx._source[k] = params.fields[k] } for (k in params.removals) { ctx._source.remove(k) }";

/// Maximum buckets returned by a terms aggregation.
const MAX_AGGREGATE_SIZE: u64 = 10_000;

/// Translate an engine-agnostic filter into an OpenSearch query clause.
pub fn filter_query(filter: &DocumentFilter) -> Value {
    match filter {
        DocumentFilter::Term { field, value } => json!({ "term": { (field.as_str()): value } }),
        DocumentFilter::Wildcard { field, pattern } => {
            json!({ "wildcard": { (field.as_str()): pattern } })
        }
        DocumentFilter::IdOrParentId { id } => json!({
            "bool": {
                "should": [
                    { "match": { "id": id.to_string() } },
                    { "match": { "parent.id": id.to_string() } }
                ],
                "minimum_should_match": 1
            }
        }),
    }
}

/// The scripted-merge body for a patch.
pub fn merge_script(patch: &DocumentPatch) -> Value {
    json!({
        "source": MERGE_SCRIPT,
        "lang": "painless",
        "params": {
            "fields": patch.fields(),
            "removals": patch.removals(),
        }
    })
}

/// Script setting a single boolean field.
pub fn flag_script(field: &str, value: bool) -> Value {
    json!({
        "source": format!("ctx._source.{} = params.value", field),
        "lang": "painless",
        "params": { "value": value }
    })
}

/// Script removing entries with a given id from a list-valued field.
/// Iterates in reverse so removal does not shift unvisited indices.
pub fn remove_list_entry_script(field: &str, id: &str) -> Value {
    json!({
        "source": "if (ctx._source[params.field] != null) { for (int i = ctx._source[params.field].size() - 1; i >= 0; i--) { if (ctx._source[params.field][i].id == params.id) { ctx._source[params.field].remove(i) } } }",
        "lang": "painless",
        "params": { "field": field, "id": id }
    })
}

/// Translate a `DocumentScript` into its OpenSearch script body.
pub fn document_script(script: &DocumentScript) -> Value {
    match script {
        DocumentScript::SetFields(patch) => merge_script(patch),
        DocumentScript::RemoveListEntry { field, id } => {
            remove_list_entry_script(field, &id.to_string())
        }
    }
}

/// Body for one page of a filtered scan. Always tracks exact totals: this
/// body feeds terminating pagination loops.
pub fn scan_body(filter: &DocumentFilter, from: usize, size: usize) -> Value {
    json!({
        "query": filter_query(filter),
        "from": from,
        "size": size,
        "track_total_hits": true,
        "timeout": "60s"
    })
}

/// Per-index boosted fields for the interactive query-string search,
/// mirroring how each entity kind is explored.
fn boosted_fields(index: EntityType) -> Vec<(&'static str, f64)> {
    let mut fields = vec![
        ("displayName", 15.0),
        ("displayName.ngram", 1.0),
        ("name", 15.0),
        ("name.ngram", 1.0),
        ("displayName.keyword", 25.0),
        ("name.keyword", 25.0),
        ("description", 1.0),
        ("description.ngram", 1.0),
    ];
    match index {
        EntityType::Table => {
            fields.push(("columns.name.keyword", 10.0));
            fields.push(("columns.name", 2.0));
            fields.push(("columns.displayName", 2.0));
            fields.push(("columns.description", 1.0));
            fields.push(("columns.children.name", 2.0));
        }
        EntityType::Topic => {
            fields.push(("messageSchema.schemaFields.name", 2.0));
            fields.push(("messageSchema.schemaFields.description", 1.0));
            fields.push(("messageSchema.schemaFields.children.name", 2.0));
        }
        EntityType::Dashboard => {
            fields.push(("charts.name", 2.0));
            fields.push(("charts.description", 1.0));
        }
        EntityType::Pipeline => {
            fields.push(("tasks.name", 2.0));
            fields.push(("tasks.description", 1.0));
        }
        EntityType::MlModel => {
            fields.push(("mlFeatures.name", 2.0));
            fields.push(("mlFeatures.description", 1.0));
        }
        EntityType::Container => {
            fields.push(("dataModel.columns.name", 2.0));
            fields.push(("dataModel.columns.name.keyword", 10.0));
            fields.push(("dataModel.columns.description", 1.0));
            fields.push(("dataModel.columns.children.name", 2.0));
        }
        EntityType::Query => {
            fields.push(("query", 10.0));
        }
        EntityType::GlossaryTerm => {
            fields.push(("synonyms", 5.0));
            fields.push(("glossary.name", 5.0));
            fields.push(("glossary.displayName", 5.0));
        }
        EntityType::TestCase => {
            fields.push(("testSuite.fullyQualifiedName", 10.0));
            fields.push(("testSuite.name", 10.0));
            fields.push(("entityFQN", 10.0));
            fields.push(("entityLink", 3.0));
        }
        EntityType::DataProduct => {
            fields.push(("domain.name", 5.0));
            fields.push(("domain.displayName", 5.0));
        }
        _ => {}
    }
    fields
}

/// The shared facet aggregations attached to every interactive search.
fn default_aggregations() -> Value {
    json!({
        "serviceType": { "terms": { "field": "serviceType", "size": MAX_AGGREGATE_SIZE } },
        "service.name.keyword": { "terms": { "field": "service.name.keyword", "size": MAX_AGGREGATE_SIZE } },
        "entityType.keyword": { "terms": { "field": "entityType.keyword", "size": MAX_AGGREGATE_SIZE } },
        "tier.tagFQN": { "terms": { "field": "tier.tagFQN" } },
        "owner.displayName.keyword": { "terms": { "field": "owner.displayName.keyword", "size": MAX_AGGREGATE_SIZE } },
        "tags.tagFQN": { "terms": { "field": "tags.tagFQN" } }
    })
}

/// Build the interactive search body.
///
/// `parsed_filter` is the raw engine-native filter fragment after the
/// client has parsed (or dropped) it; when present it is merged with the
/// generated query by boolean AND. The `deleted` term is always enforced.
/// Total-hit counting is exact only when requested; interactive callers
/// get the approximate cap for performance.
pub fn build_search_body(
    options: &SearchOptions,
    parsed_filter: Option<Value>,
    approximate_hit_cap: u64,
) -> Value {
    let field_specs: Vec<String> = boosted_fields(options.index)
        .into_iter()
        .map(|(field, boost)| format!("{}^{}", field, boost))
        .collect();

    let base_query = json!({
        "query_string": {
            "query": options.query,
            "fields": field_specs,
            "default_operator": "AND",
            "fuzziness": "AUTO"
        }
    });

    let must = vec![base_query, json!({ "term": { "deleted": options.deleted } })];
    let mut bool_query = Map::new();
    bool_query.insert("must".to_string(), Value::Array(must));
    if let Some(filter) = parsed_filter {
        bool_query.insert("filter".to_string(), json!([filter]));
    }

    let mut body = json!({
        "query": { "bool": bool_query },
        "from": options.from,
        "size": options.size,
        "aggs": default_aggregations(),
        "timeout": "30s"
    });

    if options.exact_hits {
        body["track_total_hits"] = json!(true);
    } else {
        body["track_total_hits"] = json!(approximate_hit_cap);
    }

    if let Some((field, order)) = &options.sort {
        body["sort"] = json!([{ (field.as_str()): { "order": order.as_str() } }]);
    }

    body
}

/// Build the completion-suggest body. The primary `suggest` field is
/// context-filtered by the `deleted` category.
pub fn build_suggest_body(options: &SuggestOptions) -> Value {
    let mut completion = json!({
        "field": options.field,
        "size": options.size,
        "skip_duplicates": true,
        "fuzzy": { "fuzziness": "AUTO" }
    });
    if options.field == "suggest" {
        completion["contexts"] = json!({
            "deleted": [ { "context": options.deleted.to_string() } ]
        });
    }

    json!({
        "suggest": {
            "metadata-suggest": {
                "prefix": options.prefix,
                "completion": completion
            }
        },
        "timeout": "30s"
    })
}

/// Build a terms-aggregation body over one field, bucket-filtered by
/// `value_filter` and optionally scoped by a parsed raw query.
pub fn build_aggregate_body(field: &str, value_filter: &str, parsed_query: Option<Value>) -> Value {
    let query = parsed_query.unwrap_or_else(|| json!({ "match_all": {} }));
    json!({
        "query": { "bool": { "must": [query] } },
        "size": 0,
        "aggs": {
            (field): {
                "terms": {
                    "field": field,
                    "size": MAX_AGGREGATE_SIZE,
                    "include": value_filter,
                    "order": { "_key": "asc" }
                }
            }
        },
        "timeout": "30s"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_term_filter_query() {
        let filter = DocumentFilter::term("service.id", "abc");
        let query = filter_query(&filter);
        assert_eq!(query["term"]["service.id"], "abc");
    }

    #[test]
    fn test_id_or_parent_filter_query() {
        let id = Uuid::new_v4();
        let query = filter_query(&DocumentFilter::id_or_parent(id));

        let should = query["bool"]["should"].as_array().unwrap();
        assert_eq!(should.len(), 2);
        assert_eq!(should[0]["match"]["id"], id.to_string());
        assert_eq!(should[1]["match"]["parent.id"], id.to_string());
        assert_eq!(query["bool"]["minimum_should_match"], 1);
    }

    #[test]
    fn test_merge_script_carries_fields_and_removals() {
        let patch = DocumentPatch::new()
            .set("description", json!("updated"))
            .unset("owner");
        let script = merge_script(&patch);

        assert!(script["source"].as_str().unwrap().contains("params.fields"));
        assert_eq!(script["params"]["fields"]["description"], "updated");
        assert_eq!(script["params"]["removals"][0], "owner");
    }

    #[test]
    fn test_flag_script() {
        let script = flag_script("deleted", true);
        assert_eq!(script["source"], "ctx._source.deleted = params.value");
        assert_eq!(script["params"]["value"], true);
    }

    #[test]
    fn test_scan_body_tracks_exact_totals() {
        let filter = DocumentFilter::term("tags.tagFQN", "PII.Sensitive");
        let body = scan_body(&filter, 50, 50);

        assert_eq!(body["track_total_hits"], true);
        assert_eq!(body["from"], 50);
        assert_eq!(body["size"], 50);
        assert_eq!(body["timeout"], "60s");
    }

    #[test]
    fn test_search_body_caps_totals_by_default() {
        let options = SearchOptions::new(EntityType::Table, "orders");
        let body = build_search_body(&options, None, 10_000);

        assert_eq!(body["track_total_hits"], 10_000);
        assert_eq!(body["timeout"], "30s");
        // deleted defaults to matching live documents
        let must = body["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must[1]["term"]["deleted"], false);
    }

    #[test]
    fn test_search_body_exact_totals_on_request() {
        let options = SearchOptions::new(EntityType::Table, "orders").with_exact_hits();
        let body = build_search_body(&options, None, 10_000);
        assert_eq!(body["track_total_hits"], true);
    }

    #[test]
    fn test_search_body_merges_raw_filter_with_and() {
        let options = SearchOptions::new(EntityType::Table, "orders");
        let fragment = json!({ "term": { "serviceType": "Mysql" } });
        let body = build_search_body(&options, Some(fragment), 10_000);

        let filter = body["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filter[0]["term"]["serviceType"], "Mysql");
        assert!(body["query"]["bool"]["must"].is_array());
    }

    #[test]
    fn test_search_body_boosts_nested_fields_per_index() {
        let table = build_search_body(
            &SearchOptions::new(EntityType::Table, "orders"),
            None,
            10_000,
        );
        let fields = table["query"]["bool"]["must"][0]["query_string"]["fields"]
            .as_array()
            .unwrap();
        assert!(fields.iter().any(|f| f == "columns.name^2"));

        let topic = build_search_body(
            &SearchOptions::new(EntityType::Topic, "clicks"),
            None,
            10_000,
        );
        let fields = topic["query"]["bool"]["must"][0]["query_string"]["fields"]
            .as_array()
            .unwrap();
        assert!(fields.iter().any(|f| f == "messageSchema.schemaFields.name^2"));
    }

    #[test]
    fn test_search_body_sort() {
        let options = SearchOptions::new(EntityType::Table, "orders")
            .with_sort("name.keyword", crate::interfaces::SortOrder::Descending);
        let body = build_search_body(&options, None, 10_000);
        assert_eq!(body["sort"][0]["name.keyword"]["order"], "desc");
    }

    #[test]
    fn test_suggest_body_applies_deleted_context_to_primary_field() {
        let options = SuggestOptions::new(EntityType::Table, "suggest", "ord");
        let body = build_suggest_body(&options);
        let completion = &body["suggest"]["metadata-suggest"]["completion"];
        assert_eq!(completion["contexts"]["deleted"][0]["context"], "false");

        let secondary = SuggestOptions::new(EntityType::Table, "column_suggest", "ord");
        let body = build_suggest_body(&secondary);
        let completion = &body["suggest"]["metadata-suggest"]["completion"];
        assert!(completion.get("contexts").is_none());
    }

    #[test]
    fn test_aggregate_body() {
        let body = build_aggregate_body("tags.tagFQN", "PII.*", None);
        assert_eq!(body["size"], 0);
        assert_eq!(body["aggs"]["tags.tagFQN"]["terms"]["include"], "PII.*");
        assert_eq!(body["query"]["bool"]["must"][0]["match_all"], json!({}));
    }

    #[test]
    fn test_remove_list_entry_script_iterates_in_reverse() {
        let id = Uuid::new_v4();
        let script = remove_list_entry_script("testSuites", &id.to_string());
        assert!(script["source"].as_str().unwrap().contains("i--"));
        assert_eq!(script["params"]["field"], "testSuites");
        assert_eq!(script["params"]["id"], id.to_string());
    }
}
