//! OpenSearch index settings and mappings.
//!
//! One mapping per indexed entity type: common searchable properties plus
//! the type's nested structures and secondary suggesters. Mappings are
//! versioned here and re-applied idempotently at startup.

use serde_json::{json, Value};

use crate::config::LanguageAnalyzer;
use search_sync_shared::EntityType;

/// Analysis settings shared by every index: an edge-ngram analyzer for the
/// `.ngram` subfields plus the configured language analyzer for text.
fn index_settings() -> Value {
    json!({
        "number_of_shards": 1,
        "number_of_replicas": 1,
        "analysis": {
            "analyzer": {
                "sync_ngram": {
                    "type": "custom",
                    "tokenizer": "standard",
                    "filter": ["lowercase", "sync_edge_ngram"]
                }
            },
            "filter": {
                "sync_edge_ngram": {
                    "type": "edge_ngram",
                    "min_gram": 2,
                    "max_gram": 10
                }
            }
        }
    })
}

/// A text property with keyword and ngram subfields.
fn searchable_text(analyzer: LanguageAnalyzer) -> Value {
    json!({
        "type": "text",
        "analyzer": analyzer.analyzer_name(),
        "fields": {
            "keyword": { "type": "keyword", "ignore_above": 256 },
            "ngram": { "type": "text", "analyzer": "sync_ngram" }
        }
    })
}

/// A plain analyzed text property.
fn analyzed_text(analyzer: LanguageAnalyzer) -> Value {
    json!({ "type": "text", "analyzer": analyzer.analyzer_name() })
}

/// Tag-label list shape shared by `tags` and `tier`.
fn tag_label_properties() -> Value {
    json!({
        "properties": {
            "tagFQN": { "type": "keyword" },
            "description": { "type": "text" }
        }
    })
}

/// A completion suggester field. The primary suggester carries a `deleted`
/// category context so suggestions can be scoped to live documents.
fn completion_field(with_deleted_context: bool) -> Value {
    if with_deleted_context {
        json!({
            "type": "completion",
            "contexts": [ { "name": "deleted", "type": "category" } ]
        })
    } else {
        json!({ "type": "completion" })
    }
}

/// Nested column/field shape used by tables, containers and topics.
fn column_properties(analyzer: LanguageAnalyzer) -> Value {
    json!({
        "properties": {
            "name": searchable_text(analyzer),
            "displayName": searchable_text(analyzer),
            "description": analyzed_text(analyzer),
            "dataType": { "type": "keyword" },
            "tags": tag_label_properties(),
            "children": {
                "properties": {
                    "name": searchable_text(analyzer),
                    "description": analyzed_text(analyzer)
                }
            }
        }
    })
}

/// Entity-reference shape (owner, service, parents).
fn reference_properties(analyzer: LanguageAnalyzer) -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "type": { "type": "keyword" },
            "name": searchable_text(analyzer),
            "displayName": searchable_text(analyzer),
            "fullyQualifiedName": { "type": "keyword" },
            "deleted": { "type": "boolean" }
        }
    })
}

/// The full settings-and-mappings body for one entity type's index.
pub fn index_mapping(entity_type: EntityType, analyzer: LanguageAnalyzer) -> Value {
    let mut properties = json!({
        "id": { "type": "keyword" },
        "name": searchable_text(analyzer),
        "displayName": searchable_text(analyzer),
        "fullyQualifiedName": { "type": "keyword" },
        "description": searchable_text(analyzer),
        "deleted": { "type": "boolean" },
        "entityType": { "type": "keyword", "fields": { "keyword": { "type": "keyword" } } },
        "serviceType": { "type": "keyword" },
        "tags": tag_label_properties(),
        "tier": tag_label_properties(),
        "followers": { "type": "keyword" },
        "owner": reference_properties(analyzer),
        "service": reference_properties(analyzer),
        "suggest": completion_field(true),
        "updatedAt": { "type": "date" }
    });

    let extra = match entity_type {
        EntityType::Table => json!({
            "columns": column_properties(analyzer),
            "database": reference_properties(analyzer),
            "databaseSchema": reference_properties(analyzer),
            "column_suggest": completion_field(false),
            "service_suggest": completion_field(false)
        }),
        EntityType::Topic => json!({
            "messageSchema": {
                "properties": {
                    "schemaText": { "type": "text", "index": false },
                    "schemaFields": column_properties(analyzer)
                }
            },
            "field_suggest": completion_field(false),
            "service_suggest": completion_field(false)
        }),
        EntityType::Dashboard => json!({
            "charts": reference_properties(analyzer),
            "dataModels": reference_properties(analyzer),
            "chart_suggest": completion_field(false),
            "service_suggest": completion_field(false)
        }),
        EntityType::Pipeline => json!({
            "tasks": {
                "properties": {
                    "name": searchable_text(analyzer),
                    "displayName": searchable_text(analyzer),
                    "description": analyzed_text(analyzer),
                    "tags": tag_label_properties()
                }
            },
            "task_suggest": completion_field(false),
            "service_suggest": completion_field(false)
        }),
        EntityType::MlModel => json!({
            "algorithm": { "type": "keyword" },
            "mlFeatures": {
                "properties": {
                    "name": searchable_text(analyzer),
                    "description": analyzed_text(analyzer),
                    "tags": tag_label_properties()
                }
            },
            "service_suggest": completion_field(false)
        }),
        EntityType::Container => json!({
            "parent": reference_properties(analyzer),
            "dataModel": { "properties": { "columns": column_properties(analyzer) } },
            "column_suggest": completion_field(false),
            "service_suggest": completion_field(false)
        }),
        EntityType::Query => json!({
            "query": searchable_text(analyzer),
            "queryUsedIn": reference_properties(analyzer)
        }),
        EntityType::GlossaryTerm => json!({
            "glossary": reference_properties(analyzer),
            "parent": reference_properties(analyzer),
            "synonyms": searchable_text(analyzer),
            "relatedTerms": reference_properties(analyzer)
        }),
        EntityType::Tag => json!({
            "classification": reference_properties(analyzer),
            "disabled": { "type": "boolean" },
            "usageCount": { "type": "long" }
        }),
        EntityType::User => json!({
            "email": { "type": "keyword" },
            "teams": reference_properties(analyzer),
            "roles": reference_properties(analyzer),
            "isAdmin": { "type": "boolean" },
            "isBot": { "type": "boolean" }
        }),
        EntityType::Team => json!({
            "teamType": { "type": "keyword" },
            "users": reference_properties(analyzer),
            "defaultRoles": reference_properties(analyzer)
        }),
        EntityType::TestCase => json!({
            "entityLink": { "type": "keyword" },
            "entityFQN": { "type": "keyword" },
            "testSuite": reference_properties(analyzer),
            "testSuites": {
                "properties": {
                    "id": { "type": "keyword" },
                    "name": searchable_text(analyzer),
                    "fullyQualifiedName": { "type": "keyword" },
                    "executable": { "type": "boolean" }
                }
            }
        }),
        EntityType::DataProduct => json!({
            "domain": reference_properties(analyzer),
            "assets": reference_properties(analyzer),
            "experts": reference_properties(analyzer)
        }),
        _ => json!({}),
    };

    if let (Value::Object(base), Value::Object(extension)) = (&mut properties, extra) {
        base.extend(extension);
    }

    json!({
        "settings": index_settings(),
        "mappings": { "properties": properties }
    })
}

/// The mappings portion alone, for PUT-mapping updates on an existing
/// index (settings cannot be patched that way).
pub fn mapping_body(entity_type: EntityType, analyzer: LanguageAnalyzer) -> Value {
    index_mapping(entity_type, analyzer)["mappings"].clone()
}
