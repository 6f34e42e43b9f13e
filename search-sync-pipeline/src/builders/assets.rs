//! Document builders for data assets: tables, topics, dashboards,
//! pipelines, ML models, containers and queries.

use serde_json::json;

use crate::builders::support::{
    self, collect_tags, flatten_columns, leaf_suggest, parse_tags, primary_suggest,
    service_suggest, stamp_common,
};
use crate::builders::{snapshot_mismatch, DocumentBuilder};
use crate::errors::PipelineError;
use search_sync_shared::{EntitySnapshot, EntityType, IndexDocument, SuggestEntry};

const EXCLUDED_TABLE_FIELDS: &[&str] = &["sampleData", "changeDescription"];
const EXCLUDED_TOPIC_FIELDS: &[&str] = &["sampleData", "changeDescription"];
const EXCLUDED_DASHBOARD_FIELDS: &[&str] = &["changeDescription"];
const EXCLUDED_PIPELINE_FIELDS: &[&str] = &["changeDescription"];
const EXCLUDED_MLMODEL_FIELDS: &[&str] = &["changeDescription"];
const EXCLUDED_CONTAINER_FIELDS: &[&str] = &["sampleData", "changeDescription"];
const EXCLUDED_QUERY_FIELDS: &[&str] = &["changeDescription"];

pub struct TableDocumentBuilder;

impl DocumentBuilder for TableDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::Table(table) = snapshot else {
            return Err(snapshot_mismatch(EntityType::Table));
        };
        let mut table = table.clone();
        support::normalize_owner(&mut table.core.owner);

        let mut doc = support::base_document(&table, EXCLUDED_TABLE_FIELDS)?;

        let leaves = flatten_columns(&table.columns);
        let parsed = parse_tags(&collect_tags(&table.core.tags, &leaves));

        stamp_common(
            &mut doc,
            "table",
            &table.core,
            &parsed,
            &primary_suggest(&table.core),
        );
        doc.insert_serialized("column_suggest", &leaf_suggest(&leaves));
        doc.insert_serialized("service_suggest", &service_suggest(&table.service));
        doc.insert_serialized("serviceType", &table.service_type);
        Ok(doc)
    }
}

pub struct TopicDocumentBuilder;

impl DocumentBuilder for TopicDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::Topic(topic) = snapshot else {
            return Err(snapshot_mismatch(EntityType::Topic));
        };
        let mut topic = topic.clone();
        support::normalize_owner(&mut topic.core.owner);

        let mut doc = support::base_document(&topic, EXCLUDED_TOPIC_FIELDS)?;

        // Message-schema fields flatten into the secondary suggester; the
        // nested schema itself stays in the document for field search.
        let leaves = topic
            .message_schema
            .as_ref()
            .map(|schema| flatten_columns(&schema.schema_fields))
            .unwrap_or_default();
        let parsed = parse_tags(&collect_tags(&topic.core.tags, &leaves));

        stamp_common(
            &mut doc,
            "topic",
            &topic.core,
            &parsed,
            &primary_suggest(&topic.core),
        );
        doc.insert_serialized("field_suggest", &leaf_suggest(&leaves));
        doc.insert_serialized("service_suggest", &service_suggest(&topic.service));
        doc.insert_serialized("serviceType", &topic.service_type);
        Ok(doc)
    }
}

pub struct DashboardDocumentBuilder;

impl DocumentBuilder for DashboardDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::Dashboard(dashboard) = snapshot else {
            return Err(snapshot_mismatch(EntityType::Dashboard));
        };
        let mut dashboard = dashboard.clone();
        support::normalize_owner(&mut dashboard.core.owner);

        let mut doc = support::base_document(&dashboard, EXCLUDED_DASHBOARD_FIELDS)?;

        let chart_suggest: Vec<SuggestEntry> = dashboard
            .charts
            .iter()
            .map(|chart| {
                SuggestEntry::new(chart.display_name.as_deref().unwrap_or(&chart.name), 5)
            })
            .collect();
        let parsed = parse_tags(&dashboard.core.tags);

        stamp_common(
            &mut doc,
            "dashboard",
            &dashboard.core,
            &parsed,
            &primary_suggest(&dashboard.core),
        );
        doc.insert_serialized("chart_suggest", &chart_suggest);
        doc.insert_serialized("service_suggest", &service_suggest(&dashboard.service));
        doc.insert_serialized("serviceType", &dashboard.service_type);
        Ok(doc)
    }
}

pub struct PipelineDocumentBuilder;

impl DocumentBuilder for PipelineDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::Pipeline(pipeline) = snapshot else {
            return Err(snapshot_mismatch(EntityType::Pipeline));
        };
        let mut pipeline = pipeline.clone();
        support::normalize_owner(&mut pipeline.core.owner);

        let mut doc = support::base_document(&pipeline, EXCLUDED_PIPELINE_FIELDS)?;

        let task_suggest: Vec<SuggestEntry> = pipeline
            .tasks
            .iter()
            .map(|task| SuggestEntry::new(task.display_name.as_deref().unwrap_or(&task.name), 5))
            .collect();
        let mut labels = pipeline.core.tags.clone();
        for task in &pipeline.tasks {
            for tag in &task.tags {
                if !labels.iter().any(|existing| existing.tag_fqn == tag.tag_fqn) {
                    labels.push(tag.clone());
                }
            }
        }
        let parsed = parse_tags(&labels);

        stamp_common(
            &mut doc,
            "pipeline",
            &pipeline.core,
            &parsed,
            &primary_suggest(&pipeline.core),
        );
        doc.insert_serialized("task_suggest", &task_suggest);
        doc.insert_serialized("service_suggest", &service_suggest(&pipeline.service));
        doc.insert_serialized("serviceType", &pipeline.service_type);
        Ok(doc)
    }
}

pub struct MlModelDocumentBuilder;

impl DocumentBuilder for MlModelDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::MlModel(model) = snapshot else {
            return Err(snapshot_mismatch(EntityType::MlModel));
        };
        let mut model = model.clone();
        support::normalize_owner(&mut model.core.owner);

        let mut doc = support::base_document(&model, EXCLUDED_MLMODEL_FIELDS)?;
        let parsed = parse_tags(&model.core.tags);

        stamp_common(
            &mut doc,
            "mlmodel",
            &model.core,
            &parsed,
            &primary_suggest(&model.core),
        );
        doc.insert_serialized("service_suggest", &service_suggest(&model.service));
        doc.insert_serialized("serviceType", &model.service_type);
        Ok(doc)
    }
}

pub struct ContainerDocumentBuilder;

impl DocumentBuilder for ContainerDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::Container(container) = snapshot else {
            return Err(snapshot_mismatch(EntityType::Container));
        };
        let mut container = container.clone();
        support::normalize_owner(&mut container.core.owner);

        let mut doc = support::base_document(&container, EXCLUDED_CONTAINER_FIELDS)?;

        let leaves = container
            .data_model
            .as_ref()
            .map(|model| flatten_columns(&model.columns))
            .unwrap_or_default();
        let parsed = parse_tags(&collect_tags(&container.core.tags, &leaves));

        stamp_common(
            &mut doc,
            "container",
            &container.core,
            &parsed,
            &primary_suggest(&container.core),
        );
        doc.insert_serialized("column_suggest", &leaf_suggest(&leaves));
        doc.insert_serialized("service_suggest", &service_suggest(&container.service));
        doc.insert_serialized("serviceType", &container.service_type);
        Ok(doc)
    }
}

pub struct QueryDocumentBuilder;

impl DocumentBuilder for QueryDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::Query(query) = snapshot else {
            return Err(snapshot_mismatch(EntityType::Query));
        };
        let mut query = query.clone();
        support::normalize_owner(&mut query.core.owner);

        let mut doc = support::base_document(&query, EXCLUDED_QUERY_FIELDS)?;
        let parsed = parse_tags(&query.core.tags);

        stamp_common(
            &mut doc,
            "query",
            &query.core,
            &parsed,
            &primary_suggest(&query.core),
        );
        // Queries have no owning service.
        doc.insert("serviceType", json!(null));
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_sync_shared::entity::{
        Column, EntityCore, EntityRef, Table, TagLabel, Topic, TopicSchema,
    };
    use serde_json::json;
    use uuid::Uuid;

    fn table_snapshot() -> EntitySnapshot {
        let mut core = EntityCore::new(Uuid::new_v4(), "orders");
        core.fully_qualified_name = Some("mysql_prod.sales.public.orders".to_string());
        core.tags = vec![TagLabel::new("Tier.Tier1"), TagLabel::new("PII.Sensitive")];
        core.owner = Some(EntityRef::new(Uuid::new_v4(), EntityType::User, "jdoe"));
        core.followers = vec![EntityRef::new(Uuid::new_v4(), EntityType::User, "asmith")];

        let mut customer = Column::new("customer");
        customer.children.push(Column::new("email"));

        EntitySnapshot::Table(Table {
            core,
            service: EntityRef::new(Uuid::new_v4(), EntityType::DatabaseService, "mysql_prod"),
            service_type: Some("Mysql".to_string()),
            database: None,
            database_schema: None,
            columns: vec![Column::new("id"), customer],
            sample_data: Some(json!({"rows": [[1, "a"]]})),
            usage_summary: None,
            change_description: Some(json!({"fieldsUpdated": []})),
        })
    }

    #[test]
    fn test_table_document_synthetic_fields() {
        let doc = TableDocumentBuilder.build(&table_snapshot()).unwrap();

        assert_eq!(doc.get("entityType").unwrap(), "table");
        assert_eq!(doc.get("serviceType").unwrap(), "Mysql");
        assert_eq!(doc.get("deleted").unwrap(), false);
        assert_eq!(doc.get("displayName").unwrap(), "orders");
        assert_eq!(doc.get("tier").unwrap()["tagFQN"], "Tier.Tier1");
        let tags = doc.get("tags").unwrap().as_array().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0]["tagFQN"], "PII.Sensitive");
        assert_eq!(doc.get("followers").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_table_document_strips_non_indexable_fields() {
        let doc = TableDocumentBuilder.build(&table_snapshot()).unwrap();
        assert!(!doc.contains_key("sampleData"));
        assert!(!doc.contains_key("changeDescription"));
        // Columns stay in the document for field-level search.
        assert!(doc.contains_key("columns"));
    }

    #[test]
    fn test_table_suggest_entries() {
        let doc = TableDocumentBuilder.build(&table_snapshot()).unwrap();

        let suggest = doc.get("suggest").unwrap().as_array().unwrap();
        assert_eq!(suggest[0]["input"], "mysql_prod.sales.public.orders");
        assert_eq!(suggest[0]["weight"], 5);
        assert_eq!(suggest[1]["input"], "orders");
        assert_eq!(suggest[1]["weight"], 10);

        let column_suggest = doc.get("column_suggest").unwrap().as_array().unwrap();
        let inputs: Vec<&str> = column_suggest
            .iter()
            .map(|entry| entry["input"].as_str().unwrap())
            .collect();
        assert_eq!(inputs, ["id", "customer", "customer.email"]);

        let service_suggest = doc.get("service_suggest").unwrap().as_array().unwrap();
        assert_eq!(service_suggest[0]["input"], "mysql_prod");
    }

    #[test]
    fn test_table_owner_display_name_falls_back_to_name() {
        let doc = TableDocumentBuilder.build(&table_snapshot()).unwrap();
        assert_eq!(doc.get("owner").unwrap()["displayName"], "jdoe");
    }

    #[test]
    fn test_builder_is_deterministic() {
        let snapshot = table_snapshot();
        let first = serde_json::to_vec(&TableDocumentBuilder.build(&snapshot).unwrap()).unwrap();
        let second = serde_json::to_vec(&TableDocumentBuilder.build(&snapshot).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_builder_rejects_foreign_snapshot() {
        let snapshot = table_snapshot();
        let result = TopicDocumentBuilder.build(&snapshot);
        assert!(matches!(result, Err(PipelineError::BuilderError(_))));
    }

    #[test]
    fn test_topic_document_flattens_schema_fields() {
        let mut core = EntityCore::new(Uuid::new_v4(), "clickstream");
        core.display_name = Some("Click Stream".to_string());

        let mut payload = Column::new("payload");
        payload.children.push(Column::new("userId"));

        let snapshot = EntitySnapshot::Topic(Topic {
            core,
            service: EntityRef::new(Uuid::new_v4(), EntityType::MessagingService, "kafka_prod"),
            service_type: Some("Kafka".to_string()),
            message_schema: Some(TopicSchema {
                schema_text: None,
                schema_fields: vec![payload],
            }),
            sample_data: None,
            change_description: None,
        });

        let doc = TopicDocumentBuilder.build(&snapshot).unwrap();
        assert_eq!(doc.get("displayName").unwrap(), "Click Stream");
        assert_eq!(doc.get("entityType").unwrap(), "topic");

        let field_suggest = doc.get("field_suggest").unwrap().as_array().unwrap();
        let inputs: Vec<&str> = field_suggest
            .iter()
            .map(|entry| entry["input"].as_str().unwrap())
            .collect();
        assert_eq!(inputs, ["payload", "payload.userId"]);
        // The nested schema stays in the document.
        assert!(doc.contains_key("messageSchema"));
    }
}
