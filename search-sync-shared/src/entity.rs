//! Entity model shared across the sync engine.
//!
//! Snapshots mirror the authoritative store's entities at event time, with
//! references (owner, service, parents) already resolved by the store. The
//! engine consumes them read-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Every entity kind the engine knows about.
///
/// Indexed kinds own a search index and a document builder. Cascade-only
/// kinds (services, databases, schemas, glossaries, classifications, test
/// suites, domains) have no index of their own; their lifecycle events fan
/// out to dependent documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Table,
    Topic,
    Dashboard,
    Pipeline,
    #[serde(rename = "mlmodel")]
    MlModel,
    Container,
    Query,
    GlossaryTerm,
    Tag,
    User,
    Team,
    TestCase,
    DataProduct,
    Database,
    DatabaseSchema,
    DatabaseService,
    MessagingService,
    DashboardService,
    PipelineService,
    #[serde(rename = "mlmodelService")]
    MlModelService,
    StorageService,
    Glossary,
    Classification,
    TestSuite,
    Domain,
}

impl EntityType {
    /// All entity kinds that own a search index, in a fixed order.
    pub const INDEXED: [EntityType; 13] = [
        EntityType::Table,
        EntityType::Topic,
        EntityType::Dashboard,
        EntityType::Pipeline,
        EntityType::MlModel,
        EntityType::Container,
        EntityType::Query,
        EntityType::GlossaryTerm,
        EntityType::Tag,
        EntityType::User,
        EntityType::Team,
        EntityType::TestCase,
        EntityType::DataProduct,
    ];

    /// The search index backing this entity kind, or `None` for
    /// cascade-only kinds.
    pub fn index_name(&self) -> Option<&'static str> {
        match self {
            EntityType::Table => Some("table_search_index"),
            EntityType::Topic => Some("topic_search_index"),
            EntityType::Dashboard => Some("dashboard_search_index"),
            EntityType::Pipeline => Some("pipeline_search_index"),
            EntityType::MlModel => Some("mlmodel_search_index"),
            EntityType::Container => Some("container_search_index"),
            EntityType::Query => Some("query_search_index"),
            EntityType::GlossaryTerm => Some("glossary_search_index"),
            EntityType::Tag => Some("tag_search_index"),
            EntityType::User => Some("user_search_index"),
            EntityType::Team => Some("team_search_index"),
            EntityType::TestCase => Some("test_case_search_index"),
            EntityType::DataProduct => Some("data_product_search_index"),
            _ => None,
        }
    }

    /// The camelCase name used in documents and logs (`glossaryTerm`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Table => "table",
            EntityType::Topic => "topic",
            EntityType::Dashboard => "dashboard",
            EntityType::Pipeline => "pipeline",
            EntityType::MlModel => "mlmodel",
            EntityType::Container => "container",
            EntityType::Query => "query",
            EntityType::GlossaryTerm => "glossaryTerm",
            EntityType::Tag => "tag",
            EntityType::User => "user",
            EntityType::Team => "team",
            EntityType::TestCase => "testCase",
            EntityType::DataProduct => "dataProduct",
            EntityType::Database => "database",
            EntityType::DatabaseSchema => "databaseSchema",
            EntityType::DatabaseService => "databaseService",
            EntityType::MessagingService => "messagingService",
            EntityType::DashboardService => "dashboardService",
            EntityType::PipelineService => "pipelineService",
            EntityType::MlModelService => "mlmodelService",
            EntityType::StorageService => "storageService",
            EntityType::Glossary => "glossary",
            EntityType::Classification => "classification",
            EntityType::TestSuite => "testSuite",
            EntityType::Domain => "domain",
        }
    }

    /// Whether this kind is a service container (database, messaging,
    /// dashboard, pipeline, ML model or storage service).
    pub fn is_service(&self) -> bool {
        matches!(
            self,
            EntityType::DatabaseService
                | EntityType::MessagingService
                | EntityType::DashboardService
                | EntityType::PipelineService
                | EntityType::MlModelService
                | EntityType::StorageService
        )
    }

    /// The index holding the documents a service's lifecycle cascades onto.
    pub fn service_child_index(&self) -> Option<&'static str> {
        match self {
            EntityType::DatabaseService => EntityType::Table.index_name(),
            EntityType::MessagingService => EntityType::Topic.index_name(),
            EntityType::DashboardService => EntityType::Dashboard.index_name(),
            EntityType::PipelineService => EntityType::Pipeline.index_name(),
            EntityType::MlModelService => EntityType::MlModel.index_name(),
            EntityType::StorageService => EntityType::Container.index_name(),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved reference to another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl EntityRef {
    pub fn new(id: Uuid, entity_type: EntityType, name: impl Into<String>) -> Self {
        Self {
            id,
            entity_type,
            name: name.into(),
            display_name: None,
            fully_qualified_name: None,
            deleted: false,
        }
    }

    pub fn with_fqn(mut self, fqn: impl Into<String>) -> Self {
        self.fully_qualified_name = Some(fqn.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// A tag or glossary-term label attached to an entity or column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagLabel {
    #[serde(rename = "tagFQN")]
    pub tag_fqn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TagLabel {
    pub fn new(tag_fqn: impl Into<String>) -> Self {
        Self {
            tag_fqn: tag_fqn.into(),
            description: None,
        }
    }
}

/// A nested, possibly hierarchical field: a table or data-model column, or
/// a message-schema field. Children nest arbitrarily deep; the containment
/// tree has no cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagLabel>,
    #[serde(default)]
    pub children: Vec<Column>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: None,
            data_type: None,
            tags: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// Fields common to every entity snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCore {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityRef>,
    #[serde(default)]
    pub followers: Vec<EntityRef>,
    #[serde(default)]
    pub tags: Vec<TagLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityCore {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            display_name: None,
            fully_qualified_name: None,
            description: None,
            deleted: false,
            owner: None,
            followers: Vec::new(),
            tags: Vec::new(),
            updated_at: None,
        }
    }
}

/// The message schema attached to a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_text: Option<String>,
    #[serde(default)]
    pub schema_fields: Vec<Column>,
}

/// A dashboard's chart or data-model reference.
pub type ChartRef = EntityRef;

/// A single task inside a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTask {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagLabel>,
}

/// A single feature of an ML model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlFeature {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagLabel>,
}

/// The columnar data model of a storage container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDataModel {
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// The test suite a test case belongs to, with the executable flag the
/// deletion path branches on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteRef {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(flatten)]
    pub core: EntityCore,
    pub service: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_schema: Option<EntityRef>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_summary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(flatten)]
    pub core: EntityCore,
    pub service: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_schema: Option<TopicSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(flatten)]
    pub core: EntityCore,
    pub service: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(default)]
    pub charts: Vec<ChartRef>,
    #[serde(default)]
    pub data_models: Vec<ChartRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_summary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    #[serde(flatten)]
    pub core: EntityCore,
    pub service: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(default)]
    pub tasks: Vec<PipelineTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlModel {
    #[serde(flatten)]
    pub core: EntityCore,
    pub service: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub ml_features: Vec<MlFeature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(flatten)]
    pub core: EntityCore,
    pub service: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_model: Option<ContainerDataModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

/// A saved SQL query asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAsset {
    #[serde(flatten)]
    pub core: EntityCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub query_used_in: Vec<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryTerm {
    #[serde(flatten)]
    pub core: EntityCore,
    pub glossary: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityRef>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub related_terms: Vec<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(flatten)]
    pub core: EntityCore,
    pub classification: EntityRef,
    #[serde(default)]
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub core: EntityCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub teams: Vec<EntityRef>,
    #[serde(default)]
    pub roles: Vec<EntityRef>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(flatten)]
    pub core: EntityCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_type: Option<String>,
    #[serde(default)]
    pub users: Vec<EntityRef>,
    #[serde(default)]
    pub default_roles: Vec<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(flatten)]
    pub core: EntityCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_link: Option<String>,
    #[serde(rename = "entityFQN", skip_serializing_if = "Option::is_none")]
    pub entity_fqn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_suite: Option<TestSuiteRef>,
    #[serde(default)]
    pub test_suites: Vec<TestSuiteRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProduct {
    #[serde(flatten)]
    pub core: EntityCore,
    pub domain: EntityRef,
    #[serde(default)]
    pub assets: Vec<EntityRef>,
    #[serde(default)]
    pub experts: Vec<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(flatten)]
    pub core: EntityCore,
    pub service: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSchema {
    #[serde(flatten)]
    pub core: EntityCore,
    pub service: EntityRef,
    pub database: EntityRef,
}

/// Snapshot shared by all six service kinds; the event's `EntityType`
/// distinguishes the family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(flatten)]
    pub core: EntityCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Glossary {
    #[serde(flatten)]
    pub core: EntityCore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    #[serde(flatten)]
    pub core: EntityCore,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    #[serde(flatten)]
    pub core: EntityCore,
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub tests: Vec<EntityRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    #[serde(flatten)]
    pub core: EntityCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_type: Option<String>,
}

/// A typed entity snapshot carried by a change event.
#[derive(Debug, Clone, PartialEq)]
pub enum EntitySnapshot {
    Table(Table),
    Topic(Topic),
    Dashboard(Dashboard),
    Pipeline(Pipeline),
    MlModel(MlModel),
    Container(Container),
    Query(QueryAsset),
    GlossaryTerm(GlossaryTerm),
    Tag(Tag),
    User(User),
    Team(Team),
    TestCase(TestCase),
    DataProduct(DataProduct),
    Database(Database),
    DatabaseSchema(DatabaseSchema),
    Service(Service),
    Glossary(Glossary),
    Classification(Classification),
    TestSuite(TestSuite),
    Domain(Domain),
}

impl EntitySnapshot {
    /// The common core fields every snapshot carries.
    pub fn core(&self) -> &EntityCore {
        match self {
            EntitySnapshot::Table(e) => &e.core,
            EntitySnapshot::Topic(e) => &e.core,
            EntitySnapshot::Dashboard(e) => &e.core,
            EntitySnapshot::Pipeline(e) => &e.core,
            EntitySnapshot::MlModel(e) => &e.core,
            EntitySnapshot::Container(e) => &e.core,
            EntitySnapshot::Query(e) => &e.core,
            EntitySnapshot::GlossaryTerm(e) => &e.core,
            EntitySnapshot::Tag(e) => &e.core,
            EntitySnapshot::User(e) => &e.core,
            EntitySnapshot::Team(e) => &e.core,
            EntitySnapshot::TestCase(e) => &e.core,
            EntitySnapshot::DataProduct(e) => &e.core,
            EntitySnapshot::Database(e) => &e.core,
            EntitySnapshot::DatabaseSchema(e) => &e.core,
            EntitySnapshot::Service(e) => &e.core,
            EntitySnapshot::Glossary(e) => &e.core,
            EntitySnapshot::Classification(e) => &e.core,
            EntitySnapshot::TestSuite(e) => &e.core,
            EntitySnapshot::Domain(e) => &e.core,
        }
    }

    pub fn id(&self) -> Uuid {
        self.core().id
    }

    pub fn name(&self) -> &str {
        &self.core().name
    }

    pub fn fully_qualified_name(&self) -> Option<&str> {
        self.core().fully_qualified_name.as_deref()
    }
}
