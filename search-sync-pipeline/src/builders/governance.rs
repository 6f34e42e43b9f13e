//! Document builders for governance entities: glossary terms, tags and
//! data products.

use crate::builders::support::{self, parse_tags, primary_suggest, stamp_common};
use crate::builders::{snapshot_mismatch, DocumentBuilder};
use crate::errors::PipelineError;
use search_sync_shared::{EntitySnapshot, EntityType, IndexDocument};

const EXCLUDED_GLOSSARY_TERM_FIELDS: &[&str] = &["changeDescription"];
const EXCLUDED_TAG_FIELDS: &[&str] = &["changeDescription"];
const EXCLUDED_DATA_PRODUCT_FIELDS: &[&str] = &["changeDescription"];

pub struct GlossaryTermDocumentBuilder;

impl DocumentBuilder for GlossaryTermDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::GlossaryTerm(term) = snapshot else {
            return Err(snapshot_mismatch(EntityType::GlossaryTerm));
        };
        let mut term = term.clone();
        support::normalize_owner(&mut term.core.owner);

        let mut doc = support::base_document(&term, EXCLUDED_GLOSSARY_TERM_FIELDS)?;
        let parsed = parse_tags(&term.core.tags);

        stamp_common(
            &mut doc,
            "glossaryTerm",
            &term.core,
            &parsed,
            &primary_suggest(&term.core),
        );
        Ok(doc)
    }
}

pub struct TagDocumentBuilder;

impl DocumentBuilder for TagDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::Tag(tag) = snapshot else {
            return Err(snapshot_mismatch(EntityType::Tag));
        };

        let mut doc = support::base_document(tag, EXCLUDED_TAG_FIELDS)?;
        let parsed = parse_tags(&tag.core.tags);

        stamp_common(
            &mut doc,
            "tag",
            &tag.core,
            &parsed,
            &primary_suggest(&tag.core),
        );
        Ok(doc)
    }
}

pub struct DataProductDocumentBuilder;

impl DocumentBuilder for DataProductDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::DataProduct(product) = snapshot else {
            return Err(snapshot_mismatch(EntityType::DataProduct));
        };
        let mut product = product.clone();
        support::normalize_owner(&mut product.core.owner);

        let mut doc = support::base_document(&product, EXCLUDED_DATA_PRODUCT_FIELDS)?;
        let parsed = parse_tags(&product.core.tags);

        stamp_common(
            &mut doc,
            "dataProduct",
            &product.core,
            &parsed,
            &primary_suggest(&product.core),
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_sync_shared::entity::{EntityCore, EntityRef, GlossaryTerm, Tag};
    use uuid::Uuid;

    #[test]
    fn test_glossary_term_document_keeps_parent_and_glossary() {
        let glossary_id = Uuid::new_v4();
        let parent_id = Uuid::new_v4();
        let mut core = EntityCore::new(Uuid::new_v4(), "customer");
        core.fully_qualified_name = Some("business.customer".to_string());

        let snapshot = EntitySnapshot::GlossaryTerm(GlossaryTerm {
            core,
            glossary: EntityRef::new(glossary_id, EntityType::Glossary, "business"),
            parent: Some(EntityRef::new(
                parent_id,
                EntityType::GlossaryTerm,
                "party",
            )),
            synonyms: vec!["client".to_string()],
            related_terms: vec![],
            change_description: None,
        });

        let doc = GlossaryTermDocumentBuilder.build(&snapshot).unwrap();
        assert_eq!(doc.get("entityType").unwrap(), "glossaryTerm");
        assert_eq!(doc.get("glossary").unwrap()["id"], glossary_id.to_string());
        assert_eq!(doc.get("parent").unwrap()["id"], parent_id.to_string());
        assert_eq!(doc.get("synonyms").unwrap()[0], "client");
    }

    #[test]
    fn test_tag_document_carries_classification() {
        let classification_id = Uuid::new_v4();
        let mut core = EntityCore::new(Uuid::new_v4(), "Sensitive");
        core.fully_qualified_name = Some("PII.Sensitive".to_string());

        let snapshot = EntitySnapshot::Tag(Tag {
            core,
            classification: EntityRef::new(classification_id, EntityType::Classification, "PII"),
            disabled: false,
            usage_count: Some(12),
            change_description: None,
        });

        let doc = TagDocumentBuilder.build(&snapshot).unwrap();
        assert_eq!(doc.get("entityType").unwrap(), "tag");
        assert_eq!(
            doc.get("classification").unwrap()["id"],
            classification_id.to_string()
        );
        assert_eq!(doc.get("disabled").unwrap(), false);
        assert_eq!(doc.get("fullyQualifiedName").unwrap(), "PII.Sensitive");
    }
}
