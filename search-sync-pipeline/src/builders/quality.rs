//! Document builder for data-quality test cases.

use crate::builders::support::{self, parse_tags, primary_suggest, stamp_common};
use crate::builders::{snapshot_mismatch, DocumentBuilder};
use crate::errors::PipelineError;
use search_sync_shared::{EntitySnapshot, EntityType, IndexDocument};

const EXCLUDED_TEST_CASE_FIELDS: &[&str] = &["changeDescription"];

pub struct TestCaseDocumentBuilder;

impl DocumentBuilder for TestCaseDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::TestCase(test_case) = snapshot else {
            return Err(snapshot_mismatch(EntityType::TestCase));
        };
        let mut test_case = test_case.clone();
        support::normalize_owner(&mut test_case.core.owner);

        let mut doc = support::base_document(&test_case, EXCLUDED_TEST_CASE_FIELDS)?;
        let parsed = parse_tags(&test_case.core.tags);

        stamp_common(
            &mut doc,
            "testCase",
            &test_case.core,
            &parsed,
            &primary_suggest(&test_case.core),
        );
        Ok(doc)
    }
}
