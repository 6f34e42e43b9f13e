//! Document builders for users and teams.

use crate::builders::support::{self, parse_tags, primary_suggest, stamp_common};
use crate::builders::{snapshot_mismatch, DocumentBuilder};
use crate::errors::PipelineError;
use search_sync_shared::{EntitySnapshot, EntityType, IndexDocument};

const EXCLUDED_USER_FIELDS: &[&str] = &["changeDescription"];
const EXCLUDED_TEAM_FIELDS: &[&str] = &["changeDescription"];

pub struct UserDocumentBuilder;

impl DocumentBuilder for UserDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::User(user) = snapshot else {
            return Err(snapshot_mismatch(EntityType::User));
        };

        let mut doc = support::base_document(user, EXCLUDED_USER_FIELDS)?;
        let parsed = parse_tags(&user.core.tags);

        stamp_common(
            &mut doc,
            "user",
            &user.core,
            &parsed,
            &primary_suggest(&user.core),
        );
        Ok(doc)
    }
}

pub struct TeamDocumentBuilder;

impl DocumentBuilder for TeamDocumentBuilder {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError> {
        let EntitySnapshot::Team(team) = snapshot else {
            return Err(snapshot_mismatch(EntityType::Team));
        };

        let mut doc = support::base_document(team, EXCLUDED_TEAM_FIELDS)?;
        let parsed = parse_tags(&team.core.tags);

        stamp_common(
            &mut doc,
            "team",
            &team.core,
            &parsed,
            &primary_suggest(&team.core),
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_sync_shared::entity::{EntityCore, User};
    use uuid::Uuid;

    #[test]
    fn test_user_document() {
        let mut core = EntityCore::new(Uuid::new_v4(), "jdoe");
        core.display_name = Some("Jane Doe".to_string());

        let snapshot = EntitySnapshot::User(User {
            core,
            email: Some("jdoe@example.com".to_string()),
            teams: vec![],
            roles: vec![],
            is_admin: false,
            is_bot: false,
            change_description: None,
        });

        let doc = UserDocumentBuilder.build(&snapshot).unwrap();
        assert_eq!(doc.get("entityType").unwrap(), "user");
        assert_eq!(doc.get("displayName").unwrap(), "Jane Doe");
        assert_eq!(doc.get("email").unwrap(), "jdoe@example.com");
        assert!(!doc.contains_key("changeDescription"));

        let suggest = doc.get("suggest").unwrap().as_array().unwrap();
        assert_eq!(suggest[0]["input"], "Jane Doe");
        assert_eq!(suggest[0]["weight"], 10);
    }
}
