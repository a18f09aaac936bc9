//! Locked editing sessions and their bucket transitions.
//!
//! After `GetFeatureWithLock` succeeds, every locked feature id starts in
//! the `unchanged` bucket. Local edits move ids between buckets until the
//! session is committed or released; a feature id lives in at most one
//! bucket at any time.

use serde::{Deserialize, Serialize};

/// A locally edited feature pending an update under a lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditedFeature {
    pub id: String,
    /// Serialized feature payload, GeoJSON in practice.
    pub feature: String,
    /// True when only scalar properties changed; the commit then omits
    /// the geometry from the update.
    pub properties_only: bool,
}

/// A locally created feature pending an insert under a lock. Inserts
/// always ship their geometry, so no properties-only flag exists here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedFeature {
    pub id: String,
    /// Serialized feature payload, GeoJSON in practice.
    pub feature: String,
}

/// One locked editing session against a feature type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSession {
    /// Store-assigned identifier, set when the session is created.
    pub id: String,
    /// Lock token granted by the server.
    pub lock_id: String,
    /// Human-facing name shown in listings.
    pub lock_name: String,
    pub type_name: String,
    pub srs_name: String,
    /// Requested lock lifetime in minutes.
    pub expiry: u32,
    /// End of life, epoch milliseconds. Computed when the session is
    /// created.
    pub eol: u64,
    /// Locked ids with no local edits yet.
    pub unchanged: Vec<String>,
    pub updated: Vec<EditedFeature>,
    pub inserted: Vec<InsertedFeature>,
    pub deleted: Vec<String>,
    pub time_stamp: Option<String>,
    pub number_matched: Option<String>,
    pub number_returned: Option<String>,
}

impl LockSession {
    /// Records a local edit. An unchanged feature moves to `updated`; a
    /// feature already pending an update or an insert is replaced in its
    /// own bucket. Returns false when the session does not track the id.
    pub fn record_update(&mut self, feature: EditedFeature) -> bool {
        if let Some(pos) = self.unchanged.iter().position(|id| id == &feature.id) {
            self.unchanged.remove(pos);
            self.updated.push(feature);
            return true;
        }
        if let Some(pos) = self.updated.iter().position(|e| e.id == feature.id) {
            // Once any pending edit touched the geometry, the commit must
            // keep shipping it, so the flag only ever narrows to false.
            let properties_only = self.updated[pos].properties_only && feature.properties_only;
            self.updated[pos] = EditedFeature {
                properties_only,
                ..feature
            };
            return true;
        }
        if let Some(pos) = self.inserted.iter().position(|e| e.id == feature.id) {
            self.inserted[pos] = InsertedFeature {
                id: feature.id,
                feature: feature.feature,
            };
            return true;
        }
        false
    }

    /// Records a locally created feature. A second insert under the same
    /// id replaces the pending one.
    pub fn record_insert(&mut self, feature: InsertedFeature) {
        if let Some(pos) = self.inserted.iter().position(|e| e.id == feature.id) {
            self.inserted[pos] = feature;
        } else {
            self.inserted.push(feature);
        }
    }

    /// Records a local removal. Unchanged and updated features move to
    /// `deleted`; a pending insert is simply dropped, since the server
    /// never saw it. Returns false when the session does not track the
    /// id.
    pub fn record_removal(&mut self, id: &str) -> bool {
        if let Some(pos) = self.unchanged.iter().position(|e| e == id) {
            self.unchanged.remove(pos);
            self.mark_deleted(id);
            return true;
        }
        if let Some(pos) = self.updated.iter().position(|e| e.id == id) {
            self.updated.remove(pos);
            self.mark_deleted(id);
            return true;
        }
        if let Some(pos) = self.inserted.iter().position(|e| e.id == id) {
            self.inserted.remove(pos);
            return true;
        }
        false
    }

    fn mark_deleted(&mut self, id: &str) {
        if !self.deleted.iter().any(|e| e == id) {
            self.deleted.push(id.to_string());
        }
    }

    /// Whether any bucket still holds the feature id.
    #[must_use]
    pub fn tracks(&self, id: &str) -> bool {
        self.unchanged.iter().any(|e| e == id)
            || self.updated.iter().any(|e| e.id == id)
            || self.inserted.iter().any(|e| e.id == id)
            || self.deleted.iter().any(|e| e == id)
    }

    /// True when no local edits are pending.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.updated.is_empty() && self.inserted.is_empty() && self.deleted.is_empty()
    }

    /// True once the session's end of life has passed.
    #[must_use]
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.eol < now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> LockSession {
        LockSession {
            lock_id: "GeoServer_abc".to_string(),
            lock_name: "edit states".to_string(),
            type_name: "topp:states".to_string(),
            srs_name: "EPSG:4326".to_string(),
            expiry: 5,
            unchanged: vec!["states.1".to_string(), "states.2".to_string()],
            ..LockSession::default()
        }
    }

    fn edit(id: &str, properties_only: bool) -> EditedFeature {
        EditedFeature {
            id: id.to_string(),
            feature: format!("{{\"id\":\"{id}\"}}"),
            properties_only,
        }
    }

    #[test]
    fn editing_moves_an_unchanged_feature_to_updated() {
        let mut session = session();
        assert!(session.record_update(edit("states.1", false)));
        assert_eq!(session.unchanged, ["states.2"]);
        assert_eq!(session.updated.len(), 1);
        assert_eq!(session.updated[0].id, "states.1");
    }

    #[test]
    fn a_second_edit_replaces_the_pending_update() {
        let mut session = session();
        assert!(session.record_update(edit("states.1", true)));
        assert!(session.record_update(edit("states.1", false)));
        assert_eq!(session.updated.len(), 1);
        assert!(!session.updated[0].properties_only);
    }

    #[test]
    fn a_geometry_edit_keeps_later_updates_shipping_geometry() {
        let mut session = session();
        assert!(session.record_update(edit("states.1", false)));
        assert!(session.record_update(edit("states.1", true)));
        assert_eq!(session.updated.len(), 1);
        assert_eq!(session.updated[0].feature, "{\"id\":\"states.1\"}");
        assert!(!session.updated[0].properties_only);
    }

    #[test]
    fn editing_a_pending_insert_keeps_it_inserted() {
        let mut session = session();
        session.record_insert(InsertedFeature {
            id: "tmp.1".to_string(),
            feature: "{}".to_string(),
        });
        assert!(session.record_update(edit("tmp.1", true)));
        assert_eq!(session.inserted.len(), 1);
        assert_eq!(session.inserted[0].feature, "{\"id\":\"tmp.1\"}");
        assert!(session.updated.is_empty());
    }

    #[test]
    fn editing_an_untracked_feature_changes_nothing() {
        let mut session = session();
        assert!(!session.record_update(edit("states.99", false)));
        assert!(session.is_pristine());
    }

    #[test]
    fn removing_an_unchanged_feature_marks_it_deleted() {
        let mut session = session();
        assert!(session.record_removal("states.1"));
        assert_eq!(session.unchanged, ["states.2"]);
        assert_eq!(session.deleted, ["states.1"]);
    }

    #[test]
    fn removing_an_updated_feature_marks_it_deleted() {
        let mut session = session();
        session.record_update(edit("states.1", false));
        assert!(session.record_removal("states.1"));
        assert!(session.updated.is_empty());
        assert_eq!(session.deleted, ["states.1"]);
    }

    #[test]
    fn removing_a_pending_insert_never_reaches_deleted() {
        let mut session = session();
        session.record_insert(InsertedFeature {
            id: "tmp.1".to_string(),
            feature: "{}".to_string(),
        });
        assert!(session.record_removal("tmp.1"));
        assert!(session.inserted.is_empty());
        assert!(session.deleted.is_empty());
    }

    #[test]
    fn a_second_removal_is_a_no_op() {
        let mut session = session();
        assert!(session.record_removal("states.1"));
        assert!(!session.record_removal("states.1"));
        assert_eq!(session.deleted, ["states.1"]);
    }

    #[test]
    fn an_id_lives_in_at_most_one_bucket() {
        let mut session = session();
        session.record_update(edit("states.1", false));
        session.record_update(edit("states.1", true));
        session.record_removal("states.1");

        let occurrences = usize::from(session.unchanged.iter().any(|e| e == "states.1"))
            + usize::from(session.updated.iter().any(|e| e.id == "states.1"))
            + usize::from(session.inserted.iter().any(|e| e.id == "states.1"))
            + usize::from(session.deleted.iter().any(|e| e == "states.1"));
        assert_eq!(occurrences, 1);
        assert!(session.tracks("states.1"));
    }

    #[test]
    fn re_inserting_replaces_the_pending_payload() {
        let mut session = session();
        session.record_insert(InsertedFeature {
            id: "tmp.1".to_string(),
            feature: "{\"v\":1}".to_string(),
        });
        session.record_insert(InsertedFeature {
            id: "tmp.1".to_string(),
            feature: "{\"v\":2}".to_string(),
        });
        assert_eq!(session.inserted.len(), 1);
        assert_eq!(session.inserted[0].feature, "{\"v\":2}");
    }

    #[test]
    fn expiry_compares_against_end_of_life() {
        let mut session = session();
        session.eol = 1_000;
        assert!(!session.is_expired_at(1_000));
        assert!(session.is_expired_at(1_001));
    }

    #[test]
    fn sessions_round_trip_through_json() {
        let mut session = session();
        session.record_update(edit("states.1", true));
        session.record_insert(InsertedFeature {
            id: "tmp.1".to_string(),
            feature: "{}".to_string(),
        });
        let raw = serde_json::to_string(&session).expect("serialize");
        let back: LockSession = serde_json::from_str(&raw).expect("parse");
        assert_eq!(back, session);
    }
}
