//! Shared fixtures for service tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use dac_common::ElectionConfig;
use dac_db::entities::{
    consent, data_access_request, dataset,
    election::{self, ElectionStatus, ElectionType},
    user_role::Role,
    vote::{self, VoteType},
};
use dac_db::memory::InMemoryStore;
use dac_db::repositories::{ElectionStore, VoteStore};
use serde_json::json;

use super::{
    CommitteeDirectory, ElectionLocks, ElectionService, NoOpMatchEngine, PendingCaseService,
    ReferenceResolver, ReviewResultsService, ReviewWorkflowService, VoteService,
    notification::recording::RecordingNotificationSink,
};

/// In-memory store plus a recording notification sink, with service builders.
pub struct World {
    pub store: InMemoryStore,
    pub sink: Arc<RecordingNotificationSink>,
}

impl World {
    pub fn new() -> Self {
        Self::with_sink(RecordingNotificationSink::default())
    }

    pub fn with_sink(sink: RecordingNotificationSink) -> Self {
        Self {
            store: InMemoryStore::new(),
            sink: Arc::new(sink),
        }
    }

    /// Chairperson `chair` plus `members` ordinary members `m1..`.
    pub fn with_committee(members: usize) -> Self {
        let world = Self::new();
        world.seed_committee(members);
        world
    }

    pub fn seed_committee(&self, members: usize) {
        self.store.add_user("chair", &[Role::Chairperson]);
        for i in 1..=members {
            self.store.add_user(&format!("m{i}"), &[Role::Member]);
        }
    }

    pub fn resolver(&self) -> ReferenceResolver {
        ReferenceResolver::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
        )
    }

    pub fn committee(&self) -> CommitteeDirectory {
        CommitteeDirectory::new(Arc::new(self.store.clone()))
    }

    pub fn election_service(&self) -> ElectionService {
        ElectionService::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            self.resolver(),
            self.committee(),
            self.sink.clone(),
            ElectionConfig::default(),
        )
    }

    pub fn vote_service(&self) -> VoteService {
        VoteService::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            self.resolver(),
            self.committee(),
        )
    }

    pub fn pending_cases(&self) -> PendingCaseService {
        PendingCaseService::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            self.resolver(),
            self.committee(),
        )
    }

    pub fn review_results(&self) -> ReviewResultsService {
        ReviewResultsService::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            self.resolver(),
            self.committee(),
        )
    }

    pub fn workflow(&self) -> ReviewWorkflowService {
        ReviewWorkflowService::new(
            self.election_service(),
            self.vote_service(),
            self.resolver(),
            self.committee(),
            Arc::new(self.store.clone()),
            self.sink.clone(),
            Arc::new(NoOpMatchEngine),
            ElectionLocks::new(),
        )
    }

    pub async fn insert_election(&self, model: election::Model) -> election::Model {
        ElectionStore::insert(&self.store, model).await.unwrap()
    }

    pub async fn insert_vote(&self, model: vote::Model) -> vote::Model {
        VoteStore::insert(&self.store, model).await.unwrap()
    }

    /// Record a closed, approved DUL election for a consent.
    pub async fn approve_consent(&self, consent_id: &str) {
        let mut dul = election_model(
            &format!("dul-{consent_id}"),
            ElectionType::TranslateDul,
            ElectionStatus::Closed,
            consent_id,
        );
        dul.create_date = (Utc::now() - Duration::days(1)).into();
        dul.final_vote = Some(true);
        self.insert_election(dul.clone()).await;
        let mut chair_vote = vote_model(
            &format!("dul-chair-{consent_id}"),
            &dul.id,
            "chair",
            VoteType::Chairperson,
        );
        chair_vote.vote = Some(true);
        self.insert_vote(chair_vote).await;
    }

    /// Consent `c1` with an approved DUL, datasets `ds1`/`ds2`, and DAR `d1`.
    pub async fn seed_approved_dar(&self, restricted: bool) {
        self.store.put_consent(consent_model("c1"));
        self.store.put_dataset(dataset_model("ds1", "c1", true));
        self.store.put_dataset(dataset_model("ds2", "c1", true));
        self.store.put_dar(dar_model("d1", &["ds1", "ds2"], restricted));
        self.approve_consent("c1").await;
    }
}

pub fn consent_model(id: &str) -> consent::Model {
    consent::Model {
        id: id.to_string(),
        name: format!("Consent {id}"),
        use_restriction: json!({"type": "everything"}),
        translated_use_restriction: Some("Samples are restricted for use under the following conditions: none".to_string()),
        requires_manual_review: false,
        sort_date: Utc::now().into(),
        last_update: None,
    }
}

pub fn dar_model(id: &str, dataset_ids: &[&str], restricted: bool) -> data_access_request::Model {
    data_access_request::Model {
        id: id.to_string(),
        dar_code: format!("DAR-{id}"),
        user_id: "researcher".to_string(),
        dataset_ids: json!(dataset_ids),
        restriction: restricted.then(|| json!({"type": "and", "operands": [{"type": "named", "name": "DOID_162"}]})),
        translated_restriction: restricted.then(|| "Cancer research only".to_string()),
        sort_date: Utc::now().into(),
    }
}

pub fn dataset_model(id: &str, consent_id: &str, active: bool) -> dataset::Model {
    dataset::Model {
        id: id.to_string(),
        name: format!("Dataset {id}"),
        consent_id: consent_id.to_string(),
        active,
        needs_approval: false,
    }
}

pub fn election_model(
    id: &str,
    election_type: ElectionType,
    status: ElectionStatus,
    reference_id: &str,
) -> election::Model {
    election::Model {
        id: id.to_string(),
        election_type,
        status,
        reference_id: reference_id.to_string(),
        dataset_id: None,
        create_date: Utc::now().into(),
        last_update: None,
        final_vote: None,
        final_vote_date: None,
        final_rationale: None,
        final_access_vote: None,
        use_restriction: None,
        translated_use_restriction: None,
    }
}

pub fn vote_model(id: &str, election_id: &str, user_id: &str, vote_type: VoteType) -> vote::Model {
    vote::Model {
        id: id.to_string(),
        election_id: election_id.to_string(),
        dac_user_id: user_id.to_string(),
        vote_type,
        vote: None,
        rationale: None,
        has_concerns: None,
        create_date: None,
        update_date: None,
        reminder_sent: false,
    }
}

/// Mark a vote as cast.
pub fn cast(mut vote: vote::Model, value: bool) -> vote::Model {
    vote.vote = Some(value);
    vote.create_date = Some(Utc::now().into());
    vote
}
