//! Resolution of election references to consents and DARs.

use chrono::{DateTime, Utc};
use dac_common::AppResult;
use dac_db::{
    entities::{consent, data_access_request, dataset, election::ElectionType},
    repositories::{SharedConsentStore, SharedDataAccessRequestStore, SharedDatasetStore},
};
use serde_json::Value;

/// The record an election reviews.
#[derive(Debug, Clone)]
pub enum Reference {
    Consent(consent::Model),
    Dar(data_access_request::Model),
}

impl Reference {
    /// Restriction expression to snapshot onto a new election.
    #[must_use]
    pub fn use_restriction(&self) -> Option<Value> {
        match self {
            Self::Consent(c) => Some(c.use_restriction.clone()),
            Self::Dar(d) => d.restriction.clone(),
        }
    }

    #[must_use]
    pub fn translated_use_restriction(&self) -> Option<String> {
        match self {
            Self::Consent(c) => c.translated_use_restriction.clone(),
            Self::Dar(d) => d.translated_restriction.clone(),
        }
    }

    /// Label shown to committee members: consent name or DAR code.
    #[must_use]
    pub fn display_id(&self) -> &str {
        match self {
            Self::Consent(c) => &c.name,
            Self::Dar(d) => &d.dar_code,
        }
    }
}

/// Looks up consents, DARs and datasets on behalf of the election services.
#[derive(Clone)]
pub struct ReferenceResolver {
    consents: SharedConsentStore,
    dars: SharedDataAccessRequestStore,
    datasets: SharedDatasetStore,
}

impl ReferenceResolver {
    /// Create a new reference resolver.
    #[must_use]
    pub const fn new(
        consents: SharedConsentStore,
        dars: SharedDataAccessRequestStore,
        datasets: SharedDatasetStore,
    ) -> Self {
        Self {
            consents,
            dars,
            datasets,
        }
    }

    /// Resolve a reference id for an election type.
    ///
    /// `TranslateDul` elections reference consents; every other type
    /// references a DAR.
    pub async fn resolve(
        &self,
        reference_id: &str,
        election_type: ElectionType,
    ) -> AppResult<Option<Reference>> {
        if election_type.references_dar() {
            Ok(self.dar(reference_id).await?.map(Reference::Dar))
        } else {
            Ok(self.consent(reference_id).await?.map(Reference::Consent))
        }
    }

    pub async fn consent(&self, consent_id: &str) -> AppResult<Option<consent::Model>> {
        self.consents.find_by_id(consent_id).await
    }

    pub async fn dar(&self, dar_id: &str) -> AppResult<Option<data_access_request::Model>> {
        self.dars.find_by_id(dar_id).await
    }

    pub async fn dataset(&self, dataset_id: &str) -> AppResult<Option<dataset::Model>> {
        self.datasets.find_by_id(dataset_id).await
    }

    /// Datasets referenced by a DAR, in the DAR's order. Unknown ids are skipped.
    pub async fn datasets_of(
        &self,
        dar: &data_access_request::Model,
    ) -> AppResult<Vec<dataset::Model>> {
        let ids = dar.dataset_id_list();
        let mut found = self.datasets.find_by_ids(&ids).await?;
        found.sort_by_key(|d| ids.iter().position(|id| *id == d.id));
        Ok(found)
    }

    /// The consent governing the first dataset of a DAR.
    pub async fn consent_for_dar(
        &self,
        dar: &data_access_request::Model,
    ) -> AppResult<Option<consent::Model>> {
        let Some(first) = dar.dataset_id_list().into_iter().next() else {
            return Ok(None);
        };
        match self.datasets.find_by_id(&first).await? {
            Some(dataset) => self.consents.find_by_id(&dataset.consent_id).await,
            None => Ok(None),
        }
    }

    /// The consent an election's reference is governed by.
    pub async fn consent_for_reference(
        &self,
        reference_id: &str,
        election_type: ElectionType,
    ) -> AppResult<Option<consent::Model>> {
        match self.resolve(reference_id, election_type).await? {
            Some(Reference::Consent(c)) => Ok(Some(c)),
            Some(Reference::Dar(d)) => self.consent_for_dar(&d).await,
            None => Ok(None),
        }
    }

    pub async fn owner_ids(&self, dataset_id: &str) -> AppResult<Vec<String>> {
        self.datasets.find_owner_ids(dataset_id).await
    }

    /// Drop dataset ids from a DAR. Writing the same list twice is harmless.
    pub async fn rewrite_dar_datasets(&self, dar_id: &str, dataset_ids: &[String]) -> AppResult<()> {
        self.dars.update_dataset_ids(dar_id, dataset_ids).await
    }

    /// Bump the manage-view ordering key of the reference behind an election.
    pub async fn touch_sort_date(
        &self,
        reference_id: &str,
        election_type: ElectionType,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        if election_type.references_dar() {
            self.dars.touch_sort_date(reference_id, at).await
        } else {
            self.consents
                .touch_sort_date(&[reference_id.to_string()], at)
                .await
        }
    }

    pub async fn touch_consents(&self, consent_ids: &[String], at: DateTime<Utc>) -> AppResult<()> {
        self.consents.touch_sort_date(consent_ids, at).await
    }
}
