//! Threshold service: use-cases for reading and saving watering rules.

use gardenhub_domain::error::{GardenHubError, NotFoundError};
use gardenhub_domain::id::DeviceId;
use gardenhub_domain::threshold::ThresholdRule;

use crate::ports::ThresholdRuleRepository;

/// Application service for threshold rules.
pub struct ThresholdService<R> {
    repo: R,
}

impl<R: ThresholdRuleRepository> ThresholdService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Look up the rule for a device, returning an error if none exists.
    ///
    /// # Errors
    ///
    /// Returns [`GardenHubError::NotFound`] when no rule is configured, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_rule(&self, device_id: &DeviceId) -> Result<ThresholdRule, GardenHubError> {
        self.repo.get(device_id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "ThresholdRule",
                id: device_id.to_string(),
            }
            .into()
        })
    }

    /// Validate and store a rule, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`GardenHubError::Validation`] if invariants fail, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, rule), fields(device_id = %rule.device_id))]
    pub async fn save_rule(&self, rule: ThresholdRule) -> Result<ThresholdRule, GardenHubError> {
        rule.validate()?;
        self.repo.upsert(rule).await
    }
}
