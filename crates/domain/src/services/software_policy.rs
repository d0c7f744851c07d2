//! Devices actually governed by a software policy.

use futures::future::join_all;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use uuid::Uuid;

use super::device_targeting::expand_assignments;
use super::policy_resolution::PolicyResolver;
use crate::error::StoreError;
use crate::models::FeatureType;

/// Candidates verified concurrently per batch.
pub const DEFAULT_VERIFY_BATCH_SIZE: usize = 50;

/// Finds the devices for which a software policy is the winning policy.
#[derive(Clone)]
pub struct SoftwarePolicyTargeting {
    resolver: PolicyResolver,
    batch_size: usize,
}

impl SoftwarePolicyTargeting {
    pub fn new(resolver: PolicyResolver) -> Self {
        Self::with_batch_size(resolver, DEFAULT_VERIFY_BATCH_SIZE)
    }

    pub fn with_batch_size(resolver: PolicyResolver, batch_size: usize) -> Self {
        Self {
            resolver,
            batch_size: batch_size.max(1),
        }
    }

    /// Devices whose winning software policy is `software_policy_id`, sorted.
    ///
    /// Candidates are every device reached by an assignment of a policy linking
    /// to the software policy. Each candidate is then re-resolved, since a
    /// closer assignment may point elsewhere. A candidate whose resolution
    /// fails is left out.
    pub async fn resolve_device_ids_for_software_policy(
        &self,
        software_policy_id: Uuid,
    ) -> Result<Vec<Uuid>, StoreError> {
        let store = self.resolver.store();

        let links = store
            .list_active_links_for_feature_policy(FeatureType::SoftwarePolicy, software_policy_id)
            .await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let policy_ids: Vec<Uuid> = links
            .iter()
            .map(|link| link.config_policy_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let assignments = store.list_assignments_for_policies(&policy_ids).await?;
        let candidates = expand_assignments(store.as_ref(), &assignments).await?;

        let mut governed = Vec::new();
        for batch in candidates.chunks(self.batch_size) {
            let results = join_all(
                batch
                    .iter()
                    .map(|device_id| self.resolver.resolve_software_policy_id(*device_id)),
            )
            .await;

            for (device_id, result) in batch.iter().zip(results) {
                match result {
                    Ok(Some(winner)) if winner == software_policy_id => governed.push(*device_id),
                    Ok(_) => {}
                    Err(e) => {
                        warn!(
                            device_id = %device_id,
                            software_policy_id = %software_policy_id,
                            error = %e,
                            "Failed to verify software policy for device"
                        );
                    }
                }
            }
        }

        debug!(
            software_policy_id = %software_policy_id,
            candidates = candidates.len(),
            governed = governed.len(),
            "Resolved software policy devices"
        );

        Ok(governed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssignmentLevel;
    use crate::services::fixtures::Fleet;

    fn targeting(fleet: &Fleet, batch_size: usize) -> SoftwarePolicyTargeting {
        SoftwarePolicyTargeting::with_batch_size(PolicyResolver::new(fleet.store.clone()), batch_size)
    }

    #[tokio::test]
    async fn test_closer_assignment_removes_candidate() {
        let fleet = Fleet::new();
        let d1 = fleet.device();
        let d2 = fleet.device();
        let d3 = fleet.device();

        let target = Uuid::new_v4();
        let other = Uuid::new_v4();
        let org_wide = fleet.software_policy(target);
        let override_policy = fleet.software_policy(other);
        fleet.assign(org_wide, AssignmentLevel::Organization, fleet.org_id, 0, 0);
        fleet.assign(override_policy, AssignmentLevel::Device, d2, 0, 0);

        let devices = targeting(&fleet, 2)
            .resolve_device_ids_for_software_policy(target)
            .await
            .unwrap();
        let mut expected = vec![d1, d3];
        expected.sort();
        assert_eq!(devices, expected);

        let others = targeting(&fleet, 2)
            .resolve_device_ids_for_software_policy(other)
            .await
            .unwrap();
        assert_eq!(others, vec![d2]);
    }

    #[tokio::test]
    async fn test_unlinked_software_policy_has_no_devices() {
        let fleet = Fleet::new();
        fleet.device();
        let devices = targeting(&fleet, DEFAULT_VERIFY_BATCH_SIZE)
            .resolve_device_ids_for_software_policy(Uuid::new_v4())
            .await
            .unwrap();
        assert!(devices.is_empty());
    }

    #[tokio::test]
    async fn test_failing_candidate_is_excluded() {
        let fleet = Fleet::new();
        let healthy = fleet.device();
        let broken = fleet.device();
        fleet.store.fail_device(broken);

        let target = Uuid::new_v4();
        let policy = fleet.software_policy(target);
        fleet.assign(policy, AssignmentLevel::Site, fleet.site_id, 0, 0);

        let devices = targeting(&fleet, 1)
            .resolve_device_ids_for_software_policy(target)
            .await
            .unwrap();
        assert_eq!(devices, vec![healthy]);
    }

    #[test]
    fn test_batch_size_is_at_least_one() {
        let fleet = Fleet::new();
        assert_eq!(targeting(&fleet, 0).batch_size, 1);
    }
}
