//! Expansion of assignments into concrete device ids.

use std::collections::BTreeSet;
use uuid::Uuid;

use super::store::PolicyStore;
use crate::error::StoreError;
use crate::models::{AssignmentLevel, ConfigPolicyAssignment};

/// Devices an assignment reaches.
pub async fn expand_assignment(
    store: &dyn PolicyStore,
    assignment: &ConfigPolicyAssignment,
) -> Result<Vec<Uuid>, StoreError> {
    let target = assignment.target_id;
    match assignment.level {
        AssignmentLevel::Device => Ok(vec![target]),
        AssignmentLevel::DeviceGroup => store.list_device_ids_in_group(target).await,
        AssignmentLevel::Site => store.list_device_ids_in_site(target).await,
        AssignmentLevel::Organization => store.list_device_ids_in_org(target).await,
        AssignmentLevel::Partner => {
            let mut device_ids = Vec::new();
            for org_id in store.list_org_ids_for_partner(target).await? {
                device_ids.extend(store.list_device_ids_in_org(org_id).await?);
            }
            Ok(device_ids)
        }
    }
}

/// Union of the devices every assignment reaches, deduplicated and sorted.
pub async fn expand_assignments(
    store: &dyn PolicyStore,
    assignments: &[ConfigPolicyAssignment],
) -> Result<Vec<Uuid>, StoreError> {
    let mut device_ids = BTreeSet::new();
    for assignment in assignments {
        device_ids.extend(expand_assignment(store, assignment).await?);
    }
    Ok(device_ids.into_iter().collect())
}
