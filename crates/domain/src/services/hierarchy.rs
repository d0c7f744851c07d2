//! Device hierarchy loading and target condition building.

use tracing::debug;
use uuid::Uuid;

use super::store::PolicyStore;
use crate::error::StoreError;
use crate::models::{DeviceHierarchy, TargetCondition};

/// Assemble the scopes a device belongs to.
///
/// Returns `Ok(None)` when the device does not exist. Every call reads the
/// store; nothing is cached.
pub async fn load_hierarchy(
    store: &dyn PolicyStore,
    device_id: Uuid,
) -> Result<Option<DeviceHierarchy>, StoreError> {
    let Some(device) = store.find_device(device_id).await? else {
        debug!(device_id = %device_id, "Device not found while loading hierarchy");
        return Ok(None);
    };

    let partner_id = store.find_partner_id_for_org(device.org_id).await?;

    let mut group_ids = store.list_group_ids_for_device(device_id).await?;
    group_ids.sort();
    group_ids.dedup();

    Ok(Some(DeviceHierarchy {
        device_id: device.id,
        org_id: device.org_id,
        site_id: device.site_id,
        partner_id,
        group_ids,
    }))
}

/// One predicate per level present for the device.
///
/// Device, site and organization are always emitted. The group predicate is
/// omitted when the device has no memberships and the partner predicate when
/// the organization has no partner.
pub fn build_target_conditions(hierarchy: &DeviceHierarchy) -> Vec<TargetCondition> {
    let mut conditions = vec![TargetCondition::Device(hierarchy.device_id)];

    if !hierarchy.group_ids.is_empty() {
        conditions.push(TargetCondition::DeviceGroup(hierarchy.group_ids.clone()));
    }

    conditions.push(TargetCondition::Site(hierarchy.site_id));
    conditions.push(TargetCondition::Organization(hierarchy.org_id));

    if let Some(partner_id) = hierarchy.partner_id {
        conditions.push(TargetCondition::Partner(partner_id));
    }

    conditions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentLevel, DeviceRecord};
    use crate::services::memory_store::InMemoryPolicyStore;

    fn hierarchy(group_ids: Vec<Uuid>, partner_id: Option<Uuid>) -> DeviceHierarchy {
        DeviceHierarchy {
            device_id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            site_id: Uuid::new_v4(),
            partner_id,
            group_ids,
        }
    }

    #[test]
    fn test_conditions_full_hierarchy() {
        let group = Uuid::new_v4();
        let partner = Uuid::new_v4();
        let h = hierarchy(vec![group], Some(partner));

        let levels: Vec<AssignmentLevel> = build_target_conditions(&h)
            .iter()
            .map(|c| c.level())
            .collect();
        assert_eq!(
            levels,
            vec![
                AssignmentLevel::Device,
                AssignmentLevel::DeviceGroup,
                AssignmentLevel::Site,
                AssignmentLevel::Organization,
                AssignmentLevel::Partner,
            ]
        );
    }

    #[test]
    fn test_conditions_omit_empty_groups_and_missing_partner() {
        let h = hierarchy(vec![], None);
        let conditions = build_target_conditions(&h);

        assert_eq!(conditions.len(), 3);
        assert!(conditions
            .iter()
            .all(|c| c.level() != AssignmentLevel::DeviceGroup
                && c.level() != AssignmentLevel::Partner));
    }

    #[tokio::test]
    async fn test_load_hierarchy() {
        let store = InMemoryPolicyStore::new();
        let partner = Uuid::new_v4();
        let device = DeviceRecord {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            site_id: Uuid::new_v4(),
        };
        let (g1, g2) = (Uuid::new_v4(), Uuid::new_v4());
        store.insert_org(device.org_id, Some(partner));
        store.insert_device(device);
        store.add_group_member(device.id, g2);
        store.add_group_member(device.id, g1);
        store.add_group_member(device.id, g2);

        let h = load_hierarchy(&store, device.id).await.unwrap().unwrap();
        assert_eq!(h.org_id, device.org_id);
        assert_eq!(h.site_id, device.site_id);
        assert_eq!(h.partner_id, Some(partner));
        assert_eq!(h.group_ids.len(), 2);
        assert!(h.is_in_group(g1));
        assert!(h.is_in_group(g2));
    }

    #[tokio::test]
    async fn test_load_hierarchy_unknown_device() {
        let store = InMemoryPolicyStore::new();
        assert!(load_hierarchy(&store, Uuid::new_v4()).await.unwrap().is_none());
    }
}
