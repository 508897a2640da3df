//! Kubernetes cluster resource handlers
//!
//! Pools are reconciled by name on update: new names are created, known
//! names with changed node bounds are patched, and names absent from the
//! desired set are deleted. A flavor change replaces the pool.

use std::collections::HashMap;

use cirrus_sdk::k8s::{
    Cluster, CreateClusterRequest, CreatePoolRequest, K8sClient, Pool, UpdatePoolRequest,
};
use cirrus_sdk::{PollConfig, TasksClient, wait_for_task};
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::schemas::k8s::k8s_cluster_schema;

use super::{api_error, required_str, validate};

/// Pool changes needed to converge the remote cluster on the desired set
#[derive(Debug, Default, PartialEq)]
pub struct PoolChanges {
    pub create: Vec<CreatePoolRequest>,
    /// (pool id, new bounds)
    pub update: Vec<(String, i64, i64)>,
    /// pool ids to delete; includes pools being replaced for a flavor change
    pub delete: Vec<String>,
}

impl PoolChanges {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

pub fn diff_pools(desired: &[CreatePoolRequest], current: &[Pool]) -> PoolChanges {
    let mut changes = PoolChanges::default();

    for want in desired {
        match current.iter().find(|p| p.name == want.name) {
            None => changes.create.push(want.clone()),
            Some(have) if have.flavor_id != want.flavor_id => {
                // Replacement: drop the old pool, create the new one
                changes.delete.push(have.id.clone());
                changes.create.push(want.clone());
            }
            Some(have)
                if have.min_node_count != want.min_node_count
                    || have.max_node_count != want.max_node_count =>
            {
                changes
                    .update
                    .push((have.id.clone(), want.min_node_count, want.max_node_count));
            }
            Some(_) => {}
        }
    }

    for have in current {
        if !desired.iter().any(|p| p.name == have.name) {
            changes.delete.push(have.id.clone());
        }
    }

    changes
}

pub fn expand_pools(attrs: &HashMap<String, Value>) -> ProviderResult<Vec<CreatePoolRequest>> {
    let mut pools = Vec::new();
    if let Some(items) = attrs.get("pools").and_then(Value::as_list) {
        for item in items {
            let map = item
                .as_map()
                .ok_or_else(|| ProviderError::new("Pool must be a map"))?;
            pools.push(CreatePoolRequest {
                name: required_str(map, "name")?.to_string(),
                flavor_id: required_str(map, "flavor_id")?.to_string(),
                min_node_count: map
                    .get("min_node_count")
                    .and_then(Value::as_int)
                    .ok_or_else(|| ProviderError::new("Pool requires min_node_count"))?,
                max_node_count: map
                    .get("max_node_count")
                    .and_then(Value::as_int)
                    .ok_or_else(|| ProviderError::new("Pool requires max_node_count"))?,
            });
        }
    }
    Ok(pools)
}

fn flatten_pool(pool: &Pool) -> Value {
    let mut map = HashMap::new();
    map.insert("name".to_string(), Value::string(pool.name.clone()));
    map.insert("flavor_id".to_string(), Value::string(pool.flavor_id.clone()));
    map.insert("min_node_count".to_string(), Value::Int(pool.min_node_count));
    map.insert("max_node_count".to_string(), Value::Int(pool.max_node_count));
    Value::Map(map)
}

pub fn flatten(cluster: &Cluster) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(cluster.name.clone()));
    attrs.insert("version".to_string(), Value::string(cluster.version.clone()));
    attrs.insert("status".to_string(), Value::string(cluster.status.clone()));
    if let Some(ref network) = cluster.fixed_network {
        attrs.insert("fixed_network".to_string(), Value::string(network.clone()));
    }
    if let Some(ref subnet) = cluster.fixed_subnet {
        attrs.insert("fixed_subnet".to_string(), Value::string(subnet.clone()));
    }
    attrs.insert(
        "pools".to_string(),
        Value::List(cluster.pools.iter().map(flatten_pool).collect()),
    );
    attrs
}

pub async fn create(
    k8s: &K8sClient,
    tasks: &TasksClient,
    poll: PollConfig,
    resource: &Resource,
) -> ProviderResult<State> {
    validate(&k8s_cluster_schema(), resource)?;
    let pools = expand_pools(&resource.attributes).map_err(|e| e.for_resource(resource.id.clone()))?;
    if pools.is_empty() {
        return Err(ProviderError::new("At least one pool is required")
            .for_resource(resource.id.clone()));
    }

    let req = CreateClusterRequest {
        name: required_str(&resource.attributes, "name")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
        version: required_str(&resource.attributes, "version")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
        fixed_network: required_str(&resource.attributes, "fixed_network")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
        fixed_subnet: required_str(&resource.attributes, "fixed_subnet")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
        pools,
    };

    let response = k8s
        .create_cluster(&req)
        .await
        .map_err(|e| api_error("create_cluster", &resource.id, e))?;
    let task_id = response
        .first("create_cluster")
        .map_err(|e| api_error("create_cluster", &resource.id, e))?
        .to_string();

    let Some(cluster_id) = wait_for_task(tasks, &task_id, true, poll, |task| {
        task.require_created_id("clusters")
    })
    .await
    .map_err(|e| api_error("create_cluster", &resource.id, e))?
    else {
        return Err(ProviderError::new("Create task finished without a cluster id")
            .for_resource(resource.id.clone()));
    };

    read(k8s, &resource.id, &cluster_id).await
}

pub async fn read(k8s: &K8sClient, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
    match k8s.get_cluster(identifier).await {
        Ok(cluster) => {
            Ok(State::existing(id.clone(), flatten(&cluster)).with_identifier(cluster.id))
        }
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_cluster", id, e)),
    }
}

/// Pool reconciliation. Each pool change is its own backend call; there is
/// no rollback if a later call fails after an earlier one committed, the
/// next read simply reports the converged-so-far state.
pub async fn update(
    k8s: &K8sClient,
    tasks: &TasksClient,
    poll: PollConfig,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let desired = expand_pools(&to.attributes).map_err(|e| e.for_resource(id.clone()))?;
    if desired.is_empty() {
        return Err(ProviderError::new("At least one pool is required").for_resource(id.clone()));
    }

    let cluster = k8s
        .get_cluster(identifier)
        .await
        .map_err(|e| api_error("get_cluster", id, e))?;
    let changes = diff_pools(&desired, &cluster.pools);
    log::debug!(
        "cluster {}: {} pools to create, {} to update, {} to delete",
        identifier,
        changes.create.len(),
        changes.update.len(),
        changes.delete.len()
    );

    for pool_id in &changes.delete {
        let response = k8s
            .delete_pool(identifier, pool_id)
            .await
            .map_err(|e| api_error("delete_pool", id, e))?;
        let task_id = response
            .first("delete_pool")
            .map_err(|e| api_error("delete_pool", id, e))?
            .to_string();
        wait_for_task(tasks, &task_id, true, poll, |_| Ok(()))
            .await
            .map_err(|e| api_error("delete_pool", id, e))?;
    }

    for (pool_id, min, max) in &changes.update {
        k8s.update_pool(
            identifier,
            pool_id,
            &UpdatePoolRequest {
                min_node_count: *min,
                max_node_count: *max,
            },
        )
        .await
        .map_err(|e| api_error("update_pool", id, e))?;
    }

    for pool in &changes.create {
        let response = k8s
            .create_pool(identifier, pool)
            .await
            .map_err(|e| api_error("create_pool", id, e))?;
        let task_id = response
            .first("create_pool")
            .map_err(|e| api_error("create_pool", id, e))?
            .to_string();
        wait_for_task(tasks, &task_id, true, poll, |_| Ok(()))
            .await
            .map_err(|e| api_error("create_pool", id, e))?;
    }

    read(k8s, id, identifier).await
}

pub async fn delete(
    k8s: &K8sClient,
    tasks: &TasksClient,
    poll: PollConfig,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let response = match k8s.delete_cluster(identifier).await {
        Ok(r) => r,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(api_error("delete_cluster", id, e)),
    };
    let task_id = response
        .first("delete_cluster")
        .map_err(|e| api_error("delete_cluster", id, e))?
        .to_string();

    wait_for_task(tasks, &task_id, true, poll, |_| Ok(()))
        .await
        .map_err(|e| api_error("delete_cluster", id, e))?;

    match k8s.get_cluster(identifier).await {
        Err(e) if e.is_not_found() => Ok(()),
        Ok(_) => Err(
            ProviderError::new("Cluster still present after delete task finished")
                .for_resource(id.clone()),
        ),
        Err(e) => Err(api_error("get_cluster", id, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn want(name: &str, flavor: &str, min: i64, max: i64) -> CreatePoolRequest {
        CreatePoolRequest {
            name: name.to_string(),
            flavor_id: flavor.to_string(),
            min_node_count: min,
            max_node_count: max,
        }
    }

    fn have(id: &str, name: &str, flavor: &str, min: i64, max: i64) -> Pool {
        Pool {
            id: id.to_string(),
            name: name.to_string(),
            flavor_id: flavor.to_string(),
            min_node_count: min,
            max_node_count: max,
            node_count: Some(min),
        }
    }

    #[test]
    fn new_pool_is_created() {
        let changes = diff_pools(
            &[want("workers", "g1", 1, 3), want("gpu", "g2", 1, 2)],
            &[have("p-1", "workers", "g1", 1, 3)],
        );
        assert_eq!(changes.create.len(), 1);
        assert_eq!(changes.create[0].name, "gpu");
        assert!(changes.update.is_empty());
        assert!(changes.delete.is_empty());
    }

    #[test]
    fn changed_bounds_are_patched_in_place() {
        let changes = diff_pools(
            &[want("workers", "g1", 2, 5)],
            &[have("p-1", "workers", "g1", 1, 3)],
        );
        assert_eq!(changes.update, vec![("p-1".to_string(), 2, 5)]);
        assert!(changes.create.is_empty());
        assert!(changes.delete.is_empty());
    }

    #[test]
    fn flavor_change_replaces_the_pool() {
        let changes = diff_pools(
            &[want("workers", "g2", 1, 3)],
            &[have("p-1", "workers", "g1", 1, 3)],
        );
        assert_eq!(changes.delete, vec!["p-1".to_string()]);
        assert_eq!(changes.create.len(), 1);
        assert_eq!(changes.create[0].flavor_id, "g2");
    }

    #[test]
    fn removed_pool_is_deleted() {
        let changes = diff_pools(
            &[want("workers", "g1", 1, 3)],
            &[
                have("p-1", "workers", "g1", 1, 3),
                have("p-2", "old", "g1", 1, 1),
            ],
        );
        assert_eq!(changes.delete, vec!["p-2".to_string()]);
        assert!(changes.create.is_empty());
    }

    #[test]
    fn converged_cluster_has_no_changes() {
        let changes = diff_pools(
            &[want("workers", "g1", 1, 3)],
            &[have("p-1", "workers", "g1", 1, 3)],
        );
        assert!(changes.is_empty());
    }
}
