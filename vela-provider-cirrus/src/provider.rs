//! Cirrus Provider implementation
//!
//! Builds the per-product clients once from the resolved configuration and
//! dispatches every Provider operation to the matching resource handlers.

use cirrus_sdk::cdn::CdnClient;
use cirrus_sdk::compute::ComputeClient;
use cirrus_sdk::dns::DnsClient;
use cirrus_sdk::edge::EdgeClient;
use cirrus_sdk::iam::IamClient;
use cirrus_sdk::k8s::K8sClient;
use cirrus_sdk::loadbalancers::LoadbalancerClient;
use cirrus_sdk::security::SecurityGroupClient;
use cirrus_sdk::storage::StorageClient;
use cirrus_sdk::waap::WaapClient;
use cirrus_sdk::{ApiClient, PollConfig, TasksClient};
use tokio::sync::Mutex;
use vela_core::provider::{
    BoxFuture, Provider, ProviderError, ProviderResult, ResourceType,
};
use vela_core::resource::{Resource, ResourceId, State};

use crate::config::ProviderConfig;
use crate::resources::{
    cdn_resource, datasources, dns, edge_app, instance, k8s_cluster, loadbalancer, security_group,
    storage_bucket, volume, waap_domain,
};
use crate::resource_types;

/// Provider for the Cirrus cloud platform
pub struct CirrusProvider {
    compute: ComputeClient,
    loadbalancers: LoadbalancerClient,
    k8s: K8sClient,
    security: SecurityGroupClient,
    /// The CDN backend rejects concurrent modifications of one account, so
    /// the shared client handle is serialized behind a mutex.
    cdn: Mutex<CdnClient>,
    dns: DnsClient,
    storage: StorageClient,
    edge: EdgeClient,
    waap: WaapClient,
    tasks: TasksClient,
    poll: PollConfig,
}

impl CirrusProvider {
    /// Resolve credentials and scope, then construct every product client.
    ///
    /// A project given by name is resolved to its id through the IAM API
    /// here, once; handlers only ever see the id.
    pub async fn connect(config: ProviderConfig) -> ProviderResult<Self> {
        config.validate()?;

        let api = ApiClient::new(&config.api_url, &config.api_token)
            .map_err(|e| ProviderError::new(format!("Failed to build API client: {}", e)))?;

        let project_id = match (config.project_id, &config.project_name) {
            (Some(id), _) => id,
            (None, Some(name)) => {
                let iam = IamClient::new(api.clone());
                iam.project_by_name(name)
                    .await
                    .map_err(|e| {
                        ProviderError::new(format!("Failed to resolve project '{}': {}", name, e))
                            .with_cause(e)
                    })?
                    .id
            }
            (None, None) => {
                return Err(ProviderError::new("Provider configuration has no project scope"));
            }
        };
        let region_id = config.region_id;

        let product = |url: &Option<String>| match url {
            Some(url) => api.with_base_url(url.clone()),
            None => api.clone(),
        };

        Ok(Self {
            compute: ComputeClient::new(api.clone(), project_id, region_id),
            loadbalancers: LoadbalancerClient::new(api.clone(), project_id, region_id),
            k8s: K8sClient::new(api.clone(), project_id, region_id),
            security: SecurityGroupClient::new(api.clone(), project_id, region_id),
            cdn: Mutex::new(CdnClient::new(product(&config.cdn_api_url))),
            dns: DnsClient::new(product(&config.dns_api_url)),
            storage: StorageClient::new(product(&config.storage_api_url), project_id),
            edge: EdgeClient::new(product(&config.edge_api_url)),
            waap: WaapClient::new(product(&config.waap_api_url)),
            tasks: TasksClient::new(api),
            poll: config.poll(),
        })
    }

    async fn dispatch_read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        // Data sources are looked up by name, never by identifier
        match id.resource_type.as_str() {
            "image" => return datasources::read_image(&self.compute, id).await,
            "flavor" => return datasources::read_flavor(&self.compute, id).await,
            _ => {}
        }

        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };

        match id.resource_type.as_str() {
            "instance" => instance::read(&self.compute, id, identifier).await,
            "volume" => volume::read(&self.compute, id, identifier).await,
            "loadbalancer" => loadbalancer::read(&self.loadbalancers, id, identifier).await,
            "k8s_cluster" => k8s_cluster::read(&self.k8s, id, identifier).await,
            "security_group" => security_group::read(&self.security, id, identifier).await,
            "cdn_resource" => cdn_resource::read(&self.cdn, id, identifier).await,
            "dns_zone" => dns::read_zone(&self.dns, id, identifier).await,
            "dns_rrset" => dns::read_rrset(&self.dns, id, identifier).await,
            "storage_bucket" => storage_bucket::read(&self.storage, id, identifier).await,
            "edge_app" => edge_app::read(&self.edge, id, identifier).await,
            "waap_domain" => waap_domain::read(&self.waap, id, identifier).await,
            other => Err(unknown_type(other, id)),
        }
    }

    async fn dispatch_create(&self, resource: &Resource) -> ProviderResult<State> {
        if resource.is_data_source() {
            return Err(
                ProviderError::new("Data sources are read-only").for_resource(resource.id.clone())
            );
        }

        match resource.id.resource_type.as_str() {
            "instance" => instance::create(&self.compute, &self.tasks, self.poll, resource).await,
            "volume" => volume::create(&self.compute, &self.tasks, self.poll, resource).await,
            "loadbalancer" => {
                loadbalancer::create(&self.loadbalancers, &self.tasks, self.poll, resource).await
            }
            "k8s_cluster" => k8s_cluster::create(&self.k8s, &self.tasks, self.poll, resource).await,
            "security_group" => security_group::create(&self.security, resource).await,
            "cdn_resource" => cdn_resource::create(&self.cdn, resource).await,
            "dns_zone" => dns::create_zone(&self.dns, resource).await,
            "dns_rrset" => dns::create_rrset(&self.dns, resource).await,
            "storage_bucket" => storage_bucket::create(&self.storage, resource).await,
            "edge_app" => edge_app::create(&self.edge, resource).await,
            "waap_domain" => waap_domain::create(&self.waap, resource).await,
            other => Err(unknown_type(other, &resource.id)),
        }
    }

    async fn dispatch_update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        match id.resource_type.as_str() {
            "instance" => instance::update(&self.compute, id, identifier, from, to).await,
            "volume" => {
                volume::update(&self.compute, &self.tasks, self.poll, id, identifier, from, to)
                    .await
            }
            "loadbalancer" => {
                loadbalancer::update(&self.loadbalancers, id, identifier, from, to).await
            }
            "k8s_cluster" => {
                k8s_cluster::update(&self.k8s, &self.tasks, self.poll, id, identifier, to).await
            }
            "security_group" => {
                security_group::update(&self.security, id, identifier, from, to).await
            }
            "cdn_resource" => cdn_resource::update(&self.cdn, id, identifier, from, to).await,
            "dns_zone" => Err(ProviderError::new(
                "DNS zones have no updatable attributes, delete and recreate",
            )
            .for_resource(id.clone())),
            "dns_rrset" => dns::update_rrset(&self.dns, id, identifier, to).await,
            "storage_bucket" => storage_bucket::update(&self.storage, id, identifier, from, to).await,
            "edge_app" => edge_app::update(&self.edge, id, identifier, from, to).await,
            "waap_domain" => waap_domain::update(&self.waap, id, identifier, from, to).await,
            other => Err(unknown_type(other, id)),
        }
    }

    async fn dispatch_delete(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        match id.resource_type.as_str() {
            "instance" => {
                instance::delete(&self.compute, &self.tasks, self.poll, id, identifier).await
            }
            "volume" => volume::delete(&self.compute, &self.tasks, self.poll, id, identifier).await,
            "loadbalancer" => {
                loadbalancer::delete(&self.loadbalancers, &self.tasks, self.poll, id, identifier)
                    .await
            }
            "k8s_cluster" => {
                k8s_cluster::delete(&self.k8s, &self.tasks, self.poll, id, identifier).await
            }
            "security_group" => security_group::delete(&self.security, id, identifier).await,
            "cdn_resource" => cdn_resource::delete(&self.cdn, id, identifier).await,
            "dns_zone" => dns::delete_zone(&self.dns, id, identifier).await,
            "dns_rrset" => dns::delete_rrset(&self.dns, id, identifier).await,
            "storage_bucket" => storage_bucket::delete(&self.storage, id, identifier).await,
            "edge_app" => edge_app::delete(&self.edge, id, identifier).await,
            "waap_domain" => waap_domain::delete(&self.waap, id, identifier).await,
            other => Err(unknown_type(other, id)),
        }
    }
}

fn unknown_type(resource_type: &str, id: &ResourceId) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", resource_type))
        .for_resource(id.clone())
}

impl Provider for CirrusProvider {
    fn name(&self) -> &'static str {
        "cirrus"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(String::from);
        Box::pin(async move { self.dispatch_read(&id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.dispatch_create(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.dispatch_update(&id, &identifier, &from, &to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.dispatch_delete(&id, &identifier).await })
    }
}
