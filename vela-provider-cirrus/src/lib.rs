//! Vela Cirrus Provider
//!
//! Provider plugin mapping Vela resource declarations to the Cirrus cloud
//! platform's product APIs. Each resource type has an attribute schema, an
//! expand/flatten mapper pair and a create/read/update/delete handler
//! quartet; asynchronous products are tracked to completion through the
//! task poller in `cirrus-sdk`.

pub mod config;
pub mod provider;
pub mod resources;
pub mod schemas;

pub use config::ProviderConfig;
pub use provider::CirrusProvider;

use vela_core::provider::ResourceType;
use vela_core::schema::ResourceSchema;

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:path) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
        }
    };
}

define_resource_type!(InstanceType, "instance", schemas::compute::instance_schema);
define_resource_type!(VolumeType, "volume", schemas::compute::volume_schema);
define_resource_type!(
    LoadbalancerType,
    "loadbalancer",
    schemas::loadbalancer::loadbalancer_schema
);
define_resource_type!(K8sClusterType, "k8s_cluster", schemas::k8s::k8s_cluster_schema);
define_resource_type!(
    SecurityGroupType,
    "security_group",
    schemas::security::security_group_schema
);
define_resource_type!(CdnResourceType, "cdn_resource", schemas::cdn::cdn_resource_schema);
define_resource_type!(DnsZoneType, "dns_zone", schemas::dns::dns_zone_schema);
define_resource_type!(DnsRrsetType, "dns_rrset", schemas::dns::dns_rrset_schema);
define_resource_type!(
    StorageBucketType,
    "storage_bucket",
    schemas::storage::storage_bucket_schema
);
define_resource_type!(EdgeAppType, "edge_app", schemas::edge::edge_app_schema);
define_resource_type!(WaapDomainType, "waap_domain", schemas::waap::waap_domain_schema);
define_resource_type!(ImageType, "image", schemas::compute::image_schema);
define_resource_type!(FlavorType, "flavor", schemas::compute::flavor_schema);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(InstanceType),
        Box::new(VolumeType),
        Box::new(LoadbalancerType),
        Box::new(K8sClusterType),
        Box::new(SecurityGroupType),
        Box::new(CdnResourceType),
        Box::new(DnsZoneType),
        Box::new(DnsRrsetType),
        Box::new(StorageBucketType),
        Box::new(EdgeAppType),
        Box::new(WaapDomainType),
        Box::new(ImageType),
        Box::new(FlavorType),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_resource_type_declares_a_schema() {
        for resource_type in resource_types() {
            let schema = resource_type.schema();
            assert_eq!(schema.resource_type, resource_type.name());
            assert!(!schema.attributes.is_empty());
        }
    }
}
