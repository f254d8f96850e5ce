//! Networking and DNS resources

use super::compute::VIRTUAL_MACHINE;
use super::generic::{ArmLister, RegionSource};
use crate::registry::{Registration, Registry, Scope};

pub const APPLICATION_GATEWAY: &str = "ApplicationGateway";
pub const DNS_ZONE: &str = "DNSZone";
pub const PRIVATE_DNS_ZONE: &str = "PrivateDNSZone";
pub const IP_ALLOCATION: &str = "IPAllocation";
pub const NETWORK_INTERFACE: &str = "NetworkInterface";
pub const NETWORK_SECURITY_GROUP: &str = "NetworkSecurityGroup";
pub const PUBLIC_IP_ADDRESS: &str = "PublicIPAddress";
pub const VIRTUAL_NETWORK: &str = "VirtualNetwork";

const NETWORK_API_VERSION: &str = "2023-11-01";

fn network_lister(name: &'static str, path: &'static str) -> ArmLister {
    ArmLister::new(name, path, NETWORK_API_VERSION)
}

pub(super) fn register(registry: &mut Registry) {
    // Gateways report a region, but are always treated as global
    registry.register(Registration::new(
        APPLICATION_GATEWAY,
        Scope::ResourceGroup,
        network_lister(
            APPLICATION_GATEWAY,
            "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Network/applicationGateways",
        )
        .region(RegionSource::Global),
    ));

    registry.register(
        Registration::new(
            NETWORK_INTERFACE,
            Scope::ResourceGroup,
            network_lister(
                NETWORK_INTERFACE,
                "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Network/networkInterfaces",
            ),
        )
        .depends_on(&[VIRTUAL_MACHINE]),
    );

    registry.register(
        Registration::new(
            NETWORK_SECURITY_GROUP,
            Scope::ResourceGroup,
            network_lister(
                NETWORK_SECURITY_GROUP,
                "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Network/networkSecurityGroups",
            ),
        )
        .depends_on(&[NETWORK_INTERFACE]),
    );

    registry.register(
        Registration::new(
            PUBLIC_IP_ADDRESS,
            Scope::ResourceGroup,
            network_lister(
                PUBLIC_IP_ADDRESS,
                "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Network/publicIPAddresses",
            ),
        )
        .depends_on(&[NETWORK_INTERFACE, APPLICATION_GATEWAY])
        .aliases(&["PublicIPAddresses"]),
    );

    registry.register(
        Registration::new(
            VIRTUAL_NETWORK,
            Scope::ResourceGroup,
            network_lister(
                VIRTUAL_NETWORK,
                "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Network/virtualNetworks",
            ),
        )
        .depends_on(&[NETWORK_INTERFACE, APPLICATION_GATEWAY]),
    );

    registry.register(Registration::new(
        IP_ALLOCATION,
        Scope::ResourceGroup,
        network_lister(
            IP_ALLOCATION,
            "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Network/IpAllocations",
        ),
    ));

    registry.register(Registration::new(
        DNS_ZONE,
        Scope::ResourceGroup,
        ArmLister::new(
            DNS_ZONE,
            "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Network/dnsZones",
            "2018-05-01",
        ),
    ));

    registry.register(Registration::new(
        PRIVATE_DNS_ZONE,
        Scope::Subscription,
        ArmLister::new(
            PRIVATE_DNS_ZONE,
            "/subscriptions/{subscription}/providers/Microsoft.Network/privateDnsZones",
            "2020-06-01",
        ),
    ));
}
