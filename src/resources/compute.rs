//! Compute, web and container registry resources

use super::creation_date;
use super::generic::{ArmLister, Removal};
use crate::registry::{Registration, Registry, Scope};

pub const VIRTUAL_MACHINE: &str = "VirtualMachine";
pub const DISK: &str = "Disk";
pub const COMPUTE_SNAPSHOT: &str = "ComputeSnapshot";
pub const SSH_PUBLIC_KEY: &str = "SSHPublicKey";
pub const APP_SERVICE_PLAN: &str = "AppServicePlan";
pub const CONTAINER_REGISTRY: &str = "ContainerRegistry";

const COMPUTE_API_VERSION: &str = "2024-03-01";
const DISK_API_VERSION: &str = "2023-10-02";

pub(super) fn register(registry: &mut Registry) {
    registry.register(Registration::new(
        VIRTUAL_MACHINE,
        Scope::ResourceGroup,
        ArmLister::new(
            VIRTUAL_MACHINE,
            "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Compute/virtualMachines",
            COMPUTE_API_VERSION,
        )
        .describe(creation_date)
        .removal(|_| Removal::Delete(Some("forceDeletion=true"))),
    ));

    registry.register(
        Registration::new(
            DISK,
            Scope::ResourceGroup,
            ArmLister::new(
                DISK,
                "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Compute/disks",
                DISK_API_VERSION,
            )
            .describe(creation_date),
        )
        .depends_on(&[VIRTUAL_MACHINE]),
    );

    registry.register(
        Registration::new(
            COMPUTE_SNAPSHOT,
            Scope::ResourceGroup,
            ArmLister::new(
                COMPUTE_SNAPSHOT,
                "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Compute/snapshots",
                DISK_API_VERSION,
            )
            .describe(creation_date),
        )
        .depends_on(&[VIRTUAL_MACHINE]),
    );

    registry.register(Registration::new(
        SSH_PUBLIC_KEY,
        Scope::Subscription,
        ArmLister::new(
            SSH_PUBLIC_KEY,
            "/subscriptions/{subscription}/providers/Microsoft.Compute/sshPublicKeys",
            COMPUTE_API_VERSION,
        ),
    ));

    registry.register(Registration::new(
        APP_SERVICE_PLAN,
        Scope::ResourceGroup,
        ArmLister::new(
            APP_SERVICE_PLAN,
            "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Web/serverfarms",
            "2023-12-01",
        ),
    ));

    registry.register(Registration::new(
        CONTAINER_REGISTRY,
        Scope::ResourceGroup,
        ArmLister::new(
            CONTAINER_REGISTRY,
            "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.ContainerRegistry/registries",
            "2023-07-01",
        ),
    ));
}
