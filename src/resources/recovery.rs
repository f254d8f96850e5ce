//! Recovery Services vaults and their backup contents
//!
//! A vault can only be deleted once its protected items and policies are gone, so both
//! are listed per vault and ordered ahead of it.

use super::generic::ArmLister;
use crate::registry::{Registration, Registry, Scope};

pub const RECOVERY_SERVICES_VAULT: &str = "RecoveryServicesVault";
pub const RECOVERY_SERVICES_BACKUP_POLICY: &str = "RecoveryServicesBackupPolicy";
pub const RECOVERY_SERVICES_BACKUP_PROTECTED_ITEM: &str = "RecoveryServicesBackupProtectedItem";

const API_VERSION: &str = "2024-04-01";

const VAULTS: &str = "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.RecoveryServices/vaults";

pub(super) fn register(registry: &mut Registry) {
    registry.register(Registration::new(
        RECOVERY_SERVICES_BACKUP_PROTECTED_ITEM,
        Scope::ResourceGroup,
        ArmLister::new(
            RECOVERY_SERVICES_BACKUP_PROTECTED_ITEM,
            "{parent}/backupProtectedItems",
            API_VERSION,
        )
        .within(VAULTS, API_VERSION, "VaultName"),
    ));

    registry.register(
        Registration::new(
            RECOVERY_SERVICES_BACKUP_POLICY,
            Scope::ResourceGroup,
            ArmLister::new(
                RECOVERY_SERVICES_BACKUP_POLICY,
                "{parent}/backupPolicies",
                API_VERSION,
            )
            .within(VAULTS, API_VERSION, "VaultName"),
        )
        .depends_on(&[RECOVERY_SERVICES_BACKUP_PROTECTED_ITEM]),
    );

    registry.register(
        Registration::new(
            RECOVERY_SERVICES_VAULT,
            Scope::ResourceGroup,
            ArmLister::new(RECOVERY_SERVICES_VAULT, VAULTS, API_VERSION),
        )
        .depends_on(&[
            RECOVERY_SERVICES_BACKUP_PROTECTED_ITEM,
            RECOVERY_SERVICES_BACKUP_POLICY,
        ]),
    );
}
