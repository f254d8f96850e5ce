//! Storage accounts and key vaults

use super::compute::VIRTUAL_MACHINE;
use super::generic::ArmLister;
use crate::registry::{Registration, Registry, Scope};

pub const STORAGE_ACCOUNT: &str = "StorageAccount";
pub const KEY_VAULT: &str = "KeyVault";
pub const KEY_VAULT_SECRET: &str = "KeyVaultSecret";

pub(super) fn register(registry: &mut Registry) {
    registry.register(
        Registration::new(
            STORAGE_ACCOUNT,
            Scope::ResourceGroup,
            ArmLister::new(
                STORAGE_ACCOUNT,
                "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Storage/storageAccounts",
                "2023-05-01",
            ),
        )
        .depends_on(&[VIRTUAL_MACHINE]),
    );

    registry.register(Registration::new(
        KEY_VAULT,
        Scope::Subscription,
        ArmLister::new(
            KEY_VAULT,
            "/subscriptions/{subscription}/providers/Microsoft.KeyVault/vaults",
            "2023-07-01",
        ),
    ));

    // Secrets go away with their vault
    registry.register(Registration::superseded(
        KEY_VAULT_SECRET,
        Scope::Subscription,
        KEY_VAULT,
    ));
}
