//! Node-implementaties die deze plugin bij de host aanmeldt.

pub mod create_curve;

use crate::host::registry::{NodeRegistry, RegistryError};

/// Registreer alle nodetypes van de plugin.
pub fn register_all(registry: &mut NodeRegistry) -> Result<(), RegistryError> {
    create_curve::register(registry)
}
