//! Registratie van nodetypes bij de host, plus de naamgenerator voor
//! sessie-unieke namen.

use core::fmt;

use super::attribute::NodeSchema;
use super::datablock::{DataBlock, Plug};
use super::status::{HostError, HostResult};

/// Vast, uniek identificatienummer van een nodetype.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeTypeId(pub u32);

impl fmt::Display for NodeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Een dependency-node: de host roept `compute` aan wanneer een consument
/// een outputplug opvraagt.
pub trait DependencyNode {
    fn compute(&mut self, plug: &Plug, data: &mut DataBlock) -> HostResult<()>;
}

/// Fabriek die een node-instantie maakt op basis van het schema.
pub type NodeFactory = Box<dyn Fn(&NodeSchema) -> HostResult<Box<dyn DependencyNode>>>;

/// Initialisatie die het attribuutschema van een nodetype opbouwt.
pub type NodeInit = fn(&mut NodeSchema) -> HostResult<()>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("node type id {0} is already registered")]
    DuplicateTypeId(NodeTypeId),
    #[error("node name `{0}` is already registered")]
    DuplicateName(String),
    #[error("node type id {0} is not registered")]
    UnknownTypeId(NodeTypeId),
    #[error("initialization of node `{name}` failed: {source}")]
    InitFailed { name: String, source: HostError },
    #[error("creation of node `{name}` failed: {source}")]
    CreationFailed { name: String, source: HostError },
}

struct Registration {
    name: String,
    type_id: NodeTypeId,
    factory: NodeFactory,
    schema: NodeSchema,
}

/// De registry waarin een plugin zijn nodetypes aanmeldt.
#[derive(Default)]
pub struct NodeRegistry {
    nodes: Vec<Registration>,
}

impl NodeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registreer een nodetype. `init` bouwt het attribuutschema één keer
    /// op; `factory` maakt daarna instanties.
    pub fn register_node(
        &mut self,
        name: &str,
        type_id: NodeTypeId,
        factory: NodeFactory,
        init: NodeInit,
    ) -> Result<(), RegistryError> {
        if self.nodes.iter().any(|node| node.type_id == type_id) {
            return Err(RegistryError::DuplicateTypeId(type_id));
        }
        if self.nodes.iter().any(|node| node.name == name) {
            return Err(RegistryError::DuplicateName(name.to_owned()));
        }

        let mut schema = NodeSchema::new();
        init(&mut schema).map_err(|source| RegistryError::InitFailed {
            name: name.to_owned(),
            source,
        })?;

        self.nodes.push(Registration {
            name: name.to_owned(),
            type_id,
            factory,
            schema,
        });
        Ok(())
    }

    /// Verwijder een eerder geregistreerd nodetype.
    pub fn deregister_node(&mut self, type_id: NodeTypeId) -> Result<(), RegistryError> {
        let position = self
            .nodes
            .iter()
            .position(|node| node.type_id == type_id)
            .ok_or(RegistryError::UnknownTypeId(type_id))?;
        self.nodes.remove(position);
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, type_id: NodeTypeId) -> bool {
        self.nodes.iter().any(|node| node.type_id == type_id)
    }

    /// Maak een instantie van een geregistreerd nodetype.
    pub fn create_node(&self, type_id: NodeTypeId) -> Result<Box<dyn DependencyNode>, RegistryError> {
        let registration = self
            .nodes
            .iter()
            .find(|node| node.type_id == type_id)
            .ok_or(RegistryError::UnknownTypeId(type_id))?;
        (registration.factory)(&registration.schema).map_err(|source| {
            RegistryError::CreationFailed {
                name: registration.name.clone(),
                source,
            }
        })
    }

    /// Het attribuutschema van een geregistreerd nodetype.
    #[must_use]
    pub fn schema(&self, type_id: NodeTypeId) -> Option<&NodeSchema> {
        self.nodes
            .iter()
            .find(|node| node.type_id == type_id)
            .map(|node| &node.schema)
    }

    /// Alle registraties, in registratievolgorde.
    pub fn registrations(&self) -> impl Iterator<Item = (&str, NodeTypeId, &NodeSchema)> {
        self.nodes
            .iter()
            .map(|node| (node.name.as_str(), node.type_id, &node.schema))
    }
}

/// Teller voor sessie-unieke namen, eigendom van de laadcontext van de
/// plugin. Uniek binnen één hostsessie is voldoende.
#[derive(Debug, Default)]
pub struct UniqueIdSource {
    next: u64,
}

impl UniqueIdSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// De volgende unieke naam met het gegeven voorvoegsel.
    pub fn next_name(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}{}", self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::{DependencyNode, NodeRegistry, NodeTypeId, RegistryError, UniqueIdSource};
    use crate::host::attribute::{AttributeSpec, NodeSchema};
    use crate::host::datablock::{DataBlock, Plug};
    use crate::host::status::HostResult;

    struct NoopNode;

    impl DependencyNode for NoopNode {
        fn compute(&mut self, _plug: &Plug, _data: &mut DataBlock) -> HostResult<()> {
            Ok(())
        }
    }

    fn noop_factory(_schema: &NodeSchema) -> HostResult<Box<dyn DependencyNode>> {
        Ok(Box::new(NoopNode))
    }

    fn noop_init(schema: &mut NodeSchema) -> HostResult<()> {
        schema.add(AttributeSpec::bool("flag", "f", false))?;
        Ok(())
    }

    #[test]
    fn register_create_and_deregister() {
        let mut registry = NodeRegistry::new();
        let id = NodeTypeId(0x42);
        registry
            .register_node("noop", id, Box::new(noop_factory), noop_init)
            .unwrap();

        assert!(registry.is_registered(id));
        assert!(registry.schema(id).unwrap().find("flag").is_some());
        assert!(registry.create_node(id).is_ok());

        registry.deregister_node(id).unwrap();
        assert!(!registry.is_registered(id));
        assert!(matches!(
            registry.deregister_node(id),
            Err(RegistryError::UnknownTypeId(_))
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = NodeRegistry::new();
        let id = NodeTypeId(0x42);
        registry
            .register_node("noop", id, Box::new(noop_factory), noop_init)
            .unwrap();

        let err = registry
            .register_node("other", id, Box::new(noop_factory), noop_init)
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTypeId(_)));

        let err = registry
            .register_node(
                "noop",
                NodeTypeId(0x43),
                Box::new(noop_factory),
                noop_init,
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(_)));
    }

    #[test]
    fn unique_names_increase() {
        let mut ids = UniqueIdSource::new();
        assert_eq!(ids.next_name("curve"), "curve1");
        assert_eq!(ids.next_name("curve"), "curve2");
        assert_eq!(ids.next_name("handle"), "handle3");
    }
}
