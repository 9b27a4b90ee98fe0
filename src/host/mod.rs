//! De host-plugin-ABI: attribuutschema's, datablocks, registratie en
//! statusafhandeling. Dit is de vorm waarin de host met nodes praat.

pub mod attribute;
pub mod datablock;
pub mod registry;
pub mod status;

pub use attribute::{AttributeId, AttributeKind, AttributeSpec, DisconnectBehavior, NodeSchema};
pub use datablock::{AttrValue, CurveOutputHandle, DataBlock, MatrixArray, MatrixArrayHandle, Plug};
pub use registry::{DependencyNode, NodeRegistry, NodeTypeId, RegistryError, UniqueIdSource};
pub use status::{HostError, HostResult, StatusAccumulator};
