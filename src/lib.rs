#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Building blocks for plugins that extend a host 3D content-creation
//! application. The centerpiece is the curve-builder node in
//! [`nodes::create_curve`]; the [`host`] module carries the plugin ABI it is
//! written against, and [`geom`] the host-side geometry representation.

pub mod geom;
pub mod host;
pub mod nodes;

use host::registry::{NodeRegistry, RegistryError};
use serde::Serialize;

cfg_if::cfg_if! {
    if #[cfg(feature = "debug_logs")] {
        fn init_logger() {
            use std::sync::Once;
            static INIT: Once = Once::new();
            INIT.call_once(|| {
                env_logger::Builder::from_default_env()
                    .filter_level(log::LevelFilter::Debug)
                    .init();
            });
        }
    } else {
        fn init_logger() {
            // no-op fallback when debug logs are disabled
        }
    }
}

/// Plugin entry point: register every node type with the host registry.
/// Anything that did register is rolled back when a later registration
/// fails.
pub fn initialize_plugin(registry: &mut NodeRegistry) -> Result<(), RegistryError> {
    init_logger();

    if let Err(err) = nodes::register_all(registry) {
        log::error!("plugin initialization failed: {err}");
        let _ = uninitialize_plugin(registry);
        return Err(err);
    }
    Ok(())
}

/// Plugin exit point: deregister every node type again.
pub fn uninitialize_plugin(registry: &mut NodeRegistry) -> Result<(), RegistryError> {
    registry.deregister_node(nodes::create_curve::NODE_TYPE_ID)
}

/// Serializable description of one attribute, for external tooling.
#[derive(Debug, Serialize)]
pub struct AttributeDescription {
    pub name: String,
    pub short_name: String,
    pub kind: &'static str,
    pub keyable: bool,
    pub readable: bool,
    pub writable: bool,
    pub array: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soft_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soft_max: Option<f64>,
}

/// Serializable description of one registered node type.
#[derive(Debug, Serialize)]
pub struct NodeDescription {
    pub name: String,
    pub type_id: String,
    pub attributes: Vec<AttributeDescription>,
}

/// Export the registered node types with their attribute tables.
#[must_use]
pub fn describe_nodes(registry: &NodeRegistry) -> Vec<NodeDescription> {
    registry
        .registrations()
        .map(|(name, type_id, schema)| NodeDescription {
            name: name.to_owned(),
            type_id: type_id.to_string(),
            attributes: schema
                .attributes()
                .map(|(_, spec)| AttributeDescription {
                    name: spec.name.clone(),
                    short_name: spec.short_name.clone(),
                    kind: spec.kind.name(),
                    keyable: spec.keyable,
                    readable: spec.readable,
                    writable: spec.writable,
                    array: spec.array,
                    min: spec.min,
                    max: spec.max,
                    soft_min: spec.soft_min,
                    soft_max: spec.soft_max,
                })
                .collect(),
        })
        .collect()
}
