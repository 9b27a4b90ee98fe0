//! Attribuutschema's: de typed-attribute metadata die een node één keer
//! declareert bij registratie.

use super::status::{HostError, HostResult};

/// Identifier van een attribuut binnen het schema van één nodetype.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct AttributeId(pub usize);

/// Beschikbare attribuuttypen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Bool,
    Int,
    Float,
    MatrixArray,
    NurbsCurve,
    Compound,
}

impl AttributeKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::MatrixArray => "matrix array",
            Self::NurbsCurve => "nurbs curve",
            Self::Compound => "compound",
        }
    }
}

/// Gedrag wanneer een verbinding naar een array-element wordt verbroken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisconnectBehavior {
    #[default]
    Nothing,
    /// Het element verdwijnt uit de array.
    Delete,
}

/// Standaardwaarde van een numeriek of booleaans attribuut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Int(i32),
    Float(f64),
}

/// Declaratie van één attribuut. Aangemaakt via de typed constructors en
/// verfijnd met de builder-methodes, daarna toegevoegd aan een [`NodeSchema`].
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    pub name: String,
    pub short_name: String,
    pub kind: AttributeKind,
    pub default: Option<DefaultValue>,
    pub readable: bool,
    pub writable: bool,
    pub keyable: bool,
    pub array: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub soft_min: Option<f64>,
    pub soft_max: Option<f64>,
    pub disconnect_behavior: DisconnectBehavior,
    pub children: Vec<AttributeId>,
}

impl AttributeSpec {
    fn new(name: &str, short_name: &str, kind: AttributeKind) -> Self {
        Self {
            name: name.to_owned(),
            short_name: short_name.to_owned(),
            kind,
            default: None,
            readable: true,
            writable: true,
            keyable: false,
            array: false,
            min: None,
            max: None,
            soft_min: None,
            soft_max: None,
            disconnect_behavior: DisconnectBehavior::Nothing,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn bool(name: &str, short_name: &str, default: bool) -> Self {
        let mut spec = Self::new(name, short_name, AttributeKind::Bool);
        spec.default = Some(DefaultValue::Bool(default));
        spec
    }

    #[must_use]
    pub fn int(name: &str, short_name: &str, default: i32) -> Self {
        let mut spec = Self::new(name, short_name, AttributeKind::Int);
        spec.default = Some(DefaultValue::Int(default));
        spec
    }

    #[must_use]
    pub fn float(name: &str, short_name: &str, default: f64) -> Self {
        let mut spec = Self::new(name, short_name, AttributeKind::Float);
        spec.default = Some(DefaultValue::Float(default));
        spec
    }

    #[must_use]
    pub fn matrix_array(name: &str, short_name: &str) -> Self {
        let mut spec = Self::new(name, short_name, AttributeKind::MatrixArray);
        spec.array = true;
        spec
    }

    #[must_use]
    pub fn nurbs_curve(name: &str, short_name: &str) -> Self {
        Self::new(name, short_name, AttributeKind::NurbsCurve)
    }

    #[must_use]
    pub fn compound(name: &str, short_name: &str) -> Self {
        Self::new(name, short_name, AttributeKind::Compound)
    }

    #[must_use]
    pub fn readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    #[must_use]
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    #[must_use]
    pub fn keyable(mut self, keyable: bool) -> Self {
        self.keyable = keyable;
        self
    }

    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    #[must_use]
    pub fn soft_min(mut self, soft_min: f64) -> Self {
        self.soft_min = Some(soft_min);
        self
    }

    #[must_use]
    pub fn soft_max(mut self, soft_max: f64) -> Self {
        self.soft_max = Some(soft_max);
        self
    }

    #[must_use]
    pub fn disconnect_behavior(mut self, behavior: DisconnectBehavior) -> Self {
        self.disconnect_behavior = behavior;
        self
    }
}

/// Het volledige attribuutschema van één nodetype: attributen in
/// declaratievolgorde plus de afhankelijkheden tussen in- en uitgangen.
#[derive(Debug, Clone, Default)]
pub struct NodeSchema {
    attributes: Vec<AttributeSpec>,
    affects: Vec<(AttributeId, AttributeId)>,
}

impl NodeSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Voeg een attribuut toe. Lange en korte namen moeten uniek zijn.
    pub fn add(&mut self, spec: AttributeSpec) -> HostResult<AttributeId> {
        let clash = self.attributes.iter().any(|existing| {
            existing.name == spec.name || existing.short_name == spec.short_name
        });
        if clash {
            return Err(HostError::DuplicateAttribute { name: spec.name });
        }
        self.attributes.push(spec);
        Ok(AttributeId(self.attributes.len() - 1))
    }

    /// Hang een bestaand attribuut onder een compound.
    pub fn add_child(&mut self, parent: AttributeId, child: AttributeId) -> HostResult<()> {
        let parent_spec = self
            .attributes
            .get(parent.0)
            .ok_or(HostError::UnknownPlug)?;
        if parent_spec.kind != AttributeKind::Compound {
            return Err(HostError::NotACompound {
                name: parent_spec.name.clone(),
            });
        }
        self.attributes
            .get(child.0)
            .ok_or(HostError::UnknownPlug)?;
        self.attributes[parent.0].children.push(child);
        Ok(())
    }

    /// Declareer dat `output` opnieuw berekend moet worden wanneer `input`
    /// verandert.
    pub fn attribute_affects(&mut self, input: AttributeId, output: AttributeId) {
        if !self.affects.contains(&(input, output)) {
            self.affects.push((input, output));
        }
    }

    /// Zoek een attribuut op lange of korte naam.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<AttributeId> {
        self.attributes
            .iter()
            .position(|spec| spec.name == name || spec.short_name == name)
            .map(AttributeId)
    }

    #[must_use]
    pub fn get(&self, id: AttributeId) -> Option<&AttributeSpec> {
        self.attributes.get(id.0)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (AttributeId, &AttributeSpec)> {
        self.attributes
            .iter()
            .enumerate()
            .map(|(index, spec)| (AttributeId(index), spec))
    }

    /// Alle ingangen waarvan `output` afhangt.
    #[must_use]
    pub fn affecting(&self, output: AttributeId) -> Vec<AttributeId> {
        self.affects
            .iter()
            .filter(|(_, out)| *out == output)
            .map(|(input, _)| *input)
            .collect()
    }
}
