//! Datablock: de per-evaluatie views op input- en outputwaarden van een
//! node. Eigendom van de host voor de duur van één compute-aanroep.

use std::collections::{HashMap, HashSet};

use crate::geom::Transform;
use crate::geom::nurbs::NurbsCurve3;

use super::attribute::{AttributeId, AttributeKind, DefaultValue, NodeSchema};
use super::status::{HostError, HostResult};

/// Waarde van één attribuut in het datablock.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i32),
    Float(f64),
    MatrixArray(MatrixArray),
    NurbsCurve(Option<NurbsCurve3>),
}

impl AttrValue {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::MatrixArray(_) => "matrix array",
            Self::NurbsCurve(_) => "nurbs curve",
        }
    }
}

/// Sparse matrix-array: logische index → matrix. De host staat gaten toe;
/// fysieke elementen behouden hun opslagvolgorde.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatrixArray {
    elements: Vec<(u32, Transform)>,
}

impl MatrixArray {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zet de waarde op een logische index. Bestaande elementen worden
    /// overschreven, nieuwe achteraan toegevoegd.
    pub fn set(&mut self, logical_index: u32, value: Transform) {
        if let Some(entry) = self
            .elements
            .iter_mut()
            .find(|(index, _)| *index == logical_index)
        {
            entry.1 = value;
        } else {
            self.elements.push((logical_index, value));
        }
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl FromIterator<(u32, Transform)> for MatrixArray {
    fn from_iter<I: IntoIterator<Item = (u32, Transform)>>(iter: I) -> Self {
        let mut array = Self::new();
        for (index, value) in iter {
            array.set(index, value);
        }
        array
    }
}

/// Cursor over de fysieke elementen van een [`MatrixArray`].
#[derive(Debug)]
pub struct MatrixArrayHandle<'a> {
    elements: &'a [(u32, Transform)],
    position: usize,
}

impl<'a> MatrixArrayHandle<'a> {
    fn new(array: &'a MatrixArray) -> Self {
        Self {
            elements: &array.elements,
            position: 0,
        }
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Spring naar het fysieke element op positie `index`.
    pub fn jump_to_element(&mut self, index: usize) -> HostResult<()> {
        if index >= self.elements.len() {
            return Err(HostError::MissingElement {
                index,
                count: self.elements.len(),
            });
        }
        self.position = index;
        Ok(())
    }

    /// De waarde van het huidige element.
    pub fn input_value(&self) -> HostResult<&'a Transform> {
        self.elements
            .get(self.position)
            .map(|(_, value)| value)
            .ok_or(HostError::NoCurrentElement)
    }

    /// De logische index van het huidige element.
    pub fn logical_index(&self) -> HostResult<u32> {
        self.elements
            .get(self.position)
            .map(|(index, _)| *index)
            .ok_or(HostError::NoCurrentElement)
    }
}

/// Adres van een te berekenen waarde: een attribuut, eventueel met een
/// array-elementindex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Plug {
    pub attribute: AttributeId,
    pub element: Option<usize>,
}

impl Plug {
    #[must_use]
    pub const fn new(attribute: AttributeId) -> Self {
        Self {
            attribute,
            element: None,
        }
    }

    #[must_use]
    pub const fn array_element(attribute: AttributeId, element: usize) -> Self {
        Self {
            attribute,
            element: Some(element),
        }
    }
}

#[derive(Debug, Clone)]
struct SlotInfo {
    name: String,
    kind: AttributeKind,
    min: Option<f64>,
    max: Option<f64>,
}

/// Outputslot met een curvewaarde en een clean-vlag.
#[derive(Debug, Clone, Default)]
struct OutputSlot {
    curve: Option<NurbsCurve3>,
    clean: bool,
}

/// Schrijfbare handle op een outputslot.
#[derive(Debug)]
pub struct CurveOutputHandle<'a> {
    slot: &'a mut OutputSlot,
}

impl CurveOutputHandle<'_> {
    /// De curve die het slot op dit moment bevat, indien aanwezig.
    #[must_use]
    pub fn as_curve(&self) -> Option<&NurbsCurve3> {
        self.slot.curve.as_ref()
    }

    pub fn set(&mut self, curve: NurbsCurve3) {
        self.slot.curve = Some(curve);
    }

    pub fn set_clean(&mut self) {
        self.slot.clean = true;
    }
}

/// Het datablock van één node-instantie voor één evaluatie.
#[derive(Debug, Clone)]
pub struct DataBlock {
    info: Vec<SlotInfo>,
    values: HashMap<AttributeId, AttrValue>,
    outputs: HashMap<(AttributeId, Option<usize>), OutputSlot>,
    connected: HashMap<AttributeId, Vec<usize>>,
    clean_arrays: HashSet<AttributeId>,
}

impl DataBlock {
    /// Maak een datablock met de standaardwaarden uit het schema.
    #[must_use]
    pub fn new(schema: &NodeSchema) -> Self {
        let mut info = Vec::new();
        let mut values = HashMap::new();

        for (id, spec) in schema.attributes() {
            info.push(SlotInfo {
                name: spec.name.clone(),
                kind: spec.kind,
                min: spec.min,
                max: spec.max,
            });

            let value = match spec.kind {
                AttributeKind::Bool => Some(AttrValue::Bool(matches!(
                    spec.default,
                    Some(DefaultValue::Bool(true))
                ))),
                AttributeKind::Int => Some(AttrValue::Int(match spec.default {
                    Some(DefaultValue::Int(v)) => v,
                    _ => 0,
                })),
                AttributeKind::Float => Some(AttrValue::Float(match spec.default {
                    Some(DefaultValue::Float(v)) => v,
                    _ => 0.0,
                })),
                AttributeKind::MatrixArray => Some(AttrValue::MatrixArray(MatrixArray::new())),
                AttributeKind::NurbsCurve | AttributeKind::Compound => None,
            };
            if let Some(value) = value {
                values.insert(id, value);
            }
        }

        Self {
            info,
            values,
            outputs: HashMap::new(),
            connected: HashMap::new(),
            clean_arrays: HashSet::new(),
        }
    }

    fn slot_name(&self, attribute: AttributeId) -> String {
        self.info
            .get(attribute.0)
            .map_or_else(|| format!("#{}", attribute.0), |slot| slot.name.clone())
    }

    /// Zet een inputwaarde. Numerieke waarden worden op het bereik uit het
    /// schema vastgeklemd, zoals de host dat doet.
    pub fn set_input(&mut self, attribute: AttributeId, value: AttrValue) -> HostResult<()> {
        let Some(slot) = self.info.get(attribute.0) else {
            return Err(HostError::UnknownAttribute {
                name: self.slot_name(attribute),
            });
        };

        let expected = match slot.kind {
            AttributeKind::Bool => "bool",
            AttributeKind::Int => "int",
            AttributeKind::Float => "float",
            AttributeKind::MatrixArray => "matrix array",
            AttributeKind::NurbsCurve => "nurbs curve",
            AttributeKind::Compound => "compound",
        };
        let matches_kind = matches!(
            (&value, slot.kind),
            (AttrValue::Bool(_), AttributeKind::Bool)
                | (AttrValue::Int(_), AttributeKind::Int)
                | (AttrValue::Float(_), AttributeKind::Float)
                | (AttrValue::MatrixArray(_), AttributeKind::MatrixArray)
        );
        if !matches_kind {
            return Err(HostError::AttributeTypeMismatch {
                name: slot.name.clone(),
                expected,
                found: value.kind_name(),
            });
        }

        let value = match value {
            AttrValue::Int(v) => {
                let mut v = f64::from(v);
                if let Some(min) = slot.min {
                    v = v.max(min);
                }
                if let Some(max) = slot.max {
                    v = v.min(max);
                }
                #[allow(clippy::cast_possible_truncation)]
                let v = v as i32;
                AttrValue::Int(v)
            }
            AttrValue::Float(v) => {
                let mut v = v;
                if let Some(min) = slot.min {
                    v = v.max(min);
                }
                if let Some(max) = slot.max {
                    v = v.min(max);
                }
                AttrValue::Float(v)
            }
            other => other,
        };

        self.values.insert(attribute, value);
        Ok(())
    }

    fn input(&self, attribute: AttributeId, expected: &'static str) -> HostResult<&AttrValue> {
        self.values
            .get(&attribute)
            .ok_or_else(|| match self.info.get(attribute.0) {
                Some(slot) => HostError::AttributeTypeMismatch {
                    name: slot.name.clone(),
                    expected,
                    found: slot.kind.name(),
                },
                None => HostError::UnknownAttribute {
                    name: self.slot_name(attribute),
                },
            })
    }

    pub fn input_bool(&self, attribute: AttributeId) -> HostResult<bool> {
        match self.input(attribute, "bool")? {
            AttrValue::Bool(v) => Ok(*v),
            other => Err(HostError::AttributeTypeMismatch {
                name: self.slot_name(attribute),
                expected: "bool",
                found: other.kind_name(),
            }),
        }
    }

    pub fn input_int(&self, attribute: AttributeId) -> HostResult<i32> {
        match self.input(attribute, "int")? {
            AttrValue::Int(v) => Ok(*v),
            other => Err(HostError::AttributeTypeMismatch {
                name: self.slot_name(attribute),
                expected: "int",
                found: other.kind_name(),
            }),
        }
    }

    pub fn input_float(&self, attribute: AttributeId) -> HostResult<f64> {
        match self.input(attribute, "float")? {
            AttrValue::Float(v) => Ok(*v),
            other => Err(HostError::AttributeTypeMismatch {
                name: self.slot_name(attribute),
                expected: "float",
                found: other.kind_name(),
            }),
        }
    }

    /// Cursor over de fysieke elementen van een matrix-array input.
    pub fn input_array(&self, attribute: AttributeId) -> HostResult<MatrixArrayHandle<'_>> {
        match self.input(attribute, "matrix array")? {
            AttrValue::MatrixArray(array) => Ok(MatrixArrayHandle::new(array)),
            other => Err(HostError::AttributeTypeMismatch {
                name: self.slot_name(attribute),
                expected: "matrix array",
                found: other.kind_name(),
            }),
        }
    }

    /// Verbonden elementen van een output-arrayplug.
    #[must_use]
    pub fn connected_elements(&self, attribute: AttributeId) -> &[usize] {
        self.connected
            .get(&attribute)
            .map_or(&[], Vec::as_slice)
    }

    pub fn set_connected_elements(&mut self, attribute: AttributeId, elements: Vec<usize>) {
        self.connected.insert(attribute, elements);
    }

    /// Schrijfbare handle op het outputslot van een plug. Het slot wordt
    /// aangemaakt zodra het voor het eerst wordt opgevraagd.
    pub fn output_curve(&mut self, plug: &Plug) -> HostResult<CurveOutputHandle<'_>> {
        let Some(slot) = self.info.get(plug.attribute.0) else {
            return Err(HostError::UnknownAttribute {
                name: self.slot_name(plug.attribute),
            });
        };
        if slot.kind != AttributeKind::NurbsCurve {
            return Err(HostError::AttributeTypeMismatch {
                name: slot.name.clone(),
                expected: "nurbs curve",
                found: slot.kind.name(),
            });
        }

        let slot = self
            .outputs
            .entry((plug.attribute, plug.element))
            .or_default();
        Ok(CurveOutputHandle { slot })
    }

    /// Markeer een output-arrayplug als geheel schoon.
    pub fn set_array_clean(&mut self, attribute: AttributeId) {
        self.clean_arrays.insert(attribute);
    }

    #[must_use]
    pub fn array_is_clean(&self, attribute: AttributeId) -> bool {
        self.clean_arrays.contains(&attribute)
    }

    /// De curve in een outputslot, indien er een geschreven is.
    #[must_use]
    pub fn output_curve_value(&self, plug: &Plug) -> Option<&NurbsCurve3> {
        self.outputs
            .get(&(plug.attribute, plug.element))
            .and_then(|slot| slot.curve.as_ref())
    }

    #[must_use]
    pub fn is_clean(&self, plug: &Plug) -> bool {
        self.outputs
            .get(&(plug.attribute, plug.element))
            .is_some_and(|slot| slot.clean)
    }
}

#[cfg(test)]
mod tests {
    use super::{AttrValue, DataBlock, MatrixArray, Plug};
    use crate::geom::Transform;
    use crate::host::attribute::{AttributeSpec, NodeSchema};
    use crate::host::status::HostError;

    fn schema_with_basics() -> NodeSchema {
        let mut schema = NodeSchema::new();
        schema
            .add(AttributeSpec::int("degree", "deg", 3).min(1.0).max(50.0))
            .unwrap();
        schema
            .add(AttributeSpec::float("parameterRange", "parameterRange", 1.0).min(0.0001))
            .unwrap();
        schema
            .add(AttributeSpec::matrix_array("input", "i"))
            .unwrap();
        schema
            .add(AttributeSpec::nurbs_curve("outputCurve", "oc").writable(false))
            .unwrap();
        schema
    }

    #[test]
    fn defaults_come_from_the_schema() {
        let schema = schema_with_basics();
        let block = DataBlock::new(&schema);
        let degree = schema.find("degree").unwrap();
        let range = schema.find("parameterRange").unwrap();

        assert_eq!(block.input_int(degree).unwrap(), 3);
        assert_eq!(block.input_float(range).unwrap(), 1.0);
        assert_eq!(block.input_array(schema.find("input").unwrap()).unwrap().element_count(), 0);
    }

    #[test]
    fn numeric_inputs_clamp_to_schema_range() {
        let schema = schema_with_basics();
        let mut block = DataBlock::new(&schema);
        let degree = schema.find("degree").unwrap();
        let range = schema.find("parameterRange").unwrap();

        block.set_input(degree, AttrValue::Int(0)).unwrap();
        assert_eq!(block.input_int(degree).unwrap(), 1);
        block.set_input(degree, AttrValue::Int(99)).unwrap();
        assert_eq!(block.input_int(degree).unwrap(), 50);

        block.set_input(range, AttrValue::Float(0.0)).unwrap();
        assert_eq!(block.input_float(range).unwrap(), 0.0001);
    }

    #[test]
    fn type_mismatch_is_reported_with_names() {
        let schema = schema_with_basics();
        let mut block = DataBlock::new(&schema);
        let degree = schema.find("degree").unwrap();

        let err = block.set_input(degree, AttrValue::Bool(true)).unwrap_err();
        match err {
            HostError::AttributeTypeMismatch { name, expected, found } => {
                assert_eq!(name, "degree");
                assert_eq!(expected, "int");
                assert_eq!(found, "bool");
            }
            other => panic!("onverwachte fout: {other:?}"),
        }
    }

    #[test]
    fn sparse_array_iterates_physical_elements_in_stored_order() {
        let array: MatrixArray = [
            (0, Transform::from_translation(0.0, 0.0, 0.0)),
            (2, Transform::from_translation(1.0, 0.0, 0.0)),
            (7, Transform::from_translation(2.0, 0.0, 0.0)),
        ]
        .into_iter()
        .collect();

        let schema = schema_with_basics();
        let mut block = DataBlock::new(&schema);
        let input = schema.find("input").unwrap();
        block
            .set_input(input, AttrValue::MatrixArray(array))
            .unwrap();

        let mut handle = block.input_array(input).unwrap();
        assert_eq!(handle.element_count(), 3);

        let mut xs = Vec::new();
        for i in 0..handle.element_count() {
            handle.jump_to_element(i).unwrap();
            xs.push(handle.input_value().unwrap().translation().x);
        }
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);

        handle.jump_to_element(1).unwrap();
        assert_eq!(handle.logical_index().unwrap(), 2);

        let err = handle.jump_to_element(3).unwrap_err();
        assert!(matches!(err, HostError::MissingElement { index: 3, count: 3 }));
    }

    #[test]
    fn output_slot_starts_empty_and_remembers_the_curve() {
        let schema = schema_with_basics();
        let mut block = DataBlock::new(&schema);
        let output = schema.find("outputCurve").unwrap();
        let plug = Plug::new(output);

        {
            let handle = block.output_curve(&plug).unwrap();
            assert!(handle.as_curve().is_none());
        }
        assert!(!block.is_clean(&plug));

        {
            let mut handle = block.output_curve(&plug).unwrap();
            let curve = crate::geom::NurbsCurve3::create(
                vec![
                    crate::geom::Point3::ORIGIN,
                    crate::geom::Point3::new(1.0, 0.0, 0.0),
                ],
                vec![0.0, 1.0],
                1,
                crate::geom::CurveForm::Open,
                false,
                false,
            )
            .unwrap();
            handle.set(curve);
            handle.set_clean();
        }

        assert!(block.is_clean(&plug));
        assert!(block.output_curve_value(&plug).is_some());
    }
}
