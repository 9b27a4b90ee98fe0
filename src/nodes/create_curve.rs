//! The curve-builder node: takes an ordered array of transforms and outputs
//! a NURBS curve.
//!
//! Two interpretations of the input are supported. In CV mode the
//! translations become the curve's control polygon and the knot vector is
//! derived analytically. In EP mode the curve is fitted through the
//! translations by the host's edit-point constructor.
//!
//! Degenerate input never leaves the output empty: a placeholder curve is
//! written instead, so downstream consumers can always bind a curve handle
//! to the plug.
//!
//! Note that periodic EP curves aren't fully reliable with fewer than 5 edit
//! points. At degree 3 they're predictable and meet the input even with only
//! 4 points, but at other degrees the fit may miss. Use degree 3, or provide
//! at least 5 points.

use crate::geom::Point3;
use crate::geom::nurbs::{CurveError, CurveForm, NurbsCurve3};
use crate::host::attribute::{AttributeId, AttributeSpec, DisconnectBehavior, NodeSchema};
use crate::host::datablock::{DataBlock, MatrixArrayHandle, Plug};
use crate::host::registry::{DependencyNode, NodeRegistry, NodeTypeId, RegistryError};
use crate::host::status::{HostError, HostResult, StatusAccumulator};

/// Node type name as registered with the host.
pub const NODE_NAME: &str = "curveBuilder";

/// Fixed node type identifier.
pub const NODE_TYPE_ID: NodeTypeId = NodeTypeId(0x0013_44D1);

/// EP fitting destabilizes above this degree.
const MAX_EP_DEGREE: usize = 10;

/// The node's attribute handles, resolved against its schema.
#[derive(Debug, Clone, Copy)]
pub struct CurveAttrs {
    pub ep_curve: AttributeId,
    pub degree: AttributeId,
    pub periodic: AttributeId,
    pub parameter_range: AttributeId,
    pub settings: AttributeId,
    pub input: AttributeId,
    pub output_curve: AttributeId,
}

impl CurveAttrs {
    /// Declare the attribute schema: five inputs, the settings compound and
    /// the output curve, with the output depending on every input.
    pub fn declare(schema: &mut NodeSchema) -> HostResult<Self> {
        // Whether to build a CV or an EP curve.
        let ep_curve = schema.add(
            AttributeSpec::bool("epCurve", "epCurve", false)
                .readable(false)
                .keyable(true),
        )?;

        // The degree of the curve.
        let degree = schema.add(
            AttributeSpec::int("degree", "deg", 3)
                .readable(false)
                .keyable(true)
                .min(1.0)
                .max(50.0)
                .soft_max(10.0),
        )?;

        let periodic = schema.add(
            AttributeSpec::bool("periodic", "periodic", false)
                .readable(false)
                .keyable(true),
        )?;

        // The parameter range for CV curves. EP curves don't use it. The
        // hard minimum prevents division by zero; the soft range keeps the
        // UI sliders usable.
        let parameter_range = schema.add(
            AttributeSpec::float("parameterRange", "parameterRange", 1.0)
                .readable(false)
                .keyable(true)
                .min(0.0001)
                .soft_min(1.0)
                .soft_max(10.0),
        )?;

        // A compound for all basic settings, to allow connecting all
        // settings for nodes with one connection.
        let settings = schema.add(AttributeSpec::compound("settings", "settings"))?;
        for child in [ep_curve, degree, periodic, parameter_range] {
            schema.add_child(settings, child)?;
        }

        let input = schema.add(
            AttributeSpec::matrix_array("input", "i")
                .readable(false)
                .keyable(true)
                .disconnect_behavior(DisconnectBehavior::Delete),
        )?;

        let output_curve =
            schema.add(AttributeSpec::nurbs_curve("outputCurve", "oc").writable(false))?;

        for attr in [ep_curve, degree, periodic, parameter_range, input, settings] {
            schema.attribute_affects(attr, output_curve);
        }

        Ok(Self {
            ep_curve,
            degree,
            periodic,
            parameter_range,
            settings,
            input,
            output_curve,
        })
    }

    /// Resolve the handles against an already-declared schema.
    pub fn from_schema(schema: &NodeSchema) -> HostResult<Self> {
        let find = |name: &str| {
            schema.find(name).ok_or_else(|| HostError::UnknownAttribute {
                name: name.to_owned(),
            })
        };
        Ok(Self {
            ep_curve: find("epCurve")?,
            degree: find("degree")?,
            periodic: find("periodic")?,
            parameter_range: find("parameterRange")?,
            settings: find("settings")?,
            input: find("input")?,
            output_curve: find("outputCurve")?,
        })
    }
}

/// Register the node type with the host registry.
pub fn register(registry: &mut NodeRegistry) -> Result<(), RegistryError> {
    registry.register_node(
        NODE_NAME,
        NODE_TYPE_ID,
        Box::new(|schema: &NodeSchema| {
            let node: Box<dyn DependencyNode> = Box::new(CreateCurveNode::new(schema)?);
            Ok(node)
        }),
        init_schema,
    )
}

fn init_schema(schema: &mut NodeSchema) -> HostResult<()> {
    CurveAttrs::declare(schema).map(|_| ())
}

/// World-space positions of the input transforms: the translation row of
/// each physical element, in stored order. Holes in the sparse array are
/// skipped.
fn extract_translations(handle: &mut MatrixArrayHandle<'_>) -> HostResult<Vec<Point3>> {
    let mut points = Vec::with_capacity(handle.element_count());
    for i in 0..handle.element_count() {
        handle.jump_to_element(i)?;
        points.push(handle.input_value()?.translation());
    }
    Ok(points)
}

/// Derive the knot vector for `cv_count` control points of `degree`.
///
/// Open curves pin the ends to the first and last CV: `degree - 1` copies of
/// the boundary value on each side, e.g. `[0, 0, 0, 0.5, 1, 1, 1]` for 5 CVs
/// of degree 3. Periodic curves space every knot uniformly and start below
/// zero, e.g. `[-2, -1, 0, 1, 2, 3, 4, 5, 6, 7] / 5` for 8 CVs of degree 3.
///
/// Knot values must stay in `f64` all the way: the host validates
/// periodicity with an epsilon small enough that single-precision error
/// makes construction fail at random.
fn build_knots(degree: usize, cv_count: usize, periodic: bool) -> Vec<f64> {
    let spans = cv_count - degree;
    let num_knots = spans + 2 * degree - 1;
    let cnt = num_knots - 2 * (degree - 1) - 1;

    let mut knots = Vec::with_capacity(num_knots);
    if periodic {
        for i in 0..num_knots {
            let knot_index = i as f64 - (degree - 1) as f64;
            knots.push(knot_index / cnt as f64);
        }
    } else {
        for _ in 0..degree - 1 {
            knots.push(0.0);
        }
        for i in 0..=cnt {
            knots.push(i as f64 / cnt as f64);
        }
        for _ in 0..degree - 1 {
            knots.push(1.0);
        }
    }
    knots
}

/// Scale the knots when the parameter range isn't 0-1. Preserves
/// monotonicity and the periodic spacing.
fn scale_knots(knots: &mut [f64], parameter_range: f64) {
    for knot in knots.iter_mut() {
        *knot *= parameter_range;
    }
}

/// CV interpretation: the points become the control polygon.
fn cv_curve(
    mut cvs: Vec<Point3>,
    degree: usize,
    periodic: bool,
    parameter_range: f64,
) -> Result<NurbsCurve3, CurveError> {
    // With 4 CVs we can build up to a degree 3 curve, with 2 CVs a line.
    // Asking for more degree than the CVs support would fail, so clamp.
    let degree = degree.min(cvs.len() - 1);

    // Periodic CV curves duplicate the first `degree` CVs at the end and
    // need at least `degree + 1` CVs before the duplicates. Without enough
    // CVs, fall back to an open curve.
    let mut periodic = periodic;
    if periodic {
        if cvs.len() >= degree + 1 {
            for i in 0..degree {
                cvs.push(cvs[i]);
            }
        } else {
            periodic = false;
        }
    }

    let mut knots = build_knots(degree, cvs.len(), periodic);
    if parameter_range != 1.0 {
        scale_knots(&mut knots, parameter_range);
    }

    let form = if periodic {
        CurveForm::Periodic
    } else {
        CurveForm::Open
    };
    NurbsCurve3::create(cvs, knots, degree, form, false, false)
}

/// EP interpretation: the curve is fitted through the points.
fn ep_curve(
    mut points: Vec<Point3>,
    degree: usize,
    periodic: bool,
) -> Result<NurbsCurve3, CurveError> {
    // The EP fitter destabilizes at high degrees.
    let degree = degree.min(MAX_EP_DEGREE);

    // Periodic EP curves just duplicate the first EP at the end.
    if periodic && !points.is_empty() {
        let first = points[0];
        points.push(first);
    }

    let form = if periodic {
        CurveForm::Periodic
    } else {
        CurveForm::Open
    };
    // Periodic EP curves fail unless the parameterization is uniform.
    NurbsCurve3::create_with_edit_points(&points, degree, form, false, false, true)
}

/// A valid minimal curve: degree 1, open, two CVs at the origin. Written
/// whenever the input can't produce a real curve, so the output plug always
/// binds.
fn placeholder_curve() -> Result<NurbsCurve3, CurveError> {
    NurbsCurve3::create(
        vec![Point3::ORIGIN; 2],
        vec![0.0, 1.0],
        1,
        CurveForm::Open,
        false,
        false,
    )
}

/// The curve-builder node instance.
#[derive(Debug, Clone, Copy)]
pub struct CreateCurveNode {
    attrs: CurveAttrs,
}

impl CreateCurveNode {
    pub fn new(schema: &NodeSchema) -> HostResult<Self> {
        Ok(Self {
            attrs: CurveAttrs::from_schema(schema)?,
        })
    }

    #[must_use]
    pub const fn attrs(&self) -> &CurveAttrs {
        &self.attrs
    }

    /// Build the output curve from the data block's inputs. Degenerate input
    /// degrades to the placeholder; only failed attribute reads and a failed
    /// placeholder are reported as errors.
    fn compute_curve(&self, data: &DataBlock) -> HostResult<NurbsCurve3> {
        let mut status = StatusAccumulator::new();

        let cvs = match status.record("inputArrayValue", data.input_array(self.attrs.input)) {
            Some(mut handle) => status
                .record("inputValue", extract_translations(&mut handle))
                .unwrap_or_default(),
            None => Vec::new(),
        };
        status.checkpoint()?;

        // Fewer than 2 points isn't enough for a curve. Emit the
        // placeholder without reporting an error.
        if cvs.len() < 2 {
            return placeholder_curve().map_err(HostError::from);
        }

        let degree = status
            .record("degree", data.input_int(self.attrs.degree))
            .unwrap_or_default();
        let periodic = status
            .record("periodic", data.input_bool(self.attrs.periodic))
            .unwrap_or_default();
        let ep = status
            .record("epCurve", data.input_bool(self.attrs.ep_curve))
            .unwrap_or_default();
        let parameter_range = status
            .record(
                "parameterRange",
                data.input_float(self.attrs.parameter_range),
            )
            .unwrap_or_default();
        status.checkpoint()?;

        let degree = degree.max(1) as usize;
        let built = if ep {
            ep_curve(cvs, degree, periodic)
        } else {
            cv_curve(cvs, degree, periodic, parameter_range)
        };

        match built {
            Ok(curve) => Ok(curve),
            Err(err) => {
                // Construction failures degrade to the placeholder; only
                // the placeholder itself failing is fatal.
                log::error!("{NODE_NAME}: curve construction failed: {err}");
                placeholder_curve().map_err(HostError::from)
            }
        }
    }
}

impl DependencyNode for CreateCurveNode {
    fn compute(&mut self, plug: &Plug, data: &mut DataBlock) -> HostResult<()> {
        if plug.attribute != self.attrs.output_curve {
            return Err(HostError::UnknownPlug);
        }

        // An array plug with connected elements: compute every connected
        // child, then mark the whole array clean.
        if plug.element.is_none() {
            let connected = data.connected_elements(plug.attribute).to_vec();
            if !connected.is_empty() {
                for element in connected {
                    self.compute(&Plug::array_element(plug.attribute, element), data)?;
                }
                data.set_array_clean(plug.attribute);
                return Ok(());
            }
        }

        let curve = self.compute_curve(data)?;
        let mut handle = data.output_curve(plug)?;
        handle.set(curve);
        handle.set_clean();
        Ok(())
    }
}
