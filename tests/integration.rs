use curvekit::geom::nurbs::CurveForm;
use curvekit::geom::{Point3, Tolerance, Transform};
use curvekit::host::attribute::AttributeId;
use curvekit::host::datablock::{AttrValue, DataBlock, MatrixArray, Plug};
use curvekit::host::registry::{DependencyNode, NodeRegistry};
use curvekit::nodes::create_curve::{NODE_NAME, NODE_TYPE_ID};
use curvekit::{describe_nodes, initialize_plugin, uninitialize_plugin};

fn loaded_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    initialize_plugin(&mut registry).expect("plugin registers");
    registry
}

fn attr(registry: &NodeRegistry, name: &str) -> AttributeId {
    registry
        .schema(NODE_TYPE_ID)
        .expect("schema registered")
        .find(name)
        .expect("attribute declared")
}

fn translations_block(registry: &NodeRegistry, points: &[[f64; 3]]) -> DataBlock {
    let schema = registry.schema(NODE_TYPE_ID).expect("schema registered");
    let mut block = DataBlock::new(schema);
    let array: MatrixArray = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as u32, Transform::from_translation(p[0], p[1], p[2])))
        .collect();
    block
        .set_input(schema.find("input").unwrap(), AttrValue::MatrixArray(array))
        .unwrap();
    block
}

#[test]
fn plugin_registers_and_deregisters() {
    let mut registry = loaded_registry();
    assert!(registry.is_registered(NODE_TYPE_ID));

    uninitialize_plugin(&mut registry).expect("plugin deregisters");
    assert!(!registry.is_registered(NODE_TYPE_ID));
}

#[test]
fn output_depends_on_every_input() {
    let registry = loaded_registry();
    let schema = registry.schema(NODE_TYPE_ID).unwrap();
    let output = schema.find("outputCurve").unwrap();

    let affecting = schema.affecting(output);
    for name in ["epCurve", "degree", "periodic", "parameterRange", "input", "settings"] {
        assert!(
            affecting.contains(&schema.find(name).unwrap()),
            "outputCurve should depend on {name}"
        );
    }
}

#[test]
fn open_cubic_from_five_transforms() {
    let registry = loaded_registry();
    let mut node = registry.create_node(NODE_TYPE_ID).expect("node created");

    let points = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [2.0, 1.0, 0.0],
        [3.0, 0.0, 0.0],
        [4.0, 0.0, 0.0],
    ];
    let mut block = translations_block(&registry, &points);
    let plug = Plug::new(attr(&registry, "outputCurve"));

    node.compute(&plug, &mut block).expect("compute succeeds");

    let curve = block.output_curve_value(&plug).expect("curve written");
    assert_eq!(curve.degree, 3);
    assert_eq!(curve.form, CurveForm::Open);
    assert_eq!(curve.knots, vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0]);
    assert_eq!(curve.control_points.len(), 5);

    // A clamped curve interpolates its end control points.
    let tol = Tolerance::default_geom();
    let (a, b) = curve.domain();
    assert!(tol.approx_eq_point3(curve.point_at(a), Point3::new(0.0, 0.0, 0.0)));
    assert!(tol.approx_eq_point3(curve.point_at(b), Point3::new(4.0, 0.0, 0.0)));
}

#[test]
fn periodic_cubic_from_five_transforms() {
    let registry = loaded_registry();
    let mut node = registry.create_node(NODE_TYPE_ID).expect("node created");

    let points = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [2.0, 1.0, 0.0],
        [3.0, 0.0, 0.0],
        [4.0, 0.0, 0.0],
    ];
    let mut block = translations_block(&registry, &points);
    block
        .set_input(attr(&registry, "periodic"), AttrValue::Bool(true))
        .unwrap();
    let plug = Plug::new(attr(&registry, "outputCurve"));

    node.compute(&plug, &mut block).expect("compute succeeds");

    let curve = block.output_curve_value(&plug).expect("curve written");
    assert_eq!(curve.form, CurveForm::Periodic);
    assert_eq!(curve.control_points.len(), 8);
    assert_eq!(
        curve.knots,
        vec![-0.4, -0.2, 0.0, 0.2, 0.4, 0.6, 0.8, 1.0, 1.2, 1.4]
    );

    // Uniform spacing everywhere, to a far tighter epsilon than the host's.
    for pair in curve.knots.windows(2) {
        assert!((pair[1] - pair[0] - 0.2).abs() < 1e-12);
    }
}

#[test]
fn edit_point_periodic_square_closes() {
    let registry = loaded_registry();
    let mut node = registry.create_node(NODE_TYPE_ID).expect("node created");

    let points = [
        [0.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [2.0, 2.0, 0.0],
        [0.0, 2.0, 0.0],
    ];
    let mut block = translations_block(&registry, &points);
    block
        .set_input(attr(&registry, "epCurve"), AttrValue::Bool(true))
        .unwrap();
    block
        .set_input(attr(&registry, "periodic"), AttrValue::Bool(true))
        .unwrap();
    let plug = Plug::new(attr(&registry, "outputCurve"));

    node.compute(&plug, &mut block).expect("compute succeeds");

    let curve = block.output_curve_value(&plug).expect("curve written");
    assert_eq!(curve.form, CurveForm::Periodic);
    assert!(curve.is_closed(Tolerance::new(1e-8)));

    let tol = Tolerance::new(1e-8);
    let (a, b) = curve.domain();
    assert!(tol.approx_eq_point3(curve.point_at(a), Point3::new(0.0, 0.0, 0.0)));
    assert!(tol.approx_eq_point3(curve.point_at(b), Point3::new(0.0, 0.0, 0.0)));
}

#[test]
fn empty_input_still_binds_a_curve() {
    let registry = loaded_registry();
    let mut node = registry.create_node(NODE_TYPE_ID).expect("node created");

    let mut block = translations_block(&registry, &[]);
    let plug = Plug::new(attr(&registry, "outputCurve"));

    node.compute(&plug, &mut block).expect("compute succeeds");

    let curve = block.output_curve_value(&plug).expect("placeholder written");
    assert_eq!(curve.degree, 1);
    assert_eq!(curve.knots, vec![0.0, 1.0]);
    assert_eq!(curve.control_points, vec![Point3::ORIGIN, Point3::ORIGIN]);
    assert!(block.is_clean(&plug));
}

#[test]
fn recompute_overwrites_the_previous_curve() {
    let registry = loaded_registry();
    let mut node = registry.create_node(NODE_TYPE_ID).expect("node created");

    let mut block = translations_block(
        &registry,
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
    );
    let plug = Plug::new(attr(&registry, "outputCurve"));
    node.compute(&plug, &mut block).expect("first compute");
    assert_eq!(
        block.output_curve_value(&plug).unwrap().control_points.len(),
        3
    );

    // Drop to a single point: the slot degrades to the placeholder instead
    // of going empty.
    let array: MatrixArray = [(0, Transform::from_translation(9.0, 9.0, 9.0))]
        .into_iter()
        .collect();
    block
        .set_input(attr(&registry, "input"), AttrValue::MatrixArray(array))
        .unwrap();
    node.compute(&plug, &mut block).expect("second compute");

    let curve = block.output_curve_value(&plug).unwrap();
    assert_eq!(curve.control_points, vec![Point3::ORIGIN, Point3::ORIGIN]);
}

#[test]
fn node_description_matches_the_schema() {
    let registry = loaded_registry();
    let descriptions = describe_nodes(&registry);
    assert_eq!(descriptions.len(), 1);

    let node = &descriptions[0];
    assert_eq!(node.name, NODE_NAME);
    assert_eq!(node.type_id, "0x1344d1");
    assert_eq!(node.attributes.len(), 7);

    let degree = node
        .attributes
        .iter()
        .find(|a| a.name == "degree")
        .expect("degree declared");
    assert_eq!(degree.short_name, "deg");
    assert_eq!(degree.min, Some(1.0));
    assert_eq!(degree.max, Some(50.0));
    assert_eq!(degree.soft_max, Some(10.0));
    assert!(degree.keyable);

    let output = node
        .attributes
        .iter()
        .find(|a| a.name == "outputCurve")
        .expect("outputCurve declared");
    assert!(output.readable);
    assert!(!output.writable);
}
