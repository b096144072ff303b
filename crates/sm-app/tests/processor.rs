use sm_app::signature::*;
use sm_app::*;
use sm_fmu::{bouncing_ball, BackendRegistry, FmuError};
use sm_model::*;
use sm_sim::{RunState, SimError};
use std::sync::Arc;

const SUBMODEL_ID: &str = "https://example.com/ids/sm/4163_9072_2032_6099";

fn file(id_short: &str, semantic: &str, value: &str) -> SubmodelElement {
    SubmodelElement::File(File {
        id_short: id_short.to_string(),
        semantic_id: Some(Reference::global(semantic)),
        content_type: None,
        value: Some(value.to_string()),
    })
}

fn collection(id_short: &str, semantic: &str, value: Vec<SubmodelElement>) -> SubmodelElement {
    SubmodelElement::SubmodelElementCollection(ElementCollection {
        id_short: Some(id_short.to_string()),
        semantic_id: Some(Reference::global(semantic)),
        qualifiers: vec![],
        value,
    })
}

fn model(id_short: &str, fmu_path: &str, param_path: Option<&str>) -> SubmodelElement {
    let mut children = vec![collection(
        "ModelFile",
        SEMANTIC_ID_MODEL_FILE,
        vec![collection(
            "ModelFileVersion01",
            SEMANTIC_ID_MODEL_FILE_VERSION,
            vec![file("DigitalFile", SEMANTIC_ID_DIGITAL_FILE, fmu_path)],
        )],
    )];
    if let Some(path) = param_path {
        children.push(file("ParamFile", SEMANTIC_ID_PARAM_FILE, path));
    }
    collection(id_short, SEMANTIC_ID_SIMULATION_MODEL, children)
}

fn submodel(elements: Vec<SubmodelElement>) -> Submodel {
    Submodel {
        id: SUBMODEL_ID.to_string(),
        id_short: Some("SimulationModels".to_string()),
        semantic_id: Some(Reference::global(SEMANTIC_ID_SIMULATION_MODELS)),
        submodel_elements: elements,
    }
}

struct Fixture {
    files: Arc<InMemoryFileStore>,
    operations: Arc<InMemoryOperations>,
}

impl Fixture {
    fn new() -> Self {
        let files = Arc::new(InMemoryFileStore::new());
        files.insert("/aasx/BouncingBall.fmu", bouncing_ball::package().unwrap());
        Self {
            files,
            operations: Arc::new(InMemoryOperations::new()),
        }
    }

    fn processor(&self, config: ProcessorConfig) -> SimulationProcessor {
        SimulationProcessor::new(
            config,
            BackendRegistry::with_builtin(),
            self.files.clone(),
            self.operations.clone(),
        )
    }

    fn invoke(&self, operation: &str, input: &[OperationVariable]) -> AppResult<Vec<OperationVariable>> {
        self.operations
            .invoke(&Reference::for_submodel(SUBMODEL_ID, [operation]), input, &[])
    }
}

fn arg(name: &str, t: DataType, value: &str) -> OperationVariable {
    Property::new(name, t).with_value(value).into()
}

fn run_args(steps: &str) -> Vec<OperationVariable> {
    vec![
        arg(ARG_CURRENT_TIME, DataType::Double, "0"),
        arg(ARG_TIME_STEP, DataType::Double, "0.01"),
        arg(ARG_STEP_COUNT, DataType::Integer, steps),
    ]
}

fn property_value(element: &SubmodelElement, name: &str) -> String {
    element
        .children()
        .iter()
        .filter_map(SubmodelElement::as_property)
        .find(|p| p.id_short == name)
        .and_then(|p| p.value.clone())
        .unwrap()
}

#[test]
fn accepts_only_simulation_models_submodels() {
    let fixture = Fixture::new();
    let processor = fixture.processor(ProcessorConfig::default());
    assert!(processor.accept(&submodel(vec![])));
    let mut other = submodel(vec![]);
    other.semantic_id = Some(Reference::global("urn:other"));
    assert!(!processor.accept(&other));
    other.semantic_id = None;
    assert!(!processor.accept(&other));
}

#[test]
fn bouncing_ball_results_per_step() {
    let fixture = Fixture::new();
    let processor = fixture.processor(ProcessorConfig::default());
    let mut sm = submodel(vec![model("SimulationModel01", "/aasx/BouncingBall.fmu", None)]);

    assert!(processor.process(&mut sm));
    assert!(sm.operation("SimulationModel01").is_some());

    let output = fixture.invoke("SimulationModel01", &run_args("3")).unwrap();
    assert_eq!(output.len(), 1);
    let SubmodelElement::SubmodelElementList(list) = &output[0].value else {
        panic!("expected resultPerStep list");
    };
    assert_eq!(list.id_short, ARG_RESULT_PER_STEP);
    assert_eq!(list.value.len(), 3);

    let expected = [
        ("1", 0.99955855, -0.0981),
        ("2", 0.9981361, -0.1962),
        ("3", 0.99573265, -0.2943),
    ];
    for (bundle, (step, h, v)) in list.value.iter().zip(expected) {
        assert_eq!(property_value(bundle, ARG_STEP_NUMBER), step);
        let got_h: f64 = property_value(bundle, "h").parse().unwrap();
        let got_v: f64 = property_value(bundle, "v").parse().unwrap();
        assert!((got_h - h).abs() < 1e-7);
        assert!((got_v - v).abs() < 1e-7);
    }
}

#[test]
fn parameter_file_with_final_only_results() {
    let fixture = Fixture::new();
    fixture
        .files
        .insert("/aasx/params.txt", b"# start higher\nh0=3\nv0: 1\n".to_vec());
    let config = ProcessorConfig {
        results_per_step: false,
        ..ProcessorConfig::default()
    };
    let processor = fixture.processor(config);
    let mut sm = submodel(vec![model(
        "SimulationModel_Ball",
        "/aasx/BouncingBall.fmu",
        Some("/aasx/params.txt"),
    )]);
    assert!(processor.process(&mut sm));

    let output = fixture.invoke("Ball", &run_args("3")).unwrap();
    let values: Vec<_> = output
        .iter()
        .map(|o| o.value.as_property().unwrap())
        .collect();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].id_short, "h");
    assert_eq!(values[1].id_short, "v");
    let h: f64 = values[0].value.as_deref().unwrap().parse().unwrap();
    let v: f64 = values[1].value.as_deref().unwrap().parse().unwrap();
    // v0 = 1 upwards: h = 3 + 0.03 - (1 - 0.99573265)
    assert!((h - (3.03 - 0.00426735)).abs() < 1e-7, "h = {h}");
    assert!((v - (1.0 - 0.2943)).abs() < 1e-7, "v = {v}");
}

#[test]
fn unmatched_parameter_keys_are_tolerated() {
    let fixture = Fixture::new();
    fixture
        .files
        .insert("/aasx/params.txt", b"gravity=1\n".to_vec());
    let config = ProcessorConfig {
        results_per_step: false,
        ..ProcessorConfig::default()
    };
    let processor = fixture.processor(config);
    let mut sm = submodel(vec![model(
        "Ball",
        "/aasx/BouncingBall.fmu",
        Some("/aasx/params.txt"),
    )]);
    assert!(processor.process(&mut sm));
    let output = fixture.invoke("Ball", &run_args("1")).unwrap();
    assert_eq!(
        output[0].value.as_property().unwrap().value.as_deref(),
        Some("0.99955855")
    );
}

#[test]
fn missing_arguments_fail_before_running() {
    let fixture = Fixture::new();
    let processor = fixture.processor(ProcessorConfig::default());
    let mut sm = submodel(vec![model("Ball", "/aasx/BouncingBall.fmu", None)]);
    processor.process(&mut sm);

    let err = fixture
        .invoke("Ball", &[arg(ARG_TIME_STEP, DataType::Double, "0.01")])
        .unwrap_err();
    assert!(matches!(err, AppError::MissingRequiredArgument { .. }));
}

#[test]
fn broken_models_are_skipped() {
    let fixture = Fixture::new();
    fixture.files.insert("/aasx/broken.fmu", b"garbage".to_vec());
    let processor = fixture.processor(ProcessorConfig::default());
    let mut sm = submodel(vec![
        model("Broken", "/aasx/broken.fmu", None),
        model("Missing", "/aasx/nowhere.fmu", None),
        model("Ball", "/aasx/BouncingBall.fmu", None),
    ]);
    assert!(processor.process(&mut sm));
    assert!(sm.operation("Ball").is_some());
    assert!(sm.operation("Broken").is_none());
    assert!(sm.operation("Missing").is_none());
    assert_eq!(processor.components().len(), 1);
}

#[test]
fn existing_operation_is_reused() {
    let fixture = Fixture::new();
    let processor = fixture.processor(ProcessorConfig::default());
    let existing = SubmodelElement::Operation(Operation {
        id_short: "Ball".to_string(),
        semantic_id: None,
        description: vec![],
        input_variables: run_args("0"),
        output_variables: vec![],
        inoutput_variables: vec![],
    });
    let mut sm = submodel(vec![
        model("SimulationModel_Ball", "/aasx/BouncingBall.fmu", None),
        existing,
    ]);

    assert!(!processor.process(&mut sm));
    assert_eq!(sm.submodel_elements.len(), 2);
    assert!(fixture.invoke("Ball", &run_args("2")).is_ok());

    // a second pass hits the component cache
    assert!(!processor.process(&mut sm));
    assert_eq!(processor.components().len(), 1);
}

#[test]
fn explicit_lifecycle_operations() {
    let fixture = Fixture::new();
    let config = ProcessorConfig {
        explicit_lifecycle: true,
        results_per_step: false,
        ..ProcessorConfig::default()
    };
    let processor = fixture.processor(config);
    let mut sm = submodel(vec![model("Ball", "/aasx/BouncingBall.fmu", None)]);
    assert!(processor.process(&mut sm));
    for op in ["Ball", "Ball-CreateInstance", "Ball-DoStep", "Ball-DestroyInstance"] {
        assert!(sm.operation(op).is_some(), "{op} missing");
    }

    let created = fixture
        .invoke("Ball-CreateInstance", &[arg("h0", DataType::Double, "2")])
        .unwrap();
    let name = created[0].value.as_property().unwrap().value.clone().unwrap();
    assert!(name.starts_with("Ball-"));
    assert_eq!(processor.instances().names(), [name.clone()]);

    let step_args = |count: &str| {
        vec![
            arg(ARG_INSTANCE_NAME, DataType::String, &name),
            arg(ARG_TIME_STEP, DataType::Double, "0.01"),
            arg(ARG_STEP_COUNT, DataType::Integer, count),
        ]
    };
    fixture.invoke("Ball-DoStep", &step_args("1")).unwrap();
    let second = fixture.invoke("Ball-DoStep", &step_args("1")).unwrap();
    // time carried over between calls: identical to two consecutive steps
    let h: f64 = second[0]
        .value
        .as_property()
        .unwrap()
        .value
        .as_deref()
        .unwrap()
        .parse()
        .unwrap();
    assert!((h - (0.9981361 + 1.0)).abs() < 1e-7);

    fixture
        .invoke(
            "Ball-DestroyInstance",
            &[arg(ARG_INSTANCE_NAME, DataType::String, &name)],
        )
        .unwrap();
    assert!(processor.instances().is_empty());

    let err = fixture.invoke("Ball-DoStep", &step_args("1")).unwrap_err();
    assert!(matches!(
        err,
        AppError::Sim(SimError::UnknownInstance { .. })
    ));
    let err = fixture
        .invoke(
            "Ball-DestroyInstance",
            &[arg(ARG_INSTANCE_NAME, DataType::String, &name)],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Sim(SimError::UnknownInstance { .. })
    ));
}

#[test]
fn native_failure_surfaces_as_error() {
    let fixture = Fixture::new();
    let processor = fixture.processor(ProcessorConfig::default());
    let mut sm = submodel(vec![model("Ball", "/aasx/BouncingBall.fmu", None)]);
    processor.process(&mut sm);

    let mut args = run_args("2");
    args.push(OperationVariable::new(SubmodelElement::SubmodelElementList(
        ElementList {
            id_short: ARG_ARGS_PER_STEP.to_string(),
            semantic_id: None,
            type_value_list_element: None,
            value: vec![SubmodelElement::SubmodelElementCollection(ElementCollection {
                value: vec![
                    SubmodelElement::Property(
                        Property::new(ARG_STEP_NUMBER, DataType::Integer).with_value("2"),
                    ),
                    SubmodelElement::Property(
                        Property::new("v", DataType::Double).with_value("4"),
                    ),
                ],
                ..ElementCollection::default()
            })],
        },
    )));
    let err = fixture.invoke("Ball", &args).unwrap_err();
    let err = match err {
        AppError::Sim(err) => err,
        other => panic!("expected a simulation error, got {other}"),
    };
    assert_eq!(err.run_state(), Some(RunState::Failed(2)));
    assert!(matches!(err.fmu_error(), Some(FmuError::NotWritable { .. })));
}

#[test]
fn lifecycle_operations_only_accept_their_own_instances() {
    let fixture = Fixture::new();
    let config = ProcessorConfig {
        explicit_lifecycle: true,
        results_per_step: false,
        ..ProcessorConfig::default()
    };
    let processor = fixture.processor(config);
    let mut sm = submodel(vec![
        model("SimulationModel_A", "/aasx/BouncingBall.fmu", None),
        model("SimulationModel_B", "/aasx/BouncingBall.fmu", None),
    ]);
    assert!(processor.process(&mut sm));
    assert_eq!(processor.components().len(), 2);

    let created = fixture.invoke("A-CreateInstance", &[]).unwrap();
    let name = created[0].value.as_property().unwrap().value.clone().unwrap();
    let by_name = [arg(ARG_INSTANCE_NAME, DataType::String, &name)];
    let step_args = [
        arg(ARG_INSTANCE_NAME, DataType::String, &name),
        arg(ARG_TIME_STEP, DataType::Double, "0.01"),
        arg(ARG_STEP_COUNT, DataType::Integer, "1"),
    ];

    let err = fixture.invoke("B-DoStep", &step_args).unwrap_err();
    assert!(matches!(err, AppError::Sim(SimError::UnknownInstance { .. })));
    let err = fixture.invoke("B-DestroyInstance", &by_name).unwrap_err();
    assert!(matches!(err, AppError::Sim(SimError::UnknownInstance { .. })));
    assert_eq!(processor.instances().names(), [name.clone()]);

    // the rejected step left the instance untouched
    let output = fixture.invoke("A-DoStep", &step_args).unwrap();
    assert_eq!(
        output[0].value.as_property().unwrap().value.as_deref(),
        Some("0.99955855")
    );
    fixture.invoke("A-DestroyInstance", &by_name).unwrap();
    assert!(processor.instances().is_empty());
}
