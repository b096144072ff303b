use sm_fmu::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Stores whatever is written and reports scripted step statuses.
struct EchoSlave {
    values: HashMap<ValueReference, NativeValue>,
    script: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    init_status: Option<Status>,
    step_status: Option<Status>,
    pending_polls: usize,
    resolve_to: Option<Status>,
    terminations: usize,
}

impl Slave for EchoSlave {
    fn setup_experiment(&mut self, _start_time: f64, _stop_time: Option<f64>) -> Status {
        Status::Ok
    }
    fn enter_initialization_mode(&mut self) -> Status {
        self.script.lock().unwrap().init_status.unwrap_or(Status::Ok)
    }
    fn exit_initialization_mode(&mut self) -> Status {
        Status::Warning
    }
    fn get(&mut self, vr: ValueReference, native_type: NativeType) -> (NativeValue, Status) {
        let value = self.values.get(&vr).cloned().unwrap_or(match native_type {
            NativeType::Boolean => NativeValue::Boolean(false),
            NativeType::Integer => NativeValue::Integer(0),
            NativeType::String => NativeValue::String(String::new()),
            _ => NativeValue::Real(0.0),
        });
        (value, Status::Ok)
    }
    fn set(&mut self, vr: ValueReference, value: NativeValue) -> Status {
        self.values.insert(vr, value);
        Status::Ok
    }
    fn do_step(&mut self, _current_time: f64, _step_size: f64) -> Status {
        self.script.lock().unwrap().step_status.unwrap_or(Status::Ok)
    }
    fn status(&mut self, _kind: CallKind) -> Status {
        let mut script = self.script.lock().unwrap();
        if script.pending_polls > 0 {
            script.pending_polls -= 1;
            return Status::Pending;
        }
        script.resolve_to.unwrap_or(Status::Pending)
    }
    fn terminate(&mut self) -> Status {
        self.script.lock().unwrap().terminations += 1;
        Status::Ok
    }
}

struct EchoFactory {
    script: Arc<Mutex<Script>>,
    instances: AtomicUsize,
}

impl SlaveFactory for EchoFactory {
    fn model_identifier(&self) -> &str {
        "Echo"
    }
    fn instantiate(&self, _name: &str, _d: &ModelDescription) -> FmuResult<Box<dyn Slave>> {
        self.instances.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(EchoSlave {
            values: HashMap::new(),
            script: Arc::clone(&self.script),
        }))
    }
}

fn echo_variable(name: &str, vr: u32, causality: Causality, t: NativeType) -> ScalarVariable {
    ScalarVariable {
        name: name.to_string(),
        value_reference: vr,
        causality,
        variability: if causality == Causality::Parameter {
            Variability::Tunable
        } else {
            Variability::Other
        },
        native_type: t,
        description: None,
        start: None,
    }
}

fn echo_component(script: Arc<Mutex<Script>>) -> Arc<ComponentDescriptor> {
    let description = ModelDescription::new(
        "Echo",
        "Echo",
        vec![
            echo_variable("flag", 1, Causality::Input, NativeType::Boolean),
            echo_variable("count", 2, Causality::Input, NativeType::Integer),
            echo_variable("level", 3, Causality::Output, NativeType::Real),
            echo_variable("label", 4, Causality::Parameter, NativeType::String),
            echo_variable("mode", 5, Causality::Input, NativeType::Enumeration),
        ],
    )
    .unwrap();
    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(EchoFactory {
        script,
        instances: AtomicUsize::new(0),
    }));
    let bytes = build_package(&description).unwrap();
    Arc::new(load_component("echo", &bytes, &registry).unwrap())
}

fn ball() -> Arc<ComponentDescriptor> {
    let bytes = bouncing_ball::package().unwrap();
    Arc::new(load_component("ball", &bytes, &BackendRegistry::with_builtin()).unwrap())
}

/// Collects the messages of warn-level events.
#[derive(Clone, Default)]
struct Warnings(Arc<Mutex<Vec<String>>>);

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for Warnings {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.0.lock().unwrap().push(visitor.0);
        }
    }
}

fn warnings_during(f: impl FnOnce()) -> Vec<String> {
    let warnings = Warnings::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());
    tracing::subscriber::with_default(subscriber, f);
    let collected = warnings.0.lock().unwrap().clone();
    collected
}

fn fast_governor() -> StatusGovernor {
    StatusGovernor::new(PendingPolicy::from_millis(2, 40))
}

#[test]
fn bouncing_ball_three_steps() {
    let mut instance =
        Instance::create("ball-1", ball(), &BTreeMap::new(), StatusGovernor::default()).unwrap();
    let expected = [
        (0.99955855, -0.0981),
        (0.9981361, -0.1962),
        (0.99573265, -0.2943),
    ];
    let mut t = 0.0;
    for (h, v) in expected {
        instance.do_step(t, 0.01).unwrap();
        t += 0.01;
        let outputs = instance.output_values().unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].name, "h");
        assert_eq!(outputs[1].name, "v");
        let read = |i: usize| outputs[i].value.parse::<f64>().unwrap();
        assert!((read(0) - h).abs() < 1e-7, "h = {}", read(0));
        assert!((read(1) - v).abs() < 1e-7, "v = {}", read(1));
    }
    assert!((instance.time() - 0.03).abs() < 1e-12);
}

#[test]
fn parameter_overrides_change_the_trajectory() {
    let params = BTreeMap::from([
        ("h0".to_string(), "2".to_string()),
        ("v0".to_string(), "1.5".to_string()),
    ]);
    let mut instance =
        Instance::create("ball-2", ball(), &params, StatusGovernor::default()).unwrap();
    assert_eq!(instance.read_value("h").unwrap().value, "2");
    assert_eq!(instance.read_value("v").unwrap().value, "1.5");
    instance.do_step(0.0, 0.01).unwrap();
    let h: f64 = instance.read_value("h").unwrap().value.parse().unwrap();
    assert!(h > 2.0);
}

#[test]
fn unmatched_parameter_is_not_an_error() {
    let params = BTreeMap::from([("nonexistent".to_string(), "5".to_string())]);
    let mut instance =
        Instance::create("ball-3", ball(), &params, StatusGovernor::default()).unwrap();
    assert_eq!(instance.read_value("h").unwrap().value, "1");
    assert_eq!(instance.read_value("g").unwrap().value, "-9.81");
}

#[test]
fn writes_are_restricted_to_inputs_and_parameters() {
    let mut instance =
        Instance::create("ball-4", ball(), &BTreeMap::new(), StatusGovernor::default()).unwrap();
    assert!(matches!(
        instance.write_value("h", "3"),
        Err(FmuError::NotWritable {
            causality: Causality::Output,
            ..
        })
    ));
    assert!(matches!(
        instance.write_value("missing", "3"),
        Err(FmuError::UnknownVariable { .. })
    ));
    instance.write_value("e", "0.5").unwrap();
    assert_eq!(instance.read_value("e").unwrap().value, "0.5");
}

#[test]
fn boolean_writes_read_back_canonical() {
    let mut instance = Instance::create(
        "echo-1",
        echo_component(Arc::default()),
        &BTreeMap::new(),
        StatusGovernor::default(),
    )
    .unwrap();
    for (written, expected) in [("1", "true"), ("true", "true"), ("False", "false"), ("0", "false")] {
        instance.write_value("flag", written).unwrap();
        assert_eq!(instance.read_value("flag").unwrap().value, expected);
    }
    instance.write_value("count", "7.8").unwrap();
    assert_eq!(instance.read_value("count").unwrap().value, "7");
    assert!(matches!(
        instance.write_value("mode", "1"),
        Err(FmuError::UnsupportedType { .. })
    ));
    assert!(matches!(
        instance.read_value("mode"),
        Err(FmuError::UnsupportedType { .. })
    ));
}

#[test]
fn string_parameter_override_is_applied() {
    let params = BTreeMap::from([("label".to_string(), "tank A".to_string())]);
    let mut instance = Instance::create(
        "echo-2",
        echo_component(Arc::default()),
        &params,
        StatusGovernor::default(),
    )
    .unwrap();
    assert_eq!(instance.read_value("label").unwrap().value, "tank A");
}

#[test]
fn failing_step_status_is_an_error() {
    let script = Arc::new(Mutex::new(Script {
        step_status: Some(Status::Discard),
        ..Script::default()
    }));
    let mut instance =
        Instance::create("echo-3", echo_component(script), &BTreeMap::new(), fast_governor())
            .unwrap();
    let err = instance.do_step(0.0, 0.1).unwrap_err();
    assert!(matches!(
        err,
        FmuError::NativeCallFailed {
            status: Status::Discard,
            ..
        }
    ));
    assert_eq!(instance.time(), 0.0);
}

#[test]
fn pending_step_resolves_after_polling() {
    let script = Arc::new(Mutex::new(Script {
        step_status: Some(Status::Pending),
        pending_polls: 2,
        resolve_to: Some(Status::Ok),
        ..Script::default()
    }));
    let mut instance =
        Instance::create("echo-4", echo_component(script), &BTreeMap::new(), fast_governor())
            .unwrap();
    instance.do_step(1.0, 0.5).unwrap();
    assert_eq!(instance.time(), 1.5);
}

#[test]
fn pending_step_times_out() {
    let script = Arc::new(Mutex::new(Script {
        step_status: Some(Status::Pending),
        ..Script::default()
    }));
    let mut instance =
        Instance::create("echo-5", echo_component(script), &BTreeMap::new(), fast_governor())
            .unwrap();
    let err = instance.do_step(0.0, 0.1).unwrap_err();
    assert!(matches!(err, FmuError::PendingTimeout { .. }));
}

#[test]
fn pending_that_resolves_to_error_fails() {
    let script = Arc::new(Mutex::new(Script {
        step_status: Some(Status::Pending),
        resolve_to: Some(Status::Fatal),
        ..Script::default()
    }));
    let mut instance =
        Instance::create("echo-6", echo_component(script), &BTreeMap::new(), fast_governor())
            .unwrap();
    assert!(matches!(
        instance.do_step(0.0, 0.1),
        Err(FmuError::NativeCallFailed {
            status: Status::Fatal,
            ..
        })
    ));
}

#[test]
fn instances_terminate_exactly_once() {
    let script: Arc<Mutex<Script>> = Arc::default();
    let component = echo_component(Arc::clone(&script));

    let instance =
        Instance::create("echo-7", Arc::clone(&component), &BTreeMap::new(), fast_governor())
            .unwrap();
    assert_eq!(instance.destroy(), Status::Ok);
    assert_eq!(script.lock().unwrap().terminations, 1);

    {
        let _dropped =
            Instance::create("echo-8", component, &BTreeMap::new(), fast_governor()).unwrap();
    }
    assert_eq!(script.lock().unwrap().terminations, 2);
}

#[test]
fn setup_warns_only_for_failed_statuses() {
    let script = Arc::new(Mutex::new(Script::default()));
    let component = echo_component(Arc::clone(&script));

    // exitInitializationMode reports Warning, which is a success
    let warnings = warnings_during(|| {
        Instance::create("echo-setup-ok", Arc::clone(&component), &BTreeMap::new(), fast_governor())
            .unwrap();
    });
    assert!(
        warnings.iter().all(|w| !w.contains("returned status")),
        "{warnings:?}"
    );

    script.lock().unwrap().init_status = Some(Status::Error);
    let warnings = warnings_during(|| {
        Instance::create("echo-setup-err", Arc::clone(&component), &BTreeMap::new(), fast_governor())
            .unwrap();
    });
    assert!(
        warnings
            .iter()
            .any(|w| w.contains("enterInitializationMode returned status 'Error'")),
        "{warnings:?}"
    );
}
