//! Built-in bouncing ball backend.
//!
//! Height `h` and velocity `v` integrated with forward Euler on a fixed 1 ms
//! solver step. On ground contact the velocity is reversed and scaled by the
//! restitution `e`; below `v_min` the ball comes to rest.

use crate::description::{DefaultExperiment, ModelDescription, ScalarVariable};
use crate::error::FmuResult;
use crate::package::build_package;
use crate::slave::{Slave, SlaveFactory};
use crate::status::{CallKind, Status};
use crate::types::{Causality, NativeType, NativeValue, ValueReference, Variability};

pub const MODEL_IDENTIFIER: &str = "BouncingBall";

const FIXED_SOLVER_STEP: f64 = 1e-3;
const TIME_EPS: f64 = 1e-12;

const VR_TIME: ValueReference = 0;
const VR_H: ValueReference = 1;
const VR_DER_H: ValueReference = 2;
const VR_V: ValueReference = 3;
const VR_DER_V: ValueReference = 4;
const VR_G: ValueReference = 5;
const VR_E: ValueReference = 6;
const VR_V_MIN: ValueReference = 7;
const VR_H0: ValueReference = 8;
const VR_V0: ValueReference = 9;

pub fn model_description() -> ModelDescription {
    let var = |name: &str,
               vr: ValueReference,
               causality: Causality,
               variability: Variability,
               start: Option<&str>,
               description: &str| ScalarVariable {
        name: name.to_string(),
        value_reference: vr,
        causality,
        variability,
        native_type: NativeType::Real,
        description: Some(description.to_string()),
        start: start.map(str::to_string),
    };
    use Causality::{Other, Output, Parameter};
    use Variability::{Fixed, Tunable};
    ModelDescription {
        fmi_version: "2.0".to_string(),
        model_name: MODEL_IDENTIFIER.to_string(),
        guid: "{1AE5E10D-9521-4DE3-80B9-D0EAAA7D5AF1}".to_string(),
        description: Some("Bouncing ball with fixed-step Euler integration".to_string()),
        model_identifier: MODEL_IDENTIFIER.to_string(),
        default_experiment: Some(DefaultExperiment {
            start_time: Some(0.0),
            stop_time: Some(3.0),
            step_size: Some(0.01),
        }),
        variables: vec![
            var("time", VR_TIME, Other, Variability::Other, None, "Simulation time"),
            var("h", VR_H, Output, Variability::Other, Some("1"), "Position of the ball"),
            var("der(h)", VR_DER_H, Other, Variability::Other, None, "Derivative of h"),
            var("v", VR_V, Output, Variability::Other, Some("0"), "Velocity of the ball"),
            var("der(v)", VR_DER_V, Other, Variability::Other, None, "Derivative of v"),
            var("g", VR_G, Parameter, Fixed, Some("-9.81"), "Gravity acting on the ball"),
            var("e", VR_E, Parameter, Tunable, Some("0.7"), "Coefficient of restitution"),
            var("v_min", VR_V_MIN, Other, Variability::Other, Some("0.1"), "Velocity below which the ball stops bouncing"),
            var("h0", VR_H0, Parameter, Fixed, Some("1"), "Initial height"),
            var("v0", VR_V0, Parameter, Fixed, Some("0"), "Initial velocity"),
        ],
    }
}

/// A zipped package of [`model_description`].
pub fn package() -> FmuResult<Vec<u8>> {
    build_package(&model_description())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BouncingBallFactory;

impl SlaveFactory for BouncingBallFactory {
    fn model_identifier(&self) -> &str {
        MODEL_IDENTIFIER
    }

    fn instantiate(
        &self,
        instance_name: &str,
        _description: &ModelDescription,
    ) -> FmuResult<Box<dyn Slave>> {
        tracing::trace!(instance_name, "instantiating bouncing ball");
        Ok(Box::new(BouncingBall::default()))
    }
}

#[derive(Debug, Clone)]
pub struct BouncingBall {
    time: f64,
    h: f64,
    v: f64,
    g: f64,
    e: f64,
    v_min: f64,
    h0: f64,
    v0: f64,
    terminated: bool,
}

impl Default for BouncingBall {
    fn default() -> Self {
        Self {
            time: 0.0,
            h: 1.0,
            v: 0.0,
            g: -9.81,
            e: 0.7,
            v_min: 0.1,
            h0: 1.0,
            v0: 0.0,
            terminated: false,
        }
    }
}

impl BouncingBall {
    fn real(&self, vr: ValueReference) -> Option<f64> {
        Some(match vr {
            VR_TIME => self.time,
            VR_H => self.h,
            VR_DER_H => self.v,
            VR_V => self.v,
            VR_DER_V => self.g,
            VR_G => self.g,
            VR_E => self.e,
            VR_V_MIN => self.v_min,
            VR_H0 => self.h0,
            VR_V0 => self.v0,
            _ => return None,
        })
    }

    fn substep(&mut self, dt: f64) {
        let (der_h, der_v) = (self.v, self.g);
        self.h += dt * der_h;
        self.v += dt * der_v;

        if self.h <= 0.0 && self.v < 0.0 {
            self.h = 0.0;
            self.v = -self.v * self.e;
            if self.v < self.v_min {
                self.v = 0.0;
                self.g = 0.0;
            }
        }
    }
}

impl Slave for BouncingBall {
    fn setup_experiment(&mut self, start_time: f64, _stop_time: Option<f64>) -> Status {
        self.time = start_time;
        Status::Ok
    }

    fn enter_initialization_mode(&mut self) -> Status {
        Status::Ok
    }

    fn exit_initialization_mode(&mut self) -> Status {
        self.h = self.h0;
        self.v = self.v0;
        Status::Ok
    }

    fn get(&mut self, vr: ValueReference, native_type: NativeType) -> (NativeValue, Status) {
        match (native_type, self.real(vr)) {
            (NativeType::Real, Some(x)) => (NativeValue::Real(x), Status::Ok),
            _ => (NativeValue::Real(f64::NAN), Status::Error),
        }
    }

    fn set(&mut self, vr: ValueReference, value: NativeValue) -> Status {
        let NativeValue::Real(x) = value else {
            return Status::Error;
        };
        match vr {
            VR_G => self.g = x,
            VR_E => self.e = x,
            VR_H0 => self.h0 = x,
            VR_V0 => self.v0 = x,
            _ => return Status::Error,
        }
        Status::Ok
    }

    fn do_step(&mut self, current_time: f64, step_size: f64) -> Status {
        if self.terminated || !step_size.is_finite() || step_size < 0.0 {
            return Status::Error;
        }
        let end = current_time + step_size;
        let mut time = current_time;
        while time + TIME_EPS < end {
            let dt = FIXED_SOLVER_STEP.min(end - time);
            self.substep(dt);
            time += dt;
        }
        self.time = end;
        Status::Ok
    }

    fn status(&mut self, _kind: CallKind) -> Status {
        Status::Ok
    }

    fn terminate(&mut self) -> Status {
        self.terminated = true;
        Status::Ok
    }
}
