//! The per-tick control loop.

use nalgebra::Vector3;
use strider_control::tracking::TrackingController;
use strider_core::error::{ConfigError, StriderError};
use strider_core::types::{JointVector, LEG_COUNT, Leg, TorqueCommand};
use strider_cpg::foot::FootTrajectoryMapper;
use strider_cpg::hopf::CpgIntegrator;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::robot::QuadrupedRobot;
use crate::telemetry::Telemetry;

/// Ticks between periodic progress events.
const LOG_INTERVAL: u64 = 1000;

/// Relative slack allowed between the integrator and telemetry timesteps.
const DT_TOLERANCE: f64 = 1e-12;

/// Outcome of one completed tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    /// Zero-based index of the tick.
    pub tick: u64,
    /// Simulated time after the tick (s).
    pub time: f64,
    /// Foot targets in the leg frames.
    pub foot_targets: [Vector3<f64>; LEG_COUNT],
    /// Torques sent to the actuators.
    pub torque: TorqueCommand,
    /// Torques the actuators reported after stepping.
    pub applied_torque: JointVector,
    /// Mechanical power `|τ·dq|` (W).
    pub energy: f64,
    /// Cost of transport, `None` while the body is not moving.
    pub cost_of_transport: Option<f64>,
    /// Rolling average horizontal speed (m/s).
    pub average_speed: Option<f64>,
}

/// Closed loop from oscillator network to actuator torques.
///
/// Owns every piece of per-run state: the integrator, the controller, the
/// telemetry, the robot and simulated time.
pub struct SimulationLoop<R> {
    robot: R,
    cpg: CpgIntegrator,
    mapper: FootTrajectoryMapper,
    controller: TrackingController,
    telemetry: Telemetry,
    time: f64,
    ticks: u64,
}

impl<R: QuadrupedRobot> SimulationLoop<R> {
    /// Assemble a loop from prebuilt parts.
    ///
    /// The foot mapper follows the integrator's gait. The telemetry must use
    /// the integrator's timestep.
    pub fn new(
        robot: R,
        cpg: CpgIntegrator,
        controller: TrackingController,
        telemetry: Telemetry,
    ) -> Result<Self, ConfigError> {
        let dt = cpg.dt();
        if (telemetry.dt() - dt).abs() > DT_TOLERANCE * dt {
            return Err(ConfigError::invalid(
                "telemetry.dt",
                format!("{} does not match integrator dt {dt}", telemetry.dt()),
            ));
        }
        let spec = cpg.specification();
        let mapper = FootTrajectoryMapper::new(spec.gait());
        info!(gait = spec.name(), dt, "Built simulation loop");
        Ok(Self {
            robot,
            cpg,
            mapper,
            controller,
            telemetry,
            time: 0.0,
            ticks: 0,
        })
    }

    /// Validate `config` and build every part from it.
    pub fn from_config(robot: R, config: &ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let cpg = config.build_integrator()?;
        let controller = config.build_controller();
        let telemetry = config.build_telemetry()?;
        Self::new(robot, cpg, controller, telemetry)
    }

    /// Run one control tick.
    ///
    /// An unreachable foot target aborts the tick before any torque reaches
    /// the actuators. The integrator has already advanced at that point.
    pub fn tick(&mut self) -> Result<TickReport, StriderError> {
        let offsets = self.cpg.update();
        let foot_targets = self.mapper.map_all(&offsets);
        let state = self.robot.snapshot();

        let mut torque = TorqueCommand::zeros();
        for leg in Leg::ALL {
            let target = &foot_targets[leg.index()];
            let q_des = self.robot.inverse_kinematics(leg, target).inspect_err(|_| {
                warn!(
                    tick = self.ticks,
                    %leg,
                    x = target.x,
                    y = target.y,
                    z = target.z,
                    "Foot target unreachable, skipping actuation"
                );
            })?;
            let tau = self.controller.leg_torque(leg, &q_des, target, &state);
            torque.set_leg(leg, &tau);
        }

        let sample = self.telemetry.record(&torque, &state);
        let average_speed = self.telemetry.average_speed();

        self.robot.step(&torque);
        self.time += self.cpg.dt();
        let tick = self.ticks;
        self.ticks += 1;

        if self.ticks % LOG_INTERVAL == 0 {
            debug!(
                ticks = self.ticks,
                time = self.time,
                average_speed = average_speed.unwrap_or(0.0),
                "Control loop progress"
            );
        }

        Ok(TickReport {
            tick,
            time: self.time,
            foot_targets,
            torque,
            applied_torque: self.robot.motor_torques(),
            energy: sample.energy,
            cost_of_transport: sample.cost_of_transport,
            average_speed,
        })
    }

    /// Run `ticks` ticks, stopping at the first error.
    ///
    /// Returns the last report, or `None` when `ticks` is zero.
    pub fn run(&mut self, ticks: u64) -> Result<Option<TickReport>, StriderError> {
        let mut last = None;
        for _ in 0..ticks {
            last = Some(self.tick()?);
        }
        Ok(last)
    }

    /// Simulated time (s).
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Completed ticks.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    pub const fn robot(&self) -> &R {
        &self.robot
    }

    pub fn robot_mut(&mut self) -> &mut R {
        &mut self.robot
    }

    pub const fn integrator(&self) -> &CpgIntegrator {
        &self.cpg
    }

    pub const fn controller(&self) -> &TrackingController {
        &self.controller
    }

    pub const fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Release the robot.
    pub fn into_robot(self) -> R {
        self.robot
    }
}
