// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

use std::path::PathBuf;

use clap::Parser;
use nalgebra::{Isometry3, Vector3};

use plug_in::controller::{run, StopSignal};
use plug_in::robot::sim::SimulatedRobot;
use plug_in::{ControllerResult, PlugInConfig};

/// Runs the plug in controller once and reports the result.
///
/// Without a configuration file the controller runs with stiffness 1000 N/m and 30 Nm/rad,
/// a desired force of 3 N and a duration of 5 s.
/// Pass "sim" instead of a robot address to run on a simulated robot which slowly descends onto
/// the target.
///
/// WARNING: Collision thresholds are set to high values. Make sure you have the user stop at hand!
#[derive(Parser, Debug)]
#[clap(author, version, name = "plug_in_standalone")]
struct CommandLineArguments {
    /// IP-Address or hostname of the robot, or "sim". Overrides the configuration file
    pub franka_ip: Option<String>,
    /// TOML file with robot, parameters and goal
    #[clap(short, long)]
    pub config: Option<PathBuf>,
    /// Run the control loop without a real-time kernel
    #[clap(long, action)]
    pub no_realtime: bool,
}

fn main() -> ControllerResult<()> {
    tracing_subscriber::fmt::init();
    let args = CommandLineArguments::parse();
    let mut config = match &args.config {
        Some(path) => PlugInConfig::from_file(path)?,
        None => PlugInConfig::default(),
    };
    if let Some(franka_ip) = args.franka_ip {
        config.robot.hostname = franka_ip;
    }
    if args.no_realtime {
        config.robot.realtime = false;
    }

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.request_stop())
        .expect("could not install the Ctrl-C handler");

    let result = if config.robot.hostname == "sim" {
        run_simulated(&config, stop)
    } else {
        run_franka(&config, stop)
    };
    match result {
        Ok(_) => {
            println!("Plug in succeeded");
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(())
        }
    }
}

fn run_simulated(config: &PlugInConfig, stop: StopSignal) -> ControllerResult<()> {
    let target = Vector3::from(config.goal.target_position);
    let mut robot = SimulatedRobot::new(Isometry3::translation(target.x, target.y, target.z + 0.05))
        .with_velocity(Vector3::new(0., 0., -0.02));
    run(&mut robot, &config.parameters, &config.goal, Some(stop))
}

#[cfg(feature = "franka")]
fn run_franka(config: &PlugInConfig, stop: StopSignal) -> ControllerResult<()> {
    use plug_in::controller::connect_and_run;
    use plug_in::robot::franka::FrankaConnector;

    println!(
        "WARNING: Collision thresholds are set to high values. \
             Make sure you have the user stop at hand!"
    );
    println!("The robot will press down and wiggle around its current pose.");
    println!("Press Enter to continue...");
    std::io::stdin().read_line(&mut String::new()).unwrap();
    let connector = FrankaConnector {
        realtime: config.robot.realtime,
    };
    connect_and_run(
        &connector,
        &config.robot.hostname,
        &config.parameters,
        &config.goal,
        Some(stop),
    )
}

#[cfg(not(feature = "franka"))]
fn run_franka(config: &PlugInConfig, _stop: StopSignal) -> ControllerResult<()> {
    Err(plug_in::ControllerException::ConnectionFault {
        message: format!(
            "cannot connect to \"{}\": built without the franka feature, use \"sim\" instead",
            config.robot.hostname
        ),
    })
}
