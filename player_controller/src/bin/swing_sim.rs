use std::path::PathBuf;

use character_collision::CollisionProfile;
use clap::Parser;
use env_logger::{Builder, Env};
use grapple::{GrappleConfig, GrappleEvent};
use log::LevelFilter;
use physics_rapier::PhysicsWorld;
use player_camera::AimRig;
use player_controller::{BallisticMotor, DirectInputAdapter, PlayerController, RawInput};
use rapier3d::math::{Isometry, Vector};
use rapier3d::prelude::{ColliderBuilder, Real};

const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG: i32 = 2;
const EXIT_MISS: i32 = 3;
const TICK_RATE: Real = 60.0;

#[derive(Parser)]
#[command(name = "swing_sim", version, about = "Headless grapple swing simulation")]
struct Cli {
    /// Grapple tuning as TOML; omitted keys keep their defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Distance from the actor to the anchor wall.
    #[arg(long, default_value_t = 20.0)]
    wall_distance: Real,

    /// Drop a slab across the rope halfway to the wall right after firing.
    #[arg(long)]
    slab: bool,

    #[arg(long, default_value_t = 3.0)]
    seconds: Real,

    /// Lateral steering input in [-1, 1].
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    steer: Real,

    /// Forward input in [-1, 1]; positive pumps, negative brakes.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pump: Real,

    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    std::process::exit(run(cli));
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = Env::default().default_filter_or(level.to_string());
    let _ = Builder::from_env(env).try_init();
}

fn load_config(cli: &Cli) -> Option<GrappleConfig> {
    let Some(path) = cli.config.as_deref() else {
        return Some(GrappleConfig::default());
    };
    match GrappleConfig::load(path) {
        Ok(config) => Some(config),
        Err(err) => {
            log::error!("{}", err);
            None
        }
    }
}

fn build_scene(wall_distance: Real) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(Vector::new(0.0, -9.81, 0.0));
    let floor = ColliderBuilder::cuboid(200.0, 0.5, 200.0)
        .translation(Vector::new(0.0, -60.5, 0.0))
        .build();
    world.insert_static_collider(floor);
    let wall = ColliderBuilder::cuboid(30.0, 30.0, 0.5)
        .translation(Vector::new(0.0, 0.0, -(wall_distance + 0.5)))
        .build();
    world.insert_static_collider(wall);
    world
}

fn run(cli: Cli) -> i32 {
    let Some(config) = load_config(&cli) else {
        return EXIT_CONFIG;
    };
    let dt = 1.0 / TICK_RATE;
    let mut world = build_scene(cli.wall_distance);
    world.step(dt);

    let mut controller = PlayerController::new(
        DirectInputAdapter,
        BallisticMotor,
        CollisionProfile::actor_default(),
        AimRig::default(),
        config,
        Isometry::identity(),
    );
    let mut events: Vec<GrappleEvent> = Vec::new();
    let held = RawInput {
        move_x: cli.steer,
        move_y: cli.pump,
        equipped: true,
        ..Default::default()
    };

    let frame = controller.tick(&world, RawInput { fire: true, ..held }, dt, &mut events);
    if !frame.grapple.active {
        log::error!("no anchor within {:.1} m of the aim point", config.max_range);
        return EXIT_MISS;
    }
    if cli.slab {
        let slab = ColliderBuilder::cuboid(4.0, 4.0, 0.05)
            .translation(Vector::new(0.0, 0.0, -cli.wall_distance * 0.5))
            .build();
        world.insert_static_collider(slab);
    }
    world.step(dt);

    let ticks = (cli.seconds.max(0.0) * TICK_RATE).ceil() as u32;
    let mut released = None;
    for tick in 1..=ticks {
        let frame = controller.tick(&world, held, dt, &mut events);
        world.step(dt);
        if let Some(outcome) = frame.grapple.released {
            released = Some(outcome);
            break;
        }
        if tick % TICK_RATE as u32 == 0 {
            let state = controller.state();
            log::info!(
                "t={:.1}s rope={:.2} speed={:.2} position={:?}",
                tick as Real * dt,
                controller.grapple().session().rope_length(),
                state.velocity.norm(),
                state.position.translation.vector
            );
        }
    }
    let released = match released {
        Some(outcome) => Some(outcome),
        None => {
            let frame = controller.tick(&world, RawInput { fire: true, ..held }, dt, &mut events);
            frame.grapple.released
        }
    };

    let charges = controller.grapple().session().charges();
    match released {
        Some(outcome) => log::info!(
            "released ({:?}) boosted={} exit speed {:.2}, charges {}/{}",
            outcome.reason,
            outcome.boosted,
            outcome.velocity.norm(),
            charges.charges(),
            charges.max_charges()
        ),
        None => log::info!("swing ended without a release"),
    }
    for event in &events {
        log::debug!("event {:?}", event);
    }
    EXIT_SUCCESS
}
