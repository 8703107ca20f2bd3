//! Megabot headless runner
//!
//! Plays a short scripted session on the demo level and prints the final
//! snapshot as JSON. Usage: `megabot [config.json]`.

#[cfg(not(target_arch = "wasm32"))]
use megabot::{
    GameConfig,
    platform::Runner,
    sim::{Action, GameEvent, Level},
};

/// (first tick, last tick, action held)
#[cfg(not(target_arch = "wasm32"))]
const SCRIPT: &[(u64, u64, Action)] = &[
    (30, 150, Action::Right),
    (90, 92, Action::Jump),
    (160, 161, Action::Shoot),
    (175, 250, Action::Shoot),
    (260, 262, Action::Slide),
    (280, 281, Action::SwitchWeapon),
    (290, 420, Action::Right),
    (300, 301, Action::Shoot),
    (330, 331, Action::Shoot),
];

#[cfg(not(target_arch = "wasm32"))]
const DEMO_TICKS: u64 = 600;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Megabot (native) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match GameConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("Failed to load config '{}': {}", path, err);
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };
    let level = Level::demo(&config.game);
    let mut runner = Runner::new(config, level);

    let mut fired = 0;
    let mut hits = 0;
    for t in 0..DEMO_TICKS {
        for action in [Action::Right, Action::Jump, Action::Shoot, Action::Slide, Action::SwitchWeapon] {
            let held = SCRIPT
                .iter()
                .any(|&(start, end, a)| a == action && (start..end).contains(&t));
            runner.set_action(action, held);
        }
        runner.step();

        for event in runner.drain_events() {
            match event {
                GameEvent::ProjectileFired { .. } => fired += 1,
                GameEvent::Damaged { .. } => hits += 1,
                GameEvent::PhaseChanged { to, .. } => log::info!("Phase -> {:?}", to),
                other => log::debug!("{:?}", other),
            }
        }
        if runner.state().phase.is_finished() {
            break;
        }
    }

    log::info!(
        "Demo finished after {} ticks: {} shots fired, {} hits landed",
        runner.state().tick_count(),
        fired,
        hits
    );
    match serde_json::to_string_pretty(&runner.state().snapshot()) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            log::error!("Failed to serialize snapshot: {}", err);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
