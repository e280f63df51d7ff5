//! Headless demo driver
//!
//! Runs a scripted session at a fixed 60 Hz and prints the final
//! snapshot as JSON. Useful for eyeballing balance changes and for
//! diffing two runs of the same seed.

use ember_serpent::consts::SIM_DT;
use ember_serpent::sim::{AbilityId, Action, Direction, Game, GamePhase};
use ember_serpent::tuning::LevelTuning;

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0xE13E5);
    let ticks: u64 = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600);

    log::info!("demo run: seed={seed} ticks={ticks}");

    let mut game = Game::new(LevelTuning::default(), seed);
    game.finish_loading();
    game.open_level_select();
    game.handle_action(Action::SelectLevel(0));

    // A fixed tour of the arena with periodic ability attempts. Refused
    // activations (locked, cooling down, out of fire) are just logged.
    let turns = [
        (120, Direction::Down),
        (300, Direction::Left),
        (480, Direction::Up),
        (660, Direction::Right),
    ];

    let mut snapshot = game.snapshot();
    for i in 0..ticks {
        for &(at, dir) in &turns {
            if i % 720 == at {
                game.handle_action(Action::MoveDirection(dir));
            }
        }
        if i % 240 == 60 {
            game.handle_action(Action::ActivateAbility(AbilityId::FlameBreath));
        }
        if i % 600 == 300 {
            game.handle_action(Action::ActivateAbility(AbilityId::FireShield));
        }

        snapshot = game.tick(SIM_DT);
        if matches!(snapshot.phase, GamePhase::GameOver | GamePhase::Victory) {
            log::info!("run ended at tick {i}: {:?}", snapshot.phase);
            break;
        }
    }

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            log::error!("snapshot serialization failed: {err}");
            std::process::exit(1);
        }
    }
}
