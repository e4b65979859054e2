//! Eight Ball headless demo
//!
//! Two computer players play one rack to completion and the result is
//! logged. Usage: `eight-ball [seed] [settings.json]`

use std::path::Path;

use eight_ball::Settings;
use eight_ball::sim::{GameEvent, GameState, Phase, play_computer_turn, tick};

/// Give up on a rack that somehow never finishes
const MAX_TURNS: u32 = 400;
/// Frames allowed for a single stroke to come to rest
const MAX_TICKS_PER_STROKE: u32 = 20_000;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse::<u64>().ok()).unwrap_or(1);
    let mut settings = match args.next() {
        Some(path) => Settings::load_or_default(Path::new(&path)),
        None => Settings::default(),
    };
    settings.rack_seed = seed;

    let mut state = match GameState::new(settings) {
        Ok(state) => state,
        Err(err) => {
            log::error!("Could not rack: {err}");
            std::process::exit(1);
        }
    };
    log::info!("Eight Ball (native) starting, seed {seed}");

    for _ in 0..MAX_TURNS {
        if state.phase == Phase::GameOver {
            break;
        }
        let player = state.match_state.turn;
        match play_computer_turn(&mut state, player) {
            Ok(Some(_)) => {}
            Ok(None) => continue,
            Err(err) => {
                log::error!("{player} could not play: {err}");
                break;
            }
        }

        let mut resolved = false;
        for _ in 0..MAX_TICKS_PER_STROKE {
            if tick(&mut state).is_some() {
                resolved = true;
                break;
            }
        }
        if !resolved {
            log::error!("Stroke {} never came to rest", state.match_state.strokes);
            break;
        }

        for event in state.take_events() {
            if let GameEvent::BallPocketed { id } = event {
                log::debug!("  ball {id} down");
            }
        }
    }

    let ms = &state.match_state;
    match ms.winner {
        Some(winner) => println!("{winner} wins after {} strokes", ms.strokes),
        None => println!("No winner after {} strokes", ms.strokes),
    }
    println!(
        "Player A {:?}: {:?}\nPlayer B {:?}: {:?}",
        ms.player_a_group, ms.potted_a, ms.player_b_group, ms.potted_b
    );
}
