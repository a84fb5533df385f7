use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead};
use twenty48::engine::Direction;
use twenty48::game::Game;

#[derive(Debug, Parser)]
#[command(name = "twenty48", about = "Play 2048 in the terminal")]
struct Args {
    /// Seed the RNG for a reproducible game
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut game = match args.seed {
        Some(seed) => Game::seeded(seed),
        None => Game::new(),
    };

    println!("Moves: left/l right/r up/u down/d | new = restart | quit = exit");
    render(&game);

    for line in io::stdin().lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match input {
            "quit" | "q" => break,
            "new" => {
                game.reset();
                render(&game);
                continue;
            }
            _ => {}
        }
        match input.parse::<Direction>() {
            Ok(direction) => {
                let step = game.step(direction);
                if step.moved {
                    render(&game);
                    if step.game_over {
                        println!(
                            "Game over! Final score: {}. Type `new` to restart.",
                            game.score()
                        );
                    }
                } else if game.is_over() {
                    println!("Game over. Type `new` to restart or `quit` to exit.");
                } else {
                    println!("That move changes nothing; try another direction.");
                }
            }
            Err(e) => eprintln!("{e}"),
        }
    }
    Ok(())
}

fn render<R: rand::Rng>(game: &Game<R>) {
    println!("{}", game.board());
    println!("Score: {}", game.score());
}
