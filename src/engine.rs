/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    io,
    path::Path,
    sync::mpsc::{channel, Receiver, Sender},
    thread,
    time::Instant,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info, trace};

use crate::{
    parse_move, BoardView, Color, EngineCommand, GameState, PerftSuite, Position, Square,
};

/// An interactive shell around a single [`Position`].
///
/// Commands arrive over a channel, either from `stdin` or from [`Engine::send_command`],
/// and are executed one at a time on the engine's thread.
#[derive(Debug)]
pub struct Engine {
    /// The current position.
    ///
    /// This is modified whenever moves are played or taken back, or a new position is loaded.
    position: Position,

    /// One half of a channel, responsible for sending commands to the engine to execute.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands for the engine to execute.
    receiver: Receiver<EngineCommand>,
}

impl Engine {
    /// Constructs a new [`Engine`] instance to be executed with [`Engine::run`].
    pub fn new() -> Self {
        let (sender, receiver) = channel();

        Self {
            position: Position::default(),
            sender,
            receiver,
        }
    }

    /// Returns a string of the engine's name and current version.
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    #[inline(always)]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Sends an [`EngineCommand`] to the engine to be executed.
    pub fn send_command(&self, command: EngineCommand) -> Result<()> {
        self.sender
            .send(command)
            .context("Failed to send command to engine")
    }

    /// Execute the main event loop for the engine.
    ///
    /// This function spawns a thread to handle input from `stdin` and waits on received commands.
    /// A failed command is reported on `stderr` and does not stop the loop.
    pub fn run(&mut self) -> Result<()> {
        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                debug!("Input handler thread stopping: {err}");
            }
        });

        info!("{} ready", self.name());

        while let Ok(cmd) = self.receiver.recv() {
            if cmd == EngineCommand::Exit {
                break;
            }

            if let Err(e) = self.execute(cmd) {
                eprintln!("Error: {e:#}");
            }
        }

        Ok(())
    }

    /// Executes a single command against the current position, printing any output.
    pub fn execute(&mut self, cmd: EngineCommand) -> Result<()> {
        trace!("Executing {cmd:?}");

        match cmd {
            EngineCommand::Display => println!("{}", BoardView::new(&self.position)),

            EngineCommand::Check => println!("{}", self.status()),

            EngineCommand::Fen { fen } => {
                if fen.is_empty() {
                    println!("{}", self.position.to_fen());
                } else {
                    self.position = Position::from_fen(&fen.join(" "))?;
                }
            }

            EngineCommand::New => self.position = Position::startpos(),

            EngineCommand::Moves { square, sort } => {
                println!("{}", self.moves_string(square, sort));

                if let Some(square) = square {
                    println!("{}", BoardView::targets_from(&self.position, square));
                }
            }

            EngineCommand::Pieces { color } => self.pieces(color),

            EngineCommand::Move { mv } => {
                self.make_move(&mv.join(""))?;

                if self.position.game_end_state().is_over() {
                    println!("{}", self.status());
                }
            }

            EngineCommand::Undo => self.position.undo()?,

            EngineCommand::Perft { depth } => self.perft(depth)?,

            EngineCommand::Divide { depth } => self.divide(depth)?,

            EngineCommand::Suite { path, depth } => self.suite(&path, depth)?,

            EngineCommand::Exit => {}
        }

        Ok(())
    }

    /// Parses and plays a move given in notation such as `e2e4` or `e7e8q`.
    fn make_move(&mut self, notation: &str) -> Result<()> {
        let (from, to, promotion) = parse_move(notation)?;
        self.position.apply(from, to, promotion)?;
        Ok(())
    }

    /// A one-line summary of whether the game is over, and whether the side to move is in check.
    fn status(&self) -> String {
        let side = self.position.side_to_move();
        match self.position.game_end_state() {
            GameState::Checkmate => format!("Checkmate: {} wins", side.opponent().name()),
            GameState::Stalemate => String::from("Stalemate: the game is drawn"),
            GameState::Ongoing if self.position.is_in_check() => {
                format!("{} is in check", side.name())
            }
            GameState::Ongoing => format!("{} is not in check", side.name()),
        }
    }

    /// Legal moves, optionally only from `square`, joined by comma-space.
    fn moves_string(&self, square: Option<Square>, sort: bool) -> String {
        let mut moves = self
            .position
            .legal_moves()
            .iter()
            .filter(|mv| square.map_or(true, |square| mv.from() == square))
            .map(|mv| mv.to_string())
            .collect::<Vec<_>>();

        // If there are none, print "(none)"
        if moves.is_empty() {
            return String::from("(none)");
        }

        if sort {
            moves.sort();
        }

        moves.join(", ")
    }

    fn pieces(&self, color: Color) {
        println!("{}", BoardView::pieces_of(&self.position, color));
    }

    fn perft(&mut self, depth: i32) -> Result<()> {
        let start = Instant::now();
        let nodes = self.position.perft(depth)?;
        let elapsed = start.elapsed();

        let nps = (nodes as f64 / elapsed.as_secs_f64().max(f64::EPSILON)) as u64;
        println!("{nodes} nodes in {} ms ({nps} nps)", elapsed.as_millis());
        Ok(())
    }

    fn divide(&mut self, depth: i32) -> Result<()> {
        let split = self.position.divide(depth)?;
        for (mv, nodes) in &split {
            println!("{mv}\t{nodes}");
        }

        println!("\n{} moves, {} nodes", split.len(), split.values().sum::<u64>());
        Ok(())
    }

    fn suite(&self, path: &Path, depth: usize) -> Result<()> {
        let report = PerftSuite::from_file(path)?.run(depth)?;
        println!("{report}");

        if !report.is_success() {
            bail!(
                "{} of {} perft counts did not match",
                report.failures().count(),
                report.results().len()
            );
        }

        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        // Clear the buffer, read input, and trim the trailing newline
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line from stdin")?;

        // For ctrl + d
        if 0 == bytes {
            sender
                .send(EngineCommand::Exit)
                .context("Failed to send 'exit' command after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        let buf = buffer.trim();

        // Ignore empty lines
        if buf.is_empty() {
            continue;
        }

        match EngineCommand::try_parse_from(buf.split_ascii_whitespace()) {
            Ok(cmd) => sender
                .send(cmd)
                .context("Failed to send command to engine")?,

            // If an invalid command was received, just print the error and continue running
            Err(err) => eprintln!("{err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(engine: &mut Engine, line: &str) -> Result<()> {
        engine.execute(line.parse()?)
    }

    #[test]
    fn test_play_and_undo() {
        let mut engine = Engine::new();
        run(&mut engine, "move e2e4").unwrap();
        run(&mut engine, "m e7 e5").unwrap();
        assert_eq!(
            engine.position().to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
        );

        run(&mut engine, "u").unwrap();
        run(&mut engine, "undo").unwrap();
        assert_eq!(engine.position(), &Position::startpos());
        assert!(run(&mut engine, "undo").is_err());
    }

    #[test]
    fn test_illegal_move_leaves_position() {
        let mut engine = Engine::new();
        assert!(run(&mut engine, "move e2e5").is_err());
        assert!(run(&mut engine, "move e2").is_err());
        assert_eq!(engine.position(), &Position::startpos());
    }

    #[test]
    fn test_load_fen() {
        let mut engine = Engine::new();
        run(&mut engine, "fen 8/8/8/k5QK/8/8/8/8 b - -").unwrap();
        assert_eq!(engine.position().to_fen(), "8/8/8/k5QK/8/8/8/8 b - - 0 1");

        // A bad FEN keeps the old position
        assert!(run(&mut engine, "fen 8/8/8/8/8/8/8/8 w - -").is_err());
        assert_eq!(engine.position().to_fen(), "8/8/8/k5QK/8/8/8/8 b - - 0 1");

        run(&mut engine, "new").unwrap();
        assert_eq!(engine.position(), &Position::startpos());
    }

    #[test]
    fn test_status() {
        let mut engine = Engine::new();
        assert_eq!(engine.status(), "White is not in check");

        for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            run(&mut engine, &format!("move {mv}")).unwrap();
        }
        assert_eq!(engine.status(), "Checkmate: Black wins");

        run(&mut engine, "undo").unwrap();
        run(&mut engine, "move d8g5").unwrap();
        assert_eq!(engine.status(), "White is not in check");

        run(&mut engine, "fen 7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(engine.status(), "Stalemate: the game is drawn");
    }

    #[test]
    fn test_moves_string() {
        let engine = Engine::new();
        let g1 = Square::G1;
        assert_eq!(engine.moves_string(Some(g1), true), "g1f3, g1h3");
        assert_eq!(
            engine.moves_string(Some(Square::from_uci("e4").unwrap()), false),
            "(none)"
        );
        assert_eq!(engine.moves_string(None, false).split(", ").count(), 20);
    }

    #[test]
    fn test_negative_perft_is_an_error() {
        let mut engine = Engine::new();
        assert!(run(&mut engine, "perft -1").is_err());
        assert!(run(&mut engine, "divide -2").is_err());
        assert!(run(&mut engine, "perft 2").is_ok());
    }
}
