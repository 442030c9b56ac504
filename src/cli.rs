/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{path::PathBuf, str::FromStr};

use clap::{builder::PossibleValue, error::ErrorKind, Parser, ValueEnum};
use log::{debug, warn};

use crate::{Color, Square};

/// A command to be sent to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<COMMAND> [ARGS]")
)]
pub enum EngineCommand {
    /// Print a visual representation of the current position.
    #[command(aliases = ["b", "board"])]
    Display,

    /// Report whether the side to move is in check, checkmated, or stalemated.
    #[command(alias = "c")]
    Check,

    /// Load a position from a FEN string, or print the current FEN if none is given.
    ///
    /// The FEN may be given as separate words, so it does not need to be quoted.
    #[command(alias = "f")]
    Fen {
        #[arg(num_args = 0..=6)]
        fen: Vec<String>,
    },

    /// Reset to the starting position.
    New,

    /// Show all legal moves in the current position, or those of the piece on a specific square.
    ///
    /// When a square is given, its targets are also highlighted on the board.
    #[command(aliases = ["l", "legal"])]
    Moves {
        square: Option<Square>,

        /// If set, moves will be sorted in alphabetical order.
        ///
        /// By default, moves are listed in generation order.
        #[arg(short, long, default_value = "false")]
        sort: bool,
    },

    /// Highlight every piece of one color.
    #[command(alias = "s")]
    Pieces { color: Color },

    /// Play a move, if it is legal.
    ///
    /// Accepts `e2e4`, `e7e8q`, or the same parts separated by spaces, such as `e7 e8 q`.
    #[command(aliases = ["m", "mv"])]
    Move {
        #[arg(required = true, num_args = 1..=3)]
        mv: Vec<String>,
    },

    /// Take back the last move.
    #[command(alias = "u")]
    Undo,

    /// Count the leaf nodes reachable from the current position at the supplied depth.
    #[command(alias = "p")]
    Perft {
        #[arg(allow_negative_numbers = true)]
        depth: i32,
    },

    /// Like `perft`, but print the count under each root move.
    #[command(alias = "d")]
    Divide {
        #[arg(allow_negative_numbers = true)]
        depth: i32,
    },

    /// Run every position in a perft suite file and report which counts match.
    Suite {
        /// Path to a file of lines like `<fen>,<nodes at depth 1>,<nodes at depth 2>,...`.
        path: PathBuf,

        /// Only check depths up to this one.
        #[arg(default_value = "4")]
        depth: usize,
    },

    /// Quit the engine.
    #[command(aliases = ["q", "quit"])]
    Exit,
}

impl FromStr for EngineCommand {
    type Err = clap::Error;
    /// Attempt to parse an [`EngineCommand`] from a line of input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse_from(s.split_ascii_whitespace())
    }
}

impl EngineCommand {
    /// Splits command-line arguments into the commands they spell out, e.g. `fen <FEN> divide 3`.
    ///
    /// The longest slice of arguments that parses as a command is taken, then parsing continues after it.
    /// Arguments that start no valid command are skipped with a warning.
    pub fn parse_startup_args(args: &[String]) -> Vec<Self> {
        let mut commands = Vec::new();
        let mut arg_idx = args.len();
        let mut parsed_idx = 0;

        while parsed_idx < arg_idx {
            match Self::try_parse_from(&args[parsed_idx..arg_idx]) {
                Ok(cmd) => {
                    debug!("Startup command {cmd:?}");
                    commands.push(cmd);
                    parsed_idx = arg_idx;
                    arg_idx = args.len();
                }

                // Edge case: `--help` and `--version` are both "error" cases according to Clap
                Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                    println!("{e}");
                    parsed_idx = arg_idx;
                    arg_idx = args.len();
                }

                Err(e) => {
                    if arg_idx == parsed_idx + 1 {
                        warn!("Ignoring startup argument {:?}: {}", args[parsed_idx], e.kind());
                        parsed_idx += 1;
                        arg_idx = args.len();
                    } else {
                        arg_idx -= 1;
                    }
                }
            }
        }

        commands
    }
}

impl ValueEnum for Color {
    fn value_variants<'a>() -> &'a [Self] {
        &[Color::White, Color::Black]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        // The FEN letter, with the full name as an alias
        let value = match self {
            Color::White => PossibleValue::new("w").aliases(["white", "White"]),
            Color::Black => PossibleValue::new("b").aliases(["black", "Black"]),
        };

        Some(value)
    }
}
