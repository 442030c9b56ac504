/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// The chess position, its moves, and everything needed to walk the game tree.
mod board;

/// Commands understood by the engine's shell.
mod cli;

/// Code related to the engine's functionality, such as user input handling.
mod engine;

/// Perft suites read from files.
mod suite;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use suite::*;
