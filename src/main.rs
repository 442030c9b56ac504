/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crudechess::{Engine, EngineCommand};

fn main() {
    // Quiet by default; override with e.g. `RUST_LOG=debug`
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let mut engine = Engine::new();

    // Skip the executable name
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    // Commands given on startup are run before reading stdin
    for cmd in EngineCommand::parse_startup_args(&args) {
        if let Err(e) = engine.send_command(cmd) {
            eprintln!("{e:#}");
            return;
        }
    }

    if let Err(e) = engine.run() {
        eprintln!("{} encountered an error: {e}", env!("CARGO_PKG_NAME"));
    }
}
