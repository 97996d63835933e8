/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::error::ErrorKind;
use hopper::{Engine, EngineCommand};

fn main() {
    let mut engine = Engine::new();

    // Skip the executable name
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    // Every argument may start a command, so take the longest run of arguments that parses,
    // then continue after it.
    let mut arg_idx = args.len();
    let mut parsed_idx = 0;
    while parsed_idx < arg_idx {
        let slice = &args[parsed_idx..arg_idx];

        match slice.join(" ").parse::<EngineCommand>() {
            Ok(cmd) => {
                engine.send_command(cmd);
                parsed_idx = arg_idx;
                arg_idx = args.len();
            }

            // `--help` and `--version` are both "error" cases according to Clap
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                println!("{e}");
                parsed_idx = arg_idx;
                arg_idx = args.len();
            }

            Err(e) => {
                // Nothing starting at `parsed_idx` parses, so skip that argument
                if arg_idx == parsed_idx + 1 {
                    eprintln!("Error on input {slice:?}:\n{e}");
                    parsed_idx += 1;
                    arg_idx = args.len();
                } else {
                    arg_idx -= 1;
                }
            }
        }
    }

    engine.run();
}
