/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// A marker trait for how much a [`crate::Search`] prints while it runs.
///
/// The levels are resolved at compile time, so a search at [`LogNone`] carries no logging code at all.
pub trait LogLevel {
    /// Print the regular UCI output: `info` lines after each depth and the final `bestmove`.
    const INFO: bool;

    /// Print extra `info string` diagnostics, such as time budgets and hash table statistics.
    const DEBUG: bool;
}

/// Print nothing. Used for tests and for searches run through the library API.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNone;
impl LogLevel for LogNone {
    const INFO: bool = false;
    const DEBUG: bool = false;
}

/// Print the regular UCI output.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogInfo;
impl LogLevel for LogInfo {
    const INFO: bool = true;
    const DEBUG: bool = false;
}

/// Print everything, as enabled by `debug on`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDebug;
impl LogLevel for LogDebug {
    const INFO: bool = true;
    const DEBUG: bool = true;
}
