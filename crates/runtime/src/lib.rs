//! Process lifecycle support for the `sufm` shell core and CLI tooling.

pub mod process;
