//! Git integration: reading the diff and delivering the message.

pub mod diff;
pub mod sink;

pub use diff::{DiffProvider, DiffSnapshot, DiffSource, RepoDiffProvider, collect_diff};
pub use sink::{CommitMessageSink, CommitSink, EditMsgSink, StdoutSink};
