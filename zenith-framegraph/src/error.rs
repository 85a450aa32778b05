use derive_more::{Display, Error};
use crate::graph::FrameGraphState;
use crate::handle::ResourceHandle;

/// Failures reported by the frame graph.
///
/// Build-time failures are non-fatal: the offending call logs, records the
/// error (see `FrameGraph::errors`) and returns [`ResourceHandle::INVALID`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum FrameGraphError {
    #[display("invalid or stale resource handle {handle:?}")]
    InvalidHandle { handle: ResourceHandle },

    #[display("pass \"{pass}\" already writes to \"{resource}\"")]
    PassAlreadyWrites { pass: String, resource: String },

    #[display("usage {usage} is not declared by imported resource \"{resource}\"")]
    UsageNotDeclared { resource: String, usage: String },

    #[display("pass \"{pass}\" reads \"{resource}\" which was never written nor imported")]
    UninitializedRead { pass: String, resource: String },

    #[display("pass \"{pass}\" did not declare a read or write of \"{resource}\"")]
    UndeclaredResource { pass: String, resource: String },

    #[display("resource \"{resource}\" has no concrete object at this point of the frame")]
    NotDevirtualized { resource: String },

    #[display("resource \"{resource}\" can not be forwarded to itself")]
    ForwardToSelf { resource: String },

    #[display("frame graph is {found:?}, expected {expected:?}")]
    InvalidState {
        expected: FrameGraphState,
        found: FrameGraphState,
    },
}
