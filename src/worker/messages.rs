//! Message types exchanged with the favorite write worker.
//!
//! The engine sends [`WorkerMessage`]s in the order toggles were applied; the
//! worker reports each outcome back as a
//! [`StoreEvent`](crate::worker::StoreEvent). Messages carry the
//! tracing span that was current when they were built so the worker's spans
//! nest under the command that caused them.

use crate::domain::{Entry, EntryId};
use tokio::sync::oneshot;

/// Macro to generate builder methods for `WorkerMessage` variants.
///
/// Generates convenience constructors that automatically attach the current
/// span as the message origin.
macro_rules! worker_message_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl WorkerMessage {
            $(
                #[doc = concat!("Create a ", stringify!($variant), " message parented to the current span")]
                #[must_use]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::$variant {
                        $($field,)*
                        origin: tracing::Span::current(),
                    }
                }
            )*
        }
    };
}

worker_message_builders! {
    upsert(Upsert { entry: Entry }),
    delete(Delete { id: EntryId }),
    flush(Flush { ack: oneshot::Sender<()> }),
}

/// Requests processed by the worker, strictly in send order.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Persist `entry` as a favorite.
    Upsert {
        entry: Entry,

        /// Span active when the write was requested.
        origin: tracing::Span,
    },

    /// Remove the favorite with this id.
    Delete {
        id: EntryId,

        /// Span active when the write was requested.
        origin: tracing::Span,
    },

    /// Acknowledged once every earlier message has been handled.
    Flush {
        ack: oneshot::Sender<()>,

        /// Span active when the flush was requested.
        origin: tracing::Span,
    },
}

impl WorkerMessage {
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::Upsert { .. } => "upsert",
            Self::Delete { .. } => "delete",
            Self::Flush { .. } => "flush",
        }
    }

    pub(crate) const fn origin(&self) -> &tracing::Span {
        match self {
            Self::Upsert { origin, .. } | Self::Delete { origin, .. } | Self::Flush { origin, .. } => origin,
        }
    }
}
