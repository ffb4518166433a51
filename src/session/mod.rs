// ABOUTME: Session module — on-disk session files, their JSON format, and name completion.
// ABOUTME: Nothing here touches editor state; commands wire it to the host.

pub mod codec;
pub mod completion;
pub mod store;

pub use codec::{BUFFER_PREFIX, EntryRef, SessionRecord};
pub use completion::{Completion, NameCompleter, complete};
pub use store::{SessionFile, SessionStore, generate_default_name, is_auto_generated};
