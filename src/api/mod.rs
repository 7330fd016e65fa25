//! Game-server access: transport and cache seams, push-update reducers and the
//! [SttApi] session that ties them to the roster engine.

pub mod cache;
pub mod merge;
pub mod session;
pub mod transport;
pub mod updates;

pub use cache::{CacheError, CrewCache, JsonFileCache, MemoryCache};
pub use session::{ApiError, ApiSettings, SttApi};
pub use transport::{FixtureTransport, GameRequest, GameTransport, MemoryTransport, Method, TransportError};
pub use updates::{apply_messages, parse_messages, DeletePatch, ServerMessage, UpdatePatch};
