pub mod extractor;
pub mod jwt;
pub mod session;
pub mod test_utils;

pub use extractor::{auth_middleware, AuthContext};
pub use session::{MemorySessionStore, RedisSessionStore, SessionData, SessionError, SessionStore};
