//! ShareVault client SDK
//!
//! Typed client for the ShareVault secure file-sharing backend:
//! authentication with optional TOTP second factor, file upload/download,
//! tagging, versioning, and link/user sharing. All business logic lives
//! server-side; this crate is the presentation-independent client layer:
//! an HTTP wrapper with a single 401-refresh-retry cycle, an explicit
//! session handle with rehydrate/persist/clear lifecycle, reducer-style
//! cached state, and a pure navigation guard. The `sharevault-cli` binary
//! is the reference front-end.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod session;
pub mod state;

pub use api::types::{
    DateRange, FileKind, FilePreview, FileRecord, FileVersion, MfaSetup, RegisterRequest,
    SearchParams, ShareExpiration, ShareLink, SharedFileMeta, SizeRange, SortOrder, Tag,
    UserProfile,
};
pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use guard::{evaluate as evaluate_route, RouteDecision};
pub use session::{Session, SessionData, SessionEvent, SessionState, SessionStore};
pub use state::{FileAction, FileState, RequestSequence};
