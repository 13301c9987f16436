pub mod rankings;

pub use rankings::client::{HttpTransport, Transport, TransportResponse};
pub use rankings::error::{RankingsError, Result};
pub use rankings::leaderboard::Leaderboard;
pub use rankings::manager::{Host, McRankings};
pub use rankings::types::{PlayerScore, RequestKind, ServerIdentity};
