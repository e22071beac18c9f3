//! Public result types re-used by external crates (e.g., the HTTP API layer).

use directory_store::DirectoryRecord;
use serde::Serialize;

/// Outbound message plus the records that were folded into it.
///
/// # Example
/// ```
/// use contextor::Injection;
/// let inj = Injection { prompt: "I have a headache".into(), records: vec![] };
/// assert!(inj.records.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Injection {
    pub prompt: String,
    pub records: Vec<DirectoryRecord>,
}

/// Answer of one chat exchange.
#[derive(Clone, Debug, Serialize)]
pub struct ChatReply {
    /// Oracle text shown to the user.
    pub reply: String,
    /// Directory records attached to the outbound message.
    pub context: Vec<DirectoryRecord>,
    /// Oracle attempts made, including the successful one.
    pub attempts: u32,
}
