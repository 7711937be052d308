use thiserror::Error;

/// Errors surfaced to the embedding application. Internal invariants (event
/// ordering, one resident program per channel) are kept by construction and
/// never show up here.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error("channel {0} is out of range")]
    BadChannel(u8),
    #[error("{0} value {1} is out of range")]
    BadData(&'static str, u8),
    #[error("no key at coordinate {0}")]
    KeyOutOfBounds(f32),
    #[error("note's events are no longer in the track")]
    StaleNote,
}
