use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

/// Progress of the closing handshake of a WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosingState {
    #[default]
    Open,
    /// The peer sent CLOSE, ours has not been sent yet.
    CloseReceived,
    /// We sent CLOSE and wait for the peer's.
    CloseSent,
    Closed,
}

/// The closing state shared by a [`WsDecoder`](super::WsDecoder) and its peer
/// [`WsEncoder`](super::WsEncoder).
///
/// Cloning the handle shares the state; the engines of one connection live on
/// one thread.
#[derive(Debug, Clone, Default)]
pub struct SharedClosingState(Rc<Cell<ClosingState>>);

impl SharedClosingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state, as last updated by either engine.
    pub fn get(&self) -> ClosingState {
        self.0.get()
    }

    /// Records a received CLOSE frame, returns the state it was in before.
    pub(crate) fn close_received(&self) -> ClosingState {
        let before = self.0.get();
        let after = match before {
            ClosingState::Open => ClosingState::CloseReceived,
            ClosingState::CloseSent => ClosingState::Closed,
            other => other,
        };
        self.transition(before, after);
        before
    }

    /// Records a sent CLOSE frame, returns the new state.
    pub(crate) fn close_sent(&self) -> ClosingState {
        let before = self.0.get();
        let after = match before {
            ClosingState::Open => ClosingState::CloseSent,
            ClosingState::CloseReceived => ClosingState::Closed,
            other => other,
        };
        self.transition(before, after);
        after
    }

    fn transition(&self, before: ClosingState, after: ClosingState) {
        if before != after {
            debug!(?before, ?after, "closing state changed");
            self.0.set(after);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_initiated_locally() {
        let state = SharedClosingState::new();
        let decoder_side = state.clone();

        assert_eq!(state.close_sent(), ClosingState::CloseSent);
        assert_eq!(decoder_side.close_received(), ClosingState::CloseSent);
        assert_eq!(state.get(), ClosingState::Closed);
    }

    #[test]
    fn close_initiated_by_peer() {
        let state = SharedClosingState::new();

        assert_eq!(state.close_received(), ClosingState::Open);
        assert_eq!(state.get(), ClosingState::CloseReceived);
        assert_eq!(state.close_received(), ClosingState::CloseReceived);
        assert_eq!(state.close_sent(), ClosingState::Closed);
        assert_eq!(state.close_sent(), ClosingState::Closed);
    }
}
