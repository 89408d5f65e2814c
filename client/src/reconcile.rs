use crate::round::RoundGames;
use chess::Board;
use liveboard_protocol::{
    AddNodeFrame, ChapterFrame, ClockFrame, RoundMessage, Side, LIVE_RELAY_PATH,
};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("malformed fen {fen:?}: {cause}")]
    InvalidFen {
        fen: String,
        cause: chess::Error,
    },
}

/// Fold one feed message into the snapshot.
///
/// Every handler is a pure function from the current snapshot to the next
/// one; each message kind may only touch the fields it is authoritative for.
pub fn apply(current: &RoundGames, message: &RoundMessage) -> Result<RoundGames, ReconcileError> {
    match message {
        RoundMessage::AddNode(frame) => handle_add_node(current, frame),
        RoundMessage::Chapters(chapters) => Ok(handle_chapters(chapters)),
        RoundMessage::Clock(frame) => Ok(handle_clock(current, frame)),
    }
}

/// A move landed. Only frames for the live tip count; everything else is a
/// replay of history and leaves the snapshot untouched.
///
/// The frame's clock belongs to the side that just moved, which is the
/// opposite of the new position's side to move. The side to move keeps its
/// previous clock.
pub fn handle_add_node(
    current: &RoundGames,
    frame: &AddNodeFrame,
) -> Result<RoundGames, ReconcileError> {
    if frame.relay_path != LIVE_RELAY_PATH {
        return Ok(current.clone());
    }
    if !current.contains(&frame.p.chapter_id) {
        // Late frame for a game the round no longer tracks.
        return Ok(current.clone());
    }

    let board = Board::from_str(&frame.n.fen).map_err(|cause| ReconcileError::InvalidFen {
        fen: frame.n.fen.clone(),
        cause,
    })?;
    let to_move = side_of(board.side_to_move());

    let mut next = current.clone();
    if let Some(game) = next.get_mut(&frame.p.chapter_id) {
        game.players[to_move.opposite()].clock = frame.n.clock.map(Duration::from);
        game.fen = frame.n.fen.clone();
        game.last_move = Some(frame.n.uci.clone());
        game.think_time = Duration::ZERO;
    }
    Ok(next)
}

/// Full resynchronization: the incoming list becomes the round, in its order.
pub fn handle_chapters(chapters: &[ChapterFrame]) -> RoundGames {
    RoundGames::from_chapters(chapters)
}

/// Server clock correction. Applies exactly the sides present in the frame;
/// position, last move and think time stay untouched.
pub fn handle_clock(current: &RoundGames, frame: &ClockFrame) -> RoundGames {
    let mut next = current.clone();
    if let Some(game) = next.get_mut(&frame.id) {
        if let Some(wc) = frame.wc {
            game.players[Side::White].clock = Some(wc.into());
        }
        if let Some(bc) = frame.bc {
            game.players[Side::Black].clock = Some(bc.into());
        }
    }
    next
}

fn side_of(color: chess::Color) -> Side {
    match color {
        chess::Color::White => Side::White,
        chess::Color::Black => Side::Black,
    }
}
