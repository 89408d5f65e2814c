use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::time::Duration;

/// FEN of the starting position, used when a chapter frame omits its own.
pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Relay path of the live tip of a game's move tree. Frames addressing any
/// other path describe historical positions.
pub const LIVE_RELAY_PATH: &str = "!";

/// ---- Sides ----
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

/// One value per side, indexable by [`Side`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BySide<T> {
    pub white: T,
    pub black: T,
}

impl<T> BySide<T> {
    pub fn new(white: T, black: T) -> Self {
        BySide { white, black }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }
}

impl<T> Index<Side> for BySide<T> {
    type Output = T;
    fn index(&self, side: Side) -> &T {
        self.get(side)
    }
}

impl<T> IndexMut<Side> for BySide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        self.get_mut(side)
    }
}

/// ---- Identifiers ----
/// Opaque id of one game (chapter) within a round, minted by the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct GameId(pub String);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GameId {
    fn from(s: &str) -> Self {
        GameId(s.to_string())
    }
}

impl From<String> for GameId {
    fn from(s: String) -> Self {
        GameId(s)
    }
}

/// ---- Clock encoding ----
/// Clock values travel as hundredths of a second.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Centis(pub u64);

impl From<Centis> for Duration {
    fn from(c: Centis) -> Duration {
        Duration::from_millis(c.0 * 10)
    }
}

/// ---- Round socket frames ----
/// Every frame on a round's feed is `{"t": <topic>, "d": <payload>}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", content = "d")]
pub enum RoundMessage {
    /// A move landed on some path of a game's move tree.
    #[serde(rename = "addNode")]
    AddNode(AddNodeFrame),
    /// Full list of the round's games, in display order.
    #[serde(rename = "chapters")]
    Chapters(Vec<ChapterFrame>),
    /// Server-side clock correction for one game.
    #[serde(rename = "clock")]
    Clock(ClockFrame),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddNodeFrame {
    /// Where in the move tree the node was added.
    pub p: NodePointer,
    /// The node itself.
    pub n: NodeData,
    /// `"!"` when the node is the live tip, see [`LIVE_RELAY_PATH`].
    #[serde(rename = "relayPath")]
    pub relay_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodePointer {
    #[serde(rename = "chapterId")]
    pub chapter_id: GameId,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeData {
    /// Position after the move.
    pub fen: String,
    /// The move in coordinate notation, e.g. `e2e4`.
    pub uci: String,
    /// Remaining clock of the side that just moved, if the relay knows it.
    #[serde(default)]
    pub clock: Option<Centis>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterFrame {
    pub id: GameId,
    /// `[white, black]`.
    pub players: [PlayerFrame; 2],
    #[serde(default = "initial_fen")]
    pub fen: String,
    #[serde(rename = "lastMove", default)]
    pub last_move: Option<String>,
    /// `None` or `"*"` while the game runs, a result string once decided.
    #[serde(default)]
    pub status: Option<String>,
}

fn initial_fen() -> String {
    INITIAL_FEN.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerFrame {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub rating: Option<u16>,
    #[serde(default)]
    pub clock: Option<Centis>,
}

/// A clock frame may carry either side's clock, or both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockFrame {
    pub id: GameId,
    #[serde(default)]
    pub wc: Option<Centis>,
    #[serde(default)]
    pub bc: Option<Centis>,
}
