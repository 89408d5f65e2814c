use liveboard_protocol::{BySide, ChapterFrame, GameId, PlayerFrame};
use std::time::Duration;

/// One player's slot in a live game.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub name: String,
    pub title: Option<String>,
    pub rating: Option<u16>,
    /// Remaining clock as last reported by the feed, `None` until first seen.
    pub clock: Option<Duration>,
}

impl From<&PlayerFrame> for PlayerState {
    fn from(frame: &PlayerFrame) -> Self {
        PlayerState {
            name: frame.name.clone(),
            title: frame.title.clone(),
            rating: frame.rating,
            clock: frame.clock.map(Duration::from),
        }
    }
}

/// Live state of one game in the round.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub players: BySide<PlayerState>,
    pub fen: String,
    pub last_move: Option<String>,
    /// Elapsed since the last move landed; the local ticker advances it,
    /// an accepted move resets it.
    pub think_time: Duration,
    pub playing: bool,
}

impl GameState {
    pub fn from_chapter(chapter: &ChapterFrame) -> GameState {
        let [white, black] = &chapter.players;
        GameState {
            players: BySide::new(PlayerState::from(white), PlayerState::from(black)),
            fen: chapter.fen.clone(),
            last_move: chapter.last_move.clone(),
            think_time: Duration::ZERO,
            playing: ongoing(chapter.status.as_deref()),
        }
    }
}

/// A chapter with no result yet is still running.
fn ongoing(status: Option<&str>) -> bool {
    matches!(status, None | Some("*"))
}

/// All games of one broadcast round, in the feed's display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundGames {
    entries: Vec<(GameId, GameState)>,
}

impl RoundGames {
    pub fn new() -> Self {
        RoundGames::default()
    }

    /// Build a round from a full chapters snapshot, keeping the list's order.
    pub fn from_chapters(chapters: &[ChapterFrame]) -> Self {
        RoundGames {
            entries: chapters
                .iter()
                .map(|c| (c.id.clone(), GameState::from_chapter(c)))
                .collect(),
        }
    }

    pub fn get(&self, id: &GameId) -> Option<&GameState> {
        self.entries.iter().find(|(gid, _)| gid == id).map(|(_, g)| g)
    }

    pub fn get_mut(&mut self, id: &GameId) -> Option<&mut GameState> {
        self.entries
            .iter_mut()
            .find(|(gid, _)| gid == id)
            .map(|(_, g)| g)
    }

    pub fn contains(&self, id: &GameId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &GameId> {
        self.entries.iter().map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GameId, &GameState)> {
        self.entries.iter().map(|(id, g)| (id, g))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&GameId, &mut GameState)> {
        self.entries.iter_mut().map(|(id, g)| (&*id, g))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
