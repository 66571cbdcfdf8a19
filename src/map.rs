//! Map layouts, either built in code or parsed from a character grid.

use crate::error::MapError;
use crate::{Coord, Direction};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The symbol table used by [`MapLayout::parse`].
static DEFAULT_SYMBOLS: Lazy<SymbolTable> = Lazy::new(|| {
    SymbolTable::from_json(
        r##"{
            ">": { "road": "Right" },
            "<": { "road": "Left" },
            "^": { "road": "Up" },
            "v": { "road": "Down" },
            "S": { "light": { "green": false, "period": 15 } },
            "s": { "light": { "green": true, "period": 7 } },
            "#": "obstacle",
            "D": "destination"
        }"##,
    )
    .expect("built-in symbol table is valid")
});

/// What a single map character stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Road(Direction),
    /// A traffic light; its road direction is taken from the neighbouring roads.
    Light { green: bool, period: u32 },
    Obstacle,
    Destination,
}

/// Maps characters to the features they stand for. Unmapped characters are empty cells.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolTable {
    symbols: HashMap<char, Symbol>,
}

/// A feature to be placed on a cell when the world is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Road(Direction),
    Light { green: bool, period: u32 },
    Destination,
    Obstacle,
}

/// The static layout of a world.
#[derive(Clone, Debug, Default)]
pub struct MapLayout {
    width: u32,
    height: u32,
    placements: Vec<(Coord, Placement)>,
}

impl SymbolTable {
    /// Loads a symbol table from a JSON object keyed by character.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The table used by [`MapLayout::parse`].
    pub fn standard() -> &'static SymbolTable {
        &DEFAULT_SYMBOLS
    }

    pub fn get(&self, symbol: char) -> Option<Symbol> {
        self.symbols.get(&symbol).copied()
    }

    pub fn insert(&mut self, symbol: char, meaning: Symbol) {
        self.symbols.insert(symbol, meaning);
    }

    fn road(&self, symbol: Option<char>) -> Option<Direction> {
        match self.get(symbol?) {
            Some(Symbol::Road(dir)) => Some(dir),
            _ => None,
        }
    }
}

impl MapLayout {
    /// Creates an empty layout.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            placements: vec![],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The features to place, in insertion order.
    pub fn placements(&self) -> &[(Coord, Placement)] {
        &self.placements
    }

    pub fn road(mut self, coord: impl Into<Coord>, dir: Direction) -> Self {
        self.placements.push((coord.into(), Placement::Road(dir)));
        self
    }

    /// Places a straight lane of `len` road cells starting at `start` and running in `dir`.
    pub fn road_line(mut self, start: impl Into<Coord>, len: u32, dir: Direction) -> Self {
        let mut coord = start.into();
        for _ in 0..len {
            self.placements.push((coord, Placement::Road(dir)));
            coord = coord.step(dir);
        }
        self
    }

    /// Places a traffic light. The cell must also be given a road.
    pub fn light(mut self, coord: impl Into<Coord>, green: bool, period: u32) -> Self {
        self.placements
            .push((coord.into(), Placement::Light { green, period }));
        self
    }

    pub fn destination(mut self, coord: impl Into<Coord>) -> Self {
        self.placements.push((coord.into(), Placement::Destination));
        self
    }

    pub fn obstacle(mut self, coord: impl Into<Coord>) -> Self {
        self.placements.push((coord.into(), Placement::Obstacle));
        self
    }

    /// Parses a map using the standard symbol table.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        Self::parse_with(text, SymbolTable::standard())
    }

    /// Parses a map, one row per line with the top row first.
    pub fn parse_with(text: &str, table: &SymbolTable) -> Result<Self, MapError> {
        let rows = text
            .lines()
            .map(|line| line.trim_end_matches('\r').chars().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let rows = match rows.iter().rposition(|row| !row.is_empty()) {
            Some(last) => &rows[..=last],
            None => return Err(MapError::Empty),
        };

        let width = rows[0].len();
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != width)
            .map(|(idx, row)| (idx, row.len()))
        {
            return Err(MapError::Ragged {
                row,
                expected: width,
                found,
            });
        }

        let height = rows.len();
        let at = |r: usize, c: usize| rows.get(r).and_then(|row| row.get(c)).copied();
        let mut layout = MapLayout::new(width as u32, height as u32);

        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.iter().enumerate() {
                let coord = Coord::new(c as i32, (height - r - 1) as i32);
                match table.get(*ch) {
                    Some(Symbol::Road(dir)) => layout = layout.road(coord, dir),
                    Some(Symbol::Light { green, period }) => {
                        let dir = [
                            r.checked_sub(1).and_then(|r| at(r, c)),
                            at(r + 1, c),
                            c.checked_sub(1).and_then(|c| at(r, c)),
                            at(r, c + 1),
                        ]
                        .into_iter()
                        .find_map(|symbol| table.road(symbol))
                        .unwrap_or(Direction::Left);
                        layout = layout.road(coord, dir).light(coord, green, period);
                    }
                    Some(Symbol::Obstacle) => layout = layout.obstacle(coord),
                    Some(Symbol::Destination) => layout = layout.destination(coord),
                    None => {}
                }
            }
        }

        Ok(layout)
    }
}
