/// Tile categories and their integer ids.
///
/// Levels arrive as row-major grids of non-negative integer ids. Each id
/// classifies into at most one category; id 0 and any unrecognized id fold
/// to `Empty` and produce no geometry (unknown ids are non-fatal).
///
/// Id assignments:
///   1..4  solid blocks (visual variants, identical collision)
///   5     trap (spikes)        6   checkpoint
///   7     sign (decor only)    8   enemy spawn
///   9     exit                 10  ladder
///   11    falling platform     12  saw anchor
///   13    boss spawn

/// World tile size in pixels.
pub const TILE: i32 = 32;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Empty,
    Solid,
    Trap,
    Checkpoint,
    Sign,
    EnemySpawn,
    Exit,
    Ladder,
    PlatformSpawn,
    SawSpawn,
    BossSpawn,
}

impl Tile {
    pub fn from_id(id: u32) -> Tile {
        match id {
            1..=4 => Tile::Solid,
            5 => Tile::Trap,
            6 => Tile::Checkpoint,
            7 => Tile::Sign,
            8 => Tile::EnemySpawn,
            9 => Tile::Exit,
            10 => Tile::Ladder,
            11 => Tile::PlatformSpawn,
            12 => Tile::SawSpawn,
            13 => Tile::BossSpawn,
            _ => Tile::Empty,
        }
    }

    /// Does this tile contribute a full-tile collision box?
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Solid)
    }

    /// Spawn markers place an entity at load and render as empty space.
    pub fn is_spawn(self) -> bool {
        matches!(
            self,
            Tile::EnemySpawn | Tile::PlatformSpawn | Tile::SawSpawn | Tile::BossSpawn
        )
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Empty
    }
}
