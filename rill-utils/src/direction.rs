//! The six face directions.

use crate::math::Vector3;
use crate::types::BlockPos;

/// Six face directions of a voxel.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Downward (-Y direction)
    Down = 0,
    /// Upward (+Y direction)
    Up = 1,
    /// North (-Z direction)
    North = 2,
    /// South (+Z direction)
    South = 3,
    /// West (-X direction)
    West = 4,
    /// East (+X direction)
    East = 5,
}

impl Direction {
    /// All six directions in array form for iteration.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The four directions that keep y constant.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Gets the offset in the given direction.
    ///
    /// Returns (dx, dy, dz) for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::West => (-1, 0, 0),
            Self::East => (1, 0, 0),
        }
    }

    /// Unit vector pointing in this direction.
    #[must_use]
    pub const fn unit(self) -> Vector3<i32> {
        let (dx, dy, dz) = self.offset();
        Vector3::new(dx, dy, dz)
    }

    /// Returns true for the four directions that keep y constant.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        !matches!(self, Self::Down | Self::Up)
    }

    /// Returns a new `BlockPos` relative to the given position in this direction.
    #[must_use]
    pub const fn relative(self, pos: BlockPos) -> BlockPos {
        let (dx, dy, dz) = self.offset();
        pos.offset(dx, dy, dz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_ne!(direction.opposite(), direction);
        }
        assert_eq!(Direction::Down.opposite(), Direction::Up);
        assert_eq!(Direction::West.opposite(), Direction::East);
    }

    #[test]
    fn test_relative_round_trips() {
        let pos = BlockPos::new(3, -7, 12);
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().relative(direction.relative(pos)), pos);
        }
        assert_eq!(Direction::Down.relative(pos), BlockPos::new(3, -8, 12));
    }

    #[test]
    fn test_horizontal() {
        assert!(Direction::HORIZONTAL.iter().all(|d| d.is_horizontal()));
        assert!(!Direction::Down.is_horizontal());
        assert!(!Direction::Up.is_horizontal());
    }
}
