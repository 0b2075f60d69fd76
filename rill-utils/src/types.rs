// Wrapper types making it harder to accidentaly use the wrong underlying type.

use std::fmt::{self, Display};

use crate::math::Vector3;

/// A voxel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos(pub Vector3<i32>);

impl BlockPos {
    /// Creates a position from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// X coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.0.x
    }

    /// Y coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.0.y
    }

    /// Z coordinate.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.0.z
    }

    /// Returns the position shifted by the given offsets.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// Returns the position directly below.
    #[must_use]
    pub const fn below(&self) -> Self {
        self.offset(0, -1, 0)
    }

    /// Returns the position directly above.
    #[must_use]
    pub const fn above(&self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Checkerboard colour of this position.
    #[must_use]
    pub const fn parity(&self) -> Parity {
        Parity::of(self)
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

/// Checkerboard colour of a position, `(x + y + z) mod 2`.
///
/// Two face-adjacent positions always have different parities, which is what
/// lets the scheduler update one colour while the other is held still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    /// `(x + y + z)` is even.
    Even = 0,
    /// `(x + y + z)` is odd.
    Odd = 1,
}

impl Parity {
    /// Both parities, in index order.
    pub const ALL: [Parity; 2] = [Parity::Even, Parity::Odd];

    /// Parity of a position. Uses the euclidean remainder so negative
    /// coordinates keep alternating.
    #[must_use]
    pub const fn of(pos: &BlockPos) -> Self {
        let sum = pos.0.x as i64 + pos.0.y as i64 + pos.0.z as i64;
        if sum.rem_euclid(2) == 0 {
            Self::Even
        } else {
            Self::Odd
        }
    }

    /// The other colour.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Even => Self::Odd,
            Self::Odd => Self::Even,
        }
    }

    /// Index usable for two-element arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// An axis aligned box of positions, both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockBox {
    /// Lowest corner.
    pub min: BlockPos,
    /// Highest corner.
    pub max: BlockPos,
}

impl BlockBox {
    /// Creates a box from two arbitrary corners.
    #[must_use]
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x().min(b.x()), a.y().min(b.y()), a.z().min(b.z())),
            max: BlockPos::new(a.x().max(b.x()), a.y().max(b.y()), a.z().max(b.z())),
        }
    }

    /// Returns true if the position lies inside the box.
    #[must_use]
    pub fn contains(&self, pos: &BlockPos) -> bool {
        (self.min.x()..=self.max.x()).contains(&pos.x())
            && (self.min.y()..=self.max.y()).contains(&pos.y())
            && (self.min.z()..=self.max.z()).contains(&pos.z())
    }

    /// Size along each axis.
    #[must_use]
    pub fn size(&self) -> Vector3<i32> {
        Vector3::new(
            self.max.x() - self.min.x() + 1,
            self.max.y() - self.min.y() + 1,
            self.max.z() - self.min.z() + 1,
        )
    }

    /// Number of positions in the box.
    #[must_use]
    pub fn volume(&self) -> u64 {
        let size = self.size();
        size.x as u64 * size.y as u64 * size.z as u64
    }

    /// Iterates every position in the box, x fastest.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        (self.min.y()..=self.max.y()).flat_map(move |y| {
            (self.min.z()..=self.max.z()).flat_map(move |z| {
                (self.min.x()..=self.max.x()).map(move |x| BlockPos::new(x, y, z))
            })
        })
    }
}
