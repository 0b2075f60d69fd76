//! The one-byte liquid status stored per voxel.
//!
//! ```text
//!  bit  7      6 5 4        3 2 1 0
//!      rate   direction    MAX_HEIGHT - height
//! ```
//!
//! The direction field holds 0 for "no flow", 1..=6 for a face and 7 for
//! quick-down. The rate bit selects between the two rates a direction code
//! allows: 1..=2 for a face, 3..=4 for quick-down, 0 without a direction.
//!
//! A status of 0 is a full, still cell.

use rill_utils::Direction;
use thiserror::Error;

/// Height of a full cell.
pub const MAX_HEIGHT: u8 = 16;
/// Fastest sideways (or ordinary downward) flow.
pub const MAX_RATE: u8 = 2;
/// Fastest downward flow, only reachable through quick-down.
pub const MAX_DOWN_RATE: u8 = 4;
/// Status of a freshly placed liquid block.
pub const FULL: u8 = 0;

const HEIGHT_MASK: u8 = 0b0000_1111;
const DIRECTION_MASK: u8 = 0b0111_0000;
const DIRECTION_SHIFT: u8 = 4;
const RATE_BIT: u8 = 0b1000_0000;
const QUICK_DOWN_CODE: u8 = 7;

/// Invalid argument passed to the codec. Never clamped.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StatusError {
    /// Height outside `1..=16`.
    #[error("liquid height {0} is outside 1..=16")]
    HeightOutOfRange(i32),
    /// Rate outside `0..=4`.
    #[error("flow rate {0} is outside 0..=4")]
    RateOutOfRange(u8),
    /// Rate not representable with the stored direction.
    #[error("flow rate {rate} is incompatible with direction {direction:?}")]
    IncompatibleRate {
        /// Requested rate.
        rate: u8,
        /// Direction stored at the time.
        direction: FlowDirection,
    },
}

/// The direction field of a status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowDirection {
    /// No flow.
    None,
    /// Flow through one of the six faces at rate 1 or 2.
    Face(Direction),
    /// Fast downward flow at rate 3 or 4.
    QuickDown,
}

impl FlowDirection {
    /// Field value of this direction.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Face(Direction::Up) => 1,
            Self::Face(Direction::West) => 2,
            Self::Face(Direction::East) => 3,
            Self::Face(Direction::North) => 4,
            Self::Face(Direction::South) => 5,
            Self::Face(Direction::Down) => 6,
            Self::QuickDown => QUICK_DOWN_CODE,
        }
    }

    /// Direction stored under a field value. Only the low three bits count.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0 => Self::None,
            1 => Self::Face(Direction::Up),
            2 => Self::Face(Direction::West),
            3 => Self::Face(Direction::East),
            4 => Self::Face(Direction::North),
            5 => Self::Face(Direction::South),
            6 => Self::Face(Direction::Down),
            _ => Self::QuickDown,
        }
    }

    /// The face liquid leaves through; quick-down leaves downwards.
    #[must_use]
    pub const fn face(self) -> Option<Direction> {
        match self {
            Self::None => None,
            Self::Face(direction) => Some(direction),
            Self::QuickDown => Some(Direction::Down),
        }
    }

    /// Returns true for ordinary downward flow and quick-down.
    #[must_use]
    pub const fn is_downward(self) -> bool {
        matches!(self, Self::Face(Direction::Down) | Self::QuickDown)
    }
}

impl From<Option<Direction>> for FlowDirection {
    fn from(direction: Option<Direction>) -> Self {
        direction.map_or(Self::None, Self::Face)
    }
}

/// Decodes the height, in `1..=16`.
#[must_use]
pub const fn height(status: u8) -> u8 {
    MAX_HEIGHT - (status & HEIGHT_MASK)
}

/// Stores a height, leaving the other fields untouched.
pub fn with_height(status: u8, height: i32) -> Result<u8, StatusError> {
    if !(1..=i32::from(MAX_HEIGHT)).contains(&height) {
        return Err(StatusError::HeightOutOfRange(height));
    }
    Ok((status & !HEIGHT_MASK) | (MAX_HEIGHT - height as u8))
}

/// Decodes the direction field.
#[must_use]
pub const fn direction(status: u8) -> FlowDirection {
    FlowDirection::from_code((status & DIRECTION_MASK) >> DIRECTION_SHIFT)
}

/// Stores a direction. The rate bit is left as it is.
#[must_use]
pub const fn with_direction(status: u8, direction: FlowDirection) -> u8 {
    (status & !DIRECTION_MASK) | (direction.code() << DIRECTION_SHIFT)
}

/// Decodes the flow rate, in `0..=4`.
#[must_use]
pub const fn rate(status: u8) -> u8 {
    let select = (status & RATE_BIT != 0) as u8;
    match direction(status) {
        FlowDirection::None => 0,
        FlowDirection::Face(_) => 1 + select,
        FlowDirection::QuickDown => 3 + select,
    }
}

/// Stores a flow rate, converting the direction where the rate demands it.
///
/// Rate 0 always succeeds and clears the direction. Rates 1 and 2 need a
/// direction and turn quick-down back into ordinary downward flow. Rates 3
/// and 4 need a downward direction and switch it to quick-down.
pub fn with_rate(status: u8, rate: u8) -> Result<u8, StatusError> {
    let current = direction(status);
    let (direction, select) = match rate {
        0 => return Ok(with_direction(status, FlowDirection::None) & !RATE_BIT),
        1 | 2 => match current {
            FlowDirection::None => {
                return Err(StatusError::IncompatibleRate {
                    rate,
                    direction: current,
                });
            }
            FlowDirection::QuickDown => (FlowDirection::Face(Direction::Down), rate - 1),
            face @ FlowDirection::Face(_) => (face, rate - 1),
        },
        3 | 4 if current.is_downward() => (FlowDirection::QuickDown, rate - 3),
        3 | 4 => {
            return Err(StatusError::IncompatibleRate {
                rate,
                direction: current,
            });
        }
        _ => return Err(StatusError::RateOutOfRange(rate)),
    };
    let status = with_direction(status, direction) & !RATE_BIT;
    Ok(if select == 1 { status | RATE_BIT } else { status })
}

/// A decoded status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidStatus {
    /// Height in `1..=16`.
    pub height: u8,
    /// Face the cell is flowing out through, if any.
    pub direction: Option<Direction>,
    /// Outflow rate in `0..=4`.
    pub rate: u8,
}

impl LiquidStatus {
    /// A full cell with no flow.
    pub const FULL: LiquidStatus = LiquidStatus {
        height: MAX_HEIGHT,
        direction: None,
        rate: 0,
    };

    /// Decodes a status byte.
    #[must_use]
    pub const fn decode(status: u8) -> Self {
        let rate = rate(status);
        Self {
            height: height(status),
            direction: if rate == 0 {
                None
            } else {
                direction(status).face()
            },
            rate,
        }
    }

    /// Creates a still cell of the given height.
    #[must_use]
    pub const fn still(height: u8) -> Self {
        Self {
            height,
            direction: None,
            rate: 0,
        }
    }

    /// Creates a flowing cell.
    #[must_use]
    pub const fn flowing(height: u8, direction: Direction, rate: u8) -> Self {
        Self {
            height,
            direction: Some(direction),
            rate,
        }
    }

    /// Encodes into a status byte.
    pub fn encode(&self) -> Result<u8, StatusError> {
        let status = with_height(FULL, i32::from(self.height))?;
        if self.rate == 0 {
            return with_rate(status, 0);
        }
        let status = with_direction(status, FlowDirection::from(self.direction));
        with_rate(status, self.rate)
    }
}
