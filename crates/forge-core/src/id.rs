use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Identifies a recurring task held by a [`Scheduler`](crate::scheduler::Scheduler).
    pub struct TaskId;
}

/// A block position in a named world.
///
/// Two locations with the same world name and coordinates are the same
/// block; everything else about a forge is read live from the world.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Location {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// The location offset by an arbitrary vector, in the same world.
    /// `None` when a coordinate leaves the `i32` range.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self {
            world: self.world.clone(),
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            z: self.z.checked_add(dz)?,
        })
    }

    /// The neighbouring block in the given direction. Coordinates wrap at
    /// the ends of the `i32` range.
    pub fn relative(&self, face: Face) -> Self {
        let (dx, dy, dz) = face.offset();
        Self {
            world: self.world.clone(),
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
            z: self.z.wrapping_add(dz),
        }
    }

    pub fn below(&self) -> Self {
        self.relative(Face::Down)
    }

    pub fn above(&self) -> Self {
        self.relative(Face::Up)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

/// Block faces. North is -z, east is +x, up is +y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

impl Face {
    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            Face::North => (0, 0, -1),
            Face::East => (1, 0, 0),
            Face::South => (0, 0, 1),
            Face::West => (-1, 0, 0),
            Face::Up => (0, 1, 0),
            Face::Down => (0, -1, 0),
        }
    }

    /// The next cardinal face, 90 degrees clockwise seen from above.
    /// Vertical faces have no rotation and map to themselves.
    pub fn clockwise(self) -> Self {
        match self {
            Face::North => Face::East,
            Face::East => Face::South,
            Face::South => Face::West,
            Face::West => Face::North,
            vertical => vertical,
        }
    }

    /// The previous cardinal face, 90 degrees counter-clockwise.
    pub fn counter_clockwise(self) -> Self {
        match self {
            Face::North => Face::West,
            Face::West => Face::South,
            Face::South => Face::East,
            Face::East => Face::North,
            vertical => vertical,
        }
    }
}
