//! Drop zones and pointer hit-testing

use pathway_record::Membership;
use serde::{Deserialize, Serialize};

/// Pointer position in board coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset
    pub x: f32,
    /// Vertical offset
    pub y: f32,
}

impl Point {
    /// Create point
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`
    #[inline]
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Create rectangle
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment: left/top edges inclusive, right/bottom exclusive
    #[inline]
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    /// Center point
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Drop zone identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneId {
    /// Saved list
    Saved,
    /// Target list
    Target,
}

impl ZoneId {
    /// Both zones, Saved first
    pub const ALL: [ZoneId; 2] = [ZoneId::Saved, ZoneId::Target];

    /// Collection a drop here moves a record into
    #[inline]
    #[must_use]
    pub fn membership(self) -> Membership {
        match self {
            ZoneId::Saved => Membership::Saved,
            ZoneId::Target => Membership::Target,
        }
    }

    /// Zone rendering a collection
    #[inline]
    #[must_use]
    pub fn for_membership(membership: Membership) -> Self {
        match membership {
            Membership::Saved => ZoneId::Saved,
            Membership::Target => ZoneId::Target,
        }
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.membership().as_str())
    }
}

/// The two registered drop zones
///
/// Overlapping bounds resolve to Target, matching the layout where the
/// target column is rendered above the saved grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneRegistry {
    saved: Rect,
    target: Rect,
}

impl ZoneRegistry {
    /// Register both zones
    #[inline]
    #[must_use]
    pub fn new(saved: Rect, target: Rect) -> Self {
        Self { saved, target }
    }

    /// Bounds of a zone
    #[inline]
    #[must_use]
    pub fn bounds(&self, zone: ZoneId) -> Rect {
        match zone {
            ZoneId::Saved => self.saved,
            ZoneId::Target => self.target,
        }
    }

    /// Zone under the pointer, if any
    #[must_use]
    pub fn zone_at(&self, p: Point) -> Option<ZoneId> {
        if self.target.contains(p) {
            Some(ZoneId::Target)
        } else if self.saved.contains(p) {
            Some(ZoneId::Saved)
        } else {
            None
        }
    }
}
