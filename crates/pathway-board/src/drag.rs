//! Drag session state machine
//!
//! `Idle -> Dragging -> Hovering -> Idle`, with a pre-activation press that
//! never leaves `Idle` until the pointer has travelled the activation
//! distance. Releasing a press early is a click; releasing a drag outside
//! every zone is a cancel. Only `Hovering` produces a drop.

use crate::zones::{Point, ZoneId};
use pathway_record::{Membership, ProgramId};

/// Drag state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    /// No gesture in progress
    #[default]
    Idle,
    /// Record lifted, pointer over no zone
    Dragging {
        /// Record being moved
        id: ProgramId,
        /// Collection at drag start
        origin: Membership,
    },
    /// Record lifted, pointer over a zone
    Hovering {
        /// Record being moved
        id: ProgramId,
        /// Collection at drag start
        origin: Membership,
        /// Zone under the pointer
        zone: ZoneId,
    },
}

impl DragState {
    /// Record being dragged, if any
    #[inline]
    #[must_use]
    pub fn dragged_id(&self) -> Option<&ProgramId> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { id, .. } | DragState::Hovering { id, .. } => Some(id),
        }
    }

    /// Zone under the pointer, if any
    #[inline]
    #[must_use]
    pub fn hover_zone(&self) -> Option<ZoneId> {
        match self {
            DragState::Hovering { zone, .. } => Some(*zone),
            _ => None,
        }
    }

    /// Check if a drag gesture is active
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, DragState::Idle)
    }
}

/// Completed drag, handed to the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropResolved {
    /// Record that was moved
    pub id: ProgramId,
    /// Collection at drag start
    pub origin: Membership,
    /// Zone it was released over
    pub zone: Option<ZoneId>,
}

impl DropResolved {
    /// Destination collection, when it differs from the origin
    #[inline]
    #[must_use]
    pub fn destination(&self) -> Option<Membership> {
        self.zone
            .map(ZoneId::membership)
            .filter(|dest| *dest != self.origin)
    }
}

/// How a gesture ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureEnd {
    /// Released over a zone
    Drop(DropResolved),
    /// Released before activation
    Click(ProgramId),
    /// Released over no zone, or cancelled
    Cancelled,
    /// Nothing was pressed
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
struct Press {
    id: ProgramId,
    origin: Membership,
    at: Point,
}

/// Single drag session owned by the board
#[derive(Debug, Clone)]
pub struct DragSession {
    state: DragState,
    press: Option<Press>,
    pointer: Option<Point>,
    activation_distance: f32,
}

impl DragSession {
    /// Create idle session
    #[inline]
    #[must_use]
    pub fn new(activation_distance: f32) -> Self {
        Self {
            state: DragState::Idle,
            press: None,
            pointer: None,
            activation_distance,
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Last pointer position while pressed or dragging
    #[inline]
    #[must_use]
    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    /// Check if a press is waiting for activation
    #[inline]
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    /// Pointer down on a card
    ///
    /// Returns `false` when another gesture already owns the pointer.
    pub fn press(&mut self, id: ProgramId, origin: Membership, at: Point) -> bool {
        if self.state.is_active() || self.press.is_some() {
            tracing::debug!(program = %id, "press ignored, gesture in progress");
            return false;
        }
        self.press = Some(Press { id, origin, at });
        self.pointer = Some(at);
        true
    }

    /// Pointer moved; `zone` is the drop zone under it
    pub fn pointer_move(&mut self, at: Point, zone: Option<ZoneId>) -> &DragState {
        if let Some(press) = &self.press {
            self.pointer = Some(at);
            if press.at.distance(at) < self.activation_distance {
                return &self.state;
            }
            if let Some(press) = self.press.take() {
                tracing::debug!(program = %press.id, origin = %press.origin, "drag started");
                self.state = DragState::Dragging {
                    id: press.id,
                    origin: press.origin,
                };
            }
        }

        let next = match std::mem::take(&mut self.state) {
            DragState::Idle => DragState::Idle,
            DragState::Dragging { id, origin } | DragState::Hovering { id, origin, .. } => {
                self.pointer = Some(at);
                match zone {
                    Some(zone) => DragState::Hovering { id, origin, zone },
                    None => DragState::Dragging { id, origin },
                }
            }
        };
        self.state = next;
        &self.state
    }

    /// Pointer released
    pub fn release(&mut self) -> GestureEnd {
        self.pointer = None;

        if let Some(press) = self.press.take() {
            return GestureEnd::Click(press.id);
        }

        match std::mem::take(&mut self.state) {
            DragState::Idle => GestureEnd::Ignored,
            DragState::Dragging { id, .. } => {
                tracing::debug!(program = %id, "drag released outside zones");
                GestureEnd::Cancelled
            }
            DragState::Hovering { id, origin, zone } => GestureEnd::Drop(DropResolved {
                id,
                origin,
                zone: Some(zone),
            }),
        }
    }

    /// Escape or interrupted gesture; never produces a drop
    ///
    /// Returns `true` if a press or drag was cleared.
    pub fn cancel(&mut self) -> bool {
        let had_gesture = self.press.take().is_some() || self.state.is_active();
        self.state = DragState::Idle;
        self.pointer = None;
        had_gesture
    }
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new(8.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed() -> DragSession {
        let mut session = DragSession::new(8.0);
        assert!(session.press("p1".into(), Membership::Saved, Point::new(0.0, 0.0)));
        session
    }

    #[test]
    fn short_press_is_click() {
        let mut session = pressed();
        session.pointer_move(Point::new(3.0, 3.0), Some(ZoneId::Target));

        assert_eq!(session.state(), &DragState::Idle);
        assert_eq!(session.release(), GestureEnd::Click("p1".into()));
        assert!(!session.is_pressed());
    }

    #[test]
    fn activation_over_zone_goes_straight_to_hovering() {
        let mut session = pressed();
        let state = session.pointer_move(Point::new(20.0, 0.0), Some(ZoneId::Target));

        assert_eq!(state.hover_zone(), Some(ZoneId::Target));
        assert_eq!(state.dragged_id().map(ProgramId::as_str), Some("p1"));
    }

    #[test]
    fn leaving_zones_returns_to_dragging() {
        let mut session = pressed();
        session.pointer_move(Point::new(20.0, 0.0), Some(ZoneId::Saved));
        session.pointer_move(Point::new(40.0, 0.0), Some(ZoneId::Target));
        let state = session.pointer_move(Point::new(60.0, 0.0), None);

        assert!(matches!(state, DragState::Dragging { .. }));
        assert_eq!(state.hover_zone(), None);
    }

    #[test]
    fn release_while_hovering_drops() {
        let mut session = pressed();
        session.pointer_move(Point::new(20.0, 0.0), Some(ZoneId::Target));

        let end = session.release();
        assert_eq!(
            end,
            GestureEnd::Drop(DropResolved {
                id: "p1".into(),
                origin: Membership::Saved,
                zone: Some(ZoneId::Target),
            })
        );
        assert_eq!(session.state(), &DragState::Idle);
    }

    #[test]
    fn release_outside_zones_cancels() {
        let mut session = pressed();
        session.pointer_move(Point::new(20.0, 0.0), None);

        assert_eq!(session.release(), GestureEnd::Cancelled);
        assert!(!session.state().is_active());
    }

    #[test]
    fn cancel_clears_without_drop() {
        let mut session = pressed();
        session.pointer_move(Point::new(20.0, 0.0), Some(ZoneId::Target));

        assert!(session.cancel());
        assert_eq!(session.release(), GestureEnd::Ignored);
        assert!(!session.cancel());
    }

    #[test]
    fn second_press_ignored_while_dragging() {
        let mut session = pressed();
        session.pointer_move(Point::new(20.0, 0.0), None);

        assert!(!session.press("p2".into(), Membership::Saved, Point::new(0.0, 0.0)));
        assert_eq!(session.state().dragged_id().map(ProgramId::as_str), Some("p1"));
    }

    #[test]
    fn session_is_reentrant() {
        let mut session = pressed();
        session.pointer_move(Point::new(20.0, 0.0), Some(ZoneId::Target));
        session.release();

        assert!(session.press("p2".into(), Membership::Target, Point::new(0.0, 0.0)));
        session.pointer_move(Point::new(0.0, 30.0), Some(ZoneId::Saved));
        assert!(matches!(session.release(), GestureEnd::Drop(_)));
    }

    #[test]
    fn drop_destination_ignores_origin_zone() {
        let same = DropResolved {
            id: "p1".into(),
            origin: Membership::Saved,
            zone: Some(ZoneId::Saved),
        };
        assert_eq!(same.destination(), None);

        let none = DropResolved { zone: None, ..same.clone() };
        assert_eq!(none.destination(), None);

        let across = DropResolved {
            zone: Some(ZoneId::Target),
            ..same
        };
        assert_eq!(across.destination(), Some(Membership::Target));
    }
}
