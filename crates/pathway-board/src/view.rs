//! Render model produced by the board

use crate::guard::ConfirmationRequest;
use crate::zones::{Point, ZoneId};
use pathway_record::{ProgramId, ProgramRecord};

/// One card in a zone
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    /// Record shown
    pub record: ProgramRecord,
    /// A store call for this record is in flight
    pub pending: bool,
}

/// One drop zone
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneView {
    /// Zone identity
    pub zone: ZoneId,
    /// Cards in display order, dragged record omitted
    pub cards: Vec<CardView>,
    /// Collection has no records at all (before narrowing)
    pub is_empty: bool,
    /// Pointer is hovering here with a dragged record
    pub highlighted: bool,
}

impl ZoneView {
    /// Ids in display order
    #[must_use]
    pub fn ids(&self) -> Vec<&ProgramId> {
        self.cards.iter().map(|c| &c.record.id).collect()
    }

    /// Check if a record is listed
    #[must_use]
    pub fn contains(&self, id: &ProgramId) -> bool {
        self.cards.iter().any(|c| &c.record.id == id)
    }
}

/// Floating preview of the dragged record
#[derive(Debug, Clone, PartialEq)]
pub struct DragPreview {
    /// Record being dragged
    pub record: ProgramRecord,
    /// Pointer position
    pub at: Option<Point>,
}

/// Board header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardHeader {
    /// Greeting line
    pub greeting: String,
    /// Saved count
    pub saved_count: usize,
    /// Target count
    pub target_count: usize,
}

impl BoardHeader {
    pub(crate) fn new(display_name: Option<String>, saved_count: usize, target_count: usize) -> Self {
        let greeting = match display_name {
            Some(name) => format!("{name}'s programs"),
            None => "Your programs".to_string(),
        };
        Self {
            greeting,
            saved_count,
            target_count,
        }
    }
}

/// Everything the layout needs to draw the board
#[derive(Debug, Clone, PartialEq)]
pub struct BoardView {
    /// Header line
    pub header: BoardHeader,
    /// Saved zone, narrowed
    pub saved: ZoneView,
    /// Target zone, urgency ordered
    pub target: ZoneView,
    /// Floating drag preview
    pub preview: Option<DragPreview>,
    /// Open confirmation dialog
    pub dialog: Option<ConfirmationRequest>,
}

impl BoardView {
    /// Zone by id
    #[must_use]
    pub fn zone(&self, zone: ZoneId) -> &ZoneView {
        match zone {
            ZoneId::Saved => &self.saved,
            ZoneId::Target => &self.target,
        }
    }

    /// Render as plain text, one card per line
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} ({} saved, {} target)\n",
            self.header.greeting, self.header.saved_count, self.header.target_count
        ));

        for zone in [&self.target, &self.saved] {
            out.push_str(&format!("\n[{}]\n", zone.zone));
            if zone.is_empty {
                out.push_str("  (empty) browse programs to add some\n");
                continue;
            }
            for card in &zone.cards {
                let data = &card.record.reference;
                let deadline = data
                    .deadline
                    .map_or_else(|| "no deadline".to_string(), |d| d.to_string());
                out.push_str(&format!(
                    "  {:<28} {:<28} {:>3}%  {}{}\n",
                    data.name,
                    data.school,
                    data.progress,
                    deadline,
                    if card.pending { "  (saving...)" } else { "" }
                ));
            }
        }

        if let Some(dialog) = &self.dialog {
            out.push_str(&format!(
                "\n>> {} [{}]\n   {}\n",
                dialog.kind.title(),
                dialog.record.reference.name,
                dialog.kind.prompt()
            ));
        }
        out
    }
}
