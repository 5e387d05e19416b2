//! Overlap detection for design surfaces.
//!
//! These helpers work on authored boxes only; they never see data. A design
//! surface uses them to nudge a dropped element clear of its neighbours, or
//! to restack a whole layout without overlaps.

use serde::Serialize;

use super::{group_rows, LayoutConfig};
use crate::model::Element;

/// Vertical step used when searching for a free position.
const NUDGE_STEP: f64 = 10.0;
/// Give up after this many steps.
const NUDGE_ATTEMPTS: usize = 100;

/// An axis-aligned box in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn of(element: &Element) -> Self {
        Self {
            x: element.x,
            y: element.y,
            width: element.width,
            height: element.height,
        }
    }

    /// True when the interiors intersect. Shared edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x + self.width <= other.x
            || self.x >= other.x + other.width
            || self.y + self.height <= other.y
            || self.y >= other.y + other.height)
    }
}

/// A new position for an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

pub fn elements_overlap(a: &Element, b: &Element) -> bool {
    Rect::of(a).overlaps(&Rect::of(b))
}

/// Pairs of element ids whose authored boxes overlap, in template order.
pub fn overlapping_pairs(elements: &[Element]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (i, a) in elements.iter().enumerate() {
        for b in &elements[i + 1..] {
            if elements_overlap(a, b) {
                pairs.push((a.id.clone(), b.id.clone()));
            }
        }
    }
    pairs
}

/// Find the nearest free spot for `target` by pushing it down the page.
///
/// `others` may contain the target itself; it is skipped by id. Returns the
/// original position when it is already free, or when no free position
/// inside the page is found within the step budget.
pub fn find_non_overlapping_position(target: &Element, others: &[Element], page_height: f64) -> (f64, f64) {
    let obstacles: Vec<Rect> = others
        .iter()
        .filter(|other| other.id != target.id)
        .map(Rect::of)
        .collect();

    let original = Rect::of(target);
    if !obstacles.iter().any(|o| original.overlaps(o)) {
        return (target.x, target.y);
    }

    let mut candidate = original;
    for _ in 0..NUDGE_ATTEMPTS {
        let free = !obstacles.iter().any(|o| candidate.overlaps(o));
        if free && candidate.y + candidate.height <= page_height {
            return (candidate.x, candidate.y);
        }
        candidate.y += NUDGE_STEP;
    }

    (target.x, target.y)
}

/// Restack a layout so that no two rows overlap, using authored heights.
///
/// Elements of the first row keep their own Y; every later row is placed
/// one gap below the tallest element of the row above.
pub fn adjust_to_prevent_overlap(elements: &[Element], config: &LayoutConfig) -> Vec<Position> {
    let rows = group_rows(elements, config.row_tolerance);
    let mut positions = Vec::with_capacity(elements.len());
    let mut cursor = 0.0;

    for (row_idx, row) in rows.iter().enumerate() {
        let row_height = row
            .iter()
            .map(|&i| elements[i].height)
            .fold(f64::NEG_INFINITY, f64::max);

        for &i in row {
            let element = &elements[i];
            positions.push(Position {
                id: element.id.clone(),
                x: element.x,
                y: if row_idx == 0 { element.y } else { cursor },
            });
        }

        cursor = if row_idx == 0 {
            elements[row[0]].y + row_height + config.row_gap
        } else {
            cursor + row_height + config.row_gap
        };
    }

    positions
}
