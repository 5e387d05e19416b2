//! Row grouping.
//!
//! A row is a run of elements whose authored Y coordinates sit close
//! together. Grouping compares each element with the element before it,
//! not with the first element of the row, so a staircase of elements a few
//! pixels apart chains into a single row.

use crate::model::Element;

/// Indices into the original element slice, grouped into rows top to
/// bottom. Within a row, elements keep their Y-sorted order; equal Y
/// values keep their original relative order.
pub fn group_rows(elements: &[Element], tolerance: f64) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..elements.len()).collect();
    order.sort_by(|&a, &b| elements[a].y.total_cmp(&elements[b].y));

    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut last_y: Option<f64> = None;

    for idx in order {
        let y = elements[idx].y;
        if let Some(prev) = last_y {
            if (y - prev).abs() > tolerance {
                rows.push(std::mem::take(&mut current));
            }
        }
        current.push(idx);
        last_y = Some(y);
    }

    if !current.is_empty() {
        rows.push(current);
    }
    rows
}
