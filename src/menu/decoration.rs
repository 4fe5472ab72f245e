//! Fill and row-gradient placement for empty slots.

use crate::menu::ROW_SIZE;
use crate::visual::PaneColor;

/// Inclusive run of the standard palette between two colours.
///
/// Reversed endpoints are swapped, so the run always reads in palette order.
pub fn gradient_palette(start: PaneColor, end: PaneColor) -> Vec<PaneColor> {
    let (mut from, mut to) = (start.index(), end.index());
    if from > to {
        std::mem::swap(&mut from, &mut to);
    }
    PaneColor::ALL[from..=to].to_vec()
}

/// Palette position for the `rank`-th row (0-based) among `rows_with_gaps`
/// rows that need filling.
pub fn gradient_index(rank: usize, rows_with_gaps: usize, palette_len: usize) -> usize {
    if palette_len == 0 || rows_with_gaps <= 1 {
        return 0;
    }
    let index = rank * (palette_len - 1) / (rows_with_gaps - 1);
    index.min(palette_len - 1)
}

/// Empty slots of the first `area` cells, grouped by row top to bottom.
pub fn empty_slots_by_row(area: usize, occupied: impl Fn(usize) -> bool) -> Vec<Vec<usize>> {
    let rows = area / ROW_SIZE;
    let mut by_row = vec![Vec::new(); rows];
    for slot in 0..rows * ROW_SIZE {
        if !occupied(slot) {
            by_row[slot / ROW_SIZE].push(slot);
        }
    }
    by_row
}

/// Colour assignment for every empty slot: rows with at least one gap are
/// ranked top to bottom and interpolated across `palette`.
pub fn row_gradient(empty_by_row: &[Vec<usize>], palette: &[PaneColor]) -> Vec<(usize, PaneColor)> {
    if palette.is_empty() {
        return Vec::new();
    }
    let rows_with_gaps: Vec<&Vec<usize>> = empty_by_row.iter().filter(|r| !r.is_empty()).collect();
    let total = rows_with_gaps.len();

    rows_with_gaps
        .into_iter()
        .enumerate()
        .flat_map(|(rank, slots)| {
            let color = palette[gradient_index(rank, total, palette.len())];
            slots.iter().map(move |slot| (*slot, color))
        })
        .collect()
}
