//! Interactive refinement of a picked point against an error curve.

use super::curve::{argmin, ErrorCurve};

/// Moves `cursor` to the lowest score within `distance` frames of it.
///
/// The window is `[cursor - distance, cursor + distance]`, clipped to the
/// curve. When the minimum sits on the window's left edge there is no local
/// minimum nearby, and the cursor is returned unchanged. An empty curve or a
/// cursor entirely past its end also leaves the cursor unchanged.
pub fn snap_to_local_minimum(curve: &ErrorCurve, cursor: usize, distance: usize) -> usize {
    let Some(last) = curve.len().checked_sub(1) else {
        return cursor;
    };
    let left = cursor.saturating_sub(distance);
    let right = cursor.saturating_add(distance).min(last);
    if left > right {
        return cursor;
    }

    match argmin(&curve.scores()[left..=right]) {
        Some(0) | None => cursor,
        Some(i) => left + i,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(scores: &[f32]) -> ErrorCurve {
        ErrorCurve::from_scores(scores.to_vec())
    }

    #[test]
    fn test_snaps_to_nearby_minimum() {
        let c = curve(&[5.0, 4.0, 3.0, 1.0, 2.0, 6.0, 7.0, 8.0]);
        assert_eq!(snap_to_local_minimum(&c, 5, 3), 3);
        assert_eq!(snap_to_local_minimum(&c, 4, 2), 3);
        // Window [3, 5] starts on the minimum, so it is not taken.
        assert_eq!(snap_to_local_minimum(&c, 4, 1), 4);
    }

    #[test]
    fn test_flat_curve_keeps_cursor() {
        let c = curve(&[0.5; 20]);
        assert_eq!(snap_to_local_minimum(&c, 10, 4), 10);
    }

    #[test]
    fn test_left_edge_minimum_keeps_cursor() {
        // Falling towards the left: the true minimum lies outside the window.
        let c = curve(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(snap_to_local_minimum(&c, 6, 2), 6);
    }

    #[test]
    fn test_right_end_is_inclusive() {
        let c = curve(&[3.0, 2.0, 2.5, 2.8, 0.1]);
        assert_eq!(snap_to_local_minimum(&c, 2, 2), 4);
    }

    #[test]
    fn test_clipped_at_curve_end() {
        let c = curve(&[3.0, 2.0, 1.0, 0.5]);
        assert_eq!(snap_to_local_minimum(&c, 2, 10), 3);
    }

    #[test]
    fn test_degenerate_inputs_keep_cursor() {
        assert_eq!(snap_to_local_minimum(&curve(&[]), 7, 3), 7);
        assert_eq!(snap_to_local_minimum(&curve(&[1.0, 0.0]), 100, 3), 100);
    }
}
