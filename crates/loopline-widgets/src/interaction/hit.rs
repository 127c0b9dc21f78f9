//! Hit testing against committed segments

use loopline_core::timeline::time_to_x;
use loopline_core::{LoopSegment, SegmentId};

/// What a pointer position lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Empty,
    Body(SegmentId),
    LeftHandle(SegmentId),
    RightHandle(SegmentId),
}

impl Hit {
    pub fn segment(&self) -> Option<SegmentId> {
        match *self {
            Hit::Empty => None,
            Hit::Body(id) | Hit::LeftHandle(id) | Hit::RightHandle(id) => Some(id),
        }
    }
}

/// Classify `x` on a track of `width` pixels
///
/// Each segment's handles cover at most a third of its width from either
/// edge, so the middle of the body can always be grabbed. Segments narrower
/// than two handles also take edge hits up to `handle_px` outside the body.
/// The nearest qualifying edge wins, then a body containing `x`, else empty
/// track.
pub fn hit_test(x: f64, width: f64, duration: f64, segments: &[LoopSegment], handle_px: f64) -> Hit {
    if width <= 0.0 || duration <= 0.0 {
        return Hit::Empty;
    }

    // (distance, inside, hit); on a tie the segment under the pointer wins
    let mut nearest_edge: Option<(f64, bool, Hit)> = None;
    for segment in segments {
        let start_x = time_to_x(segment.start_time, width, duration);
        let end_x = time_to_x(segment.end_time, width, duration);
        let to_start = (x - start_x).abs();
        let to_end = (x - end_x).abs();
        let inside = x >= start_x && x <= end_x;
        let span = end_x - start_x;
        let reach = if inside {
            handle_px.min(span / 3.0)
        } else if span < 2.0 * handle_px {
            handle_px
        } else {
            continue;
        };

        let (distance, hit) = if to_start <= to_end {
            (to_start, Hit::LeftHandle(segment.id))
        } else {
            (to_end, Hit::RightHandle(segment.id))
        };
        if distance > reach {
            continue;
        }
        let better = match nearest_edge {
            None => true,
            Some((best, best_inside, _)) => distance < best || (distance == best && inside && !best_inside),
        };
        if better {
            nearest_edge = Some((distance, inside, hit));
        }
    }
    if let Some((_, _, hit)) = nearest_edge {
        return hit;
    }

    segments
        .iter()
        .find(|s| {
            x >= time_to_x(s.start_time, width, duration) && x <= time_to_x(s.end_time, width, duration)
        })
        .map_or(Hit::Empty, |s| Hit::Body(s.id))
}
