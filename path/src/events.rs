use crate::math::Point;

/// Events the path iterator yields, one per path command.
///
/// Each subpath starts with a `Begin` event and finishes with an `End`
/// event carrying the `close` flag; the segment events in between carry
/// their `from` point so that consumers do not need to track it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathEvent {
    Begin {
        at: Point,
    },
    Line {
        from: Point,
        to: Point,
    },
    Quadratic {
        from: Point,
        ctrl: Point,
        to: Point,
    },
    Conic {
        from: Point,
        ctrl: Point,
        to: Point,
        weight: f32,
    },
    Cubic {
        from: Point,
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
    },
    End {
        last: Point,
        first: Point,
        close: bool,
    },
}
