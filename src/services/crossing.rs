use crate::models::Direction;

/// Decides whether the move from `previous` to `current` crossed `target`
/// in the watched direction.
///
/// Touching the target counts as crossing it. Without a previous observation
/// nothing fires: the first tick of a watch only seeds its baseline, so a
/// watch created after the market already passed its target stays quiet until
/// the price actually moves across the line.
pub fn decide(direction: Direction, target: f64, previous: Option<f64>, current: f64) -> bool {
    let Some(prev) = previous else {
        return false;
    };

    let crossed_up = prev < target && current >= target;
    let crossed_down = prev > target && current <= target;

    match direction {
        Direction::Above => crossed_up,
        Direction::Below => crossed_down,
        Direction::Cross => crossed_up || crossed_down,
    }
}
