use crate::models::{PatternLabel, PriceSeries};

/// Classify a short closing-price sequence into one of the four shape
/// labels the stats tables are keyed on.
///
/// Two points compare directly, three points compare the two consecutive
/// changes, four or more compare first-half trend against second-half
/// trend (floor midpoint, middle element in the second half). A non-rise
/// counts as a fall; there is no flat category, so equal prices classify
/// as falling. Never fails: short input maps to `InsufficientData`.
pub fn classify(prices: &PriceSeries) -> PatternLabel {
    match prices.len() {
        0 | 1 => PatternLabel::InsufficientData,
        2 => {
            let rising = prices.get(1).unwrap() > prices.get(0).unwrap();
            if rising {
                PatternLabel::ContinuousRise
            } else {
                PatternLabel::ContinuousFall
            }
        }
        3 => {
            let first = prices.get(1).unwrap() > prices.get(0).unwrap();
            let second = prices.get(2).unwrap() > prices.get(1).unwrap();
            label_from_trends(first, second)
        }
        _ => {
            let (first_half, second_half) = prices.halves();
            let first = first_half[first_half.len() - 1] > first_half[0];
            let second = second_half[second_half.len() - 1] > second_half[0];
            label_from_trends(first, second)
        }
    }
}

fn label_from_trends(first_up: bool, second_up: bool) -> PatternLabel {
    match (first_up, second_up) {
        (true, true) => PatternLabel::ContinuousRise,
        (false, false) => PatternLabel::ContinuousFall,
        (true, false) => PatternLabel::RiseThenFall,
        (false, true) => PatternLabel::FallThenRise,
    }
}
