//! Multi-touch attribution: splits one conversion's credit across the
//! channels on its path.

use std::collections::BTreeMap;

use campaign_core::types::{AttributionModel, Touchpoint};

/// Channel name → fractional credit. Credits sum to 1 for a non-empty path.
pub type ChannelCredits = BTreeMap<String, f64>;

const POSITION_ENDPOINT_SHARE: f64 = 0.4;
const POSITION_MIDDLE_SHARE: f64 = 0.2;

/// Distribute one conversion across `touchpoints` under `model`.
///
/// Touchpoints must already be in ascending time order; position in the
/// slice is the only ordering used. Repeated channels accumulate. An empty
/// path yields an empty map for every model.
pub fn attribute(touchpoints: &[Touchpoint], model: AttributionModel) -> ChannelCredits {
    let mut credits = ChannelCredits::new();
    let (first, last) = match (touchpoints.first(), touchpoints.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return credits,
    };
    let n = touchpoints.len();

    match model {
        AttributionModel::FirstTouch => add(&mut credits, first, 1.0),
        AttributionModel::LastTouch => add(&mut credits, last, 1.0),
        AttributionModel::Linear => {
            let share = 1.0 / n as f64;
            for tp in touchpoints {
                add(&mut credits, tp, share);
            }
        }
        AttributionModel::TimeDecay => {
            // Most recent touch weighs 1, each step back halves.
            let weights: Vec<f64> = (0..n)
                .map(|i| 2f64.powi(i as i32 - (n as i32 - 1)))
                .collect();
            let total: f64 = weights.iter().sum();
            for (tp, weight) in touchpoints.iter().zip(&weights) {
                add(&mut credits, tp, weight / total);
            }
        }
        AttributionModel::PositionBased => match n {
            1 => add(&mut credits, first, 1.0),
            2 => {
                add(&mut credits, first, 0.5);
                add(&mut credits, last, 0.5);
            }
            _ => {
                add(&mut credits, first, POSITION_ENDPOINT_SHARE);
                add(&mut credits, last, POSITION_ENDPOINT_SHARE);
                let middle = &touchpoints[1..n - 1];
                let share = POSITION_MIDDLE_SHARE / middle.len() as f64;
                for tp in middle {
                    add(&mut credits, tp, share);
                }
            }
        },
    }
    credits
}

fn add(credits: &mut ChannelCredits, touchpoint: &Touchpoint, share: f64) {
    *credits.entry(touchpoint.channel.clone()).or_insert(0.0) += share;
}
