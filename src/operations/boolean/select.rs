use super::classify::PointClassification;
use super::split::SolidSource;

/// The boolean operations the validator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    /// `A - B`: the volume of A not inside B.
    Difference,
    /// `A & B`: the volume inside both.
    Intersection,
}

/// Decision about whether to keep a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepDecision {
    Keep,
    KeepFlipped,
    Discard,
}

/// Determines whether a fragment should be kept based on its classification
/// relative to the other solid and the boolean operation.
///
/// | Fragment | vs Other Solid   | Difference (A-B) | Intersection |
/// |----------|------------------|------------------|--------------|
/// | from A   | OUTSIDE B        | keep             | discard      |
/// | from A   | INSIDE B         | discard          | keep         |
/// | from A   | ON B, same       | discard          | keep         |
/// | from A   | ON B, opposite   | keep             | discard      |
/// | from B   | OUTSIDE A        | discard          | discard      |
/// | from B   | INSIDE A         | keep (flip)      | keep         |
/// | from B   | ON A             | discard          | discard      |
///
/// Shared faces are always taken from A so that they appear once.
#[allow(clippy::match_same_arms)]
#[must_use]
pub fn should_keep_fragment(
    source: SolidSource,
    classification: PointClassification,
    op: BooleanOp,
) -> KeepDecision {
    use BooleanOp::{Difference, Intersection};
    use PointClassification::{Inside, OnOppositeSense, OnSameSense, Outside};

    match (source, classification, op) {
        // Fragment from A, classified vs B
        (SolidSource::A, Outside, Difference) => KeepDecision::Keep,
        (SolidSource::A, Outside, Intersection) => KeepDecision::Discard,

        (SolidSource::A, Inside, Difference) => KeepDecision::Discard,
        (SolidSource::A, Inside, Intersection) => KeepDecision::Keep,

        (SolidSource::A, OnSameSense, Difference) => KeepDecision::Discard,
        (SolidSource::A, OnSameSense, Intersection) => KeepDecision::Keep,

        (SolidSource::A, OnOppositeSense, Difference) => KeepDecision::Keep,
        (SolidSource::A, OnOppositeSense, Intersection) => KeepDecision::Discard,

        // Fragment from B, classified vs A
        (SolidSource::B, Outside, _) => KeepDecision::Discard,

        (SolidSource::B, Inside, Difference) => KeepDecision::KeepFlipped,
        (SolidSource::B, Inside, Intersection) => KeepDecision::Keep,

        (SolidSource::B, OnSameSense | OnOppositeSense, _) => KeepDecision::Discard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_keeps_a_outside_discards_b_outside() {
        assert_eq!(
            should_keep_fragment(
                SolidSource::A,
                PointClassification::Outside,
                BooleanOp::Difference
            ),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_fragment(
                SolidSource::B,
                PointClassification::Outside,
                BooleanOp::Difference
            ),
            KeepDecision::Discard
        );
    }

    #[test]
    fn difference_flips_b_inside() {
        assert_eq!(
            should_keep_fragment(
                SolidSource::B,
                PointClassification::Inside,
                BooleanOp::Difference
            ),
            KeepDecision::KeepFlipped
        );
    }

    #[test]
    fn intersection_keeps_inside_fragments() {
        for source in [SolidSource::A, SolidSource::B] {
            assert_eq!(
                should_keep_fragment(source, PointClassification::Inside, BooleanOp::Intersection),
                KeepDecision::Keep
            );
        }
    }

    #[test]
    fn shared_faces_come_from_a_only() {
        assert_eq!(
            should_keep_fragment(
                SolidSource::A,
                PointClassification::OnSameSense,
                BooleanOp::Intersection
            ),
            KeepDecision::Keep
        );
        for op in [BooleanOp::Difference, BooleanOp::Intersection] {
            for class in [PointClassification::OnSameSense, PointClassification::OnOppositeSense] {
                assert_eq!(should_keep_fragment(SolidSource::B, class, op), KeepDecision::Discard);
            }
        }
    }

    #[test]
    fn touching_faces_survive_difference_only() {
        assert_eq!(
            should_keep_fragment(
                SolidSource::A,
                PointClassification::OnOppositeSense,
                BooleanOp::Difference
            ),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_fragment(
                SolidSource::A,
                PointClassification::OnOppositeSense,
                BooleanOp::Intersection
            ),
            KeepDecision::Discard
        );
    }
}
