//! Beading strategies (§4.D variable-width path): given a local thickness
//! and a chosen bead count, decide how many walls to draw and how wide
//! each one should be so the sum exactly fills the thickness.
//!
//! `Distributed`/`InwardDistributed`/`Naive`/`CenterDeviation` are siblings
//! sharing the same `optimal_width`/`minimum_width` shape.

/// One bead (wall line) in a beading solution: its width and its offset
/// from the region's outer edge, both in micrometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bead {
    /// Line width, micrometers.
    pub width_um: i64,
    /// Offset of this bead's centerline from the outer edge, micrometers.
    pub offset_from_outer_um: i64,
}

/// A full beading solution for one local thickness.
#[derive(Debug, Clone, Default)]
pub struct BeadingResult {
    /// Beads ordered from outermost to innermost.
    pub beads: Vec<Bead>,
    /// Thickness left over after placing the beads (becomes infill or a
    /// perimeter gap depending on its size, see `crate::skin`).
    pub left_over_um: i64,
}

/// Parameters shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct BeadingParams {
    /// The target ("optimal") wall line width.
    pub optimal_width_um: i64,
    /// The narrowest a wall line is allowed to get before it's merged
    /// away or widened.
    pub minimum_width_um: i64,
}

/// Which strategy to use, selected by the `wall_distribution` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeadingStrategyKind {
    /// Bead widths deviate from the optimum symmetrically from the center
    /// inward, keeping the outermost (visible) wall closest to nominal.
    CenterDeviation,
    /// Any thickness deficit/surplus is spread evenly across all beads.
    Distributed,
    /// Like `Distributed`, but deviation is pushed toward the innermost
    /// beads so the outer wall stays at the optimal width.
    InwardDistributed,
    /// Fixed bead count and width regardless of local thickness; any
    /// remainder becomes `left_over_um`. Matches constant-width classical
    /// inset behavior (§4.D "Constant-width path").
    Naive,
}

/// A variable-width beading strategy.
pub trait BeadingStrategy {
    /// Compute bead widths filling `thickness_um` with `bead_count` beads.
    fn compute(&self, thickness_um: i64, bead_count: usize) -> BeadingResult;

    /// The optimal thickness for exactly `bead_count` beads at nominal
    /// width, i.e. `compute`'s target when there's no deficit to absorb.
    fn optimal_thickness(&self, bead_count: usize) -> i64;

    /// The thickness at which the strategy prefers `lower_bead_count`
    /// beads over `lower_bead_count + 1`.
    fn transition_thickness(&self, lower_bead_count: usize) -> i64;

    /// The bead count this strategy would pick for a given thickness.
    fn optimal_bead_count(&self, thickness_um: i64) -> usize;
}

fn distribute_evenly(thickness_um: i64, bead_count: usize, params: BeadingParams) -> BeadingResult {
    if bead_count == 0 {
        return BeadingResult {
            beads: vec![],
            left_over_um: thickness_um,
        };
    }
    let even_width = thickness_um / bead_count as i64;
    let remainder = thickness_um - even_width * bead_count as i64;
    let width = even_width.max(params.minimum_width_um.min(even_width.max(1)));
    let mut beads = Vec::with_capacity(bead_count);
    let mut offset = 0;
    for i in 0..bead_count {
        let w = if i == bead_count - 1 { width + remainder } else { width };
        beads.push(Bead {
            width_um: w,
            offset_from_outer_um: offset + w / 2,
        });
        offset += w;
    }
    BeadingResult { beads, left_over_um: 0 }
}

/// §4.D: spread deficit/surplus evenly across every bead.
pub struct Distributed {
    pub params: BeadingParams,
}

impl BeadingStrategy for Distributed {
    fn compute(&self, thickness_um: i64, bead_count: usize) -> BeadingResult {
        distribute_evenly(thickness_um, bead_count, self.params)
    }

    fn optimal_thickness(&self, bead_count: usize) -> i64 {
        bead_count as i64 * self.params.optimal_width_um
    }

    fn transition_thickness(&self, lower_bead_count: usize) -> i64 {
        lower_bead_count as i64 * self.params.optimal_width_um + self.params.minimum_width_um
    }

    fn optimal_bead_count(&self, thickness_um: i64) -> usize {
        naive_bead_count(thickness_um, self.params)
    }
}

/// §4.D: deviation pushed to the innermost beads, outer wall stays
/// nominal width.
pub struct InwardDistributed {
    pub params: BeadingParams,
}

impl BeadingStrategy for InwardDistributed {
    fn compute(&self, thickness_um: i64, bead_count: usize) -> BeadingResult {
        if bead_count == 0 {
            return BeadingResult {
                beads: vec![],
                left_over_um: thickness_um,
            };
        }
        let optimal = self.params.optimal_width_um;
        let outer_beads = bead_count.saturating_sub(1);
        let outer_total = outer_beads as i64 * optimal;
        let remaining = thickness_um - outer_total;
        let mut beads = Vec::with_capacity(bead_count);
        let mut offset = 0;
        for _ in 0..outer_beads {
            beads.push(Bead {
                width_um: optimal,
                offset_from_outer_um: offset + optimal / 2,
            });
            offset += optimal;
        }
        let inner_width = remaining.max(self.params.minimum_width_um.min(remaining.max(1)));
        beads.push(Bead {
            width_um: inner_width,
            offset_from_outer_um: offset + inner_width / 2,
        });
        BeadingResult { beads, left_over_um: 0 }
    }

    fn optimal_thickness(&self, bead_count: usize) -> i64 {
        bead_count as i64 * self.params.optimal_width_um
    }

    fn transition_thickness(&self, lower_bead_count: usize) -> i64 {
        lower_bead_count as i64 * self.params.optimal_width_um + self.params.minimum_width_um
    }

    fn optimal_bead_count(&self, thickness_um: i64) -> usize {
        naive_bead_count(thickness_um, self.params)
    }
}

/// §4.D: fixed width, no adaptation; the constant-width classical path
/// expressed as a strategy so `walls::mod` can dispatch uniformly.
pub struct Naive {
    pub params: BeadingParams,
}

impl BeadingStrategy for Naive {
    fn compute(&self, thickness_um: i64, bead_count: usize) -> BeadingResult {
        let mut beads = Vec::with_capacity(bead_count);
        let mut offset = 0;
        for _ in 0..bead_count {
            beads.push(Bead {
                width_um: self.params.optimal_width_um,
                offset_from_outer_um: offset + self.params.optimal_width_um / 2,
            });
            offset += self.params.optimal_width_um;
        }
        BeadingResult {
            beads,
            left_over_um: (thickness_um - offset).max(0),
        }
    }

    fn optimal_thickness(&self, bead_count: usize) -> i64 {
        bead_count as i64 * self.params.optimal_width_um
    }

    fn transition_thickness(&self, lower_bead_count: usize) -> i64 {
        lower_bead_count as i64 * self.params.optimal_width_um + self.params.minimum_width_um
    }

    fn optimal_bead_count(&self, thickness_um: i64) -> usize {
        naive_bead_count(thickness_um, self.params)
    }
}

/// §4.D: every bead stays pinned at the optimal width; any thickness the
/// optimal widths don't cover is absorbed by the single center bead (odd
/// bead count) or left as `left_over_um` (even bead count), so the
/// outermost wall never deviates from nominal.
pub struct CenterDeviation {
    pub params: BeadingParams,
}

impl BeadingStrategy for CenterDeviation {
    fn compute(&self, thickness_um: i64, bead_count: usize) -> BeadingResult {
        if bead_count == 0 {
            return BeadingResult {
                beads: vec![],
                left_over_um: thickness_um,
            };
        }
        let optimal = self.params.optimal_width_um;
        let mut beads = vec![
            Bead {
                width_um: 0,
                offset_from_outer_um: 0,
            };
            bead_count
        ];
        let mut left_over_um = 0;

        for bead_idx in 0..bead_count / 2 {
            beads[bead_idx] = Bead {
                width_um: optimal,
                offset_from_outer_um: optimal * (bead_idx as i64 * 2 + 1) / 2,
            };
        }

        if bead_count % 2 == 1 {
            let center = bead_count / 2;
            beads[center] = Bead {
                width_um: thickness_um - (bead_count - 1) as i64 * optimal,
                offset_from_outer_um: thickness_um / 2,
            };
        } else {
            left_over_um = thickness_um - bead_count as i64 * optimal;
        }

        for bead_idx in (bead_count + 1) / 2..bead_count {
            beads[bead_idx] = Bead {
                width_um: optimal,
                offset_from_outer_um: thickness_um - (bead_count - bead_idx) as i64 * optimal + optimal / 2,
            };
        }

        BeadingResult { beads, left_over_um }
    }

    fn optimal_thickness(&self, bead_count: usize) -> i64 {
        bead_count as i64 * self.params.optimal_width_um
    }

    fn transition_thickness(&self, lower_bead_count: usize) -> i64 {
        lower_bead_count as i64 * self.params.optimal_width_um + self.params.minimum_width_um
    }

    fn optimal_bead_count(&self, thickness_um: i64) -> usize {
        naive_bead_count(thickness_um, self.params)
    }
}

fn naive_bead_count(thickness_um: i64, params: BeadingParams) -> usize {
    if thickness_um <= 0 || params.optimal_width_um <= 0 {
        return 0;
    }
    let naive_count = thickness_um / params.optimal_width_um;
    let remainder = thickness_um - naive_count * params.optimal_width_um;
    if remainder > params.minimum_width_um {
        (naive_count + 1).max(0) as usize
    } else {
        naive_count.max(0) as usize
    }
}

/// Build a strategy trait object for the requested kind.
pub fn build_strategy(kind: BeadingStrategyKind, params: BeadingParams) -> Box<dyn BeadingStrategy> {
    match kind {
        BeadingStrategyKind::CenterDeviation => Box::new(CenterDeviation { params }),
        BeadingStrategyKind::Distributed => Box::new(Distributed { params }),
        BeadingStrategyKind::InwardDistributed => Box::new(InwardDistributed { params }),
        BeadingStrategyKind::Naive => Box::new(Naive { params }),
    }
}

/// Decorator (§4.D decorators): shift the outermost bead's toolpath
/// location inward by a configured offset, leaving every bead's width
/// (and the wrapped strategy's bead count) untouched. Only applies once
/// at least three beads actually carry width — on a thin wall, nudging
/// the outer wall risks colliding with the next one in.
pub struct OuterWallInset<'a> {
    pub inner: &'a dyn BeadingStrategy,
    pub outer_wall_offset_um: i64,
}

impl<'a> OuterWallInset<'a> {
    pub fn compute(&self, thickness_um: i64, bead_count: usize) -> BeadingResult {
        let mut result = self.inner.compute(thickness_um, bead_count);
        let live_beads = result.beads.iter().filter(|b| b.width_um > 0).count();
        if live_beads < 3 {
            return result;
        }
        if let Some(outer) = result.beads.first_mut() {
            outer.offset_from_outer_um += self.outer_wall_offset_um;
        }
        result
    }
}

/// Decorator: drop any bead narrower than `minimum_width_um`, merging its
/// width into its neighbor so total thickness is preserved.
pub struct LimitedBeading<'a> {
    pub inner: &'a dyn BeadingStrategy,
    pub minimum_width_um: i64,
}

impl<'a> LimitedBeading<'a> {
    pub fn compute(&self, thickness_um: i64, bead_count: usize) -> BeadingResult {
        let mut result = self.inner.compute(thickness_um, bead_count);
        let mut merged: Vec<Bead> = Vec::with_capacity(result.beads.len());
        for bead in result.beads.drain(..) {
            if bead.width_um < self.minimum_width_um {
                if let Some(prev) = merged.last_mut() {
                    prev.width_um += bead.width_um;
                    continue;
                }
            }
            merged.push(bead);
        }
        result.beads = merged;
        result
    }
}

/// Decorator: when the wrapped strategy returns beads narrower than
/// `minimum_width_um`, widen them to the minimum instead of merging,
/// borrowing the deficit from `left_over_um`. Used for very thin walls
/// where a merge would visibly change wall count.
pub struct WideningBeading<'a> {
    pub inner: &'a dyn BeadingStrategy,
    pub minimum_width_um: i64,
}

impl<'a> WideningBeading<'a> {
    pub fn compute(&self, thickness_um: i64, bead_count: usize) -> BeadingResult {
        let mut result = self.inner.compute(thickness_um, bead_count);
        for bead in &mut result.beads {
            if bead.width_um < self.minimum_width_um {
                let deficit = self.minimum_width_um - bead.width_um;
                bead.width_um = self.minimum_width_um;
                result.left_over_um -= deficit;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BeadingParams {
        BeadingParams {
            optimal_width_um: 400,
            minimum_width_um: 170,
        }
    }

    #[test]
    fn center_deviation_fills_thickness_exactly() {
        let strategy = CenterDeviation { params: params() };
        let result = strategy.compute(1_700, 4);
        let sum: i64 = result.beads.iter().map(|b| b.width_um).sum();
        assert!((sum - 1_700).abs() <= result.left_over_um.abs() + 1);
    }

    #[test]
    fn naive_bead_count_matches_original_formula() {
        let p = params();
        // thickness of exactly 2 optimal widths -> 2 beads, no remainder bump.
        assert_eq!(naive_bead_count(800, p), 2);
        // thickness leaves a remainder bigger than minimum width -> rounds up.
        assert_eq!(naive_bead_count(800 + 200, p), 3);
    }

    #[test]
    fn distributed_spreads_remainder_into_last_bead() {
        let strategy = Distributed { params: params() };
        let result = strategy.compute(1_000, 2);
        let sum: i64 = result.beads.iter().map(|b| b.width_um).sum();
        assert_eq!(sum, 1_000);
    }

    #[test]
    fn outer_wall_inset_shifts_outer_bead_location_when_three_or_more_walls() {
        let inner = Naive { params: params() };
        let decorated = OuterWallInset {
            inner: &inner,
            outer_wall_offset_um: 100,
        };
        let baseline = inner.compute(1_700, 4);
        let result = decorated.compute(1_700, 4);
        assert_eq!(result.beads[0].width_um, baseline.beads[0].width_um);
        assert_eq!(result.beads[0].offset_from_outer_um, baseline.beads[0].offset_from_outer_um + 100);
        for (shifted, base) in result.beads[1..].iter().zip(baseline.beads[1..].iter()) {
            assert_eq!(shifted.offset_from_outer_um, base.offset_from_outer_um);
        }
    }

    #[test]
    fn outer_wall_inset_is_a_no_op_below_three_live_beads() {
        let inner = Naive { params: params() };
        let decorated = OuterWallInset {
            inner: &inner,
            outer_wall_offset_um: 100,
        };
        let baseline = inner.compute(800, 2);
        let result = decorated.compute(800, 2);
        assert_eq!(result.beads, baseline.beads);
    }

    #[test]
    fn center_deviation_matches_scenario_with_two_beads() {
        let p = BeadingParams {
            optimal_width_um: 400,
            minimum_width_um: 170,
        };
        let strategy = CenterDeviation { params: p };
        let eps = 20;
        let thickness = (p.optimal_width_um * 3) / 2 + eps;
        let result = strategy.compute(thickness, 2);
        assert_eq!(result.beads[0].width_um, p.optimal_width_um);
        assert_eq!(result.beads[1].width_um, p.optimal_width_um);
        assert_eq!(result.left_over_um, thickness - 2 * p.optimal_width_um);
    }
}
