//! Picks the best polish, or the set of equally good polishes, of one query.
//!
//! Polishes are ranked on percent identity, number of matches and number of
//! exons. When the polish with the best identity and the polish with the most
//! matches agree, that one wins, possibly traded for one with clearly more exons.
//! When they disagree, the two best distinct identities are compared through
//! `alpha`, the matches gained per unit of identity lost.

use crate::libs::polish::Polish;
use std::fmt;

/// Exon count slack
pub const EPS_X: u32 = 1;
/// Match count slack for ESTs
pub const EPS_N_ESTS: u32 = 10;
/// Match count slack for mRNAs
pub const EPS_N_MRNA: u32 = 15;
/// Percent identity slack
pub const EPS_I: u32 = 3;

/// Below this `alpha` the shorter, higher identity polish is kept
pub const ALPHA_THRESHOLD: f64 = 0.8;

/// Tolerances of the heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tolerance {
    pub eps_n: u32,
    pub eps_x: u32,
    pub eps_i: u32,
}

impl Tolerance {
    pub fn ests() -> Self {
        Self {
            eps_n: EPS_N_ESTS,
            eps_x: EPS_X,
            eps_i: EPS_I,
        }
    }

    pub fn mrna() -> Self {
        Self {
            eps_n: EPS_N_MRNA,
            ..Self::ests()
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::ests()
    }
}

/// Which rule decided the winners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    ClearWinner,
    ExonClearWinner,
    Unsure,
    ExonUnsure,
    LowAlpha,
    ExonPlusAlpha,
    PctidPlusAlpha,
    HighAlpha,
    ExonHighAlpha,
}

impl Branch {
    /// 1 to 9
    pub fn tag(&self) -> u8 {
        match self {
            Branch::ClearWinner => 1,
            Branch::ExonClearWinner => 2,
            Branch::Unsure => 3,
            Branch::ExonUnsure => 4,
            Branch::LowAlpha => 5,
            Branch::ExonPlusAlpha => 6,
            Branch::PctidPlusAlpha => 7,
            Branch::HighAlpha => 8,
            Branch::ExonHighAlpha => 9,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Branch::ClearWinner => "Clear Winner",
            Branch::ExonClearWinner => "Exon Clear Winner",
            Branch::Unsure => "?",
            Branch::ExonUnsure => "Exon ?",
            Branch::LowAlpha => "alpha < 0.8",
            Branch::ExonPlusAlpha => "Exon Plus alpha > 0.8",
            Branch::PctidPlusAlpha => "Pctid Plus alpha > 0.8",
            Branch::HighAlpha => "alpha > 0.8",
            Branch::ExonHighAlpha => "Exon alpha > 0.8",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.tag(), self.label())
    }
}

/// The winning (identity, matches, exons) triple of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub identity: u32,
    pub matches: u32,
    pub exons: usize,
    /// `None` for a group of one polish
    pub branch: Option<Branch>,
}

impl Selection {
    pub fn is_winner(&self, polish: &Polish) -> bool {
        polish.score_key() == (self.identity, self.matches, self.exons)
    }

    /// Winners in input order
    pub fn winners<'a>(&'a self, polishes: &'a [Polish]) -> impl Iterator<Item = &'a Polish> + 'a {
        polishes.iter().filter(move |p| self.is_winner(p))
    }
}

/// An (identity, matches) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Score {
    identity: u32,
    matches: u32,
}

/// Best identity (ties: most matches) and most matches (ties: best identity).
fn best_pairs(polishes: &[Polish]) -> (Score, Score) {
    let mut by_ident = Score::default();
    let mut by_match = Score::default();

    for p in polishes {
        if (p.identity, p.matches) > (by_ident.identity, by_ident.matches) {
            by_ident = Score {
                identity: p.identity,
                matches: p.matches,
            };
        }
        if (p.matches, p.identity) > (by_match.matches, by_match.identity) {
            by_match = Score {
                identity: p.identity,
                matches: p.matches,
            };
        }
    }

    (by_ident, by_match)
}

/// The two highest distinct identities, each with its largest number of
/// matches. The second is zero when only one identity is present.
fn top_two_identities(polishes: &[Polish]) -> (Score, Score) {
    let mut first = Score::default();
    let mut second = Score::default();

    for p in polishes {
        if p.identity > first.identity {
            second = first;
            first = Score {
                identity: p.identity,
                matches: p.matches,
            };
        } else if p.identity == first.identity {
            first.matches = first.matches.max(p.matches);
        } else if (p.identity, p.matches) > (second.identity, second.matches) {
            second = Score {
                identity: p.identity,
                matches: p.matches,
            };
        }
    }

    (first, second)
}

/// Most exons among polishes with exactly `identity` and at least `matches`
fn max_exons(polishes: &[Polish], identity: u32, matches: u32) -> usize {
    polishes
        .iter()
        .filter(|p| p.identity == identity && p.matches >= matches)
        .map(|p| p.num_exons())
        .max()
        .unwrap_or(0)
}

/// Most exons among polishes with exactly `identity` and `matches`
fn max_exons_exact(polishes: &[Polish], identity: u32, matches: u32) -> usize {
    polishes
        .iter()
        .filter(|p| p.identity == identity && p.matches == matches)
        .map(|p| p.num_exons())
        .max()
        .unwrap_or(0)
}

/// Starting from the polishes at `identity` with at least `matches`, look for
/// one with more than `eps_x` extra exons, giving up to `eps_n` matches.
///
/// Returns the refined (matches, exons). Every qualifying polish is compared
/// against the current best in input order, so a later one can override an
/// earlier one.
pub fn exon_refine(polishes: &[Polish], identity: u32, matches: u32, tol: &Tolerance) -> (u32, usize) {
    let mut best_exons = max_exons(polishes, identity, matches);
    let mut best_matches = matches;

    let floor = matches as i64 - tol.eps_n as i64;
    for p in polishes {
        if p.identity == identity
            && p.matches as i64 >= floor
            && p.num_exons() > best_exons + tol.eps_x as usize
        {
            best_matches = p.matches;
            best_exons = p.num_exons();
        }
    }

    (best_matches, best_exons)
}

/// Matches gained per unit of identity lost when going from `high` to `low`,
/// scaled by 1/100.
pub fn alpha(high: (u32, u32), low: (u32, u32)) -> f64 {
    let (identity_i, matches_i) = high;
    let (identity_m, matches_m) = low;

    let gain = matches_m as f64 - matches_i as f64;
    let slope = matches_m as f64 / identity_m as f64 - matches_i as f64 / identity_i as f64;

    (gain / slope) / 100.0
}

/// Pick the winning triple of `polishes`, or `None` when empty.
pub fn pick_best(polishes: &[Polish], tol: &Tolerance) -> Option<Selection> {
    match polishes {
        [] => None,
        [only] => Some(Selection {
            identity: only.identity,
            matches: only.matches,
            exons: only.num_exons(),
            branch: None,
        }),
        _ => Some(pick_best_of_many(polishes, tol)),
    }
}

fn pick_best_of_many(polishes: &[Polish], tol: &Tolerance) -> Selection {
    let (by_ident, by_match) = best_pairs(polishes);

    // Best identity also has the most matches
    if by_ident == by_match {
        let (matches, exons) = exon_refine(polishes, by_ident.identity, by_ident.matches, tol);
        let branch = if matches == by_ident.matches {
            Branch::ClearWinner
        } else {
            Branch::ExonClearWinner
        };

        return Selection {
            identity: by_ident.identity,
            matches,
            exons,
            branch: Some(branch),
        };
    }

    let (high, low) = top_two_identities(polishes);

    if high.matches >= low.matches {
        let (matches, exons) = exon_refine(polishes, high.identity, high.matches, tol);
        let branch = if matches == high.matches {
            Branch::Unsure
        } else {
            Branch::ExonUnsure
        };

        return Selection {
            identity: high.identity,
            matches,
            exons,
            branch: Some(branch),
        };
    }

    let a = alpha(
        (high.identity, high.matches),
        (low.identity, low.matches),
    );

    // Not worth the identity lost
    if a < ALPHA_THRESHOLD {
        return Selection {
            identity: high.identity,
            matches: high.matches,
            exons: max_exons(polishes, high.identity, high.matches),
            branch: Some(Branch::LowAlpha),
        };
    }

    let exons_high = max_exons_exact(polishes, high.identity, high.matches);
    let exons_low = max_exons_exact(polishes, low.identity, low.matches);

    let more_exons = exons_high > exons_low + tol.eps_x as usize;
    if more_exons || high.identity > low.identity + tol.eps_i {
        let branch = if more_exons {
            Branch::ExonPlusAlpha
        } else {
            Branch::PctidPlusAlpha
        };

        return Selection {
            identity: high.identity,
            matches: high.matches,
            exons: exons_high,
            branch: Some(branch),
        };
    }

    let (matches, exons) = exon_refine(polishes, low.identity, low.matches, tol);
    let branch = if exons == exons_low {
        Branch::HighAlpha
    } else {
        Branch::ExonHighAlpha
    };

    Selection {
        identity: low.identity,
        matches,
        exons,
        branch: Some(branch),
    }
}
