// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Per-pass projections of targets relative to a reference point.
//!
//! Nothing here is cached: the reference moves with the user and with the
//! expansion pivot, so every selection pass ranks afresh.

use crate::catalog::Target;
use crate::geo::{self, GeoPoint};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
pub struct RankedTarget<'a> {
    pub target: &'a Target,
    pub distance_m: f64,
    pub bearing_deg: f64,
}

impl<'a> RankedTarget<'a> {
    pub fn from_reference(reference: GeoPoint, target: &'a Target) -> Self {
        Self {
            target,
            distance_m: geo::distance(reference, target.position),
            bearing_deg: geo::bearing(reference, target.position),
        }
    }
}

/// Ascending distance, then name. The one tie-break every selection uses.
pub fn by_distance_then_name(a: &RankedTarget<'_>, b: &RankedTarget<'_>) -> Ordering {
    a.distance_m
        .total_cmp(&b.distance_m)
        .then_with(|| a.target.name.cmp(&b.target.name))
}

/// Ranks `candidates` by [`by_distance_then_name`] from `reference`.
pub fn rank_by_distance<'a, I>(reference: GeoPoint, candidates: I) -> Vec<RankedTarget<'a>>
where
    I: IntoIterator<Item = &'a Target>,
{
    let mut ranked: Vec<RankedTarget<'a>> = candidates
        .into_iter()
        .map(|t| RankedTarget::from_reference(reference, t))
        .collect();
    ranked.sort_by(by_distance_then_name);
    ranked
}
