// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! The "Y" chain: a primary target, two spokes offset from the bearing to it,
//! and successive expansion tiers hanging off whichever node the user picks.

use crate::catalog::Target;
use crate::config::HudConfig;
use crate::geo::{self, GeoPoint};
use crate::rank::{self, RankedTarget};
use crate::HudError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const SPOKE_ANGLE_DEG: f64 = 120.0;
pub const SPOKE_TOLERANCE_DEG: f64 = 25.0;
pub const EXPAND_COUNT: usize = 2;

/// Position of a node inside a [`Chain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    pub tier: usize,
    pub index: usize,
}

impl NodeRef {
    pub const PRIMARY: NodeRef = NodeRef { tier: 0, index: 0 };

    pub fn new(tier: usize, index: usize) -> Self {
        Self { tier, index }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tier, self.index)
    }
}

impl FromStr for NodeRef {
    type Err = String;

    /// Parses `"tier.index"`, e.g. `"1.0"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tier, index) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("expected TIER.INDEX, got '{}'", s))?;
        let tier = tier
            .parse::<usize>()
            .map_err(|e| format!("bad tier in '{}': {}", s, e))?;
        let index = index
            .parse::<usize>()
            .map_err(|e| format!("bad index in '{}': {}", s, e))?;
        Ok(Self { tier, index })
    }
}

/// A materialized chain member, measured from the chain's reference point.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    pub target: Target,
    pub distance_m: f64,
    pub bearing_deg: f64,
}

impl ChainNode {
    fn measure(reference: GeoPoint, target: &Target) -> Self {
        let ranked = RankedTarget::from_reference(reference, target);
        Self {
            target: target.clone(),
            distance_m: ranked.distance_m,
            bearing_deg: ranked.bearing_deg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierOrigin {
    Root,
    Spokes,
    Expansion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub origin: TierOrigin,
    /// Index of the parent node in the previous tier; `None` only for tier 0.
    pub parent: Option<usize>,
    pub nodes: Vec<ChainNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Empty,
    Rooted,
    Spoked,
    /// Holds the number of tiers.
    Expanded(usize),
}

/// Ordered tiers of targets. No target name appears twice across tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    reference: GeoPoint,
    tiers: Vec<Tier>,
}

impl Chain {
    pub fn empty(reference: GeoPoint) -> Self {
        Self {
            reference,
            tiers: Vec::new(),
        }
    }

    pub fn reference(&self) -> GeoPoint {
        self.reference
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn depth(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn primary(&self) -> Option<&ChainNode> {
        self.get(NodeRef::PRIMARY)
    }

    pub fn get(&self, node: NodeRef) -> Option<&ChainNode> {
        self.tiers.get(node.tier)?.nodes.get(node.index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members().any(|n| n.target.name == name)
    }

    pub fn member_names(&self) -> HashSet<&str> {
        self.members().map(|n| n.target.name.as_str()).collect()
    }

    /// All nodes, tier by tier.
    pub fn members(&self) -> impl Iterator<Item = &ChainNode> {
        self.tiers.iter().flat_map(|t| t.nodes.iter())
    }

    /// All node references, tier by tier.
    pub fn node_refs(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.tiers.iter().enumerate().flat_map(|(tier, t)| {
            (0..t.nodes.len()).map(move |index| NodeRef { tier, index })
        })
    }

    pub fn state(&self) -> ChainState {
        match self.tiers.last() {
            None => ChainState::Empty,
            Some(last) if last.origin == TierOrigin::Expansion => {
                ChainState::Expanded(self.tiers.len())
            }
            Some(last) if last.origin == TierOrigin::Spokes => ChainState::Spoked,
            Some(_) => ChainState::Rooted,
        }
    }

    /// Drops every tier after `tier`.
    pub fn truncate_after(&mut self, tier: usize) {
        self.tiers.truncate(tier + 1);
    }

    /// Nodes from the primary down to `node`, inclusive.
    pub fn path_to(&self, node: NodeRef) -> Result<Vec<NodeRef>, HudError> {
        if self.get(node).is_none() {
            return Err(HudError::NodeNotFound(node));
        }
        let mut path = Vec::with_capacity(node.tier + 1);
        let mut index = node.index;
        for tier in (1..=node.tier).rev() {
            path.push(NodeRef { tier, index });
            index = self.tiers[tier].parent.unwrap_or(0);
        }
        path.push(NodeRef { tier: 0, index });
        path.reverse();
        Ok(path)
    }

    fn push_tier(&mut self, origin: TierOrigin, parent: Option<usize>, targets: &[&Target]) {
        let seen = self.member_names();
        let nodes: Vec<ChainNode> = targets
            .iter()
            .filter(|t| !seen.contains(t.name.as_str()))
            .map(|t| ChainNode::measure(self.reference, t))
            .collect();
        debug_assert_eq!(nodes.len(), targets.len(), "chain member repeated");
        self.tiers.push(Tier {
            origin,
            parent,
            nodes,
        });
    }
}

/// Builds and extends chains. Pure with respect to its inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSelector {
    pub spoke_angle_deg: f64,
    pub spoke_tolerance_deg: f64,
    pub expand_count: usize,
}

impl Default for ChainSelector {
    fn default() -> Self {
        Self {
            spoke_angle_deg: SPOKE_ANGLE_DEG,
            spoke_tolerance_deg: SPOKE_TOLERANCE_DEG,
            expand_count: EXPAND_COUNT,
        }
    }
}

impl From<&HudConfig> for ChainSelector {
    fn from(config: &HudConfig) -> Self {
        Self {
            spoke_angle_deg: config.spoke_angle_deg,
            spoke_tolerance_deg: config.spoke_tolerance_deg,
            expand_count: config.expand_count,
        }
    }
}

impl ChainSelector {
    /// Closest candidate to `reference`; equal distances resolve by name.
    pub fn select_primary<'a>(
        &self,
        reference: GeoPoint,
        candidates: &[&'a Target],
    ) -> Result<&'a Target, HudError> {
        candidates
            .iter()
            .map(|&t| RankedTarget::from_reference(reference, t))
            .min_by(rank::by_distance_then_name)
            .map(|r| r.target)
            .ok_or(HudError::EmptyCandidateSet)
    }

    /// The two spoke bearings for a given bearing to the primary.
    pub fn spoke_directions(&self, base_bearing: f64) -> [f64; 2] {
        [
            geo::normalize(base_bearing + self.spoke_angle_deg),
            geo::normalize(base_bearing - self.spoke_angle_deg),
        ]
    }

    /// Closest in-tolerance candidate for each spoke direction. A direction with
    /// no candidate inside the tolerance stays `None`.
    pub fn select_spokes<'a>(
        &self,
        reference: GeoPoint,
        primary: &Target,
        candidates: &[&'a Target],
    ) -> [Option<&'a Target>; 2] {
        let base = geo::bearing(reference, primary.position);
        let ranked = rank::rank_by_distance(
            reference,
            candidates
                .iter()
                .copied()
                .filter(|t| t.name != primary.name),
        );

        let mut slots: [Option<&'a Target>; 2] = [None, None];
        for (slot, direction) in self.spoke_directions(base).into_iter().enumerate() {
            let taken = slots[0].map(|t| t.name.as_str());
            slots[slot] = ranked
                .iter()
                .filter(|r| Some(r.target.name.as_str()) != taken)
                .find(|r| geo::angular_diff(direction, r.bearing_deg).abs() < self.spoke_tolerance_deg)
                .map(|r| r.target);
            log::debug!(
                "Spoke {} — direction={:.1} match={:?}",
                slot,
                direction,
                slots[slot].map(|t| t.name.as_str())
            );
        }
        slots
    }

    /// Up to `k` candidates closest to `pivot` that are not already anywhere in `chain`.
    pub fn expand<'a>(
        &self,
        pivot: &Target,
        chain: &Chain,
        candidates: &[&'a Target],
        k: usize,
    ) -> Vec<&'a Target> {
        let visited = chain.member_names();
        rank::rank_by_distance(
            pivot.position,
            candidates
                .iter()
                .copied()
                .filter(|t| t.name != pivot.name && !visited.contains(t.name.as_str())),
        )
        .into_iter()
        .take(k)
        .map(|r| r.target)
        .collect()
    }

    /// A fresh chain: the primary, then whichever spokes matched.
    pub fn rebuild(&self, reference: GeoPoint, candidates: &[&Target]) -> Result<Chain, HudError> {
        let primary = self.select_primary(reference, candidates)?;
        let spokes: Vec<&Target> = self
            .select_spokes(reference, primary, candidates)
            .into_iter()
            .flatten()
            .collect();

        let mut chain = Chain::empty(reference);
        chain.push_tier(TierOrigin::Root, None, &[primary]);
        if !spokes.is_empty() {
            chain.push_tier(TierOrigin::Spokes, Some(0), &spokes);
        }
        log::info!(
            "Chain rebuilt — primary={} spokes={} candidates={}",
            primary.name,
            spokes.len(),
            candidates.len()
        );
        Ok(chain)
    }

    /// Truncates `chain` after `pivot`'s tier, then appends the expansion of
    /// `pivot` as the next tier. Returns how many nodes were appended; nothing
    /// is appended when no unvisited candidate remains.
    pub fn extend(
        &self,
        chain: &mut Chain,
        pivot: NodeRef,
        candidates: &[&Target],
    ) -> Result<usize, HudError> {
        let pivot_target = chain
            .get(pivot)
            .map(|n| n.target.clone())
            .ok_or(HudError::NodeNotFound(pivot))?;
        chain.truncate_after(pivot.tier);

        let children = self.expand(&pivot_target, chain, candidates, self.expand_count);
        if children.is_empty() {
            log::debug!("Expansion exhausted — pivot={}", pivot_target.name);
            return Ok(0);
        }
        chain.push_tier(TierOrigin::Expansion, Some(pivot.index), &children);
        log::debug!(
            "Chain extended — pivot={} tier={} children={}",
            pivot_target.name,
            chain.depth() - 1,
            children.len()
        );
        Ok(children.len())
    }
}
