// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Which chain node is active, driven by taps and by the heading stream.

use crate::chain::{Chain, NodeRef};
use crate::config::{HeadingMode, HudConfig};
use crate::geo;

pub const VIEW_TOLERANCE_DEG: f64 = 20.0;
pub const HEADING_EPSILON_DEG: f64 = 0.5;

/// Holds the focus pointer and the heading calibration.
///
/// Auto-focus only ever moves the pointer between nodes that already exist in
/// the chain it is given; it never touches the chain itself.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusController {
    focus: Option<NodeRef>,
    calibration: Option<f64>,
    last_heading: Option<f64>,
    mode: HeadingMode,
    view_tolerance_deg: f64,
    epsilon_deg: f64,
}

impl Default for FocusController {
    fn default() -> Self {
        Self::new(HeadingMode::Calibrated, VIEW_TOLERANCE_DEG, HEADING_EPSILON_DEG)
    }
}

impl From<&HudConfig> for FocusController {
    fn from(config: &HudConfig) -> Self {
        Self::new(
            config.heading_mode,
            config.view_tolerance_deg,
            config.heading_epsilon_deg,
        )
    }
}

impl FocusController {
    pub fn new(mode: HeadingMode, view_tolerance_deg: f64, epsilon_deg: f64) -> Self {
        Self {
            focus: None,
            calibration: None,
            last_heading: None,
            mode,
            view_tolerance_deg,
            epsilon_deg,
        }
    }

    pub fn focus(&self) -> Option<NodeRef> {
        self.focus
    }

    pub fn mode(&self) -> HeadingMode {
        self.mode
    }

    pub fn calibration(&self) -> Option<f64> {
        self.calibration
    }

    /// Last heading that was actually processed, after calibration.
    pub fn heading(&self) -> Option<f64> {
        self.last_heading
    }

    /// Sets focus unconditionally. The next heading sample is always
    /// evaluated, even if it repeats the last one.
    pub fn set_focus_explicit(&mut self, node: NodeRef) {
        log::debug!("Focus set explicitly — node={}", node);
        self.focus = Some(node);
        self.last_heading = None;
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
        self.last_heading = None;
    }

    /// Records `raw_heading` as the calibration reference unless one is
    /// already held. Returns the reference in effect.
    pub fn calibrate(&mut self, raw_heading: f64) -> f64 {
        *self.calibration.get_or_insert_with(|| {
            log::debug!("Heading calibrated — reference={:.1}", raw_heading);
            raw_heading
        })
    }

    /// Forgets the calibration; the next sample becomes the new reference.
    pub fn reset_calibration(&mut self) {
        self.calibration = None;
        self.last_heading = None;
    }

    /// Maps a raw sample to the heading compared against node bearings.
    pub fn relative_heading(&self, raw_heading: f64) -> f64 {
        match self.mode {
            HeadingMode::Absolute => geo::normalize(raw_heading),
            HeadingMode::Calibrated => {
                let reference = self.calibration.unwrap_or(raw_heading);
                geo::normalize(reference - raw_heading)
            }
        }
    }

    /// Processes one heading sample against the nodes visible from `pivot`.
    ///
    /// Returns the new focus when it changed. Missing or non-finite samples,
    /// and samples within the epsilon of the last processed heading, are dropped.
    pub fn on_heading_sample(
        &mut self,
        raw_heading: Option<f64>,
        chain: &Chain,
        pivot: Option<NodeRef>,
    ) -> Option<NodeRef> {
        let raw = raw_heading.filter(|h| h.is_finite())?;
        if self.mode == HeadingMode::Calibrated {
            self.calibrate(raw);
        }
        let heading = self.relative_heading(raw);

        if let Some(last) = self.last_heading {
            if geo::angular_diff(heading, last).abs() < self.epsilon_deg {
                return None;
            }
        }
        self.last_heading = Some(heading);

        let faced = visible_nodes(chain, pivot).into_iter().find(|&node| {
            Some(node) != self.focus
                && chain.get(node).is_some_and(|n| {
                    geo::angular_diff(heading, n.bearing_deg).abs() < self.view_tolerance_deg
                })
        })?;

        log::debug!("Focus follows heading — heading={:.1} node={}", heading, faced);
        self.focus = Some(faced);
        Some(faced)
    }
}

/// Nodes eligible for heading-driven focus.
///
/// With no pivot this is the primary plus its spokes. With a pivot it is the
/// pivot's children, or the pivot's own tier when its expansion came up empty.
pub fn visible_nodes(chain: &Chain, pivot: Option<NodeRef>) -> Vec<NodeRef> {
    let tiers = chain.tiers();
    let tier_refs = |tier: usize| -> Vec<NodeRef> {
        (0..tiers[tier].nodes.len())
            .map(|index| NodeRef { tier, index })
            .collect()
    };

    match pivot.filter(|p| chain.get(*p).is_some()) {
        Some(p) => {
            let child = p.tier + 1;
            if child < tiers.len() && tiers[child].parent == Some(p.index) {
                tier_refs(child)
            } else {
                tier_refs(p.tier)
            }
        }
        None => (0..tiers.len().min(2)).flat_map(tier_refs).collect(),
    }
}
