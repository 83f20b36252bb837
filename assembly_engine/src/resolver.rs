//! Visibility and highlight resolution for a step cursor.
//!
//! Step index 0 is the overview: every part assigned to at least one step is
//! shown, parts no step references stay hidden. Index `k` in `1..=N` means
//! "after step `k`": cumulative mode shows the union of steps `1..=k`,
//! isolated mode shows step `k` alone. The visibility map always carries an
//! entry for every known part.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DisplaySettings;
use crate::instructions::InstructionStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    #[serde(alias = "all")]
    Cumulative,
    #[serde(alias = "selected")]
    Isolated,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Cumulative => f.write_str("cumulative"),
            DisplayMode::Isolated => f.write_str("isolated"),
        }
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "cumulative" | "all" => Ok(DisplayMode::Cumulative),
            "isolated" | "selected" => Ok(DisplayMode::Isolated),
            other => Err(format!(
                "unknown display mode {other:?} (expected cumulative/all or isolated/selected)"
            )),
        }
    }
}

/// Which step supplies the highlight set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightSource {
    /// The step the cursor currently sits on (none at the overview).
    #[default]
    CurrentStep,
    /// A specific step, e.g. the one being edited.
    Step(u32),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveRequest {
    pub step_index: usize,
    pub mode: DisplayMode,
    pub highlight: HighlightSource,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPolicy {
    pub highlight_enabled: bool,
    pub highlight_color: [f32; 3],
    pub previous_steps_transparency: bool,
    pub previous_steps_opacity: f32,
}

impl From<&DisplaySettings> for DisplayPolicy {
    fn from(settings: &DisplaySettings) -> Self {
        Self {
            highlight_enabled: settings.highlight_enabled,
            highlight_color: settings.highlight_color,
            previous_steps_transparency: settings.previous_steps_transparency,
            previous_steps_opacity: settings.previous_steps_opacity,
        }
    }
}

impl Default for DisplayPolicy {
    fn default() -> Self {
        DisplayPolicy::from(&DisplaySettings::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    pub visible: BTreeMap<String, bool>,
    pub highlighted: BTreeSet<String>,
    /// Tint for `highlighted`; `None` when highlighting is switched off.
    pub tint: Option<[f32; 3]>,
    pub translucent: BTreeSet<String>,
    /// Opacity for `translucent`; `None` when nothing is translucent.
    pub translucent_opacity: Option<f32>,
}

impl Resolution {
    pub fn visible_parts(&self) -> impl Iterator<Item = &str> {
        self.visible
            .iter()
            .filter(|(_, visible)| **visible)
            .map(|(path, _)| path.as_str())
    }

    pub fn visible_count(&self) -> usize {
        self.visible.values().filter(|visible| **visible).count()
    }
}

/// Parts that should be visible for `step_index` in `mode`, before they are
/// intersected with the known parts. Indices past the end are clamped.
pub fn visible_set(
    steps: &[InstructionStep],
    step_index: usize,
    mode: DisplayMode,
) -> BTreeSet<&str> {
    let step_index = step_index.min(steps.len());
    let selected: &[InstructionStep] = if step_index == 0 {
        steps
    } else {
        match mode {
            DisplayMode::Cumulative => &steps[..step_index],
            DisplayMode::Isolated => &steps[step_index - 1..step_index],
        }
    };
    selected.iter().flat_map(InstructionStep::parts).collect()
}

fn highlight_step<'a>(
    steps: &'a [InstructionStep],
    request: &ResolveRequest,
) -> Option<&'a InstructionStep> {
    match request.highlight {
        HighlightSource::CurrentStep => request
            .step_index
            .min(steps.len())
            .checked_sub(1)
            .and_then(|index| steps.get(index)),
        HighlightSource::Step(id) => steps.iter().find(|step| step.id == id),
        HighlightSource::None => None,
    }
}

/// Compute visibility, highlight and translucency for every known part.
pub fn resolve<'a, I>(
    known_parts: I,
    steps: &[InstructionStep],
    request: &ResolveRequest,
    policy: &DisplayPolicy,
) -> Resolution
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = visible_set(steps, request.step_index, request.mode);
    let highlight_parts: BTreeSet<&str> = highlight_step(steps, request)
        .map(|step| step.parts().collect())
        .unwrap_or_default();

    let mut resolution = Resolution {
        tint: policy
            .highlight_enabled
            .then_some(policy.highlight_color),
        ..Resolution::default()
    };
    for path in known_parts {
        resolution
            .visible
            .insert(path.to_string(), wanted.contains(path));
        if highlight_parts.contains(path) {
            resolution.highlighted.insert(path.to_string());
        }
    }

    if policy.previous_steps_transparency && !resolution.highlighted.is_empty() {
        resolution.translucent = resolution
            .visible
            .iter()
            .filter(|(path, visible)| **visible && !resolution.highlighted.contains(*path))
            .map(|(path, _)| path.clone())
            .collect();
        if !resolution.translucent.is_empty() {
            resolution.translucent_opacity = Some(policy.previous_steps_opacity);
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: u32, parts: &[&str]) -> InstructionStep {
        InstructionStep {
            id,
            name: format!("step {id}"),
            description: None,
            parts: parts.iter().map(|part| part.to_string()).collect(),
        }
    }

    fn sample_steps() -> Vec<InstructionStep> {
        vec![step(1, &["A", "B"]), step(2, &["B", "C"])]
    }

    fn visible(resolution: &Resolution) -> Vec<(&str, bool)> {
        resolution
            .visible
            .iter()
            .map(|(path, visible)| (path.as_str(), *visible))
            .collect()
    }

    const KNOWN: [&str; 4] = ["A", "B", "C", "D"];

    #[test]
    fn overview_shows_union_of_assigned_parts_only() {
        let resolution = resolve(
            KNOWN,
            &sample_steps(),
            &ResolveRequest::default(),
            &DisplayPolicy::default(),
        );
        assert_eq!(
            visible(&resolution),
            vec![("A", true), ("B", true), ("C", true), ("D", false)]
        );
        assert!(resolution.highlighted.is_empty());
    }

    #[test]
    fn isolated_mode_shows_single_step() {
        let request = ResolveRequest {
            step_index: 2,
            mode: DisplayMode::Isolated,
            highlight: HighlightSource::CurrentStep,
        };
        let resolution = resolve(
            ["A", "B", "C"],
            &sample_steps(),
            &request,
            &DisplayPolicy::default(),
        );
        assert_eq!(
            visible(&resolution),
            vec![("A", false), ("B", true), ("C", true)]
        );
    }

    #[test]
    fn cumulative_is_superset_of_isolated() {
        let steps = vec![
            step(1, &["A"]),
            step(2, &["B", "C"]),
            step(3, &["D"]),
            step(4, &["A", "D"]),
        ];
        for index in 1..=steps.len() {
            let cumulative = visible_set(&steps, index, DisplayMode::Cumulative);
            let isolated = visible_set(&steps, index, DisplayMode::Isolated);
            assert!(cumulative.is_superset(&isolated), "index {index}");
        }
    }

    #[test]
    fn every_known_part_gets_an_entry() {
        let steps = sample_steps();
        for index in 0..=steps.len() {
            for mode in [DisplayMode::Cumulative, DisplayMode::Isolated] {
                let request = ResolveRequest {
                    step_index: index,
                    mode,
                    highlight: HighlightSource::CurrentStep,
                };
                let resolution = resolve(KNOWN, &steps, &request, &DisplayPolicy::default());
                assert_eq!(resolution.visible.len(), KNOWN.len());
            }
        }
    }

    #[test]
    fn unknown_step_parts_are_ignored() {
        let steps = vec![step(1, &["A", "renamed/part"])];
        let request = ResolveRequest {
            step_index: 1,
            ..ResolveRequest::default()
        };
        let resolution = resolve(["A", "B"], &steps, &request, &DisplayPolicy::default());
        assert_eq!(visible(&resolution), vec![("A", true), ("B", false)]);
        assert_eq!(
            resolution.highlighted.iter().collect::<Vec<_>>(),
            vec!["A"]
        );
    }

    #[test]
    fn previous_steps_become_translucent_when_enabled() {
        let policy = DisplayPolicy {
            highlight_enabled: true,
            highlight_color: [1.0, 0.0, 0.0],
            previous_steps_transparency: true,
            previous_steps_opacity: 0.4,
        };
        let request = ResolveRequest {
            step_index: 2,
            mode: DisplayMode::Cumulative,
            highlight: HighlightSource::CurrentStep,
        };
        let resolution = resolve(KNOWN, &sample_steps(), &request, &policy);
        assert_eq!(
            resolution.highlighted.iter().collect::<Vec<_>>(),
            vec!["B", "C"]
        );
        assert_eq!(resolution.translucent.iter().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(resolution.translucent_opacity, Some(0.4));

        let overview = resolve(KNOWN, &sample_steps(), &ResolveRequest::default(), &policy);
        assert!(overview.translucent.is_empty());
        assert_eq!(overview.translucent_opacity, None);
    }

    #[test]
    fn tint_follows_highlight_settings() {
        let settings = DisplaySettings {
            highlight_color: [0.2, 0.4, 0.6],
            ..DisplaySettings::default()
        };
        let request = ResolveRequest {
            step_index: 1,
            ..ResolveRequest::default()
        };
        let policy = DisplayPolicy::from(&settings);
        let resolution = resolve(KNOWN, &sample_steps(), &request, &policy);
        assert_eq!(resolution.tint, Some([0.2, 0.4, 0.6]));

        let policy = DisplayPolicy {
            highlight_enabled: false,
            ..policy
        };
        let resolution = resolve(KNOWN, &sample_steps(), &request, &policy);
        assert_eq!(resolution.tint, None);
        assert_eq!(resolution.highlighted.len(), 2);
    }

    #[test]
    fn explicit_highlight_step_is_independent_of_mode() {
        let request = ResolveRequest {
            step_index: 1,
            mode: DisplayMode::Isolated,
            highlight: HighlightSource::Step(2),
        };
        let resolution = resolve(KNOWN, &sample_steps(), &request, &DisplayPolicy::default());
        assert_eq!(
            resolution.highlighted.iter().collect::<Vec<_>>(),
            vec!["B", "C"]
        );
    }

    #[test]
    fn out_of_range_index_is_clamped() {
        let request = ResolveRequest {
            step_index: 99,
            mode: DisplayMode::Isolated,
            highlight: HighlightSource::CurrentStep,
        };
        let resolution = resolve(KNOWN, &sample_steps(), &request, &DisplayPolicy::default());
        assert_eq!(
            visible(&resolution),
            vec![("A", false), ("B", true), ("C", true), ("D", false)]
        );
    }

    #[test]
    fn mode_names_parse_from_both_schemes() {
        assert_eq!("all".parse::<DisplayMode>(), Ok(DisplayMode::Cumulative));
        assert_eq!("Selected".parse::<DisplayMode>(), Ok(DisplayMode::Isolated));
        assert!("partial".parse::<DisplayMode>().is_err());
    }
}
