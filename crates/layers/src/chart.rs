use scene::profile::{MeasurementSeries, Profile, Variable};

pub const DEPTH_AXIS_TITLE: &str = "Depth (m)";
pub const SELECT_HINT: &str = "Select a point on the map to preview a profile.";
pub const LOADING_HINT: &str = "Loading measurements…";
pub const NO_DATA_HINT: &str = "No measurement data available for this profile.";
pub const DEMO_HINT: &str =
    "No measurements available for this profile. Showing a sample for demonstration.";

// Typical tropical temperature/salinity structure, used only for the demo chart.
const DEMO_DEPTH: [f64; 6] = [0.0, 50.0, 100.0, 200.0, 500.0, 1000.0];
const DEMO_TEMPERATURE: [f64; 6] = [28.0, 27.0, 25.0, 20.0, 10.0, 5.0];
const DEMO_SALINITY: [f64; 6] = [35.0, 35.1, 35.2, 35.3, 35.0, 34.8];

/// What the detail view knows about the selected profile's series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesState<'a> {
    /// Fetch outstanding.
    Pending,
    /// Fetch failed or the backend has no series.
    Absent,
    Ready(&'a MeasurementSeries),
}

/// Plot-ready depth profile: values on x, depth on an inverted y axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartInput {
    pub variable: Variable,
    pub x_title: &'static str,
    pub y_title: &'static str,
    /// `(value, depth)` pairs in ascending depth.
    pub points: Vec<(f64, f64)>,
    /// Depth grows downward.
    pub depth_reversed: bool,
    /// The points are the demonstration sample, not real data.
    pub demo: bool,
}

impl ChartInput {
    pub fn from_series(series: &MeasurementSeries, variable: Variable) -> Self {
        let points = series
            .samples()
            .iter()
            .map(|s| (s.value(variable), s.depth))
            .collect();
        Self::new(variable, points, false)
    }

    pub fn demo(variable: Variable) -> Self {
        let values = match variable {
            Variable::Temperature => DEMO_TEMPERATURE,
            Variable::Salinity => DEMO_SALINITY,
        };
        let points = values.into_iter().zip(DEMO_DEPTH).collect();
        Self::new(variable, points, true)
    }

    fn new(variable: Variable, points: Vec<(f64, f64)>, demo: bool) -> Self {
        Self {
            variable,
            x_title: variable.axis_title(),
            y_title: DEPTH_AXIS_TITLE,
            points,
            depth_reversed: true,
            demo,
        }
    }
}

/// Everything the "profile preview" panel renders.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailPanel {
    /// Nothing selected.
    Placeholder { hint: &'static str },
    Loading { chip: String, hint: &'static str },
    /// Series absent; rendered as a fallback, not as an error.
    NoData { chip: String, hint: &'static str },
    Chart { chip: String, note: Option<&'static str>, chart: ChartInput },
}

impl DetailPanel {
    pub fn chip(&self) -> Option<&str> {
        match self {
            DetailPanel::Placeholder { .. } => None,
            DetailPanel::Loading { chip, .. }
            | DetailPanel::NoData { chip, .. }
            | DetailPanel::Chart { chip, .. } => Some(chip),
        }
    }
}

/// Chip text identifying a profile, e.g. `2902746 • Cycle 12`.
pub fn profile_chip(profile: &Profile) -> String {
    format!("{} • Cycle {}", profile.platform_number, profile.cycle_number)
}

pub fn detail_panel(
    selected: Option<&Profile>,
    series: SeriesState<'_>,
    variable: Variable,
) -> DetailPanel {
    let Some(profile) = selected else {
        return DetailPanel::Placeholder { hint: SELECT_HINT };
    };
    let chip = profile_chip(profile);

    match series {
        SeriesState::Pending => DetailPanel::Loading {
            chip,
            hint: LOADING_HINT,
        },
        SeriesState::Absent => DetailPanel::NoData {
            chip,
            hint: NO_DATA_HINT,
        },
        SeriesState::Ready(s) if s.is_empty() => DetailPanel::Chart {
            chip,
            note: Some(DEMO_HINT),
            chart: ChartInput::demo(variable),
        },
        SeriesState::Ready(s) => DetailPanel::Chart {
            chip,
            note: None,
            chart: ChartInput::from_series(s, variable),
        },
    }
}
