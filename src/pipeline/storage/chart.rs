use once_cell::sync::OnceCell;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::ChartConfig;
use crate::constants::{
    AVG_POWER_COLUMN, CHART_TITLE, MAX_POWER_COLUMN, MIN_POWER_COLUMN, POWER_OUTPUT_COLUMN,
    TURBINE_ID_COLUMN,
};
use crate::error::PersistenceError;
use crate::types::SummaryRow;

const FONT_FAMILY: &str = "sans-serif";

/// Three bars plus one empty slot of spacing per turbine.
const SLOTS_PER_TURBINE: usize = 4;

const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Whether a font has been registered for chart text. Set once per process.
static FONT_READY: OnceCell<bool> = OnceCell::new();

/// Renders the per-turbine summary to an image file.
pub trait ChartRenderer {
    fn render(&self, summary: &[SummaryRow], path: &Path) -> Result<(), PersistenceError>;
}

/// Grouped bar chart: one group per turbine with min, max and mean bars.
pub struct BarChartRenderer {
    pub config: ChartConfig,
}

impl BarChartRenderer {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    fn draw(
        &self,
        summary: &[SummaryRow],
        path: &Path,
        with_text: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(path, (self.config.width, self.config.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let slots = (summary.len() * SLOTS_PER_TURBINE).max(1) as i32;
        let (y_low, y_high) = value_range(summary);

        let mut builder = ChartBuilder::on(&root);
        builder.margin(15);
        if with_text {
            builder
                .caption(CHART_TITLE, (FONT_FAMILY, 28))
                .x_label_area_size(50)
                .y_label_area_size(70);
        }
        let mut chart = builder.build_cartesian_2d((0..slots).into_segmented(), y_low..y_high)?;

        if with_text {
            let ids: Vec<&str> = summary.iter().map(|r| r.turbine_id.as_str()).collect();
            let label = |value: &SegmentValue<i32>| match value {
                // The middle bar of each group carries the turbine id.
                SegmentValue::CenterOf(slot) if *slot as usize % SLOTS_PER_TURBINE == 1 => ids
                    .get(*slot as usize / SLOTS_PER_TURBINE)
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            };
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(slots as usize + 1)
                .x_label_formatter(&label)
                .x_desc(TURBINE_ID_COLUMN)
                .y_desc(POWER_OUTPUT_COLUMN)
                .label_style((FONT_FAMILY, 14))
                .draw()?;
        }

        let series: [(&str, RGBColor, fn(&SummaryRow) -> f64); 3] = [
            (MIN_POWER_COLUMN, BLUE, |r| r.min_power),
            (MAX_POWER_COLUMN, RED, |r| r.max_power),
            (AVG_POWER_COLUMN, GREEN, |r| r.avg_power),
        ];

        for (offset, (name, color, value_of)) in series.into_iter().enumerate() {
            let bars = summary.iter().enumerate().map(|(i, row)| {
                let slot = (i * SLOTS_PER_TURBINE + offset) as i32;
                Rectangle::new(
                    [
                        (SegmentValue::Exact(slot), 0.0),
                        (SegmentValue::Exact(slot + 1), value_of(row)),
                    ],
                    color.filled(),
                )
            });
            let anno = chart.draw_series(bars)?;
            if with_text {
                anno.label(name).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
                });
            }
        }

        if with_text {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font((FONT_FAMILY, 14))
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}

impl ChartRenderer for BarChartRenderer {
    fn render(&self, summary: &[SummaryRow], path: &Path) -> Result<(), PersistenceError> {
        let with_text = ensure_font(self.config.font_path.as_deref());
        self.draw(summary, path, with_text)
            .map_err(|e| PersistenceError::Render {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!("Chart rendered to {}", path.display());
        Ok(())
    }
}

/// Y axis bounds covering zero and every bar, with headroom above.
fn value_range(summary: &[SummaryRow]) -> (f64, f64) {
    let low = summary
        .iter()
        .map(|r| r.min_power)
        .fold(0.0_f64, f64::min);
    let high = summary
        .iter()
        .map(|r| r.max_power)
        .fold(0.0_f64, f64::max);

    if high <= low {
        return (low, low + 1.0);
    }
    let pad = (high - low) * 0.1;
    let low = if low < 0.0 { low - pad } else { low };
    (low, high + pad)
}

/// Registers a font for chart text on first use.
///
/// The configured font is tried first, then common system locations. Returns
/// `false` when none loads, in which case charts are drawn without text. The
/// first call decides for the whole process.
fn ensure_font(configured: Option<&Path>) -> bool {
    *FONT_READY.get_or_init(|| {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(FALLBACK_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
                Ok(()) => {
                    debug!("Chart font loaded from {}", path.display());
                    return true;
                }
                Err(_) => warn!("{} is not a usable font", path.display()),
            }
        }

        warn!("No chart font found; rendering bars without titles or labels");
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(id: &str, min: f64, max: f64, avg: f64) -> SummaryRow {
        SummaryRow {
            turbine_id: id.to_string(),
            min_power: min,
            max_power: max,
            avg_power: avg,
        }
    }

    #[test]
    fn test_value_range_includes_zero_and_headroom() {
        let (low, high) = value_range(&[row("T1", 100.0, 200.0, 150.0)]);
        assert_eq!(low, 0.0);
        assert!(high > 200.0);

        let (low, high) = value_range(&[row("T1", -50.0, 50.0, 0.0)]);
        assert!(low < -50.0);
        assert!(high > 50.0);

        assert_eq!(value_range(&[]), (0.0, 1.0));
    }

    #[test]
    fn test_renders_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary_statistics.png");
        let renderer = BarChartRenderer::new(ChartConfig {
            width: 320,
            height: 200,
            font_path: None,
        });

        renderer
            .render(
                &[row("T1", 100.0, 200.0, 150.0), row("T2", 150.0, 160.0, 155.0)],
                &path,
            )
            .unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_unwritable_target_is_a_render_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("chart.png");
        let renderer = BarChartRenderer::new(ChartConfig::default());

        let err = renderer.render(&[row("T1", 1.0, 2.0, 1.5)], &path).unwrap_err();
        assert!(matches!(err, PersistenceError::Render { .. }));
    }
}
