// Result panel. `ResultView` decides what to show from the session alone;
// the `print_*` functions turn it into coloured terminal output.

use crate::model::{HealthStatus, ModelList, ModelName, Prediction};
use crate::session::Session;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use crossterm::style::Stylize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const EMPTY_PLACEHOLDER: &str = "Results will appear here after detection";

/// Width of the text progress bars, in cells.
const BAR_CELLS: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum ResultView<'a> {
    Empty,
    Segmentation {
        original: Option<&'a Path>,
        /// Decoded PNG bytes; `None` when the service sent something that is
        /// not valid base64.
        mask_png: Option<Vec<u8>>,
        /// Percentage digits as the service sent them.
        percentage: &'a str,
        bar_width: f64,
    },
    Classification {
        label: &'a str,
        confidence: &'a str,
        bar_width: f64,
        advice: Option<&'a str>,
    },
}

impl<'a> ResultView<'a> {
    /// Layout follows the shape of the prediction, not the model picked.
    pub fn from_session(session: &'a Session) -> Self {
        let Some(prediction) = session.result() else {
            return ResultView::Empty;
        };
        match prediction {
            Prediction::Segmentation(seg) => {
                let mask_png = match STANDARD.decode(seg.mask_image.trim()) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        log::warn!("mask image is not valid base64: {}", e);
                        None
                    }
                };
                ResultView::Segmentation {
                    original: session.selected().map(|s| s.path.as_path()),
                    mask_png,
                    percentage: seg.disease_percentage.text(),
                    bar_width: clamp_percent(seg.disease_percentage.percent()),
                }
            }
            Prediction::Classification(class) => ResultView::Classification {
                label: &class.label,
                confidence: class.confidence.text(),
                bar_width: class.confidence.percent().map(clamp_percent).unwrap_or(0.0),
                advice: class.advice(),
            },
        }
    }
}

/// Bar width in percent, kept inside [0, 100].
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Text bar of `cells` characters, filled proportionally to `width`.
pub fn bar(width: f64, cells: usize) -> String {
    let filled = ((clamp_percent(width) / 100.0) * cells as f64).round() as usize;
    let filled = filled.min(cells);
    format!("{}{}", "█".repeat(filled), "░".repeat(cells - filled))
}

/// Where the decoded mask for `original` is written.
pub fn mask_path(output_dir: &Path, original: Option<&Path>) -> PathBuf {
    let stem = original
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("leaf");
    output_dir.join(format!("{}-mask.png", stem))
}

fn save_mask(output_dir: &Path, original: Option<&Path>, png: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = mask_path(output_dir, original);
    fs::write(&path, png)?;
    Ok(path)
}

/// Print the result panel. A segmentation mask is saved under `output_dir`
/// so it can be opened next to the original; failing to save it is reported
/// in the panel and does not stop the rest of the result from printing.
pub fn print_view<W: Write>(
    out: &mut W,
    view: &ResultView<'_>,
    output_dir: &Path,
) -> io::Result<()> {
    match view {
        ResultView::Empty => {
            writeln!(out, "{}", EMPTY_PLACEHOLDER.dark_grey())?;
        }
        ResultView::Segmentation {
            original,
            mask_png,
            percentage,
            bar_width,
        } => {
            writeln!(out, "{}", "Segmentation Analysis".bold())?;
            match original {
                Some(path) => writeln!(out, "  Original image:  {}", path.display())?,
                None => writeln!(out, "  Original image:  (none)")?,
            }
            match mask_png {
                Some(bytes) => match save_mask(output_dir, *original, bytes) {
                    Ok(path) => {
                        let shown = path.display().to_string();
                        writeln!(out, "  Segmented image: {}", shown.green())?;
                    }
                    Err(e) => {
                        log::warn!("could not save mask under {}: {}", output_dir.display(), e);
                        let note = format!("(could not save mask: {})", e);
                        writeln!(out, "  Segmented image: {}", note.red())?;
                    }
                },
                None => {
                    let note = "(could not decode mask)";
                    writeln!(out, "  Segmented image: {}", note.red())?;
                }
            }
            writeln!(
                out,
                "  Diseased area:   {}",
                format!("{}%", percentage).red().bold()
            )?;
            writeln!(out, "  {}", bar(*bar_width, BAR_CELLS).red())?;
        }
        ResultView::Classification {
            label,
            confidence,
            bar_width,
            advice,
        } => {
            writeln!(out, "{}", "Detection Results".bold())?;
            writeln!(out, "  Predicted disease: {}", label.red().bold())?;
            writeln!(out, "  Confidence score:  {}", confidence.green().bold())?;
            writeln!(out, "  {}", bar(*bar_width, BAR_CELLS).green())?;
            if let Some(advice) = advice {
                writeln!(out)?;
                writeln!(out, "{}", "Treatment Advice".blue().bold())?;
                writeln!(out, "  {}", advice)?;
            }
        }
    }
    Ok(())
}

pub fn print_error<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.red())
}

/// Header line describing the current picks.
pub fn print_status<W: Write>(out: &mut W, session: &Session) -> io::Result<()> {
    let image = session
        .selected()
        .map(|s| format!("{} ({} bytes)", s.preview.file_name, s.preview.size_bytes))
        .unwrap_or_else(|| "none".to_string());
    writeln!(out, "Image: {}   Model: {}", image, session.model().label())
}

pub fn print_health<W: Write>(out: &mut W, health: &HealthStatus) -> io::Result<()> {
    if health.is_healthy() {
        writeln!(out, "{}", "Backend is healthy".green())?;
    } else {
        writeln!(out, "{}", format!("Backend status: {}", health.status).yellow())?;
    }
    writeln!(out, "Models loaded:")?;
    for (model, loaded) in &health.models_loaded {
        let mark = if *loaded { "✓".green() } else { "✗".red() };
        writeln!(out, "  {} {}", mark, model)?;
    }
    Ok(())
}

pub fn print_models<W: Write>(out: &mut W, models: &ModelList) -> io::Result<()> {
    writeln!(out, "Available models:")?;
    for name in &models.available_models {
        match name.parse::<ModelName>() {
            Ok(model) => {
                let status = if models.is_loaded(model) {
                    "loaded".green()
                } else {
                    "not loaded".red()
                };
                writeln!(out, "  {} - {}", model.label(), status)?;
            }
            Err(_) => {
                let status = models
                    .model_status
                    .get(name)
                    .map(String::as_str)
                    .unwrap_or("unknown");
                writeln!(out, "  {} - {} (not selectable here)", name, status)?;
            }
        }
    }
    Ok(())
}
