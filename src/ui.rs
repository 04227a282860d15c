// UI layer: interactive menu using `dialoguer`. Each entry maps onto one
// session operation; results and errors are printed by `render`.

use crate::api::ApiClient;
use crate::model::ModelName;
use crate::render::{self, ResultView};
use crate::session::{Outcome, Session};
use anyhow::{Context, Result};
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Main interactive menu. Runs a select loop until the user chooses "Exit".
///
/// Note: `Select::interact()` is keyboard-driven: use arrow keys and Enter.
pub fn main_menu(api: &ApiClient) -> Result<()> {
    let mut session = Session::new();
    loop {
        let mut stdout = io::stdout();
        writeln!(stdout)?;
        render::print_status(&mut stdout, &session)?;

        let items = [
            "Choose leaf image",
            "Select model",
            "Detect disease",
            "Check server health",
            "List server models",
            "Exit",
        ];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => {
                if let Some(path) = pick_image()? {
                    if let Err(e) = session.select_file(&path) {
                        let message = format!("Cannot use {}: {}", path.display(), e);
                        render::print_error(&mut stdout, &message)?;
                    }
                }
            }
            1 => {
                let model = pick_model(session.model())?;
                session.select_model(model);
            }
            2 => {
                detect(api, &mut session)?;
                show_outcome(&mut stdout, api, &session)?;
            }
            3 => match with_spinner("Checking server...", || api.health()) {
                Ok(health) => render::print_health(&mut stdout, &health)?,
                Err(e) => {
                    let message = format!("Health check failed: {}", e);
                    render::print_error(&mut stdout, &message)?
                }
            },
            4 => match with_spinner("Fetching models...", || api.list_models()) {
                Ok(models) => render::print_models(&mut stdout, &models)?,
                Err(e) => {
                    let message = format!("Listing models failed: {}", e);
                    render::print_error(&mut stdout, &message)?
                }
            },
            5 => break,
            _ => {}
        }
    }
    Ok(())
}

/// Run one detection for the current selection with a spinner on screen.
pub fn detect(api: &ApiClient, session: &mut Session) -> Result<()> {
    let Some(pending) = session.begin_submit() else {
        return Ok(());
    };
    let message = format!("Detecting with {}...", pending.model);
    let result = with_spinner(&message, || api.predict(&pending.image, pending.model));
    session.settle(pending.token, result);
    Ok(())
}

/// Print the error panel or the result panel, whichever the session holds.
pub fn show_outcome<W: Write>(out: &mut W, api: &ApiClient, session: &Session) -> Result<()> {
    match session.outcome() {
        Outcome::Failure(message) => render::print_error(out, message)?,
        Outcome::Loading(_) => writeln!(out, "Detecting...")?,
        Outcome::Idle | Outcome::Success(_) => {
            let view = ResultView::from_session(session);
            render::print_view(out, &view, &api.config().output_dir)
                .context("Failed to render result")?;
        }
    }
    Ok(())
}

/// Ask for an image. A native file dialog is tried first; when none is
/// available (or it is cancelled) the path can be typed instead.
fn pick_image() -> Result<Option<PathBuf>> {
    let picked = rfd::FileDialog::new()
        .set_title("Choose a leaf image")
        .add_filter("Images", &IMAGE_EXTENSIONS[..])
        .pick_file();
    if picked.is_some() {
        return Ok(picked);
    }
    let typed: String = Input::new()
        .with_prompt("Image file path (empty to cancel)")
        .allow_empty(true)
        .interact_text()?;
    let typed = typed.trim();
    if typed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(typed)))
    }
}

fn pick_model(current: ModelName) -> Result<ModelName> {
    let labels: Vec<&str> = ModelName::ALL.iter().map(|m| m.label()).collect();
    let default = ModelName::ALL
        .iter()
        .position(|m| *m == current)
        .unwrap_or(0);
    let idx = Select::new()
        .with_prompt("Select AI model")
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(ModelName::ALL[idx])
}

/// Show an `indicatif` spinner while `work` runs.
fn with_spinner<T>(message: &str, work: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = work();
    spinner.finish_and_clear();
    out
}
