// Entrypoint for the CLI application.
// - `leafscan` with no arguments starts the interactive menu.
// - `leafscan <image> [model]` runs a single detection and exits.

use anyhow::Context;
use leafscan_cli::{api::ApiClient, model::ModelName, session::Session, ui};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Configured from `LEAFSCAN_API_URL` and friends, see `config::Config`.
    let api = ApiClient::from_env()?;
    log::info!("using inference service at {}", api.config().base_url);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => ui::main_menu(&api),
        [flag] if flag == "-h" || flag == "--help" => {
            print_usage();
            Ok(())
        }
        [image] => run_once(&api, image, ModelName::default()),
        [image, model] => {
            let model: ModelName = model.parse()?;
            run_once(&api, image, model)
        }
        _ => {
            print_usage();
            anyhow::bail!("too many arguments");
        }
    }
}

fn run_once(api: &ApiClient, image: &str, model: ModelName) -> anyhow::Result<()> {
    let mut session = Session::with_model(model);
    session
        .select_file(image)
        .with_context(|| format!("Failed to open image file {}", image))?;

    ui::detect(api, &mut session)?;
    let mut stdout = std::io::stdout();
    ui::show_outcome(&mut stdout, api, &session)?;

    if let Some(message) = session.error() {
        anyhow::bail!("detection failed: {}", message);
    }
    Ok(())
}

fn print_usage() {
    println!("Usage: leafscan [<image_path> [<model_name>]]");
    println!("Available models: CNN, MobileNetV2, ViT, U-Net");
}
