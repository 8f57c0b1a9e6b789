use facade_modeler_lib::command::execute_json_batch;
use facade_modeler_lib::harness::TestHarness;
use facade_modeler_lib::state::PickSettings;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facade_modeler=info,facade_modeler_lib=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let settings = match arg_value(&args, "--settings") {
        Some(path) => match read_settings(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("{e}");
                std::process::exit(1);
            }
        },
        None => PickSettings::load(),
    };

    if args.iter().any(|a| a == "--save-settings") {
        match settings.save() {
            Ok(path) => tracing::info!("Saved settings to {}", path.display()),
            Err(e) => {
                tracing::error!("{e}");
                std::process::exit(1);
            }
        }
    }

    let mut harness = match arg_value(&args, "--scene") {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => {
                let mut harness = TestHarness::new();
                if let Err(e) = harness.load_scene_json(&json) {
                    tracing::error!("Failed to parse scene JSON from {path}: {e}");
                    std::process::exit(1);
                }
                tracing::info!("Loaded scene from {path} ({} meshes)", harness.mesh_count());
                harness
            }
            Err(e) => {
                tracing::error!("Failed to read scene file {path}: {e}");
                std::process::exit(1);
            }
        },
        None => TestHarness::new(),
    };
    harness.set_settings(settings);

    let Some(script_path) = arg_value(&args, "--script") else {
        if args.iter().any(|a| a == "--save-settings") {
            return;
        }
        tracing::error!(
            "Usage: facade-modeler [--scene <path>] [--settings <path>] [--save-settings] \
             --script <path>"
        );
        std::process::exit(2);
    };

    let script = match std::fs::read_to_string(script_path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to read script {script_path}: {e}");
            std::process::exit(1);
        }
    };

    match execute_json_batch(&mut harness, &script) {
        Ok(responses) => match serde_json::to_string_pretty(&responses) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!("Failed to serialize responses: {e}"),
        },
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn read_settings(path: &str) -> Result<PickSettings, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read settings file {path}: {e}"))?;
    PickSettings::from_json(&json)
}
