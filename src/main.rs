use clap::Parser;
use usage_plotter::core::ConfigProvider;
use usage_plotter::utils::error::PlotterError;
use usage_plotter::utils::progress::CliProgress;
use usage_plotter::utils::{logger, validation::Validate};
use usage_plotter::{
    CliConfig, LocalLogSource, LocalStorage, ReportEngine, ReportPipeline, TomlConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting usage-plotter");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let outcome = match &cli.config {
        Some(path) => match load_toml_config(path, &cli) {
            Ok(config) => {
                let monitor = config.monitoring_enabled();
                run(config, monitor).await
            }
            Err(e) => Err(e),
        },
        None => {
            let monitor = cli.monitor;
            run(cli, monitor).await
        }
    };

    match outcome {
        Ok(output_path) => {
            tracing::info!("✅ Usage reports generated successfully!");
            println!("✅ Usage reports generated successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Report generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn load_toml_config(path: &str, cli: &CliConfig) -> Result<TomlConfig, PlotterError> {
    tracing::info!("Loading configuration from {}", path);
    let mut config = TomlConfig::from_file(path)?;
    config.apply_cli_overrides(cli);
    Ok(config)
}

async fn run<C>(config: C, monitor: bool) -> Result<String, PlotterError>
where
    C: ConfigProvider + Validate + 'static,
{
    config.validate()?;

    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let source = LocalLogSource::new(config.logs_path());
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline =
        ReportPipeline::new(source, storage, config).with_progress(Box::new(CliProgress::new()));

    ReportEngine::new_with_monitoring(pipeline, monitor)
        .run()
        .await
}
