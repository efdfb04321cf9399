use anyhow::Context;
use clap::Parser;
use usage_plotter::utils::logger;
use usage_plotter::EnvironmentDescriptor;

#[derive(Debug, Parser)]
#[command(name = "check-env")]
#[command(about = "Checks that an environment descriptor pins every dependency consistently")]
struct Args {
    /// Environment descriptor to check
    #[arg(default_value = "environment.yml")]
    path: String,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let descriptor = EnvironmentDescriptor::from_file(&args.path)
        .with_context(|| format!("failed to read environment descriptor {}", args.path))?;

    tracing::debug!(
        "{}: {} channels, {} dependencies",
        args.path,
        descriptor.channels.len(),
        descriptor.dependency_count()
    );

    let issues = descriptor.issues();
    if issues.is_empty() {
        println!(
            "✅ {} ({}) is valid",
            args.path,
            descriptor.name.as_deref().unwrap_or_default()
        );
        return Ok(());
    }

    eprintln!("❌ {} has {} issue(s):", args.path, issues.len());
    for issue in &issues {
        eprintln!("  - {}", issue);
    }
    std::process::exit(1);
}
