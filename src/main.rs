use clap::Parser;

/// Refresh AWS session and role credentials, then write them to the shared config and credentials files
#[derive(clap::Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding config.yaml, session.yaml and the generated files; default to ~/.aws
    #[clap(long, env = "AWS_ROLE_CREDS_DIR")]
    configuration_directory: Option<std::path::PathBuf>,

    #[clap(flatten)]
    refresh: aws_role_creds::cmd::refresh::RefreshArgs,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!(message = "Failed to refresh credentials", error = %format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), anyhow::Error> {
    let config = aws_role_creds::config::Config::new(
        cli.configuration_directory,
        cli.refresh.config_data(),
    )?;
    aws_role_creds::cmd::refresh::run(&config)
}
