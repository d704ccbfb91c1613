use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use lambdeploy_config::DeployConfig;
use lambdeploy_core::{DeployOptions, Deployer};
use lambdeploy_shell::{AwsLambdaCli, AwsS3Cli, GitIdentity, NpmZipPackager};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

mod init;
mod report;

/// Deploy AWS Lambda functions described by a JSON spec file
#[derive(Parser)]
#[command(name = "lambdeploy")]
#[command(version)]
#[command(
    about = "Deploy AWS Lambda functions described by a JSON spec file",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Package, upload and create a function that has never been deployed
    Create {
        #[command(flatten)]
        deploy: DeployArgs,

        /// Point this stage alias at the created version
        #[arg(short, long, value_name = "NAME")]
        stage: Option<String>,
    },
    /// Package, upload and push new code and configuration to an existing function
    Update {
        #[command(flatten)]
        deploy: DeployArgs,
    },
    /// Point a stage alias at a version (defaults to the latest published one)
    SetStage {
        /// Path to the function spec file
        spec: PathBuf,

        /// Stage alias name
        stage: String,

        /// Version to point the stage at
        version: Option<String>,

        #[command(flatten)]
        aws: AwsArgs,
    },
}

#[derive(Args)]
struct DeployArgs {
    /// Path to the function spec file
    spec: PathBuf,

    /// Deploy an archive that is already in the bucket
    #[arg(short = 'n', long)]
    skip_upload: bool,

    /// Archive name to build or deploy instead of a timestamped one
    #[arg(long, value_name = "NAME")]
    archive: Option<String>,

    #[command(flatten)]
    aws: AwsArgs,
}

#[derive(Args)]
struct AwsArgs {
    /// AWS profile (overrides config file)
    #[arg(short, long, value_name = "PROFILE")]
    profile: Option<String>,

    /// AWS region (overrides config file)
    #[arg(short, long, value_name = "REGION")]
    region: Option<String>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration (file + environment)
    let mut config =
        DeployConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli);

    // Step 3: Initialize tracing
    init::init_tracing(&config.log, cli.log_level.is_some());

    // Step 4: Wire the shell-backed collaborators
    let workdir = std::env::current_dir().context("Failed to read current directory")?;
    let packager = NpmZipPackager::from_config(&config.package, workdir);
    let store = AwsS3Cli::from_config(&config.aws);
    let functions = AwsLambdaCli::from_config(&config.aws);
    let identity = GitIdentity::from_config(&config.identity);
    let deployer = Deployer::new(&packager, &store, &functions, &identity);

    match cli.command {
        Commands::Create { deploy, stage } => {
            let options = deploy_options(&config, &deploy, stage);
            info!(spec = %deploy.spec.display(), "Creating function");
            let outcome = deployer
                .create(&deploy.spec, &options)
                .with_context(|| format!("create failed for {}", deploy.spec.display()))?;
            report::created(&outcome);
        }
        Commands::Update { deploy } => {
            let options = deploy_options(&config, &deploy, None);
            info!(spec = %deploy.spec.display(), "Updating function");
            let outcome = deployer
                .update(&deploy.spec, &options)
                .with_context(|| format!("update failed for {}", deploy.spec.display()))?;
            report::updated(&outcome);
        }
        Commands::SetStage {
            spec,
            stage,
            version,
            ..
        } => {
            info!(spec = %spec.display(), stage = %stage, "Setting stage");
            let outcome = deployer
                .set_stage(&spec, &stage, version.as_deref())
                .with_context(|| format!("set-stage failed for {}", spec.display()))?;
            report::staged(&outcome);
        }
    }

    Ok(())
}

fn apply_cli_overrides(config: &mut DeployConfig, cli: &Cli) {
    let aws = match &cli.command {
        Commands::Create { deploy, .. } | Commands::Update { deploy } => &deploy.aws,
        Commands::SetStage { aws, .. } => aws,
    };

    if let Some(profile) = &aws.profile {
        config.aws.profile = Some(profile.clone());
    }
    if let Some(region) = &aws.region {
        config.aws.region = Some(region.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
}

fn deploy_options(config: &DeployConfig, args: &DeployArgs, stage: Option<String>) -> DeployOptions {
    DeployOptions {
        skip_upload: args.skip_upload,
        stage,
        profile: config.aws.profile.clone(),
        region: config.aws.region.clone(),
        archive: args.archive.clone(),
    }
}
