/// Timbre - audio metadata, loudness analysis and encoding
use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use timbre_core::{AudioItem, CapabilityRegistry, MetadataRecord, ProviderKind, SettingValue, SettingsMap};
use timbre_pipeline::{
    destination_for, open_item, save_metadata, AnalysisOrchestrator, EncodingOrchestrator,
    HostConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "timbre")]
#[command(about = "Audio metadata, ReplayGain analysis and encoding", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = timbre_pipeline::config::CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure peak and gain, then save them to each file's tags
    Analyze {
        /// Analyze the files together as one album
        #[arg(long)]
        album: bool,
        /// Peak strategy (Simple or Interpolated)
        #[arg(long)]
        peak_analysis: Option<String>,
        /// Analyzer (defaults to analysis.provider)
        #[arg(long)]
        analyzer: Option<String>,
        /// Print results without writing tags
        #[arg(long)]
        dry_run: bool,
        /// Audio files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Re-encode files into the output directory
    Encode {
        /// Encoder (defaults to encoding.provider)
        #[arg(short, long)]
        encoder: Option<String>,
        /// Encoder option, repeatable (e.g. BitsPerSample=24)
        #[arg(short, long = "setting", value_name = "KEY=VALUE")]
        settings: Vec<String>,
        /// Output directory (defaults to encoding.output_directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Audio files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List registered providers and the settings they accept
    Providers,
}

/// One line of `analyze` output
#[derive(Serialize)]
struct AnalyzedFile {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<MetadataRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = HostConfig::load_from(&cli.config)?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    config.init_worker_pool();
    let registry = Arc::new(timbre_codecs::builtin_registry()?);

    match cli.command {
        Commands::Analyze {
            album,
            peak_analysis,
            analyzer,
            dry_run,
            files,
        } => {
            let provider = analyzer.unwrap_or_else(|| config.analysis.provider.clone());
            let mut settings = SettingsMap::new();
            if let Some(mode) = peak_analysis {
                settings.insert("PeakAnalysis".to_string(), SettingValue::Text(mode));
            }
            analyze(&registry, &provider, &settings, album, dry_run, &files)?;
        }
        Commands::Encode {
            encoder,
            settings,
            output,
            files,
        } => {
            let provider = encoder.unwrap_or_else(|| config.encoding.provider.clone());
            let settings = parse_settings(&settings)?;
            let output = output.unwrap_or_else(|| config.encoding.output_directory.clone());
            encode(&registry, &provider, &settings, &output, &files)?;
        }
        Commands::Providers => {
            list_providers(&registry)?;
        }
    }

    Ok(())
}

fn analyze(
    registry: &Arc<CapabilityRegistry>,
    provider: &str,
    settings: &SettingsMap,
    album: bool,
    dry_run: bool,
    files: &[PathBuf],
) -> anyhow::Result<()> {
    let orchestrator = AnalysisOrchestrator::new(registry.clone());

    let report: Vec<AnalyzedFile> = if album {
        // An album is all or nothing: every file must open
        let mut items = files
            .iter()
            .map(|path| open_item(registry, path).with_context(|| format!("opening {}", path.display())))
            .collect::<anyhow::Result<Vec<AudioItem>>>()?;
        orchestrator.analyze(provider, settings, &mut items)?;

        files
            .iter()
            .zip(items)
            .map(|(path, item)| finish(registry, path, Ok(item.metadata), dry_run))
            .collect()
    } else {
        let mut opened = Vec::new();
        let mut report = Vec::new();
        for path in files {
            match open_item(registry, path) {
                Ok(item) => opened.push((path, item)),
                Err(e) => report.push(finish(registry, path, Err(e.to_string()), dry_run)),
            }
        }

        let (paths, mut items): (Vec<&PathBuf>, Vec<AudioItem>) = opened.into_iter().unzip();
        let results = orchestrator.analyze_batch(provider, settings, &mut items)?;
        for ((path, item), result) in paths.into_iter().zip(items).zip(results) {
            let outcome = result.map(|_| item.metadata).map_err(|e| e.to_string());
            report.push(finish(registry, path, outcome, dry_run));
        }
        report
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.iter().any(|r| r.error.is_some()) {
        bail!("some files could not be analyzed");
    }
    Ok(())
}

/// Save analyzed metadata (unless `dry_run`) and build its report line
fn finish(
    registry: &CapabilityRegistry,
    path: &Path,
    outcome: Result<MetadataRecord, String>,
    dry_run: bool,
) -> AnalyzedFile {
    let outcome = outcome.and_then(|metadata| {
        if !dry_run {
            save_metadata(registry, path, &metadata).map_err(|e| e.to_string())?;
        }
        Ok(metadata)
    });

    match outcome {
        Ok(metadata) => AnalyzedFile {
            path: path.to_path_buf(),
            metadata: Some(metadata),
            error: None,
        },
        Err(error) => {
            tracing::warn!("{}: {}", path.display(), error);
            AnalyzedFile {
                path: path.to_path_buf(),
                metadata: None,
                error: Some(error),
            }
        }
    }
}

fn encode(
    registry: &Arc<CapabilityRegistry>,
    provider: &str,
    settings: &SettingsMap,
    output: &Path,
    files: &[PathBuf],
) -> anyhow::Result<()> {
    let format = registry
        .resolve(ProviderKind::Encoder, provider)?
        .descriptor
        .extensions
        .first()
        .cloned()
        .unwrap_or_else(|| provider.to_lowercase());

    std::fs::create_dir_all(output)
        .with_context(|| format!("creating output directory {}", output.display()))?;

    let orchestrator = EncodingOrchestrator::new(registry.clone());
    for path in files {
        let mut item = open_item(registry, path).with_context(|| format!("opening {}", path.display()))?;
        let destination = destination_for(output, path, &format);
        if destination == *path {
            bail!("refusing to overwrite input {}", path.display());
        }

        let artifact = orchestrator.encode(
            provider,
            settings,
            item.source.as_mut(),
            &item.metadata,
            &destination,
        )?;
        println!("{}", artifact.path.display());
    }
    Ok(())
}

fn list_providers(registry: &CapabilityRegistry) -> anyhow::Result<()> {
    let listing: serde_json::Map<String, serde_json::Value> = ProviderKind::ALL
        .iter()
        .map(|kind| -> Result<(String, serde_json::Value), serde_json::Error> {
            let descriptors = serde_json::to_value(registry.descriptors(*kind))?;
            Ok((format!("{}s", kind), descriptors))
        })
        .collect::<Result<_, _>>()?;

    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

/// Parse `KEY=VALUE` options
///
/// Values are typed by shape: `true`/`false`, integers, `YYYY-MM-DD` dates,
/// anything else is text.
fn parse_settings(entries: &[String]) -> anyhow::Result<SettingsMap> {
    entries
        .iter()
        .map(|entry| {
            let Some((key, value)) = entry.split_once('=') else {
                bail!("expected KEY=VALUE, got {:?}", entry);
            };
            Ok((key.trim().to_string(), parse_value(value.trim())))
        })
        .collect()
}

fn parse_value(value: &str) -> SettingValue {
    if let Ok(flag) = value.parse::<bool>() {
        SettingValue::Bool(flag)
    } else if let Ok(int) = value.parse::<i64>() {
        SettingValue::Int(int)
    } else if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        SettingValue::Date(date)
    } else {
        SettingValue::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("true"), SettingValue::Bool(true));
        assert_eq!(parse_value("24"), SettingValue::Int(24));
        assert_eq!(
            parse_value("2020-02-29"),
            SettingValue::Date(NaiveDate::from_ymd_opt(2020, 2, 29).unwrap())
        );
        assert_eq!(parse_value("Album"), SettingValue::Text("Album".to_string()));
    }

    #[test]
    fn test_parse_settings() {
        let settings = parse_settings(&["BitsPerSample=24".to_string(), "ApplyGain = Track".to_string()]).unwrap();
        assert_eq!(settings.get("BitsPerSample"), Some(&SettingValue::Int(24)));
        assert_eq!(settings.get("ApplyGain"), Some(&SettingValue::Text("Track".to_string())));

        assert!(parse_settings(&["BitsPerSample".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["timbre", "analyze", "--album", "a.flac", "b.flac"]).unwrap();
        match cli.command {
            Commands::Analyze { album, files, .. } => {
                assert!(album);
                assert_eq!(files.len(), 2);
            }
            _ => panic!("expected analyze"),
        }
        assert!(Cli::try_parse_from(["timbre", "encode"]).is_err());
    }
}
