use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use reelsmith::capability::{CloudinaryStore, ElevenLabsSynthesizer, HttpFetcher, WhisperAligner};
use reelsmith::timeline::dialogue::{DialogueClip, build_dialogue_plan};
use reelsmith::timeline::plan::PlanSettings;
use reelsmith::{
    JobContent, JobId, JobOptions, JobStore, Pipeline, PipelineBuilder, PipelineConfig,
    StyleTable, WorkerPool,
};

#[derive(Parser, Debug)]
#[command(name = "reelsmith", version, about = "Short vertical video job runner")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one job and print the published video URL.
    Render(RenderArgs),
    /// Run every `*.json` job file in a directory on a worker pool.
    Batch(BatchArgs),
    /// Print the render plan of a dialogue job for given speech durations (no network).
    Plan(PlanArgs),
    /// List subtitle styles (`*` marks premium styles).
    Styles,
}

#[derive(Args, Debug)]
struct Credentials {
    /// ElevenLabs API key.
    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    elevenlabs_api_key: Option<String>,

    /// Cloudinary cloud name.
    #[arg(long, env = "CLOUDINARY_CLOUD_NAME")]
    cloudinary_cloud_name: Option<String>,

    /// Cloudinary API key.
    #[arg(long, env = "CLOUDINARY_API_KEY", hide_env_values = true)]
    cloudinary_api_key: Option<String>,

    /// Cloudinary API secret.
    #[arg(long, env = "CLOUDINARY_API_SECRET", hide_env_values = true)]
    cloudinary_api_secret: Option<String>,

    /// OpenAI API key. Enables word-aligned subtitles for narrated posts.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Job content JSON (`{"kind": "dialogue", "lines": [...]}` or `{"kind": "narrated-post", ...}`).
    #[arg(long)]
    content: PathBuf,

    /// Job options JSON.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Pipeline configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    creds: Credentials,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory of job files (`{"content": {...}, "options": {...}}`).
    #[arg(long)]
    jobs: PathBuf,

    /// Worker threads.
    #[arg(long, default_value_t = 2)]
    workers: usize,

    /// Pipeline configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    creds: Credentials,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Dialogue job content JSON.
    #[arg(long)]
    content: PathBuf,

    /// Speech duration of each line in seconds, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    durations: Vec<f64>,

    /// Job options JSON.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Pipeline configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Deserialize, Debug)]
struct JobFile {
    content: JobContent,
    #[serde(default)]
    options: JobOptions,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Plan(args) => cmd_plan(args),
        Command::Styles => cmd_styles(),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse {what} '{}'", path.display()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    Ok(match path {
        Some(p) => PipelineConfig::from_path(p)?,
        None => PipelineConfig::default(),
    })
}

fn load_options(path: Option<&Path>) -> anyhow::Result<JobOptions> {
    match path {
        Some(p) => read_json(p, "job options"),
        None => Ok(JobOptions::default()),
    }
}

fn http_pipeline(config: PipelineConfig, creds: Credentials) -> anyhow::Result<PipelineBuilder> {
    let eleven = creds
        .elevenlabs_api_key
        .context("ELEVENLABS_API_KEY is required")?;
    let (Some(cloud), Some(key), Some(secret)) = (
        creds.cloudinary_cloud_name,
        creds.cloudinary_api_key,
        creds.cloudinary_api_secret,
    ) else {
        anyhow::bail!(
            "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET are required"
        );
    };

    let mut builder = Pipeline::builder(config)
        .synthesizer(Arc::new(ElevenLabsSynthesizer::new(eleven)?))
        .fetcher(Arc::new(HttpFetcher::new()?))
        .store(Arc::new(CloudinaryStore::new(cloud, key, secret)?));
    match creds.openai_api_key {
        Some(k) => builder = builder.aligner(Arc::new(WhisperAligner::new(k)?)),
        None => tracing::info!("OPENAI_API_KEY not set, narrated posts use proportional subtitles"),
    }
    Ok(builder)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let content: JobContent = read_json(&args.content, "job content")?;
    let options = load_options(args.options.as_deref())?;

    let pipeline = http_pipeline(config, args.creds)?.build()?;
    let out = pipeline.execute(&JobId::generate(), &content, &options)?;
    println!("{}", out.video_url);
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut files: Vec<PathBuf> = std::fs::read_dir(&args.jobs)
        .with_context(|| format!("read job dir '{}'", args.jobs.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();
    if files.is_empty() {
        anyhow::bail!("no *.json job files in '{}'", args.jobs.display());
    }

    let store = Arc::new(JobStore::new());
    let pipeline = http_pipeline(config, args.creds)?
        .progress(store.clone())
        .build()?;
    let pool = WorkerPool::start(args.workers, Arc::new(pipeline), store.clone())?;

    let mut submitted = Vec::with_capacity(files.len());
    for path in &files {
        let job: JobFile = read_json(path, "job file")?;
        match pool.submit(job.content, job.options) {
            Ok(id) => submitted.push((path.clone(), id)),
            Err(e) => eprintln!("{}: rejected: {e}", path.display()),
        }
    }
    pool.shutdown();

    let mut failed = 0usize;
    for (path, id) in submitted {
        let Some(rec) = store.get(&id) else {
            continue;
        };
        let detail = rec
            .result_url
            .or(rec.error)
            .unwrap_or_default();
        if rec.status == reelsmith::JobStatus::Failed {
            failed += 1;
        }
        println!("{}\t{id}\t{:?}\t{detail}", path.display(), rec.status);
    }
    if failed > 0 {
        anyhow::bail!("{failed} job(s) failed");
    }
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let options = load_options(args.options.as_deref())?;
    let content: JobContent = read_json(&args.content, "job content")?;
    content.validate()?;
    options.validate()?;
    let JobContent::Dialogue { lines } = content else {
        anyhow::bail!("plan only supports dialogue jobs");
    };
    if lines.len() != args.durations.len() {
        anyhow::bail!(
            "{} durations given for {} dialogue lines",
            args.durations.len(),
            lines.len()
        );
    }

    let clips = lines
        .into_iter()
        .zip(args.durations)
        .map(|(line, duration)| {
            let art = config
                .characters
                .get(&line.speaker)
                .cloned()
                .with_context(|| format!("no character art configured for '{}'", line.speaker))?;
            Ok(DialogueClip {
                text: line.text,
                art,
                placement: line.placement,
                duration,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let styles = StyleTable::default();
    let style = styles
        .lookup(options.style_name())
        .scaled(options.subtitle_size_multiplier.unwrap_or(1.0))?;
    let settings = PlanSettings::from_config(&config, style);
    let background = PathBuf::from(config.background_url(options.background_video.as_deref())?);
    let plan = build_dialogue_plan(&clips, background, None, &settings)?;

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn cmd_styles() -> anyhow::Result<()> {
    let styles = StyleTable::default();
    for name in styles.names() {
        let marker = if styles.is_premium(name) { "*" } else { "" };
        println!("{name}{marker}");
    }
    Ok(())
}
