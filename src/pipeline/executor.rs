use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;

use crate::assets::media::{AudioPcm, decode_audio};
use crate::assets::resolver::AssetResolver;
use crate::assets::text_raster::TextRasterizer;
use crate::audio::narration::{NarrationTrack, concat_tracks, normalize_peak, write_wav};
use crate::capability::{ObjectStore, RemoteFetcher, SpeechAligner, SpeechSynthesizer};
use crate::config::{JobOptions, PipelineConfig};
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::model::{DialogueLine, JobContent, JobId, JobOutput, NarratedPost};
use crate::job::progress::{ProgressReporter, ProgressSink};
use crate::job::queue::JobRunner;
use crate::render::{FfmpegRenderer, Renderer};
use crate::style::table::{StyleSpec, StyleTable};
use crate::timeline::chunk::chunk_text;
use crate::timeline::dialogue::{DialogueClip, build_dialogue_plan};
use crate::timeline::narration::{
    Cue, NarrationLayout, NarrationSync, aligned_cues, build_narration_plan, proportional_cues,
};
use crate::timeline::plan::{PlanSettings, RenderPlan};
use crate::workspace::{Workspace, WorkspaceManager};

/// Mime hint passed to the object store for rendered videos.
pub const VIDEO_MIME: &str = "video/mp4";

const NARRATION_FILE: &str = "narration.wav";

/// Executes jobs end to end.
///
/// Holds only immutable configuration and shareable capabilities, so one `Pipeline` can serve any
/// number of worker threads.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    styles: Arc<StyleTable>,
    resolver: AssetResolver,
    aligner: Option<Arc<dyn SpeechAligner>>,
    renderer: Arc<dyn Renderer>,
    store: Arc<dyn ObjectStore>,
    progress: Option<Arc<dyn ProgressSink>>,
    workspaces: WorkspaceManager,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("workspace_root", &self.workspaces.root())
            .field("aligner", &self.aligner.is_some())
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Pipeline`]. Synthesizer, fetcher and object store are required.
pub struct PipelineBuilder {
    config: PipelineConfig,
    styles: StyleTable,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    fetcher: Option<Arc<dyn RemoteFetcher>>,
    aligner: Option<Arc<dyn SpeechAligner>>,
    renderer: Option<Arc<dyn Renderer>>,
    store: Option<Arc<dyn ObjectStore>>,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl PipelineBuilder {
    /// Start from `config` and the built-in style table.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            styles: StyleTable::default(),
            synthesizer: None,
            fetcher: None,
            aligner: None,
            renderer: None,
            store: None,
            progress: None,
        }
    }

    /// Replace the style table.
    pub fn styles(mut self, styles: StyleTable) -> Self {
        self.styles = styles;
        self
    }

    /// Speech-synthesis capability.
    pub fn synthesizer(mut self, s: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(s);
        self
    }

    /// Remote-fetch capability.
    pub fn fetcher(mut self, f: Arc<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(f);
        self
    }

    /// Optional word aligner. Without one, narrated posts use proportional subtitle timing.
    pub fn aligner(mut self, a: Arc<dyn SpeechAligner>) -> Self {
        self.aligner = Some(a);
        self
    }

    /// Renderer. Defaults to [`FfmpegRenderer`].
    pub fn renderer(mut self, r: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(r);
        self
    }

    /// Object store the finished video is published to.
    pub fn store(mut self, s: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(s);
        self
    }

    /// Sink receiving stage strings.
    pub fn progress(mut self, p: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(p);
        self
    }

    /// Validate the configuration and assemble the pipeline.
    pub fn build(self) -> ReelResult<Pipeline> {
        self.config.validate()?;
        let synthesizer = self
            .synthesizer
            .ok_or_else(|| ReelError::validation("pipeline needs a speech synthesizer"))?;
        let fetcher = self
            .fetcher
            .ok_or_else(|| ReelError::validation("pipeline needs a remote fetcher"))?;
        let store = self
            .store
            .ok_or_else(|| ReelError::validation("pipeline needs an object store"))?;

        let config = Arc::new(self.config);
        let text = Arc::new(TextRasterizer::new(config.fonts_dir.as_deref()));
        let renderer = self.renderer.unwrap_or_else(|| {
            Arc::new(FfmpegRenderer::new(
                Arc::clone(&text),
                config.outline_mode,
                config.caption.char_width_factor,
            ))
        });
        let workspaces = match config.workspace_root.as_ref() {
            Some(root) => WorkspaceManager::new(root.clone()),
            None => WorkspaceManager::in_temp_dir(),
        };

        Ok(Pipeline {
            resolver: AssetResolver::new(Arc::clone(&config), synthesizer, fetcher, text),
            config,
            styles: Arc::new(self.styles),
            aligner: self.aligner,
            renderer,
            store,
            progress: self.progress,
            workspaces,
        })
    }
}

impl Pipeline {
    /// Shortcut for [`PipelineBuilder::new`].
    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Shared style table.
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Run one job to completion.
    ///
    /// Validation happens before the workspace exists. Once it does, the workspace is removed on
    /// every exit path before this returns: explicitly here, or by `Drop` during unwinding.
    #[tracing::instrument(skip(self, content, options), fields(kind = ?content.kind()))]
    pub fn execute(
        &self,
        job: &JobId,
        content: &JobContent,
        options: &JobOptions,
    ) -> ReelResult<JobOutput> {
        let progress = ProgressReporter::new(job.clone(), self.progress.clone());
        progress.report("Initializing...");

        content.validate()?;
        options.validate()?;
        self.preflight(content, options)?;
        let style = self.job_style(options)?;
        let settings = PlanSettings::from_config(&self.config, style);

        let mut ws = self.workspaces.open(job)?;
        let result = self.run_stages(&mut ws, content, options, &settings, &progress);
        let closed = ws.close();

        let output = match (result, closed) {
            (Ok(out), Ok(())) => out,
            (Ok(_), Err(e)) => return Err(e),
            (Err(e), Err(cleanup)) => {
                tracing::warn!(error = %cleanup, "workspace cleanup failed after job error");
                return Err(e);
            }
            (Err(e), Ok(())) => return Err(e),
        };
        progress.report("Done");
        Ok(output)
    }

    fn run_stages(
        &self,
        ws: &mut Workspace,
        content: &JobContent,
        options: &JobOptions,
        settings: &PlanSettings,
        progress: &ProgressReporter,
    ) -> ReelResult<JobOutput> {
        let plan = match content {
            JobContent::Dialogue { lines } => {
                self.dialogue_plan(ws, lines, options, settings, progress)?
            }
            JobContent::NarratedPost { post } => {
                self.narration_plan(ws, post, options, settings, progress)?
            }
        };

        progress.report("Rendering final video...");
        let video = self.renderer.render(&plan, ws)?;

        progress.report("Uploading...");
        let video_url = self.store.upload(&video, VIDEO_MIME)?;
        tracing::info!(url = %video_url, "published");
        Ok(JobOutput { video_url })
    }

    fn dialogue_plan(
        &self,
        ws: &mut Workspace,
        lines: &[DialogueLine],
        options: &JobOptions,
        settings: &PlanSettings,
        progress: &ProgressReporter,
    ) -> ReelResult<RenderPlan> {
        progress.report("Generating audio clips...");
        let mut clips = Vec::with_capacity(lines.len());
        let mut pcms = Vec::with_capacity(lines.len());
        for line in lines {
            let speech = self.resolver.synthesize_speech(ws, &line.text, &line.speaker)?;
            let pcm = decode_audio(&speech)?;
            let art = self.resolver.character_art(ws, &line.speaker)?;
            clips.push(DialogueClip {
                text: line.text.clone(),
                art,
                placement: line.placement.clone(),
                duration: pcm.duration_secs(),
            });
            pcms.push(pcm);
        }
        let (audio, _) = self.write_narration(ws, &pcms)?;

        progress.report("Downloading background...");
        let background = self
            .resolver
            .resolve_background(ws, options.background_video.as_deref())?;

        progress.report("Compositing video...");
        build_dialogue_plan(&clips, background, Some(audio), settings)
    }

    fn narration_plan(
        &self,
        ws: &mut Workspace,
        post: &NarratedPost,
        options: &JobOptions,
        settings: &PlanSettings,
        progress: &ProgressReporter,
    ) -> ReelResult<RenderPlan> {
        let voice = options
            .voice
            .as_deref()
            .unwrap_or(self.config.default_voice.as_str());
        let body = post.body_text();

        progress.report("Generating audio clips...");
        let title_speech = self.resolver.synthesize_speech(ws, &post.title, voice)?;
        let mut pcms = vec![decode_audio(&title_speech)?];
        if let Some(body) = body {
            let body_speech = self.resolver.synthesize_speech(ws, body, voice)?;
            pcms.push(decode_audio(&body_speech)?);
        }
        let (audio, track) = self.write_narration(ws, &pcms)?;
        let title_secs = pcms[0].duration_secs();

        let (title_duration, cues) = match body {
            None => (track.duration_secs, Vec::new()),
            Some(body) => self.body_cues(&audio, post, body, title_secs, &track, options)?,
        };

        progress.report("Downloading background...");
        let background = self
            .resolver
            .resolve_background(ws, options.background_video.as_deref())?;

        progress.report("Compositing video...");
        let card = self.resolver.render_post_card(ws, post)?;
        build_narration_plan(
            NarrationLayout {
                card,
                background,
                audio: Some(audio),
                total_duration: track.duration_secs,
                title_duration,
                cues,
            },
            settings,
        )
    }

    fn body_cues(
        &self,
        audio: &std::path::Path,
        post: &NarratedPost,
        body: &str,
        title_secs: f64,
        track: &NarrationTrack,
        options: &JobOptions,
    ) -> ReelResult<(f64, Vec<Cue>)> {
        let aligner = match NarrationSync::select(self.aligner.is_some(), Some(body)) {
            NarrationSync::WordAligned => self.aligner.as_ref(),
            NarrationSync::Proportional => None,
        };
        match aligner {
            Some(aligner) => {
                let bytes = std::fs::read(audio)
                    .with_context(|| format!("read narration '{}'", audio.display()))?;
                let words = aligner.align(&bytes, NARRATION_FILE)?;
                let group = options
                    .word_group_size
                    .unwrap_or(self.config.default_word_group_size);
                let aligned = aligned_cues(&post.title, body, &words, group)?;
                tracing::debug!(cues = aligned.cues.len(), "word-aligned subtitles");
                Ok((aligned.title_duration, aligned.cues))
            }
            None => {
                let chunks = chunk_text(body, self.config.chunk_max_chars);
                let body_secs = track.duration_secs - title_secs;
                let cues = proportional_cues(&chunks, body_secs.max(0.0))?;
                tracing::debug!(cues = cues.len(), "proportional subtitles");
                Ok((title_secs, cues))
            }
        }
    }

    fn write_narration(
        &self,
        ws: &mut Workspace,
        clips: &[AudioPcm],
    ) -> ReelResult<(PathBuf, NarrationTrack)> {
        let mut track = concat_tracks(clips);
        if self.config.normalize_audio {
            normalize_peak(&mut track.samples, 1.0);
        }
        let path = ws.alloc(NARRATION_FILE)?;
        write_wav(&track, &path)?;
        Ok((path, track))
    }

    /// Reject jobs referencing voices or speakers the configuration does not know.
    fn preflight(&self, content: &JobContent, options: &JobOptions) -> ReelResult<()> {
        match content {
            JobContent::Dialogue { lines } => {
                for line in lines {
                    self.config.voice_id(&line.speaker)?;
                    if !self.config.characters.contains_key(&line.speaker) {
                        return Err(ReelError::validation(format!(
                            "no character art configured for '{}'",
                            line.speaker
                        )));
                    }
                }
            }
            JobContent::NarratedPost { .. } => {
                let voice = options
                    .voice
                    .as_deref()
                    .unwrap_or(self.config.default_voice.as_str());
                self.config.voice_id(voice)?;
            }
        }
        Ok(())
    }

    /// The job's subtitle style: table lookup (unknown names fall back) then size scaling.
    fn job_style(&self, options: &JobOptions) -> ReelResult<StyleSpec> {
        let name = options.style_name();
        if self.styles.is_premium(name) {
            tracing::debug!(style = name, "premium subtitle style");
        }
        self.styles
            .lookup(name)
            .scaled(options.subtitle_size_multiplier.unwrap_or(1.0))
    }
}

impl JobRunner for Pipeline {
    fn run(&self, id: &JobId, content: &JobContent, options: &JobOptions) -> ReelResult<JobOutput> {
        self.execute(id, content, options)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/executor.rs"]
mod tests;
