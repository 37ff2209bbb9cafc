//! Dictation recorder.
//!
//! State machine:
//!
//! ```text
//! Idle ──start──▶ Recording ──stop──▶ Processing ──▶ Idle
//!   ▲                                     │
//!   └──────────── start ◀── Error ◀───────┘ (service failure)
//! ```
//!
//! `stop` uploads the captured clip for transcription, then sends the transcript for analysis.
//! Each step runs once; failures are logged and land the recorder in [`RecorderState::Error`].
//! Processing can be abandoned through the [`CancelHandle`] returned with the recorder:
//! cancelling, or dropping the handle, returns the recorder to `Idle` and delivers no result.

use crate::api::{AudioClip, DictationApi};
use crate::constants::{
    AUDIO_CHUNK_BYTES, DEFAULT_AUDIO_MIME, TRANSCRIPTION_ERROR_TEXT, TRANSCRIPT_PREVIEW_CHARS,
};
use crate::{ApiError, CaptureError};
use medbot_wire::AnalysisResult;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

// ============================================================================
// AUDIO INPUT
// ============================================================================

/// A source of recorded audio, read in chunks.
pub trait AudioInput {
    /// Acquire the device. Denied access is [`CaptureError::PermissionDenied`].
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Next chunk, or `None` when nothing more is available. Chunks may be empty.
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError>;

    fn close(&mut self);

    fn mime_type(&self) -> &str {
        DEFAULT_AUDIO_MIME
    }
}

/// Audio read from a previously recorded file.
#[derive(Debug)]
pub struct FileAudioInput {
    path: PathBuf,
    mime_type: String,
    file: Option<File>,
}

impl FileAudioInput {
    /// The MIME type is sniffed from the file header, defaulting to `audio/webm`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime_type = infer::get_from_path(&path)
            .ok()
            .flatten()
            .map(|kind| kind.mime_type().to_owned())
            .unwrap_or_else(|| DEFAULT_AUDIO_MIME.to_owned());
        Self {
            path,
            mime_type,
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioInput for FileAudioInput {
    fn open(&mut self) -> Result<(), CaptureError> {
        let file = File::open(&self.path).map_err(|err| match err.kind() {
            ErrorKind::PermissionDenied => {
                CaptureError::PermissionDenied(self.path.display().to_string())
            }
            ErrorKind::NotFound => {
                CaptureError::Unavailable(format!("{} not found", self.path.display()))
            }
            _ => CaptureError::Read(err),
        })?;
        self.file = Some(file);
        Ok(())
    }

    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };
        let mut buf = vec![0u8; AUDIO_CHUNK_BYTES];
        let n = file.read(&mut buf).map_err(CaptureError::Read)?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }

    fn close(&mut self) {
        self.file = None;
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

// ============================================================================
// RECORDER
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Processing,
    /// The last run failed; carries the text shown in place of a transcript.
    Error(String),
}

/// Cancels the current run's processing. Dropping it cancels every later run too.
///
/// Each cancel bumps a generation counter; a run only reacts to bumps made after it started.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<u64>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_modify(|generation| *generation = generation.wrapping_add(1));
    }
}

pub struct Recorder<I> {
    input: I,
    state: RecorderState,
    chunks: Vec<Vec<u8>>,
    transcript: Option<String>,
    cancels: watch::Receiver<u64>,
    /// Cancel generation seen when the current run started.
    run_generation: u64,
}

/// Cut a transcript to [`TRANSCRIPT_PREVIEW_CHARS`] characters, marking the cut with `...`.
pub fn transcript_preview(transcript: &str) -> String {
    if transcript.chars().count() > TRANSCRIPT_PREVIEW_CHARS {
        let head: String = transcript.chars().take(TRANSCRIPT_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        transcript.to_owned()
    }
}

enum Outcome {
    Cancelled,
    Done(Result<Option<AnalysisResult>, ApiError>),
}

impl<I: AudioInput> Recorder<I> {
    pub fn new(input: I) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(0);
        let recorder = Self {
            input,
            state: RecorderState::Idle,
            chunks: Vec::new(),
            transcript: None,
            cancels: rx,
            run_generation: 0,
        };
        (recorder, CancelHandle(tx))
    }

    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    /// Transcript of the last run, if one came back.
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// What to show where the transcript goes: the preview, the error text, or nothing.
    pub fn display_text(&self) -> Option<String> {
        match (&self.state, &self.transcript) {
            (RecorderState::Error(message), _) => Some(format!("❌ {message}")),
            (_, Some(transcript)) => Some(transcript_preview(transcript)),
            _ => None,
        }
    }

    /// Begin recording. Allowed from `Idle` or `Error`.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        match self.state {
            RecorderState::Recording => return Err(CaptureError::Busy("already recording")),
            RecorderState::Processing => return Err(CaptureError::Busy("processing")),
            RecorderState::Idle | RecorderState::Error(_) => {}
        }

        self.chunks.clear();
        self.transcript = None;
        self.run_generation = *self.cancels.borrow();
        if let Err(err) = self.input.open() {
            self.state = RecorderState::Idle;
            tracing::warn!("could not start recording: {err}");
            return Err(err);
        }
        self.state = RecorderState::Recording;
        tracing::debug!("recording started");
        Ok(())
    }

    /// Pull every chunk the input has ready. Empty chunks are dropped. Returns bytes captured.
    pub fn capture(&mut self) -> Result<usize, CaptureError> {
        if self.state != RecorderState::Recording {
            return Ok(0);
        }
        let mut captured = 0;
        while let Some(chunk) = self.input.read_chunk()? {
            if chunk.is_empty() {
                continue;
            }
            captured += chunk.len();
            self.chunks.push(chunk);
        }
        Ok(captured)
    }

    /// Stop recording and run the clip through transcription and analysis.
    ///
    /// Returns the analysis to merge into the diagnosis form, or `None` when there is nothing
    /// to merge (silence, an unusable analysis, a failure, or cancellation). Calling this while
    /// not recording does nothing.
    pub async fn stop<D: DictationApi>(&mut self, dictation: &D) -> Option<AnalysisResult> {
        if self.state != RecorderState::Recording {
            return None;
        }
        self.input.close();

        let clip = AudioClip {
            bytes: self.chunks.concat(),
            mime_type: self.input.mime_type().to_owned(),
        };
        self.chunks.clear();
        if clip.is_empty() {
            tracing::warn!("no audio captured, skipping transcription");
            self.state = RecorderState::Idle;
            return None;
        }

        self.state = RecorderState::Processing;
        let mut cancels = self.cancels.clone();
        let run_generation = self.run_generation;
        let transcript = &mut self.transcript;

        // A closed channel (handle dropped) resolves with an error and counts as a cancel.
        let outcome = tokio::select! {
            biased;
            _ = cancels.wait_for(|generation| *generation != run_generation) => Outcome::Cancelled,
            result = Self::process(dictation, &clip, transcript) => Outcome::Done(result),
        };

        match outcome {
            Outcome::Cancelled => {
                tracing::info!("dictation processing cancelled");
                self.state = RecorderState::Idle;
                None
            }
            Outcome::Done(Ok(analysis)) => {
                self.state = RecorderState::Idle;
                analysis
            }
            Outcome::Done(Err(err)) => {
                tracing::error!("dictation processing failed: {err}");
                self.state = RecorderState::Error(TRANSCRIPTION_ERROR_TEXT.to_owned());
                None
            }
        }
    }

    async fn process<D: DictationApi>(
        dictation: &D,
        clip: &AudioClip,
        transcript: &mut Option<String>,
    ) -> Result<Option<AnalysisResult>, ApiError> {
        let Some(text) = dictation.transcribe(clip).await? else {
            tracing::info!("transcription came back empty");
            return Ok(None);
        };
        *transcript = Some(text.clone());

        match dictation.analyze(&text).await {
            Ok(analysis) => Ok(analysis),
            Err(ApiError::Decode(err)) => {
                tracing::warn!("analysis result could not be parsed: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDictation;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Scripted input: a queue of chunks, optionally refusing to open.
    struct ScriptedInput {
        deny: bool,
        chunks: VecDeque<Vec<u8>>,
    }

    impl ScriptedInput {
        fn with_chunks(chunks: &[&[u8]]) -> Self {
            Self {
                deny: false,
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            }
        }
    }

    impl AudioInput for ScriptedInput {
        fn open(&mut self) -> Result<(), CaptureError> {
            if self.deny {
                Err(CaptureError::PermissionDenied("microphone".into()))
            } else {
                Ok(())
            }
        }

        fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
            Ok(self.chunks.pop_front())
        }

        fn close(&mut self) {}
    }

    /// Yields one chunk each time it is opened.
    #[derive(Default)]
    struct ChunkPerRun {
        pending: Option<Vec<u8>>,
    }

    impl AudioInput for ChunkPerRun {
        fn open(&mut self) -> Result<(), CaptureError> {
            self.pending = Some(b"ab".to_vec());
            Ok(())
        }

        fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
            Ok(self.pending.take())
        }

        fn close(&mut self) {}
    }

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            blood_pressure: Some("120/80".into()),
            ..AnalysisResult::default()
        }
    }

    #[tokio::test]
    async fn test_full_run_returns_analysis() {
        let (mut recorder, _cancel) =
            Recorder::new(ScriptedInput::with_chunks(&[b"ab", b"", b"cd"]));
        let dictation = FakeDictation {
            transcript: Some("Blood pressure one twenty over eighty".into()),
            analysis: Some(analysis()),
            ..FakeDictation::default()
        };

        recorder.start().expect("start");
        assert_eq!(recorder.state(), &RecorderState::Recording);
        assert_eq!(recorder.capture().expect("capture"), 4);

        let result = recorder.stop(&dictation).await;

        assert_eq!(result, Some(analysis()));
        assert_eq!(recorder.state(), &RecorderState::Idle);
        let clips = dictation.clips.lock().unwrap();
        assert_eq!(clips[0].bytes, b"abcd");
        assert_eq!(clips[0].mime_type, DEFAULT_AUDIO_MIME);
        assert_eq!(
            dictation.analyzed.lock().unwrap().as_slice(),
            ["Blood pressure one twenty over eighty"]
        );
    }

    #[tokio::test]
    async fn test_permission_denied_stays_idle() {
        let (mut recorder, _cancel) = Recorder::new(ScriptedInput {
            deny: true,
            chunks: VecDeque::new(),
        });

        let err = recorder.start().expect_err("start should fail");
        assert!(matches!(err, CaptureError::PermissionDenied(_)));
        assert_eq!(recorder.state(), &RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_transcription_failure_enters_error_and_can_restart() {
        let (mut recorder, _cancel) = Recorder::new(ScriptedInput::with_chunks(&[b"ab"]));
        let dictation = FakeDictation {
            transcribe_fails: true,
            ..FakeDictation::default()
        };

        recorder.start().expect("start");
        recorder.capture().expect("capture");
        assert_eq!(recorder.stop(&dictation).await, None);

        assert_eq!(
            recorder.state(),
            &RecorderState::Error(TRANSCRIPTION_ERROR_TEXT.to_owned())
        );
        assert_eq!(
            recorder.display_text().as_deref(),
            Some("❌ Error occurred during transcription")
        );
        assert!(dictation.analyzed.lock().unwrap().is_empty());

        recorder.start().expect("restart from error");
        assert_eq!(recorder.state(), &RecorderState::Recording);
        assert!(recorder.start().is_err());
    }

    #[tokio::test]
    async fn test_malformed_analysis_keeps_transcript() {
        let (mut recorder, _cancel) = Recorder::new(ScriptedInput::with_chunks(&[b"ab"]));
        let dictation = FakeDictation {
            transcript: Some("patient reports wheezing".into()),
            analysis_malformed: true,
            ..FakeDictation::default()
        };

        recorder.start().expect("start");
        recorder.capture().expect("capture");

        assert_eq!(recorder.stop(&dictation).await, None);
        assert_eq!(recorder.state(), &RecorderState::Idle);
        assert_eq!(recorder.transcript(), Some("patient reports wheezing"));
    }

    #[tokio::test]
    async fn test_empty_transcript_skips_analysis() {
        let (mut recorder, _cancel) = Recorder::new(ScriptedInput::with_chunks(&[b"ab"]));
        let dictation = FakeDictation::default();

        recorder.start().expect("start");
        recorder.capture().expect("capture");

        assert_eq!(recorder.stop(&dictation).await, None);
        assert!(dictation.analyzed.lock().unwrap().is_empty());
        assert_eq!(recorder.display_text(), None);
    }

    #[tokio::test]
    async fn test_cancel_discards_result() {
        let (mut recorder, cancel) = Recorder::new(ScriptedInput::with_chunks(&[b"ab"]));
        let dictation = FakeDictation {
            transcript: Some("late".into()),
            analysis: Some(analysis()),
            delay: Some(Duration::from_secs(5)),
            ..FakeDictation::default()
        };

        recorder.start().expect("start");
        recorder.capture().expect("capture");

        let stop = recorder.stop(&dictation);
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(stop, canceller);

        assert_eq!(result, None);
        assert_eq!(recorder.state(), &RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_only_affects_the_current_run() {
        let (mut recorder, cancel) = Recorder::new(ChunkPerRun::default());
        let slow = FakeDictation {
            transcript: Some("late".into()),
            analysis: Some(analysis()),
            delay: Some(Duration::from_secs(5)),
            ..FakeDictation::default()
        };

        recorder.start().expect("start");
        recorder.capture().expect("capture");
        let stop = recorder.stop(&slow);
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        };
        let (first, ()) = tokio::join!(stop, canceller);
        assert_eq!(first, None);
        assert_eq!(recorder.state(), &RecorderState::Idle);

        let fast = FakeDictation {
            transcript: Some("Blood pressure one twenty over eighty".into()),
            analysis: Some(analysis()),
            ..FakeDictation::default()
        };
        recorder.start().expect("restart after cancel");
        recorder.capture().expect("capture");
        let second = recorder.stop(&fast).await;

        assert_eq!(second, Some(analysis()));
        assert_eq!(fast.clips.lock().unwrap().len(), 1);
        assert_eq!(recorder.state(), &RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_while_recording_cancels_that_run() {
        let (mut recorder, cancel) = Recorder::new(ScriptedInput::with_chunks(&[b"ab"]));
        let dictation = FakeDictation {
            transcript: Some("never used".into()),
            ..FakeDictation::default()
        };

        recorder.start().expect("start");
        recorder.capture().expect("capture");
        cancel.cancel();

        assert_eq!(recorder.stop(&dictation).await, None);
        assert!(dictation.clips.lock().unwrap().is_empty());
        assert_eq!(recorder.state(), &RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_dropped_handle_cancels() {
        let (mut recorder, cancel) = Recorder::new(ScriptedInput::with_chunks(&[b"ab"]));
        drop(cancel);
        let dictation = FakeDictation {
            transcript: Some("never used".into()),
            ..FakeDictation::default()
        };

        recorder.start().expect("start");
        recorder.capture().expect("capture");
        assert_eq!(recorder.stop(&dictation).await, None);
        assert!(dictation.clips.lock().unwrap().is_empty());
    }

    #[test]
    fn test_transcript_preview() {
        let long = "a".repeat(60);
        assert_eq!(transcript_preview(&long), format!("{}...", "a".repeat(50)));
        assert_eq!(transcript_preview("short"), "short");
        assert_eq!(transcript_preview(&"é".repeat(50)), "é".repeat(50));
    }

    #[test]
    fn test_file_input_reads_whole_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("note.webm");
        std::fs::write(&path, vec![7u8; AUDIO_CHUNK_BYTES + 10]).expect("write audio");

        let mut input = FileAudioInput::new(&path);
        assert_eq!(input.mime_type(), DEFAULT_AUDIO_MIME);
        input.open().expect("open");
        let first = input.read_chunk().expect("read").expect("first chunk");
        let second = input.read_chunk().expect("read").expect("second chunk");
        assert_eq!(first.len() + second.len(), AUDIO_CHUNK_BYTES + 10);
        assert!(input.read_chunk().expect("read").is_none());

        let mut missing = FileAudioInput::new(temp_dir.path().join("absent.webm"));
        assert!(matches!(missing.open(), Err(CaptureError::Unavailable(_))));
    }
}
