use crate::{build_http, send};
use medbot_core::{ApiResult, AudioClip, ClientConfig, DictationApi};
use medbot_wire::{AnalysisRequest, AnalysisResult, TranscriptionResponse};
use reqwest::header::CONTENT_TYPE;

/// The transcription and analysis services over HTTP.
#[derive(Clone, Debug)]
pub struct DictationClient {
    http: reqwest::Client,
    transcribe_url: String,
    analyze_url: String,
}

impl DictationClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        Ok(Self {
            http: build_http(config)?,
            transcribe_url: config.transcribe_url().to_owned(),
            analyze_url: config.analyze_url().to_owned(),
        })
    }
}

impl DictationApi for DictationClient {
    async fn transcribe(&self, clip: &AudioClip) -> ApiResult<Option<String>> {
        let request = self
            .http
            .post(&self.transcribe_url)
            .header(CONTENT_TYPE, clip.mime_type.as_str())
            .body(clip.bytes.clone());
        let body = send(request, "transcription").await?;
        Ok(TranscriptionResponse::parse(&body)?.transcript)
    }

    async fn analyze(&self, transcript: &str) -> ApiResult<Option<AnalysisResult>> {
        let request = self
            .http
            .post(&self.analyze_url)
            .json(&AnalysisRequest { transcript });
        let body = send(request, "analysis").await?;
        Ok(AnalysisResult::from_response(&body)?)
    }
}
