use crate::{build_http, send};
use medbot_core::{ApiError, ApiResult, ClientConfig, MedbotApi, Role};
use medbot_wire::{
    error_message, AdmissionRequest, DiagnosisRecord, DoctorProfile, LoginGrant, NewDiagnosis, PatientRecord,
    VitalsPatch,
};
use reqwest::Url;

/// The hospital backend over HTTP.
///
/// Login is resolved against the server root; every other path against the API root.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    http: reqwest::Client,
    server_url: String,
    api_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        Ok(Self {
            http: build_http(config)?,
            server_url: config.server_url().to_owned(),
            api_url: config.api_url().to_owned(),
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// `{api_url}/download-test/{file_name}` with the name as one percent-encoded segment.
    fn download_url(&self, file_name: &str) -> ApiResult<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|err| ApiError::Network(format!("invalid API URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Network(format!("API URL cannot take a path: {}", self.api_url)))?
            .pop_if_empty()
            .push("download-test")
            .push(file_name);
        Ok(url)
    }

    async fn get(&self, token: &str, path: &str, what: &str) -> ApiResult<Vec<u8>> {
        send(self.http.get(self.api(path)).bearer_auth(token), what).await
    }
}

impl MedbotApi for HttpBackend {
    async fn login(&self, role: Role, identifier: &str, password: &str) -> ApiResult<LoginGrant> {
        let url = format!("{}/login/{}/", self.server_url, role.as_wire());
        let request = self
            .http
            .post(url)
            .form(&[(role.identifier_field(), identifier), ("password", password)]);

        let body = match send(request, "login").await {
            Ok(body) => body,
            // The backend answers bad credentials with 401 and missing fields with 400.
            Err(ApiError::Unauthorized) | Err(ApiError::Server { status: 400, .. }) => {
                return Err(ApiError::InvalidCredentials)
            }
            Err(err) => return Err(err),
        };
        Ok(LoginGrant::parse(&body)?)
    }

    async fn register_patient(&self, aadhaar: &str, password: &str) -> ApiResult<()> {
        let url = format!("{}/register/patient/", self.server_url);
        let request = self
            .http
            .post(url)
            .form(&[(Role::Patient.identifier_field(), aadhaar), ("password", password)]);

        match send(request, "patient registration").await {
            Ok(_) => Ok(()),
            Err(ApiError::Server { status: 400, body }) => Err(ApiError::Rejected(
                error_message(body.as_bytes()).unwrap_or(body),
            )),
            Err(err) => Err(err),
        }
    }

    async fn doctor_profile(&self, token: &str, doctor_id: &str) -> ApiResult<DoctorProfile> {
        let body = self
            .get(token, &format!("/doctors/{doctor_id}/"), "doctor profile")
            .await?;
        Ok(DoctorProfile::parse(&body)?)
    }

    async fn doctor_diagnoses(
        &self,
        token: &str,
        doctor_id: &str,
    ) -> ApiResult<Vec<DiagnosisRecord>> {
        let body = self
            .get(token, &format!("/doctors/{doctor_id}/diagnoses/"), "doctor diagnoses")
            .await?;
        Ok(DiagnosisRecord::parse_list(&body)?)
    }

    async fn patient_profile(&self, token: &str, patient_id: &str) -> ApiResult<PatientRecord> {
        let body = self
            .get(token, &format!("/patients/{patient_id}/"), "patient profile")
            .await?;
        Ok(PatientRecord::parse(&body)?)
    }

    async fn list_patients(&self, token: &str) -> ApiResult<Vec<PatientRecord>> {
        let body = self.get(token, "/patients/", "patient list").await?;
        Ok(PatientRecord::parse_list(&body)?)
    }

    async fn patient_diagnoses(
        &self,
        token: &str,
        patient_id: &str,
    ) -> ApiResult<Vec<DiagnosisRecord>> {
        let body = self
            .get(token, &format!("/patients/{patient_id}/diagnoses/"), "patient diagnoses")
            .await?;
        Ok(DiagnosisRecord::parse_list(&body)?)
    }

    async fn diagnosis_detail(
        &self,
        token: &str,
        diagnosis_id: &str,
    ) -> ApiResult<DiagnosisRecord> {
        let body = self
            .get(token, &format!("/diagnosis-details/{diagnosis_id}/"), "diagnosis detail")
            .await?;
        Ok(DiagnosisRecord::parse(&body)?)
    }

    async fn update_vitals(
        &self,
        token: &str,
        diagnosis_id: &str,
        patch: &VitalsPatch,
    ) -> ApiResult<()> {
        let request = self
            .http
            .patch(self.api(&format!("/update-diagnosis-vitals/{diagnosis_id}/")))
            .bearer_auth(token)
            .json(patch);
        send(request, "vitals update").await.map(drop)
    }

    async fn create_diagnosis(&self, token: &str, body: &NewDiagnosis) -> ApiResult<()> {
        let request = self
            .http
            .post(self.api("/create-full-diagnosis/"))
            .bearer_auth(token)
            .json(body);
        send(request, "create diagnosis").await.map(drop)
    }

    async fn create_admission(&self, token: &str, body: &AdmissionRequest) -> ApiResult<()> {
        let request = self
            .http
            .post(self.api("/allotments/create/"))
            .bearer_auth(token)
            .json(body);
        send(request, "admission").await.map(drop)
    }

    async fn download_test(&self, token: &str, file_name: &str) -> ApiResult<Vec<u8>> {
        let request = self
            .http
            .get(self.download_url(file_name)?)
            .bearer_auth(token)
            .query(&[("token", token)]);
        send(request, "test download").await
    }
}
