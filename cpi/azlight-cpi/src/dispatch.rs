use crate::protocol::{Request, Response, CLOUD_ERROR, INVALID_CALL, NOT_IMPLEMENTED};
use crate::state::CpiState;
use azlight_common::config::CpiConfig;
use azlight_common::diagnostic::{self, Diagnosable, DiagnosticCode};
use serde_json::{json, Map, Value};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, info_span, Instrument};

pub const STEMCELL_FORMATS: [&str; 1] = ["azure-light"];

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Method '{0}' is not implemented")]
    NotImplemented(String),
    #[error("Invalid arguments for '{method}': {reason}")]
    InvalidArguments { method: String, reason: String },
    #[error(transparent)]
    Cloud(#[from] diagnostic::Error),
}

impl Diagnosable for DispatchError {
    fn code(&self) -> DiagnosticCode {
        match self {
            Self::NotImplemented(_) => DiagnosticCode("CPI_NOT_IMPLEMENTED"),
            Self::InvalidArguments { .. } => DiagnosticCode("CPI_INVALID_ARGUMENTS"),
            Self::Cloud(e) => e.code(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Self::NotImplemented(_) => Some(
                "Only create_stemcell, delete_stemcell, has_stemcell, stemcell_info and info are served"
                    .to_string(),
            ),
            Self::InvalidArguments { .. } => None,
            Self::Cloud(e) => e.suggestion().map(str::to_string),
        }
    }
}

impl DispatchError {
    fn into_response(self) -> Response {
        let kind = match &self {
            Self::NotImplemented(_) => NOT_IMPLEMENTED,
            Self::InvalidArguments { .. } => INVALID_CALL,
            Self::Cloud(_) => CLOUD_ERROR,
        };
        let message = match &self {
            Self::Cloud(e) => e.message().to_string(),
            other => other.to_string(),
        };
        Response::error(kind, message)
    }
}

/// Handles one raw CPI request end to end. Failures become error responses.
pub async fn run(config_path: &Path, input: &str) -> Response {
    let request: Request = match serde_json::from_str(input) {
        Ok(request) => request,
        Err(e) => {
            error!("Failed to parse CPI request: {}", e);
            return Response::error(INVALID_CALL, format!("Invalid CPI request: {}", e));
        }
    };

    let span = info_span!(
        "cpi_request",
        method = %request.method,
        request_id = %request.request_id()
    );

    async {
        let config = match CpiConfig::load(config_path).await {
            Ok(config) => config,
            Err(e) => return DispatchError::Cloud(e).into_response(),
        };
        let state = match CpiState::from_config(&config, tracing::Span::current()).await {
            Ok(state) => state,
            Err(e) => return DispatchError::Cloud(e).into_response(),
        };
        handle(&state, &request).await
    }
    .instrument(span)
    .await
}

pub async fn handle(state: &CpiState, request: &Request) -> Response {
    info!(
        "Handling CPI method {} (api_version: {:?})",
        request.method, request.api_version
    );
    match dispatch(state, request).await {
        Ok(result) => Response::ok(result),
        Err(e) => {
            error!(code = %e.code(), "CPI method {} failed: {}", request.method, e);
            e.into_response()
        }
    }
}

async fn dispatch(state: &CpiState, request: &Request) -> Result<Value, DispatchError> {
    let method = request.method.as_str();
    match method {
        "info" => Ok(json!({ "stemcell_formats": STEMCELL_FORMATS })),
        "create_stemcell" => {
            // arguments[0] is the unpacked image path; a light stemcell image is empty.
            let properties = object_arg(request, 1)?;
            let name = state.stemcells.create(properties).await?;
            Ok(Value::String(name))
        }
        "delete_stemcell" => {
            let name = str_arg(request, 0)?;
            state.stemcells.delete(name).await?;
            Ok(Value::Null)
        }
        "has_stemcell" => {
            let location = str_arg(request, 0)?;
            let name = str_arg(request, 1)?;
            Ok(Value::Bool(state.stemcells.exists(location, name).await?))
        }
        "stemcell_info" => {
            let name = str_arg(request, 0)?;
            let info = state.stemcells.get_info(name).await?;
            Ok(json!({
                "uri": info.uri(),
                "name": info.name(),
                "version": info.version(),
                "os_type": info.os_type(),
                "disk_size": info.disk_size(),
                "metadata": info.metadata(),
            }))
        }
        other => Err(DispatchError::NotImplemented(other.to_string())),
    }
}

fn arg<'a>(request: &'a Request, index: usize) -> Result<&'a Value, DispatchError> {
    request
        .arguments
        .get(index)
        .ok_or_else(|| DispatchError::InvalidArguments {
            method: request.method.clone(),
            reason: format!("missing argument #{}", index),
        })
}

fn str_arg<'a>(request: &'a Request, index: usize) -> Result<&'a str, DispatchError> {
    arg(request, index)?
        .as_str()
        .ok_or_else(|| DispatchError::InvalidArguments {
            method: request.method.clone(),
            reason: format!("argument #{} should be a string", index),
        })
}

fn object_arg<'a>(
    request: &'a Request,
    index: usize,
) -> Result<&'a Map<String, Value>, DispatchError> {
    arg(request, index)?
        .as_object()
        .ok_or_else(|| DispatchError::InvalidArguments {
            method: request.method.clone(),
            reason: format!("argument #{} should be a mapping", index),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        config_path: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let catalog_path = tmp.path().join("catalog.json");
        std::fs::write(
            &catalog_path,
            json!({
                "platform_images": [{
                    "location": "eastus",
                    "publisher": "canonical",
                    "offer": "ubuntu",
                    "sku": "18.04",
                    "versions": [{ "name": "1.0.0", "id": "X" }]
                }]
            })
            .to_string(),
        )
        .unwrap();

        let config_path = tmp.path().join("cpi.json");
        std::fs::write(
            &config_path,
            json!({
                "azure": { "location": "eastus", "storage_account_name": "boshstemcells" },
                "blobstore": { "root": tmp.path().join("blobs") },
                "catalog": { "path": catalog_path }
            })
            .to_string(),
        )
        .unwrap();

        Fixture {
            _tmp: tmp,
            config_path,
        }
    }

    async fn call(fixture: &Fixture, method: &str, arguments: Value) -> Response {
        let input = json!({
            "method": method,
            "arguments": arguments,
            "context": { "director_uuid": "d", "request_id": "cpi-1" }
        });
        run(&fixture.config_path, &input.to_string()).await
    }

    fn ubuntu(version: &str) -> Value {
        json!({
            "name": "bosh-azure-hyperv-ubuntu-bionic-go_agent",
            "version": "1.0.0",
            "disk": 3072,
            "image": { "publisher": "canonical", "offer": "ubuntu", "sku": "18.04", "version": version }
        })
    }

    #[tokio::test]
    async fn test_stemcell_lifecycle() {
        let fixture = fixture();

        let created = call(&fixture, "create_stemcell", json!(["/tmp/image", ubuntu("1.0.0")])).await;
        assert_eq!(created.error, None);
        let cid = created.result.as_str().unwrap().to_string();
        assert!(cid.starts_with("bosh-light-stemcell-"));

        let has = call(&fixture, "has_stemcell", json!(["eastus", cid])).await;
        assert_eq!(has.result, json!(true));

        let info = call(&fixture, "stemcell_info", json!([cid])).await;
        assert_eq!(info.result["uri"], json!("X"));
        assert_eq!(info.result["os_type"], json!("linux"));
        assert_eq!(info.result["disk_size"], json!(3072));
        assert_eq!(info.result["metadata"]["image"], ubuntu("1.0.0")["image"]);

        let deleted = call(&fixture, "delete_stemcell", json!([cid])).await;
        assert_eq!(deleted, Response::ok(Value::Null));

        let has = call(&fixture, "has_stemcell", json!(["eastus", cid])).await;
        assert_eq!(has.result, json!(false));
    }

    #[tokio::test]
    async fn test_create_with_unknown_version() {
        let fixture = fixture();
        let resp = call(&fixture, "create_stemcell", json!(["/tmp/image", ubuntu("2.0.0")])).await;

        let error = resp.error.unwrap();
        assert_eq!(error.kind, CLOUD_ERROR);
        assert!(error.message.contains("Cannot find the light stemcell"));
        assert!(!error.ok_to_retry);
    }

    #[tokio::test]
    async fn test_stemcell_info_for_missing_stemcell() {
        let fixture = fixture();
        let resp = call(&fixture, "stemcell_info", json!(["bosh-light-stemcell-missing"])).await;

        let error = resp.error.unwrap();
        assert_eq!(error.kind, CLOUD_ERROR);
        assert!(error.message.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let fixture = fixture();
        let resp = call(&fixture, "create_vm", json!([])).await;
        assert_eq!(resp.error.unwrap().kind, NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let fixture = fixture();
        let resp = call(&fixture, "has_stemcell", json!(["eastus"])).await;
        assert_eq!(resp.error.unwrap().kind, INVALID_CALL);

        let resp = call(&fixture, "create_stemcell", json!(["/tmp/image", "not-a-map"])).await;
        assert_eq!(resp.error.unwrap().kind, INVALID_CALL);
    }

    #[tokio::test]
    async fn test_info() {
        let fixture = fixture();
        let resp = call(&fixture, "info", json!([])).await;
        assert_eq!(resp.result, json!({ "stemcell_formats": ["azure-light"] }));
    }

    #[tokio::test]
    async fn test_malformed_request() {
        let fixture = fixture();
        let resp = run(&fixture.config_path, "{\"arguments\": []").await;
        assert_eq!(resp.error.unwrap().kind, INVALID_CALL);
    }

    #[tokio::test]
    async fn test_missing_config() {
        let input = json!({ "method": "info", "arguments": [] }).to_string();
        let resp = run(Path::new("/no/such/cpi.json"), &input).await;

        let error = resp.error.unwrap();
        assert_eq!(error.kind, CLOUD_ERROR);
        assert!(error.message.contains("Config file not found"));
    }
}
