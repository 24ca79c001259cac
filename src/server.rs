//! Browser front end: an upload form and a result page.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::Engine;
use image::RgbImage;
use tracing::{error, info, warn};

use crate::analysis::{Analysis, FaceAnalyzer};
use crate::error::{Error, Result};
use crate::utils::encode_png;

pub const TITLE: &str = "Face Analysis App";
pub const DESCRIPTION: &str =
    "Upload an image to analyze the face for keypoints and dominant emotion.";

const UPLOAD_FIELD: &str = "image";
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> AppError {
        AppError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = if err.is_bad_input() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        AppError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "request failed");
        } else {
            warn!(status = %self.status, message = %self.message, "request rejected");
        }
        let body = page(&format!("<p class=\"error\">{}</p>", escape(&self.message)));
        (self.status, Html(body)).into_response()
    }
}

pub fn router(analyzer: Arc<FaceAnalyzer>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze))
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(analyzer)
}

pub async fn serve(addr: SocketAddr, analyzer: Arc<FaceAnalyzer>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "serving face analysis form");
    axum::serve(listener, router(analyzer)).await?;
    Ok(())
}

async fn index() -> Html<String> {
    Html(page(""))
}

async fn analyze(
    State(analyzer): State<Arc<FaceAnalyzer>>,
    mut multipart: Multipart,
) -> std::result::Result<Html<String>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::bad_request(err.body_text()))?;
            upload = Some(bytes);
        }
    }

    let bytes = upload
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::bad_request("no image uploaded"))?;
    info!(bytes = bytes.len(), "received upload");

    // model inference is blocking, keep it off the async workers
    let analysis = tokio::task::spawn_blocking(move || -> Result<Analysis> {
        let image = image::load_from_memory(&bytes)?.to_rgb8();
        analyzer.analyze(&image)
    })
    .await
    .map_err(|err| AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: err.to_string(),
    })??;

    Ok(Html(page(&render_result(&analysis)?)))
}

fn render_result(analysis: &Analysis) -> Result<String> {
    let mut html = String::new();

    if let Analysis::Face(face) = analysis {
        html.push_str(&figure("Face Keypoints", &face.keypoint_image)?);
        html.push_str(&figure("Segmented Face", &face.segmented_image)?);
    }

    html.push_str(&format!(
        "<h2>Dominant Emotion</h2>\n<p id=\"emotion\">{}</p>\n",
        escape(&analysis.summary())
    ));
    Ok(html)
}

fn figure(label: &str, image: &RgbImage) -> Result<String> {
    let png = base64::engine::general_purpose::STANDARD.encode(encode_png(image)?);
    Ok(format!(
        "<h2>{label}</h2>\n<img alt=\"{label}\" src=\"data:image/png;base64,{png}\">\n"
    ))
}

fn page(result: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{TITLE}</title></head>
<body>
<h1>{TITLE}</h1>
<p>{DESCRIPTION}</p>
<form action="/analyze" method="post" enctype="multipart/form-data">
<input type="file" name="{UPLOAD_FIELD}" accept="image/*" required>
<button type="submit">Submit</button>
</form>
{result}</body>
</html>
"#
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
