use std::convert::Infallible;
use std::sync::Arc;

use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Method, Request, Response};
use log::{info, warn};
use multer::Multipart;
use tf_predict::{classify_from_raw, Classifier};

use crate::response::{self, PredictResponse};

pub const PREDICT_PATH: &str = "/predict";

/// Multipart field carrying the uploaded image.
pub const IMAGE_FIELD: &str = "image";

pub async fn handle(
    req: Request<Body>,
    classifier: Arc<dyn Classifier>,
) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => response::preflight(),
        (&Method::POST, PREDICT_PATH) => predict(req, classifier).await.into_response(),
        (_, PREDICT_PATH) => response::method_not_allowed(),
        _ => response::not_found(),
    };

    info!("{} {} -> {}", method, path, response.status());

    Ok(response::allow_any_origin(response))
}

async fn predict(req: Request<Body>, classifier: Arc<dyn Classifier>) -> PredictResponse {
    let image = match read_image(req).await {
        Ok(Some(image)) => image,
        Ok(None) => return PredictResponse::missing_image(),
        Err(err) => {
            warn!("Unreadable upload: {}", err);
            return PredictResponse::Error(err.to_string());
        }
    };

    // Decoding and inference are CPU bound.
    let result =
        tokio::task::spawn_blocking(move || classify_from_raw(classifier.as_ref(), &image)).await;

    match result {
        Ok(Ok(classification)) => {
            info!(
                "Predicted '{}' (p={:.3})",
                classification.tag, classification.probability
            );
            PredictResponse::PredictedClass(classification.tag)
        }
        Ok(Err(err)) => {
            warn!("Classification failure: '{}'", err);
            PredictResponse::Error(err.to_string())
        }
        Err(err) => {
            warn!("Classification task failed: {}", err);
            PredictResponse::Error(err.to_string())
        }
    }
}

/// Pull the bytes of the first uploaded file named [`IMAGE_FIELD`].
///
/// Requests that are not `multipart/form-data`, and plain text fields that
/// happen to be called `image`, count as no upload.
async fn read_image(req: Request<Body>) -> Result<Option<Bytes>, multer::Error> {
    let boundary = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok());

    let boundary = match boundary {
        Some(boundary) => boundary,
        None => return Ok(None),
    };

    let mut multipart = Multipart::new(req.into_body(), boundary);

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) && field.file_name().is_some() {
            return field.bytes().await.map(Some);
        }
    }

    Ok(None)
}
