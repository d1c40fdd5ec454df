use image::RgbImage;
use serde::Serialize;

use crate::error::{ClassifyError, Result};
use crate::labels::Labels;
use crate::preprocess::{decode, normalize};
use crate::timer::Timer;

/// A loaded, read-only image classifier.
///
/// Implementations are shared between concurrent requests, so `infer` must
/// not mutate the model.
pub trait Classifier: Send + Sync {
    /// Class names, indexed like the output of [`Classifier::infer`].
    fn labels(&self) -> &Labels;

    /// Bring a decoded RGB image to the shape `infer` expects. The default
    /// passes it through untouched.
    fn preprocess(&self, image: RgbImage) -> RgbImage {
        image
    }

    /// Run the model once and return one score per class.
    fn infer(&self, image: &RgbImage) -> Result<Vec<f32>>;

    fn classify(&self, image: &RgbImage) -> Result<Prediction<'_>> {
        let probabilities = self.infer(image)?;
        Ok(Prediction {
            labels: self.labels(),
            probabilities,
        })
    }
}

/// Raw output of one inference call.
#[derive(Debug)]
pub struct Prediction<'a> {
    pub labels: &'a Labels,
    pub probabilities: Vec<f32>,
}

impl Prediction<'_> {
    /// Pick the most probable class.
    pub fn top(&self) -> Result<Classification> {
        if self.probabilities.len() != self.labels.len() {
            return Err(ClassifyError::OutputShape {
                expected: self.labels.len(),
                actual: self.probabilities.len(),
            });
        }

        let best = argmax(&self.probabilities).ok_or(ClassifyError::EmptyOutput)?;
        let tag = self.labels.get(best).ok_or(ClassifyError::OutputShape {
            expected: self.labels.len(),
            actual: self.probabilities.len(),
        })?;

        Ok(Classification {
            tag: tag.to_owned(),
            probability: self.probabilities[best],
            ..Default::default()
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Classification {
    /// Classification tag of the image
    pub tag: String,

    /// Classification probability
    pub probability: f32,

    /// Time spent fetching image from URL
    pub time_url_fetch: i64,

    /// Time spent loading image in memory
    pub time_image_load: i64,

    /// Time resizing image
    pub time_image_resize: i64,

    /// Time spent on running session
    pub time_session_run: i64,
}

/// Index of the largest value, first one on ties. NaNs never win.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Decode `data`, convert it to RGB and return the top class.
pub fn classify_from_raw(classifier: &dyn Classifier, data: &[u8]) -> Result<Classification> {
    let mut t = Timer::new_start("Load image from memory");
    let image = normalize(decode(data)?);
    t.stop();

    let mut resize = Timer::new_start("Resizing image");
    let image = classifier.preprocess(image);
    resize.stop();

    let mut run = Timer::new_start("Running session");
    let prediction = classifier.classify(&image)?;
    run.stop();

    let mut classification = prediction.top()?;
    classification.time_image_load = t.millis();
    classification.time_image_resize = resize.millis();
    classification.time_session_run = run.millis();

    Ok(classification)
}

/// Fetch an image over HTTP(S) and classify it.
pub fn classify_from_url(classifier: &dyn Classifier, url: &str) -> Result<Classification> {
    let mut t = Timer::new_start(&format!("Fetching image from {}", url));
    let buf = reqwest::blocking::get(url)?.error_for_status()?.bytes()?;
    t.stop();

    let mut classification = classify_from_raw(classifier, &buf)?;
    classification.time_url_fetch = t.millis();

    Ok(classification)
}
