//! Image classification on top of a TensorFlow SavedModel.
//!
//! [`ImageClassifier`] owns the loaded model and its label table. Request
//! handlers go through the [`Classifier`] trait so the model can be swapped
//! for a stub in tests.

mod classifier;
mod error;
mod labels;
pub mod preprocess;
mod timer;

use std::path::{Path, PathBuf};

use image::RgbImage;
use log::info;
use tensorflow::{Graph, SavedModelBundle, Session, SessionOptions, SessionRunArgs, Tensor};

pub use classifier::{
    argmax, classify_from_raw, classify_from_url, Classification, Classifier, Prediction,
};
pub use error::{ClassifyError, Result};
pub use labels::Labels;
pub use timer::Timer;

/// Where the model lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Export directory of the TensorFlow SavedModel
    pub export_dir: PathBuf,

    /// Label file, one class name per line
    pub labels_path: PathBuf,

    /// Operation fed with the `[1, size, size, 3]` input tensor
    pub input_op: String,

    /// Operation whose first output holds the class scores
    pub output_op: String,

    /// Square input side length the model was trained with
    pub image_size: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            export_dir: PathBuf::from("./model"),
            labels_path: PathBuf::from("./model/labels.txt"),
            input_op: "serving_default_images".to_owned(),
            output_op: "StatefulPartitionedCall".to_owned(),
            image_size: 224,
        }
    }
}

pub struct ImageClassifier {
    /// TensorFlow model graph
    graph: Graph,

    /// TensorFlow session
    session: Session,

    labels: Labels,

    input_op: String,

    output_op: String,

    image_size: u32,
}

impl ImageClassifier {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let labels = Labels::from_file(&config.labels_path)?;
        let (graph, session) = load_session(&config.export_dir)?;

        // Fail at startup rather than on the first request.
        graph.operation_by_name_required(&config.input_op)?;
        graph.operation_by_name_required(&config.output_op)?;

        info!(
            "Loaded model from {} with {} classes",
            config.export_dir.display(),
            labels.len()
        );

        Ok(ImageClassifier {
            graph,
            session,
            labels,
            input_op: config.input_op.clone(),
            output_op: config.output_op.clone(),
            image_size: config.image_size,
        })
    }

    fn run(&self, input: &[f32]) -> Result<Vec<f32>> {
        let size = u64::from(self.image_size);
        let input = Tensor::new(&[1, size, size, 3]).with_values(input)?;

        let mut args = SessionRunArgs::new();
        args.add_feed(&self.graph.operation_by_name_required(&self.input_op)?, 0, &input);
        let result = args.request_fetch(&self.graph.operation_by_name_required(&self.output_op)?, 0);

        self.session.run(&mut args)?;
        let output: Tensor<f32> = args.fetch(result)?;

        Ok(output.to_vec())
    }
}

impl Classifier for ImageClassifier {
    fn labels(&self) -> &Labels {
        &self.labels
    }

    fn preprocess(&self, image: RgbImage) -> RgbImage {
        preprocess::center_square(&image, self.image_size)
    }

    fn infer(&self, image: &RgbImage) -> Result<Vec<f32>> {
        let size = self.image_size;
        let input = if image.dimensions() == (size, size) {
            preprocess::to_values(image)
        } else {
            preprocess::to_input(image, size)
        };

        self.run(&input)
    }
}

fn load_session(export_dir: &Path) -> Result<(Graph, Session)> {
    let mut t = Timer::new_start("Loading session");

    let mut graph = Graph::new();
    let session =
        SavedModelBundle::load(&SessionOptions::new(), &["serve"], &mut graph, export_dir)?
            .session;

    t.stop();

    Ok((graph, session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_labels_fail_before_loading_the_model() {
        let config = ModelConfig {
            export_dir: PathBuf::from("/nonexistent/model"),
            labels_path: PathBuf::from("/nonexistent/model/labels.txt"),
            ..Default::default()
        };

        match ImageClassifier::new(&config) {
            Err(ClassifyError::Labels { path, .. }) => {
                assert_eq!(path, "/nonexistent/model/labels.txt")
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("loaded a model from nowhere"),
        }
    }

    #[test]
    fn default_config_points_at_local_model() {
        let config = ModelConfig::default();
        assert_eq!(config.export_dir, PathBuf::from("./model"));
        assert_eq!(config.image_size, 224);
    }
}
