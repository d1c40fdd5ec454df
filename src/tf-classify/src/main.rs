use std::error::Error;
use std::path::PathBuf;
use structopt::StructOpt;
use tf_predict::{classify_from_raw, classify_from_url, Classification, ImageClassifier, ModelConfig};

use log::{debug, info};

#[derive(StructOpt, Debug)]
#[structopt(
    name = "tf-classify",
    about = "CLI app to perform image classification with TensorFlow"
)]
struct CmdArgs {
    #[structopt(help = "Export directory of TensorFlow SavedModel")]
    export_dir: PathBuf,

    #[structopt(help = "Path to labels file, one class name per line")]
    labels_path: PathBuf,

    #[structopt(help = "Image file or http(s) URL to classify")]
    image: String,

    #[structopt(long, default_value = "serving_default_images", help = "Input operation name")]
    input_op: String,

    #[structopt(long, default_value = "StatefulPartitionedCall", help = "Output operation name")]
    output_op: String,

    #[structopt(long, default_value = "224", help = "Model input side length")]
    image_size: u32,
}

fn is_url(image: &str) -> bool {
    image.starts_with("http://") || image.starts_with("https://")
}

fn classify(classifier: &ImageClassifier, image: &str) -> tf_predict::Result<Classification> {
    if is_url(image) {
        classify_from_url(classifier, image)
    } else {
        debug!("Reading image from {}", image);
        let data = std::fs::read(image)?;
        classify_from_raw(classifier, &data)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = CmdArgs::from_args();

    let config = ModelConfig {
        export_dir: args.export_dir,
        labels_path: args.labels_path,
        input_op: args.input_op,
        output_op: args.output_op,
        image_size: args.image_size,
    };

    let classifier = ImageClassifier::new(&config)?;

    let classification = classify(&classifier, &args.image)?;

    info!("Classified {} as '{}'", args.image, classification.tag);
    println!("{}", serde_json::to_string(&classification)?);

    Ok(())
}
