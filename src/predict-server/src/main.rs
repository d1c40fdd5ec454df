use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use log::{error, info};
use std::convert::Infallible;
use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;
use tf_predict::{Classifier, ImageClassifier, ModelConfig};

mod handler;
mod response;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "predict-server",
    about = "Serve image class predictions from a TensorFlow SavedModel over HTTP"
)]
struct CmdArgs {
    #[structopt(long, default_value = "./model", help = "Export directory of TensorFlow SavedModel")]
    export_dir: PathBuf,

    #[structopt(long, default_value = "./model/labels.txt", help = "Class names, one per line")]
    labels: PathBuf,

    #[structopt(long, default_value = "0.0.0.0")]
    host: IpAddr,

    #[structopt(long, default_value = "5000")]
    port: u16,

    #[structopt(long, default_value = "serving_default_images", help = "Input operation name")]
    input_op: String,

    #[structopt(long, default_value = "StatefulPartitionedCall", help = "Output operation name")]
    output_op: String,

    #[structopt(long, default_value = "224", help = "Model input side length")]
    image_size: u32,
}

impl CmdArgs {
    fn model_config(&self) -> ModelConfig {
        ModelConfig {
            export_dir: self.export_dir.clone(),
            labels_path: self.labels.clone(),
            input_op: self.input_op.clone(),
            output_op: self.output_op.clone(),
            image_size: self.image_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CmdArgs::from_args();

    let classifier: Arc<dyn Classifier> = match ImageClassifier::new(&args.model_config()) {
        Ok(classifier) => Arc::new(classifier),
        Err(err) => {
            error!("Could not load model: {}", err);
            return Err(err.into());
        }
    };

    let make_service = make_service_fn(move |_conn: &AddrStream| {
        let classifier = Arc::clone(&classifier);

        let service = service_fn(move |req| handler::handle(req, classifier.clone()));

        async move { Ok::<_, Infallible>(service) }
    });

    let addr = SocketAddr::new(args.host, args.port);
    let server = Server::try_bind(&addr)?.serve(make_service);

    info!("Listening on http://{}", addr);

    if let Err(e) = server.await {
        error!("server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
