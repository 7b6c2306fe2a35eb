#![deny(warnings)]
#![deny(rust_2018_idioms)]

use engine::{settings::Settings, startup::App};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let settings = Settings::new().unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::from(settings.log_level))
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let app = App::build(&settings).await.unwrap();

    match app.run().await {
        Ok(report) => info!("pipeline completed: {report:?}"),
        Err(e) => {
            error!("pipeline failed: {e:?}");
            std::process::exit(1);
        }
    }
}
