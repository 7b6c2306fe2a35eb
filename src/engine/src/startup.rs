use crate::{Environment, Pipeline, PipelineReport, SharedState, error::Result, settings::Settings};
use postgres::PostgresAdapter;

pub struct App {
    pipeline: Pipeline,
}

impl App {
    pub async fn build(settings: &Settings) -> std::result::Result<App, postgres::Error> {
        let postgres = PostgresAdapter::new(&settings.postgres).await?;

        if settings.environment == Environment::Local {
            postgres.do_migrations().await?;
        }

        let shared_state = SharedState::new(settings.engine.clone(), postgres);

        Ok(App {
            pipeline: Pipeline::new(shared_state, settings.single_stage_run),
        })
    }

    pub async fn run(self) -> Result<PipelineReport> {
        self.pipeline.run().await
    }
}
