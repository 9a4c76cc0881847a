use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use taxform_backend::config::AppConfig;
use taxform_backend::job_controller::state::{self, JobsState};
use taxform_backend::services::context::{MappingLoader, MappingRegistry};
use taxform_backend::services::declarations::generate::DocumentPipeline;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new();

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        state::start_job_updater(updater_state, rx).await;
    });

    let registry = MappingRegistry::new(MappingLoader::new(&config.mapping_dir));
    let pipeline = DocumentPipeline::from_config(&config);

    info!(
        "mappings from {}, templates from {}, output to {}",
        config.mapping_dir.display(),
        config.template_dir.display(),
        config.output_dir.display()
    );
    info!("Server running at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(1024 * 1024)) // 1 MB
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(pipeline.clone()))
            .configure(taxform_backend::configure_services)
    })
    .bind(config.bind_address())?
    .run()
    .await
}
