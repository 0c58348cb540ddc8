use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod agreement;
pub mod config;
pub mod generator;
pub mod storage;

pub use crate::config::ServerConfig;
pub use crate::storage::DeliveryStore;

/// Shared per-process state: read-only configuration, the delivery store,
/// and the generation counter. Nothing else is shared between requests.
pub struct AppState {
    pub config: ServerConfig,
    pub delivery: DeliveryStore,
    pub generated: IntCounter,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::agreement::handlers::create_agreement,
            crate::agreement::handlers::download_agreement,
            crate::agreement::handlers::sample_agreement,
            crate::agreement::handlers::health,
        ),
        components(
            schemas(
                agreement::models::AgreementRequest,
                agreement::models::AgreementResponse,
                ErrorResponse,
            )
        ),
        tags(
            (name = "Agreement Service", description = "Client agreement PDF generation endpoints.")
        )
    )]
    struct ApiDoc;

    let config = ServerConfig::from_env();

    let delivery = match DeliveryStore::new() {
        Ok(delivery) => delivery,
        Err(e) => {
            log::error!("Failed to create the artifact directory: {e}");
            std::process::exit(1);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("agreement_server")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus metrics middleware");
    let generated = IntCounter::new(
        "agreements_generated_total",
        "Total number of agreement PDFs generated",
    )
    .expect("Failed to create generation counter");
    prometheus
        .registry
        .register(Box::new(generated.clone()))
        .expect("Failed to register generation counter");

    let app_state = web::Data::new(AppState {
        config: config.clone(),
        delivery,
        generated,
    });

    log::info!(
        "Starting server at http://0.0.0.0:{} (headless: {})",
        config.port,
        config.headless
    );

    let port = config.port;
    let headless = config.headless;
    let cors_permissive = config.cors_permissive;

    HttpServer::new(move || {
        let cors = if cors_permissive {
            Cors::permissive()
        } else {
            Cors::default()
                .allowed_origin("http://localhost:5173")
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:8080")
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        let app = App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .app_data(app_state.clone())
            .service(
                web::scope("/api")
                    .service(
                        web::resource("/agreements")
                            .route(web::post().to(agreement::handlers::create_agreement)),
                    )
                    .service(
                        web::resource("/agreements/sample")
                            .route(web::get().to(agreement::handlers::sample_agreement)),
                    )
                    .service(
                        web::resource("/agreements/{id}/download")
                            .route(web::get().to(agreement::handlers::download_agreement)),
                    ),
            )
            .service(web::resource("/health").route(web::get().to(agreement::handlers::health)));

        if headless {
            app
        } else {
            app.service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
        }
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
