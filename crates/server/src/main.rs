//! DAC election server entry point.

use std::sync::Arc;
use std::time::Duration;

use dac_common::{Config, ElectionConfig, LogFormat};
use dac_core::{
    CommitteeDirectory, ElectionService, NoOpNotificationSink, ReferenceResolver,
    ReviewResultsService,
};
use dac_db::entities::election::ElectionType;
use dac_db::repositories::{
    CommitteeRepository, ConsentRepository, DataAccessRequestRepository, DatasetRepository,
    ElectionRepository, MailMessageRepository, VoteRepository,
};
use sea_orm::DatabaseConnection;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, shutting down...");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dac=debug,dac_core=debug,dac_db=debug,sea_orm=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Services driven by the server process.
struct AppServices {
    elections: ElectionService,
    review_results: ReviewResultsService,
}

fn build_services(db: &Arc<DatabaseConnection>, config: &ElectionConfig) -> AppServices {
    let election_repo = Arc::new(ElectionRepository::new(Arc::clone(db)));
    let vote_repo = Arc::new(VoteRepository::new(Arc::clone(db)));
    let mail_repo = Arc::new(MailMessageRepository::new(Arc::clone(db)));

    let references = ReferenceResolver::new(
        Arc::new(ConsentRepository::new(Arc::clone(db))),
        Arc::new(DataAccessRequestRepository::new(Arc::clone(db))),
        Arc::new(DatasetRepository::new(Arc::clone(db))),
    );
    let committee = CommitteeDirectory::new(Arc::new(CommitteeRepository::new(Arc::clone(db))));

    AppServices {
        elections: ElectionService::new(
            election_repo.clone(),
            vote_repo.clone(),
            mail_repo,
            references.clone(),
            committee.clone(),
            Arc::new(NoOpNotificationSink),
            config.clone(),
        ),
        review_results: ReviewResultsService::new(election_repo, vote_repo, references, committee),
    }
}

/// Periodically log data access elections left open past the approval window.
async fn sweep_expired_elections(elections: ElectionService, config: ElectionConfig) {
    let mut interval = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs));
    loop {
        interval.tick().await;
        match elections
            .find_expired_elections(ElectionType::DataAccess, config.approval_expiration_days)
            .await
        {
            Ok(expired) => {
                for election in &expired {
                    warn!(
                        election_id = %election.id,
                        reference_id = %election.reference_id,
                        created = %election.create_date,
                        "Data access election past its approval window"
                    );
                }
                info!(count = expired.len(), "Expired election sweep finished");
            }
            Err(e) => e.log(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_tracing(config.logging.format);

    info!("Starting dac server...");

    let db = Arc::new(dac_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    dac_db::migrate(&db).await?;
    info!("Migrations completed");

    let services = build_services(&db, &config.election);
    let in_flight = services.review_results.open_elections().await?;
    let owner_reviews = services.elections.is_data_set_election_open().await?;
    info!(
        open_elections = in_flight,
        open_data_owner_elections = owner_reviews,
        "Services ready"
    );

    tokio::select! {
        () = sweep_expired_elections(services.elections, config.election.clone()) => {},
        () = shutdown_signal() => {},
    }

    info!("Server shutdown complete");
    Ok(())
}
