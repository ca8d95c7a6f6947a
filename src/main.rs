use repo_cluster::{
    create_root_logger_for_file, create_root_logger_for_stdout, peer_server_shutdown, BullyClientFactory,
    BullyOptions, ClusterCoordinator, ClusterRegistry, ClusterServices, DefaultSourceResolver, Discovery,
    FsTreeSource, GrpcConnector, ManagerRegistry, MasterSwitchRegistry, MirrorRepository, NodeContext,
    OperationRegistry, PeerRpcServer, Repository, RequestDispatcher, SystemAddressResolver, DEFAULT_PORT,
};
use std::env;
use std::error::Error;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

const LOG_DIR_VAR: &str = "REPO_CLUSTER_LOG_DIR";

#[tokio::main]
async fn main() {
    let mut args = env::args().skip(1);
    let repository_dir = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => {
            eprintln!("Usage: repo-cluster-node <repository-dir> [port]");
            process::exit(2);
        }
    };
    let port = match args.next().map(|port| port.parse::<u16>()) {
        None => DEFAULT_PORT,
        Some(Ok(port)) => port,
        Some(Err(e)) => {
            eprintln!("Invalid port: {}", e);
            process::exit(2);
        }
    };

    let machine = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string());
    let canonical_name = format!("{}:{}", machine, port);

    let logger = match env::var_os(LOG_DIR_VAR) {
        Some(dir) => match create_root_logger_for_file(Path::new(&dir), canonical_name.clone()) {
            Ok(logger) => logger,
            Err(e) => {
                eprintln!("Could not open the log file under {:?}: {}", dir, e);
                process::exit(1);
            }
        },
        None => create_root_logger_for_stdout(canonical_name.clone()),
    };

    if let Err(e) = run(logger.clone(), repository_dir, port, canonical_name).await {
        slog::crit!(logger, "Node stopped: {}", e);
    }
}

async fn run(logger: slog::Logger, repository_dir: PathBuf, port: u16, canonical_name: String) -> Result<(), Box<dyn Error>> {
    let managers = Arc::new(ManagerRegistry::new());
    let source = Arc::new(FsTreeSource::open(repository_dir.clone())?);
    let local = Arc::new(MirrorRepository::standalone(
        logger.new(slog::o!("Repository" => "local")),
        source,
        managers.clone(),
    ));
    let starting = local.clone();
    tokio::task::spawn_blocking(move || starting.start()).await??;

    let operations = Arc::new(OperationRegistry::new(logger.clone()));
    local.set_operations(operations.clone())?;
    let local: Arc<dyn Repository> = local;

    let context = NodeContext {
        logger: logger.clone(),
        local: local.clone(),
        connector: Arc::new(GrpcConnector),
        sources: Arc::new(DefaultSourceResolver::new()),
        managers,
        switches: Arc::new(MasterSwitchRegistry::new()),
        // Not an entry name, so the local repository never lists it.
        simulation_root: repository_dir.join(".simulations"),
    };
    let registry = Arc::new(ClusterRegistry::from_repository(&context));

    let dispatcher = Arc::new(RequestDispatcher::new());
    let server = PeerRpcServer::new(
        logger.new(slog::o!("Component" => "PeerServer")),
        local,
        operations.clone(),
        dispatcher.clone(),
        canonical_name,
    );
    let (shutdown_handle, shutdown_signal) = peer_server_shutdown();
    let server_task = tokio::spawn(server.run(SocketAddr::from(([0, 0, 0, 0], port)), shutdown_signal));

    let discovery = Arc::new(Discovery::new(logger.clone(), Arc::new(SystemAddressResolver), port));
    let coordinator = Arc::new(ClusterCoordinator::new(logger.clone()));
    let factory = BullyClientFactory::new(BullyOptions::default());
    let state = coordinator.listen(&registry, &discovery, &dispatcher, &factory).await;
    slog::info!(logger, "Clustering is {:?}", state);

    let services = Arc::new(ClusterServices::new(
        logger.clone(),
        registry,
        discovery,
        coordinator,
        operations,
    ));
    services.register_operations();

    tokio::signal::ctrl_c().await?;
    slog::info!(logger, "Shutting down");
    shutdown_handle.shutdown();
    server_task.await?;

    Ok(())
}
