use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use mock_server::{Db, Node, Project};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");

    let db = Db::default();
    let prj_uuid = Uuid::new_v4();
    db.write().await.projects.insert(
        prj_uuid,
        Project::with_nodes(vec![
            Node::new(1, "DataSource", "Customers"),
            Node::new(2, "Filter", "Active customers"),
            Node::new(3, "Writer", "Export"),
        ]),
    );
    info!(%prj_uuid, "seeded demo project");

    let listener = TcpListener::bind(&addr).await?;
    mock_server::run(listener, db).await
}
