//! Local stand-ins for the upstream APIs.

use axum::Router;
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub async fn spawn_stub(app: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
  let addr = listener.local_addr().expect("stub addr");
  tokio::spawn(async move {
    axum::serve(listener, app).await.expect("stub server");
  });
  format!("http://{addr}")
}
