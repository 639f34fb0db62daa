//! Mock HTTP servers for pipeline tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use reuploader_cloud::Endpoints;

/// Endpoints nothing should reach; tests override the entries they use.
pub(crate) fn unroutable_endpoints() -> Endpoints {
    Endpoints {
        identity: "http://127.0.0.1:1/identity".into(),
        creations: "http://127.0.0.1:1/creations".into(),
        primary_delivery: "http://127.0.0.1:1/delivery".into(),
        legacy_delivery: "http://127.0.0.1:1/legacy".into(),
        upload: "http://127.0.0.1:1/assets".into(),
    }
}

/// Starts a mock HTTP server answering every request with the same
/// status/body, counting the requests it serves.
pub(crate) async fn mock_server(
    status: u16,
    body: &str,
) -> (String, Arc<AtomicUsize>, JoinHandle<()>) {
    mock_server_seq(vec![(status, body.to_string())]).await
}

/// Starts a mock HTTP server that walks through `responses` in order,
/// repeating the last one once exhausted.
pub(crate) async fn mock_server_seq(
    responses: Vec<(u16, String)>,
) -> (String, Arc<AtomicUsize>, JoinHandle<()>) {
    assert!(!responses.is_empty());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{port}");
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_srv = hits.clone();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let n = hits_srv.fetch_add(1, Ordering::SeqCst);
            let (status, body) = &responses[n.min(responses.len() - 1)];

            // Drain the request; POST bodies may arrive in several
            // segments, so read until the connection goes idle.
            let mut buf = vec![0u8; 16384];
            loop {
                match tokio::time::timeout(Duration::from_millis(100), stream.read(&mut buf)).await
                {
                    Ok(Ok(n)) if n > 0 => continue,
                    _ => break,
                }
            }

            let resp = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (url, hits, handle)
}
